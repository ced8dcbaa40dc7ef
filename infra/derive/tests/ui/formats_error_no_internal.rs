use fileformats_derive::formats_error;
use std::borrow::Cow;

#[formats_error]
pub enum ProbeError {
    #[error("I/O error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Unknown format{}: {name}", format_context(.context))]
    Unknown { name: String, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn probe() -> Result<()> {
    Err(std::io::Error::other("boom")).context("probing")
}

fn main() {
    let _ = probe();
}
