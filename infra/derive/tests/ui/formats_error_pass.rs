use fileformats_derive::formats_error;
use std::borrow::Cow;

#[formats_error]
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Mismatch{}: {reason}", format_context(.context))]
    Mismatch { reason: String, context: Option<Cow<'static, str>> },

    #[error("Plain failure")]
    Plain {},
}

fn main() {
    let err: std::result::Result<(), ScanError> =
        Err(ScanError::Mismatch { reason: "bad magic".to_owned(), context: None });
    let _ = err.context("scan");
}
