use fileformats_core::FormatsError;
use std::borrow::Cow;

/// Failures while loading configuration or building a catalog from it.
#[fileformats_derive::formats_error]
pub enum BootstrapError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },

    #[error("{source}{}", format_context(.context))]
    Formats { source: FormatsError, context: Option<Cow<'static, str>> },

    /// A declared format cannot be turned into a definition.
    #[error("Invalid format declaration{}: {message}", format_context(.context))]
    Declaration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
