use std::borrow::Cow;

/// Every failure the format catalog reports.
///
/// Messages always name the offending types by their display name (`J[A, B]`) and, for
/// converter conflicts, both registrations with their registration sites.
#[fileformats_derive::formats_error]
pub enum FormatsError {
    /// Malformed format declaration or registration: bad names, unknown parents,
    /// ambiguous wildcard counts, instantiating a template type.
    #[error("Definition error{}: {message}", format_context(.context))]
    Definition { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Invalid qualifiers supplied when qualifying a base type.
    #[error("Qualifier error{}: {message}", format_context(.context))]
    Qualifier { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Two different converters registered under the same key.
    #[error("Converter conflict{}: {message}", format_context(.context))]
    ConverterConflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Converter not found{}: {message}", format_context(.context))]
    ConverterNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Ambiguous converter{}: {message}", format_context(.context))]
    AmbiguousConverter { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Paths do not satisfy the structure, extension or magic number of a format.
    #[error("Format mismatch{}: {message}", format_context(.context))]
    FormatMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A MIME-like identifier cannot be produced or resolved.
    #[error("Format recognition error{}: {message}", format_context(.context))]
    FormatRecognition { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("I/O error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

macro_rules! error_constructors {
    ($($fn_name:ident => $variant:ident),* $(,)?) => {
        impl FormatsError {
            $(
                #[inline]
                #[must_use]
                pub fn $fn_name(message: impl Into<Cow<'static, str>>) -> Self {
                    Self::$variant { message: message.into(), context: None }
                }
            )*
        }
    };
}

error_constructors! {
    definition => Definition,
    qualifier => Qualifier,
    conflict => ConverterConflict,
    not_found => ConverterNotFound,
    ambiguous => AmbiguousConverter,
    mismatch => FormatMismatch,
    recognition => FormatRecognition,
}
