#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the `fileformats` crates.
//!
//! The only macro exported today is [`formats_error`], which turns a plain enum into a
//! domain error type wired for `thiserror`, `?` conversions and `.context(...)` chaining.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! fileformats-derive = { path = "../../infra/derive" }
//! thiserror = "2"
//! ```

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for defining domain error enums.
///
/// # Features
///
/// * **Derives**: injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Result alias**: emits `pub type Result<T, E = ErrorName> = std::result::Result<T, E>`
///   next to the enum.
/// * **Context**: generates a companion `<ErrorName>Ext` trait adding `.context(...)` and
///   the lazy `.with_context(|| ...)` to `Result<T, ErrorName>` and to
///   `Result<T, SourceError>` for every wrapped source.
/// * **Conversions**: implements `From<SourceError>` for variants holding a `source` field
///   (or a field marked `#[source]`/`#[from]`), and `From<&'static str>` / `From<String>`
///   when an `Internal { message, context }` variant exists.
///
/// # Requirements
///
/// 1. The item must be an enum with named-field variants only.
/// 2. A `context` field, when present, must be `Option<Cow<'static, str>>`.
/// 3. A variant wrapping a source error must also carry a `context` field.
///
/// # Example
///
/// ```rust,ignore
/// use fileformats_derive::formats_error;
/// use std::borrow::Cow;
///
/// #[formats_error]
/// pub enum LoaderError {
///     #[error("I/O failure{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read(path: &str) -> Result<String> {
///     std::fs::read_to_string(path).context("reading catalog declarations")
/// }
/// ```
#[proc_macro_attribute]
pub fn formats_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(input).into()
}
