//! # fileformats-core
//!
//! The type system behind `fileformats`: a single-rooted hierarchy of format types,
//! parametrised ("qualified") subtypes such as `Directory[Png]`, the subtype relation
//! between them, a registry of converters between formats and a reversible MIME-like
//! naming scheme.
//!
//! Everything hangs off a [`Catalog`]. Types are addressed by copyable handles
//! ([`FormatId`], [`WildcardId`]); qualifying the same base with the same qualifiers
//! always returns the same handle, so identity comparison is type equality.
//!
//! ```
//! use fileformats_core::{Catalog, FormatDef, FormatId, QualifierPolicy};
//!
//! let catalog = Catalog::new();
//! let a = catalog.define(FormatDef::new("testing", "A").parent(FormatId::FILE_SET))?;
//! let b = catalog.define(FormatDef::new("testing", "B").parent(FormatId::FILE_SET))?;
//! let f = catalog.define(
//!     FormatDef::new("testing", "F").parent(FormatId::FILE_SET).qualifiable(QualifierPolicy::new()),
//! )?;
//!
//! let fab = catalog.qualify(f, [a, b])?;
//! assert!(catalog.is_subtype_of(fab, catalog.qualify(f, [a])?));
//! assert!(catalog.is_subtype_of(fab, f));
//! assert_eq!(catalog.to_mime_like(fab)?, "testing/a.b+f");
//! # Ok::<(), fileformats_core::FormatsError>(())
//! ```

mod catalog;
mod converter;
mod error;
mod mime;
mod qualifiers;
mod subtype;
mod types;

pub use crate::catalog::{CORE_NAMESPACE, Catalog};
pub use crate::converter::{Converter, ConverterKwargs, Task, TaskSpec};
pub use crate::error::{FormatsError, FormatsErrorExt, Result};
pub use crate::mime::{dasherize, undasherize};
pub use crate::types::{
    Derivation, FileTraits, FormatDef, FormatId, FormatType, MagicNumber, QualifierPolicy, TypeRef,
    Wildcard, WildcardId,
};
