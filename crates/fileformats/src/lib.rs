//! Facade crate for `fileformats`.
//! Re-exports the type catalog and the generic formats, and builds ready-to-use catalogs
//! from configuration. Keep this crate thin: it composes the other crates.
//!
//! ## Usage
//! - Load a [`FormatsConfig`] with [`load_config`] (file plus `FILEFORMATS__` environment).
//! - Call [`Formats::bootstrap`] and query [`Formats::catalog`] or [`Formats::find_matching`].
//!
//! ```
//! use fileformats::{Formats, FormatsConfig};
//!
//! let formats = Formats::bootstrap(&FormatsConfig::default())?;
//! let dir = formats.catalog().from_mime_like("generic/directory")?;
//! assert_eq!(dir, formats.generic().directory);
//! # Ok::<(), fileformats::BootstrapError>(())
//! ```

mod config;
mod error;
mod formats;

pub use crate::config::{FormatDeclaration, FormatsConfig, LoggingConfig, QualifierDeclaration, load_config};
pub use crate::error::{BootstrapError, BootstrapErrorExt};
pub use crate::formats::Formats;
pub use fileformats_core as types;
pub use fileformats_core::{Catalog, FormatId, FormatsError, TypeRef};
pub use fileformats_generic as generic;
pub use fileformats_generic::{FsInstance, GenericFormats, Recognizer};
