//! # fileformats-generic
//!
//! File-system side of `fileformats`: the generic `FsObject`, `File`, `Directory` and
//! `SetOf` formats, and a [`Recognizer`] that validates paths against any file-set format
//! of a catalog (structure, extension, magic number and, for directories and sets, the
//! formats of their contents).
//!
//! ```no_run
//! use fileformats_core::{Catalog, FormatDef};
//! use fileformats_generic::Recognizer;
//!
//! let recognizer = Recognizer::new(Catalog::new())?;
//! let catalog = recognizer.catalog();
//! let png = catalog.define(
//!     FormatDef::new("image", "Png").parent(recognizer.generic().file).ext(".png").magic(&b"\x89PNG"[..], 0),
//! )?;
//! let scans = catalog.qualify(recognizer.generic().directory, [png])?;
//!
//! let instance = recognizer.instantiate(scans, &["/data/scans"])?;
//! for image in recognizer.contents(&instance)? {
//!     println!("{image}");
//! }
//! # Ok::<(), fileformats_core::FormatsError>(())
//! ```

mod formats;
mod instance;
mod recognizer;

pub use crate::formats::{GENERIC_NAMESPACE, GenericFormats};
pub use crate::instance::FsInstance;
pub use crate::recognizer::Recognizer;
