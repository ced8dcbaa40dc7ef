use crate::formats::GenericFormats;
use crate::instance::FsInstance;
use fileformats_core::{Catalog, FileTraits, FormatId, FormatType, FormatsError, MagicNumber, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Checks file-system paths against the formats of a catalog.
#[derive(Debug, Clone)]
pub struct Recognizer {
    catalog: Catalog,
    generic: GenericFormats,
}

enum Shape {
    Directory,
    Set,
    File,
    Any,
}

impl Recognizer {
    /// Registers the generic formats in `catalog` if needed.
    ///
    /// # Errors
    /// Any error of [`GenericFormats::register`].
    pub fn new(catalog: Catalog) -> Result<Self> {
        let generic = GenericFormats::register(&catalog)?;
        Ok(Self { catalog, generic })
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn generic(&self) -> &GenericFormats {
        &self.generic
    }

    /// Checks that `paths` form an instance of `format`.
    ///
    /// # Errors
    /// * [`FormatsError::Definition`] for template formats.
    /// * [`FormatsError::FormatMismatch`] when the paths are missing, of the wrong kind or
    ///   count, fail the extension or magic number check, or a directory or set lacks one
    ///   of its content types.
    /// * [`FormatsError::Io`] when a file cannot be read.
    pub fn validate<P: AsRef<Path>>(&self, format: FormatId, paths: &[P]) -> Result<()> {
        self.catalog.ensure_instantiable(format)?;
        let ty = self.catalog.format(format)?;
        let name = self.catalog.display_name(format);

        if !self.catalog.is_subtype_of(format, FormatId::FILE_SET) {
            return Err(FormatsError::mismatch(format!("`{name}` is not a file-system format")));
        }
        if paths.is_empty() {
            return Err(FormatsError::mismatch(format!("no paths provided to `{name}`")));
        }
        if let Some(missing) = paths.iter().map(AsRef::as_ref).find(|p| !p.exists()) {
            return Err(FormatsError::mismatch(format!(
                "`{}` does not exist and cannot be a `{name}`",
                missing.display()
            )));
        }

        match self.shape(format, &ty) {
            Shape::Directory => self.validate_directory(&ty, &name, paths),
            Shape::Set => self.validate_set(&ty, &name, paths),
            Shape::File => validate_file(ty.traits(), &name, paths),
            Shape::Any => Ok(()),
        }
    }

    #[must_use]
    pub fn matches<P: AsRef<Path>>(&self, format: FormatId, paths: &[P]) -> bool {
        match self.validate(format, paths) {
            Ok(()) => true,
            Err(err) => {
                trace!(format = %self.catalog.display_name(format), error = %err, "no match");
                false
            },
        }
    }

    /// Validates `paths` and wraps them as an instance of `format`.
    ///
    /// # Errors
    /// Same as [`Recognizer::validate`].
    pub fn instantiate<P: AsRef<Path>>(&self, format: FormatId, paths: &[P]) -> Result<FsInstance> {
        self.validate(format, paths)?;
        Ok(FsInstance::new(format, paths.iter().map(|p| p.as_ref().to_path_buf()).collect()))
    }

    /// Typed children of a qualified directory or set: every child (or member) matching one
    /// of the content types, once per matching type.
    ///
    /// # Errors
    /// [`FormatsError::Io`] when the directory can no longer be listed.
    pub fn contents(&self, instance: &FsInstance) -> Result<Vec<FsInstance>> {
        let ty = self.catalog.format(instance.format())?;
        let candidates = match self.shape(instance.format(), &ty) {
            Shape::Directory => children(instance.fspath())?,
            Shape::Set => instance.paths().to_vec(),
            Shape::File | Shape::Any => return Ok(Vec::new()),
        };

        let mut found = Vec::new();
        for content_type in ty.non_wildcard_qualifiers() {
            for path in &candidates {
                if self.matches(content_type, std::slice::from_ref(path)) {
                    found.push(FsInstance::new(content_type, vec![path.clone()]));
                }
            }
        }
        Ok(found)
    }

    /// Every constrained base format (one with an extension or a magic number) that
    /// `paths` satisfy, restricted to `namespaces` when given.
    #[must_use]
    pub fn find_matching<P: AsRef<Path>>(&self, paths: &[P], namespaces: Option<&BTreeSet<String>>) -> Vec<FormatId> {
        let matching: Vec<FormatId> = self
            .catalog
            .base_formats()
            .into_iter()
            .filter(|id| {
                self.catalog.format(*id).is_ok_and(|ty| {
                    ty.traits().is_constrained()
                        && namespaces.is_none_or(|allowed| allowed.contains(ty.namespace()))
                })
            })
            .filter(|id| self.matches(*id, paths))
            .collect();

        debug!(paths = paths.len(), matches = matching.len(), "searched for matching formats");
        matching
    }

    fn shape(&self, format: FormatId, ty: &FormatType) -> Shape {
        if self.catalog.is_subtype_of(format, self.generic.directory) {
            Shape::Directory
        } else if self.catalog.is_subtype_of(format, self.generic.set_of) {
            Shape::Set
        } else if self.catalog.is_subtype_of(format, self.generic.file) || ty.traits().is_constrained() {
            Shape::File
        } else {
            Shape::Any
        }
    }

    fn validate_directory<P: AsRef<Path>>(&self, ty: &FormatType, name: &str, paths: &[P]) -> Result<()> {
        let [dir] = paths else {
            return Err(FormatsError::mismatch(format!(
                "`{name}` takes exactly one directory, got {} paths",
                paths.len()
            )));
        };
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(FormatsError::mismatch(format!("`{}` is not a directory (`{name}`)", dir.display())));
        }
        if let Some(ext) = &ty.traits().ext
            && !has_extension(dir, ext)
        {
            return Err(FormatsError::mismatch(format!(
                "directory `{}` does not end with `{ext}` (`{name}`)",
                dir.display()
            )));
        }

        let children = children(dir)?;
        self.require_contents(ty, &children, || format!("within the directory `{}` of `{name}`", dir.display()))
    }

    fn validate_set<P: AsRef<Path>>(&self, ty: &FormatType, name: &str, paths: &[P]) -> Result<()> {
        let members: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        self.require_contents(ty, &members, || format!("among the paths given to `{name}`"))
    }

    fn require_contents(
        &self,
        ty: &FormatType,
        candidates: &[PathBuf],
        location: impl FnOnce() -> String,
    ) -> Result<()> {
        let missing: Vec<FormatId> = ty
            .non_wildcard_qualifiers()
            .filter(|content_type| {
                !candidates.iter().any(|path| self.matches(*content_type, std::slice::from_ref(path)))
            })
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        let names: Vec<String> = missing.into_iter().map(|id| self.catalog.display_name(id)).collect();
        Err(FormatsError::mismatch(format!(
            "Did not find the required content types, {}, {}",
            names.join(", "),
            location()
        )))
    }
}

fn validate_file<P: AsRef<Path>>(traits: &FileTraits, name: &str, paths: &[P]) -> Result<()> {
    let [file] = paths else {
        return Err(FormatsError::mismatch(format!("`{name}` takes exactly one file, got {} paths", paths.len())));
    };
    let file = file.as_ref();
    if !file.is_file() {
        return Err(FormatsError::mismatch(format!("`{}` is not a regular file (`{name}`)", file.display())));
    }

    if traits.ext.is_some() && !traits.extensions().any(|ext| has_extension(file, ext)) {
        return Err(FormatsError::mismatch(format!(
            "`{}` does not have one of the extensions of `{name}`: {}",
            file.display(),
            traits.extensions().collect::<Vec<_>>().join(", ")
        )));
    }
    if let Some(magic) = &traits.magic
        && !read_magic(file, magic)?
    {
        return Err(FormatsError::mismatch(format!(
            "`{}` does not start with the magic number of `{name}` at offset {}",
            file.display(),
            magic.offset
        )));
    }
    Ok(())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.len() > ext.len() && name.to_ascii_lowercase().ends_with(&ext.to_ascii_lowercase()))
}

/// Whether `magic` is found at its offset. Files too short to hold it do not match.
fn read_magic(path: &Path, magic: &MagicNumber) -> Result<bool> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(magic.offset))?;
    let mut buf = vec![0u8; magic.bytes.len()];
    match file.read_exact(&mut buf) {
        Ok(()) => Ok(buf == *magic.bytes),
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Direct children of `dir`, sorted by name.
fn children(dir: &Path) -> Result<Vec<PathBuf>> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| {
            entry.map(walkdir::DirEntry::into_path).map_err(|err| {
                FormatsError::from(io::Error::from(err))
            })
        })
        .collect()
}
