use fileformats_core::{Catalog, FormatDef, FormatId, QualifierPolicy, Result};
use tracing::debug;

pub const GENERIC_NAMESPACE: &str = "generic";

/// Handles of the generic file-system formats in one catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericFormats {
    /// Any existing path.
    pub fs_object: FormatId,
    /// Exactly one regular file.
    pub file: FormatId,
    /// Exactly one directory, qualified by the formats of its children.
    pub directory: FormatId,
    /// A loose collection of paths, qualified by the formats it must contain.
    pub set_of: FormatId,
}

impl GenericFormats {
    /// Defines `generic/FsObject`, `generic/File`, `generic/Directory` and `generic/SetOf`,
    /// or returns the existing handles when `catalog` already has them.
    ///
    /// # Errors
    /// [`fileformats_core::FormatsError::Definition`] when the names are taken by
    /// incompatible definitions, e.g. another generically-qualifiable `Directory`.
    pub fn register(catalog: &Catalog) -> Result<Self> {
        let define = |def: FormatDef| -> Result<FormatId> {
            match catalog.lookup(GENERIC_NAMESPACE, def.name()) {
                Some(id) => Ok(id),
                None => catalog.define(def),
            }
        };

        let fs_object = define(FormatDef::new(GENERIC_NAMESPACE, "FsObject").parent(FormatId::FILE_SET))?;
        let file = define(FormatDef::new(GENERIC_NAMESPACE, "File").parent(fs_object))?;
        let directory = define(
            FormatDef::new(GENERIC_NAMESPACE, "Directory")
                .parent(fs_object)
                .qualifiable(QualifierPolicy::new().generic().allowed([FormatId::FILE_SET])),
        )?;
        let set_of = define(
            FormatDef::new(GENERIC_NAMESPACE, "SetOf")
                .parent(FormatId::FILE_SET)
                .qualifiable(QualifierPolicy::new().generic().allowed([FormatId::FILE_SET])),
        )?;

        debug!(namespace = GENERIC_NAMESPACE, "generic formats registered");
        Ok(Self { fs_object, file, directory, set_of })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_idempotent() -> Result<()> {
        let catalog = Catalog::new();
        let first = GenericFormats::register(&catalog)?;
        let second = GenericFormats::register(&catalog)?;
        assert_eq!(first, second);
        assert_eq!(catalog.lookup_generic("Directory"), Some(first.directory));
        assert!(catalog.is_subtype_of(first.file, FormatId::FILE_SET));
        Ok(())
    }

    #[test]
    fn directories_of_files_render_in_the_content_namespace() -> Result<()> {
        let catalog = Catalog::new();
        let generic = GenericFormats::register(&catalog)?;
        let png = catalog.define(FormatDef::new("image", "Png").parent(generic.file).ext(".png"))?;

        let dir = catalog.qualify(generic.directory, [png])?;
        assert_eq!(catalog.to_mime_like(dir)?, "image/png+directory");
        assert_eq!(catalog.from_mime_like("image/png+set-of")?, catalog.qualify(generic.set_of, [png])?);
        Ok(())
    }
}
