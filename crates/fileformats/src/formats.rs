use crate::config::{FormatDeclaration, FormatsConfig, QualifierDeclaration};
use crate::error::{BootstrapError, BootstrapErrorExt};
use fileformats_core::{Catalog, FormatDef, FormatId, QualifierPolicy};
use fileformats_generic::{FsInstance, GenericFormats, Recognizer};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

/// A catalog holding the built-in, generic and configured formats, with path recognition.
#[derive(Debug, Clone)]
pub struct Formats {
    recognizer: Recognizer,
    standard_namespaces: BTreeSet<String>,
}

impl Formats {
    /// Builds a fresh catalog from `config`.
    ///
    /// # Errors
    /// * [`BootstrapError::Declaration`] for unparsable magic numbers.
    /// * [`BootstrapError::Formats`] for unknown parents or allowed qualifiers, and when the
    ///   catalog rejects a declaration.
    pub fn bootstrap(config: &FormatsConfig) -> Result<Self, BootstrapError> {
        let recognizer = Recognizer::new(Catalog::new())?;
        let formats = Self {
            recognizer,
            standard_namespaces: config.standard_namespaces.iter().cloned().collect(),
        };

        for declaration in &config.formats {
            formats
                .declare(declaration)
                .context(format!("declaring `{}/{}`", declaration.namespace, declaration.name))?;
        }

        info!(
            declared = config.formats.len(),
            namespaces = formats.catalog().namespaces().len(),
            "format catalog ready"
        );
        Ok(formats)
    }

    /// Defines one declared format.
    ///
    /// # Errors
    /// Same as [`Formats::bootstrap`].
    pub fn declare(&self, declaration: &FormatDeclaration) -> Result<FormatId, BootstrapError> {
        let catalog = self.catalog();
        let parent = match &declaration.parent {
            Some(parent) => catalog.from_mime_like(parent)?,
            None => self.generic().file,
        };

        let mut def = FormatDef::new(declaration.namespace.clone(), declaration.name.clone()).parent(parent);
        if let Some(ext) = &declaration.ext {
            def = def.ext(ext.clone());
        }
        for ext in &declaration.alternate_exts {
            def = def.alternate_ext(ext.clone());
        }
        if let Some(magic) = &declaration.magic {
            let bytes = hex::decode(magic.trim_start_matches("0x")).map_err(|err| {
                BootstrapError::Declaration {
                    message: format!("magic number `{magic}` is not hex: {err}").into(),
                    context: None,
                }
            })?;
            def = def.magic(bytes, declaration.magic_offset);
        }
        if let Some(qualifiers) = &declaration.qualifiers {
            def = def.qualifiable(self.policy(qualifiers)?);
        }

        let id = catalog.define(def)?;
        debug!(format = %catalog.display_name(id), "declared format");
        Ok(id)
    }

    fn policy(&self, declaration: &QualifierDeclaration) -> Result<QualifierPolicy, BootstrapError> {
        let mut policy = QualifierPolicy::new();
        if !declaration.multiple {
            policy = policy.single();
        }
        if declaration.ordered {
            policy = policy.ordered();
        }
        if declaration.generic {
            policy = policy.generic();
        }
        if !declaration.allowed.is_empty() {
            let allowed = declaration
                .allowed
                .iter()
                .map(|mime| self.catalog().from_mime_like(mime))
                .collect::<Result<Vec<_>, _>>()?;
            policy = policy.allowed(allowed);
        }
        Ok(policy)
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        self.recognizer.catalog()
    }

    #[must_use]
    pub const fn recognizer(&self) -> &Recognizer {
        &self.recognizer
    }

    #[must_use]
    pub const fn generic(&self) -> &GenericFormats {
        self.recognizer.generic()
    }

    #[must_use]
    pub const fn standard_namespaces(&self) -> &BTreeSet<String> {
        &self.standard_namespaces
    }

    /// Constrained formats matching `paths`; only the standard namespaces unless
    /// `any_namespace` is set.
    #[must_use]
    pub fn find_matching<P: AsRef<Path>>(&self, paths: &[P], any_namespace: bool) -> Vec<FormatId> {
        let namespaces = (!any_namespace).then_some(&self.standard_namespaces);
        self.recognizer.find_matching(paths, namespaces)
    }

    /// Wraps `paths` as an instance of the format named by `mime`.
    ///
    /// # Errors
    /// Unknown identifiers and paths that do not match the format.
    pub fn instantiate<P: AsRef<Path>>(&self, mime: &str, paths: &[P]) -> Result<FsInstance, BootstrapError> {
        let format = self.catalog().from_mime_like(mime)?;
        Ok(self.recognizer.instantiate(format, paths)?)
    }
}
