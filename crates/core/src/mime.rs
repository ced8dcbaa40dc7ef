//! Reversible MIME-like identifiers.
//!
//! Base types render as `namespace/dasherized-name` (`medimage/dicom-dir`). Qualified
//! types render as `namespace/q1.q2+base`, which requires the qualifiers (and the base,
//! unless it is generically qualifiable) to share a single namespace.

use crate::catalog::{Catalog, CatalogState};
use crate::error::{FormatsError, Result};
use crate::types::{FormatId, TypeRef};
use std::collections::BTreeSet;

const QUALIFIER_SEPARATOR: &str = ".";
const BASE_SEPARATOR: &str = "+";

impl Catalog {
    /// # Errors
    /// [`FormatsError::FormatRecognition`] when the qualifiers of `id` do not share one
    /// namespace, or a qualifier is a wildcard or itself qualified.
    pub fn to_mime_like(&self, id: FormatId) -> Result<String> {
        self.state.read().to_mime_like(id)
    }

    /// Parses an identifier produced by [`Catalog::to_mime_like`], returning the identical
    /// handle. A leading `x-` is dropped from a name only when the prefixed name is
    /// unknown, so `x-ray` still names `XRay`.
    ///
    /// # Errors
    /// [`FormatsError::FormatRecognition`] for malformed identifiers or unknown names, and
    /// any [`FormatsError::Qualifier`] raised while qualifying the base.
    ///
    /// # Examples
    ///
    /// ```
    /// use fileformats_core::{Catalog, FormatDef, FormatId};
    ///
    /// let catalog = Catalog::new();
    /// let dicom_dir = catalog.define(FormatDef::new("medimage", "DicomDir").parent(FormatId::FILE_SET))?;
    /// assert_eq!(catalog.to_mime_like(dicom_dir)?, "medimage/dicom-dir");
    /// assert_eq!(catalog.from_mime_like("medimage/x-dicom-dir")?, dicom_dir);
    /// # Ok::<(), fileformats_core::FormatsError>(())
    /// ```
    pub fn from_mime_like(&self, mime: &str) -> Result<FormatId> {
        let (base, qualifiers) = self.state.read().parse_mime_like(mime)?;
        if qualifiers.is_empty() { Ok(base) } else { self.qualify(base, qualifiers) }
    }
}

impl CatalogState {
    fn to_mime_like(&self, id: FormatId) -> Result<String> {
        let format = self.format(id)?;
        if !format.is_qualified() {
            return Ok(format!("{}/{}", format.namespace(), dasherize(format.name())));
        }

        let mut namespaces = BTreeSet::new();
        let mut names = Vec::with_capacity(format.qualifiers().len());
        for qualifier in format.qualifiers() {
            let TypeRef::Concrete(qualifier) = qualifier else {
                return Err(FormatsError::recognition(format!(
                    "`{}` has wildcard qualifiers and no MIME-like identifier",
                    self.display(id.into())
                )));
            };
            let qualifier = self.format(*qualifier)?;
            if qualifier.is_qualified() {
                return Err(FormatsError::recognition(format!(
                    "cannot create a reversible MIME-like identifier for `{}` as its qualifier `{}` is itself qualified",
                    self.display(id.into()),
                    self.display(qualifier.id().into())
                )));
            }
            namespaces.insert(qualifier.namespace());
            names.push(dasherize(qualifier.name()));
        }
        if !format.generically_qualifiable() {
            namespaces.insert(format.namespace());
        }

        let mut shared = namespaces.iter();
        let (Some(namespace), None) = (shared.next(), shared.next()) else {
            return Err(FormatsError::recognition(format!(
                "Cannot create reversible MIME type for `{}` as there is not a common namespace between all qualifiers: {}",
                self.display(id.into()),
                namespaces.iter().copied().collect::<Vec<_>>().join(", ")
            )));
        };

        if !format.ordered_qualifiers() {
            names.sort_unstable();
        }
        Ok(format!(
            "{namespace}/{}{BASE_SEPARATOR}{}",
            names.join(QUALIFIER_SEPARATOR),
            dasherize(format.name())
        ))
    }

    /// Resolves the base and qualifier handles named by `mime`, without qualifying.
    fn parse_mime_like(&self, mime: &str) -> Result<(FormatId, Vec<TypeRef>)> {
        let mime = mime.trim();
        let Some((namespace, subtype)) = mime.split_once('/') else {
            return Err(FormatsError::recognition(format!("`{mime}` is not a MIME-like identifier")));
        };
        if namespace.is_empty() || subtype.strip_prefix("x-").unwrap_or(subtype).is_empty() {
            return Err(FormatsError::recognition(format!("`{mime}` is not a MIME-like identifier")));
        }

        let resolve = |name: &str| {
            lookup_name(name, |candidate| self.lookup(namespace, candidate)).ok_or_else(|| {
                FormatsError::recognition(format!("no format named `{name}` in namespace `{namespace}`"))
            })
        };

        match subtype.split_once(BASE_SEPARATOR) {
            None => Ok((resolve(subtype)?, Vec::new())),
            Some((qualifiers, base)) => {
                let base = lookup_name(base, |candidate| self.lookup_generic(candidate))
                    .map_or_else(|| resolve(base), Ok)?;
                let qualifiers = qualifiers
                    .split(QUALIFIER_SEPARATOR)
                    .map(|name| resolve(name).map(TypeRef::Concrete))
                    .collect::<Result<Vec<_>>>()?;
                Ok((base, qualifiers))
            },
        }
    }
}

/// Looks up a dasherized name. `x-ray` resolves to `XRay` when such a type exists; only
/// otherwise is a leading `x-` treated as the experimental-subtype prefix and dropped.
fn lookup_name(name: &str, lookup: impl Fn(&str) -> Option<FormatId>) -> Option<FormatId> {
    lookup(&undasherize(name)).or_else(|| name.strip_prefix("x-").and_then(|bare| lookup(&undasherize(bare))))
}

/// `DicomDir` -> `dicom-dir`.
#[must_use]
pub fn dasherize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// `dicom-dir` -> `DicomDir`, `x-ray` -> `XRay`.
#[must_use]
pub fn undasherize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for ch in name.chars() {
        if ch == '-' {
            upper = true;
        } else if upper {
            out.push(ch.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}
