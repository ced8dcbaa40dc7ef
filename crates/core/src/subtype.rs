//! Subtype relation over base, qualified and wildcard types.

use crate::catalog::{Catalog, CatalogState};
use crate::types::{Derivation, FormatId, TypeRef};

impl Catalog {
    /// Whether `candidate` can be used wherever `target` is expected.
    ///
    /// * Nominal: `target` is on the parent chain of `candidate` (a qualified type's
    ///   parent is its unqualified base, so `J[A]` is a `J` and an `H`).
    /// * Both qualified: the unqualified bases must be related; ordered bases then need
    ///   identical qualifier sequences, unordered bases need every qualifier of `target`
    ///   among those of `candidate` (more qualifiers is more specific).
    /// * A qualified `target` is never satisfied by an unqualified `candidate`.
    /// * Wildcards compare through their bounds; a concrete type is never a subtype of a
    ///   wildcard.
    ///
    /// Unknown handles are never subtypes of anything.
    #[must_use]
    pub fn is_subtype_of(&self, candidate: impl Into<TypeRef>, target: impl Into<TypeRef>) -> bool {
        self.state.read().is_subtype(candidate.into(), target.into())
    }
}

impl CatalogState {
    pub(crate) fn is_subtype(&self, candidate: TypeRef, target: TypeRef) -> bool {
        match (candidate, target) {
            (TypeRef::Concrete(c), TypeRef::Concrete(t)) => self.is_subtype_format(c, t),
            (TypeRef::Wildcard(c), TypeRef::Wildcard(t)) => {
                c == t
                    || matches!(
                        (self.wildcard(c), self.wildcard(t)),
                        (Ok(c), Ok(t)) if self.is_subtype_format(c.bound, t.bound)
                    )
            },
            (TypeRef::Wildcard(c), TypeRef::Concrete(t)) => {
                self.wildcard(c).is_ok_and(|w| self.is_subtype_format(w.bound, t))
            },
            (TypeRef::Concrete(_), TypeRef::Wildcard(_)) => false,
        }
    }

    pub(crate) fn is_subtype_format(&self, candidate: FormatId, target: FormatId) -> bool {
        if self.descends_from(candidate, target) {
            return true;
        }
        let (Ok(cand), Ok(tgt)) = (self.format(candidate), self.format(target)) else {
            return false;
        };
        let Derivation::Qualified { unqualified: target_base, qualifiers: wanted } = tgt.derivation() else {
            return false;
        };
        let Derivation::Qualified { unqualified: candidate_base, qualifiers: present } = cand.derivation() else {
            return false;
        };
        if !self.descends_from(*candidate_base, *target_base) {
            return false;
        }

        if cand.ordered_qualifiers() {
            present == wanted
        } else {
            wanted.iter().all(|q| self.qualifier_present(*q, present))
        }
    }

    /// Nominal ancestry only: `ancestor` lies on the parent chain of `id` (or is `id`).
    pub(crate) fn descends_from(&self, id: FormatId, ancestor: FormatId) -> bool {
        self.ancestry(id).any(|current| current == ancestor)
    }

    /// Set membership by identity; a wanted wildcard is also covered by a present
    /// wildcard whose bound is at least as specific.
    pub(crate) fn qualifier_present(&self, wanted: TypeRef, present: &[TypeRef]) -> bool {
        present.iter().any(|p| {
            *p == wanted || (wanted.is_wildcard() && p.is_wildcard() && self.is_subtype(*p, wanted))
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Result;
    use crate::{Catalog, FormatDef, FormatId, QualifierPolicy, TypeRef};

    #[test]
    fn wildcards_compare_through_bounds() -> Result<()> {
        let catalog = Catalog::new();
        let file = catalog.define(FormatDef::new("testing", "File").parent(FormatId::FILE_SET))?;
        let any = catalog.type_var("AnyData", FormatId::DATA_TYPE)?;
        let files = catalog.type_var("AnyFile", file)?;

        assert!(catalog.is_subtype_of(files, any));
        assert!(!catalog.is_subtype_of(any, files));
        assert!(catalog.is_subtype_of(files, FormatId::FILE_SET));
        assert!(!catalog.is_subtype_of(file, files));
        Ok(())
    }

    #[test]
    fn template_with_narrower_wildcard_is_a_subtype() -> Result<()> {
        let catalog = Catalog::new();
        let f = catalog.define(FormatDef::new("testing", "F").qualifiable(QualifierPolicy::new()))?;
        let any = catalog.type_var("AnyData", FormatId::DATA_TYPE)?;
        let file_sets = catalog.type_var("AnyFileSet", FormatId::FILE_SET)?;

        let narrow = catalog.qualify(f, [file_sets])?;
        let wide = catalog.qualify(f, [any])?;
        assert!(catalog.is_subtype_of(narrow, wide));
        assert!(!catalog.is_subtype_of(wide, narrow));
        Ok(())
    }

    #[test]
    fn ordered_bases_need_identical_sequences() -> Result<()> {
        let catalog = Catalog::new();
        let a = catalog.define(FormatDef::new("testing", "A").parent(FormatId::FILE_SET))?;
        let b = catalog.define(FormatDef::new("testing", "B").parent(FormatId::FILE_SET))?;
        let k = catalog.define(FormatDef::new("testing", "K").qualifiable(QualifierPolicy::new().ordered()))?;

        let kab = catalog.qualify(k, [a, b])?;
        let kba = catalog.qualify(k, [b, a])?;
        let kaba = catalog.qualify(k, [a, b, a])?;
        assert!(catalog.is_subtype_of(kab, kab));
        assert!(!catalog.is_subtype_of(kab, kba));
        assert!(!catalog.is_subtype_of(kaba, kab));
        assert!(catalog.is_subtype_of(kaba, k));
        assert!(!catalog.is_subtype_of(TypeRef::from(k), TypeRef::from(kab)));
        Ok(())
    }
}
