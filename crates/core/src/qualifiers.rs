//! Qualification of base types and the per-base type-identity cache.

use crate::catalog::{Catalog, CatalogState};
use crate::error::{FormatsError, FormatsErrorExt, Result};
use crate::types::{Derivation, FormatId, FormatType, TypeRef, WildcardId};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::trace;

impl Catalog {
    /// Returns the type `base[qualifiers]`, synthesizing it on first use.
    ///
    /// Unordered bases sort their qualifiers, so any permutation yields the same handle;
    /// ordered bases keep order and repeats. Repeated calls return the identical handle.
    ///
    /// # Errors
    /// [`FormatsError::Qualifier`] when `base` does not accept qualifiers or is already
    /// qualified, no qualifiers are given, more than one is given to a single-qualifier
    /// base, a concrete qualifier is not a subtype of any allowed qualifier, or an
    /// unordered base receives the same qualifier twice.
    ///
    /// # Examples
    ///
    /// ```
    /// use fileformats_core::{Catalog, FormatDef, FormatId, QualifierPolicy};
    ///
    /// let catalog = Catalog::new();
    /// let a = catalog.define(FormatDef::new("testing", "A").parent(FormatId::FILE_SET))?;
    /// let b = catalog.define(FormatDef::new("testing", "B").parent(FormatId::FILE_SET))?;
    /// let f = catalog.define(FormatDef::new("testing", "F").qualifiable(QualifierPolicy::new()))?;
    ///
    /// assert_eq!(catalog.qualify(f, [a, b])?, catalog.qualify(f, [b, a])?);
    /// # Ok::<(), fileformats_core::FormatsError>(())
    /// ```
    pub fn qualify<I>(&self, base: FormatId, qualifiers: I) -> Result<FormatId>
    where
        I: IntoIterator,
        I::Item: Into<TypeRef>,
    {
        let requested: Vec<TypeRef> = qualifiers.into_iter().map(Into::into).collect();

        let normalized = {
            let state = self.state.read();
            let normalized = state.normalize_qualifiers(base, requested)?;
            if let Some(id) = state.cached_qualified(base, &normalized) {
                trace!(base = base.index(), id = id.index(), "qualified type cache hit");
                return Ok(id);
            }
            normalized
        };

        self.state.write().intern_qualified(base, normalized)
    }

    /// Wildcards among the direct qualifiers of `id`; empty for base types.
    #[must_use]
    pub fn wildcard_qualifiers(&self, id: FormatId) -> BTreeSet<WildcardId> {
        let state = self.state.read();
        state.format(id).map(|f| f.wildcard_qualifiers().collect()).unwrap_or_default()
    }

    /// Concrete direct qualifiers of `id`; empty for base types.
    #[must_use]
    pub fn non_wildcard_qualifiers(&self, id: FormatId) -> BTreeSet<FormatId> {
        let state = self.state.read();
        state.format(id).map(|f| f.non_wildcard_qualifiers().collect()).unwrap_or_default()
    }

    /// Whether `id` carries a wildcard, directly or through a qualified qualifier.
    #[must_use]
    pub fn is_template(&self, id: FormatId) -> bool {
        self.state.read().is_template(id)
    }

    /// Template types only describe converter signatures and have no instances.
    ///
    /// # Errors
    /// [`FormatsError::Definition`] when `id` is a template type.
    pub fn ensure_instantiable(&self, id: FormatId) -> Result<()> {
        self.state.read().ensure_instantiable(id)
    }
}

impl CatalogState {
    /// Validates `requested` against the policy of `base` and puts it in canonical order.
    pub(crate) fn normalize_qualifiers(
        &self,
        base: FormatId,
        mut requested: Vec<TypeRef>,
    ) -> Result<Vec<TypeRef>> {
        let format = self.format(base)?;
        let subject = self.display(base.into());

        if let Derivation::Qualified { unqualified, .. } = format.derivation() {
            return Err(FormatsError::qualifier(format!(
                "`{subject}` is already qualified; qualify `{}` instead",
                self.display((*unqualified).into())
            )));
        }
        let Some(policy) = format.policy() else {
            return Err(FormatsError::qualifier(format!("`{subject}` does not accept qualifiers")));
        };
        if requested.is_empty() {
            return Err(FormatsError::qualifier(format!("no qualifiers provided to `{subject}`")));
        }
        for qualifier in &requested {
            self.check_handle(*qualifier).context(format!("qualifying `{subject}`"))?;
        }

        if !policy.multiple_qualifiers() && requested.len() > 1 {
            return Err(FormatsError::qualifier(format!(
                "Multiple qualifiers not permitted for `{subject}`: {}",
                self.display_list(requested)
            )));
        }

        if let Some(allowed) = policy.allowed_qualifiers() {
            let invalid: Vec<TypeRef> = requested
                .iter()
                .copied()
                .filter(|q| {
                    q.concrete().is_some_and(|id| {
                        !allowed.iter().any(|ok| self.is_subtype_format(id, *ok))
                    })
                })
                .collect();
            if !invalid.is_empty() {
                return Err(FormatsError::qualifier(format!(
                    "Invalid content types provided to `{subject}`: {} (allowed: {})",
                    self.display_list(invalid),
                    self.display_list(allowed.iter().copied().map(TypeRef::from)),
                )));
            }
        }

        if !policy.ordered_qualifiers() {
            requested.sort_unstable();
            let repeated: BTreeSet<TypeRef> =
                requested.windows(2).filter(|pair| pair[0] == pair[1]).map(|pair| pair[0]).collect();
            if !repeated.is_empty() {
                return Err(FormatsError::qualifier(format!(
                    "Cannot have more than one occurrence of a qualifier in `{subject}`: {}",
                    self.display_list(repeated)
                )));
            }
        }

        Ok(requested)
    }

    pub(crate) fn cached_qualified(&self, base: FormatId, normalized: &[TypeRef]) -> Option<FormatId> {
        self.qualified.get(&base).and_then(|cache| cache.get(normalized)).copied()
    }

    /// Inserts the node for `base[normalized]` unless another caller won the race.
    pub(crate) fn intern_qualified(&mut self, base: FormatId, normalized: Vec<TypeRef>) -> Result<FormatId> {
        if let Some(id) = self.cached_qualified(base, &normalized) {
            trace!(base = base.index(), id = id.index(), "qualified type created concurrently");
            return Ok(id);
        }

        let id = self.next_format_id()?;
        let qualifiers: Arc<[TypeRef]> = normalized.into();
        let node = {
            let base_format = self.format(base)?;
            FormatType {
                id,
                name: base_format.name.clone(),
                namespace: base_format.namespace.clone(),
                parent: Some(base),
                derivation: Derivation::Qualified { unqualified: base, qualifiers: Arc::clone(&qualifiers) },
                policy: base_format.policy.clone(),
                traits: base_format.traits.clone(),
            }
        };

        self.formats.push(Arc::new(node));
        self.qualified.entry(base).or_default().insert(qualifiers, id);
        trace!(base = base.index(), id = id.index(), name = %self.display(id.into()), "synthesized qualified type");
        Ok(id)
    }

    pub(crate) fn is_template(&self, id: FormatId) -> bool {
        self.format(id).is_ok_and(|format| {
            format.qualifiers().iter().any(|q| match q {
                TypeRef::Wildcard(_) => true,
                TypeRef::Concrete(inner) => self.is_template(*inner),
            })
        })
    }

    pub(crate) fn ensure_instantiable(&self, id: FormatId) -> Result<()> {
        if self.is_template(id) {
            Err(FormatsError::definition(format!(
                "`{}` carries wildcard qualifiers and only describes converter templates",
                self.display(id.into())
            )))
        } else {
            self.format(id).map(|_| ())
        }
    }

    fn check_handle(&self, ty: TypeRef) -> Result<()> {
        match ty {
            TypeRef::Concrete(id) => self.format(id).map(|_| ()),
            TypeRef::Wildcard(id) => self.wildcard(id).map(|_| ()),
        }
    }
}
