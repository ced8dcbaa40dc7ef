//! The catalog: arena of format types, name indexes and the shared lock.

use crate::converter::ConverterRegistry;
use crate::error::{FormatsError, Result};
use crate::types::{
    Derivation, FileTraits, FormatDef, FormatId, FormatType, PolicyChoice, TypeRef, Wildcard,
    WildcardId,
};
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Namespace of the built-in root types.
pub const CORE_NAMESPACE: &str = "core";

/// Shared handle over one format hierarchy.
///
/// Cloning is cheap and every clone sees the same types, qualified-type cache and
/// converter registry. Reads (subtype checks, lookups, resolution) share a read lock;
/// definitions, qualification misses and registrations take the write lock for the whole
/// check-then-insert sequence.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub(crate) state: Arc<RwLock<CatalogState>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub(crate) struct CatalogState {
    pub(crate) formats: Vec<Arc<FormatType>>,
    pub(crate) wildcards: Vec<Wildcard>,
    names: FxHashMap<String, FxHashMap<String, FormatId>>,
    generic_names: FxHashMap<String, FormatId>,
    /// Type-identity cache, owned per base: base id -> normalized qualifiers -> node.
    pub(crate) qualified: FxHashMap<FormatId, FxHashMap<Arc<[TypeRef]>, FormatId>>,
    pub(crate) converters: ConverterRegistry,
}

impl Catalog {
    /// A catalog holding only `core/DataType`, `core/FileSet` and `core/Field`.
    #[must_use]
    pub fn new() -> Self {
        Self { state: Arc::new(RwLock::new(CatalogState::new())) }
    }

    /// Adds a base type.
    ///
    /// # Errors
    /// [`FormatsError::Definition`] when the name or namespace is malformed, the name is
    /// taken, the parent or an allowed qualifier is not an existing base type, or a
    /// generically-qualifiable name collides with a name in any namespace.
    pub fn define(&self, def: FormatDef) -> Result<FormatId> {
        self.state.write().define(def)
    }

    /// Creates a wildcard standing for any subtype of `bound`. Every call yields a
    /// distinct wildcard, even for equal names.
    ///
    /// # Errors
    /// [`FormatsError::Definition`] for a malformed name or an unknown or qualified bound.
    pub fn type_var(&self, name: impl Into<Cow<'static, str>>, bound: FormatId) -> Result<WildcardId> {
        self.state.write().type_var(name.into(), bound)
    }

    /// # Errors
    /// [`FormatsError::Internal`] when the handle belongs to another catalog.
    pub fn format(&self, id: FormatId) -> Result<Arc<FormatType>> {
        self.state.read().format(id).cloned()
    }

    #[must_use]
    pub fn wildcard(&self, id: WildcardId) -> Option<Wildcard> {
        self.state.read().wildcards.get(id.index()).cloned()
    }

    #[must_use]
    pub fn lookup(&self, namespace: &str, name: &str) -> Option<FormatId> {
        self.state.read().lookup(namespace, name)
    }

    /// Looks up a generically-qualifiable base by name alone.
    #[must_use]
    pub fn lookup_generic(&self, name: &str) -> Option<FormatId> {
        self.state.read().lookup_generic(name)
    }

    /// `Name` for base types, `Name[A, B]` for qualified ones, the wildcard's own name
    /// for wildcards.
    #[must_use]
    pub fn display_name(&self, ty: impl Into<TypeRef>) -> String {
        self.state.read().display(ty.into())
    }

    /// Every base type, in definition order.
    #[must_use]
    pub fn base_formats(&self) -> Vec<FormatId> {
        let state = self.state.read();
        state.formats.iter().filter(|f| !f.is_qualified()).map(|f| f.id).collect()
    }

    #[must_use]
    pub fn namespaces(&self) -> BTreeSet<String> {
        self.state.read().names.keys().cloned().collect()
    }

    /// Nominal chain from `id` up to the root, `id` first.
    #[must_use]
    pub fn ancestry(&self, id: FormatId) -> Vec<FormatId> {
        self.state.read().ancestry(id).collect()
    }
}

impl CatalogState {
    fn new() -> Self {
        let mut state = Self {
            formats: Vec::new(),
            wildcards: Vec::new(),
            names: FxHashMap::default(),
            generic_names: FxHashMap::default(),
            qualified: FxHashMap::default(),
            converters: ConverterRegistry::default(),
        };
        for (id, name, parent) in [
            (FormatId::DATA_TYPE, "DataType", None),
            (FormatId::FILE_SET, "FileSet", Some(FormatId::DATA_TYPE)),
            (FormatId::FIELD, "Field", Some(FormatId::DATA_TYPE)),
        ] {
            state.insert_base(FormatType {
                id,
                name: Cow::Borrowed(name),
                namespace: Cow::Borrowed(CORE_NAMESPACE),
                parent,
                derivation: Derivation::Base,
                policy: None,
                traits: FileTraits::default(),
            });
        }
        debug_assert_eq!(state.formats.len(), FormatId::FIRST_DYNAMIC);
        state
    }

    pub(crate) fn format(&self, id: FormatId) -> Result<&Arc<FormatType>> {
        self.formats.get(id.index()).ok_or_else(|| {
            FormatsError::Internal {
                message: format!("format handle #{} is not part of this catalog", id.index()).into(),
                context: None,
            }
        })
    }

    pub(crate) fn wildcard(&self, id: WildcardId) -> Result<&Wildcard> {
        self.wildcards.get(id.index()).ok_or_else(|| FormatsError::Internal {
            message: format!("wildcard handle #{} is not part of this catalog", id.index()).into(),
            context: None,
        })
    }

    pub(crate) fn lookup(&self, namespace: &str, name: &str) -> Option<FormatId> {
        self.names.get(namespace).and_then(|names| names.get(name)).copied()
    }

    pub(crate) fn lookup_generic(&self, name: &str) -> Option<FormatId> {
        self.generic_names.get(name).copied()
    }

    pub(crate) fn ancestry(&self, id: FormatId) -> impl Iterator<Item = FormatId> + '_ {
        std::iter::successors(self.formats.get(id.index()).map(|f| f.id), |current| {
            self.formats.get(current.index()).and_then(|f| f.parent)
        })
    }

    pub(crate) fn display(&self, ty: TypeRef) -> String {
        match ty {
            TypeRef::Wildcard(id) => {
                self.wildcards.get(id.index()).map_or_else(|| format!("?{}", id.index()), |w| w.name.to_string())
            },
            TypeRef::Concrete(id) => match self.formats.get(id.index()) {
                None => format!("#{}", id.index()),
                Some(format) if format.qualifiers().is_empty() => format.name.to_string(),
                Some(format) => {
                    let qualifiers: Vec<String> =
                        format.qualifiers().iter().map(|q| self.display(*q)).collect();
                    format!("{}[{}]", format.name, qualifiers.join(", "))
                },
            },
        }
    }

    pub(crate) fn display_list(&self, types: impl IntoIterator<Item = TypeRef>) -> String {
        types.into_iter().map(|ty| format!("`{}`", self.display(ty))).collect::<Vec<_>>().join(", ")
    }

    pub(crate) fn next_format_id(&self) -> Result<FormatId> {
        u32::try_from(self.formats.len())
            .map(FormatId::new)
            .map_err(|_| FormatsError::Internal { message: "format arena is full".into(), context: None })
    }

    fn insert_base(&mut self, format: FormatType) {
        let id = format.id;
        if format.generically_qualifiable() {
            self.generic_names.insert(format.name.to_string(), id);
        }
        if format.policy.is_some() {
            self.qualified.entry(id).or_default();
        }
        self.names
            .entry(format.namespace.to_string())
            .or_default()
            .insert(format.name.to_string(), id);
        self.formats.push(Arc::new(format));
    }

    fn define(&mut self, def: FormatDef) -> Result<FormatId> {
        let qualified_name = format!("{}/{}", def.namespace, def.name);
        validate_name(&def.name).map_err(|e| with_subject(e, &qualified_name))?;
        validate_namespace(&def.namespace).map_err(|e| with_subject(e, &qualified_name))?;

        let parent = self.format(def.parent)?;
        if parent.is_qualified() {
            return Err(FormatsError::definition(format!(
                "`{qualified_name}` cannot derive from the qualified type `{}`",
                self.display(parent.id.into())
            )));
        }
        if self.lookup(&def.namespace, &def.name).is_some() {
            return Err(FormatsError::definition(format!("`{qualified_name}` is already defined")));
        }

        let policy = match def.policy {
            PolicyChoice::Inherit => parent.policy.clone(),
            PolicyChoice::Set(policy) => Some(policy),
            PolicyChoice::Disabled => None,
        };

        if let Some(allowed) = policy.as_ref().and_then(|p| p.allowed_qualifiers()) {
            for id in allowed {
                let allowed_format = self.format(*id)?;
                if allowed_format.is_qualified() {
                    return Err(FormatsError::definition(format!(
                        "`{qualified_name}` lists the qualified type `{}` as an allowed qualifier",
                        self.display((*id).into())
                    )));
                }
            }
        }

        let generic = policy.as_ref().is_some_and(|p| p.generically_qualifiable());
        if let Some(existing) = self.generic_names.get(def.name.as_ref()) {
            return Err(FormatsError::definition(format!(
                "`{qualified_name}` clashes with the generically qualifiable `{}`",
                self.display((*existing).into())
            )));
        }
        if generic
            && let Some((namespace, _)) =
                self.names.iter().find(|(_, names)| names.contains_key(def.name.as_ref()))
        {
            return Err(FormatsError::definition(format!(
                "generically qualifiable `{qualified_name}` clashes with `{namespace}/{}`",
                def.name
            )));
        }

        let id = self.next_format_id()?;
        self.insert_base(FormatType {
            id,
            name: def.name,
            namespace: def.namespace,
            parent: Some(def.parent),
            derivation: Derivation::Base,
            policy,
            traits: def.traits,
        });
        debug!(format = %qualified_name, id = id.index(), generic, "defined format type");
        Ok(id)
    }

    fn type_var(&mut self, name: Cow<'static, str>, bound: FormatId) -> Result<WildcardId> {
        validate_name(&name)?;
        let bound_format = self.format(bound)?;
        if bound_format.is_qualified() {
            return Err(FormatsError::definition(format!(
                "wildcard `{name}` must be bound by a base type, not `{}`",
                self.display(bound.into())
            )));
        }
        let index = u32::try_from(self.wildcards.len())
            .map_err(|_| FormatsError::Internal { message: "wildcard arena is full".into(), context: None })?;
        let id = WildcardId::new(index);
        debug!(wildcard = %name, bound = %bound_format, "created wildcard");
        self.wildcards.push(Wildcard { id, name, bound });
        Ok(id)
    }
}

/// Type names are `UpperCamelCase` ASCII so the MIME-like codec can invert them.
fn validate_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(FormatsError::definition(format!(
            "invalid type name `{name}`: expected an ASCII letter A-Z followed by letters or digits"
        )))
    }
}

fn validate_namespace(namespace: &str) -> Result<()> {
    let mut chars = namespace.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(FormatsError::definition(format!(
            "invalid namespace `{namespace}`: expected lowercase letters, digits, '-' or '_'"
        )))
    }
}

fn with_subject(err: FormatsError, subject: &str) -> FormatsError {
    match err {
        FormatsError::Definition { message, .. } => FormatsError::Definition {
            message,
            context: Some(format!("defining {subject}").into()),
        },
        other => other,
    }
}
