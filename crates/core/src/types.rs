//! Handles and nodes of the format hierarchy.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Handle of a format type in a [`Catalog`](crate::Catalog).
///
/// Handles are interned: two handles are equal iff they denote the same type, so
/// qualified types compare by identity just like base types.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FormatId(u32);

impl FormatId {
    /// Root of the hierarchy.
    pub const DATA_TYPE: Self = Self(0);
    /// Base of every format stored as one or more file-system paths.
    pub const FILE_SET: Self = Self(1);
    /// Base of every primitive field type.
    pub const FIELD: Self = Self(2);

    pub(crate) const FIRST_DYNAMIC: usize = 3;

    pub(crate) const fn new(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle of a wildcard (type variable) created by [`Catalog::type_var`](crate::Catalog::type_var).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct WildcardId(u32);

impl WildcardId {
    pub(crate) const fn new(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A qualifier or converter endpoint: either a concrete format or an unbound wildcard.
///
/// The derived ordering (all concrete handles before wildcards, then by handle) is the
/// canonical order of unordered qualifier collections.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum TypeRef {
    Concrete(FormatId),
    Wildcard(WildcardId),
}

impl TypeRef {
    #[must_use]
    pub const fn concrete(self) -> Option<FormatId> {
        match self {
            Self::Concrete(id) => Some(id),
            Self::Wildcard(_) => None,
        }
    }

    #[must_use]
    pub const fn wildcard(self) -> Option<WildcardId> {
        match self {
            Self::Wildcard(id) => Some(id),
            Self::Concrete(_) => None,
        }
    }

    #[must_use]
    pub const fn is_wildcard(self) -> bool {
        matches!(self, Self::Wildcard(_))
    }
}

impl From<FormatId> for TypeRef {
    fn from(id: FormatId) -> Self {
        Self::Concrete(id)
    }
}

impl From<WildcardId> for TypeRef {
    fn from(id: WildcardId) -> Self {
        Self::Wildcard(id)
    }
}

/// How a base type accepts qualifiers. Fixed when the base is defined and copied onto
/// every type synthesized from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifierPolicy {
    multiple: bool,
    allowed: Option<Arc<[FormatId]>>,
    ordered: bool,
    generic: bool,
}

impl Default for QualifierPolicy {
    fn default() -> Self {
        Self { multiple: true, allowed: None, ordered: false, generic: false }
    }
}

impl QualifierPolicy {
    /// Unrestricted, unordered, multiple qualifiers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// At most one qualifier.
    #[must_use = "policies are values; the modified policy must be used"]
    pub const fn single(mut self) -> Self {
        self.multiple = false;
        self
    }

    /// Qualifier position and repeats are significant.
    #[must_use = "policies are values; the modified policy must be used"]
    pub const fn ordered(mut self) -> Self {
        self.ordered = true;
        self
    }

    /// The base's namespace is omitted from MIME-like identifiers, so the name must be
    /// unique across every namespace.
    #[must_use = "policies are values; the modified policy must be used"]
    pub const fn generic(mut self) -> Self {
        self.generic = true;
        self
    }

    /// Every concrete qualifier must be a subtype of one of `allowed`.
    #[must_use = "policies are values; the modified policy must be used"]
    pub fn allowed(mut self, allowed: impl IntoIterator<Item = FormatId>) -> Self {
        self.allowed = Some(allowed.into_iter().collect());
        self
    }

    #[must_use]
    pub const fn multiple_qualifiers(&self) -> bool {
        self.multiple
    }

    #[must_use]
    pub fn allowed_qualifiers(&self) -> Option<&[FormatId]> {
        self.allowed.as_deref()
    }

    #[must_use]
    pub const fn ordered_qualifiers(&self) -> bool {
        self.ordered
    }

    #[must_use]
    pub const fn generically_qualifiable(&self) -> bool {
        self.generic
    }
}

/// Bytes expected at a fixed offset of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicNumber {
    pub bytes: Cow<'static, [u8]>,
    pub offset: u64,
}

/// Declarative matching data of file formats. Inert in the core; consumed by the
/// recognition code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTraits {
    pub ext: Option<Cow<'static, str>>,
    pub alternate_exts: Vec<Cow<'static, str>>,
    pub magic: Option<MagicNumber>,
}

impl FileTraits {
    /// Whether anything beyond structure distinguishes this format.
    #[must_use]
    pub const fn is_constrained(&self) -> bool {
        self.ext.is_some() || self.magic.is_some()
    }

    /// Primary extension first, then the alternates.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.ext.iter().chain(&self.alternate_exts).map(|ext| &**ext)
    }
}

/// How a node came to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Derivation {
    Base,
    Qualified { unqualified: FormatId, qualifiers: Arc<[TypeRef]> },
}

/// A node of the format hierarchy.
#[derive(Debug, Clone)]
pub struct FormatType {
    pub(crate) id: FormatId,
    pub(crate) name: Cow<'static, str>,
    pub(crate) namespace: Cow<'static, str>,
    pub(crate) parent: Option<FormatId>,
    pub(crate) derivation: Derivation,
    pub(crate) policy: Option<QualifierPolicy>,
    pub(crate) traits: FileTraits,
}

impl FormatType {
    #[must_use]
    pub const fn id(&self) -> FormatId {
        self.id
    }

    /// Name of the base type; qualified nodes share it.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Nominal parent. For qualified nodes this is the unqualified base.
    #[must_use]
    pub const fn parent(&self) -> Option<FormatId> {
        self.parent
    }

    #[must_use]
    pub const fn derivation(&self) -> &Derivation {
        &self.derivation
    }

    #[must_use]
    pub const fn is_qualified(&self) -> bool {
        matches!(self.derivation, Derivation::Qualified { .. })
    }

    /// The base this node was synthesized from, or the node itself for base types.
    #[must_use]
    pub const fn unqualified(&self) -> FormatId {
        match &self.derivation {
            Derivation::Base => self.id,
            Derivation::Qualified { unqualified, .. } => *unqualified,
        }
    }

    /// Normalized qualifiers; empty for base types.
    #[must_use]
    pub fn qualifiers(&self) -> &[TypeRef] {
        match &self.derivation {
            Derivation::Base => &[],
            Derivation::Qualified { qualifiers, .. } => qualifiers,
        }
    }

    pub fn wildcard_qualifiers(&self) -> impl Iterator<Item = WildcardId> + '_ {
        self.qualifiers().iter().filter_map(|q| q.wildcard())
    }

    pub fn non_wildcard_qualifiers(&self) -> impl Iterator<Item = FormatId> + '_ {
        self.qualifiers().iter().filter_map(|q| q.concrete())
    }

    #[must_use]
    pub const fn policy(&self) -> Option<&QualifierPolicy> {
        self.policy.as_ref()
    }

    #[must_use]
    pub fn ordered_qualifiers(&self) -> bool {
        self.policy.as_ref().is_some_and(QualifierPolicy::ordered_qualifiers)
    }

    #[must_use]
    pub fn generically_qualifiable(&self) -> bool {
        self.policy.as_ref().is_some_and(QualifierPolicy::generically_qualifiable)
    }

    #[must_use]
    pub const fn traits(&self) -> &FileTraits {
        &self.traits
    }
}

impl fmt::Display for FormatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A named placeholder standing for any subtype of `bound`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wildcard {
    pub(crate) id: WildcardId,
    pub(crate) name: Cow<'static, str>,
    pub(crate) bound: FormatId,
}

impl Wildcard {
    #[must_use]
    pub const fn id(&self) -> WildcardId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn bound(&self) -> FormatId {
        self.bound
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) enum PolicyChoice {
    #[default]
    Inherit,
    Set(QualifierPolicy),
    Disabled,
}

/// Declaration of a new base type, consumed by [`Catalog::define`](crate::Catalog::define).
///
/// # Examples
///
/// ```
/// use fileformats_core::{Catalog, FormatDef, FormatId, QualifierPolicy};
///
/// let catalog = Catalog::new();
/// let png = catalog.define(FormatDef::new("image", "Png").parent(FormatId::FILE_SET).ext(".png"))?;
/// let dir = catalog.define(
///     FormatDef::new("generic", "Folder")
///         .parent(FormatId::FILE_SET)
///         .qualifiable(QualifierPolicy::new().generic()),
/// )?;
/// assert_eq!(catalog.to_mime_like(catalog.qualify(dir, [png])?)?, "image/png+folder");
/// # Ok::<(), fileformats_core::FormatsError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FormatDef {
    pub(crate) namespace: Cow<'static, str>,
    pub(crate) name: Cow<'static, str>,
    pub(crate) parent: FormatId,
    pub(crate) policy: PolicyChoice,
    pub(crate) traits: FileTraits,
}

impl FormatDef {
    /// A new base type deriving directly from `DataType`.
    pub fn new(namespace: impl Into<Cow<'static, str>>, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            parent: FormatId::DATA_TYPE,
            policy: PolicyChoice::Inherit,
            traits: FileTraits::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use = "definitions are values; the modified definition must be used"]
    pub const fn parent(mut self, parent: FormatId) -> Self {
        self.parent = parent;
        self
    }

    /// Overrides the qualifier policy inherited from the parent.
    #[must_use = "definitions are values; the modified definition must be used"]
    pub fn qualifiable(mut self, policy: QualifierPolicy) -> Self {
        self.policy = PolicyChoice::Set(policy);
        self
    }

    /// Refuses qualifiers even if the parent accepts them.
    #[must_use = "definitions are values; the modified definition must be used"]
    pub fn unqualifiable(mut self) -> Self {
        self.policy = PolicyChoice::Disabled;
        self
    }

    #[must_use = "definitions are values; the modified definition must be used"]
    pub fn ext(mut self, ext: impl Into<Cow<'static, str>>) -> Self {
        self.traits.ext = Some(dotted(ext.into()));
        self
    }

    #[must_use = "definitions are values; the modified definition must be used"]
    pub fn alternate_ext(mut self, ext: impl Into<Cow<'static, str>>) -> Self {
        self.traits.alternate_exts.push(dotted(ext.into()));
        self
    }

    #[must_use = "definitions are values; the modified definition must be used"]
    pub fn magic(mut self, bytes: impl Into<Cow<'static, [u8]>>, offset: u64) -> Self {
        self.traits.magic = Some(MagicNumber { bytes: bytes.into(), offset });
        self
    }
}

fn dotted(ext: Cow<'static, str>) -> Cow<'static, str> {
    if ext.starts_with('.') { ext } else { Cow::Owned(format!(".{ext}")) }
}
