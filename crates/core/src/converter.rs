//! Converter registration and resolution.
//!
//! Registrations come in three shapes, selected by the wildcards of the target:
//!
//! * **direct**: the target has no wildcard (`F[A] -> H[A]`). Stored in the target's own
//!   table, keyed by source.
//! * **template**: the target carries exactly one wildcard. The source is either that
//!   same bare wildcard (generic-to-template, `T -> F[T]`) or a qualified type carrying
//!   it (template-to-template, `F[T] -> H[T]`). Stored under the target's unqualified
//!   base together with the target's qualifiers.
//! * **generic target**: the target is a bare wildcard bound by the source's qualifier
//!   (template-to-generic, `Zip[T] -> T`).
//!
//! Resolution tries direct entries first, then templates, then generic targets, and
//! stops at the first shape that yields anything.

use crate::catalog::{Catalog, CatalogState};
use crate::error::{FormatsError, FormatsErrorExt, Result};
use crate::types::{Derivation, FormatId, TypeRef, WildcardId};
use fxhash::FxHashMap;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::panic::Location;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fixed keyword arguments handed to a task when it is created.
pub type ConverterKwargs = BTreeMap<String, serde_json::Value>;

/// A runnable unit of work produced by a converter. The catalog never runs tasks; it
/// only hands them to the caller.
pub trait Task: fmt::Debug + Send {
    fn name(&self) -> &str;

    /// Names under which the task exposes its results once executed.
    fn output_names(&self) -> Vec<String>;
}

type Generator = dyn Fn(&ConverterKwargs) -> Box<dyn Task> + Send + Sync;

/// A named task generator with the source location it was defined at.
///
/// Two specs are the same converter when both name and definition site agree, which is
/// what makes re-registering an identical converter harmless.
#[derive(Clone)]
pub struct TaskSpec {
    name: Cow<'static, str>,
    origin: &'static Location<'static>,
    generate: Arc<Generator>,
}

impl TaskSpec {
    #[track_caller]
    pub fn new<F>(name: impl Into<Cow<'static, str>>, generate: F) -> Self
    where
        F: Fn(&ConverterKwargs) -> Box<dyn Task> + Send + Sync + 'static,
    {
        Self { name: name.into(), origin: Location::caller(), generate: Arc::new(generate) }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn origin(&self) -> &'static Location<'static> {
        self.origin
    }

    #[must_use]
    pub fn same_origin(&self, other: &Self) -> bool {
        self.name == other.name && self.origin == other.origin
    }

    #[must_use]
    pub fn build(&self, kwargs: &ConverterKwargs) -> Box<dyn Task> {
        (self.generate)(kwargs)
    }
}

impl fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSpec").field("name", &self.name).field("origin", &self.origin).finish_non_exhaustive()
    }
}

/// A registered converter: task generator, fixed kwargs and registration site.
#[derive(Debug, Clone)]
pub struct Converter {
    task: TaskSpec,
    kwargs: ConverterKwargs,
    registered_at: &'static Location<'static>,
}

impl Converter {
    #[must_use]
    pub const fn task(&self) -> &TaskSpec {
        &self.task
    }

    #[must_use]
    pub const fn kwargs(&self) -> &ConverterKwargs {
        &self.kwargs
    }

    #[must_use]
    pub const fn registered_at(&self) -> &'static Location<'static> {
        self.registered_at
    }

    /// Creates the task with the registered kwargs.
    #[must_use]
    pub fn create_task(&self) -> Box<dyn Task> {
        self.task.build(&self.kwargs)
    }

    fn is_duplicate_of(&self, other: &Self) -> bool {
        self.task.same_origin(&other.task) && self.kwargs == other.kwargs
    }
}

impl fmt::Display for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` (defined at {}, registered at {})", self.task.name, self.task.origin, self.registered_at)
    }
}

#[derive(Debug)]
struct DirectEntry {
    source: FormatId,
    converter: Converter,
}

#[derive(Debug)]
struct TemplateEntry {
    source: TypeRef,
    target_qualifiers: Arc<[TypeRef]>,
    converter: Converter,
}

#[derive(Debug)]
struct GenericTargetEntry {
    source: FormatId,
    target: WildcardId,
    converter: Converter,
}

/// Per-target converter tables.
#[derive(Debug, Default)]
pub(crate) struct ConverterRegistry {
    direct: FxHashMap<FormatId, Vec<DirectEntry>>,
    templates: FxHashMap<FormatId, Vec<TemplateEntry>>,
    generic_targets: Vec<GenericTargetEntry>,
}

/// Where a registration goes, decided before touching the registry.
#[derive(Debug)]
enum Slot {
    Direct { target: FormatId, source: FormatId },
    Template { base: FormatId, source: TypeRef, target_qualifiers: Arc<[TypeRef]> },
    GenericTarget { source: FormatId, target: WildcardId },
}

impl Catalog {
    /// Registers `task` (with fixed `kwargs`) as a converter from `source` to `target`.
    ///
    /// Re-registering the same task (same name and definition site) with equal kwargs
    /// is accepted and logged; any other registration under an existing key fails.
    ///
    /// # Errors
    /// * [`FormatsError::Definition`] when the wildcards of source and target do not form
    ///   one of the supported shapes.
    /// * [`FormatsError::ConverterConflict`] when a different converter already occupies
    ///   the key. The message names both converters and where they were registered.
    #[track_caller]
    pub fn register_converter(
        &self,
        source: impl Into<TypeRef>,
        target: impl Into<TypeRef>,
        task: TaskSpec,
        kwargs: ConverterKwargs,
    ) -> Result<()> {
        let converter = Converter { task, kwargs, registered_at: Location::caller() };
        let (source, target) = (source.into(), target.into());

        let mut state = self.state.write();
        state.register_converter(source, target, converter).with_context(|| {
            format!("registering `{}` -> `{}`", state.display(source), state.display(target))
        })
    }

    /// Every converter able to turn `source` into `target`. Never fails; an empty list
    /// means no conversion is registered.
    #[must_use]
    pub fn converters(&self, source: FormatId, target: FormatId) -> Vec<Converter> {
        self.state.read().resolve_converters(source, target)
    }

    /// The single converter from `source` to `target`, or `None` when `source` already
    /// is a subtype of `target`.
    ///
    /// # Errors
    /// * [`FormatsError::Definition`] when either side is a template type.
    /// * [`FormatsError::ConverterNotFound`] when nothing matches.
    /// * [`FormatsError::AmbiguousConverter`] when more than one converter matches.
    pub fn get_converter(&self, source: FormatId, target: FormatId) -> Result<Option<Converter>> {
        let state = self.state.read();
        state.ensure_instantiable(source)?;
        state.ensure_instantiable(target)?;

        if state.is_subtype_format(source, target) {
            return Ok(None);
        }

        let mut found = state.resolve_converters(source, target);
        match found.len() {
            0 => Err(FormatsError::not_found(format!(
                "no converter from `{}` to `{}`",
                state.display(source.into()),
                state.display(target.into())
            ))),
            1 => Ok(found.pop()),
            n => Err(FormatsError::ambiguous(format!(
                "{n} converters from `{}` to `{}`: {}",
                state.display(source.into()),
                state.display(target.into()),
                found.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
            ))),
        }
    }
}

impl CatalogState {
    fn register_converter(&mut self, source: TypeRef, target: TypeRef, converter: Converter) -> Result<()> {
        let slot = self.registration_slot(source, target)?;

        if let Some(existing) = self.occupant(&slot) {
            if existing.is_duplicate_of(&converter) {
                warn!(
                    converter = existing.task.name(),
                    source = %self.display(source),
                    target = %self.display(target),
                    registered_at = %converter.registered_at,
                    "ignoring repeated registration of an identical converter"
                );
                return Ok(());
            }
            return Err(FormatsError::conflict(format!(
                "cannot register {converter}: {existing} is already registered for this conversion"
            )));
        }

        debug!(
            converter = converter.task.name(),
            source = %self.display(source),
            target = %self.display(target),
            "registered converter"
        );
        let registry = &mut self.converters;
        match slot {
            Slot::Direct { target, source } => {
                registry.direct.entry(target).or_default().push(DirectEntry { source, converter });
            },
            Slot::Template { base, source, target_qualifiers } => {
                registry.templates.entry(base).or_default().push(TemplateEntry {
                    source,
                    target_qualifiers,
                    converter,
                });
            },
            Slot::GenericTarget { source, target } => {
                registry.generic_targets.push(GenericTargetEntry { source, target, converter });
            },
        }
        Ok(())
    }

    fn registration_slot(&self, source: TypeRef, target: TypeRef) -> Result<Slot> {
        match target {
            TypeRef::Wildcard(target) => {
                self.wildcard(target)?;
                let TypeRef::Concrete(source) = source else {
                    return Err(FormatsError::definition("cannot convert between two bare wildcards"));
                };
                let source_wildcards = self.wildcards_of(source)?;
                if source_wildcards != BTreeSet::from([target]) {
                    return Err(FormatsError::definition(format!(
                        "converting to the bare wildcard `{}` requires a source qualified by exactly that wildcard",
                        self.display(target.into())
                    )));
                }
                Ok(Slot::GenericTarget { source, target })
            },
            TypeRef::Concrete(target) => {
                let target_format = self.format(target)?;
                let target_wildcards = self.wildcards_of(target)?;

                match target_wildcards.len() {
                    0 => match source {
                        TypeRef::Concrete(source) if !self.is_template(source) => {
                            self.format(source)?;
                            Ok(Slot::Direct { target, source })
                        },
                        _ => Err(FormatsError::definition(format!(
                            "source `{}` carries wildcards but target `{}` does not",
                            self.display(source),
                            self.display(target.into())
                        ))),
                    },
                    1 => {
                        let matches_target = match source {
                            TypeRef::Wildcard(wildcard) => target_wildcards.contains(&wildcard),
                            TypeRef::Concrete(source) => {
                                self.format(source)?.is_qualified()
                                    && self.wildcards_of(source)? == target_wildcards
                            },
                        };
                        if !matches_target {
                            return Err(FormatsError::definition(format!(
                                "wildcards of source `{}` do not match those of target `{}`",
                                self.display(source),
                                self.display(target.into())
                            )));
                        }
                        Ok(Slot::Template {
                            base: target_format.unqualified(),
                            source,
                            target_qualifiers: target_format.qualifiers().into(),
                        })
                    },
                    _ => Err(FormatsError::definition(format!(
                        "target `{}` carries more than one wildcard",
                        self.display(target.into())
                    ))),
                }
            },
        }
    }

    /// The converter already holding `slot`, if any.
    fn occupant(&self, slot: &Slot) -> Option<&Converter> {
        let registry = &self.converters;
        match slot {
            Slot::Direct { target, source } => registry
                .direct
                .get(target)?
                .iter()
                .find(|entry| entry.source == *source)
                .map(|entry| &entry.converter),
            Slot::Template { base, source, target_qualifiers } => registry
                .templates
                .get(base)?
                .iter()
                .find(|entry| {
                    self.same_template_source(entry.source, *source)
                        && concrete_set(&entry.target_qualifiers) == concrete_set(target_qualifiers)
                })
                .map(|entry| &entry.converter),
            Slot::GenericTarget { source, .. } => registry
                .generic_targets
                .iter()
                .find(|entry| self.same_template_source(entry.source.into(), (*source).into()))
                .map(|entry| &entry.converter),
        }
    }

    /// Same source shape: both bare wildcards, or the same base with the same concrete
    /// qualifiers.
    fn same_template_source(&self, left: TypeRef, right: TypeRef) -> bool {
        match (left, right) {
            (TypeRef::Wildcard(_), TypeRef::Wildcard(_)) => true,
            (TypeRef::Concrete(left), TypeRef::Concrete(right)) => {
                match (self.format(left), self.format(right)) {
                    (Ok(l), Ok(r)) => {
                        l.unqualified() == r.unqualified()
                            && concrete_set(l.qualifiers()) == concrete_set(r.qualifiers())
                    },
                    _ => false,
                }
            },
            _ => false,
        }
    }

    fn wildcards_of(&self, id: FormatId) -> Result<BTreeSet<WildcardId>> {
        Ok(self.format(id)?.wildcard_qualifiers().collect())
    }

    pub(crate) fn resolve_converters(&self, source: FormatId, target: FormatId) -> Vec<Converter> {
        let mut found: Vec<Converter> = self
            .converters
            .direct
            .get(&target)
            .into_iter()
            .flatten()
            .filter(|entry| self.is_subtype_format(source, entry.source))
            .map(|entry| entry.converter.clone())
            .collect();

        if found.is_empty() {
            found = self.template_converters(source, target);
        }
        if found.is_empty() {
            found = self.generic_target_converters(source, target);
        }
        found
    }

    fn template_converters(&self, source: FormatId, target: FormatId) -> Vec<Converter> {
        let Ok(target_format) = self.format(target) else { return Vec::new() };
        let Derivation::Qualified { unqualified, qualifiers: target_qualifiers } = target_format.derivation()
        else {
            return Vec::new();
        };
        let ordered = target_format.ordered_qualifiers();

        self.converters
            .templates
            .get(unqualified)
            .into_iter()
            .flatten()
            .filter(|entry| match entry.source {
                TypeRef::Wildcard(wildcard) => {
                    self.generic_to_template(source, target_qualifiers, &entry.target_qualifiers, wildcard)
                },
                TypeRef::Concrete(template_source) => {
                    self.bind_template_source(source, template_source).is_some_and(|binding| {
                        self.target_accepts(target_qualifiers, &entry.target_qualifiers, &binding, ordered)
                    })
                },
            })
            .map(|entry| entry.converter.clone())
            .collect()
    }

    /// `T -> F[A, T]` serves `F[A, X]` from any subtype of `X`: exactly one target
    /// qualifier may remain once the template's concrete qualifiers are set aside.
    fn generic_to_template(
        &self,
        source: FormatId,
        target_qualifiers: &[TypeRef],
        template_qualifiers: &[TypeRef],
        wildcard: WildcardId,
    ) -> bool {
        let mut remaining = target_qualifiers.iter().filter(|q| !template_qualifiers.contains(q));
        let (Some(only), None) = (remaining.next(), remaining.next()) else {
            return false;
        };
        self.is_subtype(source.into(), *only) && self.within_bound(source.into(), wildcard)
    }

    /// Matches `source` against a qualified template source such as `F[A, T]` and returns
    /// the qualifiers bound to its wildcard. Ordered sources bind by position, unordered
    /// ones by what is left once the template's concrete qualifiers are found.
    fn bind_template_source(&self, source: FormatId, template_source: FormatId) -> Option<Vec<TypeRef>> {
        let (Ok(actual), Ok(pattern)) = (self.format(source), self.format(template_source)) else {
            return None;
        };
        let (
            Derivation::Qualified { unqualified: actual_base, qualifiers: actual_qualifiers },
            Derivation::Qualified { unqualified: pattern_base, qualifiers: pattern_qualifiers },
        ) = (actual.derivation(), pattern.derivation())
        else {
            return None;
        };
        if !self.descends_from(*actual_base, *pattern_base) {
            return None;
        }

        if actual.ordered_qualifiers() {
            self.bind_positionally(actual_qualifiers, pattern_qualifiers)
        } else {
            self.bind_as_set(actual_qualifiers, pattern_qualifiers)
        }
    }

    /// Every wildcard position must hold the same qualifier, within the wildcard's bound;
    /// every concrete position must hold a subtype of the template's qualifier.
    fn bind_positionally(&self, actual: &[TypeRef], pattern: &[TypeRef]) -> Option<Vec<TypeRef>> {
        if actual.len() != pattern.len() {
            return None;
        }

        let mut bound: Option<TypeRef> = None;
        for (actual, pattern) in actual.iter().zip(pattern) {
            match pattern {
                TypeRef::Wildcard(wildcard) => {
                    if !self.within_bound(*actual, *wildcard) || bound.is_some_and(|previous| previous != *actual) {
                        return None;
                    }
                    bound = Some(*actual);
                },
                TypeRef::Concrete(_) => {
                    if !self.is_subtype(*actual, *pattern) {
                        return None;
                    }
                },
            }
        }
        bound.map(|bound| vec![bound])
    }

    /// The template's concrete qualifiers must all be present; whatever is left binds the
    /// wildcard and must not be empty.
    fn bind_as_set(&self, actual: &[TypeRef], pattern: &[TypeRef]) -> Option<Vec<TypeRef>> {
        let fixed: Vec<TypeRef> = pattern.iter().copied().filter(|q| !q.is_wildcard()).collect();
        if !fixed.iter().all(|q| actual.contains(q)) {
            return None;
        }
        let wildcard = pattern.iter().find_map(|q| q.wildcard())?;

        let bound: Vec<TypeRef> = actual.iter().copied().filter(|q| !fixed.contains(q)).collect();
        (!bound.is_empty() && bound.iter().all(|q| self.within_bound(*q, wildcard))).then_some(bound)
    }

    /// Checks the requested target qualifiers against the template target with its
    /// wildcard replaced by `binding`. Ordered targets compare position by position, so a
    /// wildcard position needs a single bound qualifier; unordered targets only need every
    /// requested qualifier among those produced.
    fn target_accepts(
        &self,
        actual_target: &[TypeRef],
        template_target: &[TypeRef],
        binding: &[TypeRef],
        ordered: bool,
    ) -> bool {
        if ordered {
            return actual_target.len() == template_target.len()
                && actual_target.iter().zip(template_target).all(|(actual, pattern)| match (pattern, binding) {
                    (TypeRef::Concrete(_), _) => self.is_subtype(*actual, *pattern),
                    (TypeRef::Wildcard(_), [bound]) => self.is_subtype(*actual, *bound),
                    (TypeRef::Wildcard(_), _) => false,
                });
        }

        let produced: Vec<TypeRef> =
            template_target.iter().copied().filter(|q| !q.is_wildcard()).chain(binding.iter().copied()).collect();
        actual_target.iter().all(|q| self.qualifier_present(*q, &produced))
    }

    /// `F[T] -> T` serves any supertype of a qualifier bound to `T` by the source.
    fn generic_target_converters(&self, source: FormatId, target: FormatId) -> Vec<Converter> {
        self.converters
            .generic_targets
            .iter()
            .filter(|entry| {
                self.bind_template_source(source, entry.source).is_some_and(|binding| {
                    binding.iter().any(|q| self.within_bound(*q, entry.target) && self.is_subtype(*q, target.into()))
                })
            })
            .map(|entry| entry.converter.clone())
            .collect()
    }

    fn within_bound(&self, ty: TypeRef, wildcard: WildcardId) -> bool {
        self.wildcard(wildcard).is_ok_and(|w| self.is_subtype(ty, w.bound.into()))
    }
}

fn concrete_set(qualifiers: &[TypeRef]) -> BTreeSet<FormatId> {
    qualifiers.iter().filter_map(|q| q.concrete()).collect()
}
