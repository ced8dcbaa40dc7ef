mod fixtures;

use fileformats_core::{FormatsError, TypeRef};
use fixtures::{Testing, no_kwargs, passthrough, setup_catalog};

/// `F -> H` and `F[A] -> H[A]` registered as plain converters.
fn with_f2h() -> Testing {
    let t = setup_catalog();
    let cat = &t.catalog;
    let f2h = passthrough("f2h");
    cat.register_converter(t.f, t.h, f2h.clone(), no_kwargs()).unwrap();
    cat.register_converter(
        cat.qualify(t.f, [t.a]).unwrap(),
        cat.qualify(t.h, [t.a]).unwrap(),
        f2h,
        no_kwargs(),
    )
    .unwrap();
    t
}

#[test]
fn direct_converters_resolve() {
    let t = with_f2h();
    let cat = &t.catalog;

    let converter = cat.get_converter(t.f, t.h).unwrap().expect("f2h");
    assert_eq!(converter.task().name(), "f2h");

    let fa = cat.qualify(t.f, [t.a]).unwrap();
    let ha = cat.qualify(t.h, [t.a]).unwrap();
    assert!(cat.get_converter(fa, ha).unwrap().is_some());
}

#[test]
fn subtypes_need_no_converter() {
    let t = with_f2h();
    let cat = &t.catalog;

    assert!(cat.get_converter(t.g, t.f).unwrap().is_none());
    let ga = cat.qualify(t.g, [t.a]).unwrap();
    assert!(cat.get_converter(ga, cat.qualify(t.f, [t.a]).unwrap()).unwrap().is_none());
    assert!(cat.get_converter(ga, t.f).unwrap().is_none());
}

#[test]
fn missing_conversions_are_reported() {
    let t = with_f2h();
    let cat = &t.catalog;
    let fa = cat.qualify(t.f, [t.a]).unwrap();

    let err = cat.get_converter(t.f, t.g).unwrap_err();
    assert!(matches!(err, FormatsError::ConverterNotFound { .. }), "{err}");

    let fe = cat.qualify(t.f, [t.e]).unwrap();
    assert!(matches!(cat.get_converter(fe, fa), Err(FormatsError::ConverterNotFound { .. })));
    assert!(matches!(cat.get_converter(t.g, fa), Err(FormatsError::ConverterNotFound { .. })));
    assert!(cat.converters(t.g, fa).is_empty());
}

#[test]
fn qualified_conversions_are_directional() {
    let t = with_f2h();
    let cat = &t.catalog;
    let fa = cat.qualify(t.f, [t.a]).unwrap();
    let ha = cat.qualify(t.h, [t.a]).unwrap();

    let err = cat.get_converter(ha, fa).unwrap_err();
    assert!(matches!(err, FormatsError::ConverterNotFound { .. }), "{err}");

    let ga = cat.qualify(t.g, [t.a]).unwrap();
    let err = cat.get_converter(fa, ga).unwrap_err();
    assert!(matches!(err, FormatsError::ConverterNotFound { .. }), "{err}");
}

#[test]
fn direct_lookups_do_not_climb_the_target_hierarchy() {
    let t = with_f2h();
    let cat = &t.catalog;

    assert!(cat.converters(t.f, t.j).is_empty());
    assert_eq!(cat.converters(t.g, t.h).len(), 1, "sources match by subtype");
}

#[test]
fn reregistering_the_same_converter_is_absorbed() {
    let t = with_f2h();
    let cat = &t.catalog;

    cat.register_converter(t.f, t.h, passthrough("f2h"), no_kwargs()).unwrap();
    assert_eq!(cat.converters(t.f, t.h).len(), 1);
}

#[test]
fn conflicting_registrations_fail() {
    let t = with_f2h();
    let cat = &t.catalog;

    let err = cat.register_converter(t.f, t.h, passthrough("other"), no_kwargs()).unwrap_err();
    assert!(matches!(err, FormatsError::ConverterConflict { .. }), "{err}");
    let message = err.to_string();
    assert!(message.contains("f2h"), "{message}");
    assert!(message.contains("other"), "{message}");
    assert!(message.contains("registering `F` -> `H`"), "{message}");
}

#[test]
fn several_matches_are_ambiguous() {
    let t = setup_catalog();
    let cat = &t.catalog;

    cat.register_converter(t.f, t.a, passthrough("f2a"), no_kwargs()).unwrap();
    cat.register_converter(t.g, t.a, passthrough("g2a"), no_kwargs()).unwrap();

    assert!(cat.get_converter(t.f, t.a).unwrap().is_some());
    let err = cat.get_converter(t.g, t.a).unwrap_err();
    assert!(matches!(err, FormatsError::AmbiguousConverter { .. }), "{err}");
    assert!(err.to_string().contains("f2a") && err.to_string().contains("g2a"));
}

#[test]
fn templates_cannot_be_resolved_directly() {
    let t = setup_catalog();
    let cat = &t.catalog;
    let ft = cat.qualify(t.f, [t.t]).unwrap();

    assert!(matches!(cat.get_converter(ft, t.h), Err(FormatsError::Definition { .. })));
    assert!(matches!(cat.get_converter(t.h, ft), Err(FormatsError::Definition { .. })));
}

#[test]
fn concrete_sources_cannot_feed_wildcard_targets() {
    let t = setup_catalog();
    let cat = &t.catalog;
    let nt = cat.qualify(t.n, [t.t]).unwrap();

    let err = cat.register_converter(t.f, nt, passthrough("f2nt"), no_kwargs()).unwrap_err();
    assert!(matches!(err, FormatsError::Definition { .. }), "{err}");
    let err = cat.register_converter(t.f, TypeRef::from(t.t), passthrough("f2t"), no_kwargs()).unwrap_err();
    assert!(matches!(err, FormatsError::Definition { .. }), "{err}");
}
