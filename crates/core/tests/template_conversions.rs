mod fixtures;

use fileformats_core::{FormatId, FormatsError, TypeRef};
use fixtures::{Testing, no_kwargs, passthrough, setup_catalog};

fn register(t: &Testing, name: &'static str, source: impl Into<TypeRef>, target: impl Into<TypeRef>) {
    t.catalog.register_converter(source, target, passthrough(name), no_kwargs()).unwrap();
}

fn converter_name(t: &Testing, source: FormatId, target: FormatId) -> String {
    t.catalog
        .get_converter(source, target)
        .unwrap()
        .map(|c| c.task().name().to_owned())
        .unwrap_or_default()
}

#[test]
fn template_to_template_binds_the_wildcard() {
    let t = setup_catalog();
    let cat = &t.catalog;
    let ft = cat.qualify(t.f, [t.t]).unwrap();
    let nt = cat.qualify(t.n, [t.t]).unwrap();
    let pt = cat.qualify(t.p, [t.t]).unwrap();
    register(&t, "f2n", ft, nt);
    register(&t, "f2p", ft, pt);
    register(&t, "p2n", pt, nt);

    let fa = cat.qualify(t.f, [t.a]).unwrap();
    assert_eq!(converter_name(&t, fa, cat.qualify(t.n, [t.a]).unwrap()), "f2n");
    assert_eq!(converter_name(&t, fa, cat.qualify(t.p, [t.a]).unwrap()), "f2p");
    assert_eq!(converter_name(&t, cat.qualify(t.p, [t.b]).unwrap(), cat.qualify(t.n, [t.b]).unwrap()), "p2n");
    assert_eq!(converter_name(&t, cat.qualify(t.g, [t.a]).unwrap(), cat.qualify(t.n, [t.a]).unwrap()), "f2n");

    let err = cat.get_converter(fa, cat.qualify(t.n, [t.b]).unwrap()).unwrap_err();
    assert!(matches!(err, FormatsError::ConverterNotFound { .. }), "{err}");
}

#[test]
fn direct_registrations_take_precedence_over_templates() {
    let t = setup_catalog();
    let cat = &t.catalog;
    let fa = cat.qualify(t.f, [t.a]).unwrap();
    register(&t, "f2h", fa, cat.qualify(t.h, [t.a]).unwrap());
    register(&t, "f2n", cat.qualify(t.f, [t.t]).unwrap(), cat.qualify(t.n, [t.t]).unwrap());
    register(&t, "fa2na", fa, cat.qualify(t.n, [t.a]).unwrap());

    assert_eq!(converter_name(&t, fa, cat.qualify(t.h, [t.a]).unwrap()), "f2h");
    assert_eq!(converter_name(&t, fa, cat.qualify(t.n, [t.a]).unwrap()), "fa2na");
    assert!(cat.get_converter(fa, cat.qualify(t.h, [t.b]).unwrap()).is_err());
}

#[test]
fn generic_sources_fill_the_remaining_qualifier() {
    let t = setup_catalog();
    let cat = &t.catalog;
    register(&t, "generic2f", t.t, cat.qualify(t.f, [t.t]).unwrap());
    register(&t, "generic2n", t.t, cat.qualify(t.n, [TypeRef::from(t.t), TypeRef::from(t.h)]).unwrap());

    assert_eq!(converter_name(&t, t.j, cat.qualify(t.f, [t.j]).unwrap()), "generic2f");
    assert_eq!(converter_name(&t, t.j, cat.qualify(t.f, [t.h]).unwrap()), "generic2f", "J is an H");
    assert!(cat.get_converter(t.j, cat.qualify(t.f, [t.k]).unwrap()).is_err());

    assert_eq!(converter_name(&t, t.j, cat.qualify(t.n, [t.j]).unwrap()), "generic2n");
    assert_eq!(converter_name(&t, t.j, cat.qualify(t.n, [t.j, t.h]).unwrap()), "generic2n");

    assert!(cat.get_converter(t.j, cat.qualify(t.f, [t.k, t.h]).unwrap()).is_err());
    assert!(cat.get_converter(t.j, cat.qualify(t.f, [t.j, t.k]).unwrap()).is_err());
}

#[test]
fn generic_targets_extract_a_qualifier() {
    let t = setup_catalog();
    let cat = &t.catalog;
    register(&t, "f2generic", cat.qualify(t.f, [t.t]).unwrap(), t.t);
    register(&t, "n2generic", cat.qualify(t.n, [TypeRef::from(t.t), TypeRef::from(t.h)]).unwrap(), t.t);

    assert_eq!(converter_name(&t, cat.qualify(t.f, [t.j]).unwrap(), t.j), "f2generic");
    assert_eq!(converter_name(&t, cat.qualify(t.f, [t.j]).unwrap(), t.h), "f2generic");
    assert!(cat.get_converter(cat.qualify(t.f, [t.k]).unwrap(), t.j).is_err());

    assert_eq!(converter_name(&t, cat.qualify(t.n, [t.j, t.h]).unwrap(), t.j), "n2generic");
    assert!(cat.get_converter(cat.qualify(t.n, [t.j, t.k]).unwrap(), t.j).is_err());
}

#[test]
fn wildcard_bounds_limit_template_matches() {
    let t = setup_catalog();
    let cat = &t.catalog;
    let files = t.specific_file_set;
    register(&t, "files2f", files, cat.qualify(t.f, [files]).unwrap());

    assert_eq!(converter_name(&t, t.a, cat.qualify(t.f, [t.a]).unwrap()), "files2f");
    let err = cat.get_converter(t.test_field, cat.qualify(t.f, [t.test_field]).unwrap()).unwrap_err();
    assert!(matches!(err, FormatsError::ConverterNotFound { .. }), "{err}");
}

#[test]
fn ordered_templates_match_by_position() {
    let t = setup_catalog();
    let cat = &t.catalog;
    let kat = cat.qualify(t.k, [TypeRef::from(t.a), TypeRef::from(t.t)]).unwrap();
    let kta = cat.qualify(t.k, [TypeRef::from(t.t), TypeRef::from(t.a)]).unwrap();
    register(&t, "swap", kat, kta);

    let kab = cat.qualify(t.k, [t.a, t.b]).unwrap();
    assert_eq!(converter_name(&t, kab, cat.qualify(t.k, [t.b, t.a]).unwrap()), "swap");
    assert!(cat.get_converter(kab, cat.qualify(t.k, [t.c, t.a]).unwrap()).is_err());
    assert!(cat.get_converter(cat.qualify(t.k, [t.b, t.b]).unwrap(), cat.qualify(t.k, [t.b, t.a]).unwrap()).is_err());
}

#[test]
fn unordered_sources_bind_by_set_for_ordered_targets() {
    let t = setup_catalog();
    let cat = &t.catalog;
    let fbt = cat.qualify(t.f, [TypeRef::from(t.b), TypeRef::from(t.t)]).unwrap();
    register(&t, "fb2k", fbt, cat.qualify(t.k, [t.t]).unwrap());

    let fab = cat.qualify(t.f, [t.a, t.b]).unwrap();
    assert_eq!(converter_name(&t, fab, cat.qualify(t.k, [t.a]).unwrap()), "fb2k");
    assert_eq!(converter_name(&t, cat.qualify(t.f, [t.b, t.a]).unwrap(), cat.qualify(t.k, [t.a]).unwrap()), "fb2k");

    let err = cat.get_converter(fab, cat.qualify(t.k, [t.b]).unwrap()).unwrap_err();
    assert!(matches!(err, FormatsError::ConverterNotFound { .. }), "{err}");
}

#[test]
fn ordered_sources_bind_by_position_for_unordered_targets() {
    let t = setup_catalog();
    let cat = &t.catalog;
    let kat = cat.qualify(t.k, [TypeRef::from(t.a), TypeRef::from(t.t)]).unwrap();
    register(&t, "ka2f", kat, cat.qualify(t.f, [t.t]).unwrap());

    let fb = cat.qualify(t.f, [t.b]).unwrap();
    assert_eq!(converter_name(&t, cat.qualify(t.k, [t.a, t.b]).unwrap(), fb), "ka2f");

    let err = cat.get_converter(cat.qualify(t.k, [t.b, t.a]).unwrap(), fb).unwrap_err();
    assert!(matches!(err, FormatsError::ConverterNotFound { .. }), "{err}");
}

#[test]
fn ordered_sources_feed_generic_targets_by_position() {
    let t = setup_catalog();
    let cat = &t.catalog;
    let kat = cat.qualify(t.k, [TypeRef::from(t.a), TypeRef::from(t.t)]).unwrap();
    register(&t, "ka2generic", kat, t.t);

    assert_eq!(converter_name(&t, cat.qualify(t.k, [t.a, t.b]).unwrap(), t.b), "ka2generic");

    let err = cat.get_converter(cat.qualify(t.k, [t.b, t.a]).unwrap(), t.b).unwrap_err();
    assert!(matches!(err, FormatsError::ConverterNotFound { .. }), "{err}");
}

#[test]
fn template_registrations_detect_conflicts() {
    let t = setup_catalog();
    let cat = &t.catalog;
    let ft = cat.qualify(t.f, [t.t]).unwrap();
    let nt = cat.qualify(t.n, [t.t]).unwrap();
    register(&t, "f2n", ft, nt);

    let u = cat.type_var("U", FormatId::DATA_TYPE).unwrap();
    let fu = cat.qualify(t.f, [u]).unwrap();
    let nu = cat.qualify(t.n, [u]).unwrap();
    let err = cat.register_converter(fu, nu, passthrough("other"), no_kwargs()).unwrap_err();
    assert!(matches!(err, FormatsError::ConverterConflict { .. }), "{err}");

    let err = cat.register_converter(ft, nu, passthrough("mixed"), no_kwargs()).unwrap_err();
    assert!(matches!(err, FormatsError::Definition { .. }), "{err}");
}
