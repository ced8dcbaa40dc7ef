#![allow(dead_code)]

use fileformats_core::{
    Catalog, ConverterKwargs, FormatDef, FormatId, QualifierPolicy, Task, TaskSpec, WildcardId,
};

/// Handles into the `testing` hierarchy built by [`setup_catalog`].
#[derive(Debug, Clone)]
pub struct Testing {
    pub catalog: Catalog,
    pub a: FormatId,
    pub b: FormatId,
    pub c: FormatId,
    pub d: FormatId,
    pub e: FormatId,
    /// Unordered, unrestricted.
    pub f: FormatId,
    pub g: FormatId,
    /// Only accepts `A`, `B` and `C`.
    pub h: FormatId,
    pub j: FormatId,
    /// Ordered.
    pub k: FormatId,
    /// Single qualifier.
    pub m: FormatId,
    pub n: FormatId,
    pub p: FormatId,
    pub test_field: FormatId,
    pub array: FormatId,
    pub directory: FormatId,
    pub zip: FormatId,
    pub t: WildcardId,
    pub specific_data_type: WildcardId,
    pub specific_file_set: WildcardId,
}

/// Builds a fresh catalog holding the `testing` formats.
/// # Panics
/// * If any of the fixture definitions is rejected.
#[must_use]
pub fn setup_catalog() -> Testing {
    let catalog = Catalog::new();
    let define = |def: FormatDef| catalog.define(def).expect("fixture format rejected");
    let file = |name: &'static str| define(FormatDef::new("testing", name).parent(FormatId::FILE_SET));
    let qualifiable = |name: &'static str, parent: FormatId, policy: QualifierPolicy| {
        define(FormatDef::new("testing", name).parent(parent).qualifiable(policy))
    };

    let a = file("A");
    let b = file("B");
    let c = file("C");
    let d = file("D");
    let e = file("E");
    let f = qualifiable("F", FormatId::FILE_SET, QualifierPolicy::new());
    let g = define(FormatDef::new("testing", "G").parent(f));
    let h = qualifiable("H", FormatId::FILE_SET, QualifierPolicy::new().allowed([a, b, c]));
    let j = define(FormatDef::new("testing", "J").parent(h));
    let k = qualifiable("K", FormatId::FILE_SET, QualifierPolicy::new().ordered());
    let m = qualifiable("M", FormatId::FILE_SET, QualifierPolicy::new().single());
    let n = qualifiable("N", FormatId::FILE_SET, QualifierPolicy::new());
    let p = qualifiable("P", FormatId::FILE_SET, QualifierPolicy::new());

    let test_field = define(FormatDef::new("testing", "TestField").parent(FormatId::FIELD));
    let array = define(
        FormatDef::new("field", "Array")
            .parent(FormatId::FIELD)
            .qualifiable(QualifierPolicy::new().allowed([FormatId::FIELD])),
    );
    let directory = define(
        FormatDef::new("generic", "Directory")
            .parent(FormatId::FILE_SET)
            .qualifiable(QualifierPolicy::new().generic().allowed([FormatId::FILE_SET])),
    );
    let zip = define(
        FormatDef::new("archive", "Zip")
            .parent(FormatId::FILE_SET)
            .ext(".zip")
            .magic(&b"PK\x03\x04"[..], 0)
            .qualifiable(QualifierPolicy::new().generic()),
    );

    let type_var = |name: &'static str, bound| catalog.type_var(name, bound).expect("fixture wildcard rejected");
    let t = type_var("T", FormatId::DATA_TYPE);
    let specific_data_type = type_var("SpecificDataType", FormatId::DATA_TYPE);
    let specific_file_set = type_var("SpecificFileSet", FormatId::FILE_SET);

    Testing {
        catalog,
        a,
        b,
        c,
        d,
        e,
        f,
        g,
        h,
        j,
        k,
        m,
        n,
        p,
        test_field,
        array,
        directory,
        zip,
        t,
        specific_data_type,
        specific_file_set,
    }
}

/// A task that only carries its name.
#[derive(Debug)]
pub struct Passthrough(pub String);

impl Task for Passthrough {
    fn name(&self) -> &str {
        &self.0
    }

    fn output_names(&self) -> Vec<String> {
        vec!["out_file".to_owned()]
    }
}

#[must_use]
pub fn passthrough(name: &'static str) -> TaskSpec {
    TaskSpec::new(name, move |_| Box::new(Passthrough(name.to_owned())))
}

#[must_use]
pub fn no_kwargs() -> ConverterKwargs {
    ConverterKwargs::new()
}
