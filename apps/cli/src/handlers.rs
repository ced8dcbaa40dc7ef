use anyhow::{Context, Result};
use fileformats::{FormatId, Formats};
use std::path::PathBuf;

pub(crate) fn detect(formats: &Formats, paths: &[PathBuf], any_namespace: bool) -> Result<()> {
    let catalog = formats.catalog();
    let matching = formats.find_matching(paths, any_namespace);

    if matching.is_empty() {
        println!("No matching formats found");
        return Ok(());
    }
    for id in matching {
        println!("{}", mime_or_name(formats, id));
    }
    tracing::debug!(namespaces = catalog.namespaces().len(), "detection finished");
    Ok(())
}

pub(crate) fn mime(formats: &Formats, mime: &str) -> Result<()> {
    let catalog = formats.catalog();
    let id = catalog.from_mime_like(mime).with_context(|| format!("resolving `{mime}`"))?;
    let canonical = catalog.to_mime_like(id)?;
    println!("{}\t{canonical}", catalog.display_name(id));
    Ok(())
}

pub(crate) fn subtype(formats: &Formats, candidate: &str, target: &str) -> Result<()> {
    let catalog = formats.catalog();
    let candidate = catalog.from_mime_like(candidate).with_context(|| format!("resolving `{candidate}`"))?;
    let target = catalog.from_mime_like(target).with_context(|| format!("resolving `{target}`"))?;
    println!("{}", catalog.is_subtype_of(candidate, target));
    Ok(())
}

pub(crate) fn list(formats: &Formats, namespace: Option<&str>) -> Result<()> {
    let catalog = formats.catalog();
    let mut rows = Vec::new();
    for id in catalog.base_formats() {
        let format = catalog.format(id)?;
        if namespace.is_some_and(|ns| ns != format.namespace()) {
            continue;
        }
        let exts = format.traits().extensions().collect::<Vec<_>>().join(" ");
        rows.push((mime_or_name(formats, id), exts));
    }

    rows.sort();
    let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or_default();
    for (name, exts) in rows {
        let line = format!("{name:<width$}  {exts}");
        println!("{}", line.trim_end());
    }
    Ok(())
}

fn mime_or_name(formats: &Formats, id: FormatId) -> String {
    let catalog = formats.catalog();
    catalog.to_mime_like(id).unwrap_or_else(|_| catalog.display_name(id))
}
