use crate::error::{BootstrapError, BootstrapErrorExt};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything a [`Formats`](crate::Formats) catalog is built from.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FormatsConfig {
    /// Namespaces searched by default when recognising paths.
    pub standard_namespaces: Vec<String>,
    /// Extra formats, defined in order; later entries may use earlier ones as parents.
    pub formats: Vec<FormatDeclaration>,
    pub logging: LoggingConfig,
}

/// A base format declared in configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FormatDeclaration {
    pub namespace: String,
    pub name: String,
    /// MIME-like identifier of the parent; `generic/file` when omitted.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub alternate_exts: Vec<String>,
    /// Hex-encoded magic number, e.g. `"89504e47"`.
    #[serde(default)]
    pub magic: Option<String>,
    #[serde(default)]
    pub magic_offset: u64,
    #[serde(default)]
    pub qualifiers: Option<QualifierDeclaration>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QualifierDeclaration {
    pub multiple: bool,
    /// MIME-like identifiers of the allowed qualifier bases; empty means unrestricted.
    pub allowed: Vec<String>,
    pub ordered: bool,
    pub generic: bool,
}

/// Settings for `fileformats-logger`, applied by binaries.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: Option<PathBuf>,
    pub json: bool,
}

// --- Default ---

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            standard_namespaces: ["application", "archive", "audio", "generic", "image", "text", "video"]
                .map(str::to_owned)
                .to_vec(),
            formats: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for QualifierDeclaration {
    fn default() -> Self {
        Self { multiple: true, allowed: Vec::new(), ordered: false, generic: false }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_owned(), directory: None, json: false }
    }
}

/// Loads a [`FormatsConfig`] from a file overlaid with `FILEFORMATS__` environment
/// variables (`FILEFORMATS__LOGGING__LEVEL=debug` sets `logging.level`).
///
/// Without `path`, a `fileformats.{toml,json,yaml}` file in the working directory is used
/// when present; an explicit `path` must exist.
///
/// # Errors
/// [`BootstrapError::Config`] when the file is missing or malformed, or the merged values
/// do not deserialize.
///
/// # Example
/// ```rust
/// use fileformats::load_config;
///
/// let config = load_config(None::<&str>)?;
/// assert!(config.standard_namespaces.iter().any(|ns| ns == "generic"));
/// # Ok::<(), fileformats::BootstrapError>(())
/// ```
pub fn load_config(path: Option<impl AsRef<Path>>) -> Result<FormatsConfig, BootstrapError> {
    load(path, None)
}

fn load(
    path: Option<impl AsRef<Path>>,
    environment: Option<HashMap<String, String>>,
) -> Result<FormatsConfig, BootstrapError> {
    let (effective_path, required) =
        path.map_or_else(|| (PathBuf::from("fileformats"), false), |p| (p.as_ref().to_path_buf(), true));

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(
            Environment::with_prefix("FILEFORMATS")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("standard_namespaces")
                .try_parsing(true)
                .convert_case(config::Case::Snake)
                .source(environment),
        );

    info!(path = %effective_path.display(), required, "loading configuration");

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<FormatsConfig>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(vars.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect())
    }

    #[test]
    fn environment_overrides_nested_keys() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("formats.toml");
        std::fs::write(&path, "[logging]\nlevel = \"info\"\n")?;

        let config = load(
            Some(&path),
            env(&[("FILEFORMATS__LOGGING__LEVEL", "trace"), ("FILEFORMATS__LOGGING__JSON", "true")]),
        )?;
        assert_eq!(config.logging.level, "trace");
        assert!(config.logging.json);
        Ok(())
    }

    #[test]
    fn environment_lists_split_on_commas() -> Result<(), Box<dyn std::error::Error>> {
        let config = load(None::<&str>, env(&[("FILEFORMATS__STANDARD_NAMESPACES", "image,text")]))?;
        assert_eq!(config.standard_namespaces, ["image", "text"]);
        Ok(())
    }

    #[test]
    fn unrelated_variables_are_ignored() -> Result<(), Box<dyn std::error::Error>> {
        let config = load(None::<&str>, env(&[("OTHER__LOGGING__LEVEL", "trace")]))?;
        assert_eq!(config, FormatsConfig::default());
        Ok(())
    }
}
