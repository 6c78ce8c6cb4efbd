//! `specfix.toml` loading.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use specfix_diff::{DiffConfig, ReconcileConfig};
use specfix_types::{Path as DocPath, PathSegment};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "specfix.toml";

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub diff: DiffSection,
    pub files: FilesConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffSection {
    pub reconcile: ReconcileConfig,
    /// Subtrees never compared. Defaults to `["info"]`.
    pub exclude: Option<Vec<DocPath>>,
}

/// Default document locations, overridden per command by flags.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilesConfig {
    pub original: PathBuf,
    pub fixed: PathBuf,
    pub fixes: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            original: PathBuf::from("api-original.json"),
            fixed: PathBuf::from("api-fixed.json"),
            fixes: PathBuf::from("spec-fixes.json"),
        }
    }
}

impl Config {
    /// Load `explicit` if given, else `./specfix.toml` if it exists, else
    /// the defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn diff_config(&self) -> DiffConfig {
        DiffConfig {
            reconcile: self.diff.reconcile.clone(),
            exclude: self
                .diff
                .exclude
                .clone()
                .unwrap_or_else(|| vec![DocPath::from_segments([PathSegment::key("info")])]),
        }
    }
}
