//! Reading and writing JSON files.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;
use specfix_types::EditSet;

use crate::error::CliError;

pub fn read_document(path: &Path) -> anyhow::Result<Value> {
    let text = read(path)?;
    serde_json::from_str(&text).map_err(|source| {
        CliError::MalformedJson {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

pub fn read_edit_set(path: &Path) -> anyhow::Result<EditSet> {
    let text = read(path)?;
    serde_json::from_str(&text).map_err(|source| {
        let malformed = if serde_json::from_str::<Value>(&text).is_ok() {
            CliError::MalformedEditSet {
                path: path.to_path_buf(),
                source,
            }
        } else {
            CliError::MalformedJson {
                path: path.to_path_buf(),
                source,
            }
        };
        malformed.into()
    })
}

/// `None` when the file does not exist yet.
pub fn read_edit_set_if_exists(path: &Path) -> anyhow::Result<Option<EditSet>> {
    if path.exists() {
        read_edit_set(path).map(Some)
    } else {
        Ok(None)
    }
}

/// Two-space indented JSON with a trailing newline.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    let mut text = serde_json::to_string_pretty(value)
        .with_context(|| format!("serializing {}", path.display()))?;
    text.push('\n');
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
