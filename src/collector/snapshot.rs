//! On-disk layout of a device snapshot.
//!
//! ```text
//! <root>/<address>/getters          rendered report of all non-config getters
//! <root>/<address>/<variant>_config raw text per config variant (never "candidate")
//! ```
//!
//! Every write replaces the previous file content.

use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::render::render;

/// Name of the rendered getters report.
pub const GETTERS_FILE: &str = "getters";

/// Suffix appended to a config variant name to form its file name.
pub const CONFIG_SUFFIX: &str = "_config";

/// Config variant that is never persisted.
pub const CANDIDATE_VARIANT: &str = "candidate";

/// A device's directory inside the working copy.
#[derive(Debug, Clone)]
pub struct DeviceDir {
    path: PathBuf,
}

impl DeviceDir {
    /// Create `<root>/<address>` if it does not exist yet.
    pub async fn ensure(root: &Path, address: &str) -> io::Result<Self> {
        let path = root.join(address);
        tokio::fs::create_dir_all(&path).await?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite `<variant>_config` with `text`.
    pub async fn write_config_variant(&self, variant: &str, text: &str) -> io::Result<PathBuf> {
        let file = self.path.join(format!("{}{}", variant, CONFIG_SUFFIX));
        tokio::fs::write(&file, text).await?;
        Ok(file)
    }

    /// Overwrite the getters report with the rendering of `report`.
    pub async fn write_getters(&self, report: &Value) -> io::Result<PathBuf> {
        let file = self.path.join(GETTERS_FILE);
        let mut text = render(report, 0);
        text.push('\n');
        tokio::fs::write(&file, text).await?;
        Ok(file)
    }
}

/// Extract the persistable config variants from a `get_config` result.
///
/// The candidate variant is dropped, as are variant names that cannot be
/// used as a file name. Non-string variant bodies are rendered.
///
/// # Errors
/// Returns a description of the payload if it is not a mapping.
pub fn config_variants(value: &Value) -> Result<Vec<(String, String)>, String> {
    let map = value
        .as_object()
        .ok_or_else(|| format!("expected a mapping of config variants, got: {}", value))?;

    let variants = map
        .iter()
        .filter(|(name, _)| name.as_str() != CANDIDATE_VARIANT)
        .filter(|(name, _)| {
            let usable = !name.is_empty()
                && !name.contains(['/', '\\', '\0'])
                && name.as_str() != "..";
            if !usable {
                tracing::warn!(variant = %name, "Skipping config variant with unusable name");
            }
            usable
        })
        .map(|(name, body)| {
            let text = match body {
                Value::String(s) => s.clone(),
                other => render(other, 0),
            };
            (name.clone(), text)
        })
        .collect();

    Ok(variants)
}
