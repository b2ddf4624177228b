//! On-disk resource bundle consumed by the executor.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::info;

use crate::errors::AutomationError;

/// Directory name of the bundle inside its base path.
pub const RESOURCE_DIR: &str = "resource";

const SUBDIRECTORIES: [&str; 3] = ["image", "model", "pipeline"];

/// Create the bundle layout under `base`, leaving existing files alone.
///
/// Returns the bundle root (`base/resource`).
pub fn setup_resource_structure(base: &Path) -> Result<PathBuf, AutomationError> {
    let root = base.join(RESOURCE_DIR);
    for dir in std::iter::once(root.clone()).chain(SUBDIRECTORIES.iter().map(|d| root.join(d))) {
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            info!("Created directory {}", dir.display());
        }
    }

    let default_pipeline = root.join("default_pipeline.json");
    if !default_pipeline.exists() {
        let content = json!({
            "Default": { "rate_limit": 2000 },
            "TemplateMatch": { "recognition": "TemplateMatch", "threshold": 0.7 }
        });
        fs::write(&default_pipeline, serde_json::to_string_pretty(&content)?)?;
        info!("Created {}", default_pipeline.display());
    }

    Ok(root)
}
