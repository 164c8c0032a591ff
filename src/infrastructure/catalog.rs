//! Input file adapters: the layer catalog and the pattern table

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::domain::pattern::{PatternError, PatternTable, RawUrlPattern};
use crate::domain::value_objects::LayerName;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Blank layer name at position {index} in {}", .path.display())]
    BlankLayerName { path: PathBuf, index: usize },

    #[error("Invalid pattern table {}: {source}", .path.display())]
    Pattern {
        path: PathBuf,
        #[source]
        source: PatternError,
    },
}

/// On-disk pattern table; other top-level keys are ignored
#[derive(Debug, Deserialize)]
struct PatternFile {
    #[serde(rename = "layerTypes")]
    layer_types: BTreeMap<String, RawUrlPattern>,
}

/// Reads the layer catalog: a JSON array of layer names.
///
/// Duplicates are dropped (first occurrence kept); blank names are rejected.
pub async fn load_layer_catalog(path: &Path) -> Result<Vec<LayerName>, CatalogError> {
    let content = fs::read_to_string(path).await.map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let names: Vec<String> = serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let mut seen = HashSet::with_capacity(names.len());
    let mut layers = Vec::with_capacity(names.len());
    let mut duplicates = 0usize;

    for (index, name) in names.into_iter().enumerate() {
        if name.trim().is_empty() {
            return Err(CatalogError::BlankLayerName {
                path: path.to_path_buf(),
                index,
            });
        }
        if seen.insert(name.clone()) {
            layers.push(LayerName::new(name));
        } else {
            duplicates += 1;
        }
    }

    if duplicates > 0 {
        warn!("⚠️ Dropped {} duplicate layer names from {}", duplicates, path.display());
    }
    info!("📋 Loaded {} layers from {}", layers.len(), path.display());
    Ok(layers)
}

/// Reads the pattern table, falling back to the built-in `DEFAULT` pattern
/// when the file does not exist. Any other failure is fatal.
pub async fn load_pattern_table(path: &Path) -> Result<PatternTable, CatalogError> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(
                "⚠️ Pattern table {} not found, using the built-in default pattern",
                path.display()
            );
            return Ok(PatternTable::builtin());
        }
        Err(source) => {
            return Err(CatalogError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let file: PatternFile = serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let (table, inserted_default) =
        PatternTable::from_raw(&file.layer_types).map_err(|source| CatalogError::Pattern {
            path: path.to_path_buf(),
            source,
        })?;

    if inserted_default {
        warn!(
            "⚠️ Pattern table {} has no DEFAULT entry, using the built-in one",
            path.display()
        );
    }
    info!(
        "🧩 Loaded {} layer types from {}: {}",
        table.len(),
        path.display(),
        table.keys().collect::<Vec<_>>().join(", ")
    );
    Ok(table)
}
