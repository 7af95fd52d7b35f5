//! JSON world file.
//!
//! A single JSON document holding the recipe list, the current holdings, the
//! craft-count ledger and optional tunables. Used by the CLI as a stand-in for
//! a live catalog and inventory.

use std::path::{Path, PathBuf};
use autocraft_core::{AutocraftConfig, CraftCounts, Holdings, RecipeDefinition};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;
use super::{MemoryCatalog, Result, StorageError};

/// Contents of a world file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldFile {
    /// Tunables
    #[serde(default)]
    pub config: AutocraftConfig,

    /// Recipe list, in catalog order
    #[serde(default)]
    pub recipes: Vec<RecipeDefinition>,

    /// Current item counts
    #[serde(default)]
    pub holdings: Holdings,

    /// Craft counts from earlier runs
    #[serde(default)]
    pub ledger: CraftCounts,
}

impl WorldFile {
    /// Build an in-memory catalog from the recipe list.
    pub fn catalog(&self) -> MemoryCatalog {
        MemoryCatalog::from_recipes(self.recipes.iter().cloned())
    }
}

/// File-backed world store.
pub struct JsonWorld {
    path: PathBuf,
}

impl JsonWorld {
    /// Store backed by `path`. Nothing is read until [`JsonWorld::load`].
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the world file.
    pub async fn load(&self) -> Result<WorldFile> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(self.path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let world: WorldFile = serde_json::from_str(&content)?;
        debug!(
            "Loaded world from {}: {} recipes, {} item kinds held",
            self.path.display(),
            world.recipes.len(),
            world.holdings.len()
        );
        Ok(world)
    }

    /// Write the world file, creating parent directories as needed.
    pub async fn save(&self, world: &WorldFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(world)?;
        fs::write(&self.path, json.as_bytes()).await?;
        debug!("Saved world to {}", self.path.display());
        Ok(())
    }
}
