//! Collaborator interfaces: where recipes and holdings come from.

use autocraft_core::{Holdings, ItemKind, RecipeDefinition, RecipeId};
use std::sync::Arc;

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Source of recipe definitions.
///
/// Lookups never fail: a missing or unreadable entry is simply absent.
pub trait RecipeCatalog: Send + Sync {
    /// Recipe by identifier.
    fn lookup(&self, id: &RecipeId) -> Option<RecipeDefinition>;

    /// All recipes whose result is `item`, in catalog order.
    fn producers_for(&self, item: &ItemKind) -> Vec<RecipeDefinition>;
}

impl<T: RecipeCatalog + ?Sized> RecipeCatalog for Arc<T> {
    fn lookup(&self, id: &RecipeId) -> Option<RecipeDefinition> {
        (**self).lookup(id)
    }

    fn producers_for(&self, item: &ItemKind) -> Vec<RecipeDefinition> {
        (**self).producers_for(item)
    }
}

/// Source of the current item counts.
pub trait HoldingsSource {
    /// Read the counts once.
    fn snapshot(&self) -> Holdings;
}

impl HoldingsSource for Holdings {
    fn snapshot(&self) -> Holdings {
        self.clone()
    }
}
