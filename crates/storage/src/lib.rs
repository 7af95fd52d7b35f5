//! Collaborator interfaces and implementations for Autocraft.
//!
//! This crate provides the trait-based recipe catalog and holdings
//! interfaces, an in-memory catalog, and a JSON world file store.

#![warn(missing_docs)]

pub mod trait_;
pub mod memory;
pub mod json_storage;

pub use trait_::{RecipeCatalog, HoldingsSource, StorageError, Result};
pub use memory::MemoryCatalog;
pub use json_storage::{JsonWorld, WorldFile};
