//! In-memory storage backend implementation for the retail system.
//!
//! This module provides a memory-based implementation of the StorageInterface
//! trait, useful for testing and development scenarios where persistence is
//! not required.

use crate::{StorageError, StorageInterface, StorageRegistry, WriteMode};
use async_trait::async_trait;
use retail_types::{ConfigSchema, Schema, ValidationError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory storage implementation.
///
/// Stores each record as (bytes, revision) in a HashMap, providing fast
/// access but no persistence across restarts.
pub struct MemoryStorage {
	/// The in-memory store protected by a read-write lock.
	store: Arc<RwLock<HashMap<String, (Vec<u8>, u64)>>>,
}

impl MemoryStorage {
	/// Creates a new MemoryStorage instance.
	pub fn new() -> Self {
		Self {
			store: Arc::new(RwLock::new(HashMap::new())),
		}
	}
}

impl Default for MemoryStorage {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_bytes(&self, key: &str) -> Result<(Vec<u8>, u64), StorageError> {
		let store = self.store.read().await;
		store.get(key).cloned().ok_or(StorageError::NotFound)
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		mode: WriteMode,
	) -> Result<u64, StorageError> {
		let mut store = self.store.write().await;
		let current = store.get(key).map(|(_, rev)| *rev);

		let revision = match (mode, current) {
			(WriteMode::Insert, Some(_)) => return Err(StorageError::AlreadyExists),
			(WriteMode::IfRevision(expected), Some(actual)) if expected != actual => {
				return Err(StorageError::RevisionConflict { expected, actual });
			},
			(WriteMode::IfRevision(_), None) => return Err(StorageError::NotFound),
			(_, current) => current.unwrap_or(0) + 1,
		};

		store.insert(key.to_string(), (value, revision));
		Ok(revision)
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store.remove(key);
		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let store = self.store.read().await;
		Ok(store.contains_key(key))
	}

	async fn scan_prefix(&self, prefix: &str) -> Result<Vec<Vec<u8>>, StorageError> {
		let store = self.store.read().await;
		Ok(store
			.iter()
			.filter(|(key, _)| key.starts_with(prefix))
			.map(|(_, (value, _))| value.clone())
			.collect())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStorageSchema)
	}
}

/// Configuration schema for MemoryStorage.
pub struct MemoryStorageSchema;

impl ConfigSchema for MemoryStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// Memory storage has no required configuration
		let schema = Schema::new(vec![], vec![]);
		schema.validate(config)
	}
}

/// Registry entry for the memory backend.
pub struct Registry;

impl StorageRegistry for Registry {
	const NAME: &'static str = "memory";

	fn factory() -> crate::StorageFactory {
		create_storage
	}
}

/// Factory function to create a memory storage backend from configuration.
///
/// Configuration parameters:
/// - None required for memory storage
pub fn create_storage(
	_config: &toml::Value,
) -> Result<Box<dyn StorageInterface>, StorageError> {
	Ok(Box::new(MemoryStorage::new()))
}
