//! Storage module for the retail system.
//!
//! This module provides abstractions for persistent storage of retail data,
//! supporting different backend implementations such as in-memory or
//! file-based storage. Every stored record carries a revision counter that
//! backends bump on each write, which callers can use as a precondition to
//! detect concurrent modification.

use async_trait::async_trait;
use retail_types::{ConfigSchema, StorageNamespace};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs when a create-only write hits an existing key.
	#[error("Already exists")]
	AlreadyExists,
	/// Error that occurs when a conditional write observes a different
	/// revision than the caller expected.
	#[error("Revision conflict: expected {expected}, found {actual}")]
	RevisionConflict { expected: u64, actual: u64 },
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Precondition applied to a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
	/// Create the record; fail with [`StorageError::AlreadyExists`] if the
	/// key is already present.
	Insert,
	/// Unconditional full-record overwrite. Last writer wins.
	Overwrite,
	/// Overwrite only if the stored revision matches; fail with
	/// [`StorageError::RevisionConflict`] otherwise.
	IfRevision(u64),
}

/// Trait defining the low-level interface for storage backends.
///
/// This trait must be implemented by any storage backend that wants to
/// integrate with the retail system. It provides key-value operations over
/// raw bytes; revisions start at 1 and increase by one on every write.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes and the current revision for the given key.
	async fn get_bytes(&self, key: &str) -> Result<(Vec<u8>, u64), StorageError>;

	/// Stores raw bytes under the given write precondition.
	///
	/// Returns the revision assigned to the written record.
	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		mode: WriteMode,
	) -> Result<u64, StorageError>;

	/// Deletes the value associated with the given key.
	///
	/// Deleting a missing key is not an error.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Returns the raw values of every key starting with the given prefix.
	async fn scan_prefix(&self, prefix: &str) -> Result<Vec<Vec<u8>>, StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
///
/// This is the function signature that all storage implementations must
/// provide to create instances of their storage interface.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
///
/// Each backend module provides a Registry struct that declares the name
/// used to select it in configuration and its factory function.
pub trait StorageRegistry {
	/// The name used in configuration files to reference this backend.
	const NAME: &'static str;

	/// Get the factory function for this backend.
	fn factory() -> StorageFactory;
}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available storage
/// implementations.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Creates a storage backend by configuration name.
///
/// Looks the name up in the registry, builds the backend, and validates the
/// provided settings against the backend's own schema.
pub fn create_backend(
	name: &str,
	config: &toml::Value,
) -> Result<Box<dyn StorageInterface>, StorageError> {
	let factory = get_all_implementations()
		.into_iter()
		.find(|(n, _)| *n == name)
		.map(|(_, f)| f)
		.ok_or_else(|| StorageError::Configuration(format!("Unknown storage backend: {}", name)))?;

	let backend = factory(config)?;
	backend
		.config_schema()
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;
	Ok(backend)
}

/// High-level storage service that provides typed operations.
///
/// The StorageService wraps a low-level storage backend and provides
/// convenient methods for storing and retrieving typed data with automatic
/// JSON serialization/deserialization. Keys are composed from a namespace
/// and a record id.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: StorageNamespace, id: &str) -> String {
		format!("{}:{}", namespace.as_str(), id)
	}

	/// Creates a new record, failing if the id is already taken.
	pub async fn create<T: Serialize>(
		&self,
		namespace: StorageNamespace,
		id: &str,
		data: &T,
	) -> Result<u64, StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend
			.set_bytes(&Self::key(namespace, id), bytes, WriteMode::Insert)
			.await
	}

	/// Stores a record with overwrite semantics, creating it if absent.
	pub async fn store<T: Serialize>(
		&self,
		namespace: StorageNamespace,
		id: &str,
		data: &T,
	) -> Result<u64, StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend
			.set_bytes(&Self::key(namespace, id), bytes, WriteMode::Overwrite)
			.await
	}

	/// Updates an existing record.
	///
	/// This method first checks that the key exists, then overwrites the
	/// value. Returns an error if the key doesn't exist, making it
	/// semantically different from store() which will create or overwrite.
	pub async fn update<T: Serialize>(
		&self,
		namespace: StorageNamespace,
		id: &str,
		data: &T,
	) -> Result<u64, StorageError> {
		let key = Self::key(namespace, id);
		if !self.backend.exists(&key).await? {
			return Err(StorageError::NotFound);
		}

		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend
			.set_bytes(&key, bytes, WriteMode::Overwrite)
			.await
	}

	/// Updates an existing record only if its revision still matches.
	///
	/// The expected revision comes from a prior
	/// [`StorageService::retrieve_with_revision`] call; a mismatch means
	/// another writer got there first.
	pub async fn update_at_revision<T: Serialize>(
		&self,
		namespace: StorageNamespace,
		id: &str,
		data: &T,
		revision: u64,
	) -> Result<u64, StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend
			.set_bytes(
				&Self::key(namespace, id),
				bytes,
				WriteMode::IfRevision(revision),
			)
			.await
	}

	/// Retrieves and deserializes a record from storage.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: StorageNamespace,
		id: &str,
	) -> Result<T, StorageError> {
		self.retrieve_with_revision(namespace, id)
			.await
			.map(|(data, _)| data)
	}

	/// Retrieves a record together with its current revision.
	pub async fn retrieve_with_revision<T: DeserializeOwned>(
		&self,
		namespace: StorageNamespace,
		id: &str,
	) -> Result<(T, u64), StorageError> {
		let (bytes, revision) = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		let data = serde_json::from_slice(&bytes)
			.map_err(|e| StorageError::Serialization(e.to_string()))?;
		Ok((data, revision))
	}

	/// Retrieves every record in a namespace.
	///
	/// Ordering is backend-defined.
	pub async fn retrieve_all<T: DeserializeOwned>(
		&self,
		namespace: StorageNamespace,
	) -> Result<Vec<T>, StorageError> {
		let prefix = format!("{}:", namespace.as_str());
		let raw = self.backend.scan_prefix(&prefix).await?;
		raw.into_iter()
			.map(|bytes| {
				serde_json::from_slice(&bytes)
					.map_err(|e| StorageError::Serialization(e.to_string()))
			})
			.collect()
	}

	/// Removes a record from storage.
	pub async fn remove(&self, namespace: StorageNamespace, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&Self::key(namespace, id)).await
	}

	/// Checks if a record exists in storage.
	pub async fn exists(&self, namespace: StorageNamespace, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&Self::key(namespace, id)).await
	}
}

#[cfg(test)]
mod tests {
	use super::implementations::memory::MemoryStorage;
	use super::*;
	use serde::{Deserialize, Serialize};

	#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
	struct Record {
		id: String,
		value: u32,
	}

	fn service() -> StorageService {
		StorageService::new(Box::new(MemoryStorage::new()))
	}

	#[tokio::test]
	async fn typed_round_trip() {
		let service = service();
		let record = Record {
			id: "r1".into(),
			value: 7,
		};

		service
			.create(StorageNamespace::Orders, &record.id, &record)
			.await
			.unwrap();

		let loaded: Record = service
			.retrieve(StorageNamespace::Orders, "r1")
			.await
			.unwrap();
		assert_eq!(loaded, record);
	}

	#[tokio::test]
	async fn create_rejects_duplicate_id() {
		let service = service();
		let record = Record {
			id: "r1".into(),
			value: 1,
		};

		service
			.create(StorageNamespace::Orders, "r1", &record)
			.await
			.unwrap();
		let result = service.create(StorageNamespace::Orders, "r1", &record).await;
		assert!(matches!(result, Err(StorageError::AlreadyExists)));
	}

	#[tokio::test]
	async fn update_requires_existing_record() {
		let service = service();
		let record = Record {
			id: "r1".into(),
			value: 1,
		};

		let result = service.update(StorageNamespace::Orders, "r1", &record).await;
		assert!(matches!(result, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn stale_revision_is_rejected() {
		let service = service();
		let mut record = Record {
			id: "r1".into(),
			value: 1,
		};

		service
			.create(StorageNamespace::Orders, "r1", &record)
			.await
			.unwrap();
		let (_, revision): (Record, u64) = service
			.retrieve_with_revision(StorageNamespace::Orders, "r1")
			.await
			.unwrap();

		// A second writer bumps the revision.
		record.value = 2;
		service
			.store(StorageNamespace::Orders, "r1", &record)
			.await
			.unwrap();

		record.value = 3;
		let result = service
			.update_at_revision(StorageNamespace::Orders, "r1", &record, revision)
			.await;
		assert!(matches!(result, Err(StorageError::RevisionConflict { .. })));

		// The stale writer left the stored record untouched.
		let loaded: Record = service
			.retrieve(StorageNamespace::Orders, "r1")
			.await
			.unwrap();
		assert_eq!(loaded.value, 2);
	}

	#[tokio::test]
	async fn retrieve_all_is_scoped_to_namespace() {
		let service = service();
		for i in 0..3 {
			let record = Record {
				id: format!("r{}", i),
				value: i,
			};
			service
				.create(StorageNamespace::Orders, &record.id, &record)
				.await
				.unwrap();
		}
		let other = Record {
			id: "c1".into(),
			value: 99,
		};
		service
			.create(StorageNamespace::Customers, "c1", &other)
			.await
			.unwrap();

		let orders: Vec<Record> = service.retrieve_all(StorageNamespace::Orders).await.unwrap();
		assert_eq!(orders.len(), 3);
		assert!(orders.iter().all(|r| r.value < 3));
	}

	#[test]
	fn unknown_backend_is_a_configuration_error() {
		let config = toml::Value::Table(toml::Table::new());
		let result = create_backend("cloud", &config);
		assert!(matches!(result, Err(StorageError::Configuration(_))));
	}
}
