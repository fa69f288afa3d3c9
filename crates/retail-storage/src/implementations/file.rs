//! File-based storage backend implementation for the retail system.
//!
//! This module stores one binary file per record under a base directory,
//! providing simple persistence without external dependencies. Each file
//! carries a fixed header holding the record's revision counter.

use crate::{StorageError, StorageInterface, StorageRegistry, WriteMode};
use async_trait::async_trait;
use retail_types::{ConfigSchema, Field, FieldType, Schema, ValidationError};
use std::path::PathBuf;
use tokio::fs;

/// Fixed-size file header carrying the record revision.
///
/// Binary layout (16 bytes total):
/// - [0-3]: Magic bytes "RTLS"
/// - [4-5]: Format version (u16, little-endian)
/// - [6-7]: Reserved
/// - [8-15]: Record revision (u64, little-endian)
#[derive(Debug, Clone)]
struct FileHeader {
	revision: u64,
}

impl FileHeader {
	const MAGIC: &'static [u8; 4] = b"RTLS";
	const VERSION: u16 = 1;
	const SIZE: usize = 16;

	fn new(revision: u64) -> Self {
		Self { revision }
	}

	/// Serializes the header to bytes.
	fn serialize(&self) -> [u8; Self::SIZE] {
		let mut bytes = [0u8; Self::SIZE];
		bytes[0..4].copy_from_slice(Self::MAGIC);
		bytes[4..6].copy_from_slice(&Self::VERSION.to_le_bytes());
		bytes[8..16].copy_from_slice(&self.revision.to_le_bytes());
		bytes
	}

	/// Deserializes a header from bytes.
	fn deserialize(bytes: &[u8]) -> Result<Self, StorageError> {
		if bytes.len() < Self::SIZE {
			return Err(StorageError::Backend("File too small for header".into()));
		}

		if &bytes[0..4] != Self::MAGIC {
			return Err(StorageError::Backend("Bad magic bytes".into()));
		}

		let version = u16::from_le_bytes([bytes[4], bytes[5]]);
		if version > Self::VERSION {
			return Err(StorageError::Backend(format!(
				"Unsupported file version: {}",
				version
			)));
		}

		let mut revision_bytes = [0u8; 8];
		revision_bytes.copy_from_slice(&bytes[8..16]);

		Ok(Self {
			revision: u64::from_le_bytes(revision_bytes),
		})
	}
}

/// File-based storage implementation.
///
/// Writes are performed atomically by writing to a temp file and renaming.
/// The revision check in conditional writes is read-then-rename rather than
/// a single atomic step; the backend assumes a single process owns the
/// directory.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
}

impl FileStorage {
	/// Creates a new FileStorage instance with the specified base path.
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Converts a storage key to a filesystem-safe file path.
	///
	/// Sanitizes the key by replacing problematic characters and appending
	/// a .bin extension.
	fn get_file_path(&self, key: &str) -> PathBuf {
		let safe_key = Self::sanitize(key);
		self.base_path.join(format!("{}.bin", safe_key))
	}

	fn sanitize(key: &str) -> String {
		key.replace(['/', ':'], "_")
	}

	/// Reads the revision currently stored for a key, if any.
	async fn current_revision(&self, key: &str) -> Result<Option<u64>, StorageError> {
		let path = self.get_file_path(key);
		match fs::read(&path).await {
			Ok(data) => Ok(Some(FileHeader::deserialize(&data)?.revision)),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<(Vec<u8>, u64), StorageError> {
		let path = self.get_file_path(key);

		let data = match fs::read(&path).await {
			Ok(data) => data,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(StorageError::NotFound)
			},
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let header = FileHeader::deserialize(&data)?;
		Ok((data[FileHeader::SIZE..].to_vec(), header.revision))
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		mode: WriteMode,
	) -> Result<u64, StorageError> {
		let path = self.get_file_path(key);

		// Create parent directory if it doesn't exist
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		let current = self.current_revision(key).await?;
		let revision = match (mode, current) {
			(WriteMode::Insert, Some(_)) => return Err(StorageError::AlreadyExists),
			(WriteMode::IfRevision(expected), Some(actual)) if expected != actual => {
				return Err(StorageError::RevisionConflict { expected, actual });
			},
			(WriteMode::IfRevision(_), None) => return Err(StorageError::NotFound),
			(_, current) => current.unwrap_or(0) + 1,
		};

		let header = FileHeader::new(revision);
		let mut file_data = Vec::with_capacity(FileHeader::SIZE + value.len());
		file_data.extend_from_slice(&header.serialize());
		file_data.extend_from_slice(&value);

		// Write atomically by writing to temp file then renaming
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, file_data)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(revision)
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let path = self.get_file_path(key);
		Ok(path.exists())
	}

	async fn scan_prefix(&self, prefix: &str) -> Result<Vec<Vec<u8>>, StorageError> {
		let safe_prefix = Self::sanitize(prefix);
		let mut values = Vec::new();

		let mut entries = match fs::read_dir(&self.base_path).await {
			Ok(entries) => entries,
			// An empty namespace before the first write
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(values),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new("bin")) {
				continue;
			}
			let matches = path
				.file_stem()
				.and_then(|s| s.to_str())
				.is_some_and(|name| name.starts_with(&safe_prefix));
			if !matches {
				continue;
			}

			match fs::read(&path).await {
				Ok(data) => match FileHeader::deserialize(&data) {
					Ok(_) => values.push(data[FileHeader::SIZE..].to_vec()),
					Err(e) => {
						tracing::warn!("Skipping file {:?}: {}", path, e);
					},
				},
				Err(e) => {
					tracing::debug!("Skipping file {:?}: could not be read: {}", path, e);
				},
			}
		}

		Ok(values)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![], // No required fields
			vec![
				Field::new("storage_path", FieldType::String).with_validator(|v| {
					if v.as_str().is_some_and(|s| s.is_empty()) {
						Err("storage_path must not be empty".to_string())
					} else {
						Ok(())
					}
				}),
			],
		);
		schema.validate(config)
	}
}

/// Registry entry for the file backend.
pub struct Registry;

impl StorageRegistry for Registry {
	const NAME: &'static str = "file";

	fn factory() -> crate::StorageFactory {
		create_storage
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for file storage (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/storage")
		.to_string();

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[tokio::test]
	async fn test_basic_operations() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().to_path_buf());

		let key = "orders:1";
		let value = b"test_value".to_vec();
		let revision = storage
			.set_bytes(key, value.clone(), WriteMode::Overwrite)
			.await
			.unwrap();
		assert_eq!(revision, 1);

		let (retrieved, revision) = storage.get_bytes(key).await.unwrap();
		assert_eq!(retrieved, value);
		assert_eq!(revision, 1);

		assert!(storage.exists(key).await.unwrap());
		storage.delete(key).await.unwrap();
		assert!(!storage.exists(key).await.unwrap());
		assert!(matches!(
			storage.get_bytes(key).await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_revision_survives_reopen() {
		let temp_dir = TempDir::new().unwrap();
		let key = "orders:1";

		{
			let storage = FileStorage::new(temp_dir.path().to_path_buf());
			storage
				.set_bytes(key, b"v1".to_vec(), WriteMode::Overwrite)
				.await
				.unwrap();
			storage
				.set_bytes(key, b"v2".to_vec(), WriteMode::Overwrite)
				.await
				.unwrap();
		}

		// A fresh instance over the same directory sees the bumped revision.
		let storage = FileStorage::new(temp_dir.path().to_path_buf());
		let (value, revision) = storage.get_bytes(key).await.unwrap();
		assert_eq!(value, b"v2".to_vec());
		assert_eq!(revision, 2);

		let result = storage
			.set_bytes(key, b"v3".to_vec(), WriteMode::IfRevision(1))
			.await;
		assert!(matches!(
			result,
			Err(StorageError::RevisionConflict {
				expected: 1,
				actual: 2
			})
		));
	}

	#[tokio::test]
	async fn test_insert_precondition() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().to_path_buf());

		storage
			.set_bytes("orders:1", b"v1".to_vec(), WriteMode::Insert)
			.await
			.unwrap();
		let result = storage
			.set_bytes("orders:1", b"v2".to_vec(), WriteMode::Insert)
			.await;
		assert!(matches!(result, Err(StorageError::AlreadyExists)));
	}

	#[tokio::test]
	async fn test_scan_prefix() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().to_path_buf());

		for i in 0..3u8 {
			storage
				.set_bytes(&format!("orders:{}", i), vec![i], WriteMode::Overwrite)
				.await
				.unwrap();
		}
		storage
			.set_bytes("customers:0", vec![9], WriteMode::Overwrite)
			.await
			.unwrap();

		let mut values = storage.scan_prefix("orders:").await.unwrap();
		values.sort();
		assert_eq!(values, vec![vec![0], vec![1], vec![2]]);
	}

	#[tokio::test]
	async fn test_scan_missing_directory_is_empty() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().join("nested"));
		assert!(storage.scan_prefix("orders:").await.unwrap().is_empty());
	}
}
