//! Catalog stores for the retail system.
//!
//! Provides CRUD access to customer and product records on top of the
//! storage service. Orders reference catalog records by id; the order
//! crate joins them back in for display listings.

use retail_storage::{StorageError, StorageService};
use retail_types::{Customer, Product, StorageNamespace};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
	#[error("Record not found: {0}")]
	NotFound(String),
	#[error("Storage error: {0}")]
	Storage(String),
}

impl CatalogError {
	fn from_storage(id: &str, e: StorageError) -> Self {
		match e {
			StorageError::NotFound => CatalogError::NotFound(id.to_string()),
			e => CatalogError::Storage(e.to_string()),
		}
	}
}

/// Store for customer records.
pub struct CustomerStore {
	storage: Arc<StorageService>,
}

impl CustomerStore {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Adds a customer, generating a fresh key when the id is empty.
	///
	/// Returns the stored record with its assigned id.
	pub async fn add(&self, mut customer: Customer) -> Result<Customer, CatalogError> {
		if customer.id.is_empty() {
			customer.id = Uuid::new_v4().to_string();
		}
		self.storage
			.create(StorageNamespace::Customers, &customer.id, &customer)
			.await
			.map_err(|e| CatalogError::from_storage(&customer.id, e))?;
		tracing::debug!(customer_id = %customer.id, "customer added");
		Ok(customer)
	}

	/// Gets a customer by id.
	pub async fn get(&self, id: &str) -> Result<Customer, CatalogError> {
		self.storage
			.retrieve(StorageNamespace::Customers, id)
			.await
			.map_err(|e| CatalogError::from_storage(id, e))
	}

	/// Lists all customers.
	pub async fn list(&self) -> Result<Vec<Customer>, CatalogError> {
		self.storage
			.retrieve_all(StorageNamespace::Customers)
			.await
			.map_err(|e| CatalogError::Storage(e.to_string()))
	}

	/// Replaces an existing customer record.
	pub async fn update(&self, customer: &Customer) -> Result<(), CatalogError> {
		self.storage
			.update(StorageNamespace::Customers, &customer.id, customer)
			.await
			.map_err(|e| CatalogError::from_storage(&customer.id, e))?;
		Ok(())
	}

	/// Deletes a customer by id. Deleting a missing customer is not an error.
	pub async fn delete(&self, id: &str) -> Result<(), CatalogError> {
		self.storage
			.remove(StorageNamespace::Customers, id)
			.await
			.map_err(|e| CatalogError::Storage(e.to_string()))
	}
}

/// Store for product records.
pub struct ProductStore {
	storage: Arc<StorageService>,
}

impl ProductStore {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Adds a product, generating a fresh key when the id is empty.
	pub async fn add(&self, mut product: Product) -> Result<Product, CatalogError> {
		if product.id.is_empty() {
			product.id = Uuid::new_v4().to_string();
		}
		self.storage
			.create(StorageNamespace::Products, &product.id, &product)
			.await
			.map_err(|e| CatalogError::from_storage(&product.id, e))?;
		tracing::debug!(product_id = %product.id, "product added");
		Ok(product)
	}

	/// Gets a product by id.
	pub async fn get(&self, id: &str) -> Result<Product, CatalogError> {
		self.storage
			.retrieve(StorageNamespace::Products, id)
			.await
			.map_err(|e| CatalogError::from_storage(id, e))
	}

	/// Lists all products.
	pub async fn list(&self) -> Result<Vec<Product>, CatalogError> {
		self.storage
			.retrieve_all(StorageNamespace::Products)
			.await
			.map_err(|e| CatalogError::Storage(e.to_string()))
	}

	/// Replaces an existing product record.
	pub async fn update(&self, product: &Product) -> Result<(), CatalogError> {
		self.storage
			.update(StorageNamespace::Products, &product.id, product)
			.await
			.map_err(|e| CatalogError::from_storage(&product.id, e))?;
		Ok(())
	}

	/// Deletes a product by id. Deleting a missing product is not an error.
	pub async fn delete(&self, id: &str) -> Result<(), CatalogError> {
		self.storage
			.remove(StorageNamespace::Products, id)
			.await
			.map_err(|e| CatalogError::Storage(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use retail_storage::implementations::memory::MemoryStorage;
	use rust_decimal::Decimal;

	fn storage() -> Arc<StorageService> {
		Arc::new(StorageService::new(Box::new(MemoryStorage::new())))
	}

	fn customer() -> Customer {
		Customer {
			id: String::new(),
			name: "Thandi Nkosi".into(),
			email: "thandi@example.com".into(),
			phone: None,
		}
	}

	fn product() -> Product {
		Product {
			id: String::new(),
			name: "Kettle".into(),
			description: "1.7l electric kettle".into(),
			price: Decimal::new(34999, 2),
			stock_quantity: 12,
			image_url: None,
		}
	}

	#[tokio::test]
	async fn customer_crud_round_trip() {
		let store = CustomerStore::new(storage());

		let added = store.add(customer()).await.unwrap();
		assert!(!added.id.is_empty());

		let mut loaded = store.get(&added.id).await.unwrap();
		assert_eq!(loaded, added);

		loaded.phone = Some("+27 21 555 0101".into());
		store.update(&loaded).await.unwrap();
		assert_eq!(store.get(&added.id).await.unwrap().phone, loaded.phone);

		store.delete(&added.id).await.unwrap();
		assert!(matches!(
			store.get(&added.id).await,
			Err(CatalogError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn update_missing_customer_is_not_found() {
		let store = CustomerStore::new(storage());
		let mut missing = customer();
		missing.id = "nope".into();
		assert!(matches!(
			store.update(&missing).await,
			Err(CatalogError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn product_listing() {
		let store = ProductStore::new(storage());
		store.add(product()).await.unwrap();
		let mut second = product();
		second.name = "Toaster".into();
		store.add(second).await.unwrap();

		let products = store.list().await.unwrap();
		assert_eq!(products.len(), 2);
	}

	#[tokio::test]
	async fn add_keeps_caller_assigned_id() {
		let store = ProductStore::new(storage());
		let mut p = product();
		p.id = "prod-7".into();
		let added = store.add(p).await.unwrap();
		assert_eq!(added.id, "prod-7");
		assert!(store.get("prod-7").await.is_ok());
	}
}
