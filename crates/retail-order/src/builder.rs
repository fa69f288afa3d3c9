//! Assembles a ready-to-use order system from configuration.
//!
//! The builder picks the storage backend named in the configuration,
//! validates its settings, and wires the catalog stores and the lifecycle
//! manager over a shared storage service.

use crate::lifecycle::{OrderError, OrderLifecycle};
use retail_catalog::{CustomerStore, ProductStore};
use retail_config::Config;
use retail_storage::{create_backend, StorageError, StorageService};
use retail_types::OrderStatus;
use std::sync::Arc;

/// Builder for [`OrderSystem`].
pub struct OrderSystemBuilder {
	config: Config,
}

impl OrderSystemBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the system, instantiating the configured storage backend.
	pub fn build(self) -> Result<OrderSystem, StorageError> {
		let backend = create_backend(
			&self.config.storage.backend,
			&self.config.storage.settings,
		)?;
		let storage = Arc::new(StorageService::new(backend));

		let customers = Arc::new(CustomerStore::new(storage.clone()));
		let products = Arc::new(ProductStore::new(storage.clone()));
		let orders = OrderLifecycle::new(storage, customers.clone(), products.clone());

		tracing::debug!(backend = %self.config.storage.backend, "order system assembled");
		Ok(OrderSystem {
			orders,
			customers,
			products,
		})
	}
}

/// The assembled retail order system.
pub struct OrderSystem {
	/// Order creation, transitions, and listings.
	pub orders: OrderLifecycle,
	/// Customer CRUD.
	pub customers: Arc<CustomerStore>,
	/// Product CRUD.
	pub products: Arc<ProductStore>,
}

/// Entity and status counts for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetailSummary {
	pub total_customers: usize,
	pub total_products: usize,
	pub pending_orders: usize,
	pub completed_orders: usize,
}

impl OrderSystem {
	/// Computes the dashboard summary.
	pub async fn summary(&self) -> Result<RetailSummary, OrderError> {
		let total_customers = self
			.customers
			.list()
			.await
			.map_err(|e| OrderError::Catalog(e.to_string()))?
			.len();
		let total_products = self
			.products
			.list()
			.await
			.map_err(|e| OrderError::Catalog(e.to_string()))?
			.len();
		let orders = self.orders.list_orders().await?;

		Ok(RetailSummary {
			total_customers,
			total_products,
			pending_orders: orders
				.iter()
				.filter(|o| o.status == OrderStatus::Pending)
				.count(),
			completed_orders: orders
				.iter()
				.filter(|o| o.status == OrderStatus::Completed)
				.count(),
		})
	}
}
