//! Order lifecycle manager.
//!
//! Creates orders, validates and applies status transitions, and serves
//! order listings. The manager is stateless; all state lives behind the
//! storage service, and the read-then-write pair in a transition is guarded
//! by the storage revision so a racing writer fails instead of silently
//! losing its update.

use crate::transitions::can_transition;
use chrono::Utc;
use retail_catalog::{CustomerStore, ProductStore};
use retail_storage::{StorageError, StorageService};
use retail_types::{Customer, Order, OrderDraft, OrderStatus, Product, StorageNamespace};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during order lifecycle operations.
#[derive(Debug, Error)]
pub enum OrderError {
	#[error("Order not found: {0}")]
	NotFound(String),
	#[error("Cannot change status from {from} to {to}")]
	InvalidTransition { from: OrderStatus, to: OrderStatus },
	#[error("Order {0} was modified concurrently")]
	ConcurrentModification(String),
	#[error("Storage error: {0}")]
	Storage(String),
	#[error("Catalog error: {0}")]
	Catalog(String),
}

/// An order joined with its customer and product records for display.
///
/// References that no longer resolve (deleted customer or product) come
/// back as None rather than failing the listing.
#[derive(Debug, Clone)]
pub struct OrderDetails {
	pub order: Order,
	pub customer: Option<Customer>,
	pub product: Option<Product>,
}

/// Manages order creation, status transitions, and persistence.
pub struct OrderLifecycle {
	storage: Arc<StorageService>,
	customers: Arc<CustomerStore>,
	products: Arc<ProductStore>,
}

impl OrderLifecycle {
	pub fn new(
		storage: Arc<StorageService>,
		customers: Arc<CustomerStore>,
		products: Arc<ProductStore>,
	) -> Self {
		Self {
			storage,
			customers,
			products,
		}
	}

	fn storage_error(order_id: &str, e: StorageError) -> OrderError {
		match e {
			StorageError::NotFound => OrderError::NotFound(order_id.to_string()),
			StorageError::RevisionConflict { .. } => {
				OrderError::ConcurrentModification(order_id.to_string())
			},
			e => OrderError::Storage(e.to_string()),
		}
	}

	/// Creates a new order from a draft.
	///
	/// Assigns a fresh key, sets the status to Pending and the order date
	/// to now, and persists the record with a create-only write. Drafts are
	/// not deduplicated; identical drafts produce distinct orders. Field
	/// validation is the caller's concern (see [`OrderDraft::validate`]).
	pub async fn create_order(&self, draft: OrderDraft) -> Result<Order, OrderError> {
		let order = Order {
			id: Uuid::new_v4().to_string(),
			customer_id: draft.customer_id,
			product_id: draft.product_id,
			quantity: draft.quantity,
			total_amount: draft.total_amount,
			order_date: Utc::now(),
			status: OrderStatus::Pending,
		};

		self.storage
			.create(StorageNamespace::Orders, &order.id, &order)
			.await
			.map_err(|e| Self::storage_error(&order.id, e))?;

		tracing::debug!(order_id = %order.id, customer_id = %order.customer_id, "order created");
		Ok(order)
	}

	/// Transitions an order to a new status with validation.
	///
	/// Loads the persisted order, checks the transition table, persists the
	/// full updated record conditional on the revision observed at read
	/// time, and returns it. A failed transition leaves the stored order
	/// unchanged; nothing is retried.
	pub async fn apply_transition(
		&self,
		order_id: &str,
		target: OrderStatus,
	) -> Result<Order, OrderError> {
		let (mut order, revision): (Order, u64) = self
			.storage
			.retrieve_with_revision(StorageNamespace::Orders, order_id)
			.await
			.map_err(|e| Self::storage_error(order_id, e))?;

		if !can_transition(order.status, target) {
			tracing::warn!(
				order_id = %order_id,
				from = %order.status,
				to = %target,
				"rejected status transition"
			);
			return Err(OrderError::InvalidTransition {
				from: order.status,
				to: target,
			});
		}

		order.status = target;
		self.storage
			.update_at_revision(StorageNamespace::Orders, order_id, &order, revision)
			.await
			.map_err(|e| Self::storage_error(order_id, e))?;

		tracing::debug!(order_id = %order_id, status = %target, "order status updated");
		Ok(order)
	}

	/// Gets an order by id.
	pub async fn get_order(&self, order_id: &str) -> Result<Order, OrderError> {
		self.storage
			.retrieve(StorageNamespace::Orders, order_id)
			.await
			.map_err(|e| Self::storage_error(order_id, e))
	}

	/// Lists all orders.
	pub async fn list_orders(&self) -> Result<Vec<Order>, OrderError> {
		self.storage
			.retrieve_all(StorageNamespace::Orders)
			.await
			.map_err(|e| OrderError::Storage(e.to_string()))
	}

	/// Lists orders currently in the given status.
	pub async fn orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, OrderError> {
		let mut orders = self.list_orders().await?;
		orders.retain(|o| o.status == status);
		Ok(orders)
	}

	/// Lists all orders joined with their customer and product records.
	pub async fn orders_with_details(&self) -> Result<Vec<OrderDetails>, OrderError> {
		let orders = self.list_orders().await?;
		let customers = self
			.customers
			.list()
			.await
			.map_err(|e| OrderError::Catalog(e.to_string()))?;
		let products = self
			.products
			.list()
			.await
			.map_err(|e| OrderError::Catalog(e.to_string()))?;

		Ok(orders
			.into_iter()
			.map(|order| {
				let customer = customers.iter().find(|c| c.id == order.customer_id).cloned();
				let product = products.iter().find(|p| p.id == order.product_id).cloned();
				OrderDetails {
					order,
					customer,
					product,
				}
			})
			.collect())
	}

	/// Deletes an order by id. There is no soft delete or archival.
	pub async fn delete_order(&self, order_id: &str) -> Result<(), OrderError> {
		self.storage
			.remove(StorageNamespace::Orders, order_id)
			.await
			.map_err(|e| OrderError::Storage(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use retail_storage::implementations::memory::MemoryStorage;
	use retail_storage::{StorageInterface, WriteMode};
	use retail_types::ConfigSchema;
	use rust_decimal::Decimal;
	use std::sync::atomic::{AtomicBool, Ordering};

	fn lifecycle_over(backend: Box<dyn StorageInterface>) -> OrderLifecycle {
		let storage = Arc::new(StorageService::new(backend));
		OrderLifecycle::new(
			storage.clone(),
			Arc::new(CustomerStore::new(storage.clone())),
			Arc::new(ProductStore::new(storage)),
		)
	}

	fn lifecycle() -> OrderLifecycle {
		lifecycle_over(Box::new(MemoryStorage::new()))
	}

	fn draft() -> OrderDraft {
		OrderDraft {
			customer_id: "cust-1".into(),
			product_id: "prod-1".into(),
			quantity: 3,
			total_amount: Decimal::new(7497, 2),
		}
	}

	/// Drives an order along valid edges until it reaches the wanted status.
	async fn order_in_status(lifecycle: &OrderLifecycle, status: OrderStatus) -> Order {
		let order = lifecycle.create_order(draft()).await.unwrap();
		let path: &[OrderStatus] = match status {
			OrderStatus::Pending => &[],
			OrderStatus::Processing => &[OrderStatus::Processing],
			OrderStatus::Shipped => &[OrderStatus::Processing, OrderStatus::Shipped],
			OrderStatus::Delivered => &[
				OrderStatus::Processing,
				OrderStatus::Shipped,
				OrderStatus::Delivered,
			],
			OrderStatus::Completed => &[
				OrderStatus::Processing,
				OrderStatus::Shipped,
				OrderStatus::Delivered,
				OrderStatus::Completed,
			],
			OrderStatus::Cancelled => &[OrderStatus::Cancelled],
			OrderStatus::Returned => &[
				OrderStatus::Processing,
				OrderStatus::Shipped,
				OrderStatus::Returned,
			],
			OrderStatus::Refunded => &[
				OrderStatus::Processing,
				OrderStatus::Shipped,
				OrderStatus::Returned,
				OrderStatus::Refunded,
			],
		};
		let mut current = order;
		for step in path {
			current = lifecycle.apply_transition(&current.id, *step).await.unwrap();
		}
		current
	}

	#[tokio::test]
	async fn create_order_starts_pending_with_fresh_key() {
		let lifecycle = lifecycle();

		let first = lifecycle.create_order(draft()).await.unwrap();
		let second = lifecycle.create_order(draft()).await.unwrap();

		assert_eq!(first.status, OrderStatus::Pending);
		assert_eq!(second.status, OrderStatus::Pending);
		assert_ne!(first.id, second.id);

		// Both persisted despite identical draft contents.
		assert_eq!(lifecycle.list_orders().await.unwrap().len(), 2);
	}

	#[tokio::test]
	async fn transition_on_missing_order_is_not_found() {
		let lifecycle = lifecycle();
		let result = lifecycle
			.apply_transition("missing", OrderStatus::Processing)
			.await;
		assert!(matches!(result, Err(OrderError::NotFound(id)) if id == "missing"));
		// No write happened.
		assert!(lifecycle.list_orders().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn pending_to_processing_succeeds() {
		let lifecycle = lifecycle();
		let order = lifecycle.create_order(draft()).await.unwrap();

		let updated = lifecycle
			.apply_transition(&order.id, OrderStatus::Processing)
			.await
			.unwrap();
		assert_eq!(updated.status, OrderStatus::Processing);

		// The stored record reflects the change.
		let stored = lifecycle.get_order(&order.id).await.unwrap();
		assert_eq!(stored.status, OrderStatus::Processing);
	}

	#[tokio::test]
	async fn pending_to_shipped_is_rejected_with_both_statuses() {
		let lifecycle = lifecycle();
		let order = lifecycle.create_order(draft()).await.unwrap();

		let result = lifecycle
			.apply_transition(&order.id, OrderStatus::Shipped)
			.await;
		assert!(matches!(
			result,
			Err(OrderError::InvalidTransition {
				from: OrderStatus::Pending,
				to: OrderStatus::Shipped,
			})
		));

		// The stored order is unchanged.
		let stored = lifecycle.get_order(&order.id).await.unwrap();
		assert_eq!(stored.status, OrderStatus::Pending);
	}

	#[tokio::test]
	async fn completed_order_rejects_every_target() {
		let lifecycle = lifecycle();
		let order = order_in_status(&lifecycle, OrderStatus::Completed).await;

		for target in OrderStatus::all() {
			let result = lifecycle.apply_transition(&order.id, target).await;
			assert!(
				matches!(result, Err(OrderError::InvalidTransition { .. })),
				"Completed -> {} should be rejected",
				target
			);
		}
	}

	#[tokio::test]
	async fn returned_order_can_only_be_refunded() {
		let lifecycle = lifecycle();
		let order = order_in_status(&lifecycle, OrderStatus::Returned).await;

		let refunded = lifecycle
			.apply_transition(&order.id, OrderStatus::Refunded)
			.await
			.unwrap();
		assert_eq!(refunded.status, OrderStatus::Refunded);

		let result = lifecycle
			.apply_transition(&order.id, OrderStatus::Pending)
			.await;
		assert!(matches!(result, Err(OrderError::InvalidTransition { .. })));
	}

	#[tokio::test]
	async fn orders_by_status_filters() {
		let lifecycle = lifecycle();
		order_in_status(&lifecycle, OrderStatus::Processing).await;
		order_in_status(&lifecycle, OrderStatus::Pending).await;
		order_in_status(&lifecycle, OrderStatus::Pending).await;

		let pending = lifecycle.orders_by_status(OrderStatus::Pending).await.unwrap();
		assert_eq!(pending.len(), 2);
		let shipped = lifecycle.orders_by_status(OrderStatus::Shipped).await.unwrap();
		assert!(shipped.is_empty());
	}

	#[tokio::test]
	async fn delete_order_removes_the_record() {
		let lifecycle = lifecycle();
		let order = lifecycle.create_order(draft()).await.unwrap();

		lifecycle.delete_order(&order.id).await.unwrap();
		assert!(matches!(
			lifecycle.get_order(&order.id).await,
			Err(OrderError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn details_join_resolves_known_references() {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		let customers = Arc::new(CustomerStore::new(storage.clone()));
		let products = Arc::new(ProductStore::new(storage.clone()));
		let lifecycle = OrderLifecycle::new(storage, customers.clone(), products.clone());

		let customer = customers
			.add(Customer {
				id: "cust-1".into(),
				name: "Thandi Nkosi".into(),
				email: "thandi@example.com".into(),
				phone: None,
			})
			.await
			.unwrap();
		lifecycle.create_order(draft()).await.unwrap();

		let details = lifecycle.orders_with_details().await.unwrap();
		assert_eq!(details.len(), 1);
		// Customer resolves, the product was never added.
		assert_eq!(details[0].customer.as_ref().map(|c| c.id.as_str()), Some(customer.id.as_str()));
		assert!(details[0].product.is_none());
	}

	/// Storage double that lets another writer slip in before the first
	/// conditional write it sees.
	struct RacingStorage {
		inner: MemoryStorage,
		raced: AtomicBool,
	}

	#[async_trait]
	impl StorageInterface for RacingStorage {
		async fn get_bytes(&self, key: &str) -> Result<(Vec<u8>, u64), retail_storage::StorageError> {
			self.inner.get_bytes(key).await
		}

		async fn set_bytes(
			&self,
			key: &str,
			value: Vec<u8>,
			mode: WriteMode,
		) -> Result<u64, retail_storage::StorageError> {
			if matches!(mode, WriteMode::IfRevision(_)) && !self.raced.swap(true, Ordering::SeqCst)
			{
				self.inner
					.set_bytes(key, value.clone(), WriteMode::Overwrite)
					.await?;
			}
			self.inner.set_bytes(key, value, mode).await
		}

		async fn delete(&self, key: &str) -> Result<(), retail_storage::StorageError> {
			self.inner.delete(key).await
		}

		async fn exists(&self, key: &str) -> Result<bool, retail_storage::StorageError> {
			self.inner.exists(key).await
		}

		async fn scan_prefix(
			&self,
			prefix: &str,
		) -> Result<Vec<Vec<u8>>, retail_storage::StorageError> {
			self.inner.scan_prefix(prefix).await
		}

		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			self.inner.config_schema()
		}
	}

	#[tokio::test]
	async fn racing_writer_fails_with_concurrent_modification() {
		let lifecycle = lifecycle_over(Box::new(RacingStorage {
			inner: MemoryStorage::new(),
			raced: AtomicBool::new(false),
		}));
		let order = lifecycle.create_order(draft()).await.unwrap();

		let result = lifecycle
			.apply_transition(&order.id, OrderStatus::Processing)
			.await;
		assert!(matches!(
			result,
			Err(OrderError::ConcurrentModification(id)) if id == order.id
		));

		// The racer's write landed, so a retry proceeds from Processing.
		let updated = lifecycle
			.apply_transition(&order.id, OrderStatus::Shipped)
			.await
			.unwrap();
		assert_eq!(updated.status, OrderStatus::Shipped);
	}
}
