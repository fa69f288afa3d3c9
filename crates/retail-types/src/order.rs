//! Order types for the retail system.
//!
//! This module defines the persisted order record, the draft submitted when
//! placing a new order, and the status enumeration an order moves through
//! during its lifecycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A purchase record tracked through a fixed lifecycle of statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier for this order.
	pub id: String,
	/// Key of the customer who placed the order.
	pub customer_id: String,
	/// Key of the ordered product.
	pub product_id: String,
	/// Number of units ordered. Always positive.
	pub quantity: u32,
	/// Total charge for the order.
	pub total_amount: Decimal,
	/// Timestamp when the order was placed.
	pub order_date: DateTime<Utc>,
	/// Current lifecycle status.
	pub status: OrderStatus,
}

/// Lifecycle status of an order.
///
/// Status changes are only permitted along the edges of the transition
/// table owned by the order-lifecycle crate; the enumeration itself carries
/// no transition knowledge beyond which states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
	/// Newly placed, not yet picked up for processing.
	Pending,
	/// Being prepared for shipment.
	Processing,
	/// Handed to the carrier.
	Shipped,
	/// Received by the customer.
	Delivered,
	/// Closed successfully.
	Completed,
	/// Abandoned before shipment.
	Cancelled,
	/// Sent back by the customer.
	Returned,
	/// Return settled, money refunded.
	Refunded,
}

impl OrderStatus {
	/// Returns the string representation of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Pending => "Pending",
			OrderStatus::Processing => "Processing",
			OrderStatus::Shipped => "Shipped",
			OrderStatus::Delivered => "Delivered",
			OrderStatus::Completed => "Completed",
			OrderStatus::Cancelled => "Cancelled",
			OrderStatus::Returned => "Returned",
			OrderStatus::Refunded => "Refunded",
		}
	}

	/// Returns an iterator over all status variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Pending,
			Self::Processing,
			Self::Shipped,
			Self::Delivered,
			Self::Completed,
			Self::Cancelled,
			Self::Returned,
			Self::Refunded,
		]
		.into_iter()
	}

	/// True for statuses with no outgoing transitions.
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Refunded
		)
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for OrderStatus {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"Pending" => Ok(Self::Pending),
			"Processing" => Ok(Self::Processing),
			"Shipped" => Ok(Self::Shipped),
			"Delivered" => Ok(Self::Delivered),
			"Completed" => Ok(Self::Completed),
			"Cancelled" => Ok(Self::Cancelled),
			"Returned" => Ok(Self::Returned),
			"Refunded" => Ok(Self::Refunded),
			_ => Err(()),
		}
	}
}

/// Errors produced when a draft fails field validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
	#[error("Customer is required")]
	MissingCustomer,
	#[error("Product is required")]
	MissingProduct,
	#[error("Quantity must be at least 1")]
	QuantityOutOfRange,
	#[error("Total amount must be greater than 0")]
	AmountOutOfRange,
}

/// Fields submitted when placing a new order.
///
/// Drafts carry no key, status, or date; those are assigned when the order
/// is created. Callers are expected to run [`OrderDraft::validate`] before
/// handing a draft to the lifecycle manager, which does not re-check it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
	pub customer_id: String,
	pub product_id: String,
	pub quantity: u32,
	pub total_amount: Decimal,
}

impl OrderDraft {
	/// Checks draft fields against their allowed ranges.
	pub fn validate(&self) -> Result<(), DraftError> {
		if self.customer_id.is_empty() {
			return Err(DraftError::MissingCustomer);
		}
		if self.product_id.is_empty() {
			return Err(DraftError::MissingProduct);
		}
		if self.quantity == 0 {
			return Err(DraftError::QuantityOutOfRange);
		}
		if self.total_amount <= Decimal::ZERO {
			return Err(DraftError::AmountOutOfRange);
		}
		Ok(())
	}
}
