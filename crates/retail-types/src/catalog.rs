//! Catalog entities persisted alongside orders.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A customer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
	/// Unique identifier for this customer.
	pub id: String,
	pub name: String,
	pub email: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
}

/// A product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
	/// Unique identifier for this product.
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub description: String,
	/// Unit price.
	pub price: Decimal,
	/// Units currently in stock. Zero means out of stock.
	pub stock_quantity: u32,
	/// Location of the product image, when one has been uploaded.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub image_url: Option<String>,
}
