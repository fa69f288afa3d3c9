//! Storage-related types for the retail system.

use std::str::FromStr;

/// Namespaces for the persisted data collections.
///
/// This enum provides type safety for storage operations by replacing
/// string literals with strongly typed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageNamespace {
	/// Namespace for order records
	Orders,
	/// Namespace for customer records
	Customers,
	/// Namespace for product records
	Products,
}

impl StorageNamespace {
	/// Returns the string representation of the namespace.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageNamespace::Orders => "orders",
			StorageNamespace::Customers => "customers",
			StorageNamespace::Products => "products",
		}
	}

	/// Returns an iterator over all namespace variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[Self::Orders, Self::Customers, Self::Products].into_iter()
	}
}

impl FromStr for StorageNamespace {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"orders" => Ok(Self::Orders),
			"customers" => Ok(Self::Customers),
			"products" => Ok(Self::Products),
			_ => Err(()),
		}
	}
}

impl From<StorageNamespace> for &'static str {
	fn from(ns: StorageNamespace) -> Self {
		ns.as_str()
	}
}
