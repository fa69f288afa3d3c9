//! The fixed directed graph of allowed order status changes.
//!
//! The table is built once for the process and never mutated. Terminal
//! statuses map to an empty set, so every query funnels through the same
//! lookup: a transition is allowed iff the target appears in the source's
//! adjacency set.

use once_cell::sync::Lazy;
use retail_types::OrderStatus;
use std::collections::{HashMap, HashSet};

/// Process-wide transition table. Each status maps to its allowed next
/// statuses; there are no self-loops.
static TRANSITIONS: Lazy<HashMap<OrderStatus, HashSet<OrderStatus>>> = Lazy::new(|| {
	let mut m = HashMap::new();
	m.insert(
		OrderStatus::Pending,
		HashSet::from([OrderStatus::Processing, OrderStatus::Cancelled]),
	);
	m.insert(
		OrderStatus::Processing,
		HashSet::from([OrderStatus::Shipped, OrderStatus::Cancelled]),
	);
	m.insert(
		OrderStatus::Shipped,
		HashSet::from([OrderStatus::Delivered, OrderStatus::Returned]),
	);
	m.insert(
		OrderStatus::Delivered,
		HashSet::from([OrderStatus::Completed, OrderStatus::Returned]),
	);
	m.insert(
		OrderStatus::Returned,
		HashSet::from([OrderStatus::Refunded]),
	);
	m.insert(OrderStatus::Completed, HashSet::new()); // terminal
	m.insert(OrderStatus::Cancelled, HashSet::new()); // terminal
	m.insert(OrderStatus::Refunded, HashSet::new()); // terminal
	m
});

static NO_TRANSITIONS: Lazy<HashSet<OrderStatus>> = Lazy::new(HashSet::new);

/// Checks if a status transition is allowed.
///
/// A status absent from the table has no outgoing edges, so the check
/// returns false rather than erroring. `from == to` is never allowed.
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
	TRANSITIONS.get(&from).is_some_and(|set| set.contains(&to))
}

/// Returns the allowed next statuses for the given status.
///
/// Read-only; useful for rendering the next actions a user may take.
pub fn allowed_transitions(from: OrderStatus) -> &'static HashSet<OrderStatus> {
	TRANSITIONS.get(&from).unwrap_or(&NO_TRANSITIONS)
}
