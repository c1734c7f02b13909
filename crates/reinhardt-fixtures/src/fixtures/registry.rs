//! Registry of loaded fixture sets.
//!
//! The registry is an explicit value owned by the test context and shared
//! through `Arc`; nothing is looked up from process-wide state.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::{FixtureRecord, FixtureSet};

/// Loaded fixture sets keyed by table name.
#[derive(Debug, Default)]
pub struct FixtureRegistry {
	sets: RwLock<IndexMap<String, Arc<FixtureSet>>>,
}

impl FixtureRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers the set of one table.
	pub fn insert(&self, table: impl Into<String>, set: Arc<FixtureSet>) {
		self.sets.write().insert(table.into(), set);
	}

	/// Adds sets keyed by table, replacing only the tables they cover.
	///
	/// Entries for other tables stay visible.
	pub fn merge<I, K>(&self, sets: I)
	where
		I: IntoIterator<Item = (K, Arc<FixtureSet>)>,
		K: Into<String>,
	{
		let mut guard = self.sets.write();
		for (table, set) in sets {
			guard.insert(table.into(), set);
		}
	}

	/// Gets the set loaded for a table.
	pub fn get(&self, table: &str) -> Option<Arc<FixtureSet>> {
		self.sets.read().get(table).cloned()
	}

	/// Gets a single record of a table.
	pub fn record(&self, table: &str, name: &str) -> Option<FixtureRecord> {
		self.sets
			.read()
			.get(table)
			.and_then(|set| set.get(name).cloned())
	}

	/// Checks if a set is registered for the table.
	pub fn contains(&self, table: &str) -> bool {
		self.sets.read().contains_key(table)
	}

	/// Returns all registered table names in registration order.
	pub fn tables(&self) -> Vec<String> {
		self.sets.read().keys().cloned().collect()
	}

	/// Removes the sets of the given tables.
	pub fn remove<S: AsRef<str>>(&self, tables: &[S]) {
		let mut guard = self.sets.write();
		for table in tables {
			guard.shift_remove(table.as_ref());
		}
	}

	/// Removes all sets.
	pub fn clear(&self) {
		self.sets.write().clear();
	}

	/// Returns the number of registered sets.
	pub fn len(&self) -> usize {
		self.sets.read().len()
	}

	/// Returns true if no sets are registered.
	pub fn is_empty(&self) -> bool {
		self.sets.read().is_empty()
	}
}
