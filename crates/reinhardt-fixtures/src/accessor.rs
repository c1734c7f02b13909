//! Named access to loaded fixtures.
//!
//! A [`FixtureAccessor`] turns `("users", "alice")` into the domain object
//! stored for that fixture. Finding the object is delegated to a
//! [`RecordFinder`]; results are cached per accessor, so a fresh accessor
//! per test starts with an empty cache.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{FixtureError, FixtureResult};
use crate::fixtures::{FixtureRecord, FixtureRegistry};

/// Loads the persisted object behind a fixture record.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use reinhardt_fixtures::{FixtureRecord, FixtureResult, RecordFinder};
///
/// struct ById;
///
/// #[async_trait]
/// impl RecordFinder for ById {
///     type Object = i64;
///
///     async fn find(&self, record: &FixtureRecord) -> FixtureResult<i64> {
///         Ok(record.pk().and_then(|pk| pk.as_i64()).unwrap_or_default())
///     }
/// }
/// ```
#[async_trait]
pub trait RecordFinder: Send + Sync {
	/// Object type produced for a record.
	type Object: Clone + Send + Sync;

	/// Fetches the object, usually by the record's primary key.
	async fn find(&self, record: &FixtureRecord) -> FixtureResult<Self::Object>;
}

/// Cached lookup of fixture objects by table and record name.
pub struct FixtureAccessor<F: RecordFinder> {
	registry: Arc<FixtureRegistry>,
	finder: F,
	cache: Mutex<HashMap<String, HashMap<String, F::Object>>>,
}

impl<F: RecordFinder> FixtureAccessor<F> {
	/// Creates an accessor over the registry.
	pub fn new(registry: Arc<FixtureRegistry>, finder: F) -> Self {
		Self {
			registry,
			finder,
			cache: Mutex::new(HashMap::new()),
		}
	}

	/// Returns the record of a loaded fixture.
	pub fn record(&self, table: &str, name: &str) -> FixtureResult<FixtureRecord> {
		self.registry
			.record(table, name)
			.ok_or_else(|| FixtureError::FixtureNotFound {
				fixture: name.to_string(),
				table: table.to_string(),
			})
	}

	/// Returns the object of a fixture, using the cache when possible.
	pub async fn get(&self, table: &str, name: &str) -> FixtureResult<F::Object> {
		self.get_with(table, name, false).await
	}

	/// Returns the object of a fixture.
	///
	/// With `force_reload` the cached object is dropped and fetched again.
	pub async fn get_with(
		&self,
		table: &str,
		name: &str,
		force_reload: bool,
	) -> FixtureResult<F::Object> {
		if force_reload && let Some(objects) = self.cache.lock().get_mut(table) {
			objects.remove(name);
		}

		let record = self.record(table, name)?;
		if let Some(object) = self.cached(table, name) {
			return Ok(object);
		}

		let object = self.finder.find(&record).await?;
		self.cache
			.lock()
			.entry(table.to_string())
			.or_default()
			.insert(name.to_string(), object.clone());
		Ok(object)
	}

	/// Returns the cached object, if any.
	pub fn cached(&self, table: &str, name: &str) -> Option<F::Object> {
		self.cache
			.lock()
			.get(table)
			.and_then(|objects| objects.get(name).cloned())
	}

	/// Drops every cached object.
	pub fn clear_cache(&self) {
		self.cache.lock().clear();
	}

	/// Registry the accessor reads from.
	pub fn registry(&self) -> &Arc<FixtureRegistry> {
		&self.registry
	}
}
