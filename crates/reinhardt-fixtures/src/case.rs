//! Per-test fixture composition.
//!
//! A [`FixtureCase`] collects the tables, scenarios and scripts a test asks
//! for and implements [`FixtureHooks`], the two callbacks a test runner
//! invokes around each test.
//!
//! ```no_run
//! use std::sync::Arc;
//! use reinhardt_fixtures::prelude::*;
//!
//! # async fn example(conn: &dyn FixtureConnection) -> FixtureResult<()> {
//! let mut case = FixtureCase::new(FixtureSettings::new("tests/fixtures"))?
//!     .with_registry(Arc::new(FixtureRegistry::new()));
//! case.fixtures(["users"])
//!     .scenario("empty_cart", ScenarioOptions::default())?;
//!
//! case.before_each(conn).await?;
//! // ... run the test ...
//! case.after_each(conn).await;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::accessor::{FixtureAccessor, RecordFinder};
use crate::connection::FixtureConnection;
use crate::error::FixtureResult;
use crate::fixtures::format::append_extension;
use crate::fixtures::loader::table_key;
use crate::fixtures::{FixtureLoader, FixtureRegistry, FixtureRequest, LoadedFixtures};
use crate::scenario::{ScenarioOptions, ScenarioResolver};
use crate::settings::FixtureSettings;

/// Lifecycle callbacks run around every test.
#[async_trait]
pub trait FixtureHooks: Send + Sync {
	/// Loads the fixtures of the test. Errors fail the test setup.
	async fn before_each(&self, conn: &dyn FixtureConnection) -> FixtureResult<()>;

	/// Removes the fixtures of the test. Never fails; errors are logged.
	async fn after_each(&self, conn: &dyn FixtureConnection);
}

/// Tables, files and scripts requested by one test.
#[derive(Debug, Clone)]
pub struct FixtureCase {
	loader: FixtureLoader,
	registry: Arc<FixtureRegistry>,
	file_names: IndexMap<String, Vec<PathBuf>>,
	script_paths: Vec<PathBuf>,
	class_names: HashMap<String, String>,
}

impl FixtureCase {
	/// Creates an empty case with its own registry.
	pub fn new(settings: FixtureSettings) -> FixtureResult<Self> {
		Ok(Self::with_loader(FixtureLoader::new(settings)?))
	}

	/// Creates an empty case around a configured loader.
	pub fn with_loader(loader: FixtureLoader) -> Self {
		Self {
			loader,
			registry: Arc::new(FixtureRegistry::new()),
			file_names: IndexMap::new(),
			script_paths: Vec::new(),
			class_names: HashMap::new(),
		}
	}

	/// Shares a registry owned by the surrounding test context.
	pub fn with_registry(mut self, registry: Arc<FixtureRegistry>) -> Self {
		self.registry = registry;
		self
	}

	/// Adds tables read from `<fixture_path>/<table>`.
	pub fn fixtures<I, S>(&mut self, tables: I) -> &mut Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		for table in tables {
			let table = table.into();
			let base = self.loader.settings().fixture_path().join(&table);
			self.add_file(table, base);
		}
		self
	}

	/// Adds every table file and script of a scenario.
	///
	/// Tables already requested keep their files; the scenario's files are
	/// appended after them.
	pub fn scenario(&mut self, name: &str, options: ScenarioOptions) -> FixtureResult<&mut Self> {
		let scenario = ScenarioResolver::from_settings(self.loader.settings().clone())
			.resolve(name, options)?;

		for (table, files) in scenario.files_by_table() {
			for file in files {
				self.add_file(table.clone(), file);
			}
		}
		for script in scenario.scripts() {
			if !self.script_paths.contains(script) {
				self.script_paths.push(script.clone());
			}
		}
		Ok(self)
	}

	/// Sets the class name used for a table's records.
	pub fn set_fixture_class(
		&mut self,
		table: impl Into<String>,
		class: impl Into<String>,
	) -> &mut Self {
		self.class_names.insert(table.into(), class.into());
		self
	}

	/// Requested tables in load order.
	pub fn table_names(&self) -> Vec<String> {
		self.file_names.keys().cloned().collect()
	}

	/// Sources requested for a table.
	pub fn files(&self, table: &str) -> &[PathBuf] {
		self.file_names.get(table).map(Vec::as_slice).unwrap_or_default()
	}

	/// Auxiliary scripts in discovery order.
	pub fn scripts(&self) -> &[PathBuf] {
		&self.script_paths
	}

	/// Registry the loaded sets are merged into.
	pub fn registry(&self) -> &Arc<FixtureRegistry> {
		&self.registry
	}

	/// Loader used by the hooks.
	pub fn loader(&self) -> &FixtureLoader {
		&self.loader
	}

	/// Builds the load request for the current tables.
	pub fn request(&self) -> FixtureRequest {
		FixtureRequest {
			directory: self.loader.settings().fixture_path().to_path_buf(),
			table_names: self.table_names(),
			file_names: self
				.file_names
				.iter()
				.map(|(table, files)| (table.clone(), files.clone()))
				.collect(),
			script_paths: self.script_paths.clone(),
			class_names: self.class_names.clone(),
		}
	}

	/// Loads the requested fixtures.
	pub async fn load(&self, conn: &dyn FixtureConnection) -> FixtureResult<LoadedFixtures> {
		self.loader
			.create_fixtures(conn, &self.registry, &self.request())
			.await
	}

	/// Creates an accessor reading from this case's registry.
	pub fn accessor<F: RecordFinder>(&self, finder: F) -> FixtureAccessor<F> {
		FixtureAccessor::new(Arc::clone(&self.registry), finder)
	}

	fn add_file(&mut self, table: String, file: PathBuf) {
		let files = self.file_names.entry(table).or_default();
		if !files.iter().any(|known| same_source(known, &file)) {
			files.push(file);
		}
	}
}

#[async_trait]
impl FixtureHooks for FixtureCase {
	async fn before_each(&self, conn: &dyn FixtureConnection) -> FixtureResult<()> {
		if self.file_names.is_empty() && self.script_paths.is_empty() {
			return Ok(());
		}
		self.load(conn).await?;
		Ok(())
	}

	async fn after_each(&self, conn: &dyn FixtureConnection) {
		let tables = self.table_names();
		if let Err(e) = self.loader.destroy_fixtures(conn, &tables).await {
			tracing::warn!(error = %e, tables = ?tables, "Failed to destroy fixtures");
		}

		let keys = tables
			.iter()
			.map(|table| table_key(table))
			.collect::<Vec<_>>();
		self.registry.remove(&keys);
	}
}

/// Whether two requested paths name the same source, treating a base path
/// and its `.yml`/`.csv` file as equal.
fn same_source(a: &Path, b: &Path) -> bool {
	a == b
		|| ["yml", "csv"]
			.iter()
			.any(|ext| append_extension(a, ext) == b || append_extension(b, ext) == a)
}
