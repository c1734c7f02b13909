//! Transactional fixture loading.
//!
//! [`FixtureLoader::create_fixtures`] parses every requested table up front,
//! then clears and refills all of them inside one transaction:
//!
//! 1. `DELETE FROM` every table, last table first
//! 2. insert every record, first table first
//! 3. run auxiliary scripts in discovery order
//! 4. reset primary key sequences of integer keyed tables where the
//!    connection supports it
//!
//! A failure at any step rolls the whole load back.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::script::{ScriptRunner, SqlScriptRunner};
use super::template::TemplateRenderer;
use super::{FixtureParser, FixtureRegistry, FixtureSet};
use crate::connection::{FixtureConnection, FixtureTransaction, delete_sql};
use crate::error::FixtureResult;
use crate::naming::class_name_for_table;
use crate::settings::FixtureSettings;

/// Tables and files of one fixture load.
///
/// # Examples
///
/// ```
/// use reinhardt_fixtures::fixtures::FixtureRequest;
///
/// let request = FixtureRequest::new("tests/fixtures", ["users", "posts"])
///     .with_files("users", ["tests/fixtures/checkout/users.yml"])
///     .with_class_name("posts", "Article");
///
/// assert_eq!(request.table_names, vec!["users", "posts"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FixtureRequest {
	/// Directory holding the default `<table>` sources
	pub directory: PathBuf,
	/// Tables in load order; a name may carry a sub-directory (`admin/users`)
	pub table_names: Vec<String>,
	/// Explicit sources per table, replacing `<directory>/<table>`
	pub file_names: HashMap<String, Vec<PathBuf>>,
	/// Auxiliary scripts run after the inserts
	pub script_paths: Vec<PathBuf>,
	/// Explicit class names per table
	pub class_names: HashMap<String, String>,
}

impl FixtureRequest {
	/// Creates a request for tables read from `directory`.
	pub fn new<I, S>(directory: impl Into<PathBuf>, table_names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			directory: directory.into(),
			table_names: table_names.into_iter().map(Into::into).collect(),
			..Default::default()
		}
	}

	/// Adds sources for a table.
	pub fn with_files<I, P>(mut self, table: impl Into<String>, files: I) -> Self
	where
		I: IntoIterator<Item = P>,
		P: Into<PathBuf>,
	{
		self.file_names
			.entry(table.into())
			.or_default()
			.extend(files.into_iter().map(Into::into));
		self
	}

	/// Adds auxiliary scripts.
	pub fn with_scripts<I, P>(mut self, scripts: I) -> Self
	where
		I: IntoIterator<Item = P>,
		P: Into<PathBuf>,
	{
		self.script_paths
			.extend(scripts.into_iter().map(Into::into));
		self
	}

	/// Sets the class name of a table's records.
	pub fn with_class_name(mut self, table: impl Into<String>, class: impl Into<String>) -> Self {
		self.class_names.insert(table.into(), class.into());
		self
	}

	/// Sources of a table, defaulting to `<directory>/<table>`.
	pub fn files_for(&self, table: &str) -> Vec<PathBuf> {
		match self.file_names.get(table) {
			Some(files) if !files.is_empty() => files.clone(),
			_ => vec![self.directory.join(table)],
		}
	}
}

/// Sets produced by one load.
#[derive(Debug, Clone)]
pub enum LoadedFixtures {
	/// Exactly one table was requested
	Single(Arc<FixtureSet>),
	/// Zero or several tables, in request order
	Many(Vec<Arc<FixtureSet>>),
}

impl LoadedFixtures {
	fn from_sets(mut sets: Vec<Arc<FixtureSet>>) -> Self {
		if sets.len() == 1 {
			Self::Single(sets.remove(0))
		} else {
			Self::Many(sets)
		}
	}

	/// The set, when exactly one table was loaded.
	pub fn single(&self) -> Option<&Arc<FixtureSet>> {
		match self {
			Self::Single(set) => Some(set),
			Self::Many(_) => None,
		}
	}

	/// All sets in request order.
	pub fn into_vec(self) -> Vec<Arc<FixtureSet>> {
		match self {
			Self::Single(set) => vec![set],
			Self::Many(sets) => sets,
		}
	}

	/// Number of loaded sets.
	pub fn len(&self) -> usize {
		match self {
			Self::Single(_) => 1,
			Self::Many(sets) => sets.len(),
		}
	}

	/// Returns true if no table was loaded.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Loads and removes fixtures through a [`FixtureConnection`].
#[derive(Clone)]
pub struct FixtureLoader {
	settings: FixtureSettings,
	parser: FixtureParser,
	scripts: Arc<dyn ScriptRunner>,
}

impl std::fmt::Debug for FixtureLoader {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FixtureLoader")
			.field("settings", &self.settings)
			.field("parser", &self.parser)
			.finish_non_exhaustive()
	}
}

impl FixtureLoader {
	/// Creates a loader.
	///
	/// Fails with [`FixtureError::InvalidSettings`](crate::FixtureError::InvalidSettings)
	/// when the file filter is not a valid regular expression.
	pub fn new(settings: FixtureSettings) -> FixtureResult<Self> {
		let parser = FixtureParser::from_settings(&settings)?;
		Ok(Self {
			settings,
			parser,
			scripts: Arc::new(SqlScriptRunner),
		})
	}

	/// Replaces the template pre-pass applied to YAML and CSV sources.
	pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
		self.parser = self.parser.with_renderer(renderer);
		self
	}

	/// Replaces the auxiliary script executor.
	pub fn with_script_runner(mut self, runner: Arc<dyn ScriptRunner>) -> Self {
		self.scripts = runner;
		self
	}

	/// Settings the loader was built with.
	pub fn settings(&self) -> &FixtureSettings {
		&self.settings
	}

	/// Parses the sets of every requested table without touching the store.
	///
	/// Returns `(registry key, set)` pairs in request order. The key is the
	/// last path segment of the requested name, before prefix and suffix
	/// are applied.
	pub fn build_sets(&self, request: &FixtureRequest) -> FixtureResult<Vec<(String, FixtureSet)>> {
		request
			.table_names
			.iter()
			.map(|requested| -> FixtureResult<(String, FixtureSet)> {
				let key = table_key(requested).to_string();
				let class_name = request
					.class_names
					.get(requested)
					.or_else(|| request.class_names.get(&key))
					.cloned()
					.unwrap_or_else(|| {
						class_name_for_table(&key, self.settings.pluralize_table_names)
					});
				let set = FixtureSet::load(
					&self.parser,
					self.settings.resolve_table_name(&key),
					class_name,
					&request.files_for(requested),
				)?;
				Ok((key, set))
			})
			.collect()
	}

	/// Replaces the contents of the requested tables with their fixtures.
	///
	/// The loaded sets are merged into `registry` once the transaction has
	/// committed; entries of other tables stay in place.
	///
	/// # Examples
	///
	/// ```no_run
	/// # use reinhardt_fixtures::prelude::*;
	/// # async fn example(conn: &dyn FixtureConnection) -> FixtureResult<()> {
	/// let loader = FixtureLoader::new(FixtureSettings::default())?;
	/// let registry = FixtureRegistry::new();
	/// let request = FixtureRequest::new("tests/fixtures", ["users"]);
	///
	/// let loaded = loader.create_fixtures(conn, &registry, &request).await?;
	/// assert!(loaded.single().is_some());
	/// # Ok(())
	/// # }
	/// ```
	pub async fn create_fixtures(
		&self,
		conn: &dyn FixtureConnection,
		registry: &FixtureRegistry,
		request: &FixtureRequest,
	) -> FixtureResult<LoadedFixtures> {
		let (keys, sets): (Vec<String>, Vec<Arc<FixtureSet>>) = self
			.build_sets(request)?
			.into_iter()
			.map(|(key, set)| (key, Arc::new(set)))
			.unzip();

		let tx = FixtureTransaction::begin(conn).await?;
		if let Err(e) = self
			.load_sets(tx.connection(), &sets, &request.script_paths)
			.await
		{
			if let Err(rollback_err) = tx.rollback().await {
				tracing::warn!(error = %rollback_err, "Failed to roll back fixture load");
			}
			return Err(e);
		}
		tx.commit().await?;

		tracing::info!(
			tables = sets.len(),
			records = sets.iter().map(|set| set.len()).sum::<usize>(),
			scripts = request.script_paths.len(),
			"Loaded fixtures"
		);

		registry.merge(keys.into_iter().zip(sets.iter().cloned()));
		Ok(LoadedFixtures::from_sets(sets))
	}

	/// Deletes every row of the given tables, in the given order.
	///
	/// Names are resolved like in [`create_fixtures`](Self::create_fixtures).
	/// No transaction is opened.
	pub async fn destroy_fixtures<S: AsRef<str>>(
		&self,
		conn: &dyn FixtureConnection,
		table_names: &[S],
	) -> FixtureResult<()> {
		for requested in table_names {
			let table = self.settings.resolve_table_name(table_key(requested.as_ref()));
			conn.delete(&delete_sql(conn.backend(), &table)).await?;
			tracing::debug!(table = %table, "Destroyed fixtures");
		}
		Ok(())
	}

	async fn load_sets(
		&self,
		conn: &dyn FixtureConnection,
		sets: &[Arc<FixtureSet>],
		scripts: &[PathBuf],
	) -> FixtureResult<()> {
		for set in sets.iter().rev() {
			conn.delete(&delete_sql(conn.backend(), set.table_name()))
				.await?;
		}

		for set in sets {
			for record in set.iter() {
				conn.insert_fixture(record).await?;
			}
		}

		for script in scripts {
			self.scripts.run(conn, script).await?;
		}

		if conn.supports_sequence_reset() {
			for set in sets.iter().filter(|set| set.has_integer_keys()) {
				conn.reset_pk_sequence(set.table_name()).await?;
			}
		}
		Ok(())
	}
}

/// Last path segment of a requested table name.
pub(crate) fn table_key(requested: &str) -> &str {
	Path::new(requested)
		.file_name()
		.and_then(|name| name.to_str())
		.unwrap_or(requested)
}
