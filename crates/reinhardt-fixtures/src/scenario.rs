//! Scenario lookup and file collection.
//!
//! A scenario is a directory somewhere below the fixture root. Loading it
//! loads the fixture files of every directory on the way down to it, so
//! shared fixtures in `checkout/` are read before the ones in
//! `checkout/empty_cart/`:
//!
//! ```text
//! tests/fixtures/
//! ├── users.yml                 # root level, optional
//! └── checkout/
//!     ├── products.yml
//!     └── empty_cart/
//!         ├── carts.yml
//!         └── totals.sql        # auxiliary script
//! ```

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use walkdir::WalkDir;

use crate::error::{FixtureError, FixtureResult};
use crate::settings::FixtureSettings;

/// Per-call scenario options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScenarioOptions {
	/// Include files at the fixture root; `None` uses
	/// [`FixtureSettings::load_root_fixtures`].
	pub root: Option<bool>,
}

impl ScenarioOptions {
	/// Options with an explicit root inclusion flag.
	pub fn with_root(root: bool) -> Self {
		Self { root: Some(root) }
	}
}

/// A resolved scenario: its directory chain and the files it contributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioPath {
	directory: PathBuf,
	levels: Vec<PathBuf>,
	table_files: Vec<PathBuf>,
	scripts: Vec<PathBuf>,
}

impl ScenarioPath {
	/// The matched scenario directory.
	pub fn directory(&self) -> &Path {
		&self.directory
	}

	/// Contributing directories, root first.
	pub fn levels(&self) -> &[PathBuf] {
		&self.levels
	}

	/// Table files in contribution order.
	pub fn table_files(&self) -> &[PathBuf] {
		&self.table_files
	}

	/// Auxiliary scripts in contribution order.
	pub fn scripts(&self) -> &[PathBuf] {
		&self.scripts
	}

	/// Distinct table names in first-seen order.
	pub fn table_names(&self) -> Vec<String> {
		self.files_by_table().into_keys().collect()
	}

	/// Files of each table; files of the same table from several levels
	/// accumulate in contribution order.
	pub fn files_by_table(&self) -> IndexMap<String, Vec<PathBuf>> {
		let mut tables: IndexMap<String, Vec<PathBuf>> = IndexMap::new();
		for file in &self.table_files {
			if let Some(table) = table_name_of(file) {
				tables.entry(table).or_default().push(file.clone());
			}
		}
		tables
	}
}

/// Finds scenario directories below a fixture root.
#[derive(Debug, Clone)]
pub struct ScenarioResolver {
	root: PathBuf,
	settings: FixtureSettings,
}

impl ScenarioResolver {
	/// Creates a resolver searching `root`.
	pub fn new(root: impl Into<PathBuf>, settings: FixtureSettings) -> Self {
		Self {
			root: root.into(),
			settings,
		}
	}

	/// Creates a resolver searching the configured fixture path.
	pub fn from_settings(settings: FixtureSettings) -> Self {
		Self::new(settings.fixture_path.clone(), settings)
	}

	/// Fixture root being searched.
	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Finds the single directory matching `name`.
	///
	/// `name` is matched against the trailing path components of every
	/// directory below the root, so `empty_cart` matches
	/// `checkout/empty_cart` and `checkout/empty_cart` can be used when
	/// another `empty_cart` directory exists elsewhere.
	pub fn find(&self, name: &str) -> FixtureResult<PathBuf> {
		let wanted = Path::new(name);
		let not_found = || FixtureError::ScenarioNotFound {
			name: name.to_string(),
			root: self.root.clone(),
		};
		if wanted.as_os_str().is_empty() || wanted.is_absolute() || !self.root.is_dir() {
			return Err(not_found());
		}

		let mut matches = Vec::new();
		for entry in WalkDir::new(&self.root)
			.min_depth(1)
			.sort_by_file_name()
		{
			let entry = entry.map_err(|e| FixtureError::Io(e.into()))?;
			if !entry.file_type().is_dir() {
				continue;
			}
			let relative = entry
				.path()
				.strip_prefix(&self.root)
				.unwrap_or(entry.path());
			if relative.ends_with(wanted) {
				matches.push(entry.into_path());
			}
		}

		match matches.len() {
			0 => Err(not_found()),
			1 => Ok(matches.remove(0)),
			_ => Err(FixtureError::AmbiguousScenario {
				name: name.to_string(),
				matches,
			}),
		}
	}

	/// Resolves a scenario into its directory chain and files.
	pub fn resolve(&self, name: &str, options: ScenarioOptions) -> FixtureResult<ScenarioPath> {
		let directory = self.find(name)?;
		let include_root = options.root.unwrap_or(self.settings.load_root_fixtures);

		let relative = directory
			.strip_prefix(&self.root)
			.unwrap_or(&directory)
			.to_path_buf();
		let mut levels = Vec::new();
		let mut level = self.root.clone();
		if include_root {
			levels.push(level.clone());
		}
		for segment in relative.iter() {
			level.push(segment);
			levels.push(level.clone());
		}

		let mut table_files = IndexSet::new();
		let mut scripts = IndexSet::new();
		for level in &levels {
			table_files.extend(files_in(level, "yml")?);
			table_files.extend(files_in(level, "yaml")?);
			scripts.extend(files_in(level, &self.settings.script_extension)?);
		}

		tracing::debug!(
			scenario = name,
			directory = %directory.display(),
			levels = levels.len(),
			tables = table_files.len(),
			scripts = scripts.len(),
			"Resolved fixture scenario"
		);

		Ok(ScenarioPath {
			directory,
			levels,
			table_files: table_files.into_iter().collect(),
			scripts: scripts.into_iter().collect(),
		})
	}
}

/// Regular files directly inside `dir` with the given extension, sorted.
fn files_in(dir: &Path, extension: &str) -> FixtureResult<Vec<PathBuf>> {
	let pattern = format!(
		"{}/*.{}",
		glob::Pattern::escape(&dir.to_string_lossy()),
		glob::Pattern::escape(extension)
	);
	let entries = glob::glob(&pattern).map_err(|e| {
		FixtureError::InvalidSettings(format!("script_extension '{}': {}", extension, e))
	})?;

	let mut files = Vec::new();
	for entry in entries {
		let path = entry.map_err(|e| FixtureError::Io(e.into()))?;
		if path.is_file() {
			files.push(path);
		}
	}
	files.sort();
	Ok(files)
}

/// Table name of a fixture file: its name without the last extension.
fn table_name_of(file: &Path) -> Option<String> {
	file.file_stem()
		.and_then(|stem| stem.to_str())
		.map(str::to_string)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use std::fs;
	use tempfile::TempDir;

	/// fixtures/
	/// ├── users.yml
	/// └── checkout/
	///     ├── products.yml
	///     ├── users.yml
	///     └── empty_cart/
	///         ├── carts.yml
	///         └── totals.sql
	#[fixture]
	fn tree() -> TempDir {
		let dir = TempDir::new().unwrap();
		let root = dir.path();
		fs::create_dir_all(root.join("checkout/empty_cart")).unwrap();
		fs::write(root.join("users.yml"), "alice:\n  id: 1\n").unwrap();
		fs::write(root.join("checkout/products.yml"), "apple:\n  id: 1\n").unwrap();
		fs::write(root.join("checkout/users.yml"), "bob:\n  id: 2\n").unwrap();
		fs::write(root.join("checkout/empty_cart/carts.yml"), "empty:\n  id: 1\n").unwrap();
		fs::write(root.join("checkout/empty_cart/totals.sql"), "SELECT 1;").unwrap();
		dir
	}

	fn resolver(root: &Path) -> ScenarioResolver {
		ScenarioResolver::new(root, FixtureSettings::new(root))
	}

	#[rstest]
	fn test_levels_with_root(tree: TempDir) {
		let root = tree.path();
		let scenario = resolver(root)
			.resolve("empty_cart", ScenarioOptions::with_root(true))
			.unwrap();

		assert_eq!(
			scenario.levels(),
			&[
				root.to_path_buf(),
				root.join("checkout"),
				root.join("checkout/empty_cart"),
			]
		);
		assert_eq!(scenario.directory(), root.join("checkout/empty_cart"));
	}

	#[rstest]
	fn test_levels_without_root(tree: TempDir) {
		let root = tree.path();
		let scenario = resolver(root)
			.resolve("empty_cart", ScenarioOptions::with_root(false))
			.unwrap();

		assert_eq!(
			scenario.levels(),
			&[root.join("checkout"), root.join("checkout/empty_cart")]
		);
		assert!(!scenario.table_files().contains(&root.join("users.yml")));
	}

	#[rstest]
	fn test_root_flag_defaults_to_settings(tree: TempDir) {
		let root = tree.path();
		let settings = FixtureSettings::new(root).with_load_root_fixtures(false);
		let scenario = ScenarioResolver::from_settings(settings)
			.resolve("empty_cart", ScenarioOptions::default())
			.unwrap();

		assert_eq!(scenario.levels().len(), 2);
	}

	#[rstest]
	fn test_files_by_table_accumulate(tree: TempDir) {
		let root = tree.path();
		let scenario = resolver(root)
			.resolve("empty_cart", ScenarioOptions::default())
			.unwrap();

		assert_eq!(scenario.table_names(), vec!["users", "products", "carts"]);
		let files = scenario.files_by_table();
		assert_eq!(
			files["users"],
			vec![root.join("users.yml"), root.join("checkout/users.yml")]
		);
		assert_eq!(scenario.scripts(), &[root.join("checkout/empty_cart/totals.sql")]);
	}

	#[rstest]
	fn test_yaml_extension_collected(tree: TempDir) {
		let root = tree.path();
		fs::write(root.join("checkout/orders.yaml"), "first:\n  id: 1\n").unwrap();

		let scenario = resolver(root)
			.resolve("checkout", ScenarioOptions::with_root(false))
			.unwrap();

		assert_eq!(
			scenario.table_files(),
			&[
				root.join("checkout/products.yml"),
				root.join("checkout/users.yml"),
				root.join("checkout/orders.yaml"),
			]
		);
	}

	#[rstest]
	fn test_custom_script_extension(tree: TempDir) {
		let root = tree.path();
		fs::write(root.join("checkout/seed.rb"), "").unwrap();
		let settings = FixtureSettings::new(root).with_script_extension("rb");

		let scenario = ScenarioResolver::from_settings(settings)
			.resolve("empty_cart", ScenarioOptions::default())
			.unwrap();

		assert_eq!(scenario.scripts(), &[root.join("checkout/seed.rb")]);
	}

	#[rstest]
	fn test_scenario_not_found(tree: TempDir) {
		let result = resolver(tree.path()).resolve("full_cart", ScenarioOptions::default());

		match result {
			Err(FixtureError::ScenarioNotFound { name, .. }) => assert_eq!(name, "full_cart"),
			other => panic!("Expected scenario not found, got {:?}", other),
		}
	}

	#[rstest]
	fn test_ambiguous_scenario_and_disambiguation(tree: TempDir) {
		let root = tree.path();
		fs::create_dir_all(root.join("wishlist/empty_cart")).unwrap();

		let result = resolver(root).find("empty_cart");
		match result {
			Err(FixtureError::AmbiguousScenario { matches, .. }) => {
				assert_eq!(
					matches,
					vec![
						root.join("checkout/empty_cart"),
						root.join("wishlist/empty_cart"),
					]
				);
			}
			other => panic!("Expected ambiguous scenario, got {:?}", other),
		}

		assert_eq!(
			resolver(root).find("wishlist/empty_cart").unwrap(),
			root.join("wishlist/empty_cart")
		);
	}

	#[rstest]
	fn test_partial_segment_does_not_match(tree: TempDir) {
		let result = resolver(tree.path()).find("cart");
		assert!(matches!(result, Err(FixtureError::ScenarioNotFound { .. })));
	}
}
