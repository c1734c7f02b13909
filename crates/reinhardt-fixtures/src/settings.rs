//! Fixture loading settings.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;

use crate::error::{FixtureError, FixtureResult};

/// Files inside a directory-of-files fixture that are never treated as records:
/// dot-files (`.git`, `.svn`, editor swap files), `CVS` metadata and YAML documents.
pub const DEFAULT_FILE_FILTER: &str = r"^\.|^CVS$|\.ya?ml$";

/// Settings shared by the resolver, parser and loader.
///
/// # Example
///
/// ```
/// use reinhardt_fixtures::FixtureSettings;
///
/// let settings = FixtureSettings::new("tests/fixtures")
///     .with_table_name_prefix("app_")
///     .with_load_root_fixtures(false);
/// assert_eq!(settings.resolve_table_name("users"), "app_users");
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FixtureSettings {
	/// Root directory holding table files and scenario directories.
	pub fixture_path: PathBuf,

	/// Whether scenarios include the files at the fixture root.
	pub load_root_fixtures: bool,

	/// Prefix prepended to every table name.
	pub table_name_prefix: String,

	/// Suffix appended to every table name.
	pub table_name_suffix: String,

	/// Table names are plural, so class names are singularized.
	pub pluralize_table_names: bool,

	/// Regex of file names skipped in directory-of-files fixtures.
	pub file_filter: String,

	/// Extension of auxiliary scripts collected from scenario directories.
	pub script_extension: String,
}

impl Default for FixtureSettings {
	fn default() -> Self {
		Self {
			fixture_path: PathBuf::from("tests/fixtures"),
			load_root_fixtures: true,
			table_name_prefix: String::new(),
			table_name_suffix: String::new(),
			pluralize_table_names: true,
			file_filter: DEFAULT_FILE_FILTER.to_string(),
			script_extension: "sql".to_string(),
		}
	}
}

impl FixtureSettings {
	/// Creates settings rooted at the given fixture directory.
	pub fn new(fixture_path: impl Into<PathBuf>) -> Self {
		Self {
			fixture_path: fixture_path.into(),
			..Self::default()
		}
	}

	/// Reads settings from a TOML document; missing keys keep their defaults.
	///
	/// ```
	/// use reinhardt_fixtures::FixtureSettings;
	///
	/// let settings = FixtureSettings::from_toml_str(r#"
	/// fixture_path = "tests/data"
	/// load_root_fixtures = false
	/// "#).unwrap();
	/// assert!(!settings.load_root_fixtures);
	/// assert_eq!(settings.script_extension, "sql");
	/// ```
	pub fn from_toml_str(content: &str) -> FixtureResult<Self> {
		let settings: Self =
			toml::from_str(content).map_err(|e| FixtureError::InvalidSettings(e.to_string()))?;
		settings.file_filter_regex()?;
		Ok(settings)
	}

	/// Sets the fixture root directory.
	pub fn with_fixture_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.fixture_path = path.into();
		self
	}

	/// Sets whether scenarios include root-level fixtures by default.
	pub fn with_load_root_fixtures(mut self, load: bool) -> Self {
		self.load_root_fixtures = load;
		self
	}

	/// Sets the table name prefix.
	pub fn with_table_name_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.table_name_prefix = prefix.into();
		self
	}

	/// Sets the table name suffix.
	pub fn with_table_name_suffix(mut self, suffix: impl Into<String>) -> Self {
		self.table_name_suffix = suffix.into();
		self
	}

	/// Sets whether table names are plural.
	pub fn with_pluralize_table_names(mut self, pluralize: bool) -> Self {
		self.pluralize_table_names = pluralize;
		self
	}

	/// Sets the directory-of-files exclusion regex.
	pub fn with_file_filter(mut self, filter: impl Into<String>) -> Self {
		self.file_filter = filter.into();
		self
	}

	/// Sets the auxiliary script extension (without the dot).
	pub fn with_script_extension(mut self, extension: impl Into<String>) -> Self {
		self.script_extension = extension.into();
		self
	}

	/// Returns the fixture root directory.
	pub fn fixture_path(&self) -> &Path {
		&self.fixture_path
	}

	/// Applies the configured prefix and suffix to a table name.
	pub fn resolve_table_name(&self, table: &str) -> String {
		format!(
			"{}{}{}",
			self.table_name_prefix, table, self.table_name_suffix
		)
	}

	/// Compiles the directory-of-files exclusion filter.
	pub fn file_filter_regex(&self) -> FixtureResult<Regex> {
		Regex::new(&self.file_filter).map_err(|e| {
			FixtureError::InvalidSettings(format!("file_filter '{}': {}", self.file_filter, e))
		})
	}
}
