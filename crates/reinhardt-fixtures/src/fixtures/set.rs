//! All fixture records destined for one table.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::Value;

use super::{FixtureFields, FixtureFormat, FixtureParser, FixtureRecord, FixtureSource};
use crate::error::{FixtureError, FixtureResult};

/// Records of one table, gathered from one or more sources.
///
/// Records keep the order in which they were read, which is also the order
/// they are inserted in. A record name may appear only once per table.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureSet {
	table_name: String,
	class_name: String,
	sources: Vec<PathBuf>,
	records: IndexMap<String, FixtureRecord>,
}

impl FixtureSet {
	/// Creates an empty set.
	pub fn new(table_name: impl Into<String>, class_name: impl Into<String>) -> Self {
		Self {
			table_name: table_name.into(),
			class_name: class_name.into(),
			sources: Vec::new(),
			records: IndexMap::new(),
		}
	}

	/// Builds a set by parsing every path in order.
	///
	/// Each path is either a fixture file or an extensionless base name whose
	/// format is selected by [`FixtureSource::detect`].
	pub fn load(
		parser: &FixtureParser,
		table_name: impl Into<String>,
		class_name: impl Into<String>,
		paths: &[PathBuf],
	) -> FixtureResult<Self> {
		let mut set = Self::new(table_name, class_name);
		let mut csv_rows = 0;

		for path in paths {
			let source = FixtureSource::detect(path)?;
			let records = parser.parse_source(&source, &set.class_name, csv_rows)?;
			if source.format == FixtureFormat::Csv {
				csv_rows += records.len();
			}
			for (name, fields) in records {
				set.insert(name, fields, &source.path)?;
			}
			set.sources.push(source.path);
		}

		tracing::debug!(
			table = %set.table_name,
			records = set.records.len(),
			sources = set.sources.len(),
			"Built fixture set"
		);
		Ok(set)
	}

	/// Adds a record, rejecting a name the table already has.
	pub fn insert(
		&mut self,
		name: impl Into<String>,
		fields: FixtureFields,
		source: &Path,
	) -> FixtureResult<()> {
		let name = name.into();
		if self.records.contains_key(&name) {
			return Err(FixtureError::DuplicateFixture {
				table: self.table_name.clone(),
				name,
				source_path: source.to_path_buf(),
			});
		}
		let record = FixtureRecord::new(
			name.clone(),
			self.table_name.clone(),
			self.class_name.clone(),
			fields,
		);
		self.records.insert(name, record);
		Ok(())
	}

	/// Table the records are loaded into.
	pub fn table_name(&self) -> &str {
		&self.table_name
	}

	/// Class used for the records of this table.
	pub fn class_name(&self) -> &str {
		&self.class_name
	}

	/// Sources that contributed records, in load order.
	pub fn sources(&self) -> &[PathBuf] {
		&self.sources
	}

	/// Looks up a record by name.
	pub fn get(&self, name: &str) -> Option<&FixtureRecord> {
		self.records.get(name)
	}

	/// Returns true if a record with this name exists.
	pub fn contains(&self, name: &str) -> bool {
		self.records.contains_key(name)
	}

	/// Record names in load order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.records.keys().map(String::as_str)
	}

	/// Records in load order.
	pub fn iter(&self) -> impl Iterator<Item = &FixtureRecord> {
		self.records.values()
	}

	/// Returns the number of records.
	pub fn len(&self) -> usize {
		self.records.len()
	}

	/// Returns true if there are no records.
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// Whether every record carries an integer primary key.
	///
	/// Only such tables can have a serial sequence to move past the loaded
	/// keys. Join tables without an `id` and UUID keyed tables do not.
	pub fn has_integer_keys(&self) -> bool {
		!self.records.is_empty()
			&& self.records.values().all(|record| match record.pk() {
				Some(Value::Number(n)) => n.is_i64() || n.is_u64(),
				Some(Value::String(s)) => s.parse::<i64>().is_ok(),
				_ => false,
			})
	}
}

impl<'a> IntoIterator for &'a FixtureSet {
	type Item = &'a FixtureRecord;
	type IntoIter = indexmap::map::Values<'a, String, FixtureRecord>;

	fn into_iter(self) -> Self::IntoIter {
		self.records.values()
	}
}
