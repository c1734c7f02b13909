//! A single named fixture record.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered field mapping of a record (field name -> value).
pub type FixtureFields = IndexMap<String, Value>;

/// Name of the field treated as the primary key.
pub const PRIMARY_KEY_FIELD: &str = "id";

/// One named row destined for a table.
///
/// # Example
///
/// ```
/// # use reinhardt_fixtures::fixtures::{FixtureFields, FixtureRecord};
/// # use serde_json::json;
/// let mut fields = FixtureFields::new();
/// fields.insert("id".to_string(), json!(1));
/// fields.insert("name".to_string(), json!("Alice"));
///
/// let record = FixtureRecord::new("alice", "users", "User", fields);
/// assert_eq!(record.pk(), Some(&json!(1)));
/// assert_eq!(record.get("name"), Some(&json!("Alice")));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixtureRecord {
	name: String,
	table_name: String,
	class_name: String,
	fields: FixtureFields,
}

impl FixtureRecord {
	/// Creates a new fixture record.
	pub fn new(
		name: impl Into<String>,
		table_name: impl Into<String>,
		class_name: impl Into<String>,
		fields: FixtureFields,
	) -> Self {
		Self {
			name: name.into(),
			table_name: table_name.into(),
			class_name: class_name.into(),
			fields,
		}
	}

	/// Record name, unique within its table.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Table the record is inserted into.
	pub fn table_name(&self) -> &str {
		&self.table_name
	}

	/// Class used to build domain objects for the record.
	pub fn class_name(&self) -> &str {
		&self.class_name
	}

	/// All fields in declaration order.
	pub fn fields(&self) -> &FixtureFields {
		&self.fields
	}

	/// Returns the value of a single field.
	pub fn get(&self, field: &str) -> Option<&Value> {
		self.fields.get(field)
	}

	/// Returns the primary key value, if the record sets one.
	pub fn pk(&self) -> Option<&Value> {
		self.fields.get(PRIMARY_KEY_FIELD)
	}
}
