//! Table and class name inflection.

use convert_case::{Case, Casing};

const IRREGULAR_PLURALS: &[(&str, &str)] = &[
	("people", "person"),
	("men", "man"),
	("women", "woman"),
	("children", "child"),
	("mice", "mouse"),
	("data", "datum"),
];

/// Converts a class name to snake_case (`LineItem` -> `line_item`).
pub fn to_snake_case(name: &str) -> String {
	name.to_case(Case::Snake)
}

/// Converts a table name to PascalCase (`line_items` -> `LineItems`).
pub fn to_pascal_case(name: &str) -> String {
	name.to_case(Case::Pascal)
}

/// Singularizes the last word of a snake_case table name.
///
/// ```
/// use reinhardt_fixtures::naming::singularize;
///
/// assert_eq!(singularize("line_items"), "line_item");
/// assert_eq!(singularize("categories"), "category");
/// assert_eq!(singularize("addresses"), "address");
/// assert_eq!(singularize("people"), "person");
/// ```
pub fn singularize(word: &str) -> String {
	let (head, last) = match word.rfind('_') {
		Some(idx) => word.split_at(idx + 1),
		None => ("", word),
	};
	format!("{}{}", head, singularize_word(last))
}

fn singularize_word(word: &str) -> String {
	let lower = word.to_ascii_lowercase();
	if let Some((_, singular)) = IRREGULAR_PLURALS.iter().find(|(plural, _)| *plural == lower) {
		return (*singular).to_string();
	}

	if let Some(stem) = word.strip_suffix("ies")
		&& !stem.is_empty()
	{
		return format!("{}y", stem);
	}
	for suffix in ["sses", "xes", "ches", "shes", "zzes"] {
		if word.ends_with(suffix) {
			return word[..word.len() - 2].to_string();
		}
	}
	if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
		return word.to_string();
	}
	match word.strip_suffix('s') {
		Some(stem) if !stem.is_empty() => stem.to_string(),
		_ => word.to_string(),
	}
}

/// Derives the class name used for a table's records.
///
/// Only the last `.`-separated segment of the table name is considered, so
/// schema qualified names (`billing.invoices`) map to `Invoice`.
pub fn class_name_for_table(table: &str, pluralized: bool) -> String {
	let bare = table.rsplit('.').next().unwrap_or(table);
	if pluralized {
		to_pascal_case(&singularize(bare))
	} else {
		to_pascal_case(bare)
	}
}
