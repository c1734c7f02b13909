//! Fixture parsing functionality.
//!
//! This module turns fixture sources (YAML documents, CSV tables and
//! directories of single-record files) into ordered record name -> fields
//! pairs. Record names are checked for uniqueness by [`super::FixtureSet`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use super::format::append_extension;
use super::template::{TemplateRenderer, TeraRenderer};
use super::{FixtureFields, FixtureFormat, FixtureSource};
use crate::error::{FixtureError, FixtureResult};
use crate::naming::to_snake_case;
use crate::settings::{DEFAULT_FILE_FILTER, FixtureSettings};

/// Parsed records of one source, in declaration order.
pub type ParsedRecords = Vec<(String, FixtureFields)>;

/// Parser for fixture sources.
#[derive(Clone)]
pub struct FixtureParser {
	renderer: Arc<dyn TemplateRenderer>,
	file_filter: Regex,
}

impl std::fmt::Debug for FixtureParser {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FixtureParser")
			.field("file_filter", &self.file_filter.as_str())
			.finish_non_exhaustive()
	}
}

impl Default for FixtureParser {
	fn default() -> Self {
		Self::new()
	}
}

impl FixtureParser {
	/// Creates a parser with the Tera pre-pass and the default file filter.
	pub fn new() -> Self {
		Self {
			renderer: Arc::new(TeraRenderer::new()),
			file_filter: Regex::new(DEFAULT_FILE_FILTER).expect("default file filter is valid"),
		}
	}

	/// Creates a parser using the file filter from the settings.
	pub fn from_settings(settings: &FixtureSettings) -> FixtureResult<Self> {
		Ok(Self::new().with_file_filter(settings.file_filter_regex()?))
	}

	/// Replaces the template pre-pass.
	pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
		self.renderer = renderer;
		self
	}

	/// Replaces the directory-of-files exclusion filter.
	pub fn with_file_filter(mut self, filter: Regex) -> Self {
		self.file_filter = filter;
		self
	}

	/// Parses one source.
	///
	/// # Arguments
	///
	/// * `source` - Source with its selected format
	/// * `class_name` - Class of the records, used to name CSV rows
	/// * `csv_offset` - Rows already read from earlier CSV sources of the same table
	pub fn parse_source(
		&self,
		source: &FixtureSource,
		class_name: &str,
		csv_offset: usize,
	) -> FixtureResult<ParsedRecords> {
		tracing::debug!(
			path = %source.path.display(),
			kind = %source.format,
			"Parsing fixture source"
		);
		match source.format {
			FixtureFormat::Yaml => self.parse_yaml_file(&source.path),
			FixtureFormat::Csv => {
				let content = read_source(&source.path)?;
				let rendered = self
					.renderer
					.render(&content)
					.map_err(|e| csv_error(&source.path, &e.to_string()))?;
				self.parse_csv_str(&rendered, &source.path, class_name, csv_offset)
			}
			FixtureFormat::Directory => self.parse_directory(&source.path),
		}
	}

	/// Parses a YAML source together with its shards.
	///
	/// A YAML source is either a `users.yml` file or a `users.yml/`
	/// directory whose `**/*.yml` documents are the shards. Shards are read
	/// in path order, before the file when both are given.
	pub fn parse_yaml_file(&self, path: &Path) -> FixtureResult<ParsedRecords> {
		let mut documents = shard_paths(path)?;
		if !path.is_dir() {
			documents.push(path.to_path_buf());
		}

		let mut records = ParsedRecords::new();
		for document in &documents {
			let content = read_source(document)?;
			let rendered = self
				.renderer
				.render(&content)
				.map_err(|e| yaml_error(&documents, &e.to_string()))?;
			records.extend(self.parse_yaml_str(&rendered, &documents)?);
		}
		Ok(records)
	}

	/// Parses YAML content into records.
	///
	/// The document must be a mapping of record name to a mapping of fields.
	/// A tagged root (`--- !omap`) is unwrapped and an ordered-map sequence
	/// of single-entry mappings is accepted as well. An empty document has
	/// no records.
	///
	/// # Arguments
	///
	/// * `content` - Rendered YAML text
	/// * `paths` - Files that contributed to the content, used in error messages
	pub fn parse_yaml_str(&self, content: &str, paths: &[PathBuf]) -> FixtureResult<ParsedRecords> {
		if let Some(line) = first_tab_indented_line(content) {
			return Err(yaml_error(
				paths,
				&format!("line {} is indented with a tab character", line),
			));
		}

		let value: serde_yaml::Value =
			serde_yaml::from_str(content).map_err(|e| yaml_error(paths, &e.to_string()))?;
		let value = match value {
			serde_yaml::Value::Tagged(tagged) => tagged.value,
			other => other,
		};

		let entries: Vec<(serde_yaml::Value, serde_yaml::Value)> = match value {
			serde_yaml::Value::Null => return Ok(ParsedRecords::new()),
			serde_yaml::Value::Mapping(mapping) => mapping.into_iter().collect(),
			serde_yaml::Value::Sequence(items) => omap_entries(items, paths)?,
			_ => {
				return Err(yaml_error(
					paths,
					"expected a mapping of fixture names to fields",
				));
			}
		};

		let mut records = Vec::with_capacity(entries.len());
		for (key, data) in entries {
			let name = record_name(&key).ok_or_else(|| {
				yaml_error(paths, &format!("fixture name {:?} is not a scalar", key))
			})?;
			let fields = yaml_fields(&name, data, paths)?;
			records.push((name, fields));
		}
		Ok(records)
	}

	/// Parses CSV content into records.
	///
	/// The header row names the fields; each following row becomes a record
	/// named `<snake_case(class_name)>_<n>` with `n` counting from
	/// `offset + 1`. Every value is a trimmed string.
	pub fn parse_csv_str(
		&self,
		content: &str,
		path: &Path,
		class_name: &str,
		offset: usize,
	) -> FixtureResult<ParsedRecords> {
		let mut reader = csv::ReaderBuilder::new()
			.has_headers(true)
			.flexible(false)
			.trim(csv::Trim::All)
			.from_reader(content.as_bytes());

		let headers = reader
			.headers()
			.map_err(|e| csv_error(path, &format!("failed to read header: {}", e)))?
			.iter()
			.map(|h| h.trim().to_string())
			.collect::<Vec<_>>();

		let prefix = to_snake_case(class_name);
		let mut records = ParsedRecords::new();
		for (idx, row) in reader.records().enumerate() {
			let row = row.map_err(|e| csv_error(path, &format!("row {}: {}", idx + 2, e)))?;
			let fields = headers
				.iter()
				.zip(row.iter())
				.map(|(header, cell)| (header.clone(), Value::String(cell.trim().to_string())))
				.collect::<FixtureFields>();
			records.push((format!("{}_{}", prefix, offset + idx + 1), fields));
		}
		Ok(records)
	}

	/// Parses a directory holding one file per record.
	///
	/// Files are read in name order; names matching the file filter are
	/// skipped. Each file contains `key => value` lines.
	pub fn parse_directory(&self, dir: &Path) -> FixtureResult<ParsedRecords> {
		let mut files = fs::read_dir(dir)?
			.filter_map(|entry| entry.ok())
			.map(|entry| entry.path())
			.filter(|path| path.is_file())
			.collect::<Vec<_>>();
		files.sort();

		let mut records = ParsedRecords::new();
		for file in files {
			let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
				continue;
			};
			if self.file_filter.is_match(name) {
				continue;
			}
			let content = read_source(&file)?;
			records.push((name.to_string(), key_value_fields(&content, &file)?));
		}
		Ok(records)
	}
}

fn read_source(path: &Path) -> FixtureResult<String> {
	fs::read_to_string(path).map_err(|e| {
		if e.kind() == std::io::ErrorKind::NotFound {
			FixtureError::FileNotFound(path.to_path_buf())
		} else {
			FixtureError::Io(e)
		}
	})
}

fn shard_paths(path: &Path) -> FixtureResult<Vec<PathBuf>> {
	let shard_dir = if FixtureFormat::from_path(path) == Some(FixtureFormat::Yaml) {
		path.to_path_buf()
	} else {
		append_extension(path, "yml")
	};
	if !shard_dir.is_dir() {
		return Ok(Vec::new());
	}

	let pattern = format!(
		"{}/**/*.yml",
		glob::Pattern::escape(&shard_dir.to_string_lossy())
	);
	let entries = glob::glob(&pattern).map_err(|e| FixtureError::Format {
		paths: vec![shard_dir.clone()],
		message: format!("invalid shard pattern {}: {}", pattern, e),
	})?;

	let mut shards = Vec::new();
	for entry in entries {
		let shard = entry.map_err(|e| FixtureError::Io(e.into()))?;
		if shard.is_file() {
			shards.push(shard);
		}
	}
	shards.sort();
	Ok(shards)
}

/// First line indented with a tab. Tabs after space indentation may be block
/// scalar content and are left to serde_yaml.
fn first_tab_indented_line(content: &str) -> Option<usize> {
	content
		.lines()
		.enumerate()
		.find(|(_, line)| line.starts_with('\t') && !line.trim().is_empty())
		.map(|(idx, _)| idx + 1)
}

fn omap_entries(
	items: Vec<serde_yaml::Value>,
	paths: &[PathBuf],
) -> FixtureResult<Vec<(serde_yaml::Value, serde_yaml::Value)>> {
	let mut entries = Vec::with_capacity(items.len());
	for item in items {
		match item {
			serde_yaml::Value::Mapping(mapping) if mapping.len() == 1 => {
				entries.extend(mapping);
			}
			_ => {
				return Err(yaml_error(
					paths,
					"ordered map entries must be single-key mappings",
				));
			}
		}
	}
	Ok(entries)
}

fn record_name(key: &serde_yaml::Value) -> Option<String> {
	match key {
		serde_yaml::Value::String(s) => Some(s.clone()),
		serde_yaml::Value::Number(n) => Some(n.to_string()),
		serde_yaml::Value::Bool(b) => Some(b.to_string()),
		_ => None,
	}
}

fn yaml_fields(
	name: &str,
	data: serde_yaml::Value,
	paths: &[PathBuf],
) -> FixtureResult<FixtureFields> {
	let mapping = match data {
		serde_yaml::Value::Null => return Ok(FixtureFields::new()),
		serde_yaml::Value::Mapping(mapping) => mapping,
		_ => {
			return Err(yaml_error(
				paths,
				&format!("fixture '{}' must be a mapping of fields", name),
			));
		}
	};

	let mut fields = FixtureFields::with_capacity(mapping.len());
	for (key, value) in mapping {
		let field = record_name(&key).ok_or_else(|| {
			yaml_error(
				paths,
				&format!("fixture '{}' has a non-scalar field name {:?}", name, key),
			)
		})?;
		let value = serde_json::to_value(&value).map_err(|e| {
			yaml_error(
				paths,
				&format!("fixture '{}' field '{}': {}", name, field, e),
			)
		})?;
		fields.insert(field, value);
	}
	Ok(fields)
}

fn key_value_fields(content: &str, path: &Path) -> FixtureResult<FixtureFields> {
	let mut fields = FixtureFields::new();
	for (idx, line) in content.lines().enumerate() {
		if line.trim().is_empty() {
			continue;
		}
		let (key, value) = line.split_once("=>").ok_or_else(|| FixtureError::Format {
			paths: vec![path.to_path_buf()],
			message: format!(
				"line {} of {} is not a 'key => value' pair",
				idx + 1,
				path.display()
			),
		})?;
		fields.insert(key.trim().to_string(), Value::String(value.trim().to_string()));
	}
	Ok(fields)
}

fn yaml_error(paths: &[PathBuf], detail: &str) -> FixtureError {
	FixtureError::Format {
		paths: paths.to_vec(),
		message: format!(
			"a YAML error occurred parsing one of {:?}. Please note that YAML must be \
			 consistently indented using spaces. Tabs are not allowed.\nThe exact error was:\n  {}",
			paths, detail
		),
	}
}

fn csv_error(path: &Path, detail: &str) -> FixtureError {
	FixtureError::Format {
		paths: vec![path.to_path_buf()],
		message: format!("a CSV error occurred parsing {}: {}", path.display(), detail),
	}
}
