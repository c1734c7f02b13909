//! Fixture format definitions and format selection.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{FixtureError, FixtureResult};

/// Supported fixture source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureFormat {
	/// Ordered YAML mapping of record name to fields.
	Yaml,

	/// CSV table with a header row.
	Csv,

	/// Directory holding one `key => value` file per record.
	Directory,
}

impl FixtureFormat {
	/// Determines the fixture format from a file extension.
	///
	/// ```
	/// # use reinhardt_fixtures::fixtures::FixtureFormat;
	/// assert_eq!(FixtureFormat::from_extension("yml"), Some(FixtureFormat::Yaml));
	/// assert_eq!(FixtureFormat::from_extension("YAML"), Some(FixtureFormat::Yaml));
	/// assert_eq!(FixtureFormat::from_extension("csv"), Some(FixtureFormat::Csv));
	/// assert_eq!(FixtureFormat::from_extension("json"), None);
	/// ```
	pub fn from_extension(ext: &str) -> Option<Self> {
		match ext.to_lowercase().as_str() {
			"yml" | "yaml" => Some(Self::Yaml),
			"csv" => Some(Self::Csv),
			_ => None,
		}
	}

	/// Determines the fixture format from a file path's extension.
	pub fn from_path(path: &Path) -> Option<Self> {
		path.extension()
			.and_then(|ext| ext.to_str())
			.and_then(Self::from_extension)
	}
}

impl std::fmt::Display for FixtureFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Yaml => write!(f, "YAML"),
			Self::Csv => write!(f, "CSV"),
			Self::Directory => write!(f, "directory"),
		}
	}
}

/// A fixture source with its selected format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureSource {
	/// Selected format.
	pub format: FixtureFormat,

	/// File (or directory) the records are read from.
	pub path: PathBuf,
}

impl FixtureSource {
	/// Creates a source with an explicitly chosen format.
	pub fn new(format: FixtureFormat, path: impl Into<PathBuf>) -> Self {
		Self {
			format,
			path: path.into(),
		}
	}

	/// Selects the format of a fixture path.
	///
	/// A recognised extension decides on its own. Otherwise the path is a
	/// base name (`fixtures/users`) and is probed in this order:
	/// `users.yml` (a file or a directory of shards), `users.csv`,
	/// `users.yaml` (rejected, must be renamed), then a `users/` directory
	/// of single-record files.
	pub fn detect(path: &Path) -> FixtureResult<Self> {
		if let Some(format) = FixtureFormat::from_path(path) {
			if path.is_file() || (format == FixtureFormat::Yaml && path.is_dir()) {
				return Ok(Self::new(format, path));
			}
			return Err(FixtureError::FileNotFound(path.to_path_buf()));
		}

		let yml = append_extension(path, "yml");
		if yml.exists() {
			return Ok(Self::new(FixtureFormat::Yaml, yml));
		}

		let csv = append_extension(path, "csv");
		if csv.is_file() {
			return Ok(Self::new(FixtureFormat::Csv, csv));
		}

		let legacy = append_extension(path, "yaml");
		if legacy.is_file() {
			return Err(FixtureError::Format {
				paths: vec![legacy.clone()],
				message: format!(
					".yml extension required for all fixture files, rename {} to {}",
					legacy.display(),
					yml.display()
				),
			});
		}

		if path.is_dir() {
			return Ok(Self::new(FixtureFormat::Directory, path));
		}

		match path.extension().and_then(|ext| ext.to_str()) {
			Some(ext) if path.is_file() => Err(FixtureError::UnsupportedExtension(ext.to_string())),
			_ => Err(FixtureError::FileNotFound(path.to_path_buf())),
		}
	}
}

/// Appends `.ext` to a path without replacing an existing extension.
pub(crate) fn append_extension(path: &Path, ext: &str) -> PathBuf {
	let mut raw: OsString = path.as_os_str().to_owned();
	raw.push(".");
	raw.push(ext);
	PathBuf::from(raw)
}
