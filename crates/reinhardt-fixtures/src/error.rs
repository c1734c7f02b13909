//! Error types for fixture loading.
//!
//! Every failure surfaces to the caller (test setup) immediately. The only
//! place errors are swallowed is teardown, see [`crate::case::FixtureHooks`].

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving, parsing, or loading fixtures.
#[derive(Debug, Error)]
pub enum FixtureError {
	/// A fixture source is malformed or misnamed.
	#[error("{message}")]
	Format {
		/// Every file that contributed to the failing source.
		paths: Vec<PathBuf>,
		/// Human readable diagnostic including the underlying parser error.
		message: String,
	},

	/// The fixture source has an extension no parser understands.
	#[error("Unsupported fixture extension: {0}")]
	UnsupportedExtension(String),

	/// No scenario directory matches the requested name.
	#[error("No scenario directory named '{name}' found under {root}")]
	ScenarioNotFound {
		/// Requested scenario name.
		name: String,
		/// Fixture root that was searched.
		root: PathBuf,
	},

	/// More than one scenario directory matches the requested name.
	#[error("Scenario '{name}' is ambiguous, it matches {matches:?}; use a relative path to disambiguate")]
	AmbiguousScenario {
		/// Requested scenario name.
		name: String,
		/// All matching directories.
		matches: Vec<PathBuf>,
	},

	/// Two sources of the same table define a record with the same name.
	#[error("Duplicate fixture '{name}' for table '{table}' (defined again in {source_path})")]
	DuplicateFixture {
		/// Table the record belongs to.
		table: String,
		/// Record name.
		name: String,
		/// Source that defined the name a second time.
		source_path: PathBuf,
	},

	/// Fixture settings could not be read.
	#[error("Invalid fixture settings: {0}")]
	InvalidSettings(String),

	/// A named record is not part of the loaded data.
	#[error("No fixture with name '{fixture}' found for table '{table}'")]
	FixtureNotFound {
		/// Requested record name.
		fixture: String,
		/// Table that was searched.
		table: String,
	},

	/// Fixture file or directory does not exist.
	#[error("Fixture file not found: {0}")]
	FileNotFound(PathBuf),

	/// The store rejected an operation.
	#[error("Store error: {0}")]
	Store(#[from] anyhow::Error),

	/// I/O operation failed.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

impl FixtureError {
	/// Returns true for malformed or misnamed fixture sources.
	pub fn is_format_error(&self) -> bool {
		matches!(self, Self::Format { .. } | Self::UnsupportedExtension(_))
	}

	/// Returns true for errors caused by the fixture layout or settings.
	pub fn is_configuration_error(&self) -> bool {
		matches!(
			self,
			Self::ScenarioNotFound { .. }
				| Self::AmbiguousScenario { .. }
				| Self::DuplicateFixture { .. }
				| Self::InvalidSettings(_)
		)
	}
}

/// Result type alias for fixture operations.
pub type FixtureResult<T> = Result<T, FixtureError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_fixture_not_found_message() {
		let error = FixtureError::FixtureNotFound {
			fixture: "alice".to_string(),
			table: "users".to_string(),
		};
		assert_eq!(
			error.to_string(),
			"No fixture with name 'alice' found for table 'users'"
		);
	}

	#[rstest]
	fn test_error_classification() {
		let duplicate = FixtureError::DuplicateFixture {
			table: "users".to_string(),
			name: "one".to_string(),
			source_path: PathBuf::from("fixtures/users.yml"),
		};
		assert!(duplicate.is_configuration_error());
		assert!(!duplicate.is_format_error());

		let format = FixtureError::Format {
			paths: vec![PathBuf::from("fixtures/users.yml")],
			message: "bad".to_string(),
		};
		assert!(format.is_format_error());
		assert!(!format.is_configuration_error());
	}

	#[rstest]
	fn test_io_error_from() {
		let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
		let fixture_error: FixtureError = io_error.into();
		assert!(matches!(fixture_error, FixtureError::Io(_)));
	}

	#[rstest]
	fn test_store_error_keeps_source_message() {
		let error: FixtureError = anyhow::anyhow!("relation \"users\" does not exist").into();
		assert_eq!(
			error.to_string(),
			"Store error: relation \"users\" does not exist"
		);
	}
}
