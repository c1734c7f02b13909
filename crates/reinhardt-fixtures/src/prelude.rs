//! Convenience re-exports for common usage.
//!
//! ```ignore
//! use reinhardt_fixtures::prelude::*;
//! ```

// Error types
pub use crate::error::{FixtureError, FixtureResult};

// Configuration
pub use crate::settings::FixtureSettings;

// Store boundary
pub use crate::connection::{DatabaseBackend, FixtureConnection, FixtureTransaction};

// Fixture types
pub use crate::fixtures::{
	FixtureFields, FixtureFormat, FixtureLoader, FixtureParser, FixtureRecord, FixtureRegistry,
	FixtureRequest, FixtureSet, LoadedFixtures, ScriptRunner, SqlScriptRunner, TemplateError,
	TemplateRenderer, TeraRenderer,
};

// Scenarios
pub use crate::scenario::{ScenarioOptions, ScenarioPath, ScenarioResolver};

// Test lifecycle
pub use crate::accessor::{FixtureAccessor, RecordFinder};
pub use crate::case::{FixtureCase, FixtureHooks};
