//! Scenario-based test fixture loading for the Reinhardt framework.
//!
//! This crate fills relational tables with declarative test data before each
//! test and removes it afterwards:
//!
//! - **Fixture sources**: YAML documents, CSV tables and directories of
//!   single-record files, with a Tera template pre-pass
//! - **Scenarios**: nested directories whose ancestors contribute shared
//!   fixtures before the scenario's own files
//! - **Transactional loading**: delete-then-insert of every table in one
//!   transaction, auxiliary SQL scripts and primary key sequence repair
//! - **Named access**: cached lookup of loaded records by table and name
//!
//! # Quick Start
//!
//! Create a fixture file (`tests/fixtures/users.yml`):
//!
//! ```yaml
//! alice:
//!   id: 1
//!   name: Alice
//! bob:
//!   id: 2
//!   name: Bob
//! ```
//!
//! Load it around a test:
//!
//! ```ignore
//! use std::sync::Arc;
//! use reinhardt_fixtures::prelude::*;
//!
//! let mut case = FixtureCase::new(FixtureSettings::new("tests/fixtures"))?;
//! case.fixtures(["users"]);
//!
//! case.before_each(&conn).await?;
//! let alice = case.accessor(UserFinder).get("users", "alice").await?;
//! case.after_each(&conn).await;
//! ```
//!
//! # Architecture
//!
//! - [`FixtureParser`](fixtures::FixtureParser) - Parse fixture sources
//! - [`FixtureSet`](fixtures::FixtureSet) - Records of one table
//! - [`ScenarioResolver`](scenario::ScenarioResolver) - Find scenario directories and their files
//! - [`FixtureLoader`](fixtures::FixtureLoader) - Load sets through a [`FixtureConnection`](connection::FixtureConnection)
//! - [`FixtureRegistry`](fixtures::FixtureRegistry) - Loaded sets, shared with accessors
//! - [`FixtureCase`](case::FixtureCase) - Per-test composition and lifecycle hooks

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod accessor;
pub mod case;
pub mod connection;
pub mod error;
pub mod fixtures;
pub mod naming;
pub mod prelude;
pub mod scenario;
pub mod settings;

// Re-export commonly used types at crate root
pub use accessor::{FixtureAccessor, RecordFinder};
pub use case::{FixtureCase, FixtureHooks};
pub use connection::{DatabaseBackend, FixtureConnection, FixtureTransaction};
pub use error::{FixtureError, FixtureResult};
pub use fixtures::{
	FixtureFormat, FixtureLoader, FixtureParser, FixtureRecord, FixtureRegistry, FixtureRequest,
	FixtureSet, LoadedFixtures,
};
pub use scenario::{ScenarioOptions, ScenarioPath, ScenarioResolver};
pub use settings::FixtureSettings;
