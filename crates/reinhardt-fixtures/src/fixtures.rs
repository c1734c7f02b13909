//! Fixture sources, sets and the transactional loader.
//!
//! ## Layout
//!
//! A fixture root holds one source per table:
//!
//! ```text
//! tests/fixtures/
//! ├── users.yml          # YAML document, record name -> fields
//! ├── roles.yml/         # YAML shards, every `**/*.yml` below is read
//! │   └── admins.yml
//! ├── orders.csv         # header row + one record per row
//! └── notes/             # one file per record, `key => value` lines
//!     └── welcome
//! ```
//!
//! [`FixtureSet::load`] turns the sources of a table into records,
//! [`FixtureLoader`] writes the sets to the store and [`FixtureRegistry`]
//! keeps them for later lookup by record name.

pub mod format;
pub mod loader;
pub mod parser;
pub mod record;
pub mod registry;
pub mod script;
pub mod set;
pub mod template;

pub use format::{FixtureFormat, FixtureSource};
pub use loader::{FixtureLoader, FixtureRequest, LoadedFixtures};
pub use parser::{FixtureParser, ParsedRecords};
pub use record::{FixtureFields, FixtureRecord, PRIMARY_KEY_FIELD};
pub use registry::FixtureRegistry;
pub use script::{ScriptRunner, SqlScriptRunner};
pub use set::FixtureSet;
pub use template::{PlainRenderer, TemplateError, TemplateRenderer, TeraRenderer};
