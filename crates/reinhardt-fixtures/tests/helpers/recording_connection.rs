//! In-memory connection helper.
//!
//! Keeps rows per table, supports nested transactions through snapshots and
//! records every call so tests can check statement order.

use std::collections::BTreeMap;

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use reinhardt_fixtures::{DatabaseBackend, FixtureConnection, FixtureRecord};

/// One call received by the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
	/// `begin(requires_new)`
	Begin(bool),
	/// `commit()`
	Commit,
	/// `rollback()`
	Rollback,
	/// `DELETE FROM <table>`
	Delete(String),
	/// Insert of a named record into a table
	Insert(String, String),
	/// Any other statement
	Execute(String),
	/// Sequence reset of a table
	ResetSequence(String),
}

type Tables = BTreeMap<String, Vec<FixtureRecord>>;

#[derive(Default)]
struct State {
	tables: Tables,
	snapshots: Vec<Tables>,
	events: Vec<Event>,
}

/// Connection storing rows in memory.
pub struct RecordingConnection {
	backend: DatabaseBackend,
	sequence_reset: bool,
	fail_insert_into: Option<String>,
	fail_deletes: bool,
	state: Mutex<State>,
}

impl RecordingConnection {
	/// Create a PostgreSQL-flavoured connection that supports sequence reset.
	pub fn new() -> Self {
		Self {
			backend: DatabaseBackend::Postgres,
			sequence_reset: true,
			fail_insert_into: None,
			fail_deletes: false,
			state: Mutex::new(State::default()),
		}
	}

	/// Use another dialect; sequence reset follows the dialect default.
	pub fn with_backend(mut self, backend: DatabaseBackend) -> Self {
		self.backend = backend;
		self.sequence_reset = backend == DatabaseBackend::Postgres;
		self
	}

	/// Reject every insert into the given table.
	pub fn failing_inserts_into(mut self, table: &str) -> Self {
		self.fail_insert_into = Some(table.to_string());
		self
	}

	/// Reject every delete.
	pub fn failing_deletes(mut self) -> Self {
		self.fail_deletes = true;
		self
	}

	/// Add rows that exist before any fixture is loaded.
	pub fn seed(&self, table: &str, names: &[&str]) {
		let mut state = self.state.lock();
		let rows = state.tables.entry(table.to_string()).or_default();
		for name in names {
			rows.push(FixtureRecord::new(*name, table, "Seed", Default::default()));
		}
	}

	/// Open a transaction the way a test wrapper would.
	pub fn open_outer_transaction(&self) {
		let mut state = self.state.lock();
		let snapshot = state.tables.clone();
		state.snapshots.push(snapshot);
	}

	/// Names of the rows currently in a table.
	pub fn row_names(&self, table: &str) -> Vec<String> {
		self.state
			.lock()
			.tables
			.get(table)
			.map(|rows| rows.iter().map(|row| row.name().to_string()).collect())
			.unwrap_or_default()
	}

	/// Rows currently in a table.
	pub fn rows(&self, table: &str) -> Vec<FixtureRecord> {
		self.state
			.lock()
			.tables
			.get(table)
			.cloned()
			.unwrap_or_default()
	}

	/// Every call received so far.
	pub fn events(&self) -> Vec<Event> {
		self.state.lock().events.clone()
	}

	/// Forget the recorded calls, keeping the rows.
	pub fn clear_events(&self) {
		self.state.lock().events.clear();
	}

	/// Tables of the deletes, in call order.
	pub fn deleted_tables(&self) -> Vec<String> {
		self.events()
			.into_iter()
			.filter_map(|event| match event {
				Event::Delete(table) => Some(table),
				_ => None,
			})
			.collect()
	}

	/// Tables of the inserts, in call order, without repeats.
	pub fn inserted_tables(&self) -> Vec<String> {
		let mut tables: Vec<String> = Vec::new();
		for event in self.events() {
			if let Event::Insert(table, _) = event
				&& tables.last() != Some(&table)
			{
				tables.push(table);
			}
		}
		tables
	}

	fn record(&self, event: Event) {
		self.state.lock().events.push(event);
	}
}

impl Default for RecordingConnection {
	fn default() -> Self {
		Self::new()
	}
}

/// Extracts the table of `DELETE FROM "table"` or ``DELETE FROM `table` ``.
fn deleted_table(sql: &str) -> Option<String> {
	let quoted = sql.strip_prefix("DELETE FROM ")?;
	Some(quoted.trim_matches(|c| c == '"' || c == '`').to_string())
}

#[async_trait]
impl FixtureConnection for RecordingConnection {
	fn backend(&self) -> DatabaseBackend {
		self.backend
	}

	fn open_transactions(&self) -> usize {
		self.state.lock().snapshots.len()
	}

	async fn begin(&self, requires_new: bool) -> anyhow::Result<()> {
		let mut state = self.state.lock();
		let snapshot = state.tables.clone();
		state.snapshots.push(snapshot);
		state.events.push(Event::Begin(requires_new));
		Ok(())
	}

	async fn commit(&self) -> anyhow::Result<()> {
		let mut state = self.state.lock();
		state
			.snapshots
			.pop()
			.ok_or_else(|| anyhow!("commit without an open transaction"))?;
		state.events.push(Event::Commit);
		Ok(())
	}

	async fn rollback(&self) -> anyhow::Result<()> {
		let mut state = self.state.lock();
		let snapshot = state
			.snapshots
			.pop()
			.ok_or_else(|| anyhow!("rollback without an open transaction"))?;
		state.tables = snapshot;
		state.events.push(Event::Rollback);
		Ok(())
	}

	async fn execute(&self, sql: &str) -> anyhow::Result<u64> {
		self.record(Event::Execute(sql.to_string()));
		Ok(0)
	}

	async fn delete(&self, sql: &str) -> anyhow::Result<u64> {
		if self.fail_deletes {
			return Err(anyhow!("delete rejected: {}", sql));
		}
		let table = deleted_table(sql).ok_or_else(|| anyhow!("unexpected statement: {}", sql))?;
		let mut state = self.state.lock();
		let removed = state
			.tables
			.remove(&table)
			.map(|rows| rows.len())
			.unwrap_or_default();
		state.events.push(Event::Delete(table));
		Ok(removed as u64)
	}

	async fn insert_fixture(&self, record: &FixtureRecord) -> anyhow::Result<()> {
		if self.fail_insert_into.as_deref() == Some(record.table_name()) {
			return Err(anyhow!(
				"insert of '{}' into {} rejected",
				record.name(),
				record.table_name()
			));
		}
		let mut state = self.state.lock();
		state
			.tables
			.entry(record.table_name().to_string())
			.or_default()
			.push(record.clone());
		state.events.push(Event::Insert(
			record.table_name().to_string(),
			record.name().to_string(),
		));
		Ok(())
	}

	fn supports_sequence_reset(&self) -> bool {
		self.sequence_reset
	}

	async fn reset_pk_sequence(&self, table: &str) -> anyhow::Result<()> {
		self.record(Event::ResetSequence(table.to_string()));
		Ok(())
	}
}
