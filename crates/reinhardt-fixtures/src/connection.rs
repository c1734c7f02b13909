//! Store connection interface used by the fixture loader.
//!
//! The loader never talks to a driver directly. Anything that can run SQL
//! inside a transaction implements [`FixtureConnection`]; statements are
//! built with sea-query for the connection's [`DatabaseBackend`].

use async_trait::async_trait;
use sea_query::{
	Alias, Expr, IntoTableRef, MysqlQueryBuilder, PostgresQueryBuilder, Query, SqliteQueryBuilder,
	TableRef,
};

use crate::error::FixtureResult;
use crate::fixtures::{FixtureRecord, PRIMARY_KEY_FIELD};

/// SQL dialect of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseBackend {
	/// PostgreSQL
	#[default]
	Postgres,
	/// MySQL / MariaDB
	MySql,
	/// SQLite
	Sqlite,
}

/// Relational connection the fixtures are loaded through.
///
/// Only the transaction primitives and `execute` are required. Nested
/// transaction handling is the connection's business: `begin(false)` joins
/// the transaction that is already open (for example one wrapping the whole
/// test) instead of starting a new one.
#[async_trait]
pub trait FixtureConnection: Send + Sync {
	/// Dialect used to build statements.
	fn backend(&self) -> DatabaseBackend {
		DatabaseBackend::Postgres
	}

	/// Number of transactions currently open on this connection.
	fn open_transactions(&self) -> usize;

	/// Starts a transaction, or joins the open one when `requires_new` is false.
	async fn begin(&self, requires_new: bool) -> anyhow::Result<()>;

	/// Commits the innermost transaction started by [`begin`](Self::begin).
	async fn commit(&self) -> anyhow::Result<()>;

	/// Rolls back the innermost transaction started by [`begin`](Self::begin).
	async fn rollback(&self) -> anyhow::Result<()>;

	/// Executes a statement, returning the affected row count.
	async fn execute(&self, sql: &str) -> anyhow::Result<u64>;

	/// Executes a `DELETE` statement.
	async fn delete(&self, sql: &str) -> anyhow::Result<u64> {
		self.execute(sql).await
	}

	/// Inserts one fixture record into its table.
	async fn insert_fixture(&self, record: &FixtureRecord) -> anyhow::Result<()> {
		let sql = insert_sql(self.backend(), record)?;
		self.execute(&sql).await?;
		Ok(())
	}

	/// Whether [`reset_pk_sequence`](Self::reset_pk_sequence) does anything.
	fn supports_sequence_reset(&self) -> bool {
		self.backend() == DatabaseBackend::Postgres
	}

	/// Moves the table's primary key sequence past the highest loaded key.
	async fn reset_pk_sequence(&self, table: &str) -> anyhow::Result<()> {
		if self.backend() == DatabaseBackend::Postgres {
			self.execute(&reset_sequence_sql(table)).await?;
		}
		Ok(())
	}
}

/// A transaction opened for one fixture load.
///
/// A new transaction is started only when the connection has none open;
/// otherwise the load joins the caller's transaction.
pub struct FixtureTransaction<'a> {
	conn: &'a dyn FixtureConnection,
	requires_new: bool,
}

impl<'a> FixtureTransaction<'a> {
	/// Begins (or joins) a transaction on the connection.
	pub async fn begin(conn: &'a dyn FixtureConnection) -> FixtureResult<Self> {
		let requires_new = conn.open_transactions() == 0;
		conn.begin(requires_new).await?;
		tracing::debug!(requires_new, "Began fixture transaction");
		Ok(Self { conn, requires_new })
	}

	/// Whether this scope started its own transaction.
	pub fn requires_new(&self) -> bool {
		self.requires_new
	}

	/// Connection the transaction runs on.
	pub fn connection(&self) -> &'a dyn FixtureConnection {
		self.conn
	}

	/// Commits the transaction.
	pub async fn commit(self) -> FixtureResult<()> {
		self.conn.commit().await?;
		Ok(())
	}

	/// Rolls the transaction back.
	pub async fn rollback(self) -> FixtureResult<()> {
		self.conn.rollback().await?;
		Ok(())
	}
}

/// Builds `DELETE FROM <table>`.
///
/// ```
/// use reinhardt_fixtures::connection::{DatabaseBackend, delete_sql};
///
/// assert_eq!(delete_sql(DatabaseBackend::Postgres, "users"), r#"DELETE FROM "users""#);
/// assert_eq!(delete_sql(DatabaseBackend::MySql, "users"), "DELETE FROM `users`");
/// assert_eq!(
///     delete_sql(DatabaseBackend::Postgres, "billing.invoices"),
///     r#"DELETE FROM "billing"."invoices""#
/// );
/// ```
pub fn delete_sql(backend: DatabaseBackend, table: &str) -> String {
	let stmt = Query::delete().from_table(table_ref(table)).to_owned();
	match backend {
		DatabaseBackend::Postgres => stmt.to_string(PostgresQueryBuilder),
		DatabaseBackend::MySql => stmt.to_string(MysqlQueryBuilder),
		DatabaseBackend::Sqlite => stmt.to_string(SqliteQueryBuilder),
	}
}

/// Builds the `INSERT` statement for one record.
pub fn insert_sql(backend: DatabaseBackend, record: &FixtureRecord) -> anyhow::Result<String> {
	let mut stmt = Query::insert();
	stmt.into_table(table_ref(record.table_name()));

	if record.fields().is_empty() {
		stmt.or_default_values();
	} else {
		stmt.columns(record.fields().keys().map(|field| Alias::new(field.as_str())));
		let values = record
			.fields()
			.values()
			.map(|value| Expr::val(sea_value(value)))
			.collect::<Vec<Expr>>();
		stmt.values(values)
			.map_err(|e| anyhow::anyhow!("fixture '{}': {}", record.name(), e))?;
	}

	Ok(match backend {
		DatabaseBackend::Postgres => stmt.to_string(PostgresQueryBuilder),
		DatabaseBackend::MySql => stmt.to_string(MysqlQueryBuilder),
		DatabaseBackend::Sqlite => stmt.to_string(SqliteQueryBuilder),
	})
}

/// Builds the PostgreSQL statement moving a table's serial sequence past `MAX(id)`.
///
/// Only meaningful for tables with an integer `id` column.
pub fn reset_sequence_sql(table: &str) -> String {
	let quoted = match table.rsplit_once('.') {
		Some((schema, name)) => format!("{}.{}", quote_ident(schema), quote_ident(name)),
		None => quote_ident(table),
	};
	format!(
		"SELECT setval(pg_get_serial_sequence('{literal}', '{pk}'), COALESCE((SELECT MAX(\"{pk}\") FROM {quoted}), 0) + 1, false)",
		literal = quoted.replace('\'', "''"),
		quoted = quoted,
		pk = PRIMARY_KEY_FIELD,
	)
}

/// Table reference of a possibly schema-qualified name (`billing.invoices`).
fn table_ref(table: &str) -> TableRef {
	match table.rsplit_once('.') {
		Some((schema, name)) => (Alias::new(schema), Alias::new(name)).into_table_ref(),
		None => Alias::new(table).into_table_ref(),
	}
}

fn quote_ident(ident: &str) -> String {
	format!("\"{}\"", ident.replace('"', "\"\""))
}

fn sea_value(value: &serde_json::Value) -> sea_query::Value {
	match value {
		serde_json::Value::Null => sea_query::Value::Int(None),
		serde_json::Value::Bool(b) => (*b).into(),
		serde_json::Value::Number(n) => {
			if let Some(i) = n.as_i64() {
				i.into()
			} else if let Some(f) = n.as_f64() {
				f.into()
			} else {
				n.to_string().into()
			}
		}
		serde_json::Value::String(s) => s.clone().into(),
		other => other.to_string().into(),
	}
}
