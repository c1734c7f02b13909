//! Auxiliary scripts run after fixture data is inserted.

use std::path::Path;

use async_trait::async_trait;

use crate::connection::FixtureConnection;
use crate::error::{FixtureError, FixtureResult};

/// Runs one auxiliary script inside the fixture transaction.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
	/// Runs the script at `path` on the connection.
	async fn run(&self, conn: &dyn FixtureConnection, path: &Path) -> FixtureResult<()>;
}

/// Executes SQL script files as a single statement batch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlScriptRunner;

#[async_trait]
impl ScriptRunner for SqlScriptRunner {
	async fn run(&self, conn: &dyn FixtureConnection, path: &Path) -> FixtureResult<()> {
		let sql = tokio::fs::read_to_string(path).await.map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				FixtureError::FileNotFound(path.to_path_buf())
			} else {
				FixtureError::Io(e)
			}
		})?;
		if sql.trim().is_empty() {
			return Ok(());
		}

		tracing::debug!(script = %path.display(), "Running fixture script");
		conn.execute(&sql).await?;
		Ok(())
	}
}
