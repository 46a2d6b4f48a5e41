pub mod migrations;
pub mod queries;

use anyhow::Context;
use rusqlite::Connection;

/// Opens the session database and brings its schema up to date.
pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("failed to open session database at {path}"))?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&conn)?;
    tracing::debug!(path = %path, "session database ready");

    Ok(conn)
}
