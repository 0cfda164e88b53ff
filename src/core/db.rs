use crate::core::error;
use rusqlite::Connection;
use std::path::Path;

pub fn db_connect(db_path: &Path) -> Result<Connection, error::TrailheadError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))?;
    conn.execute("PRAGMA foreign_keys=ON;", [])?;
    Ok(conn)
}

/// Run each schema statement against `conn`. All statements are `IF NOT EXISTS`.
pub fn apply_schema(conn: &Connection, statements: &[&str]) -> Result<(), error::TrailheadError> {
    for stmt in statements {
        conn.execute(stmt, [])?;
    }
    Ok(())
}
