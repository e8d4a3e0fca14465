//! Database connection management

use anyhow::Context;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS client (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    original_client_id INTEGER NOT NULL,
    hand TEXT NOT NULL CHECK (hand IN ('L', 'R'))
);

CREATE TABLE IF NOT EXISTS file (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id INTEGER NOT NULL REFERENCES client(id),
    path VARCHAR(100) NOT NULL UNIQUE,
    model_id VARCHAR(9) NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS protocol (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(20) NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS protocolPurpose (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    protocol_id INTEGER NOT NULL REFERENCES protocol(id),
    sgroup TEXT NOT NULL CHECK (sgroup IN ('dev', 'eval')),
    purpose TEXT NOT NULL CHECK (purpose IN ('enroll', 'probe'))
);

CREATE TABLE IF NOT EXISTS protocolPurpose_file_association (
    protocolPurpose_id INTEGER NOT NULL REFERENCES protocolPurpose(id),
    file_id INTEGER NOT NULL REFERENCES file(id),
    PRIMARY KEY (protocolPurpose_id, file_id)
);

CREATE INDEX IF NOT EXISTS idx_file_client ON file(client_id);
CREATE INDEX IF NOT EXISTS idx_association_file ON protocolPurpose_file_association(file_id);
";

/// Open (or create) a database file for writing
pub fn open(path: &Path) -> anyhow::Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("Failed to enable foreign keys")?;
    Ok(conn)
}

/// Open an existing database file without write access
pub fn open_read_only(path: &Path) -> anyhow::Result<Connection> {
    if !path.exists() {
        anyhow::bail!(
            "The database file '{}' is not available; did you forget to run 'bwdb create'?",
            path.display()
        );
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open database {}", path.display()))?;
    Ok(conn)
}

/// Open a private in-memory database
pub fn open_in_memory() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("Failed to enable foreign keys")?;
    Ok(conn)
}

/// Create all tables. Existing tables are left untouched.
pub fn create_tables(conn: &Connection) -> anyhow::Result<()> {
    log::debug!("Creating database schema");
    conn.execute_batch(SCHEMA)
        .context("Failed to create database schema")?;
    Ok(())
}

/// Test database connection
pub fn test_connection(conn: &Connection) -> anyhow::Result<()> {
    let test: i32 = conn
        .query_row("SELECT 1 as test", [], |row| row.get(0))
        .context("Failed to query database")?;

    if test == 1 {
        Ok(())
    } else {
        anyhow::bail!("Database connection test failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_twice() {
        let conn = open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
        assert!(test_connection(&conn).is_ok());

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 5);
    }

    #[test]
    fn test_hand_constraint() {
        let conn = open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        let result = conn.execute(
            "INSERT INTO client (original_client_id, hand) VALUES (1, 'X')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_open_read_only_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_read_only(&dir.path().join("db.sql3")).unwrap_err();
        assert!(err.to_string().contains("bwdb create"));
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.sql3");
        {
            let conn = open(&path).unwrap();
            create_tables(&conn).unwrap();
        }
        let conn = open_read_only(&path).unwrap();
        assert!(test_connection(&conn).is_ok());
        assert!(conn
            .execute("INSERT INTO protocol (name) VALUES ('all')", [])
            .is_err());
    }
}
