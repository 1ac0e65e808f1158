//! SQLite connection management for the local Vault store.
//!
//! [`Database`] owns a `rusqlite::Connection` and brings the schema up to date
//! every time it is opened.

use rusqlite::Connection;
use std::fs;
use std::path::Path;

use super::migrations;

/// Owned SQLite connection with the bookmark schema applied.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) the database file at `path`, creating missing parent
    /// directories, and runs migrations.
    ///
    /// # Errors
    /// Returns `rusqlite::Error` if the connection cannot be established or migrations fail.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::InvalidPath(parent.join(format!("({})", e)))
            })?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    /// Opens an in-memory database; its contents vanish when it is dropped.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, rusqlite::Error> {
        migrations::run_all(&conn)?;
        Ok(Self { conn })
    }

    /// Returns the underlying connection for queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Schema version recorded in the database.
    pub fn schema_version(&self) -> i32 {
        migrations::get_schema_version(&self.conn)
    }
}
