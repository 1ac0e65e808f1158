//! Vault local database layer.
//!
//! Provides SQLite connection management, schema migrations and the local
//! store that implements the data store and change feed contracts.
//!
//! # Usage
//!
//! ```no_run
//! use vault::database::{Database, LocalStore};
//!
//! // Open a persistent database
//! let db = Database::open("vault.db").expect("failed to open database");
//! let store = LocalStore::new(db);
//!
//! // Or use an in-memory database for testing
//! let store = LocalStore::open_in_memory().expect("failed to open in-memory database");
//! ```

pub mod connection;
pub mod local_store;
pub mod migrations;

pub use connection::Database;
pub use local_store::LocalStore;
