//! Database connection management
//!
//! Every store operation acquires a connection, runs, and releases it before
//! returning. File-backed stores open a fresh connection per operation; the
//! in-memory store keeps one shared connection, since closing it would drop
//! all data.

use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::Arc;

use super::migrations::run_migrations;
use crate::error::{Result, TrailScribeError};
use crate::types::{StorageConfig, StorageMode};

/// Where connections come from
#[derive(Clone)]
enum ConnectionSource {
    /// Shared in-memory connection, locked for the scope of one operation
    Shared(Arc<Mutex<Connection>>),
    /// Database file, opened and closed around each operation
    File,
}

/// Storage engine wrapping SQLite with scoped connection acquisition
#[derive(Clone)]
pub struct Storage {
    config: StorageConfig,
    source: ConnectionSource,
}

impl Storage {
    /// Open or create a database with the given configuration
    pub fn open(config: StorageConfig) -> Result<Self> {
        if config.db_path.trim().is_empty() {
            return Err(TrailScribeError::Config(
                "db_path must name a database file or \":memory:\"".into(),
            ));
        }

        if config.is_in_memory() {
            let conn = Connection::open_in_memory()?;
            Self::configure_pragmas(&conn, config.storage_mode)?;
            run_migrations(&conn)?;
            return Ok(Self {
                config,
                source: ConnectionSource::Shared(Arc::new(Mutex::new(conn))),
            });
        }

        // Ensure parent directory exists
        if let Some(parent) = Path::new(&config.db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&config.db_path, flags).map_err(|source| {
            TrailScribeError::StoreUnavailable {
                path: config.db_path.clone(),
                source,
            }
        })?;
        Self::configure_pragmas(&conn, config.storage_mode)?;
        run_migrations(&conn)?;
        drop(conn);

        tracing::debug!(path = %config.db_path, mode = ?config.storage_mode, "Opened store");

        Ok(Self {
            config,
            source: ConnectionSource::File,
        })
    }

    /// Open with default configuration (in-memory for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::open(StorageConfig::default())
    }

    /// Configure SQLite pragmas based on storage mode
    ///
    /// Journal mode is persistent in the database file, so this only needs to
    /// run once per store.
    fn configure_pragmas(conn: &Connection, mode: StorageMode) -> Result<()> {
        match mode {
            StorageMode::Local => {
                conn.execute_batch(
                    r#"
                    PRAGMA journal_mode=WAL;
                    PRAGMA synchronous=NORMAL;
                    PRAGMA busy_timeout=30000;
                    PRAGMA foreign_keys=ON;
                    "#,
                )?;
            }
            StorageMode::CloudSafe => {
                // Single-file mode for cloud sync (Dropbox, OneDrive, iCloud)
                conn.execute_batch(
                    r#"
                    PRAGMA journal_mode=DELETE;
                    PRAGMA synchronous=FULL;
                    PRAGMA busy_timeout=30000;
                    PRAGMA foreign_keys=ON;
                    "#,
                )?;
            }
        }
        Ok(())
    }

    /// Open the database file for one operation. The file must already exist:
    /// a vanished store is reported, not silently recreated empty.
    fn open_file(&self) -> Result<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.config.db_path, flags).map_err(|source| {
            TrailScribeError::StoreUnavailable {
                path: self.config.db_path.clone(),
                source,
            }
        })?;
        conn.execute_batch("PRAGMA busy_timeout=30000; PRAGMA foreign_keys=ON;")?;
        Ok(conn)
    }

    /// Execute a function with a connection held for the duration of the call
    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        match &self.source {
            ConnectionSource::Shared(conn) => {
                let conn = conn.lock();
                f(&conn)
            }
            ConnectionSource::File => {
                let conn = self.open_file()?;
                f(&conn)
            }
        }
    }

    /// Execute a function inside a transaction, committing on success
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        fn run<F, T>(conn: &mut Connection, f: F) -> Result<T>
        where
            F: FnOnce(&Connection) -> Result<T>,
        {
            let tx = conn.transaction()?;
            let result = f(&tx)?;
            tx.commit()?;
            Ok(result)
        }

        match &self.source {
            ConnectionSource::Shared(conn) => {
                let mut conn = conn.lock();
                run(&mut conn, f)
            }
            ConnectionSource::File => {
                let mut conn = self.open_file()?;
                run(&mut conn, f)
            }
        }
    }

    /// Get current storage mode
    pub fn storage_mode(&self) -> StorageMode {
        self.config.storage_mode
    }

    /// Get database path
    pub fn db_path(&self) -> &str {
        &self.config.db_path
    }

    /// Get configuration
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}
