//! Persistent sync checkpoint

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::error::Result;
use crate::types::SyncStatus;

/// Get current sync status from database
pub fn get_sync_status(conn: &Connection) -> Result<SyncStatus> {
    let status = conn.query_row(
        "SELECT last_sync, last_error FROM sync_state WHERE id = 1",
        [],
        |row| {
            Ok(SyncStatus {
                last_sync: row.get(0)?,
                last_error: row.get(1)?,
            })
        },
    )?;
    Ok(status)
}

/// Record a completed round; clears any previous error
pub fn record_sync_success(conn: &Connection, checkpoint: &str) -> Result<()> {
    conn.execute(
        "UPDATE sync_state SET last_sync = ?, last_error = NULL, updated_at = ? WHERE id = 1",
        params![checkpoint, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

/// Record a failed round. The previous checkpoint stays in place.
pub fn record_sync_failure(conn: &Connection, error: &str) -> Result<()> {
    conn.execute(
        "UPDATE sync_state SET last_error = ?, updated_at = ? WHERE id = 1",
        params![error, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}
