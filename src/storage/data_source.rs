//! Generic data access over one entity table
//!
//! An [`Entity`] declares its table, its column list, how to bind its fields
//! to those columns and how to rebuild itself from a row. [`DataSource`]
//! supplies add/delete/list on top of that for every entity kind.
//!
//! Rows are read by column name, so the projection order never has to agree
//! with the mapping code.

use std::marker::PhantomData;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::connection::Storage;
use crate::error::{Result, TrailScribeError};
use crate::types::{Record, RecordId, RecordKind, SyncMetadata};

/// A record type that lives in its own table
pub trait Entity: Sized {
    const KIND: RecordKind;
    const TABLE: &'static str;
    /// Persisted columns other than `id`
    const COLUMNS: &'static [&'static str];

    fn meta(&self) -> &SyncMetadata;

    fn meta_mut(&mut self) -> &mut SyncMetadata;

    /// Column/value pairs for every entry of [`Entity::COLUMNS`]
    fn to_values(&self) -> Vec<(&'static str, Value)>;

    /// Rebuild the entity from a row, reading columns by name
    fn from_row(row: &Row) -> rusqlite::Result<Self>;

    /// Borrow the entity out of a record of the matching kind
    fn from_record(record: &Record) -> Option<&Self>;

    /// Reject caller input that must never reach the store
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Projected select over all columns of an entity table
fn select_sql<E: Entity>() -> String {
    format!("SELECT id, {} FROM {}", E::COLUMNS.join(", "), E::TABLE)
}

fn fetch_one<E: Entity>(conn: &Connection, id: RecordId) -> Result<Option<E>> {
    let sql = format!("{} WHERE id = ?", select_sql::<E>());
    let mut stmt = conn.prepare(&sql)?;
    Ok(stmt.query_row(params![id], |row| E::from_row(row)).optional()?)
}

/// Insert one row and return the identity the store assigned
pub(crate) fn insert_row(
    conn: &Connection,
    table: &str,
    values: Vec<(&'static str, Value)>,
) -> Result<RecordId> {
    let (columns, values): (Vec<&str>, Vec<Value>) = values.into_iter().unzip();
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders
    );
    conn.execute(&sql, params_from_iter(values))?;
    Ok(conn.last_insert_rowid())
}

/// Overwrite the row with the given identity; false when no such row exists
pub(crate) fn update_row(
    conn: &Connection,
    table: &str,
    id: RecordId,
    values: Vec<(&'static str, Value)>,
) -> Result<bool> {
    let (columns, mut values): (Vec<&str>, Vec<Value>) = values.into_iter().unzip();
    let assignments = columns
        .iter()
        .map(|c| format!("{} = ?", c))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("UPDATE {} SET {} WHERE id = ?", table, assignments);
    values.push(Value::Integer(id));
    let changed = conn.execute(&sql, params_from_iter(values))?;
    Ok(changed > 0)
}

/// Delete the row with the given identity; false when it was already gone
pub(crate) fn delete_row(conn: &Connection, table: &str, id: RecordId) -> Result<bool> {
    let sql = format!("DELETE FROM {} WHERE id = ?", table);
    let changed = conn.execute(&sql, params![id])?;
    Ok(changed > 0)
}

/// Persistence access bound to one entity kind and its table
pub struct DataSource<E: Entity> {
    storage: Storage,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for DataSource<E> {
    fn clone(&self) -> Self {
        Self::new(self.storage.clone())
    }
}

impl<E: Entity> DataSource<E> {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            _entity: PhantomData,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Entity kind this data source manages
    pub fn kind(&self) -> RecordKind {
        E::KIND
    }

    /// Insert a record as a new row.
    ///
    /// Returns `Ok(false)` without touching the store when the record is of a
    /// different kind. Store failures are returned as errors.
    pub fn add(&self, record: &Record) -> Result<bool> {
        let Some(entity) = E::from_record(record) else {
            tracing::warn!(
                expected = %E::KIND,
                got = %record.kind(),
                "Rejected add of foreign record kind"
            );
            return Ok(false);
        };
        self.insert(entity)?;
        Ok(true)
    }

    /// Delete the row matching the record's identity.
    ///
    /// Returns `Ok(false)` for a record of a different kind. Deleting an
    /// identity that is not stored succeeds and changes nothing.
    pub fn delete(&self, record: &Record) -> Result<bool> {
        let Some(entity) = E::from_record(record) else {
            tracing::warn!(
                expected = %E::KIND,
                got = %record.kind(),
                "Rejected delete of foreign record kind"
            );
            return Ok(false);
        };
        self.remove(entity.meta().id)?;
        Ok(true)
    }

    /// Insert the entity and return the stored copy, carrying its new identity
    pub fn insert(&self, entity: &E) -> Result<E> {
        entity.validate()?;
        let inserted = self.storage.with_transaction(|conn| {
            let id = insert_row(conn, E::TABLE, entity.to_values())?;
            fetch_one::<E>(conn, id)?.ok_or(TrailScribeError::NotFound(id))
        })?;
        tracing::debug!(table = E::TABLE, id = inserted.meta().id, "Inserted row");
        Ok(inserted)
    }

    /// Overwrite a persisted entity. Returns false when its row no longer exists.
    pub fn update(&self, entity: &E) -> Result<bool> {
        let id = entity.meta().id;
        if id == 0 {
            return Err(TrailScribeError::InvalidInput(format!(
                "cannot update unpersisted {} '{}'",
                E::KIND,
                entity.meta().name
            )));
        }
        entity.validate()?;
        let updated = self
            .storage
            .with_transaction(|conn| update_row(conn, E::TABLE, id, entity.to_values()))?;
        tracing::debug!(table = E::TABLE, id, updated, "Updated row");
        Ok(updated)
    }

    /// Delete by identity. Returns whether a row was removed.
    pub fn remove(&self, id: RecordId) -> Result<bool> {
        let removed = self
            .storage
            .with_transaction(|conn| delete_row(conn, E::TABLE, id))?;
        tracing::debug!(table = E::TABLE, id, removed, "Deleted row");
        Ok(removed)
    }

    pub fn get(&self, id: RecordId) -> Result<Option<E>> {
        self.storage.with_connection(|conn| fetch_one::<E>(conn, id))
    }

    /// Every stored entity, fully materialized
    pub fn get_all(&self) -> Result<Vec<E>> {
        let entities = self.storage.with_connection(|conn| {
            let mut stmt = conn.prepare(&select_sql::<E>())?;
            let rows = stmt.query_map([], |row| E::from_row(row))?;
            let entities = rows.collect::<rusqlite::Result<Vec<E>>>()?;
            Ok(entities)
        })?;
        tracing::debug!(table = E::TABLE, count = entities.len(), "Listed rows");
        Ok(entities)
    }

    /// First stored entity referring to the given resource file
    pub fn find_by_filename(&self, filename: &str) -> Result<Option<E>> {
        self.storage.with_connection(|conn| {
            let sql = format!(
                "{} WHERE filename = ? ORDER BY id LIMIT 1",
                select_sql::<E>()
            );
            let mut stmt = conn.prepare(&sql)?;
            Ok(stmt
                .query_row(params![filename], |row| E::from_row(row))
                .optional()?)
        })
    }

    pub fn count(&self) -> Result<i64> {
        self.storage.with_connection(|conn| {
            let sql = format!("SELECT COUNT(*) FROM {}", E::TABLE);
            Ok(conn.query_row(&sql, [], |row| row.get(0))?)
        })
    }
}
