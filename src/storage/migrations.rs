//! Database migrations for TrailScribe

use rusqlite::Connection;

use crate::error::Result;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 3;

/// Run all migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Create migrations table if not exists
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    let current_version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    if current_version < 2 {
        migrate_v2(conn)?;
    }

    if current_version < 3 {
        migrate_v3(conn)?;
    }

    Ok(())
}

/// Initial schema (v1): one table per entity kind
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS samples (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL DEFAULT '',
            filename TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            time TEXT NOT NULL DEFAULT '',
            x REAL NOT NULL DEFAULT 0,
            y REAL NOT NULL DEFAULT 0,
            z REAL NOT NULL DEFAULT 0,
            custom_field TEXT NOT NULL DEFAULT '',
            last_modified TEXT NOT NULL DEFAULT '',
            user_id INTEGER NOT NULL DEFAULT 0,
            map_id INTEGER NOT NULL DEFAULT 0,
            expedition_id INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS maps (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL DEFAULT '',
            filename TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            projection TEXT NOT NULL DEFAULT '',
            min_zoom_level INTEGER NOT NULL DEFAULT 0,
            max_zoom_level INTEGER NOT NULL DEFAULT 0,
            min_x REAL NOT NULL DEFAULT 0,
            min_y REAL NOT NULL DEFAULT 0,
            max_x REAL NOT NULL DEFAULT 0,
            max_y REAL NOT NULL DEFAULT 0,
            last_modified TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS kmls (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL DEFAULT '',
            filename TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            projection TEXT NOT NULL DEFAULT '',
            min_x REAL NOT NULL DEFAULT 0,
            min_y REAL NOT NULL DEFAULT 0,
            max_x REAL NOT NULL DEFAULT 0,
            max_y REAL NOT NULL DEFAULT 0,
            last_modified TEXT NOT NULL DEFAULT ''
        );

        -- Sync reconciliation matches remote items by file
        CREATE INDEX IF NOT EXISTS idx_maps_filename ON maps(filename);
        CREATE INDEX IF NOT EXISTS idx_kmls_filename ON kmls(filename);

        INSERT INTO schema_version (version) VALUES (1);
        "#,
    )?;

    Ok(())
}

/// Sync checkpoint (v2)
fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS sync_state (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            last_sync TEXT,
            last_error TEXT,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        INSERT OR IGNORE INTO sync_state (id) VALUES (1);

        INSERT INTO schema_version (version) VALUES (2);
        "#,
    )?;

    Ok(())
}

/// Zoom bounds on KML overlays (v3)
fn migrate_v3(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        ALTER TABLE kmls ADD COLUMN min_zoom_level INTEGER NOT NULL DEFAULT 0;
        ALTER TABLE kmls ADD COLUMN max_zoom_level INTEGER NOT NULL DEFAULT 0;

        INSERT INTO schema_version (version) VALUES (3);
        "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(conn: &Connection) -> i32 {
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    #[test]
    fn test_migrations_reach_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn test_migrations_are_rerunnable() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM sync_state", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn test_v2_store_gains_kml_zoom_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE schema_version (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )
        .unwrap();
        migrate_v1(&conn).unwrap();
        migrate_v2(&conn).unwrap();
        conn.execute("INSERT INTO kmls (name) VALUES ('legacy')", [])
            .unwrap();

        run_migrations(&conn).unwrap();
        assert_eq!(version(&conn), SCHEMA_VERSION);

        let zoom: (i32, i32) = conn
            .query_row(
                "SELECT min_zoom_level, max_zoom_level FROM kmls WHERE name = 'legacy'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(zoom, (0, 0));
    }
}
