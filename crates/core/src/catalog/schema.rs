use rusqlite::Connection;

use crate::error::{Error, Result};

/// Schema version written to `PRAGMA user_version`.
///
/// Version 2 stores `photos.created_at` and `photos.updated_at` in
/// milliseconds; version 1 stored whole seconds.
pub const SCHEMA_VERSION: u32 = 2;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS cameras (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            model       TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS locations (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL DEFAULT '',
            city        TEXT NOT NULL DEFAULT '',
            county      TEXT NOT NULL DEFAULT '',
            country     TEXT NOT NULL DEFAULT '',
            category    TEXT NOT NULL DEFAULT '',
            loc_type    TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS photos (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            canonical_name  TEXT NOT NULL UNIQUE,
            perceptual_hash TEXT,
            lat             REAL,
            lng             REAL,
            artist          TEXT,
            colors          TEXT NOT NULL DEFAULT '',
            vibrant_color   TEXT,
            muted_color     TEXT,
            title           TEXT NOT NULL DEFAULT '',
            favorite        INTEGER NOT NULL DEFAULT 0,
            taken_at        INTEGER NOT NULL,
            camera_id       INTEGER REFERENCES cameras(id),
            location_id     TEXT REFERENCES locations(id),
            created_at      INTEGER NOT NULL,
            updated_at      INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS files (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            photo_id      INTEGER NOT NULL REFERENCES photos(id),
            path          TEXT NOT NULL UNIQUE,
            hash          TEXT NOT NULL,
            file_type     TEXT NOT NULL,
            mime          TEXT NOT NULL,
            orientation   INTEGER NOT NULL DEFAULT 1,
            width         INTEGER,
            height        INTEGER,
            aspect_ratio  REAL,
            is_primary    INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_files_hash ON files(hash);
        CREATE INDEX IF NOT EXISTS idx_files_photo ON files(photo_id);

        CREATE TABLE IF NOT EXISTS tags (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            label       TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS photo_tags (
            photo_id    INTEGER NOT NULL REFERENCES photos(id),
            tag_id      INTEGER NOT NULL REFERENCES tags(id),
            position    INTEGER NOT NULL,
            PRIMARY KEY (photo_id, tag_id)
        );

        CREATE INDEX IF NOT EXISTS idx_photo_tags_tag ON photo_tags(tag_id);

        CREATE TABLE IF NOT EXISTS config (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

/// Stamp a fresh database with the current version, upgrade older ones and
/// refuse databases written by a newer build.
pub fn migrate(conn: &Connection) -> Result<()> {
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if found > SCHEMA_VERSION {
        return Err(Error::UnsupportedSchemaVersion {
            found,
            supported: SCHEMA_VERSION,
        });
    }
    if found == 1 {
        conn.execute_batch(
            "UPDATE photos SET created_at = created_at * 1000, updated_at = updated_at * 1000;",
        )?;
    }
    if found < SCHEMA_VERSION {
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }
    Ok(())
}
