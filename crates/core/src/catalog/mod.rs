pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::*;
use crate::error::Result;

const PHOTO_COLUMNS: &str = "id, canonical_name, perceptual_hash, lat, lng, artist, colors,
    vibrant_color, muted_color, title, favorite, taken_at, camera_id, location_id,
    created_at, updated_at";

const FILE_COLUMNS: &str =
    "id, photo_id, path, hash, file_type, mime, orientation, width, height, aspect_ratio, is_primary";

/// SQLite-backed catalog of photos, their files, tags, cameras and locations.
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Open or create a catalog at the given path with WAL mode.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::migrate(&conn)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory catalog (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::migrate(&conn)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    /// Read-only and single-statement access outside a transaction.
    pub fn store(&self) -> Store<'_> {
        Store::new(&self.conn)
    }

    /// Run `f` inside one transaction. Commits when `f` succeeds; any error
    /// rolls back every write `f` made.
    pub fn in_transaction<T>(&mut self, f: impl FnOnce(&Store<'_>) -> Result<T>) -> Result<T> {
        let tx = self.conn.transaction()?;
        let value = f(&Store::new(&tx))?;
        tx.commit()?;
        Ok(value)
    }

    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM config WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

/// Unique-key lookups and in-place writes over one connection or transaction.
pub struct Store<'c> {
    conn: &'c Connection,
}

impl<'c> Store<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    // ── Photos ───────────────────────────────────────────────────────

    pub fn find_photo_by_canonical(&self, canonical_name: &str) -> Result<Option<Photo>> {
        let photo = self
            .conn
            .query_row(
                &format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE canonical_name = ?1"),
                params![canonical_name],
                photo_from_row,
            )
            .optional()?;
        Ok(photo)
    }

    pub fn get_photo(&self, id: i64) -> Result<Option<Photo>> {
        let photo = self
            .conn
            .query_row(
                &format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE id = ?1"),
                params![id],
                photo_from_row,
            )
            .optional()?;
        Ok(photo)
    }

    pub fn insert_photo(&self, photo: &Photo) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO photos (canonical_name, perceptual_hash, lat, lng, artist, colors,
             vibrant_color, muted_color, title, favorite, taken_at, camera_id, location_id,
             created_at, updated_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15)",
            params![
                photo.canonical_name,
                photo.perceptual_hash,
                photo.lat,
                photo.lng,
                photo.artist,
                photo.colors.join(", "),
                photo.vibrant_color,
                photo.muted_color,
                photo.title,
                photo.favorite,
                photo.taken_at.timestamp(),
                photo.camera_id,
                photo.location_id,
                photo.created_at.timestamp_millis(),
                photo.updated_at.timestamp_millis(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Persist the fields a refresh is allowed to touch.
    pub fn update_photo_volatile(&self, photo: &Photo) -> Result<()> {
        self.conn.execute(
            "UPDATE photos SET perceptual_hash=?1, colors=?2, vibrant_color=?3, muted_color=?4,
             updated_at=?5
             WHERE id=?6",
            params![
                photo.perceptual_hash,
                photo.colors.join(", "),
                photo.vibrant_color,
                photo.muted_color,
                photo.updated_at.timestamp_millis(),
                photo.id,
            ],
        )?;
        Ok(())
    }

    pub fn list_photos(&self) -> Result<Vec<Photo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PHOTO_COLUMNS} FROM photos ORDER BY id"))?;
        let photos = stmt
            .query_map([], photo_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(photos)
    }

    // ── Tags / cameras / locations ──────────────────────────────────

    /// Look up a tag by label, creating it when missing. `label` must
    /// already be normalized.
    pub fn first_or_create_tag(&self, label: &str) -> Result<Tag> {
        self.conn.execute(
            "INSERT OR IGNORE INTO tags (label) VALUES (?1)",
            params![label],
        )?;
        let tag = self.conn.query_row(
            "SELECT id, label FROM tags WHERE label = ?1",
            params![label],
            |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    label: row.get(1)?,
                })
            },
        )?;
        Ok(tag)
    }

    /// Replace the tag set of a photo, keeping the given order.
    pub fn set_photo_tags(&self, photo_id: i64, tags: &[Tag]) -> Result<()> {
        self.conn.execute(
            "DELETE FROM photo_tags WHERE photo_id = ?1",
            params![photo_id],
        )?;
        let mut stmt = self.conn.prepare(
            "INSERT OR IGNORE INTO photo_tags (photo_id, tag_id, position) VALUES (?1, ?2, ?3)",
        )?;
        for (position, tag) in tags.iter().enumerate() {
            stmt.execute(params![photo_id, tag.id, position as i64])?;
        }
        Ok(())
    }

    pub fn tags_for_photo(&self, photo_id: i64) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.label FROM photo_tags pt
             JOIN tags t ON t.id = pt.tag_id
             WHERE pt.photo_id = ?1
             ORDER BY pt.position",
        )?;
        let tags = stmt
            .query_map(params![photo_id], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    label: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    pub fn first_or_create_camera(&self, model: &str) -> Result<Camera> {
        self.conn.execute(
            "INSERT OR IGNORE INTO cameras (model) VALUES (?1)",
            params![model],
        )?;
        let camera = self.conn.query_row(
            "SELECT id, model FROM cameras WHERE model = ?1",
            params![model],
            |row| {
                Ok(Camera {
                    id: row.get(0)?,
                    model: row.get(1)?,
                })
            },
        )?;
        Ok(camera)
    }

    pub fn get_camera(&self, id: i64) -> Result<Option<Camera>> {
        let camera = self
            .conn
            .query_row(
                "SELECT id, model FROM cameras WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Camera {
                        id: row.get(0)?,
                        model: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(camera)
    }

    /// Look up a location by id, creating it from `location` when missing.
    /// An existing row wins over the candidate's place names.
    pub fn first_or_create_location(&self, location: &Location) -> Result<Location> {
        self.conn.execute(
            "INSERT OR IGNORE INTO locations (id, name, city, county, country, category, loc_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                location.id,
                location.name,
                location.city,
                location.county,
                location.country,
                location.category,
                location.loc_type,
            ],
        )?;
        let stored = self.conn.query_row(
            "SELECT id, name, city, county, country, category, loc_type
             FROM locations WHERE id = ?1",
            params![location.id],
            location_from_row,
        )?;
        Ok(stored)
    }

    pub fn get_location(&self, id: &str) -> Result<Option<Location>> {
        let location = self
            .conn
            .query_row(
                "SELECT id, name, city, county, country, category, loc_type
                 FROM locations WHERE id = ?1",
                params![id],
                location_from_row,
            )
            .optional()?;
        Ok(location)
    }

    // ── Files ────────────────────────────────────────────────────────

    /// The current image-primary file flagged primary for a photo, if any.
    pub fn find_primary_file(&self, photo_id: i64) -> Result<Option<File>> {
        let file = self
            .conn
            .query_row(
                &format!(
                    "SELECT {FILE_COLUMNS} FROM files
                     WHERE photo_id = ?1 AND file_type = ?2 AND is_primary = 1
                     ORDER BY id LIMIT 1"
                ),
                params![photo_id, FileType::Jpeg.as_str()],
                file_from_row,
            )
            .optional()?;
        Ok(file)
    }

    /// Find a file row matching either the relative path or the content
    /// hash. An exact path match is preferred over a hash match.
    pub fn find_file(&self, path: &Path, hash: &str) -> Result<Option<File>> {
        let path_str = path.to_string_lossy();
        let file = self
            .conn
            .query_row(
                &format!(
                    "SELECT {FILE_COLUMNS} FROM files
                     WHERE path = ?1 OR hash = ?2
                     ORDER BY (path = ?1) DESC, id
                     LIMIT 1"
                ),
                params![path_str.as_ref(), hash],
                file_from_row,
            )
            .optional()?;
        Ok(file)
    }

    pub fn insert_file(&self, file: &File) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO files (photo_id, path, hash, file_type, mime, orientation,
             width, height, aspect_ratio, is_primary)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
            params![
                file.photo_id,
                file.path.to_string_lossy().as_ref(),
                file.hash,
                file.file_type.as_str(),
                file.mime,
                file.orientation,
                file.width,
                file.height,
                file.aspect_ratio,
                file.primary,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Update a file row in place. Unknown dimensions keep the stored ones.
    pub fn update_file(&self, file: &File) -> Result<()> {
        self.conn.execute(
            "UPDATE files SET photo_id=?1, path=?2, hash=?3, file_type=?4, mime=?5, orientation=?6,
             width=COALESCE(?7, width), height=COALESCE(?8, height),
             aspect_ratio=COALESCE(?9, aspect_ratio), is_primary=?10
             WHERE id=?11",
            params![
                file.photo_id,
                file.path.to_string_lossy().as_ref(),
                file.hash,
                file.file_type.as_str(),
                file.mime,
                file.orientation,
                file.width,
                file.height,
                file.aspect_ratio,
                file.primary,
                file.id,
            ],
        )?;
        Ok(())
    }

    pub fn files_for_photo(&self, photo_id: i64) -> Result<Vec<File>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE photo_id = ?1 ORDER BY path"
        ))?;
        let files = stmt
            .query_map(params![photo_id], file_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(files)
    }

    pub fn list_files(&self) -> Result<Vec<File>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {FILE_COLUMNS} FROM files ORDER BY path"))?;
        let files = stmt
            .query_map([], file_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(files)
    }

    // ── Stats ────────────────────────────────────────────────────────

    /// Row counts of every entity table (single query).
    pub fn stats(&self) -> Result<CatalogStats> {
        let stats = self.conn.query_row(
            "SELECT
                (SELECT COUNT(*) FROM photos),
                (SELECT COUNT(*) FROM files),
                (SELECT COUNT(*) FROM tags),
                (SELECT COUNT(*) FROM cameras),
                (SELECT COUNT(*) FROM locations)",
            [],
            |row| {
                Ok(CatalogStats {
                    total_photos: row.get::<_, i64>(0)? as usize,
                    total_files: row.get::<_, i64>(1)? as usize,
                    total_tags: row.get::<_, i64>(2)? as usize,
                    total_cameras: row.get::<_, i64>(3)? as usize,
                    total_locations: row.get::<_, i64>(4)? as usize,
                })
            },
        )?;
        Ok(stats)
    }
}

fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn from_unix_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

fn split_colors(joined: &str) -> Vec<String> {
    joined
        .split(", ")
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn photo_from_row(row: &Row<'_>) -> rusqlite::Result<Photo> {
    Ok(Photo {
        id: row.get(0)?,
        canonical_name: row.get(1)?,
        perceptual_hash: row.get(2)?,
        lat: row.get(3)?,
        lng: row.get(4)?,
        artist: row.get(5)?,
        colors: split_colors(&row.get::<_, String>(6)?),
        vibrant_color: row.get(7)?,
        muted_color: row.get(8)?,
        title: row.get(9)?,
        favorite: row.get(10)?,
        taken_at: from_unix(row.get(11)?),
        camera_id: row.get(12)?,
        location_id: row.get(13)?,
        created_at: from_unix_millis(row.get(14)?),
        updated_at: from_unix_millis(row.get(15)?),
    })
}

fn location_from_row(row: &Row<'_>) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get(0)?,
        name: row.get(1)?,
        city: row.get(2)?,
        county: row.get(3)?,
        country: row.get(4)?,
        category: row.get(5)?,
        loc_type: row.get(6)?,
    })
}

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<File> {
    let file_type: String = row.get(4)?;
    Ok(File {
        id: row.get(0)?,
        photo_id: row.get(1)?,
        path: PathBuf::from(row.get::<_, String>(2)?),
        hash: row.get(3)?,
        file_type: FileType::parse(&file_type).unwrap_or(FileType::Sidecar),
        mime: row.get(5)?,
        orientation: row.get(6)?,
        width: row.get(7)?,
        height: row.get(8)?,
        aspect_ratio: row.get(9)?,
        primary: row.get(10)?,
    })
}
