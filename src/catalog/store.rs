use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use tracing::{debug, info};

use super::model::{ArtPiece, ArtPiecePatch, ArtPieceSpec, ArtPieceType, Gallery};
use crate::error::{CatalogError, Result};

/// The CatalogStore manages the SQLite catalog database.
///
/// It owns the galleries and their art pieces and is the only writer.
/// Mutating operations take `&mut self`, reads take `&self`, so exclusive
/// writing and consistent read snapshots are enforced by the borrow
/// checker rather than a runtime lock.
pub struct CatalogStore {
    conn: Connection,
}

impl CatalogStore {
    /// Open the store at the default location in the user's data directory:
    /// - Linux: ~/.local/share/arthaus/catalog.db
    /// - macOS: ~/Library/Application Support/arthaus/catalog.db
    /// - Windows: %APPDATA%\arthaus\catalog.db
    pub fn open_default() -> Result<Self> {
        let db_path = Self::default_db_path()?;

        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CatalogError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        Self::open(&db_path)
    }

    /// Open or create the catalog database at an explicit path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "catalog database opened");
        Self::with_connection(conn)
    }

    /// Open a transient in-memory store; used by tests and previews
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        // Cascade from galleries to pieces relies on SQLite foreign keys,
        // which are off by default per connection
        conn.pragma_update(None, "foreign_keys", true)?;

        let mut store = CatalogStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Get the path where the default database is stored
    fn default_db_path() -> Result<PathBuf> {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or(CatalogError::NoDataDir)?;

        path.push("arthaus");
        path.push("catalog.db");
        Ok(path)
    }

    /// Initialize the database schema.
    /// Creates all necessary tables and indexes if they don't exist.
    fn init_schema(&mut self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS galleries (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                title           TEXT NOT NULL,
                created_at      TEXT NOT NULL
            )",
            [],
        )?;

        // Piece rows reference their owning gallery; insertion order is
        // the rowid order and doubles as the default display order
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS art_pieces (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                gallery_id      INTEGER NOT NULL,
                kind            TEXT NOT NULL,
                title           TEXT NOT NULL,
                artist          TEXT NOT NULL,
                source          TEXT NOT NULL,
                price           REAL NOT NULL,
                date_acquired   TEXT,
                image           BLOB,
                created_at      TEXT NOT NULL,
                FOREIGN KEY(gallery_id) REFERENCES galleries(id) ON DELETE CASCADE
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_art_pieces_gallery_id
             ON art_pieces(gallery_id)",
            [],
        )?;

        debug!("catalog schema initialized");

        Ok(())
    }

    // ========== Galleries ==========

    /// Create a new, empty gallery
    pub fn create_gallery(&mut self, title: &str) -> Result<Gallery> {
        if title.trim().is_empty() {
            return Err(CatalogError::validation("gallery title must not be empty"));
        }

        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO galleries (title, created_at) VALUES (?1, ?2)",
            params![title, created_at],
        )?;
        let id = self.conn.last_insert_rowid();

        debug!(id, title, "gallery created");

        Ok(Gallery {
            id,
            title: title.to_owned(),
            created_at,
            pieces: Vec::new(),
        })
    }

    /// Change a gallery's title
    pub fn rename_gallery(&mut self, id: i64, new_title: &str) -> Result<()> {
        if new_title.trim().is_empty() {
            return Err(CatalogError::validation("gallery title must not be empty"));
        }

        let rows = self.conn.execute(
            "UPDATE galleries SET title = ?1 WHERE id = ?2",
            params![new_title, id],
        )?;
        if rows == 0 {
            return Err(CatalogError::NotFound {
                entity: "gallery",
                id,
            });
        }

        debug!(id, new_title, "gallery renamed");
        Ok(())
    }

    /// Delete a gallery and every piece it owns.
    ///
    /// Deleting an unknown id is an error rather than a no-op, so that a
    /// stale id held by the caller surfaces as a bug instead of vanishing.
    pub fn delete_gallery(&mut self, id: i64) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM galleries WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(CatalogError::NotFound {
                entity: "gallery",
                id,
            });
        }

        info!(id, "gallery deleted with its pieces");
        Ok(())
    }

    /// Get all galleries in creation order, each with its pieces loaded
    pub fn list_galleries(&self) -> Result<Vec<Gallery>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, created_at FROM galleries ORDER BY id")?;

        let gallery_iter = stmt.query_map([], |row| {
            Ok(Gallery {
                id: row.get(0)?,
                title: row.get(1)?,
                created_at: row.get(2)?,
                pieces: Vec::new(),
            })
        })?;

        let mut galleries = Vec::new();
        for gallery in gallery_iter {
            let mut gallery = gallery?;
            gallery.pieces = self.load_pieces(gallery.id)?;
            galleries.push(gallery);
        }

        Ok(galleries)
    }

    /// Get a single gallery with its pieces loaded
    pub fn get_gallery(&self, id: i64) -> Result<Gallery> {
        let gallery = self
            .conn
            .query_row(
                "SELECT id, title, created_at FROM galleries WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Gallery {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        created_at: row.get(2)?,
                        pieces: Vec::new(),
                    })
                },
            )
            .optional()?;

        match gallery {
            Some(mut gallery) => {
                gallery.pieces = self.load_pieces(gallery.id)?;
                Ok(gallery)
            }
            None => Err(CatalogError::NotFound {
                entity: "gallery",
                id,
            }),
        }
    }

    // ========== Art pieces ==========

    /// Add a new piece at the end of a gallery's list
    pub fn add_art_piece(&mut self, gallery_id: i64, spec: ArtPieceSpec) -> Result<ArtPiece> {
        validate_piece(&spec.title, spec.price)?;
        self.ensure_gallery_exists(gallery_id)?;

        // A tracking piece represents art not yet acquired; any supplied
        // date is dropped, same as the app's form does on save
        let date_acquired = match spec.kind {
            ArtPieceType::Collection => spec.date_acquired,
            ArtPieceType::Tracking => None,
        };

        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO art_pieces
                (gallery_id, kind, title, artist, source, price, date_acquired, image, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                gallery_id,
                spec.kind,
                spec.title,
                spec.artist,
                spec.source,
                spec.price,
                date_acquired,
                spec.image,
                created_at,
            ],
        )?;
        let id = self.conn.last_insert_rowid();

        debug!(id, gallery_id, kind = spec.kind.as_str(), "art piece added");

        Ok(ArtPiece {
            id,
            gallery_id,
            kind: spec.kind,
            title: spec.title,
            artist: spec.artist,
            source: spec.source,
            price: spec.price,
            date_acquired,
            image: spec.image,
            created_at,
        })
    }

    /// Apply a partial update to a piece and return its new state.
    ///
    /// Fields left `None` in the patch keep their current value. If the
    /// resulting kind is `Tracking`, the acquisition date is cleared no
    /// matter what the patch carried.
    pub fn update_art_piece(&mut self, piece_id: i64, patch: ArtPiecePatch) -> Result<ArtPiece> {
        let mut piece = self.get_art_piece(piece_id)?;

        if let Some(gallery_id) = patch.gallery_id {
            self.ensure_gallery_exists(gallery_id)?;
            piece.gallery_id = gallery_id;
        }
        if let Some(kind) = patch.kind {
            piece.kind = kind;
        }
        if let Some(title) = patch.title {
            piece.title = title;
        }
        if let Some(artist) = patch.artist {
            piece.artist = artist;
        }
        if let Some(source) = patch.source {
            piece.source = source;
        }
        if let Some(price) = patch.price {
            piece.price = price;
        }
        if let Some(date_acquired) = patch.date_acquired {
            piece.date_acquired = date_acquired;
        }
        if let Some(image) = patch.image {
            piece.image = image;
        }

        if piece.kind == ArtPieceType::Tracking {
            piece.date_acquired = None;
        }

        validate_piece(&piece.title, piece.price)?;

        self.conn.execute(
            "UPDATE art_pieces
             SET gallery_id = ?1, kind = ?2, title = ?3, artist = ?4, source = ?5,
                 price = ?6, date_acquired = ?7, image = ?8
             WHERE id = ?9",
            params![
                piece.gallery_id,
                piece.kind,
                piece.title,
                piece.artist,
                piece.source,
                piece.price,
                piece.date_acquired,
                piece.image,
                piece_id,
            ],
        )?;

        debug!(id = piece_id, "art piece updated");
        Ok(piece)
    }

    /// Detach a piece from its gallery and destroy it
    pub fn remove_art_piece(&mut self, piece_id: i64) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM art_pieces WHERE id = ?1", params![piece_id])?;
        if rows == 0 {
            return Err(CatalogError::NotFound {
                entity: "art piece",
                id: piece_id,
            });
        }

        debug!(id = piece_id, "art piece removed");
        Ok(())
    }

    /// Get a single piece by id
    pub fn get_art_piece(&self, piece_id: i64) -> Result<ArtPiece> {
        self.conn
            .query_row(
                "SELECT id, gallery_id, kind, title, artist, source, price,
                        date_acquired, image, created_at
                 FROM art_pieces WHERE id = ?1",
                params![piece_id],
                piece_from_row,
            )
            .optional()?
            .ok_or(CatalogError::NotFound {
                entity: "art piece",
                id: piece_id,
            })
    }

    /// Load a gallery's pieces in insertion order
    fn load_pieces(&self, gallery_id: i64) -> Result<Vec<ArtPiece>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, gallery_id, kind, title, artist, source, price,
                    date_acquired, image, created_at
             FROM art_pieces WHERE gallery_id = ?1 ORDER BY id",
        )?;

        let piece_iter = stmt.query_map(params![gallery_id], piece_from_row)?;

        let mut pieces = Vec::new();
        for piece in piece_iter {
            pieces.push(piece?);
        }

        Ok(pieces)
    }

    fn ensure_gallery_exists(&self, id: i64) -> Result<()> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM galleries WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?;

        if exists {
            Ok(())
        } else {
            Err(CatalogError::NotFound {
                entity: "gallery",
                id,
            })
        }
    }
}

fn piece_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArtPiece> {
    Ok(ArtPiece {
        id: row.get(0)?,
        gallery_id: row.get(1)?,
        kind: row.get(2)?,
        title: row.get(3)?,
        artist: row.get(4)?,
        source: row.get(5)?,
        price: row.get(6)?,
        date_acquired: row.get(7)?,
        image: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Shared validation for add and update
fn validate_piece(title: &str, price: f64) -> Result<()> {
    if title.trim().is_empty() {
        return Err(CatalogError::validation("art piece title must not be empty"));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(CatalogError::validation("price must be a non-negative number"));
    }
    Ok(())
}

impl ToSql for ArtPieceType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for ArtPieceType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "collection" => Ok(ArtPieceType::Collection),
            "tracking" => Ok(ArtPieceType::Tracking),
            other => Err(FromSqlError::Other(
                format!("unknown art piece kind: {other}").into(),
            )),
        }
    }
}

// Implement Debug by hand so image blobs never end up in log output
impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn spec(title: &str, price: f64) -> ArtPieceSpec {
        ArtPieceSpec {
            kind: ArtPieceType::Collection,
            title: title.into(),
            artist: "Hilma af Klint".into(),
            source: "Moderna Museet".into(),
            price,
            date_acquired: None,
            image: None,
        }
    }

    fn store() -> CatalogStore {
        CatalogStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_create_and_list_galleries_in_insertion_order() {
        let mut store = store();
        store.create_gallery("Modern Art").unwrap();
        store.create_gallery("Old Masters").unwrap();

        let titles: Vec<String> = store
            .list_galleries()
            .unwrap()
            .into_iter()
            .map(|g| g.title)
            .collect();
        assert_eq!(titles, ["Modern Art", "Old Masters"]);
    }

    #[test]
    fn test_empty_gallery_title_rejected() {
        let mut store = store();
        assert_matches!(
            store.create_gallery(""),
            Err(CatalogError::Validation { .. })
        );
        assert_matches!(
            store.create_gallery("   "),
            Err(CatalogError::Validation { .. })
        );
        assert!(store.list_galleries().unwrap().is_empty());
    }

    #[test]
    fn test_rename_gallery() {
        let mut store = store();
        let gallery = store.create_gallery("Mdern Art").unwrap();

        store.rename_gallery(gallery.id, "Modern Art").unwrap();
        assert_eq!(store.get_gallery(gallery.id).unwrap().title, "Modern Art");

        assert_matches!(
            store.rename_gallery(gallery.id, ""),
            Err(CatalogError::Validation { .. })
        );
        assert_matches!(
            store.rename_gallery(999, "Anything"),
            Err(CatalogError::NotFound { entity: "gallery", .. })
        );
    }

    #[test]
    fn test_delete_gallery_cascades_to_pieces() {
        let mut store = store();
        let gallery = store.create_gallery("Modern Art").unwrap();
        let piece = store.add_art_piece(gallery.id, spec("The Ten Largest", 100.0)).unwrap();

        store.delete_gallery(gallery.id).unwrap();

        assert!(store.list_galleries().unwrap().is_empty());
        assert_matches!(
            store.get_art_piece(piece.id),
            Err(CatalogError::NotFound { entity: "art piece", .. })
        );
    }

    #[test]
    fn test_delete_unknown_gallery_fails_and_changes_nothing() {
        let mut store = store();
        let gallery = store.create_gallery("Modern Art").unwrap();

        assert_matches!(
            store.delete_gallery(999),
            Err(CatalogError::NotFound { entity: "gallery", .. })
        );
        assert_eq!(store.list_galleries().unwrap().len(), 1);
        assert!(store.get_gallery(gallery.id).is_ok());
    }

    #[test]
    fn test_add_piece_appends_in_insertion_order() {
        let mut store = store();
        let gallery = store.create_gallery("Modern Art").unwrap();
        store.add_art_piece(gallery.id, spec("First", 10.0)).unwrap();
        store.add_art_piece(gallery.id, spec("Second", 20.0)).unwrap();

        let titles: Vec<String> = store
            .get_gallery(gallery.id)
            .unwrap()
            .pieces
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, ["First", "Second"]);
    }

    #[test]
    fn test_add_piece_validation() {
        let mut store = store();
        let gallery = store.create_gallery("Modern Art").unwrap();

        assert_matches!(
            store.add_art_piece(gallery.id, spec("", 10.0)),
            Err(CatalogError::Validation { .. })
        );
        assert_matches!(
            store.add_art_piece(gallery.id, spec("Okay", -1.0)),
            Err(CatalogError::Validation { .. })
        );
        assert_matches!(
            store.add_art_piece(999, spec("Okay", 10.0)),
            Err(CatalogError::NotFound { entity: "gallery", .. })
        );
    }

    #[test]
    fn test_tracking_piece_never_stores_a_date() {
        let mut store = store();
        let gallery = store.create_gallery("Watchlist").unwrap();

        let mut tracked = spec("Composition II", 5000.0);
        tracked.kind = ArtPieceType::Tracking;
        tracked.date_acquired = Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());

        let piece = store.add_art_piece(gallery.id, tracked).unwrap();
        assert_eq!(piece.date_acquired, None);
        assert_eq!(store.get_art_piece(piece.id).unwrap().date_acquired, None);
    }

    #[test]
    fn test_switching_to_tracking_clears_the_date() {
        let mut store = store();
        let gallery = store.create_gallery("Modern Art").unwrap();

        let mut dated = spec("The Swan", 750.0);
        dated.date_acquired = Some(Utc.with_ymd_and_hms(2023, 3, 14, 0, 0, 0).unwrap());
        let piece = store.add_art_piece(gallery.id, dated).unwrap();
        assert!(piece.date_acquired.is_some());

        // Patch supplies a date of its own; the kind switch still wins
        let updated = store
            .update_art_piece(
                piece.id,
                ArtPiecePatch {
                    kind: Some(ArtPieceType::Tracking),
                    date_acquired: Some(Some(Utc::now())),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.kind, ArtPieceType::Tracking);
        assert_eq!(updated.date_acquired, None);
        assert_eq!(store.get_art_piece(piece.id).unwrap().date_acquired, None);
    }

    #[test]
    fn test_update_with_original_values_is_a_no_op() {
        let mut store = store();
        let gallery = store.create_gallery("Modern Art").unwrap();

        let mut original = spec("Altarpiece", 1200.0);
        original.date_acquired = Some(Utc.with_ymd_and_hms(2022, 11, 5, 0, 0, 0).unwrap());
        original.image = Some(vec![0xFF, 0xD8, 0xFF]);
        let piece = store.add_art_piece(gallery.id, original.clone()).unwrap();

        let updated = store
            .update_art_piece(
                piece.id,
                ArtPiecePatch {
                    kind: Some(original.kind),
                    title: Some(original.title),
                    artist: Some(original.artist),
                    source: Some(original.source),
                    price: Some(original.price),
                    date_acquired: Some(original.date_acquired),
                    image: Some(original.image),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated, piece);
        assert_eq!(store.get_art_piece(piece.id).unwrap(), piece);
    }

    #[test]
    fn test_partial_update_keeps_untouched_fields() {
        let mut store = store();
        let gallery = store.create_gallery("Modern Art").unwrap();
        let piece = store.add_art_piece(gallery.id, spec("Sketch", 40.0)).unwrap();

        let updated = store
            .update_art_piece(
                piece.id,
                ArtPiecePatch {
                    price: Some(55.0),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.price, 55.0);
        assert_eq!(updated.title, "Sketch");
        assert_eq!(updated.artist, piece.artist);
    }

    #[test]
    fn test_update_validation() {
        let mut store = store();
        let gallery = store.create_gallery("Modern Art").unwrap();
        let piece = store.add_art_piece(gallery.id, spec("Sketch", 40.0)).unwrap();

        assert_matches!(
            store.update_art_piece(
                piece.id,
                ArtPiecePatch {
                    title: Some("".into()),
                    ..Default::default()
                },
            ),
            Err(CatalogError::Validation { .. })
        );
        assert_matches!(
            store.update_art_piece(
                piece.id,
                ArtPiecePatch {
                    price: Some(-5.0),
                    ..Default::default()
                },
            ),
            Err(CatalogError::Validation { .. })
        );
        assert_matches!(
            store.update_art_piece(999, ArtPiecePatch::default()),
            Err(CatalogError::NotFound { entity: "art piece", .. })
        );

        // Failed updates leave the row untouched
        assert_eq!(store.get_art_piece(piece.id).unwrap(), piece);
    }

    #[test]
    fn test_reassigning_a_piece_replaces_ownership() {
        let mut store = store();
        let first = store.create_gallery("Modern Art").unwrap();
        let second = store.create_gallery("Old Masters").unwrap();
        let piece = store.add_art_piece(first.id, spec("Sketch", 40.0)).unwrap();

        store
            .update_art_piece(
                piece.id,
                ArtPiecePatch {
                    gallery_id: Some(second.id),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(store.get_gallery(first.id).unwrap().pieces.is_empty());
        let moved = store.get_gallery(second.id).unwrap().pieces;
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].id, piece.id);

        assert_matches!(
            store.update_art_piece(
                piece.id,
                ArtPiecePatch {
                    gallery_id: Some(999),
                    ..Default::default()
                },
            ),
            Err(CatalogError::NotFound { entity: "gallery", .. })
        );
    }

    #[test]
    fn test_remove_art_piece() {
        let mut store = store();
        let gallery = store.create_gallery("Modern Art").unwrap();
        let piece = store.add_art_piece(gallery.id, spec("Sketch", 40.0)).unwrap();

        store.remove_art_piece(piece.id).unwrap();
        assert!(store.get_gallery(gallery.id).unwrap().pieces.is_empty());

        assert_matches!(
            store.remove_art_piece(piece.id),
            Err(CatalogError::NotFound { entity: "art piece", .. })
        );
    }

    #[test]
    fn test_image_bytes_round_trip_untouched() {
        let mut store = store();
        let gallery = store.create_gallery("Modern Art").unwrap();

        let bytes: Vec<u8> = (0..=255).collect();
        let mut with_image = spec("Photograph", 90.0);
        with_image.image = Some(bytes.clone());

        let piece = store.add_art_piece(gallery.id, with_image).unwrap();
        assert_eq!(store.get_art_piece(piece.id).unwrap().image, Some(bytes));
    }

    #[test]
    fn test_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("catalog.db");

        let gallery_id = {
            let mut store = CatalogStore::open(&db_path).unwrap();
            let gallery = store.create_gallery("Modern Art").unwrap();
            store.add_art_piece(gallery.id, spec("Sketch", 40.0)).unwrap();
            gallery.id
        };

        let store = CatalogStore::open(&db_path).unwrap();
        let gallery = store.get_gallery(gallery_id).unwrap();
        assert_eq!(gallery.title, "Modern Art");
        assert_eq!(gallery.pieces.len(), 1);
    }
}
