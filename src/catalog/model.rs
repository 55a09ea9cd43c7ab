/// Shared data structures for the catalog
///
/// These structs represent the data model that flows between
/// the database layer and the consuming presentation layer.
/// They carry no persistence concerns of their own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which tab/bucket an art piece belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtPieceType {
    /// Pieces already acquired; may carry an acquisition date
    #[default]
    Collection,
    /// Pieces being watched but not yet acquired; never dated
    Tracking,
}

impl ArtPieceType {
    /// Stable tag used for database storage and serialization
    pub fn as_str(self) -> &'static str {
        match self {
            ArtPieceType::Collection => "collection",
            ArtPieceType::Tracking => "tracking",
        }
    }
}

/// A named gallery ("Haus") and the pieces it owns
///
/// `pieces` is kept in insertion order, which is the default display
/// order before any sorting is applied. The gallery exclusively owns
/// its pieces: deleting the gallery deletes them with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gallery {
    /// Unique database ID
    pub id: i64,
    pub title: String,
    /// Set at creation, never updated
    pub created_at: DateTime<Utc>,
    /// Owned pieces, insertion order
    pub pieces: Vec<ArtPiece>,
}

impl Gallery {
    /// Number of owned pieces of the given kind (the home screen shows
    /// "N collected / N tracked" per gallery)
    pub fn count_of(&self, kind: ArtPieceType) -> usize {
        self.pieces.iter().filter(|p| p.kind == kind).count()
    }
}

/// A single art piece in a gallery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtPiece {
    /// Unique database ID
    pub id: i64,
    /// Owning gallery's ID; a lookup key, not an ownership pointer
    pub gallery_id: i64,
    pub kind: ArtPieceType,
    pub title: String,
    pub artist: String,
    /// Name of the gallery/dealer the piece came from; free text,
    /// unrelated to the owning `Gallery` entity
    pub source: String,
    /// Non-negative, currency-agnostic
    pub price: f64,
    /// Only `Collection` pieces carry a date; always `None` for `Tracking`
    pub date_acquired: Option<DateTime<Utc>>,
    /// Opaque image bytes; decoding and display are the consumer's concern
    pub image: Option<Vec<u8>>,
    /// Set at creation, never updated
    pub created_at: DateTime<Utc>,
}

/// Input for [`CatalogStore::add_art_piece`](crate::CatalogStore::add_art_piece)
///
/// A date supplied together with `kind = Tracking` is stored as absent,
/// mirroring the app's form behavior on both create and edit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtPieceSpec {
    pub kind: ArtPieceType,
    pub title: String,
    pub artist: String,
    pub source: String,
    pub price: f64,
    pub date_acquired: Option<DateTime<Utc>>,
    pub image: Option<Vec<u8>>,
}

/// Partial update for [`CatalogStore::update_art_piece`](crate::CatalogStore::update_art_piece)
///
/// `None` leaves a field untouched. The doubly-optional fields
/// distinguish "leave as is" (`None`) from "clear" (`Some(None)`).
/// Setting `gallery_id` moves the piece to another gallery; ownership
/// is replaced, never duplicated.
#[derive(Debug, Clone, Default)]
pub struct ArtPiecePatch {
    pub gallery_id: Option<i64>,
    pub kind: Option<ArtPieceType>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub source: Option<String>,
    pub price: Option<f64>,
    pub date_acquired: Option<Option<DateTime<Utc>>>,
    pub image: Option<Option<Vec<u8>>>,
}
