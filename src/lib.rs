//! Headless catalog core for the arthaus art collection app.
//!
//! Users organize art into named galleries ("Haus") and file each piece
//! either in their collection or on a tracking watchlist. This crate owns
//! the persisted data model and the query logic over it; rendering,
//! gestures, and image decoding belong to whatever front end consumes it.
//!
//! ```no_run
//! use arthaus_core::{ArtPieceSpec, ArtPieceType, CatalogStore, SortOption};
//!
//! # fn main() -> arthaus_core::Result<()> {
//! let mut store = CatalogStore::open_in_memory()?;
//! let gallery = store.create_gallery("Modern Art")?;
//! store.add_art_piece(
//!     gallery.id,
//!     ArtPieceSpec {
//!         title: "The Ten Largest, No. 7".into(),
//!         artist: "Hilma af Klint".into(),
//!         price: 1500.0,
//!         ..Default::default()
//!     },
//! )?;
//!
//! let gallery = store.get_gallery(gallery.id)?;
//! let wall = arthaus_core::view_pieces(&gallery, ArtPieceType::Collection, SortOption::DateNewToOld);
//! # let _ = wall;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod error;

pub use catalog::model::{ArtPiece, ArtPiecePatch, ArtPieceSpec, ArtPieceType, Gallery};
pub use catalog::query::{view_pieces, SortOption};
pub use catalog::store::CatalogStore;
pub use error::{CatalogError, Result};
