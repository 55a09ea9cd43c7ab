/// Filtered, sorted views over a gallery's pieces
///
/// Pure functions of the gallery value passed in: nothing here touches
/// the database or mutates the gallery's stored order.

use serde::{Deserialize, Serialize};

use super::model::{ArtPiece, ArtPieceType, Gallery};

/// How a gallery tab orders its pieces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOption {
    DateNewToOld,
    DateOldToNew,
    PriceHighToLow,
    PriceLowToHigh,
}

/// Produce the pieces of `gallery` matching `kind`, ordered by `sort`.
///
/// Sorting is stable, so pieces that compare equal keep their insertion
/// order. An absent acquisition date compares as the earliest possible
/// value: undated pieces come last under newest-first and first under
/// oldest-first.
pub fn view_pieces(gallery: &Gallery, kind: ArtPieceType, sort: SortOption) -> Vec<&ArtPiece> {
    let mut pieces: Vec<&ArtPiece> = gallery.pieces.iter().filter(|p| p.kind == kind).collect();

    // Option<DateTime> already orders None first, which is exactly the
    // missing-date-as-distant-past rule
    match sort {
        SortOption::DateNewToOld => pieces.sort_by(|a, b| b.date_acquired.cmp(&a.date_acquired)),
        SortOption::DateOldToNew => pieces.sort_by(|a, b| a.date_acquired.cmp(&b.date_acquired)),
        SortOption::PriceHighToLow => pieces.sort_by(|a, b| b.price.total_cmp(&a.price)),
        SortOption::PriceLowToHigh => pieces.sort_by(|a, b| a.price.total_cmp(&b.price)),
    }

    pieces
}
