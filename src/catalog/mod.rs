/// Catalog module
///
/// This module holds the whole headless core:
/// - The SQLite-backed store and its CRUD operations (store.rs)
/// - Shared data structures (model.rs)
/// - Filtered/sorted views over a gallery's pieces (query.rs)

pub mod model;
pub mod query;
pub mod store;
