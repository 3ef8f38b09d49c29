//! Store backends for scan results.
//!
//! - [`TtlCache`]: in-process cache with per-entry expiry.
//! - [`SqliteStore`]: one table per subnet in a local SQLite file.
//! - [`JsonlDocumentStore`]: one JSON document per scan, appended to a file per subnet.

pub mod cache;
pub mod documents;
pub mod sqlite;

pub use cache::TtlCache;
pub use documents::JsonlDocumentStore;
pub use sqlite::SqliteStore;
