//! Local caching module for offline data access.
//!
//! The teacher list is cached as JSON text under the single key
//! `"teachers"`. `KeyValueStore` is the storage seam: `FileStore` keeps one
//! file per key in the cache directory, `MemoryStore` keeps entries in
//! memory. Caching is best-effort; failures are logged, never returned.

pub mod store;
pub mod teachers;

pub use store::{CacheError, FileStore, KeyValueStore, MemoryStore};
pub use teachers::{CachedData, TeacherCache, TEACHERS_KEY};
