use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::Teacher;

use super::KeyValueStore;

/// Fixed key the teacher snapshot lives under.
pub const TEACHERS_KEY: &str = "teachers";

/// Consider the snapshot stale after 1 hour.
const CACHE_STALE_MINUTES: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

/// Snapshot as found in storage. Older snapshots are a bare list.
#[derive(Deserialize)]
#[serde(untagged)]
enum Snapshot {
    Stamped(CachedData<Vec<Teacher>>),
    Bare(Vec<Teacher>),
}

/// Typed, best-effort access to the cached teacher list.
///
/// Nothing here fails: unreadable or unparseable snapshots are logged and
/// treated as absent, failed writes are logged and dropped.
pub struct TeacherCache<C> {
    store: C,
}

impl<C: KeyValueStore> TeacherCache<C> {
    pub fn new(store: C) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    fn load(&self) -> Option<Snapshot> {
        let text = match self.store.get(TEACHERS_KEY) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = TEACHERS_KEY, error = %e, "Failed to read teacher cache");
                return None;
            }
        };

        match serde_json::from_str::<Snapshot>(&text) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(key = TEACHERS_KEY, error = %e, "Failed to parse teacher cache, ignoring it");
                None
            }
        }
    }

    /// The cached teacher list, if any.
    pub fn read(&self) -> Option<Vec<Teacher>> {
        let teachers = match self.load()? {
            Snapshot::Stamped(cached) => cached.data,
            Snapshot::Bare(list) => list,
        };
        debug!(count = teachers.len(), "Loaded teachers from cache");
        Some(teachers)
    }

    /// Replace the cached list.
    pub fn write(&self, teachers: &[Teacher]) {
        let text = match serde_json::to_string(&CachedData::new(teachers)) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to serialize teachers for cache");
                return;
            }
        };
        if let Err(e) = self.store.set(TEACHERS_KEY, &text) {
            warn!(key = TEACHERS_KEY, error = %e, "Failed to write teacher cache");
        }
    }

    /// When the snapshot was written, for snapshots that record it.
    pub fn cached_at(&self) -> Option<CachedData<usize>> {
        match self.load()? {
            Snapshot::Stamped(cached) => Some(CachedData {
                data: cached.data.len(),
                cached_at: cached.cached_at,
            }),
            Snapshot::Bare(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheError, MemoryStore};
    use crate::models::RecordId;
    use chrono::Duration;

    fn teacher(id: &str) -> Teacher {
        serde_json::from_value(serde_json::json!({"id": id, "code": format!("GV-{}", id)})).unwrap()
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Io(std::io::Error::other("disk gone")))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), CacheError> {
            Err(CacheError::Io(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn test_cached_data_age_display_just_now() {
        let cached = CachedData::new(vec![1, 2, 3]);
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_cached_data_age_display_rounding() {
        let mut cached = CachedData::new(());
        cached.cached_at = Utc::now() - Duration::minutes(5);
        assert_eq!(cached.age_display(), "5m ago");
        cached.cached_at = Utc::now() - Duration::minutes(95);
        assert_eq!(cached.age_display(), "2h ago");
        cached.cached_at = Utc::now() - Duration::hours(30);
        assert_eq!(cached.age_display(), "1d ago");
    }

    #[test]
    fn test_cached_data_is_stale() {
        let fresh = CachedData::new(vec![1]);
        assert!(!fresh.is_stale());

        let mut old = CachedData::new(vec![1]);
        old.cached_at = Utc::now() - Duration::minutes(61);
        assert!(old.is_stale());
    }

    #[test]
    fn test_write_then_read() {
        let cache = TeacherCache::new(MemoryStore::new());
        assert!(cache.read().is_none());

        cache.write(&[teacher("a"), teacher("b")]);
        let read = cache.read().unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[1].id, RecordId::new("b"));

        let stamp = cache.cached_at().unwrap();
        assert_eq!(stamp.data, 2);
        assert_eq!(stamp.age_display(), "just now");
    }

    #[test]
    fn test_reads_bare_legacy_list() {
        let store = MemoryStore::with_entry(TEACHERS_KEY, r#"[{"_id": {"$oid": "x"}, "code": "GV1"}]"#);
        let cache = TeacherCache::new(store);
        let read = cache.read().unwrap();
        assert_eq!(read[0].id, "x");
        assert!(cache.cached_at().is_none());
    }

    #[test]
    fn test_corrupt_snapshot_is_absent() {
        let cache = TeacherCache::new(MemoryStore::with_entry(TEACHERS_KEY, "{not json"));
        assert!(cache.read().is_none());
    }

    #[test]
    fn test_storage_failures_are_swallowed() {
        let cache = TeacherCache::new(BrokenStore);
        assert!(cache.read().is_none());
        cache.write(&[teacher("a")]);
    }
}
