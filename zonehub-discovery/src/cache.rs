//! Durable key/value store for previously discovered device addresses.
//!
//! Addresses are long-lived on a home network, so there is no eviction beyond
//! an explicit [`AddressCache::clear`]. An unavailable or corrupt backing
//! store is treated as a cache miss, never a hard failure.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;

/// Versioned key under which the discovered address set is stored.
pub const ADDRESS_CACHE_KEY: &str = "device-addresses-1.0";

/// Key/value store of discovered device address sets.
///
/// The API is deliberately infallible: implementations recover from backend
/// failures by reporting a miss.
pub trait AddressCache: Send {
    /// Check whether a value exists for `key`.
    fn contains(&self, key: &str) -> bool;

    /// Fetch the address set stored under `key`, if any.
    fn fetch(&self, key: &str) -> Option<BTreeSet<Ipv4Addr>>;

    /// Store `addresses` under `key`, replacing any previous value.
    fn save(&self, key: &str, addresses: &BTreeSet<Ipv4Addr>);

    /// Drop all stored values.
    fn clear(&self);
}

/// A shared cache handle is itself a cache.
impl<C: AddressCache + Sync> AddressCache for std::sync::Arc<C> {
    fn contains(&self, key: &str) -> bool {
        (**self).contains(key)
    }

    fn fetch(&self, key: &str) -> Option<BTreeSet<Ipv4Addr>> {
        (**self).fetch(key)
    }

    fn save(&self, key: &str, addresses: &BTreeSet<Ipv4Addr>) {
        (**self).save(key, addresses)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

/// In-memory cache, for tests and callers that manage persistence themselves.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, BTreeSet<Ipv4Addr>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, BTreeSet<Ipv4Addr>>> {
        // A poisoned lock only means a writer panicked mid-update; the map
        // itself is still a valid address set.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AddressCache for MemoryCache {
    fn contains(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }

    fn fetch(&self, key: &str) -> Option<BTreeSet<Ipv4Addr>> {
        self.entries().get(key).cloned()
    }

    fn save(&self, key: &str, addresses: &BTreeSet<Ipv4Addr>) {
        self.entries().insert(key.to_string(), addresses.clone());
    }

    fn clear(&self) {
        self.entries().clear();
    }
}

/// File-backed cache storing the address sets as a single JSON document.
///
/// Survives process restarts. Read or write failures are logged and treated
/// as a miss.
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    io: Mutex<()>,
}

impl FileCache {
    /// Create a cache backed by the given file path. The file is created on
    /// first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io: Mutex::new(()),
        }
    }

    /// Cache in the system temporary directory, shared across runs.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir().join("zonehub-addresses.json"))
    }

    fn load(&self) -> HashMap<String, BTreeSet<Ipv4Addr>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "address cache unreadable, treating as empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        }
    }

    fn store(&self, map: &HashMap<String, BTreeSet<Ipv4Addr>>) {
        let json = match serde_json::to_string(map) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize address cache");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, json) {
            warn!(path = %self.path.display(), error = %e, "failed to write address cache");
        }
    }
}

impl AddressCache for FileCache {
    fn contains(&self, key: &str) -> bool {
        let _guard = self.io.lock().unwrap_or_else(|e| e.into_inner());
        self.load().contains_key(key)
    }

    fn fetch(&self, key: &str) -> Option<BTreeSet<Ipv4Addr>> {
        let _guard = self.io.lock().unwrap_or_else(|e| e.into_inner());
        self.load().remove(key)
    }

    fn save(&self, key: &str, addresses: &BTreeSet<Ipv4Addr>) {
        let _guard = self.io.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.load();
        map.insert(key.to_string(), addresses.clone());
        self.store(&map);
    }

    fn clear(&self) {
        let _guard = self.io.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to clear address cache");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addrs(list: &[[u8; 4]]) -> BTreeSet<Ipv4Addr> {
        list.iter()
            .map(|o| Ipv4Addr::new(o[0], o[1], o[2], o[3]))
            .collect()
    }

    #[test]
    fn memory_cache_round_trip() {
        let cache = MemoryCache::new();
        let saved = addrs(&[[10, 0, 0, 5], [10, 0, 0, 7]]);

        assert!(!cache.contains(ADDRESS_CACHE_KEY));
        cache.save(ADDRESS_CACHE_KEY, &saved);

        assert!(cache.contains(ADDRESS_CACHE_KEY));
        assert_eq!(cache.fetch(ADDRESS_CACHE_KEY), Some(saved));
    }

    #[test]
    fn memory_cache_clear() {
        let cache = MemoryCache::new();
        cache.save(ADDRESS_CACHE_KEY, &addrs(&[[192, 168, 1, 4]]));
        cache.clear();
        assert!(!cache.contains(ADDRESS_CACHE_KEY));
        assert_eq!(cache.fetch(ADDRESS_CACHE_KEY), None);
    }

    #[test]
    fn file_cache_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "zonehub-cache-test-{}.json",
            std::process::id()
        ));
        let cache = FileCache::new(&path);
        cache.clear();

        let saved = addrs(&[[10, 0, 0, 5], [10, 0, 0, 6]]);
        cache.save(ADDRESS_CACHE_KEY, &saved);
        assert_eq!(cache.fetch(ADDRESS_CACHE_KEY), Some(saved));

        cache.clear();
        assert!(!cache.contains(ADDRESS_CACHE_KEY));
    }

    #[test]
    fn file_cache_corrupt_file_is_a_miss() {
        let path = std::env::temp_dir().join(format!(
            "zonehub-cache-corrupt-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "not json at all").unwrap();

        let cache = FileCache::new(&path);
        assert_eq!(cache.fetch(ADDRESS_CACHE_KEY), None);

        // The cache stays usable after the corrupt read.
        let saved = addrs(&[[10, 0, 0, 9]]);
        cache.save(ADDRESS_CACHE_KEY, &saved);
        assert_eq!(cache.fetch(ADDRESS_CACHE_KEY), Some(saved));
        cache.clear();
    }
}
