//! Persistent key/value store backed by a single file
//!
//! Every public operation reads the whole backing file. Mutations then write
//! the whole, newly computed mapping back through an atomic rename, so the cost
//! of each call grows linearly with the number of entries in the store.
//!
//! ## Concurrency
//!
//! There is no in-process locking. Two writers racing on the same file (other
//! threads, other processes, or two `Store` values with the same safe name)
//! can interleave their load/persist pairs, and the last persist wins without
//! merging. Enable [`StoreConfig::locking`] to serialize writers that share a
//! file through an advisory lock. Readers never observe a torn file either way.

use crate::cache_file::CacheFile;
use crate::clock::{Clock, SystemClock};
use crate::config::{StoreBuilder, StoreConfig};
use crate::entry::{ttl_seconds, Entry};
use crate::keys;
use crate::paths;
use crate::snapshot::Snapshot;
use filecache_core::{Error, Result};
use filecache_utils::ensure_directory;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

/// A named cache bound to one backing file
#[derive(Debug, Clone)]
pub struct Store {
    config: StoreConfig,
    clock: Arc<dyn Clock>,
}

impl Store {
    /// Store `name` under `directory` with the default `.cache` extension
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self::from_config(StoreConfig::new(name, directory))
    }

    /// Store `name` under `directory` with a custom extension
    pub fn with_extension(
        name: impl Into<String>,
        directory: impl Into<PathBuf>,
        extension: impl Into<String>,
    ) -> Self {
        let mut config = StoreConfig::new(name, directory);
        config.extension = extension.into();
        Self::from_config(config)
    }

    pub fn builder(name: impl Into<String>, directory: impl Into<PathBuf>) -> StoreBuilder {
        StoreBuilder::new(name, directory)
    }

    pub fn from_config(config: StoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub(crate) fn with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.config.name = name.into();
    }

    pub fn directory(&self) -> &Path {
        &self.config.directory
    }

    pub fn set_directory(&mut self, directory: impl Into<PathBuf>) {
        self.config.directory = directory.into();
    }

    pub fn extension(&self) -> &str {
        &self.config.extension
    }

    pub fn set_extension(&mut self, extension: impl Into<String>) {
        self.config.extension = extension.into();
    }

    pub fn is_sharded(&self) -> bool {
        self.config.sharded
    }

    pub fn set_sharded(&mut self, sharded: bool) {
        self.config.sharded = sharded;
    }

    /// Sanitized store name used in paths
    pub fn safe_name(&self) -> String {
        self.config.safe_name()
    }

    /// Directory holding the backing file, including shard directories
    ///
    /// Pure path computation; nothing is created.
    pub fn store_directory(&self) -> PathBuf {
        paths::store_directory(&self.config.directory, &self.safe_name(), self.config.sharded)
    }

    /// Path of the backing file, creating its directory tree if needed
    pub fn cache_file_path(&self) -> Result<PathBuf> {
        Ok(self.prepare()?.path().to_path_buf())
    }

    /// Stable hex key derived from arbitrary input
    pub fn generate_cache_key(input: &str) -> String {
        keys::generate_cache_key(input)
    }

    /// Whether `key` is present, expired or not
    pub fn is_cached(&self, key: &str) -> Result<bool> {
        Ok(self
            .load()?
            .is_some_and(|snapshot| snapshot.contains_key(key)))
    }

    /// Store `value` under `key` without expiry
    pub fn store<T>(&self, key: &str, value: &T) -> Result<&Self>
    where
        T: Serialize + ?Sized,
    {
        self.store_with_ttl(key, value, Duration::ZERO)
    }

    /// Store `value` under `key`, expiring `ttl` after now
    ///
    /// A zero `ttl` never expires; sub-second TTLs count as one second.
    pub fn store_with_ttl<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<&Self>
    where
        T: Serialize + ?Sized,
    {
        let entry = Entry::encode(key, value, self.clock.now(), ttl_seconds(ttl))?;
        let ttl = entry.ttl;

        self.transact(|current| {
            let mut snapshot = current.unwrap_or_default();
            snapshot.insert(key, entry);
            Ok((Some(snapshot), ()))
        })?;

        debug!(store = %self.config.name, key, ttl, "Stored cache entry");
        Ok(self)
    }

    /// Value stored under `key`, without consulting its TTL
    pub fn retrieve<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(snapshot) = self.load()? else {
            return Ok(None);
        };
        snapshot.get(key).map(|entry| entry.decode(key)).transpose()
    }

    /// Unix timestamp at which `key` was written
    pub fn retrieve_timestamp(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.retrieve_entry(key)?.map(|entry| entry.stored_at))
    }

    /// Raw entry for `key`, including its metadata
    pub fn retrieve_entry(&self, key: &str) -> Result<Option<Entry>> {
        Ok(self
            .load()?
            .and_then(|snapshot| snapshot.get(key).cloned()))
    }

    /// Every value in the store, expired or not, in insertion order
    ///
    /// All values must decode into `T`; use `serde_json::Value` for stores
    /// holding values of different shapes.
    pub fn retrieve_all<T>(&self) -> Result<IndexMap<String, T>>
    where
        T: DeserializeOwned,
    {
        let Some(snapshot) = self.load()? else {
            return Ok(IndexMap::new());
        };
        snapshot
            .iter()
            .map(|(key, entry)| entry.decode(key).map(|value| (key.clone(), value)))
            .collect()
    }

    /// Every entry with its metadata, unfiltered
    pub fn retrieve_all_entries(&self) -> Result<IndexMap<String, Entry>> {
        Ok(self
            .load()?
            .map(Snapshot::into_entries)
            .unwrap_or_default())
    }

    /// Whether `key` is present but past its TTL
    ///
    /// Nothing is removed; see [`Store::erase_expired`].
    pub fn is_expired(&self, key: &str) -> Result<bool> {
        let now = self.clock.now();
        Ok(self
            .retrieve_entry(key)?
            .is_some_and(|entry| entry.is_expired_at(now)))
    }

    /// Remove `key`, failing with `Error::KeyNotFound` if the store or key is absent
    pub fn erase(&self, key: &str) -> Result<&Self> {
        self.transact(|current| {
            let mut snapshot = current.ok_or_else(|| Error::key_not_found(key))?;
            snapshot.remove(key)?;
            Ok((Some(snapshot), ()))
        })?;

        debug!(store = %self.config.name, key, "Erased cache entry");
        Ok(self)
    }

    /// Remove every expired entry and return how many were removed
    ///
    /// The file is only rewritten when something was removed.
    pub fn erase_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let removed = self.transact(|current| {
            let Some(mut snapshot) = current else {
                return Ok((None, 0));
            };
            let removed = snapshot.sweep_expired(now);
            Ok(((removed > 0).then_some(snapshot), removed))
        })?;

        if removed > 0 {
            info!(store = %self.config.name, removed, "Erased expired cache entries");
        }
        Ok(removed)
    }

    /// Empty the store by truncating the backing file
    ///
    /// The file and its directories stay in place. A store without a backing
    /// file is left as is.
    pub fn erase_all(&self) -> Result<&Self> {
        let file = self.prepare()?;
        let _lock = self.lock(&file)?;

        if file.truncate()? {
            info!(store = %self.config.name, path = %file.path().display(), "Erased all cache entries");
        }
        Ok(self)
    }

    /// Resolve the backing file without creating anything
    fn cache_file(&self) -> Result<CacheFile> {
        self.config.validate()?;
        let safe_name = self.safe_name();
        let path = self
            .store_directory()
            .join(paths::cache_file_name(&safe_name, &self.config.extension));

        if safe_name != self.config.name {
            trace!(name = %self.config.name, safe_name = %safe_name, "Sanitized store name");
        }
        Ok(CacheFile::new(path, self.config.corrupt_policy))
    }

    /// Resolve the backing file and make sure its directory is usable
    fn prepare(&self) -> Result<CacheFile> {
        let file = self.cache_file()?;
        ensure_directory(&self.store_directory())?;
        Ok(file)
    }

    fn lock(&self, file: &CacheFile) -> Result<Option<filecache_utils::FileLock>> {
        if self.config.locking {
            file.lock().map(Some)
        } else {
            Ok(None)
        }
    }

    fn load(&self) -> Result<Option<Snapshot>> {
        self.cache_file()?.load()
    }

    /// One load-apply-persist cycle
    ///
    /// `apply` gets the current snapshot (`None` when there is no file) and
    /// returns the snapshot to persist, or `None` to leave the file untouched.
    fn transact<R, F>(&self, apply: F) -> Result<R>
    where
        F: FnOnce(Option<Snapshot>) -> Result<(Option<Snapshot>, R)>,
    {
        let file = self.prepare()?;
        let _lock = self.lock(&file)?;

        let current = file.load()?;
        let (next, output) = apply(current)?;
        if let Some(next) = next {
            file.persist(&next)?;
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn store_with_clock(dir: &Path, clock: Arc<ManualClock>) -> Store {
        Store::builder("demo", dir).clock(clock).build().unwrap()
    }

    #[test]
    fn test_backing_file_created_lazily() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("var").join("cache");
        let store = Store::new("testCanCreateCache", &base);

        assert!(!store.is_cached("test").unwrap());
        assert!(!base.exists());

        store.store("test", "test").unwrap();
        assert!(base.join("testcancreatecache.cache").is_file());
    }

    #[test]
    fn test_mixed_values_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::new("testCanCacheDataRight", temp_dir.path());

        store
            .store("string", "test")
            .unwrap()
            .store("integer", &10)
            .unwrap()
            .store("float", &10.5)
            .unwrap()
            .store("array", &json!({"test1": "test1", "test2": "test2"}))
            .unwrap();

        assert_eq!(store.retrieve::<String>("string").unwrap().as_deref(), Some("test"));
        assert_eq!(store.retrieve::<i64>("integer").unwrap(), Some(10));
        assert_eq!(store.retrieve::<f64>("float").unwrap(), Some(10.5));

        let array: IndexMap<String, String> = store.retrieve("array").unwrap().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array["test1"], "test1");
    }

    #[test]
    fn test_retrieve_ignores_ttl() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(1_000));
        let store = store_with_clock(temp_dir.path(), clock.clone());

        store
            .store_with_ttl("k", "v", Duration::from_secs(5))
            .unwrap();
        clock.advance(60);

        assert!(store.is_expired("k").unwrap());
        assert!(store.is_cached("k").unwrap());
        assert_eq!(store.retrieve::<String>("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_timestamp_and_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let store = store_with_clock(temp_dir.path(), clock);

        store
            .store_with_ttl("k", &[1, 2, 3], Duration::from_secs(90))
            .unwrap();

        assert_eq!(store.retrieve_timestamp("k").unwrap(), Some(1_700_000_000));
        let entries = store.retrieve_all_entries().unwrap();
        assert_eq!(entries["k"].stored_at, 1_700_000_000);
        assert_eq!(entries["k"].ttl, 90);
        assert_eq!(store.retrieve_timestamp("missing").unwrap(), None);
    }

    #[test]
    fn test_erase_expired_skips_rewrite_when_nothing_expired() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(0));
        let store = store_with_clock(temp_dir.path(), clock);

        store.store("forever", &1).unwrap();
        let path = store.cache_file_path().unwrap();
        // hand-edit the file; a rewrite would normalize the formatting away
        let raw = format!("{}\n", fs::read_to_string(&path).unwrap());
        fs::write(&path, &raw).unwrap();

        assert_eq!(store.erase_expired().unwrap(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), raw);
    }

    #[test]
    fn test_erase_expired_on_absent_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::new("demo", temp_dir.path());
        assert_eq!(store.erase_expired().unwrap(), 0);
        assert!(!store.cache_file_path().unwrap().exists());
    }

    #[test]
    fn test_setters_retarget_backing_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = Store::new("first", temp_dir.path());
        store.store("k", &1).unwrap();

        store.set_name("second");
        assert!(!store.is_cached("k").unwrap());

        store.set_extension(".json");
        store.store("k", &2).unwrap();
        assert!(temp_dir.path().join("second.json").is_file());

        store.set_sharded(true);
        assert_eq!(store.store_directory(), temp_dir.path().join("se").join("ec").join("co"));
        assert!(!store.is_cached("k").unwrap());

        store.set_sharded(false);
        store.set_name("first");
        store.set_extension(".cache");
        assert_eq!(store.retrieve::<i32>("k").unwrap(), Some(1));

        let other = TempDir::new().unwrap();
        store.set_directory(other.path());
        assert_eq!(store.directory(), other.path());
        assert!(!store.is_cached("k").unwrap());
    }

    #[test]
    fn test_invalid_name_fails_every_operation() {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::new("!!!", temp_dir.path());

        assert!(matches!(store.is_cached("k"), Err(Error::InvalidName { .. })));
        assert!(matches!(store.store("k", &1), Err(Error::InvalidName { .. })));
        assert!(matches!(store.cache_file_path(), Err(Error::InvalidName { .. })));
    }

    #[test]
    fn test_empty_directory_resolves_to_current_directory() {
        let store = Store::new("demo", "");

        assert_eq!(store.store_directory(), PathBuf::from("."));
        // resolving the path checks "." instead of an empty path
        assert_eq!(store.cache_file_path().unwrap(), PathBuf::from("./demo.cache"));
    }

    #[test]
    fn test_locking_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::builder("locked", temp_dir.path())
            .locking(true)
            .build()
            .unwrap();

        store.store("a", &1).unwrap().erase("a").unwrap();
        store.erase_all().unwrap();
        assert!(temp_dir.path().join("locked.cache.lock").exists());
        assert!(store.retrieve_all::<i32>().unwrap().is_empty());
    }
}
