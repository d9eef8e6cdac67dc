//! Idle-timeout cache of open tile handles.
//!
//! [`HandleCache`] opens tile files lazily and keeps them mapped while they
//! are in use. Every access resets a handle's idle deadline; a handle that
//! sees no access for the configured timeout is closed. With a timeout of
//! zero or less, caching is disabled and each read opens and closes its own
//! handle.
//!
//! Opening is atomic per tile name, so concurrent readers of the same tile
//! share one handle. Readers hold their own reference to the handle, so an
//! eviction that races a read closes the file only after the read is done.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use moka::notification::RemovalCause;
use moka::sync::Cache;

use crate::error::{GlobeError, Result};
use crate::tile::TileHandle;

/// Longest idle timeout the cache honours; larger values are clamped.
pub const MAX_FILE_OPEN_TIMEOUT_MS: i64 = 365 * 24 * 60 * 60 * 1000;

/// Statistics about handle cache usage.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of handles currently open in the cache.
    pub open_handles: u64,
    /// Number of reads served by an already open handle.
    pub hit_count: u64,
    /// Number of reads that found no open handle.
    pub miss_count: u64,
    /// Number of tile files actually opened.
    pub opened_count: u64,
    /// Number of handles closed so far.
    pub closed_count: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

enum Mode {
    Disabled,
    Cached {
        handles: Cache<&'static str, Arc<TileHandle>>,
        _reaper: Reaper,
    },
}

/// Cache of open tile handles, keyed by tile name.
pub struct HandleCache {
    /// Directory the tile files are opened from.
    data_dir: PathBuf,
    mode: Mode,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    opened_count: AtomicU64,
    closed_count: Arc<AtomicU64>,
}

impl HandleCache {
    /// Create a cache for tiles in `data_dir`.
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Directory containing the tile files
    /// * `timeout_ms` - Idle time after which a handle is closed; `<= 0`
    ///   disables caching, values above [`MAX_FILE_OPEN_TIMEOUT_MS`] are
    ///   clamped to it
    /// * `capacity` - Maximum number of handles kept open
    ///
    /// # Errors
    ///
    /// Returns an error if the background reaper thread cannot be spawned.
    pub fn new<P: AsRef<Path>>(data_dir: P, timeout_ms: i64, capacity: u64) -> Result<Self> {
        let closed_count = Arc::new(AtomicU64::new(0));

        let mode = if timeout_ms <= 0 {
            Mode::Disabled
        } else {
            if timeout_ms > MAX_FILE_OPEN_TIMEOUT_MS {
                tracing::warn!(
                    timeout_ms,
                    max = MAX_FILE_OPEN_TIMEOUT_MS,
                    "File open timeout clamped"
                );
            }
            let timeout = Duration::from_millis(timeout_ms.min(MAX_FILE_OPEN_TIMEOUT_MS) as u64);
            let closed = Arc::clone(&closed_count);
            let handles = Cache::builder()
                .max_capacity(capacity)
                .time_to_idle(timeout)
                .eviction_listener(
                    move |name: Arc<&'static str>, _handle: Arc<TileHandle>, cause: RemovalCause| {
                        closed.fetch_add(1, Ordering::Relaxed);
                        tracing::debug!(tile = *name, cause = ?cause, "Closed tile handle");
                    },
                )
                .build();
            let reaper = Reaper::spawn(handles.clone(), timeout)?;

            Mode::Cached {
                handles,
                _reaper: reaper,
            }
        };

        Ok(Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            mode,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            opened_count: AtomicU64::new(0),
            closed_count,
        })
    }

    /// Run `f` with the handle for tile `name`, opening it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`GlobeError::DataFileMissing`] if the tile file cannot be
    /// opened, or any error returned by `f`.
    pub fn with_handle<T>(
        &self,
        name: &'static str,
        f: impl FnOnce(&TileHandle) -> Result<T>,
    ) -> Result<T> {
        match &self.mode {
            Mode::Disabled => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                let handle = self.open(name)?;
                let result = f(&handle);
                drop(handle);
                self.closed_count.fetch_add(1, Ordering::Relaxed);
                result
            }
            Mode::Cached { handles, .. } => {
                let handle = match handles.get(&name) {
                    Some(handle) => {
                        self.hit_count.fetch_add(1, Ordering::Relaxed);
                        handle
                    }
                    None => {
                        self.miss_count.fetch_add(1, Ordering::Relaxed);
                        handles
                            .try_get_with(name, || self.open(name).map(Arc::new))
                            .map_err(unshare)?
                    }
                };
                f(&handle)
            }
        }
    }

    /// Read the elevation sample at `offset` in tile `name`.
    pub fn read_sample(&self, name: &'static str, offset: u64) -> Result<i16> {
        self.with_handle(name, |handle| handle.read_sample(offset))
    }

    /// Close every open handle immediately.
    pub fn close_all(&self) {
        if let Mode::Cached { handles, .. } = &self.mode {
            handles.invalidate_all();
            handles.run_pending_tasks();
            tracing::debug!(data_dir = %self.data_dir.display(), "Closed all tile handles");
        }
    }

    /// Number of handles currently open.
    pub fn open_handles(&self) -> u64 {
        match &self.mode {
            Mode::Disabled => 0,
            Mode::Cached { handles, .. } => {
                handles.run_pending_tasks();
                handles.entry_count()
            }
        }
    }

    /// Whether handles are kept open between reads.
    pub fn is_enabled(&self) -> bool {
        matches!(self.mode, Mode::Cached { .. })
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            open_handles: self.open_handles(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            opened_count: self.opened_count.load(Ordering::Relaxed),
            closed_count: self.closed_count.load(Ordering::Relaxed),
        }
    }

    /// Directory the tile files are opened from.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn open(&self, name: &'static str) -> Result<TileHandle> {
        let path = self.data_dir.join(name);
        let handle = TileHandle::open(&path, name).map_err(|e| GlobeError::DataFileMissing {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        self.opened_count.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(tile = name, path = %path.display(), "Opened tile handle");
        Ok(handle)
    }
}

impl Drop for HandleCache {
    fn drop(&mut self) {
        self.close_all();
    }
}

/// Turn an error shared between concurrent openers back into an owned one.
fn unshare(err: Arc<GlobeError>) -> GlobeError {
    Arc::try_unwrap(err).unwrap_or_else(|shared| match &*shared {
        GlobeError::DataFileMissing { path, reason } => GlobeError::DataFileMissing {
            path: path.clone(),
            reason: reason.clone(),
        },
        other => GlobeError::Io(std::io::Error::other(other.to_string())),
    })
}

/// Background thread that closes idle handles.
///
/// Expired entries are otherwise only cleaned up when the cache is touched;
/// the reaper runs that maintenance periodically so idle files get closed
/// without further traffic.
struct Reaper {
    stop: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Reaper {
    fn spawn(handles: Cache<&'static str, Arc<TileHandle>>, timeout: Duration) -> Result<Self> {
        let interval = (timeout / 4).clamp(Duration::from_millis(5), Duration::from_secs(1));
        let (stop, stopped) = mpsc::channel::<()>();

        let thread = std::thread::Builder::new()
            .name("globe-reaper".to_string())
            .spawn(move || loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => handles.run_pending_tasks(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        Ok(Self {
            stop: Some(stop),
            thread: Some(thread),
        })
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        // Dropping the sender disconnects the channel and ends the loop
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread;
    use tempfile::TempDir;

    fn create_test_tile(dir: &Path, name: &str, values: &[i16]) {
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        fs::write(dir.join(name), data).unwrap();
    }

    #[test]
    fn test_cached_reads_reuse_handle() {
        let temp_dir = TempDir::new().unwrap();
        create_test_tile(temp_dir.path(), "a10g", &[10, 20, 30]);

        let cache = HandleCache::new(temp_dir.path(), 60_000, 16).unwrap();
        assert!(cache.is_enabled());

        assert_eq!(cache.read_sample("a10g", 0).unwrap(), 10);
        assert_eq!(cache.read_sample("a10g", 4).unwrap(), 30);

        let stats = cache.stats();
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.opened_count, 1);
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.open_handles, 1);
        assert_eq!(stats.closed_count, 0);
    }

    #[test]
    fn test_idle_handles_are_closed() {
        let temp_dir = TempDir::new().unwrap();
        create_test_tile(temp_dir.path(), "a10g", &[10]);

        let cache = HandleCache::new(temp_dir.path(), 50, 16).unwrap();
        cache.read_sample("a10g", 0).unwrap();
        assert_eq!(cache.open_handles(), 1);

        thread::sleep(Duration::from_millis(400));

        let stats = cache.stats();
        assert_eq!(stats.open_handles, 0);
        assert_eq!(stats.closed_count, 1);

        // Reopened on next use
        assert_eq!(cache.read_sample("a10g", 0).unwrap(), 10);
        assert_eq!(cache.stats().miss_count, 2);
    }

    #[test]
    fn test_access_resets_idle_deadline() {
        let temp_dir = TempDir::new().unwrap();
        create_test_tile(temp_dir.path(), "a10g", &[10]);

        let cache = HandleCache::new(temp_dir.path(), 300, 16).unwrap();
        for _ in 0..6 {
            cache.read_sample("a10g", 0).unwrap();
            thread::sleep(Duration::from_millis(100));
        }

        // 600ms in total, but never idle for 300ms
        let stats = cache.stats();
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.hit_count, 5);
        assert_eq!(stats.closed_count, 0);
    }

    #[test]
    fn test_disabled_cache_opens_per_read() {
        let temp_dir = TempDir::new().unwrap();
        create_test_tile(temp_dir.path(), "a10g", &[10, 20]);

        for timeout in [0, -1] {
            let cache = HandleCache::new(temp_dir.path(), timeout, 16).unwrap();
            assert!(!cache.is_enabled());

            assert_eq!(cache.read_sample("a10g", 0).unwrap(), 10);
            assert_eq!(cache.read_sample("a10g", 2).unwrap(), 20);

            let stats = cache.stats();
            assert_eq!(stats.open_handles, 0);
            assert_eq!(stats.miss_count, 2);
            assert_eq!(stats.opened_count, 2);
            assert_eq!(stats.hit_count, 0);
            assert_eq!(stats.closed_count, 2);
        }
    }

    #[test]
    fn test_close_all() {
        let temp_dir = TempDir::new().unwrap();
        create_test_tile(temp_dir.path(), "a10g", &[10]);
        create_test_tile(temp_dir.path(), "b10g", &[20]);

        let cache = HandleCache::new(temp_dir.path(), 60_000, 16).unwrap();
        cache.read_sample("a10g", 0).unwrap();
        cache.read_sample("b10g", 0).unwrap();
        assert_eq!(cache.open_handles(), 2);

        cache.close_all();
        let stats = cache.stats();
        assert_eq!(stats.open_handles, 0);
        assert_eq!(stats.closed_count, 2);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();

        for timeout in [60_000, 0] {
            let cache = HandleCache::new(temp_dir.path(), timeout, 16).unwrap();
            match cache.read_sample("a10g", 0) {
                Err(GlobeError::DataFileMissing { path, .. }) => {
                    assert_eq!(path, temp_dir.path().join("a10g"));
                }
                other => panic!("Expected DataFileMissing, got {:?}", other),
            }
            assert_eq!(cache.open_handles(), 0);
        }
    }

    #[test]
    fn test_concurrent_readers_share_one_handle() {
        let temp_dir = TempDir::new().unwrap();
        create_test_tile(temp_dir.path(), "a10g", &[7; 64]);

        let cache = Arc::new(HandleCache::new(temp_dir.path(), 60_000, 16).unwrap());
        let workers: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for j in 0..50u64 {
                        let offset = ((i * 50 + j) % 64) * 2;
                        assert_eq!(cache.read_sample("a10g", offset).unwrap(), 7);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.open_handles, 1);
        assert_eq!(stats.opened_count, 1);
        assert_eq!(stats.closed_count, 0);
        assert_eq!(stats.hit_count + stats.miss_count, 400);
    }

    #[test]
    fn test_huge_timeout_is_clamped() {
        let temp_dir = TempDir::new().unwrap();
        create_test_tile(temp_dir.path(), "a10g", &[10]);

        for timeout in [i64::MAX, MAX_FILE_OPEN_TIMEOUT_MS + 1] {
            let cache = HandleCache::new(temp_dir.path(), timeout, 16).unwrap();
            assert!(cache.is_enabled());
            assert_eq!(cache.read_sample("a10g", 0).unwrap(), 10);
            assert_eq!(cache.open_handles(), 1);
        }
    }

    #[test]
    fn test_missing_file_is_not_counted_as_opened() {
        let temp_dir = TempDir::new().unwrap();

        let cache = HandleCache::new(temp_dir.path(), 60_000, 16).unwrap();
        assert!(cache.read_sample("a10g", 0).is_err());

        let stats = cache.stats();
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.opened_count, 0);
    }

    #[test]
    fn test_short_read_propagates() {
        let temp_dir = TempDir::new().unwrap();
        create_test_tile(temp_dir.path(), "a10g", &[10]);

        let cache = HandleCache::new(temp_dir.path(), 60_000, 16).unwrap();
        assert!(matches!(
            cache.read_sample("a10g", 2),
            Err(GlobeError::ShortRead { .. })
        ));
    }

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            open_handles: 2,
            hit_count: 80,
            miss_count: 20,
            opened_count: 20,
            closed_count: 0,
        };

        assert_eq!(stats.hit_rate(), 0.8);

        let empty_stats = CacheStats::default();
        assert_eq!(empty_stats.hit_rate(), 0.0);
    }
}
