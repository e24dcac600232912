//! Cache of compiled grammars
//!
//! Compiling a grammar is the only expensive step before a scan, so scanners
//! built from the same grammar can share one [`PegMatcher`]. Entries for
//! grammar files are recompiled when the file changes on disk.

use crate::grammar::{compile, GrammarError, GrammarOptions, GrammarSource};
use crate::native_parser::PegMatcher;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::SystemTime;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 64;

static SHARED: OnceLock<ParserCache> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    File(PathBuf, bool),
    Text(String, bool),
}

impl CacheKey {
    fn new(source: &GrammarSource, options: &GrammarOptions) -> Self {
        match source {
            GrammarSource::File(path) => CacheKey::File(path.clone(), options.modular),
            GrammarSource::Text(text) => CacheKey::Text(text.clone(), options.modular),
        }
    }
}

struct CachedMatcher {
    compiled_at: SystemTime,
    matcher: Arc<PegMatcher>,
}

impl CachedMatcher {
    /// Inline text never changes; a file is stale once it is newer than the
    /// compiled matcher, or when it can no longer be read.
    fn is_stale(&self, key: &CacheKey) -> bool {
        match key {
            CacheKey::Text(..) => false,
            CacheKey::File(path, _) => modified(path).map_or(true, |m| m > self.compiled_at),
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Compiled matchers keyed by grammar source, least recently used evicted
/// first
pub struct ParserCache {
    entries: Mutex<LruCache<CacheKey, CachedMatcher>>,
}

impl ParserCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        ParserCache {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Process-wide cache for front ends that have nowhere to keep one
    pub fn shared() -> &'static ParserCache {
        SHARED.get_or_init(ParserCache::default)
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, CachedMatcher>> {
        // A panic while compiling leaves the map itself intact
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the cached matcher for `source`, compiling it first if it is
    /// missing or stale. The lock is held while compiling, so concurrent
    /// callers for one grammar compile it once.
    pub fn get_or_compile(
        &self,
        source: &GrammarSource,
        options: &GrammarOptions,
    ) -> Result<Arc<PegMatcher>, GrammarError> {
        let key = CacheKey::new(source, options);
        let mut entries = self.lock();

        if let Some(entry) = entries.get(&key) {
            if !entry.is_stale(&key) {
                debug!("Grammar cache hit");
                return Ok(Arc::clone(&entry.matcher));
            }
            debug!("Cached grammar is out of date");
        } else {
            debug!("Grammar cache miss");
        }

        let compiled_at = SystemTime::now();
        let matcher = Arc::new(compile(source, options)?);
        entries.put(
            key,
            CachedMatcher {
                compiled_at,
                matcher: Arc::clone(&matcher),
            },
        );
        Ok(matcher)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Default for ParserCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    #[test]
    fn test_text_hit() {
        let cache = ParserCache::new(4);
        let source = GrammarSource::text("num <- +[0-9]");
        let options = GrammarOptions::default();

        let first = cache.get_or_compile(&source, &options).unwrap();
        let second = cache.get_or_compile(&source, &options).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        // Same text read as a module list is a different grammar
        let modular = GrammarOptions { modular: true };
        assert!(cache.get_or_compile(&source, &modular).is_err());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction() {
        let cache = ParserCache::new(1);
        let options = GrammarOptions::default();
        let a = GrammarSource::text("a <- 'a'");
        let first = cache.get_or_compile(&a, &options).unwrap();
        cache
            .get_or_compile(&GrammarSource::text("b <- 'b'"), &options)
            .unwrap();
        let again = cache.get_or_compile(&a, &options).unwrap();
        assert!(!Arc::ptr_eq(&first, &again));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_stale_file_is_recompiled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.waxeye");
        fs::write(&path, "x <- 'x'").unwrap();
        let cache = ParserCache::default();
        let source = GrammarSource::File(path.clone());
        let options = GrammarOptions::default();

        let first = cache.get_or_compile(&source, &options).unwrap();
        assert_eq!(first.start_rule(), Some("x"));
        let second = cache.get_or_compile(&source, &options).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        fs::write(&path, "y <- 'y'").unwrap();
        let file = fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();
        let third = cache.get_or_compile(&source, &options).unwrap();
        assert_eq!(third.start_rule(), Some("y"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = ParserCache::default();
        let source = GrammarSource::text("a <- b");
        assert!(cache.get_or_compile(&source, &GrammarOptions::default()).is_err());
        assert!(cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }
}
