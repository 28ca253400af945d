// core/src/engine.rs
//
// Engine handle shared by every front end.
//
// The active dictionaries live in an immutable `Snapshot` behind an
// `ArcSwap`. Loading compiles a complete new snapshot and swaps the pointer,
// so a call in flight sees either the old or the new dictionaries, never a
// mix. Segmentation results are cached per (text, options, generation).

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;
use lru::LruCache;
use tracing::info;

use crate::dictionary::{DictionarySet, DictionaryTables};
use crate::error::DictionaryError;
use crate::format::format_result;
use crate::html::{translate_tree, HtmlTree};
use crate::segment::{Algorithm, SegmentOptions, Segmenter, TranslationResult, WrapMode};
use crate::Config;

/// One installed dictionary set, tagged with the load that produced it.
#[derive(Debug)]
pub struct Snapshot {
    generation: u64,
    dicts: DictionarySet,
}

impl Snapshot {
    /// Zero for the empty startup snapshot, then one per install.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn dictionaries(&self) -> &DictionarySet {
        &self.dicts
    }
}

type CacheKey = (String, SegmentOptions, u64);

/// Translation engine with atomic dictionary reload and a result cache.
///
/// `Engine` is `Send + Sync`; translation methods take `&self` and can be
/// called from many threads while another thread reloads.
pub struct Engine {
    config: Config,
    snapshot: ArcSwap<Snapshot>,
    generations: AtomicU64,
    cache: Option<Mutex<LruCache<CacheKey, TranslationResult>>>,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
}

impl Engine {
    /// Create an engine with empty dictionaries.
    ///
    /// Until dictionaries are loaded every Han character falls back to its
    /// (half-width) self.
    pub fn new(config: Config) -> Self {
        let cache = NonZeroUsize::new(config.max_cache_size).map(|cap| Mutex::new(LruCache::new(cap)));
        Self {
            config,
            snapshot: ArcSwap::from_pointee(Snapshot {
                generation: 0,
                dicts: DictionarySet::empty(),
            }),
            generations: AtomicU64::new(0),
            cache,
            cache_hits: AtomicUsize::new(0),
            cache_misses: AtomicUsize::new(0),
        }
    }

    /// Create an engine and load `tables` into it.
    pub fn with_dictionaries(config: Config, tables: DictionaryTables) -> Result<Self, DictionaryError> {
        let engine = Self::new(config);
        engine.load_dictionaries(tables)?;
        Ok(engine)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compile `tables` and install them as the active snapshot.
    ///
    /// Nothing is installed when compilation fails.
    pub fn load_dictionaries(&self, tables: DictionaryTables) -> Result<(), DictionaryError> {
        let dicts = DictionarySet::compile(tables, &self.config)?;
        self.install(dicts);
        Ok(())
    }

    /// Decode snapshot bytes (see `DictionarySet::to_bytes`) and install them.
    pub fn load_snapshot_bytes(&self, bytes: &[u8]) -> Result<(), DictionaryError> {
        let dicts = DictionarySet::from_bytes(bytes, &self.config)?;
        self.install(dicts);
        Ok(())
    }

    /// Swap in an already compiled dictionary set.
    pub fn install(&self, dicts: DictionarySet) {
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        self.snapshot.store(Arc::new(Snapshot { generation, dicts }));
        self.clear_cache();
        info!(generation, "dictionary snapshot installed");
    }

    /// The snapshot currently in use.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    /// Segment `text` with explicit switches.
    pub fn segment(
        &self,
        text: &str,
        wrap: WrapMode,
        algorithm: Algorithm,
        prioritize_names: bool,
    ) -> TranslationResult {
        self.segment_with(
            text,
            SegmentOptions {
                wrap,
                algorithm,
                prioritize_names,
            },
        )
    }

    /// Segment `text`, served from the cache when possible.
    pub fn segment_with(&self, text: &str, opts: SegmentOptions) -> TranslationResult {
        let snapshot = self.snapshot();
        let Some(cache) = &self.cache else {
            return Segmenter::new(&snapshot.dicts, &self.config).segment(text, opts);
        };

        let key = (text.to_string(), opts, snapshot.generation);
        if let Some(cached) = lock(cache).get(&key) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return cached.clone();
        }
        self.cache_misses.fetch_add(1, Ordering::Relaxed);

        let result = Segmenter::new(&snapshot.dicts, &self.config).segment(text, opts);
        lock(cache).put(key, result.clone());
        result
    }

    /// Translate with the configured defaults, formatting the result when
    /// `format_result` is set.
    pub fn translate(&self, text: &str) -> String {
        self.translate_with(text, self.config.segment_options())
    }

    pub fn translate_with(&self, text: &str, opts: SegmentOptions) -> String {
        let result = self.segment_with(text, opts);
        if self.config.format_result {
            format_result(&result.text)
        } else {
            result.text
        }
    }

    /// Per-character Sino-Vietnamese transliteration with mapping.
    pub fn han_viet(&self, text: &str) -> TranslationResult {
        let snapshot = self.snapshot();
        Segmenter::new(&snapshot.dicts, &self.config).han_viet(text)
    }

    /// Translate the text nodes of a parsed document in place.
    ///
    /// The whole document is translated against one snapshot, unwrapped and
    /// unformatted. Returns the number of text nodes replaced.
    pub fn translate_document<T: HtmlTree>(&self, tree: &mut T) -> usize {
        let snapshot = self.snapshot();
        let segmenter = Segmenter::new(&snapshot.dicts, &self.config);
        let opts = SegmentOptions {
            wrap: WrapMode::None,
            ..self.config.segment_options()
        };
        translate_tree(
            tree,
            |name| self.config.is_skipped_element(name),
            |text| segmenter.segment(text, opts).text,
        )
    }

    /// Get cache statistics for monitoring.
    ///
    /// Returns (hits, misses) tuple.
    pub fn cache_stats(&self) -> (usize, usize) {
        (
            self.cache_hits.load(Ordering::Relaxed),
            self.cache_misses.load(Ordering::Relaxed),
        )
    }

    /// Get cache hit rate as a percentage (0.0 to 100.0).
    ///
    /// Returns None if no cache accesses have been made yet.
    pub fn cache_hit_rate(&self) -> Option<f32> {
        let (hits, misses) = self.cache_stats();
        let total = hits + misses;
        if total == 0 {
            None
        } else {
            Some((hits as f32 / total as f32) * 100.0)
        }
    }

    pub fn cache_size(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| lock(cache).len())
    }

    /// Maximum number of cached results, 0 when caching is disabled.
    pub fn cache_capacity(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| lock(cache).cap().get())
    }

    /// Drop every cached result and reset the statistics.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            lock(cache).clear();
        }
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
    }
}

/// A panic while holding the lock cannot leave the cache half-written, so a
/// poisoned lock is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
