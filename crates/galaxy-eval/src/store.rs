use std::num::NonZeroUsize;

use galaxy_core::{Op, TermArena, TermId};
use lru::LruCache;

pub const DEFAULT_CACHE_CAPACITY: usize = 1 << 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
    pub capacity: usize,
}

/// Bounded map from `(operator, argument)` ids to the application node
/// already built for them. Least recently used entries are evicted first.
#[derive(Debug)]
pub struct ApCache {
    entries: LruCache<(TermId, TermId), TermId>,
    hits: u64,
    misses: u64,
}

impl ApCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        ApCache {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, f: TermId, x: TermId) -> Option<TermId> {
        let found = self.entries.get(&(f, x)).copied();
        match found {
            Some(_) => self.hits += 1,
            None => self.misses += 1,
        }
        found
    }

    pub fn insert(&mut self, f: TermId, x: TermId, app: TermId) {
        self.entries.put((f, x), app);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            len: self.entries.len(),
            capacity: self.entries.cap().get(),
        }
    }
}

/// A term arena with hash-consed application construction.
///
/// Every rule that builds an application goes through [`TermStore::app`],
/// so structurally identical intermediates built while the cache still
/// remembers them share one node (and one memo slot).
#[derive(Debug)]
pub struct TermStore {
    arena: TermArena,
    cache: ApCache,
}

impl TermStore {
    pub fn new(cache_capacity: usize) -> Self {
        Self::with_arena(TermArena::new(), cache_capacity)
    }

    pub fn with_arena(arena: TermArena, cache_capacity: usize) -> Self {
        TermStore {
            arena,
            cache: ApCache::new(cache_capacity),
        }
    }

    pub fn arena(&self) -> &TermArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut TermArena {
        &mut self.arena
    }

    pub fn app(&mut self, f: TermId, x: TermId) -> TermId {
        if let Some(id) = self.cache.get(f, x) {
            return id;
        }
        let id = self.arena.app(f, x);
        self.cache.insert(f, x, id);
        id
    }

    pub fn op(&mut self, op: Op) -> TermId {
        self.arena.op(op)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl Default for TermStore {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
