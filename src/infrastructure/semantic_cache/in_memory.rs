//! In-memory semantic cache implementation

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::time::Instant;

use crate::domain::DomainError;
use crate::domain::embedding::cosine_similarity;
use crate::domain::semantic_cache::{CacheEntry, CacheHit, SemanticCache, SemanticCacheStats};

#[derive(Debug)]
struct StoredEntry {
    entry: CacheEntry,
    /// Insertion order; larger is newer
    seq: u64,
    /// Logical access time for LRU eviction
    last_used: AtomicU64,
}

#[derive(Debug, Default)]
struct Entries {
    by_seq: HashMap<u64, StoredEntry>,
    by_digest: HashMap<(String, String), u64>,
    next_seq: u64,
}

impl Entries {
    fn remove(&mut self, seq: u64) -> Option<StoredEntry> {
        let stored = self.by_seq.remove(&seq)?;
        self.by_digest
            .remove(&(stored.entry.partition.clone(), stored.entry.digest.clone()));
        Some(stored)
    }

    fn expired(&self, now: Instant) -> Vec<u64> {
        self.by_seq
            .iter()
            .filter(|(_, stored)| stored.entry.is_expired(now))
            .map(|(seq, _)| *seq)
            .collect()
    }

    fn least_recently_used(&self) -> Option<u64> {
        self.by_seq
            .iter()
            .min_by_key(|(seq, stored)| (stored.last_used.load(Ordering::Relaxed), **seq))
            .map(|(seq, _)| *seq)
    }
}

/// In-memory semantic cache using linear search over a bounded LRU store.
///
/// Lookups share a read lock; the LRU clock is atomic so hits do not need the
/// write lock.
#[derive(Debug)]
pub struct InMemorySemanticCache {
    entries: RwLock<Entries>,
    max_entries: usize,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    similarity_sum: Mutex<f64>,
}

impl InMemorySemanticCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            max_entries,
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            similarity_sum: Mutex::new(0.0),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Over capacity: drop the least recently used entry, then everything expired
    fn evict_if_needed(&self, entries: &mut Entries, now: Instant) {
        if entries.by_seq.len() <= self.max_entries {
            return;
        }

        let mut evicted = 0u64;

        if let Some(lru) = entries.least_recently_used() {
            entries.remove(lru);
            evicted += 1;
        }

        for seq in entries.expired(now) {
            entries.remove(seq);
            evicted += 1;
        }

        while entries.by_seq.len() > self.max_entries {
            match entries.least_recently_used() {
                Some(lru) => {
                    entries.remove(lru);
                    evicted += 1;
                }
                None => break,
            }
        }

        self.evictions.fetch_add(evicted, Ordering::Relaxed);
    }
}

#[async_trait]
impl SemanticCache for InMemorySemanticCache {
    async fn find_similar(
        &self,
        partition: &str,
        embedding: &[f32],
        min_similarity: f32,
    ) -> Result<Option<CacheHit>, DomainError> {
        let now = Instant::now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);

        let best = entries
            .by_seq
            .values()
            .filter(|stored| stored.entry.partition == partition)
            .filter(|stored| !stored.entry.is_expired(now))
            .map(|stored| (stored, cosine_similarity(embedding, &stored.entry.embedding)))
            .filter(|(_, similarity)| *similarity >= min_similarity)
            .max_by(|(a, sim_a), (b, sim_b)| {
                sim_a
                    .total_cmp(sim_b)
                    .then_with(|| a.seq.cmp(&b.seq))
            });

        match best {
            Some((stored, similarity)) => {
                stored.last_used.store(self.tick(), Ordering::Relaxed);
                self.hits.fetch_add(1, Ordering::Relaxed);
                *self
                    .similarity_sum
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) += similarity as f64;

                Ok(Some(CacheHit {
                    entry: stored.entry.clone(),
                    similarity,
                }))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn contains_digest(&self, partition: &str, digest: &str) -> Result<bool, DomainError> {
        let now = Instant::now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);

        let present = entries
            .by_digest
            .get(&(partition.to_string(), digest.to_string()))
            .and_then(|seq| entries.by_seq.get(seq))
            .is_some_and(|stored| !stored.entry.is_expired(now));

        Ok(present)
    }

    async fn store(&self, entry: CacheEntry) -> Result<bool, DomainError> {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let key = (entry.partition.clone(), entry.digest.clone());

        if let Some(&existing) = entries.by_digest.get(&key) {
            let live = entries
                .by_seq
                .get(&existing)
                .is_some_and(|stored| !stored.entry.is_expired(now));

            if live {
                return Ok(false);
            }
            entries.remove(existing);
        }

        let seq = entries.next_seq;
        entries.next_seq += 1;
        entries.by_digest.insert(key, seq);
        entries.by_seq.insert(
            seq,
            StoredEntry {
                entry,
                seq,
                last_used: AtomicU64::new(self.tick()),
            },
        );

        self.evict_if_needed(&mut entries, now);

        Ok(true)
    }

    async fn cleanup_expired(&self) -> Result<usize, DomainError> {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        let expired = entries.expired(now);
        for seq in &expired {
            entries.remove(*seq);
        }

        self.evictions
            .fetch_add(expired.len() as u64, Ordering::Relaxed);
        Ok(expired.len())
    }

    async fn clear(&self) -> Result<usize, DomainError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let count = entries.by_seq.len();

        entries.by_seq.clear();
        entries.by_digest.clear();

        Ok(count)
    }

    async fn stats(&self) -> Result<SemanticCacheStats, DomainError> {
        let total_entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_seq
            .len();
        let hits = self.hits.load(Ordering::Relaxed);
        let similarity_sum = *self
            .similarity_sum
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        Ok(SemanticCacheStats {
            total_entries,
            hits,
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            avg_hit_similarity: if hits == 0 {
                0.0
            } else {
                (similarity_sum / hits as f64) as f32
            },
        })
    }
}
