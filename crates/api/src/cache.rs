use dashmap::DashMap;
use relations::{Evidence, EvidenceCache, ScorerConfig};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Pair evidence shared across pipeline runs
pub struct Cache {
    evidence: DashMap<String, Evidence>,
    max_entries: usize,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl Cache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            evidence: DashMap::new(),
            max_entries,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Bind the cache to one corpus; entries from other corpora never match.
    pub fn for_corpus<'p, I>(&self, paragraphs: I, scorer: &ScorerConfig) -> CorpusCache<'_>
    where
        I: IntoIterator<Item = &'p str>,
    {
        let mut hasher = Sha256::new();
        for term in scorer.parent_child_terms.iter().chain(&scorer.sibling_terms) {
            hasher.update(term.as_bytes());
            hasher.update([0u8]);
        }
        for text in paragraphs {
            hasher.update(text.as_bytes());
            hasher.update([0u8]);
        }

        CorpusCache {
            cache: self,
            digest: hex::encode(hasher.finalize()),
        }
    }

    fn insert(&self, key: String, evidence: Evidence) {
        if self.evidence.len() >= self.max_entries {
            // Clear 25% when full
            let to_remove: Vec<_> = self
                .evidence
                .iter()
                .take((self.max_entries / 4).max(1))
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.evidence.remove(&key);
            }
        }
        self.evidence.insert(key, evidence);
    }

    fn get(&self, key: &str) -> Option<Evidence> {
        let found = self.evidence.get(key).map(|r| r.value().clone());
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.evidence.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}

pub struct CorpusCache<'a> {
    cache: &'a Cache,
    digest: String,
}

impl CorpusCache<'_> {
    pub fn digest(&self) -> &str {
        &self.digest
    }

    fn key(&self, first: &str, second: &str) -> String {
        let (a, b) = if first <= second { (first, second) } else { (second, first) };
        let mut hasher = Sha256::new();
        hasher.update(self.digest.as_bytes());
        hasher.update(a.as_bytes());
        hasher.update([0u8]);
        hasher.update(b.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl EvidenceCache for CorpusCache<'_> {
    fn lookup(&self, first: &str, second: &str) -> Option<Evidence> {
        self.cache.get(&self.key(first, second))
    }

    fn store(&self, first: &str, second: &str, evidence: &Evidence) {
        self.cache.insert(self.key(first, second), evidence.clone());
    }
}
