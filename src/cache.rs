//! In-memory cache of search hits keyed by `loio`.
//!
//! Populated by every search and read by retrieval so that a document found
//! through `search` can be fetched without searching again. The cache is an
//! owned value handed to both operations; entries live as long as the cache
//! and are never evicted. Concurrent inserts for the same `loio` are last
//! write wins.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::SearchHit;

#[derive(Debug, Default)]
pub struct ResultCache {
    hits: RwLock<HashMap<String, SearchHit>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, hit: SearchHit) {
        let mut hits = self.hits.write().unwrap_or_else(|e| e.into_inner());
        hits.insert(hit.loio.clone(), hit);
    }

    pub fn get(&self, loio: &str) -> Option<SearchHit> {
        let hits = self.hits.read().unwrap_or_else(|e| e.into_inner());
        hits.get(loio).cloned()
    }

    pub fn len(&self) -> usize {
        self.hits.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
