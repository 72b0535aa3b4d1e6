//! Memoization keyed by the exact bytes of an upload.
//!
//! Sits in front of parsing so re-submitting identical content skips the
//! work. Nothing in the pipeline depends on it.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::error::ClimateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    hash: u64,
    len: usize,
}

impl Fingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Self {
            hash: hasher.finish(),
            len: bytes.len(),
        }
    }
}

#[derive(Debug)]
pub struct ContentCache<V> {
    entries: HashMap<Fingerprint, V>,
    hits: usize,
    misses: usize,
}

impl<V> Default for ContentCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<V: Clone> ContentCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `bytes`, computing it with `f` on a miss.
    /// Failures are not cached.
    pub fn get_or_try_insert_with<F>(&mut self, bytes: &[u8], f: F) -> Result<V, ClimateError>
    where
        F: FnOnce(&[u8]) -> Result<V, ClimateError>,
    {
        let key = Fingerprint::of(bytes);
        if let Some(value) = self.entries.get(&key) {
            self.hits += 1;
            return Ok(value.clone());
        }

        self.misses += 1;
        let value = f(bytes)?;
        self.entries.insert(key, value.clone());
        Ok(value)
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
