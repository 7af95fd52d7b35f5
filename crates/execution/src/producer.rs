//! Memoized producer lookups.
//!
//! Catalog scans for "which recipes make this item" are repeated many times
//! while planning and while probing quantities. Results (including "nothing
//! makes this") are kept for a fixed interval and then dropped all at once,
//! since the catalog can change underneath (recipes unlocked, reloaded).

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use autocraft_core::{ItemKind, RecipeDefinition};
use tracing::debug;

/// Time source for cache expiry.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Producer lists per item with wholesale expiry.
#[derive(Debug)]
pub struct ProducerCache {
    ttl: Duration,
    producers: HashMap<ItemKind, Vec<RecipeDefinition>>,
    no_producer: HashSet<ItemKind>,
    last_clear: Option<Instant>,
}

impl ProducerCache {
    /// Create a cache whose contents live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            producers: HashMap::new(),
            no_producer: HashSet::new(),
            last_clear: None,
        }
    }

    /// Producers of `item`, fetching with `fetch` on a miss.
    ///
    /// An empty fetch result is remembered as "no producer".
    pub fn producers<F>(&mut self, item: &ItemKind, now: Instant, fetch: F) -> &[RecipeDefinition]
    where
        F: FnOnce() -> Vec<RecipeDefinition>,
    {
        self.expire(now);

        if self.no_producer.contains(item) {
            return &[];
        }

        if !self.producers.contains_key(item) {
            let found = fetch();
            if found.is_empty() {
                self.no_producer.insert(item.clone());
                return &[];
            }
            self.producers.insert(item.clone(), found);
        }

        self.producers.get(item).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drop everything now.
    pub fn clear(&mut self) {
        self.producers.clear();
        self.no_producer.clear();
    }

    /// Number of memoized items, positive and negative.
    pub fn len(&self) -> usize {
        self.producers.len() + self.no_producer.len()
    }

    /// True if nothing is memoized.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expire(&mut self, now: Instant) {
        match self.last_clear {
            None => self.last_clear = Some(now),
            Some(at) if now.saturating_duration_since(at) > self.ttl => {
                debug!("Producer cache expired, dropping {} entries", self.len());
                self.clear();
                self.last_clear = Some(now);
            }
            Some(_) => {}
        }
    }
}
