//! Anti-repeat sampler
//!
//! Stateful wrapper over the content store producing a shuffled,
//! non-repeating stream of items matching a predicate. The used-id set is
//! shared across predicates; once a pass over the store yields nothing new
//! while the set is non-empty, the set is cleared and one more pass runs.
//! The set is touched only from within already-locked engine operations, so
//! it needs no lock of its own.

use std::collections::HashSet;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::content::item::ContentItem;
use crate::content::store::ContentStore;

/// Anti-repeat sampler state: the ids already emitted in the current round.
#[derive(Debug, Default)]
pub struct Sampler {
    used: HashSet<String>,
}

impl Sampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ids excluded in the current round.
    pub fn used_count(&self) -> usize {
        self.used.len()
    }

    /// Forget the current anti-repeat round. Called by the engine on every
    /// top-level mode transition so stale exclusions never leak across
    /// unrelated activities.
    pub fn clear_used(&mut self) {
        self.used.clear();
    }

    /// One anti-repeat pass: visit a fresh random permutation of the store,
    /// collect items matching the predicate that were not yet used, and mark
    /// every returned item as used. If a full pass yields nothing while the
    /// used set is non-empty, the set is cleared and exactly one more pass
    /// runs; a predicate matching nothing at all therefore terminates with
    /// an empty result instead of looping.
    pub fn shuffle<R, P>(
        &mut self,
        store: &ContentStore,
        rng: &mut R,
        predicate: P,
    ) -> Vec<Arc<ContentItem>>
    where
        R: Rng,
        P: Fn(&ContentItem) -> bool,
    {
        let mut result = Vec::new();
        if store.is_empty() {
            return result;
        }

        for _ in 0..2 {
            let mut indices: Vec<usize> = (0..store.len()).collect();
            indices.shuffle(rng);

            for i in indices {
                let item = store.get(i);
                if predicate(item) && !self.used.contains(item.id()) {
                    self.used.insert(item.id().to_string());
                    result.push(Arc::clone(item));
                }
            }

            if result.is_empty() && !self.used.is_empty() {
                self.used.clear();
                continue;
            }
            break;
        }

        result
    }

    /// Draw a single random unseen item matching the predicate, or `None`
    /// when the predicate matches nothing in the whole store. Only the drawn
    /// item is marked as used.
    pub fn draw<R, P>(
        &mut self,
        store: &ContentStore,
        rng: &mut R,
        predicate: P,
    ) -> Option<Arc<ContentItem>>
    where
        R: Rng,
        P: Fn(&ContentItem) -> bool,
    {
        if store.is_empty() {
            return None;
        }

        for _ in 0..2 {
            let mut indices: Vec<usize> = (0..store.len()).collect();
            indices.shuffle(rng);

            for i in indices {
                let item = store.get(i);
                if predicate(item) && !self.used.contains(item.id()) {
                    self.used.insert(item.id().to_string());
                    return Some(Arc::clone(item));
                }
            }

            if self.used.is_empty() {
                break;
            }
            self.used.clear();
        }

        None
    }
}
