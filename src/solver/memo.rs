use crate::board::PositionSet;
use crate::card::Rank;

use dashmap::DashSet;
use rustc_hash::{FxBuildHasher, FxHashSet};

/// The key of a configuration: the face-up card, the number of cards left in the
/// deck and the removable slots. The played slots follow from the removable ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub card: Option<Rank>,
    pub remaining: u8,
    pub removable: PositionSet,
}

/// Insert-if-absent store of visited configurations.
pub trait Memo {
    /// Records `fingerprint` and returns `true` if it had not been seen before.
    fn insert(&mut self, fingerprint: Fingerprint) -> bool;
}

#[derive(Debug, Default)]
pub struct SeenSet(FxHashSet<Fingerprint>);

impl SeenSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Memo for SeenSet {
    #[inline]
    fn insert(&mut self, fingerprint: Fingerprint) -> bool {
        self.0.insert(fingerprint)
    }
}

/// A visited set shared between worker threads. The shard lock makes the
/// check and the insert one step, so exactly one racing thread gets `true`.
pub struct SharedSeenSet(DashSet<Fingerprint, FxBuildHasher>);

impl SharedSeenSet {
    pub fn new() -> Self {
        Self(DashSet::with_hasher(FxBuildHasher))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SharedSeenSet {
    fn default() -> Self {
        Self::new()
    }
}

impl Memo for &SharedSeenSet {
    #[inline]
    fn insert(&mut self, fingerprint: Fingerprint) -> bool {
        self.0.insert(fingerprint)
    }
}

/// Disables pruning: every configuration is expanded, however it was reached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMemo;

impl Memo for NoMemo {
    #[inline]
    fn insert(&mut self, _fingerprint: Fingerprint) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fingerprint(remaining: u8) -> Fingerprint {
        let mut removable = PositionSet::EMPTY;
        removable.insert(3);
        Fingerprint {
            card: Rank::new(4),
            remaining,
            removable,
        }
    }

    #[test]
    fn test_seen_set() {
        let mut seen = SeenSet::default();
        assert!(seen.insert(fingerprint(5)));
        assert!(!seen.insert(fingerprint(5)));
        assert!(seen.insert(fingerprint(4)));
        assert!(seen.insert(Fingerprint {
            card: None,
            ..fingerprint(5)
        }));
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_no_memo() {
        let mut memo = NoMemo;
        assert!(memo.insert(fingerprint(1)));
        assert!(memo.insert(fingerprint(1)));
    }

    #[test]
    fn test_shared_seen_set_race() {
        let shared = SharedSeenSet::new();
        let winners = AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let mut memo = &shared;
                    for remaining in 0..100 {
                        if memo.insert(fingerprint(remaining)) {
                            winners.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                });
            }
        });
        assert_eq!(winners.load(Ordering::Relaxed), 100);
        assert_eq!(shared.len(), 100);
    }
}
