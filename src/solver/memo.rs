use std::hash::BuildHasherDefault;
use std::sync::{Mutex, MutexGuard};

use hashbrown::HashMap as HbHashMap;
use hashbrown::HashSet as HbHashSet;

use crate::canon::Fingerprint;
use crate::hash::shard_of;

pub type FastHasher = BuildHasherDefault<ahash::AHasher>;

/// Per-worker table of values computed inside one search. Merged into a
/// `SharedMemo` only after the parallel section ends.
pub type LocalMemo = HbHashMap<Fingerprint, f32, FastHasher>;

#[inline]
pub fn local_memo() -> LocalMemo {
    HbHashMap::with_hasher(FastHasher::default())
}

#[inline]
fn shard_count(requested: usize) -> usize {
    requested.next_power_of_two().max(1)
}

// A poisoned shard still holds a consistent table: every write is one insert.
#[inline]
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Sharded visited set keyed by fingerprint for parallel layer expansion.
pub struct SharedVisited {
    shards: Vec<Mutex<HbHashSet<Fingerprint, FastHasher>>>,
    mask: usize,
}

impl SharedVisited {
    /// Create with shard_count rounded up to next power of two.
    pub fn new(shard_count_hint: usize) -> Self {
        let sc = shard_count(shard_count_hint);
        let shards = (0..sc)
            .map(|_| Mutex::new(HbHashSet::with_hasher(FastHasher::default())))
            .collect();
        Self { shards, mask: sc - 1 }
    }

    /// Returns true if the fingerprint was not present and is inserted now.
    #[inline]
    pub fn try_insert(&self, fp: &Fingerprint) -> bool {
        let idx = shard_of(fp.key(), self.mask);
        let mut guard = lock(&self.shards[idx]);
        if guard.contains(fp) {
            return false;
        }
        guard.insert(fp.clone())
    }

    #[inline]
    pub fn contains(&self, fp: &Fingerprint) -> bool {
        lock(&self.shards[shard_of(fp.key(), self.mask)]).contains(fp)
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|m| lock(m).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared fingerprint → win-probability table. The first value stored for a
/// fingerprint is authoritative; later offers are ignored.
pub struct SharedMemo {
    shards: Vec<Mutex<HbHashMap<Fingerprint, f32, FastHasher>>>,
    mask: usize,
}

impl Default for SharedMemo {
    fn default() -> Self {
        Self::new(64)
    }
}

impl SharedMemo {
    pub fn new(shard_count_hint: usize) -> Self {
        let sc = shard_count(shard_count_hint);
        let shards = (0..sc)
            .map(|_| Mutex::new(HbHashMap::with_hasher(FastHasher::default())))
            .collect();
        Self { shards, mask: sc - 1 }
    }

    #[inline]
    pub fn get(&self, fp: &Fingerprint) -> Option<f32> {
        lock(&self.shards[shard_of(fp.key(), self.mask)]).get(fp).copied()
    }

    /// Store `value` unless an entry exists. Returns the value now held.
    #[inline]
    pub fn insert_if_absent(&self, fp: &Fingerprint, value: f32) -> f32 {
        let mut guard = lock(&self.shards[shard_of(fp.key(), self.mask)]);
        if let Some(v) = guard.get(fp) {
            return *v;
        }
        guard.insert(fp.clone(), value);
        value
    }

    /// Merge a worker table. Entries are offered in fingerprint order so the
    /// outcome does not depend on the worker's hash iteration order.
    pub fn merge(&self, local: &LocalMemo) -> usize {
        let mut entries: Vec<(&Fingerprint, &f32)> = local.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        let mut added = 0;
        for (fp, v) in entries {
            let mut guard = lock(&self.shards[shard_of(fp.key(), self.mask)]);
            if !guard.contains_key(fp) {
                guard.insert(fp.clone(), *v);
                added += 1;
            }
        }
        added
    }

    /// All entries at `hidden`, sorted by fingerprint.
    pub fn level_entries(&self, hidden: u8) -> Vec<(Fingerprint, f32)> {
        let mut out: Vec<(Fingerprint, f32)> = Vec::new();
        for m in &self.shards {
            let guard = lock(m);
            out.extend(
                guard
                    .iter()
                    .filter(|(fp, _)| fp.hidden() == hidden)
                    .map(|(fp, v)| (fp.clone(), *v)),
            );
        }
        out.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|m| lock(m).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        for m in &self.shards {
            lock(m).clear();
        }
    }
}
