//! Cache of good assignments used to seed restarts.
//!
//! Entries are deduplicated by a 64-bit signature of the assignment. A signature match is
//! confirmed by comparing the full assignment, as different assignments may share a signature.
use std::hash::Hasher;

use rustc_hash::{FxHashMap, FxHasher};

use crate::assignment::Bits;
use crate::mem::{Mem, MemError};
use crate::rng::Rng;
use crate::stats::Stats;

/// Signature of an assignment.
pub fn signature(bits: &Bits) -> u64 {
    let mut hasher = FxHasher::default();
    for &word in bits.words() {
        hasher.write_u32(word);
    }
    hasher.finish()
}

struct CacheEntry {
    sig: u64,
    bits: Bits,
    /// Unsatisfied clauses under this assignment.
    unsat: usize,
}

/// Bounded set of distinct assignments.
#[derive(Default)]
pub struct Cache {
    entries: Vec<CacheEntry>,
    by_sig: FxHashMap<u64, Vec<usize>>,
    /// Current capacity, grows up to the configured maximum.
    target: usize,
}

impl Cache {
    /// Set the initial capacity.
    pub fn reset_target(&mut self, min: usize, max: usize) {
        self.target = min.max(1).min(max);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn target(&self) -> usize {
        self.target
    }

    /// Double the capacity, up to `max`, if the cache is full.
    pub fn grow_target(&mut self, max: usize) {
        if self.entries.len() >= self.target && self.target < max {
            self.target = (self.target * 2).min(max);
        }
    }

    /// Add an assignment unless an identical one is present.
    ///
    /// When the cache is full a uniformly random entry is replaced.
    pub fn insert(
        &mut self,
        mem: &mut Mem,
        rng: &mut Rng,
        stats: &mut Stats,
        bits: &Bits,
        unsat: usize,
    ) -> Result<(), MemError> {
        let sig = signature(bits);
        stats.sig.search += 1;

        match self.by_sig.get(&sig) {
            None => stats.sig.neg += 1,
            Some(indices) => {
                if indices.iter().any(|&index| self.entries[index].bits == *bits) {
                    stats.sig.truepos += 1;
                    stats.cache.skipped += 1;
                    return Ok(());
                }
                stats.sig.falsepos += 1;
            }
        }

        if self.target == 0 {
            return Ok(());
        }

        let index = if self.entries.len() < self.target {
            let mut copy = Bits::from_words(mem.alloc(bits.words().len(), 0)?);
            copy.copy_from(bits);
            mem.push(
                &mut self.entries,
                CacheEntry {
                    sig,
                    bits: copy,
                    unsat,
                },
            )?;
            stats.cache.inserted += 1;
            self.entries.len() - 1
        } else {
            let index = rng.pick(self.entries.len());
            let old_sig = self.entries[index].sig;
            if let Some(indices) = self.by_sig.get_mut(&old_sig) {
                indices.retain(|&other| other != index);
                if indices.is_empty() {
                    self.by_sig.remove(&old_sig);
                }
            }
            let entry = &mut self.entries[index];
            entry.bits.copy_from(bits);
            entry.sig = sig;
            entry.unsat = unsat;
            stats.cache.replaced += 1;
            index
        };

        self.by_sig.entry(sig).or_insert_with(Vec::new).push(index);
        Ok(())
    }

    /// Pick a cached assignment.
    ///
    /// Either uniformly, or the better of two uniformly drawn entries.
    pub fn pick(&self, rng: &mut Rng, uniform: bool) -> Option<&Bits> {
        if self.entries.is_empty() {
            return None;
        }
        let mut index = rng.pick(self.entries.len());
        if !uniform {
            let other = rng.pick(self.entries.len());
            if self.entries[other].unsat < self.entries[index].unsat {
                index = other;
            }
        }
        Some(&self.entries[index].bits)
    }

    pub fn clear(&mut self, mem: &mut Mem) {
        for entry in self.entries.iter_mut() {
            entry.bits.release(mem);
        }
        mem.release(&mut self.entries);
        self.by_sig.clear();
    }
}
