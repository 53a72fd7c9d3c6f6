//! Search statistics.
use std::time::Duration;

use log::info;

use crate::unsat::Unsat;

/// Memory access estimates by category.
///
/// These count table accesses of the hot loops and serve as a machine independent measure of
/// work, usable as a budget.
#[derive(Clone, Default, Debug)]
pub struct Mems {
    pub all: u64,
    pub crit: u64,
    pub lits: u64,
    pub occs: u64,
    pub read: u64,
    pub update: u64,
    pub weight: u64,
}

macro_rules! mems_adders {
    ($($method:ident => $field:ident,)*) => {
        impl Mems {
            $(
                #[inline]
                pub fn $method(&mut self, count: u64) {
                    self.$field += count;
                    self.all += count;
                }
            )*
        }
    };
}

mems_adders! {
    add_crit => crit,
    add_lits => lits,
    add_occs => occs,
    add_read => read,
    add_update => update,
    add_weight => weight,
}

#[derive(Clone, Default, Debug)]
pub struct RestartStats {
    pub inner: u64,
    pub outer: u64,
    /// Largest inner restart interval used.
    pub max_interval: u64,
}

#[derive(Clone, Default, Debug)]
pub struct QueueStats {
    pub max_chunks: usize,
    pub max_nodes: usize,
    /// Unfair picks that walked past the head.
    pub unfair: u64,
    pub defrags: u64,
    pub moved: u64,
}

#[derive(Clone, Default, Debug)]
pub struct CacheStats {
    pub inserted: u64,
    pub replaced: u64,
    pub skipped: u64,
}

/// Outcomes of signature lookups.
#[derive(Clone, Default, Debug)]
pub struct SigStats {
    pub search: u64,
    /// Signature not present.
    pub neg: u64,
    /// Signature present, assignment different.
    pub falsepos: u64,
    /// Signature present, assignment identical.
    pub truepos: u64,
}

#[derive(Clone, Default, Debug)]
pub struct StrategyStats {
    pub default: u64,
    pub random: u64,
}

/// Sources of restart assignments.
#[derive(Clone, Default, Debug)]
pub struct SeedStats {
    pub best: u64,
    pub cached: u64,
    pub keep: u64,
    pub pos: u64,
    pub neg: u64,
    pub random: u64,
}

#[derive(Clone, Default, Debug)]
pub struct WeightStats {
    pub bumped: u64,
    pub decayed: u64,
}

#[derive(Clone, Default, Debug)]
pub struct TimeStats {
    pub total: Duration,
    pub restart: Duration,
    pub defrag: Duration,
}

/// Aggregated statistics of all solve calls.
#[derive(Clone, Default, Debug)]
pub struct Stats {
    pub flips: u64,
    pub eager_flips: u64,
    pub walks: u64,
    /// Clauses made satisfied and broken by flips.
    pub made: u64,
    pub broken: u64,
    /// Fewest unsatisfied clauses seen, `usize::MAX` before the first search.
    pub minimum: usize,
    /// Times the current minimum was reached, counting the flip that set it.
    pub hits: u64,
    /// Unsatisfied clauses at the last restart.
    pub last: usize,
    pub max_stack: usize,
    pub restarts: RestartStats,
    pub queue: QueueStats,
    pub cache: CacheStats,
    pub sig: SigStats,
    pub strategy: StrategyStats,
    pub seed: SeedStats,
    pub weights: WeightStats,
    pub mems: Mems,
    pub time: TimeStats,
    /// Input clauses dropped as tautologies and duplicate literals removed.
    pub tautologies: u64,
    pub duplicates: u64,
    /// Variables fixed by unit propagation.
    pub fixed: usize,
    /// Number of flips per variable.
    pub var_flips: Vec<u64>,
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

fn per_second(count: u64, time: Duration) -> f64 {
    let seconds = time.as_secs_f64();
    if seconds > 0.0 {
        count as f64 / seconds
    } else {
        0.0
    }
}

impl Stats {
    /// Fold the counters of an unsatisfied clause tracker that is about to be replaced.
    pub(crate) fn record_unsat(&mut self, unsat: &Unsat) {
        match unsat {
            Unsat::Queue(queue) => {
                self.queue.max_chunks = self.queue.max_chunks.max(queue.max_chunks());
                self.queue.max_nodes = self.queue.max_nodes.max(queue.max_nodes());
                let (defrags, moved) = queue.defrag_stats();
                self.queue.defrags += defrags;
                self.queue.moved += moved;
                self.time.defrag += queue.defrag_time();
            }
            Unsat::Stack(stack) => {
                self.max_stack = self.max_stack.max(stack.max_len());
            }
        }
    }

    /// Log all statistics at info level.
    pub fn log(&self, max_allocated: usize) {
        let total = self.time.total;
        info!(
            "restarts: {} inner, {} outer, max interval {}",
            self.restarts.inner, self.restarts.outer, self.restarts.max_interval
        );
        info!(
            "strategies: {} default ({:.0}%), {} random",
            self.strategy.default,
            percent(
                self.strategy.default,
                self.strategy.default + self.strategy.random
            ),
            self.strategy.random
        );
        info!(
            "seeds: {} best, {} cached, {} keep, {} pos, {} neg, {} random",
            self.seed.best,
            self.seed.cached,
            self.seed.keep,
            self.seed.pos,
            self.seed.neg,
            self.seed.random
        );
        info!(
            "cache: {} inserted, {} replaced, {} skipped",
            self.cache.inserted, self.cache.replaced, self.cache.skipped
        );
        info!(
            "signatures: {} searched, {} neg, {} false pos, {} true pos",
            self.sig.search, self.sig.neg, self.sig.falsepos, self.sig.truepos
        );
        info!(
            "queue: {} max chunks, {} max nodes, {} unfair, {} defrags moving {}",
            self.queue.max_chunks,
            self.queue.max_nodes,
            self.queue.unfair,
            self.queue.defrags,
            self.queue.moved
        );
        info!("stack: {} max size", self.max_stack);
        info!(
            "weights: {} bumped, {} decayed",
            self.weights.bumped, self.weights.decayed
        );
        info!(
            "clauses: {} made, {} broken, minimum {} unsatisfied hit {} times",
            self.made,
            self.broken,
            if self.minimum == usize::max_value() {
                0
            } else {
                self.minimum
            },
            self.hits
        );
        info!(
            "mems: {} total, {} crit, {} lits, {} occs, {} read, {} update, {} weight",
            self.mems.all,
            self.mems.crit,
            self.mems.lits,
            self.mems.occs,
            self.mems.read,
            self.mems.update,
            self.mems.weight
        );
        info!(
            "flips: {} ({:.0} per second), {} eager ({:.1}%), {} walks ({:.1}%)",
            self.flips,
            per_second(self.flips, total),
            self.eager_flips,
            percent(self.eager_flips, self.flips),
            self.walks,
            percent(self.walks, self.flips)
        );
        info!(
            "time: {:.3}s total, {:.3}s restart, {:.3}s defrag",
            total.as_secs_f64(),
            self.time.restart.as_secs_f64(),
            self.time.defrag.as_secs_f64()
        );
        info!(
            "memory: {:.1} MB maximum allocated",
            max_allocated as f64 / (1 << 20) as f64
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mems_accumulate_total() {
        let mut mems = Mems::default();
        mems.add_occs(3);
        mems.add_lits(2);
        mems.add_occs(1);
        assert_eq!(mems.occs, 4);
        assert_eq!(mems.lits, 2);
        assert_eq!(mems.all, 6);
    }

    #[test]
    fn ratios_handle_zero() {
        assert_eq!(percent(1, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
        assert_eq!(per_second(10, Duration::default()), 0.0);
    }
}
