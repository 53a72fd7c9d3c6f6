//! Restarts and the seeding of assignments.
use std::time::Instant;

use partial_ref::{partial, PartialRef};

use log::{debug, info};

use crate::context::{
    AssignmentP, CacheP, ClauseDbP, Context, CritP, ExpP, MemP, OffloadP, OptionsP, RngP,
    ScheduleP, SolverStateP, StatsP, StrategyP, TrailP, UnsatP, WeightsP,
};
use crate::crit::recompute;
use crate::exp::cb_for_len;
use crate::mem::MemError;
use crate::offload::DeviceState;
use crate::strategy::pick_strategy;
use crate::unsat::UnsatTracker;

mod luby;

pub use luby::Luby;

/// Flip counts at which the next restarts happen.
#[derive(Default)]
pub struct Schedule {
    luby: Luby,
    /// `None` when restarts are disabled.
    next_inner: Option<u64>,
    next_outer: u64,
}

impl Schedule {
    /// Flip count of the next inner restart.
    pub fn next_inner(&self) -> Option<u64> {
        self.next_inner
    }

    /// Flip count of the next outer restart.
    pub fn next_outer(&self) -> u64 {
        self.next_outer
    }
}

/// Start the restart schedule of a solve call.
pub fn init_schedule(mut ctx: partial!(Context, mut ScheduleP, OptionsP, StatsP)) {
    let options = ctx.part(OptionsP);
    let interval = options.restart as u64;
    let factor = options.restartouterfactor as u64;
    let flips = ctx.part(StatsP).flips;

    let schedule = ctx.part_mut(ScheduleP);
    schedule.luby.reset();
    schedule.next_inner = if interval > 0 {
        Some(flips + interval)
    } else {
        None
    };
    schedule.next_outer = flips.saturating_add(interval.saturating_mul(factor));
}

/// Whether the inner restart limit was reached.
///
/// On uniform formulas `unirestarts` bounds the total number of inner restarts.
pub fn restart_due(ctx: partial!(Context, OptionsP, ScheduleP, SolverStateP, StatsP)) -> bool {
    let stats = ctx.part(StatsP);
    match ctx.part(ScheduleP).next_inner {
        Some(limit) if stats.flips >= limit => (),
        _ => return false,
    }
    let cap = ctx.part(OptionsP).unirestarts as u64;
    !(ctx.part(SolverStateP).uniform && cap > 0 && stats.restarts.inner >= cap)
}

/// Configure clause weights and the probability table for the current strategy.
pub fn apply_strategy(
    mut ctx: partial!(Context, mut ExpP, mut MemP, mut WeightsP, ClauseDbP, OptionsP, StrategyP),
) -> Result<(), MemError> {
    let (strategy, mut ctx) = ctx.split_part(StrategyP);
    ctx.part_mut(WeightsP)
        .configure(strategy.weighted(), strategy.anti(), strategy.weight);

    let cb = ctx.part(OptionsP).cb;
    let base = if cb > 100 {
        Some(cb as f64 / 100.0)
    } else if strategy.correct {
        Some(cb_for_len(ctx.part(ClauseDbP).max_len()))
    } else {
        None
    };

    let (exp, mut ctx) = ctx.split_part_mut(ExpP);
    exp.select(ctx.part_mut(MemP), base)
}

/// Assemble a new assignment and make it current.
///
/// On restarts the best, the kept or a cached assignment may be used, depending on the options
/// and the strategy. Otherwise all variables take the strategy polarity, or random values
/// overridden by the phase hints. Values fixed by preprocessing always apply.
pub fn seed_assignment(
    mut ctx: partial!(Context, mut AssignmentP, mut RngP, mut StatsP, CacheP, OptionsP, StrategyP),
    restart: bool,
) {
    let (assignment, mut ctx) = ctx.split_part_mut(AssignmentP);
    let (rng, mut ctx) = ctx.split_part_mut(RngP);
    let (stats, ctx) = ctx.split_part_mut(StatsP);
    let options = ctx.part(OptionsP);
    let strategy = ctx.part(StrategyP);
    let var_count = assignment.var_count();

    let cached = if restart && strategy.cached {
        ctx.part(CacheP).pick(rng, options.cacheduni != 0)
    } else {
        None
    };

    if restart && options.best != 0 {
        assignment.tmp.copy_from(&assignment.best);
        stats.seed.best += 1;
    } else if restart && options.keep != 0 {
        assignment.tmp.copy_from(&assignment.vals);
        stats.seed.keep += 1;
    } else if let Some(bits) = cached {
        assignment.tmp.copy_from(bits);
        stats.seed.cached += 1;
    } else {
        match strategy.pol {
            1 | -1 => {
                let value = strategy.pol > 0;
                for index in 0..var_count {
                    assignment.tmp.set(index, value);
                }
                if value {
                    stats.seed.pos += 1;
                } else {
                    stats.seed.neg += 1;
                }
            }
            _ => {
                for index in 0..var_count {
                    assignment.tmp.set(index, rng.bit());
                }
                for &lit in assignment.phases.iter() {
                    if lit.index() < var_count {
                        assignment.tmp.set(lit.index(), lit.is_positive());
                    }
                }
                stats.seed.random += 1;
            }
        }
    }

    assignment.apply_fixed_to_tmp();

    debug!(
        "seed differs in {} of {} variables",
        assignment.vals.distance(&assignment.tmp),
        var_count
    );

    assignment.vals.copy_from(&assignment.tmp);
}

/// Rebuild all state derived from the current assignment.
///
/// Replaces the unsatisfied clause tracker with a fresh instance of the backend required by the
/// clause picking policy and uploads the new assignment to an attached device.
pub fn reinit(
    mut ctx: partial!(
        Context,
        mut CritP,
        mut MemP,
        mut OffloadP,
        mut StatsP,
        mut TrailP,
        mut UnsatP,
        mut WeightsP,
        AssignmentP,
        ClauseDbP,
        OptionsP,
        SolverStateP,
    ),
) -> Result<(), MemError> {
    let clause_count = ctx.part(ClauseDbP).len();
    let use_queue = ctx.part(SolverStateP).picking.uses_queue();
    let min_chunk_size = ctx.part(OptionsP).minchunksize as usize;
    let defrag = ctx.part(OptionsP).defrag != 0;

    {
        let (unsat, mut ctx) = ctx.split_part_mut(UnsatP);
        ctx.part_mut(StatsP).record_unsat(unsat);
        unsat.reset(
            ctx.part_mut(MemP),
            clause_count,
            use_queue,
            min_chunk_size,
            defrag,
        )?;
    }

    recompute(ctx.borrow())?;

    let flips = ctx.part(StatsP).flips;
    let (weights, ctx_unsat) = ctx.split_part_mut(WeightsP);
    ctx_unsat
        .part(UnsatP)
        .for_each(|cidx| weights.mark_unsat(cidx, flips));

    ctx.part_mut(TrailP).invalidate();

    let (offload, ctx) = ctx.split_part_mut(OffloadP);
    if let Some(device) = offload {
        let assignment = ctx.part(AssignmentP);
        device.load_to_device(&DeviceState::new(
            ctx.part(ClauseDbP),
            &assignment.vals,
            assignment.var_count(),
        ));
    }

    Ok(())
}

/// Perform an inner restart, and an outer restart when that is due.
///
/// The assignment of the ending period is cached when its strategy asks for it. Then a new
/// strategy is picked and the search continues from a new seed.
pub fn restart(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut CacheP,
        mut CritP,
        mut ExpP,
        mut MemP,
        mut OffloadP,
        mut RngP,
        mut ScheduleP,
        mut StatsP,
        mut StrategyP,
        mut TrailP,
        mut UnsatP,
        mut WeightsP,
        ClauseDbP,
        OptionsP,
        SolverStateP,
    ),
) -> Result<(), MemError> {
    let start = Instant::now();
    let unsat_count = ctx.part(UnsatP).len();
    let flips = ctx.part(StatsP).flips;
    let verbose = ctx.part(OptionsP).verbose;

    {
        let stats = ctx.part_mut(StatsP);
        stats.restarts.inner += 1;
        stats.last = unsat_count;
    }

    if ctx.part(StrategyP).cached {
        let cache_max = ctx.part(OptionsP).cachemax as usize;
        let (cache, mut ctx) = ctx.split_part_mut(CacheP);
        let (mem, mut ctx) = ctx.split_part_mut(MemP);
        let (rng, mut ctx) = ctx.split_part_mut(RngP);
        let (stats, ctx) = ctx.split_part_mut(StatsP);
        cache.grow_target(cache_max);
        cache.insert(mem, rng, stats, &ctx.part(AssignmentP).vals, unsat_count)?;
    }

    {
        let options = ctx.part(OptionsP);
        let base = options.restart as u64;
        let outer = options.restartouter != 0;
        let factor = options.restartouterfactor as u64;
        let reluctant = options.reluctant != 0;

        let (schedule, mut ctx) = ctx.split_part_mut(ScheduleP);
        if outer && flips >= schedule.next_outer {
            ctx.part_mut(StatsP).restarts.outer += 1;
            ctx.part_mut(WeightsP).reset();
            schedule.luby.reset();
            schedule.next_outer = flips.saturating_add(base.saturating_mul(factor));
            if verbose > 0 {
                info!("outer restart {}", ctx.part(StatsP).restarts.outer);
            }
        }

        let interval = if reluctant {
            base.saturating_mul(schedule.luby.next().unwrap_or(1))
        } else {
            base
        };
        schedule.next_inner = Some(flips.saturating_add(interval));

        let stats = ctx.part_mut(StatsP);
        stats.restarts.max_interval = stats.restarts.max_interval.max(interval);
    }

    pick_strategy(ctx.borrow());
    apply_strategy(ctx.borrow())?;
    seed_assignment(ctx.borrow(), true);
    reinit(ctx.borrow())?;

    ctx.part_mut(StatsP).time.restart += start.elapsed();

    let stats = ctx.part(StatsP);
    if verbose > 0 {
        info!(
            "restart {} at {} flips, {} unsatisfied before, {} after, minimum {}",
            stats.restarts.inner,
            flips,
            unsat_count,
            ctx.part(UnsatP).len(),
            stats.minimum
        );
    } else {
        debug!(
            "restart {} at {} flips with {} unsatisfied",
            stats.restarts.inner, flips, unsat_count
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use crate::config::ClausePicking;
    use crate::crit::verify;
    use crate::search::search;
    use crate::state::SatState;
    use crate::test::loaded_context;

    #[test]
    fn reluctant_intervals() {
        let formula = vec![vec![1, 2], vec![-1, 2], vec![1, -2], vec![-1, -2]];
        let mut ctx = loaded_context(&formula, &[("restart", 10), ("prep", 0)]);
        let mut ctx = ctx.into_partial_ref_mut();

        assert_eq!(ctx.part(ScheduleP).next_inner(), Some(10));

        let mut intervals = vec![];
        for _ in 0..7 {
            let flips = ctx.part(StatsP).flips;
            restart(ctx.borrow()).unwrap();
            verify(ctx.borrow());
            intervals.push(ctx.part(ScheduleP).next_inner().unwrap() - flips);
        }
        assert_eq!(intervals, vec![10, 10, 20, 10, 10, 20, 40]);
        assert_eq!(ctx.part(StatsP).restarts.inner, 7);
        assert_eq!(ctx.part(StatsP).restarts.max_interval, 40);
        assert_eq!(ctx.part(UnsatP).len(), 1);
    }

    #[test]
    fn disabled_restarts() {
        let formula = vec![vec![1, 2]];
        let mut ctx = loaded_context(&formula, &[("restart", 0)]);
        let mut ctx = ctx.into_partial_ref_mut();
        assert_eq!(ctx.part(ScheduleP).next_inner(), None);
        ctx.part_mut(StatsP).flips = u64::max_value() / 2;
        assert!(!restart_due(ctx.borrow()));
    }

    #[test]
    fn outer_restart_resets_sequence() {
        let formula = vec![vec![1, 2], vec![-1, -2]];
        let mut ctx = loaded_context(
            &formula,
            &[
                ("restart", 1),
                ("restartouter", 1),
                ("restartouterfactor", 4),
                ("prep", 0),
            ],
        );
        let mut ctx = ctx.into_partial_ref_mut();
        assert_eq!(ctx.part(ScheduleP).next_outer(), 4);

        ctx.part_mut(StatsP).flips = 4;
        restart(ctx.borrow()).unwrap();
        assert_eq!(ctx.part(StatsP).restarts.outer, 1);
        assert_eq!(ctx.part(ScheduleP).next_outer(), 8);
        assert_eq!(ctx.part(ScheduleP).next_inner(), Some(5));
    }

    #[test]
    fn cached_assignments_are_reused() {
        let formula = vec![vec![1, 2, 3], vec![-1, -2], vec![-2, -3]];
        let mut ctx = loaded_context(
            &formula,
            &[("fixed", 1), ("cached", 1), ("pol", 1), ("prep", 0)],
        );
        let mut ctx = ctx.into_partial_ref_mut();

        restart(ctx.borrow()).unwrap();
        assert_eq!(ctx.part(StatsP).cache.inserted, 1);
        assert_eq!(ctx.part(CacheP).len(), 1);
        // The only cached assignment is the all true seed.
        assert_eq!(ctx.part(StatsP).seed.cached, 1);

        restart(ctx.borrow()).unwrap();
        assert_eq!(ctx.part(StatsP).cache.skipped, 1);
        assert_eq!(ctx.part(StatsP).cache.inserted, 1);
        verify(ctx.borrow());
    }

    #[test]
    fn keep_and_best_seeds() {
        let formula = vec![vec![1, 2], vec![-1, 3], vec![-3, -2]];
        let mut ctx = loaded_context(&formula, &[("keep", 1), ("prep", 0)]);
        let mut ctx = ctx.into_partial_ref_mut();
        let vals = ctx.part(AssignmentP).vals.clone();
        restart(ctx.borrow()).unwrap();
        assert_eq!(ctx.part(AssignmentP).vals, vals);
        assert_eq!(ctx.part(StatsP).seed.keep, 1);

        let mut ctx = loaded_context(&formula, &[("best", 1), ("prep", 0)]);
        let mut ctx = ctx.into_partial_ref_mut();
        ctx.part_mut(AssignmentP).vals.toggle(0);
        restart(ctx.borrow()).unwrap();
        assert_eq!(ctx.part(AssignmentP).vals, ctx.part(AssignmentP).best);
        assert_eq!(ctx.part(StatsP).seed.best, 1);
        verify(ctx.borrow());
    }

    #[test]
    fn uniform_formulas_override_picking() {
        let uniform = vec![vec![1, 2], vec![-1, 3], vec![-3, -2]];
        let mut ctx = loaded_context(&uniform, &[("pick", 1), ("unipick", 2), ("prep", 0)]);
        let ctx = ctx.into_partial_ref_mut();
        assert!(ctx.part(SolverStateP).uniform);
        assert_eq!(ctx.part(SolverStateP).picking, ClausePicking::Dfs);

        let mixed = vec![vec![1, 2], vec![-1, 3], vec![-3, -2, 4]];
        let mut ctx = loaded_context(&mixed, &[("pick", 1), ("unipick", 2), ("prep", 0)]);
        let ctx = ctx.into_partial_ref_mut();
        assert!(!ctx.part(SolverStateP).uniform);
        assert_eq!(ctx.part(SolverStateP).picking, ClausePicking::Bfs);
    }

    #[test]
    fn uniform_restart_cap() {
        let options = [("restart", 10), ("unirestarts", 2), ("prep", 0)];

        let uniform = vec![vec![1, 2], vec![-1, 2], vec![1, -2], vec![-1, -2]];
        let mut ctx = loaded_context(&uniform, &options);
        let mut ctx = ctx.into_partial_ref_mut();
        ctx.part_mut(SolverStateP).flips_limit = Some(500);
        assert_eq!(search(ctx.borrow()).unwrap(), SatState::Unknown);
        assert_eq!(ctx.part(StatsP).flips, 500);
        assert_eq!(ctx.part(StatsP).restarts.inner, 2);

        let mut mixed = uniform.clone();
        mixed.push(vec![1, 2, 3]);
        let mut ctx = loaded_context(&mixed, &options);
        let mut ctx = ctx.into_partial_ref_mut();
        ctx.part_mut(SolverStateP).flips_limit = Some(500);
        assert_eq!(search(ctx.borrow()).unwrap(), SatState::Unknown);
        assert!(ctx.part(StatsP).restarts.inner > 2);
    }
}
