//! The local search loop.
use std::time::Instant;

use partial_ref::{partial, PartialRef};

use log::{info, trace};

use crate::config::ClausePicking;
use crate::context::{
    AssignmentP, CacheP, CallbacksP, ClauseDbP, Context, CritP, ExpP, MemP, OccsP, OffloadP,
    OptionsP, RngP, ScheduleP, SolverStateP, StatsP, StrategyP, TmpDataP, TrailP, UnsatP,
    WeightsP,
};
use crate::crit;
use crate::flip::flip;
use crate::mem::MemError;
use crate::pick::{pick_clause, pick_literal};
use crate::prep::preprocess;
use crate::restart::{apply_strategy, init_schedule, reinit, restart, restart_due, seed_assignment};
use crate::state::SatState;
use crate::strategy::Strategy;
use crate::unsat::{Unsat, UnsatTracker};
use crate::weight::adapt_weights;

/// Freeze the formula and build all search tables.
///
/// Runs once, on the first solve call. Stops after preprocessing when that finds the formula
/// trivially unsatisfiable.
pub fn setup(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut CacheP,
        mut ClauseDbP,
        mut CritP,
        mut ExpP,
        mut MemP,
        mut OccsP,
        mut SolverStateP,
        mut StatsP,
        mut TmpDataP,
        mut WeightsP,
        OptionsP,
    ),
) -> Result<(), MemError> {
    ctx.part_mut(SolverStateP).formula_frozen = true;
    let var_count = ctx.part(SolverStateP).var_count;

    {
        let (assignment, mut ctx) = ctx.split_part_mut(AssignmentP);
        let (mem, mut ctx) = ctx.split_part_mut(MemP);
        assignment.set_var_count(mem, var_count)?;
        let stats = ctx.part_mut(StatsP);
        stats.var_flips = mem.alloc(var_count, 0)?;
        stats.minimum = usize::max_value();
    }

    if ctx.part(OptionsP).prep != 0 {
        preprocess(ctx.borrow())?;
        if ctx.part(SolverStateP).trivially_unsat {
            return Ok(());
        }
    }

    let options = ctx.part(OptionsP);
    let crit_enabled = options.crit != 0;
    let cache_min = options.cachemin as usize;
    let cache_max = options.cachemax as usize;

    let (clause_db, mut ctx) = ctx.split_part(ClauseDbP);
    let (mem, mut ctx) = ctx.split_part_mut(MemP);
    let clause_count = clause_db.len();

    ctx.part_mut(OccsP).build(mem, clause_db, var_count)?;
    ctx.part_mut(CritP).init(
        mem,
        clause_count,
        var_count,
        clause_db.max_len(),
        crit_enabled,
    )?;
    ctx.part_mut(ExpP).init(mem)?;
    ctx.part_mut(WeightsP).init(mem, clause_count)?;
    ctx.part_mut(CacheP).reset_target(cache_min, cache_max);

    let uniform = clause_db.is_uniform();
    ctx.part_mut(SolverStateP).uniform = uniform;

    info!(
        "formula: {} variables, {} clauses, {} binary, {} ternary",
        var_count,
        clause_count,
        clause_db.binary_count(),
        clause_db.ternary_count()
    );
    info!(
        "clause length: {} minimum, {} maximum, {:.2} average{}",
        clause_db.min_len(),
        clause_db.max_len(),
        clause_db.avg_len(),
        if uniform { ", uniform" } else { "" }
    );

    Ok(())
}

/// Prepare a solve call.
///
/// Selects the clause picking policy, installs the default strategy and recomputes all derived
/// state. The first call seeds the assignment, later calls continue from the current one.
pub fn start_run(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut CritP,
        mut ExpP,
        mut MemP,
        mut OffloadP,
        mut RngP,
        mut ScheduleP,
        mut SolverStateP,
        mut StatsP,
        mut StrategyP,
        mut TrailP,
        mut UnsatP,
        mut WeightsP,
        CacheP,
        ClauseDbP,
        OptionsP,
    ),
) -> Result<(), MemError> {
    let options = ctx.part(OptionsP);
    let uniform = ctx.part(SolverStateP).uniform;
    let picking = if uniform && options.unipick >= 0 {
        ClausePicking::from_option(options.unipick)
    } else {
        options.clause_picking()
    };
    let strategy = Strategy::from_options(options);

    ctx.part_mut(SolverStateP).picking = picking;
    *ctx.part_mut(StrategyP) = strategy;
    apply_strategy(ctx.borrow())?;

    if !ctx.part(SolverStateP).assignment_seeded {
        seed_assignment(ctx.borrow(), false);
        ctx.part_mut(SolverStateP).assignment_seeded = true;
    }

    reinit(ctx.borrow())?;
    init_schedule(ctx.borrow());
    update_minimum(ctx.borrow());

    info!(
        "search starts with {} unsatisfied clauses using {:?} picking",
        ctx.part(UnsatP).len(),
        picking
    );

    Ok(())
}

/// Save the current assignment as the best one if it has fewer unsatisfied clauses.
///
/// Reaching the minimum again counts as a hit.
fn update_minimum(mut ctx: partial!(Context, mut AssignmentP, mut StatsP, mut TrailP, UnsatP)) {
    let unsat_count = ctx.part(UnsatP).len();
    let minimum = ctx.part(StatsP).minimum;
    if unsat_count > minimum {
        return;
    }
    if unsat_count == minimum {
        ctx.part_mut(StatsP).hits += 1;
        return;
    }

    let (trail, mut ctx) = ctx.split_part_mut(TrailP);
    trail.save_best(ctx.part_mut(AssignmentP));

    let stats = ctx.part_mut(StatsP);
    stats.minimum = unsat_count;
    stats.hits = 1;
    trace!("new minimum {} after {} flips", unsat_count, stats.flips);
}

/// Why a search loop stopped.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Stop {
    Target,
    Flips,
    Mems,
    Time,
    Hits,
    Terminated,
}

/// Run the local search until the target is reached or a budget is exhausted.
///
/// Budgets are relative to the start of the call. The termination callback and the time limit
/// are polled once every `termint` flips. With `hitlim` the search also stops once the minimum
/// has been reached that many times.
pub fn search(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut CacheP,
        mut CallbacksP,
        mut CritP,
        mut ExpP,
        mut MemP,
        mut OffloadP,
        mut RngP,
        mut ScheduleP,
        mut SolverStateP,
        mut StatsP,
        mut StrategyP,
        mut TmpDataP,
        mut TrailP,
        mut UnsatP,
        mut WeightsP,
        ClauseDbP,
        OccsP,
        OptionsP,
    ),
) -> Result<SatState, MemError> {
    let start = Instant::now();

    let options = ctx.part(OptionsP);
    let target = options.target as usize;
    let poll_interval = options.termint.max(1) as u64;
    let checking = options.checking != 0 && cfg!(debug_assertions);
    let hit_limit = if options.hitlim >= 0 {
        Some(options.hitlim as u64)
    } else {
        None
    };

    let state = ctx.part(SolverStateP);
    let flips_limit = state.flips_limit;
    let mems_limit = state.mems_limit;
    let time_limit = state.time_limit;

    let start_flips = ctx.part(StatsP).flips;
    let start_mems = ctx.part(StatsP).mems.all;
    let mut last_poll = None;

    let stop = loop {
        if ctx.part(UnsatP).len() <= target {
            break Stop::Target;
        }

        let stats = ctx.part(StatsP);
        let flips = stats.flips - start_flips;
        if flips_limit.map_or(false, |limit| flips >= limit) {
            break Stop::Flips;
        }
        if mems_limit.map_or(false, |limit| stats.mems.all - start_mems >= limit) {
            break Stop::Mems;
        }
        if hit_limit.map_or(false, |limit| stats.hits >= limit) {
            break Stop::Hits;
        }
        if flips % poll_interval == 0 && last_poll != Some(flips) {
            last_poll = Some(flips);
            if ctx.part_mut(CallbacksP).should_terminate() {
                break Stop::Terminated;
            }
            if time_limit.map_or(false, |limit| start.elapsed() >= limit) {
                break Stop::Time;
            }
        }

        if restart_due(ctx.borrow()) {
            restart(ctx.borrow())?;
            update_minimum(ctx.borrow());
            continue;
        }

        let cidx = match pick_clause(ctx.borrow()) {
            Some(cidx) => cidx,
            None => break Stop::Target,
        };
        let lit = pick_literal(ctx.borrow(), cidx);
        let var = lit.var();

        flip(ctx.borrow(), var)?;

        let var_count = ctx.part(AssignmentP).var_count();
        let (trail, mut ctx_mem) = ctx.split_part_mut(TrailP);
        trail.push(ctx_mem.part_mut(MemP), var, var_count)?;

        adapt_weights(ctx.borrow());
        update_minimum(ctx.borrow());

        if checking {
            crit::verify(ctx.borrow());
        }
    };

    let unsat_count = ctx.part(UnsatP).len();
    let sat_state = if unsat_count == 0 {
        SatState::Sat
    } else {
        SatState::Unknown
    };
    ctx.part_mut(SolverStateP).sat_state = sat_state;

    {
        let (unsat, mut ctx) = ctx.split_part_mut(UnsatP);
        ctx.part_mut(StatsP).record_unsat(unsat);
        unsat.clear(ctx.part_mut(MemP));
        *unsat = Unsat::default();
    }

    let stats = ctx.part_mut(StatsP);
    stats.time.total += start.elapsed();

    info!(
        "search stopped ({:?}) after {} flips with {} unsatisfied clauses, minimum {}",
        stop,
        stats.flips - start_flips,
        unsat_count,
        stats.minimum
    );

    Ok(sat_state)
}
