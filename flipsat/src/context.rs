//! Central solver data structure.
use partial_ref::{part, PartialRefTarget};

use crate::assignment::Assignment;
use crate::cache::Cache;
use crate::callbacks::Callbacks;
use crate::clause::ClauseDb;
use crate::config::Options;
use crate::crit::Crit;
use crate::exp::Exp;
use crate::mem::Mem;
use crate::occs::Occs;
use crate::offload::Offload;
use crate::restart::Schedule;
use crate::rng::Rng;
use crate::state::SolverState;
use crate::stats::Stats;
use crate::strategy::Strategy;
use crate::tmp::TmpData;
use crate::trail::Trail;
use crate::unsat::Unsat;
use crate::weight::Weights;

/// Part declarations for the [`Context`] struct.
mod parts {
    use super::*;

    part!(pub AssignmentP: Assignment);
    part!(pub CacheP: Cache);
    part!(pub CallbacksP: Callbacks);
    part!(pub ClauseDbP: ClauseDb);
    part!(pub CritP: Crit);
    part!(pub ExpP: Exp);
    part!(pub MemP: Mem);
    part!(pub OccsP: Occs);
    part!(pub OffloadP: Option<Box<dyn Offload>>);
    part!(pub OptionsP: Options);
    part!(pub RngP: Rng);
    part!(pub ScheduleP: Schedule);
    part!(pub SolverStateP: SolverState);
    part!(pub StatsP: Stats);
    part!(pub StrategyP: Strategy);
    part!(pub TmpDataP: TmpData);
    part!(pub TrailP: Trail);
    part!(pub UnsatP: Unsat);
    part!(pub WeightsP: Weights);
}

pub use parts::*;

/// Central solver data structure.
///
/// This struct contains all data kept by the engine. Functions operating on multiple fields use
/// partial references, which documents their data dependencies and lets the per flip updates
/// borrow disjoint parts mutably at the same time.
#[derive(PartialRefTarget, Default)]
pub struct Context {
    #[part = "AssignmentP"]
    assignment: Assignment,
    #[part = "CacheP"]
    cache: Cache,
    #[part = "CallbacksP"]
    callbacks: Callbacks,
    #[part = "ClauseDbP"]
    clause_db: ClauseDb,
    #[part = "CritP"]
    crit: Crit,
    #[part = "ExpP"]
    exp: Exp,
    #[part = "MemP"]
    mem: Mem,
    #[part = "OccsP"]
    occs: Occs,
    #[part = "OffloadP"]
    offload: Option<Box<dyn Offload>>,
    #[part = "OptionsP"]
    options: Options,
    #[part = "RngP"]
    rng: Rng,
    #[part = "ScheduleP"]
    schedule: Schedule,
    #[part = "SolverStateP"]
    solver_state: SolverState,
    #[part = "StatsP"]
    stats: Stats,
    #[part = "StrategyP"]
    strategy: Strategy,
    #[part = "TmpDataP"]
    tmp_data: TmpData,
    #[part = "TrailP"]
    trail: Trail,
    #[part = "UnsatP"]
    unsat: Unsat,
    #[part = "WeightsP"]
    weights: Weights,
}

impl Context {
    /// A context whose tracked tables are granted by the given memory manager.
    pub fn with_mem(mem: Mem) -> Context {
        Context {
            mem,
            ..Context::default()
        }
    }
}
