//! Miscellaneous solver state.
use std::time::Duration;

use crate::config::ClausePicking;
use crate::solver::SolverError;

/// Satisfiability state.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SatState {
    Unknown,
    Sat,
}

impl Default for SatState {
    fn default() -> SatState {
        SatState::Unknown
    }
}

/// Miscellaneous solver state.
///
/// Anything larger or any larger group of related state variables should be moved into a separate
/// part of [`Context`](crate::context::Context).
pub struct SolverState {
    pub sat_state: SatState,
    /// The formula was set up for search, further clauses are rejected.
    pub formula_frozen: bool,
    /// Unit propagation found a conflict.
    pub trivially_unsat: bool,
    /// A literal was added but its clause was not terminated yet.
    pub clause_open: bool,
    /// The current assignment was seeded by a previous solve call.
    pub assignment_seeded: bool,
    /// Largest variable count seen in the input.
    pub var_count: usize,
    /// All clauses have the same length.
    pub uniform: bool,
    /// Clause picking policy of the current solve call.
    pub picking: ClausePicking,
    /// Budgets for the next solve call, relative to its start.
    pub flips_limit: Option<u64>,
    pub mems_limit: Option<u64>,
    pub time_limit: Option<Duration>,
    pub state_is_invalid: bool,
    pub solver_error: Option<SolverError>,
}

impl Default for SolverState {
    fn default() -> SolverState {
        SolverState {
            sat_state: SatState::Unknown,
            formula_frozen: false,
            trivially_unsat: false,
            clause_open: false,
            assignment_seeded: false,
            var_count: 0,
            uniform: false,
            picking: ClausePicking::UnfairBfs,
            flips_limit: None,
            mems_limit: None,
            time_limit: None,
            state_is_invalid: false,
            solver_error: None,
        }
    }
}
