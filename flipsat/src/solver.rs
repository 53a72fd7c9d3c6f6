//! Stochastic local search engine.
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use partial_ref::{IntoPartialRef, IntoPartialRefMut, PartialRef};

use log::{error, info};
use thiserror::Error;

use crate::config::{ConfigError, OptionTable};
use crate::context::{
    AssignmentP, CallbacksP, Context, MemP, OffloadP, OptionsP, RngP, SolverStateP, StatsP,
};
use crate::dimacs::DimacsParser;
use crate::lit::{Lit, Var};
use crate::load::add_literal;
use crate::mem::{Mem, MemError, MemoryManager};
use crate::offload::Offload;
use crate::search::{search, setup, start_run};
use crate::state::SatState;
use crate::stats::Stats;

/// Errors reported by the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolverError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Mem(#[from] MemError),
    #[error("literal {lit} exceeds the maximal variable index")]
    VarIndexOverflow { lit: i32 },
    #[error("empty clause in the input")]
    EmptyClause,
    #[error("clauses cannot be added after the search started")]
    FormulaFrozen,
    #[error("the last clause was not terminated by zero")]
    UnterminatedClause,
    #[error("the engine is unusable after a previous error")]
    InvalidState,
}

impl SolverError {
    /// Whether the error leaves the engine unusable.
    pub fn is_fatal(&self) -> bool {
        match self {
            SolverError::Mem(_)
            | SolverError::VarIndexOverflow { .. }
            | SolverError::EmptyClause => true,
            _ => false,
        }
    }
}

/// Outcome of a solve call.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SolveResult {
    /// All clauses are satisfied by the current assignment.
    Satisfiable,
    /// A budget was exhausted, the search was terminated or the unsatisfied clause target was
    /// reached before all clauses were satisfied.
    Unknown,
}

/// A stochastic local search SAT engine.
#[derive(Default)]
pub struct Solver {
    ctx: Box<Context>,
}

impl Solver {
    /// Create a new engine.
    pub fn new() -> Solver {
        Solver::default()
    }

    /// Create a new engine whose tables are granted by the given memory manager.
    pub fn with_memory_manager(manager: Box<dyn MemoryManager>) -> Solver {
        Solver {
            ctx: Box::new(Context::with_mem(Mem::new(manager))),
        }
    }

    fn check_state(&self) -> Result<(), SolverError> {
        let ctx = self.ctx.into_partial_ref();
        if ctx.part(SolverStateP).state_is_invalid {
            Err(SolverError::InvalidState)
        } else {
            Ok(())
        }
    }

    /// Remember fatal errors, so that later calls fail.
    fn record<T>(&mut self, result: Result<T, SolverError>) -> Result<T, SolverError> {
        if let Err(err) = &result {
            if err.is_fatal() {
                error!("{}", err);
                let mut ctx = self.ctx.into_partial_ref_mut();
                let state = ctx.part_mut(SolverStateP);
                state.state_is_invalid = true;
                state.solver_error = Some(err.clone());
            }
        }
        result
    }

    /// The fatal error that made the engine unusable.
    pub fn solver_error(&self) -> Option<SolverError> {
        let ctx = self.ctx.into_partial_ref();
        ctx.part(SolverStateP).solver_error.clone()
    }

    /// Add a literal in DIMACS encoding, `0` terminates the clause.
    pub fn add_literal(&mut self, lit: i32) -> Result<(), SolverError> {
        self.check_state()?;
        let mut ctx = self.ctx.into_partial_ref_mut();
        let result = add_literal(ctx.borrow(), lit);
        self.record(result)
    }

    /// Add a clause of nonzero DIMACS literals.
    pub fn add_clause(&mut self, lits: &[i32]) -> Result<(), SolverError> {
        for &lit in lits {
            debug_assert!(lit != 0);
            self.add_literal(lit)?;
        }
        self.add_literal(0)
    }

    /// Reads and adds a formula in DIMACS CNF format.
    pub fn add_dimacs_cnf(&mut self, input: impl io::Read) -> Result<(), anyhow::Error> {
        let parser = DimacsParser::parse_incremental(input, |parser| {
            for lit in parser.take_lits() {
                self.add_literal(lit)?;
            }
            Ok(())
        })?;

        if let Some(header) = parser.header() {
            let mut ctx = self.ctx.into_partial_ref_mut();
            let state = ctx.part_mut(SolverStateP);
            if !state.formula_frozen {
                state.var_count = state.var_count.max(header.var_count);
            }
        }

        info!(
            "parsed formula with {} variables and {} clauses",
            parser.var_count(),
            parser.clause_count()
        );

        Ok(())
    }

    /// Set a named option.
    pub fn set_option(&mut self, name: &str, value: i32) -> Result<(), SolverError> {
        let mut ctx = self.ctx.into_partial_ref_mut();
        Ok(ctx.part_mut(OptionsP).set(name, value)?)
    }

    /// Current value of a named option.
    pub fn get_option(&self, name: &str) -> Result<i32, SolverError> {
        let ctx = self.ctx.into_partial_ref();
        Ok(ctx.part(OptionsP).get(name)?)
    }

    /// Seed the random source.
    pub fn seed(&mut self, seed: u64) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(RngP).seed(seed);
    }

    /// Prefer the given polarity for a variable in random seeds.
    pub fn set_phase(&mut self, lit: i32) -> Result<(), SolverError> {
        if lit == 0 || (lit as i64).abs() as u64 > Var::max_count() as u64 {
            return Err(SolverError::VarIndexOverflow { lit });
        }
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(AssignmentP).phases.push(Lit::from_dimacs(lit));
        Ok(())
    }

    /// Limit the flips of each following solve call.
    pub fn set_flips_limit(&mut self, limit: Option<u64>) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(SolverStateP).flips_limit = limit;
    }

    /// Limit the memory accesses of each following solve call.
    pub fn set_mems_limit(&mut self, limit: Option<u64>) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(SolverStateP).mems_limit = limit;
    }

    /// Limit the run time of each following solve call.
    pub fn set_time_limit(&mut self, limit: Option<Duration>) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(SolverStateP).time_limit = limit;
    }

    /// Install a callback polled every `termint` flips, returning `true` stops the search.
    pub fn set_terminate(&mut self, terminate: impl FnMut() -> bool + Send + 'static) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(CallbacksP).terminate = Some(Box::new(terminate));
    }

    /// Share a lock held while printing statistics.
    pub fn set_msg_lock(&mut self, lock: Arc<Mutex<()>>) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(CallbacksP).msg_lock = Some(lock);
    }

    /// Mirror the search on a device.
    pub fn attach_offload(&mut self, device: Box<dyn Offload>) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        *ctx.part_mut(OffloadP) = Some(device);
    }

    /// Search for a satisfying assignment.
    ///
    /// The first call freezes the formula. Later calls continue from the current assignment with
    /// fresh budgets.
    pub fn solve(&mut self) -> Result<SolveResult, SolverError> {
        self.check_state()?;
        let result = self.solve_inner();
        self.record(result)
    }

    fn solve_inner(&mut self) -> Result<SolveResult, SolverError> {
        let mut ctx = self.ctx.into_partial_ref_mut();

        if ctx.part(SolverStateP).clause_open {
            return Err(SolverError::UnterminatedClause);
        }

        if !ctx.part(SolverStateP).formula_frozen {
            setup(ctx.borrow())?;
        }

        let state = ctx.part(SolverStateP);
        if state.trivially_unsat {
            return Ok(SolveResult::Unknown);
        }
        if state.sat_state == SatState::Sat {
            return Ok(SolveResult::Satisfiable);
        }

        start_run(ctx.borrow())?;

        Ok(match search(ctx.borrow())? {
            SatState::Sat => SolveResult::Satisfiable,
            SatState::Unknown => SolveResult::Unknown,
        })
    }

    /// Whether preprocessing found the formula unsatisfiable.
    pub fn trivially_unsat(&self) -> bool {
        let ctx = self.ctx.into_partial_ref();
        ctx.part(SolverStateP).trivially_unsat
    }

    /// Satisfying assignment as DIMACS literals, one per variable.
    pub fn model(&self) -> Option<Vec<i32>> {
        let ctx = self.ctx.into_partial_ref();
        if ctx.part(SolverStateP).sat_state == SatState::Sat {
            Some(self.best_lits())
        } else {
            None
        }
    }

    /// Value of a literal in the best assignment found.
    ///
    /// `None` for unknown variables or before the first search.
    pub fn value(&self, lit: i32) -> Option<bool> {
        let ctx = self.ctx.into_partial_ref();
        let assignment = ctx.part(AssignmentP);
        if lit == 0 || (lit as i64).abs() as u64 > assignment.var_count() as u64 {
            return None;
        }
        Some(assignment.best_lit_is_true(Lit::from_dimacs(lit)))
    }

    /// Best assignment found as DIMACS literals, one per variable.
    pub fn best_lits(&self) -> Vec<i32> {
        let ctx = self.ctx.into_partial_ref();
        let assignment = ctx.part(AssignmentP);
        (0..assignment.var_count())
            .map(|index| Var::from_index(index).lit(assignment.best.get(index)).to_dimacs())
            .collect()
    }

    /// Fewest unsatisfied clauses seen, `None` before the first search.
    pub fn minimum(&self) -> Option<usize> {
        let ctx = self.ctx.into_partial_ref();
        let stats = ctx.part(StatsP);
        if !ctx.part(SolverStateP).formula_frozen || stats.minimum == usize::max_value() {
            None
        } else {
            Some(stats.minimum)
        }
    }

    /// The literal of the most frequently flipped variable, in its best polarity.
    pub fn lookahead(&self) -> Option<i32> {
        let ctx = self.ctx.into_partial_ref();
        let (index, &count) = ctx
            .part(StatsP)
            .var_flips
            .iter()
            .enumerate()
            .max_by_key(|&(index, count)| (count, std::cmp::Reverse(index)))?;
        if count == 0 {
            return None;
        }
        let value = ctx.part(AssignmentP).best.get(index);
        Some(Var::from_index(index).lit(value).to_dimacs())
    }

    /// Total number of flips.
    pub fn flips(&self) -> u64 {
        let ctx = self.ctx.into_partial_ref();
        ctx.part(StatsP).flips
    }

    /// Total number of estimated memory accesses.
    pub fn mems(&self) -> u64 {
        let ctx = self.ctx.into_partial_ref();
        ctx.part(StatsP).mems.all
    }

    /// Peak number of bytes held by the engine's tables.
    pub fn max_allocated(&self) -> usize {
        let ctx = self.ctx.into_partial_ref();
        ctx.part(MemP).max()
    }

    /// Snapshot of the statistics of all solve calls.
    pub fn stats(&self) -> Stats {
        let ctx = self.ctx.into_partial_ref();
        ctx.part(StatsP).clone()
    }

    /// Log all statistics while holding the message lock.
    pub fn print_stats(&self) {
        let ctx = self.ctx.into_partial_ref();
        ctx.part(CallbacksP)
            .with_msg_lock(|| ctx.part(StatsP).log(ctx.part(MemP).max()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::dimacs::write_dimacs;
    use crate::test::sat_formula;

    fn satisfies(model: &[i32], formula: &[Vec<i32>]) -> bool {
        formula
            .iter()
            .all(|clause| clause.iter().any(|lit| model.contains(lit)))
    }

    #[test]
    fn two_clauses() {
        let mut solver = Solver::new();
        solver.add_clause(&[1, 2]).unwrap();
        solver.add_clause(&[-1, -2]).unwrap();

        assert_eq!(solver.solve(), Ok(SolveResult::Satisfiable));
        let model = solver.model().unwrap();
        assert_eq!(model.len(), 2);
        assert!(model.contains(&1) != model.contains(&2));
        assert_eq!(solver.value(1), Some(model.contains(&1)));
        assert_eq!(solver.minimum(), Some(0));
    }

    #[test]
    fn contradictory_units() {
        for &prep in [0, 1].iter() {
            let mut solver = Solver::new();
            solver.set_option("prep", prep).unwrap();
            solver.add_clause(&[1]).unwrap();
            solver.add_clause(&[-1]).unwrap();
            solver.set_flips_limit(Some(1000));

            assert_eq!(solver.solve(), Ok(SolveResult::Unknown));
            assert_eq!(solver.model(), None);
            assert_eq!(solver.trivially_unsat(), prep == 1);
            if prep == 0 {
                assert_eq!(solver.flips(), 1000);
                assert_eq!(solver.minimum(), Some(1));
                assert_eq!(solver.lookahead().map(i32::abs), Some(1));
            }
        }
    }

    #[test]
    fn errors() {
        let mut solver = Solver::new();
        assert!(matches!(
            solver.set_option("nosuchoption", 1),
            Err(SolverError::Config(ConfigError::UnknownOption { .. }))
        ));
        assert!(matches!(
            solver.set_option("weight", 8),
            Err(SolverError::Config(ConfigError::OutOfRange { .. }))
        ));
        assert_eq!(solver.get_option("weight"), Ok(5));

        solver.add_literal(1).unwrap();
        assert_eq!(solver.solve(), Err(SolverError::UnterminatedClause));
        solver.add_literal(0).unwrap();
        assert_eq!(solver.solve(), Ok(SolveResult::Satisfiable));
        assert_eq!(solver.add_clause(&[2]), Err(SolverError::FormulaFrozen));

        let mut solver = Solver::new();
        assert_eq!(solver.add_literal(0), Err(SolverError::EmptyClause));
        assert_eq!(solver.add_clause(&[1]), Err(SolverError::InvalidState));
        assert_eq!(solver.solve(), Err(SolverError::InvalidState));
        assert_eq!(solver.solver_error(), Some(SolverError::EmptyClause));
    }

    #[test]
    fn empty_formula() {
        let mut solver = Solver::new();
        assert_eq!(solver.solve(), Ok(SolveResult::Satisfiable));
        assert_eq!(solver.model(), Some(vec![]));
    }

    #[test]
    fn out_of_memory_is_fatal() {
        let manager = crate::mem::BoundedManager::new(64);
        let mut solver = Solver::with_memory_manager(Box::new(manager));
        let mut result = Ok(());
        for var in 1..100 {
            result = solver.add_clause(&[var, var + 1]);
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(SolverError::Mem(_))));
        assert_eq!(solver.solve(), Err(SolverError::InvalidState));
    }

    #[test]
    fn phases_seed_assignment() {
        let mut solver = Solver::new();
        solver.add_clause(&[1, 2, 3]).unwrap();
        solver.set_option("pol", 0).unwrap();
        solver.set_option("fixed", 1).unwrap();
        solver.set_phase(1).unwrap();
        solver.set_phase(-2).unwrap();
        solver.set_phase(3).unwrap();
        assert!(solver.set_phase(0).is_err());

        assert_eq!(solver.solve(), Ok(SolveResult::Satisfiable));
        assert_eq!(solver.flips(), 0);
        assert_eq!(solver.model(), Some(vec![1, -2, 3]));
    }

    proptest! {
        #[test]
        fn sat(formula in sat_formula(4..20usize, 10..100usize, 0.05..0.2, 0.9..1.0)) {
            let mut solver = Solver::new();
            for clause in formula.iter() {
                solver.add_clause(clause).unwrap();
            }

            prop_assert_eq!(solver.solve(), Ok(SolveResult::Satisfiable));
            let model = solver.model().unwrap();
            prop_assert!(satisfies(&model, &formula));
        }

        #[test]
        fn sat_via_dimacs(formula in sat_formula(4..20usize, 10..100usize, 0.05..0.2, 0.9..1.0)) {
            let mut solver = Solver::new();
            solver.set_option("pick", 0).unwrap();
            solver.set_option("crit", 0).unwrap();

            let mut dimacs = vec![];
            write_dimacs(&mut dimacs, &formula).unwrap();
            solver.add_dimacs_cnf(&mut &dimacs[..]).unwrap();

            prop_assert_eq!(solver.solve(), Ok(SolveResult::Satisfiable));
            let model = solver.model().unwrap();
            prop_assert!(satisfies(&model, &formula));
        }

        #[test]
        fn sat_with_restarts_and_cache(
            formula in sat_formula(10..30usize, 50..150usize, 0.05..0.15, 0.9..1.0),
            seed in any::<u64>(),
        ) {
            let mut solver = Solver::new();
            solver.seed(seed);
            solver.set_option("restart", 20).unwrap();
            solver.set_option("restartouter", 1).unwrap();
            solver.set_option("restartouterfactor", 3).unwrap();
            solver.set_option("weightint", 5).unwrap();
            solver.set_option("checking", 1).unwrap();
            for clause in formula.iter() {
                solver.add_clause(clause).unwrap();
            }

            prop_assert_eq!(solver.solve(), Ok(SolveResult::Satisfiable));
            let model = solver.model().unwrap();
            prop_assert!(satisfies(&model, &formula));
        }
    }
}
