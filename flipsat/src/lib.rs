//! Flipsat is a [stochastic local search][sls] SAT engine. Given a boolean formula in
//! [conjunctive normal form][cnf], it flips variables of a complete assignment until every clause
//! is satisfied or a budget is exhausted. It never proves unsatisfiability.
//!
//! Clauses are picked from the unsatisfied ones and a literal of the picked clause is selected
//! with probabilities derived from the break values of its variables. Restarts, clause weights and
//! a cache of good assignments diversify the search.
//!
//! [sls]: https://en.wikipedia.org/wiki/WalkSAT
//! [cnf]: https://en.wikipedia.org/wiki/Conjunctive_normal_form

pub mod config;
pub mod lit;
pub mod mem;
pub mod offload;
pub mod solver;
pub mod stats;

mod assignment;
mod cache;
mod callbacks;
mod clause;
mod context;
mod crit;
mod exp;
mod flip;
mod load;
mod occs;
mod pick;
mod prep;
mod restart;
mod rng;
mod search;
mod state;
mod strategy;
mod tmp;
mod trail;
mod unsat;
mod weight;


pub use config::{ConfigError, OptionDescriptor, OptionTable, Options};
pub use lit::{Lit, Var};
pub use solver::{SolveResult, Solver, SolverError};

pub mod dimacs {
    //! DIMACS CNF parser and writer.
    pub use flipsat_dimacs::*;
}
