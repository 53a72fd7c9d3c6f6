//! Boundary to an accelerator running the per flip bookkeeping.
//!
//! An [`Offload`] implementation mirrors the search state on a device. The engine always keeps its
//! own state up to date, so an implementation can take over picking, or merely observe, and the
//! engine runs unchanged when no implementation is attached.
use crate::assignment::Bits;
use crate::clause::ClauseDb;
use crate::lit::{Lit, Var};

/// Read only view of the formula and the current assignment handed to a device on load.
pub struct DeviceState<'a> {
    clauses: &'a ClauseDb,
    vals: &'a Bits,
    var_count: usize,
}

impl<'a> DeviceState<'a> {
    pub(crate) fn new(clauses: &'a ClauseDb, vals: &'a Bits, var_count: usize) -> Self {
        DeviceState {
            clauses,
            vals,
            var_count,
        }
    }

    pub fn var_count(&self) -> usize {
        self.var_count
    }

    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    /// Literals of the clause with the given index.
    pub fn clause(&self, cidx: usize) -> &'a [Lit] {
        self.clauses.lits(cidx)
    }

    /// Current value of a variable.
    pub fn value(&self, var: Var) -> bool {
        self.vals.get(var.index())
    }
}

/// Device side of the search.
pub trait Offload: Send {
    /// Upload the formula and the assignment. Called whenever the assignment was replaced.
    fn load_to_device(&mut self, state: &DeviceState<'_>);

    /// Apply a flip that made `lit` true.
    fn flip(&mut self, lit: Lit);

    /// Pick an unsatisfied clause, `None` defers to the engine.
    fn pick_clause(&mut self) -> Option<usize> {
        None
    }

    /// Pick a literal of an unsatisfied clause, `None` defers to the engine.
    fn pick_literal(&mut self, _cidx: usize) -> Option<Lit> {
        None
    }

    /// Update the clauses containing `lit`, which just became true.
    fn make_clauses_after_flip(&mut self, lit: Lit);

    /// Update the clauses containing `!lit`, which just became false.
    fn break_clauses_after_flip(&mut self, lit: Lit);
}
