//! Variables flipped since the best assignment was last saved.
use crate::assignment::Assignment;
use crate::lit::Var;
use crate::mem::{Mem, MemError};

/// Flip trail used to update the best assignment in time proportional to the flips since.
///
/// When the trail would grow beyond the variable count it is dropped and the next save copies
/// the full assignment.
#[derive(Default)]
pub struct Trail {
    vars: Vec<Var>,
    overflowed: bool,
}

impl Trail {
    /// Record a flip.
    #[inline]
    pub fn push(&mut self, mem: &mut Mem, var: Var, var_count: usize) -> Result<(), MemError> {
        if self.overflowed {
            return Ok(());
        }
        if self.vars.len() >= var_count {
            self.vars.clear();
            self.overflowed = true;
            return Ok(());
        }
        mem.push(&mut self.vars, var)
    }

    /// The current assignment no longer follows from the trail.
    pub fn invalidate(&mut self) {
        self.vars.clear();
        self.overflowed = true;
    }

    /// Number of recorded flips.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Make the best assignment equal to the current one.
    pub fn save_best(&mut self, assignment: &mut Assignment) {
        if self.overflowed {
            let Assignment { vals, best, .. } = assignment;
            best.copy_from(vals);
        } else {
            for &var in self.vars.iter() {
                let value = assignment.var_value(var);
                assignment.best.set(var.index(), value);
            }
        }
        self.vars.clear();
        self.overflowed = false;
    }

    pub fn clear(&mut self, mem: &mut Mem) {
        mem.release(&mut self.vars);
        self.overflowed = false;
    }
}
