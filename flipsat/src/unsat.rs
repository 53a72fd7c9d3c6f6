//! Tracking of unsatisfied clauses.
//!
//! A clause is a member exactly when none of its literals is true. The tracker is only updated on
//! satisfied count transitions to and from zero.
use crate::mem::{Mem, MemError};

pub mod queue;
pub mod stack;

pub use queue::UnsatQueue;
pub use stack::UnsatStack;

/// Set of clause indices with constant time membership updates.
pub trait UnsatTracker {
    fn contains(&self, cidx: usize) -> bool;

    /// Add a clause. The clause must not be a member.
    fn insert(&mut self, mem: &mut Mem, cidx: usize) -> Result<(), MemError>;

    /// Remove a clause. The clause must be a member.
    fn remove(&mut self, mem: &mut Mem, cidx: usize) -> Result<(), MemError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release all storage.
    fn clear(&mut self, mem: &mut Mem);
}

/// The active backend, fixed for a solve call.
pub enum Unsat {
    Queue(UnsatQueue),
    Stack(UnsatStack),
}

impl Default for Unsat {
    fn default() -> Unsat {
        Unsat::Stack(UnsatStack::default())
    }
}

impl Unsat {
    /// Replace the backend with an empty one.
    pub fn reset(
        &mut self,
        mem: &mut Mem,
        clause_count: usize,
        use_queue: bool,
        min_chunk_size: usize,
        defrag: bool,
    ) -> Result<(), MemError> {
        self.clear(mem);
        *self = if use_queue {
            Unsat::Queue(UnsatQueue::new(mem, clause_count, min_chunk_size, defrag)?)
        } else {
            Unsat::Stack(UnsatStack::new(mem, clause_count)?)
        };
        Ok(())
    }

    /// Call `f` for every member, in backend order.
    pub fn for_each(&self, f: impl FnMut(usize)) {
        match self {
            Unsat::Queue(queue) => queue.iter().for_each(f),
            Unsat::Stack(stack) => stack.iter().for_each(f),
        }
    }

    /// All members, in backend order.
    pub fn members(&self) -> Vec<usize> {
        let mut members = Vec::with_capacity(self.len());
        self.for_each(|cidx| members.push(cidx));
        members
    }
}

impl UnsatTracker for Unsat {
    #[inline]
    fn contains(&self, cidx: usize) -> bool {
        match self {
            Unsat::Queue(queue) => queue.contains(cidx),
            Unsat::Stack(stack) => stack.contains(cidx),
        }
    }

    #[inline]
    fn insert(&mut self, mem: &mut Mem, cidx: usize) -> Result<(), MemError> {
        match self {
            Unsat::Queue(queue) => queue.insert(mem, cidx),
            Unsat::Stack(stack) => stack.insert(mem, cidx),
        }
    }

    #[inline]
    fn remove(&mut self, mem: &mut Mem, cidx: usize) -> Result<(), MemError> {
        match self {
            Unsat::Queue(queue) => queue.remove(mem, cidx),
            Unsat::Stack(stack) => stack.remove(mem, cidx),
        }
    }

    #[inline]
    fn len(&self) -> usize {
        match self {
            Unsat::Queue(queue) => queue.len(),
            Unsat::Stack(stack) => stack.len(),
        }
    }

    fn clear(&mut self, mem: &mut Mem) {
        match self {
            Unsat::Queue(queue) => queue.clear(mem),
            Unsat::Stack(stack) => stack.clear(mem),
        }
    }
}
