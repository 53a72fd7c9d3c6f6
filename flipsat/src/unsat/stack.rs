//! Stack backend of the unsatisfied clause tracker.
use crate::mem::{Mem, MemError};

use super::UnsatTracker;

const NIL: u32 = u32::max_value();

/// Unsatisfied clauses as a dense array with O(1) swap removal.
#[derive(Default)]
pub struct UnsatStack {
    cidxs: Vec<u32>,
    /// Position of each clause in `cidxs`, `NIL` for non-members.
    pos: Vec<u32>,
    max_len: usize,
}

impl UnsatStack {
    pub fn new(mem: &mut Mem, clause_count: usize) -> Result<UnsatStack, MemError> {
        Ok(UnsatStack {
            cidxs: vec![],
            pos: mem.alloc(clause_count, NIL)?,
            max_len: 0,
        })
    }

    /// Member at a position of the stack.
    #[inline]
    pub fn get(&self, index: usize) -> usize {
        self.cidxs[index] as usize
    }

    /// Members in stack order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.cidxs.iter().map(|&cidx| cidx as usize)
    }

    /// Largest size seen.
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

impl UnsatTracker for UnsatStack {
    #[inline]
    fn contains(&self, cidx: usize) -> bool {
        self.pos[cidx] != NIL
    }

    fn insert(&mut self, mem: &mut Mem, cidx: usize) -> Result<(), MemError> {
        debug_assert!(!self.contains(cidx));
        self.pos[cidx] = self.cidxs.len() as u32;
        mem.push(&mut self.cidxs, cidx as u32)?;
        self.max_len = self.max_len.max(self.cidxs.len());
        Ok(())
    }

    fn remove(&mut self, _mem: &mut Mem, cidx: usize) -> Result<(), MemError> {
        debug_assert!(self.contains(cidx));
        let pos = self.pos[cidx];
        if let Some(last) = self.cidxs.pop() {
            if last as usize != cidx {
                self.cidxs[pos as usize] = last;
                self.pos[last as usize] = pos;
            }
        }
        self.pos[cidx] = NIL;
        Ok(())
    }

    #[inline]
    fn len(&self) -> usize {
        self.cidxs.len()
    }

    fn clear(&mut self, mem: &mut Mem) {
        mem.release(&mut self.cidxs);
        mem.release(&mut self.pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn matches_model(ops in proptest::collection::vec((0..30usize, any::<bool>()), 0..300)) {
            let mut mem = Mem::default();
            let mut stack = UnsatStack::new(&mut mem, 30).unwrap();
            let mut model = vec![false; 30];

            for (cidx, remove) in ops {
                if model[cidx] && remove {
                    stack.remove(&mut mem, cidx).unwrap();
                    model[cidx] = false;
                } else if !model[cidx] && !remove {
                    stack.insert(&mut mem, cidx).unwrap();
                    model[cidx] = true;
                }

                prop_assert_eq!(stack.len(), model.iter().filter(|&&member| member).count());
                for index in 0..stack.len() {
                    let member = stack.get(index);
                    prop_assert!(model[member]);
                    prop_assert_eq!(stack.pos[member] as usize, index);
                }
            }
        }
    }
}
