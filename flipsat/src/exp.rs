//! Exponentially decaying selection probabilities.
//!
//! A candidate literal with break value `b` is selected with probability proportional to
//! `base^-b`. The powers are precomputed until they drop below `EPS`; larger break values use
//! `EPS` itself so that no candidate ever gets probability zero.
use crate::mem::{Mem, MemError};

const EPS: f64 = 1e-30;

/// CB bases for selected maximum clause lengths, interpolated linearly in between.
const CB_VALUES: [(usize, f64); 6] = [
    (0, 2.0),
    (3, 2.5),
    (4, 2.85),
    (5, 3.7),
    (6, 5.1),
    (7, 7.4),
];

/// Interpolated CB base for a maximum clause length.
pub fn cb_for_len(max_len: usize) -> f64 {
    let mut lower = CB_VALUES[0];
    for &upper in CB_VALUES[1..].iter() {
        if max_len < upper.0 {
            let (lower_len, lower_cb) = lower;
            let (upper_len, upper_cb) = upper;
            let t = (max_len - lower_len) as f64 / (upper_len - lower_len) as f64;
            return lower_cb + t * (upper_cb - lower_cb);
        }
        lower = upper;
    }
    lower.1
}

/// Precomputed tables of negative powers.
#[derive(Default)]
pub struct Exp {
    two: Vec<f64>,
    cb: Vec<f64>,
    cb_base: f64,
    use_cb: bool,
}

fn fill_table(mem: &mut Mem, table: &mut Vec<f64>, base: f64) -> Result<(), MemError> {
    debug_assert!(base > 1.0);
    mem.release(table);
    let mut value = 1.0;
    while value >= EPS {
        mem.push(table, value)?;
        value /= base;
    }
    Ok(())
}

impl Exp {
    /// Compute the power of two table.
    pub fn init(&mut self, mem: &mut Mem) -> Result<(), MemError> {
        let mut two = vec![];
        fill_table(mem, &mut two, 2.0)?;
        self.two = two;
        self.use_cb = false;
        Ok(())
    }

    /// Select the table used by [`score`](Exp::score).
    ///
    /// `Some(base)` selects the CB table for that base, recomputing it when the base changed.
    pub fn select(&mut self, mem: &mut Mem, cb: Option<f64>) -> Result<(), MemError> {
        match cb {
            Some(base) => {
                if self.cb.is_empty() || (self.cb_base - base).abs() > 1e-12 {
                    let mut table = std::mem::replace(&mut self.cb, vec![]);
                    fill_table(mem, &mut table, base)?;
                    self.cb = table;
                    self.cb_base = base;
                }
                self.use_cb = true;
            }
            None => self.use_cb = false,
        }
        Ok(())
    }

    /// The base of the active table.
    pub fn base(&self) -> f64 {
        if self.use_cb {
            self.cb_base
        } else {
            2.0
        }
    }

    /// Relative selection weight of a break value.
    #[inline]
    pub fn score(&self, breaks: u64) -> f64 {
        let table = if self.use_cb { &self.cb } else { &self.two };
        table.get(breaks as usize).cloned().unwrap_or(EPS)
    }

    /// Number of entries in the active table.
    pub fn table_len(&self) -> usize {
        if self.use_cb {
            self.cb.len()
        } else {
            self.two.len()
        }
    }

    pub fn clear(&mut self, mem: &mut Mem) {
        mem.release(&mut self.two);
        mem.release(&mut self.cb);
    }
}
