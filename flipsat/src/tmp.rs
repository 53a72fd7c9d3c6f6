//! Temporary data.
use crate::lit::Lit;

/// Temporary data used by various parts of the engine.
///
/// Contents are only meaningful within the operation that filled them, except where documented.
#[derive(Default)]
pub struct TmpData {
    /// Literals of the clause currently being added.
    pub clause: Vec<Lit>,
    /// Clauses made satisfied by the most recent flip.
    ///
    /// Filled by [`flip`](crate::flip::flip), consumed by weight adaptation.
    pub made: Vec<u32>,
    /// Literal picking candidates and their scores.
    pub cands: Vec<Lit>,
    pub scores: Vec<f64>,
    /// Literals waiting for unit propagation.
    pub units: Vec<Lit>,
}
