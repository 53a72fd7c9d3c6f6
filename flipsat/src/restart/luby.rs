//! Reluctant doubling.

/// Restart interval multipliers following the Luby sequence.
///
/// The state is the pair `(u, v)`. Each step yields `v`, then either doubles `v` or, once `v`
/// reached the largest power of two dividing `u`, moves on to `u + 1` and starts again at `v = 1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Luby {
    u: u64,
    v: u64,
}

impl Default for Luby {
    fn default() -> Luby {
        Luby { u: 1, v: 1 }
    }
}

impl Luby {
    /// Start over from the first term.
    pub fn reset(&mut self) {
        *self = Luby::default();
    }
}

impl Iterator for Luby {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let term = self.v;
        let lowest_bit = self.u & self.u.wrapping_neg();
        if lowest_bit == self.v {
            self.u += 1;
            self.v = 1;
        } else {
            self.v *= 2;
        }
        Some(term)
    }
}
