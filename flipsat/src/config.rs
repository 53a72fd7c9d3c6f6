//! Solver configuration.
//!
//! Every knob is a named integer with a default and an inclusive range. The table of names,
//! defaults, ranges and descriptions is generated from the field documentation of [`Options`], so
//! validation is uniform for all options.
use std::fmt::Write;

use thiserror::Error;

use flipsat_macros::OptionTable;

/// Invalid access to the option table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown option '{name}'")]
    UnknownOption { name: String },
    #[error("value {value} of option '{name}' is out of range [{min}, {max}]")]
    OutOfRange {
        name: String,
        value: i32,
        min: i32,
        max: i32,
    },
}

/// Name, default and range of a single option.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OptionDescriptor {
    pub name: &'static str,
    pub default: i32,
    pub min: i32,
    pub max: i32,
    pub description: &'static str,
}

/// Named access to a struct of integer options.
///
/// Implemented by `#[derive(OptionTable)]`.
pub trait OptionTable {
    /// One descriptor per option, in field order.
    const DESCRIPTORS: &'static [OptionDescriptor];

    /// Value of the option with the given descriptor index.
    fn value(&self, index: usize) -> i32;

    /// Mutable value of the option with the given descriptor index.
    fn value_mut(&mut self, index: usize) -> &mut i32;

    /// Descriptor index of a named option.
    fn index_of(name: &str) -> Result<usize, ConfigError> {
        Self::DESCRIPTORS
            .iter()
            .position(|descriptor| descriptor.name == name)
            .ok_or_else(|| ConfigError::UnknownOption {
                name: name.to_string(),
            })
    }

    /// Current value of a named option.
    fn get(&self, name: &str) -> Result<i32, ConfigError> {
        Ok(self.value(Self::index_of(name)?))
    }

    /// Set a named option, rejecting values outside of its range.
    fn set(&mut self, name: &str, value: i32) -> Result<(), ConfigError> {
        let index = Self::index_of(name)?;
        let descriptor = &Self::DESCRIPTORS[index];
        if value < descriptor.min || value > descriptor.max {
            return Err(ConfigError::OutOfRange {
                name: name.to_string(),
                value,
                min: descriptor.min,
                max: descriptor.max,
            });
        }
        *self.value_mut(index) = value;
        Ok(())
    }

    /// One line per option with name, default, range and description.
    fn help() -> String {
        let mut text = String::new();
        for descriptor in Self::DESCRIPTORS {
            let _ = writeln!(
                text,
                "{:<20} {:>8}  [{}, {}]  {}",
                descriptor.name,
                descriptor.default,
                descriptor.min,
                descriptor.max,
                descriptor.description
            );
        }
        text
    }
}

/// Clause picking policy selected by the `pick` option.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ClausePicking {
    /// Position `flips mod |unsat|` in the unsatisfied stack.
    PseudoBfs,
    /// Uniform over the unsatisfied stack.
    Random,
    /// Oldest unsatisfied clause.
    Bfs,
    /// Newest unsatisfied clause.
    Dfs,
    /// Mostly oldest, occasionally a random member.
    RelaxedBfs,
    /// Mostly oldest, otherwise a geometric walk along the queue.
    UnfairBfs,
}

impl ClausePicking {
    /// Policy for a value of the `pick` option.
    pub fn from_option(value: i32) -> ClausePicking {
        match value {
            -1 => ClausePicking::PseudoBfs,
            0 => ClausePicking::Random,
            1 => ClausePicking::Bfs,
            2 => ClausePicking::Dfs,
            3 => ClausePicking::RelaxedBfs,
            _ => ClausePicking::UnfairBfs,
        }
    }

    /// Whether the policy needs the queue backend of the unsatisfied tracker.
    pub fn uses_queue(self) -> bool {
        match self {
            ClausePicking::PseudoBfs | ClausePicking::Random => false,
            _ => true,
        }
    }
}

/// Configurable parameters of the local search.
#[derive(OptionTable, Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Always pick best assignment during restart. (Default: 0) (Range: 0..=1)
    pub best: i32,
    /// Use cached assignment during restart. (Default: 1) (Range: 0..=1)
    pub cached: i32,
    /// Pick random cached assignment uniformly. (Default: 0) (Range: 0..=1)
    pub cacheduni: i32,
    /// Max cache size of saved assignments. (Default: 1 << 10) (Range: 0..=1 << 20)
    pub cachemax: i32,
    /// Minimum cache size of saved assignments. (Default: 1) (Range: 0..=1 << 10)
    pub cachemin: i32,
    /// Explicit CB value in percent, below 100 disabled. (Default: 0) (Range: 0..=1000)
    pub cb: i32,
    /// Verify the incremental state after every flip in debug builds. (Default: 0) (Range: 0..=1)
    pub checking: i32,
    /// Correct CB value depending on maximum clause length. (Default: 0) (Range: 0..=1)
    pub correct: i32,
    /// Dynamic break values using critical literals. (Default: 1) (Range: 0..=1)
    pub crit: i32,
    /// Defragmentation of the unsatisfied queue. (Default: 1) (Range: 0..=1)
    pub defrag: i32,
    /// Eagerly pick minimum break literals. (Default: 0) (Range: 0..=1)
    pub eager: i32,
    /// Fixed default strategy frequency, 1 means always. (Default: 4) (Range: 0..=i32::MAX)
    pub fixed: i32,
    /// Geometric picking first frequency in percent. (Default: 66) (Range: 0..=100)
    pub geomfreq: i32,
    /// Stop after the minimum was hit this often, -1 unlimited. (Default: -1) (Range: -1..=i32::MAX)
    pub hitlim: i32,
    /// Keep assignment during restart. (Default: 0) (Range: 0..=1)
    pub keep: i32,
    /// Minimum queue chunk size. (Default: 1 << 8) (Range: 2..=1 << 16)
    pub minchunksize: i32,
    /// Clause picking: -1=pbfs 0=rnd 1=bfs 2=dfs 3=rbfs 4=ubfs. (Default: 4) (Range: -1..=4)
    pub pick: i32,
    /// Seed polarity: -1 negative, 1 positive, 0 random. (Default: 0) (Range: -1..=1)
    pub pol: i32,
    /// Preprocessing through unit propagation. (Default: 1) (Range: 0..=1)
    pub prep: i32,
    /// Relaxed BFS rate. (Default: 10) (Range: 1..=i32::MAX)
    pub rbfsrate: i32,
    /// Reluctant doubling of the restart interval. (Default: 1) (Range: 0..=1)
    pub reluctant: i32,
    /// Basic inner restart interval, 0 disables restarts. (Default: 100000) (Range: 0..=i32::MAX)
    pub restart: i32,
    /// Enable outer restarts. (Default: 0) (Range: 0..=1)
    pub restartouter: i32,
    /// Outer restart interval factor. (Default: 100) (Range: 1..=i32::MAX)
    pub restartouterfactor: i32,
    /// Unsatisfied clause target. (Default: 0) (Range: 0..=i32::MAX)
    pub target: i32,
    /// Termination callback check interval in flips. (Default: 1000) (Range: 0..=i32::MAX)
    pub termint: i32,
    /// Toggle uniform strategy at every restart. (Default: 0) (Range: 0..=1)
    pub toggleuniform: i32,
    /// Unfair picking first frequency in percent. (Default: 50) (Range: 0..=100)
    pub unfairfreq: i32,
    /// Clause weights: 0 adaptive, 1 uniform, -1 anti-adaptive. (Default: 0) (Range: -1..=1)
    pub uni: i32,
    /// Clause picking policy for uniform formulas, -1 uses pick. (Default: -1) (Range: -1..=4)
    pub unipick: i32,
    /// Max number of restarts for uniform formulas, 0 unbounded. (Default: 0) (Range: 0..=i32::MAX)
    pub unirestarts: i32,
    /// Verbosity of progress reports. (Default: 0) (Range: 0..=2)
    pub verbose: i32,
    /// Enable random walks. (Default: 0) (Range: 0..=1)
    pub walk: i32,
    /// Random walk probability in percent. (Default: 50) (Range: 1..=100)
    pub walkprobability: i32,
    /// Maximum clause weight. (Default: 5) (Range: 1..=7)
    pub weight: i32,
    /// Flips between clause weight updates. (Default: 1000) (Range: 1..=i32::MAX)
    pub weightint: i32,
    /// Print witness. (Default: 1) (Range: 0..=1)
    pub witness: i32,
}

impl Options {
    /// The clause picking policy configured by `pick`.
    pub fn clause_picking(&self) -> ClausePicking {
        ClausePicking::from_option(self.pick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_descriptors() {
        let options = Options::default();
        for (index, descriptor) in Options::DESCRIPTORS.iter().enumerate() {
            assert_eq!(options.value(index), descriptor.default, "{}", descriptor.name);
            assert!(descriptor.min <= descriptor.default);
            assert!(descriptor.default <= descriptor.max);
        }
        assert_eq!(options.cachemax, 1024);
        assert_eq!(options.pick, 4);
        assert_eq!(options.restart, 100000);
    }

    #[test]
    fn set_validates_range() {
        let mut options = Options::default();
        options.set("pick", -1).unwrap();
        assert_eq!(options.get("pick"), Ok(-1));
        assert_eq!(options.clause_picking(), ClausePicking::PseudoBfs);

        assert_eq!(
            options.set("weight", 8),
            Err(ConfigError::OutOfRange {
                name: "weight".to_string(),
                value: 8,
                min: 1,
                max: 7,
            })
        );
        assert_eq!(options.weight, 5);

        options.set("rbfsrate", i32::max_value()).unwrap();
        assert!(options.set("rbfsrate", 0).is_err());

        options.set("uni", -1).unwrap();
        options.set("hitlim", -1).unwrap();
        assert!(options.set("hitlim", -2).is_err());
    }

    #[test]
    fn unknown_options() {
        let mut options = Options::default();
        assert!(matches!(
            options.set("hitlimit", 1),
            Err(ConfigError::UnknownOption { .. })
        ));
        assert!(options.get("").is_err());
    }

    #[test]
    fn help_lists_every_option() {
        let help = Options::help();
        assert_eq!(help.lines().count(), Options::DESCRIPTORS.len());
        assert!(help.contains("walkprobability"));
        assert!(help.contains("Random walk probability in percent."));
    }
}
