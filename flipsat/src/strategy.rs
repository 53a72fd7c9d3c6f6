//! Search strategies.
use partial_ref::{partial, PartialRef};

use log::debug;

use crate::config::Options;
use crate::context::{Context, OptionsP, RngP, StatsP, StrategyP};

/// Parameters of the search that may change at each restart.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Strategy {
    /// Seed restarts from the assignment cache.
    pub cached: bool,
    /// Use the CB base interpolated from the maximum clause length.
    pub correct: bool,
    /// Pick literals with minimum break value.
    pub eager: bool,
    /// Seed polarity, `0` for random.
    pub pol: i32,
    /// Clause weights: `0` adaptive, `1` uniform, `-1` anti-adaptive.
    pub uni: i32,
    /// Random walk steps.
    pub walk: bool,
    /// Maximum clause weight.
    pub weight: u8,
}

impl Strategy {
    /// The strategy given by the options.
    pub fn from_options(options: &Options) -> Strategy {
        Strategy {
            cached: options.cached != 0 && options.cachemax > 0,
            correct: options.correct != 0,
            eager: options.eager != 0,
            pol: options.pol,
            uni: options.uni,
            walk: options.walk != 0,
            weight: options.weight as u8,
        }
    }

    /// Whether clause weights are used.
    pub fn weighted(&self) -> bool {
        self.uni <= 0 && self.weight > 1
    }

    /// Whether the adaptive weights are mirrored.
    pub fn anti(&self) -> bool {
        self.uni < 0
    }
}

/// Choose the strategy of the next search period.
///
/// With frequency `1/fixed` the strategy given by the options is used, otherwise every field is
/// drawn at random. With `toggleuniform` the uniform weight flag alternates.
pub fn pick_strategy(mut ctx: partial!(Context, mut RngP, mut StatsP, mut StrategyP, OptionsP)) {
    let options = ctx.part(OptionsP).clone();
    let previous_uni = ctx.part(StrategyP).uni;
    let rng = ctx.part_mut(RngP);

    let use_default = options.fixed > 0 && rng.pick(options.fixed as usize) == 0;

    let mut strategy = Strategy::from_options(&options);
    if !use_default {
        strategy = Strategy {
            cached: options.cachemax > 0 && rng.bit(),
            correct: rng.bit(),
            eager: rng.bit(),
            pol: rng.pick(3) as i32 - 1,
            uni: rng.pick(3) as i32 - 1,
            walk: rng.bit(),
            weight: 1 + rng.pick(options.weight as usize) as u8,
        };
    }

    if options.toggleuniform != 0 {
        strategy.uni = if previous_uni == 0 { 1 } else { 0 };
    }

    let stats = ctx.part_mut(StatsP);
    if use_default {
        stats.strategy.default += 1;
    } else {
        stats.strategy.random += 1;
    }

    debug!("strategy {:?}", strategy);
    *ctx.part_mut(StrategyP) = strategy;
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use crate::config::OptionTable;

    #[test]
    fn fixed_one_always_uses_defaults() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        ctx.part_mut(OptionsP).set("fixed", 1).unwrap();
        ctx.part_mut(OptionsP).set("eager", 1).unwrap();

        for _ in 0..10 {
            pick_strategy(ctx.borrow());
            assert!(ctx.part(StrategyP).eager);
            assert_eq!(ctx.part(StrategyP).weight, 5);
        }
        assert_eq!(ctx.part(StatsP).strategy.default, 10);
    }

    #[test]
    fn random_strategies_respect_bounds() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        ctx.part_mut(OptionsP).set("fixed", 0).unwrap();
        ctx.part_mut(OptionsP).set("cachemax", 0).unwrap();

        for _ in 0..100 {
            pick_strategy(ctx.borrow());
            let strategy = ctx.part(StrategyP);
            assert!(!strategy.cached);
            assert!((1..=5).contains(&strategy.weight));
            assert!((-1..=1).contains(&strategy.pol));
            assert!((-1..=1).contains(&strategy.uni));
        }
        assert_eq!(ctx.part(StatsP).strategy.random, 100);
    }

    #[test]
    fn toggle_uniform() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        ctx.part_mut(OptionsP).set("toggleuniform", 1).unwrap();

        let mut last = ctx.part(StrategyP).uni;
        for _ in 0..6 {
            pick_strategy(ctx.borrow());
            assert_ne!(ctx.part(StrategyP).uni, last);
            last = ctx.part(StrategyP).uni;
        }
    }

    #[test]
    fn anti_uniform_is_weighted() {
        let mut options = Options::default();
        options.set("uni", -1).unwrap();
        let strategy = Strategy::from_options(&options);
        assert!(strategy.weighted());
        assert!(strategy.anti());

        options.set("uni", 1).unwrap();
        assert!(!Strategy::from_options(&options).weighted());
    }
}
