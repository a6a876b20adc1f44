//! Property tests: rank-based constraint handling leaves feasible candidates
//! untouched and never rewards a larger violation.

use proptest::prelude::*;
use sofomore_engine::{mean_ranks, RankPenalizer};

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

/// Fitness values and `constraints x n` constraint values.
fn arb_batch(
    g: impl Strategy<Value = f64> + Clone,
) -> impl Strategy<Value = (Vec<f64>, Vec<Vec<f64>>)> {
    (1usize..10, 1usize..4).prop_flat_map(move |(n, constraints)| {
        (
            prop::collection::vec(-10.0..10.0f64, n),
            prop::collection::vec(prop::collection::vec(g.clone(), n), constraints),
        )
    })
}

fn satisfied() -> impl Strategy<Value = f64> + Clone {
    prop_oneof![Just(0.0), -5.0..0.0f64]
}

fn any_constraint() -> impl Strategy<Value = f64> + Clone {
    prop_oneof![Just(0.0), -5.0..5.0f64]
}

fn is_feasible(constraints: &[Vec<f64>], i: usize) -> bool {
    constraints.iter().all(|g| g[i] <= 0.0)
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// With every constraint satisfied the fitness passes through unchanged.
    #[test]
    fn all_feasible_is_identity((f, g) in arb_batch(satisfied())) {
        let out = RankPenalizer::new().penalize(&f, &g).unwrap();
        prop_assert_eq!(out, f);
    }

    /// Feasible candidates keep their value in mixed batches.
    #[test]
    fn feasible_entries_are_kept((f, g) in arb_batch(any_constraint())) {
        let out = RankPenalizer::new().penalize(&f, &g).unwrap();
        prop_assert_eq!(out.len(), f.len());
        for i in (0..f.len()).filter(|&i| is_feasible(&g, i)) {
            prop_assert_eq!(out[i], f[i]);
        }
    }

    /// Raising one infeasible candidate's violation never lowers its fitness.
    #[test]
    fn larger_violation_is_never_better(
        (f, mut g) in arb_batch(any_constraint()),
        pick in any::<prop::sample::Index>(),
        which in any::<prop::sample::Index>(),
        increase in 0.001..10.0f64,
    ) {
        let i = pick.index(f.len());
        let c = which.index(g.len());
        g[c][i] = g[c][i].abs() + 0.01;
        let before = RankPenalizer::new().penalize(&f, &g).unwrap();

        g[c][i] += increase;
        let after = RankPenalizer::new().penalize(&f, &g).unwrap();
        prop_assert!(
            after[i] >= before[i] - 1e-9,
            "fitness dropped from {} to {}",
            before[i],
            after[i]
        );
    }

    /// Mean ranks are a permutation of `0..n` up to averaging of ties.
    #[test]
    fn mean_ranks_sum(values in prop::collection::vec(prop_oneof![Just(1.0), -3.0..3.0f64], 0..20)) {
        let n = values.len() as f64;
        let ranks = mean_ranks(&values);
        let total: f64 = ranks.iter().sum();
        prop_assert!((total - n * (n - 1.0) / 2.0).abs() < 1e-9);
        for (a, ra) in values.iter().zip(&ranks) {
            for (b, rb) in values.iter().zip(&ranks) {
                if a < b {
                    prop_assert!(ra < rb);
                }
            }
        }
    }
}
