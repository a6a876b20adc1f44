//! Rank-based constraint handling.
//!
//! Infeasible candidates get a fitness synthesized from the sorted feasible
//! fitness values, at a position that grows with the sum of their
//! constraint-violation ranks. Feasible candidates keep their fitness.

use crate::error::{SofomoreError, SofomoreResult};
use serde::{Deserialize, Serialize};

/// Ascending 0-based ranks; tied values share their mean position.
pub fn mean_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let mean = (start + end - 1) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = mean;
        }
        start = end;
    }
    ranks
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankPenalizer {
    /// Position, as a fraction of the feasible values, of the best fitness
    /// an infeasible candidate can get.
    base_percentile: f64,
    /// Weight of the summed violation ranks.
    g_scale: f64,
    /// Best feasible fitness seen so far; anchors the extrapolation when a
    /// batch has no feasible candidate.
    best_feasible: f64,
}

impl Default for RankPenalizer {
    fn default() -> Self {
        Self {
            base_percentile: 0.2,
            g_scale: 1.01,
            best_feasible: 0.0,
        }
    }
}

impl RankPenalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_percentile(mut self, base_percentile: f64) -> Self {
        self.base_percentile = base_percentile;
        self
    }

    pub fn with_g_scale(mut self, g_scale: f64) -> Self {
        self.g_scale = g_scale;
        self
    }

    pub fn best_feasible(&self) -> f64 {
        self.best_feasible
    }

    /// Penalized fitness of a batch. `constraints[c][i]` is the value of
    /// constraint `c` at candidate `i`; a value `<= 0` is satisfied.
    ///
    /// Non-finite values are not handled.
    pub fn penalize(&mut self, f_values: &[f64], constraints: &[Vec<f64>]) -> SofomoreResult<Vec<f64>> {
        let n = f_values.len();
        let mut feasible = vec![true; n];
        let mut penalty = vec![0.0; n];

        for g_values in constraints {
            if g_values.len() != n {
                return Err(SofomoreError::ConstraintLengthMismatch {
                    expected: n,
                    actual: g_values.len(),
                });
            }
            let num_feasible = g_values.iter().filter(|&&g| g <= 0.0).count() as f64;
            for (i, rank) in mean_ranks(g_values).into_iter().enumerate() {
                if g_values[i] > 0.0 {
                    feasible[i] = false;
                    penalty[i] += rank - num_feasible + 1.0;
                }
            }
        }

        let mut sorted_feasible: Vec<f64> = (0..n)
            .filter(|&i| feasible[i])
            .map(|i| f_values[i])
            .collect();
        sorted_feasible.sort_by(f64::total_cmp);
        if let Some(&best) = sorted_feasible.first() {
            self.best_feasible = best;
        }

        let j0 = self.base_percentile * (sorted_feasible.len() as f64 - 1.0);
        let mut penalized = f_values.to_vec();
        for i in (0..n).filter(|&i| !feasible[i]) {
            let j = (j0 + self.g_scale * (penalty[i] - 1.0)).max(0.0);
            let (j1, j2) = (j.floor(), j.ceil());
            let f1 = self.value_at(&sorted_feasible, j1 as usize);
            let f2 = self.value_at(&sorted_feasible, j2 as usize);
            penalized[i] = if j2 > j1 {
                (j - j1) * f2 + (j2 - j) * f1
            } else {
                f1
            };
        }
        Ok(penalized)
    }

    /// `sorted[i]`, extrapolated by one unit per position past the end.
    fn value_at(&self, sorted: &[f64], i: usize) -> f64 {
        match sorted.last() {
            None => self.best_feasible + i as f64,
            Some(&last) if i >= sorted.len() => last + (i + 1 - sorted.len()) as f64,
            Some(_) => sorted[i],
        }
    }
}
