use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const HISTORY_LIMIT: usize = 1000;

/// Running statistics of the front hypervolume. Diagnostic only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceTracker {
    best_hypervolume: f64,
    epsilon_gap: f64,
    history: VecDeque<f64>,
}

impl Default for ConvergenceTracker {
    fn default() -> Self {
        Self {
            best_hypervolume: 0.0,
            epsilon_gap: 0.1,
            history: VecDeque::new(),
        }
    }
}

impl ConvergenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the hypervolume of the current front.
    pub fn update(&mut self, hypervolume: f64) {
        let gap = (hypervolume - self.best_hypervolume).abs();
        if gap > 0.0 {
            self.epsilon_gap = self.epsilon_gap.min(gap);
        }
        self.best_hypervolume = self.best_hypervolume.max(hypervolume);
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(hypervolume);
    }

    pub fn best_hypervolume(&self) -> f64 {
        self.best_hypervolume
    }

    /// Smallest nonzero difference seen between a front hypervolume and the
    /// best before it.
    pub fn epsilon_gap(&self) -> f64 {
        self.epsilon_gap
    }

    /// Most recent hypervolumes, oldest first.
    pub fn history(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.history.back().copied()
    }
}
