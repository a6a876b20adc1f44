//! Scalar fitness of offspring from their multiobjective evaluations.

use crate::error::SofomoreResult;
use crate::penalty::RankPenalizer;
use crate::pool::{KernelId, KernelPool};
use sofomore_archive::{ObjectiveVector, ParetoArchive};
use std::collections::BTreeMap;
use tracing::debug;

/// Fitness of one kernel's offspring batch.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    /// Values to minimize, one per offspring.
    pub fitness: Vec<f64>,
    /// Share of offspring with a positive hypervolume improvement.
    pub nondominated_ratio: f64,
}

/// Turns offspring objective vectors into fitness: minus the uncrowded
/// hypervolume improvement against the front of the *other* kernels,
/// rank-penalized when constraint values are given.
#[derive(Debug, Default)]
pub struct FitnessAssigner {
    penalizers: BTreeMap<KernelId, RankPenalizer>,
}

impl FitnessAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Front over the evaluated incumbents of every kernel but `id`.
    pub fn front_excluding<A: ParetoArchive>(
        pool: &KernelPool,
        id: KernelId,
        reference_point: &[f64],
    ) -> SofomoreResult<A> {
        Ok(A::from_points(
            pool.objective_values(Some(id)),
            reference_point,
        )?)
    }

    /// Fitness of the offspring of kernel `id`. `constraints[c]` holds the
    /// values of constraint `c` over this batch only.
    pub fn assign<A: ParetoArchive>(
        &mut self,
        pool: &KernelPool,
        id: KernelId,
        offspring_values: &[ObjectiveVector],
        constraints: &[Vec<f64>],
        reference_point: &[f64],
    ) -> SofomoreResult<Assignment> {
        let front: A = Self::front_excluding(pool, id, reference_point)?;
        let improvements = offspring_values
            .iter()
            .map(|v| front.hypervolume_improvement(v))
            .collect::<Result<Vec<f64>, _>>()?;

        let nondominated = improvements.iter().filter(|&&u| u > 0.0).count();
        let nondominated_ratio = if improvements.is_empty() {
            0.0
        } else {
            nondominated as f64 / improvements.len() as f64
        };

        let baseline: Vec<f64> = improvements.iter().map(|u| -u).collect();
        let fitness = if constraints.is_empty() {
            baseline
        } else {
            self.penalizers
                .entry(id)
                .or_default()
                .penalize(&baseline, constraints)?
        };
        debug!(
            kernel = %id,
            front = front.len(),
            best = fitness.iter().copied().fold(f64::INFINITY, f64::min),
            "fitness assigned"
        );
        Ok(Assignment {
            fitness,
            nondominated_ratio,
        })
    }

    pub fn penalizer(&self, id: KernelId) -> Option<&RankPenalizer> {
        self.penalizers.get(&id)
    }

    pub fn forget(&mut self, id: KernelId) {
        self.penalizers.remove(&id);
    }

    /// Apply a renumbering produced by pool compaction.
    pub fn remap(&mut self, mapping: &BTreeMap<KernelId, KernelId>) {
        self.penalizers = std::mem::take(&mut self.penalizers)
            .into_iter()
            .filter_map(|(id, p)| mapping.get(&id).map(|&new| (new, p)))
            .collect();
    }
}
