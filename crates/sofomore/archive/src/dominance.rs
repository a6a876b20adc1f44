//! Pareto dominance relations (all objectives minimized).

use crate::archive::ObjectiveVector;

/// `a` is no worse than `b` in every objective.
pub fn weakly_dominates(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x <= y)
}

/// `a` is no worse than `b` everywhere and strictly better somewhere.
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    weakly_dominates(a, b) && a.iter().zip(b).any(|(x, y)| x < y)
}

/// `point` is strictly better than `reference` in every objective, i.e. it
/// contributes a box of positive volume.
pub fn strictly_inside(point: &[f64], reference: &[f64]) -> bool {
    point.len() == reference.len() && point.iter().zip(reference).all(|(p, r)| p < r)
}

/// Mutually non-dominated subset of `points`, duplicates collapsed to one copy.
///
/// The result does not depend on the input order (as a set).
pub fn nondominated_subset(points: &[ObjectiveVector]) -> Vec<ObjectiveVector> {
    let mut kept: Vec<ObjectiveVector> = Vec::with_capacity(points.len());
    for candidate in points {
        if kept.iter().any(|k| weakly_dominates(k, candidate)) {
            continue;
        }
        kept.retain(|k| !dominates(candidate, k));
        kept.push(candidate.clone());
    }
    kept
}
