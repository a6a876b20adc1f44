use crate::archive::{ObjectiveVector, ParetoArchive};
use crate::dominance::{dominates, nondominated_subset, strictly_inside, weakly_dominates};
use crate::error::ArchiveError;
use crate::hypervolume::hypervolume;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Non-dominated list kept sorted lexicographically by objective values.
///
/// Members are always strictly inside the reference box; a point that is
/// weakly dominated by a member (including an exact duplicate) is rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NondominatedList {
    points: Vec<ObjectiveVector>,
    reference_point: Vec<f64>,
}

impl NondominatedList {
    /// Empty list bounded by `reference_point`.
    pub fn empty(reference_point: &[f64]) -> Result<Self, ArchiveError> {
        if reference_point.is_empty() {
            return Err(ArchiveError::EmptyReferencePoint);
        }
        Ok(Self {
            points: Vec::new(),
            reference_point: reference_point.to_vec(),
        })
    }

    fn check_dimension(&self, point: &[f64]) -> Result<(), ArchiveError> {
        if point.len() != self.reference_point.len() {
            return Err(ArchiveError::DimensionMismatch {
                expected: self.reference_point.len(),
                actual: point.len(),
            });
        }
        Ok(())
    }

    fn sort(&mut self) {
        self.points.sort_by(|a, b| lexicographic(a, b));
    }

    /// Whether some member weakly dominates `point`.
    pub fn weakly_dominates_point(&self, point: &[f64]) -> bool {
        self.points.iter().any(|p| weakly_dominates(p, point))
    }

    /// Euclidean distance from `point` to the region where it would be
    /// accepted (strictly inside the reference box, not weakly dominated).
    ///
    /// A point no member weakly dominates only has to be moved into the
    /// reference box: clamping it to the box cannot make it dominated, so
    /// the box distance is exact. For dominated points the distance is
    /// exact with two objectives, where the region is bounded by the
    /// staircase through the members. With more objectives the distance to
    /// the nearest member's dominating orthant is used, an upper bound.
    pub fn distance_to_front(&self, point: &[f64]) -> Result<f64, ArchiveError> {
        self.check_dimension(point)?;
        if !self.weakly_dominates_point(point) {
            return Ok(excess_norm(point, &self.reference_point));
        }
        let corners = self.attainment_corners();
        let distance = corners
            .iter()
            .map(|corner| excess_norm(point, corner))
            .fold(f64::INFINITY, f64::min);
        Ok(distance)
    }

    fn attainment_corners(&self) -> Vec<Vec<f64>> {
        let reference = &self.reference_point;
        if self.points.is_empty() {
            return vec![reference.clone()];
        }
        if reference.len() != 2 {
            return self.points.clone();
        }
        // members are sorted by first objective, hence decreasing in the second
        let mut corners = Vec::with_capacity(self.points.len() + 1);
        corners.push(vec![self.points[0][0], reference[1]]);
        for pair in self.points.windows(2) {
            corners.push(vec![pair[1][0], pair[0][1]]);
        }
        let last = &self.points[self.points.len() - 1];
        corners.push(vec![reference[0], last[1]]);
        corners
    }
}

impl ParetoArchive for NondominatedList {
    fn from_points(
        points: Vec<ObjectiveVector>,
        reference_point: &[f64],
    ) -> Result<Self, ArchiveError> {
        let mut list = Self::empty(reference_point)?;
        for p in &points {
            list.check_dimension(p)?;
        }
        let inside: Vec<ObjectiveVector> = points
            .into_iter()
            .filter(|p| strictly_inside(p, reference_point))
            .collect();
        list.points = nondominated_subset(&inside);
        list.sort();
        Ok(list)
    }

    fn reference_point(&self) -> &[f64] {
        &self.reference_point
    }

    fn points(&self) -> &[ObjectiveVector] {
        &self.points
    }

    fn contains(&self, point: &[f64]) -> bool {
        self.points.iter().any(|p| p.as_slice() == point)
    }

    fn hypervolume(&self) -> f64 {
        hypervolume(&self.points, &self.reference_point)
    }

    fn hypervolume_improvement(&self, point: &[f64]) -> Result<f64, ArchiveError> {
        self.check_dimension(point)?;
        if !strictly_inside(point, &self.reference_point) || self.weakly_dominates_point(point) {
            return Ok(-self.distance_to_front(point)?);
        }
        let mut extended = self.points.clone();
        extended.push(point.to_vec());
        Ok(hypervolume(&extended, &self.reference_point) - self.hypervolume())
    }

    fn add(&mut self, point: ObjectiveVector) -> Result<bool, ArchiveError> {
        self.check_dimension(&point)?;
        if !strictly_inside(&point, &self.reference_point) || self.weakly_dominates_point(&point) {
            trace!(?point, "point rejected");
            return Ok(false);
        }
        let before = self.points.len();
        self.points.retain(|p| !dominates(&point, p));
        let evicted = before - self.points.len();
        debug!(?point, evicted, size = self.points.len() + 1, "point added");
        self.points.push(point);
        self.sort();
        Ok(true)
    }

    fn remove(&mut self, point: &[f64]) -> bool {
        match self.points.iter().position(|p| p.as_slice() == point) {
            Some(i) => {
                self.points.remove(i);
                true
            }
            None => false,
        }
    }
}

fn lexicographic(a: &[f64], b: &[f64]) -> std::cmp::Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(std::cmp::Ordering::Equal)
}

fn excess_norm(point: &[f64], corner: &[f64]) -> f64 {
    point
        .iter()
        .zip(corner)
        .map(|(p, c)| (p - c).max(0.0).powi(2))
        .sum::<f64>()
        .sqrt()
}
