use crate::error::ArchiveError;

/// One evaluation of the multiobjective function, all components minimized.
pub type ObjectiveVector = Vec<f64>;

/// A set of mutually non-dominated objective vectors relative to a
/// reference point.
///
/// Implementations own the non-domination and hypervolume arithmetic; the
/// engine only relies on the operations below.
pub trait ParetoArchive: Clone + std::fmt::Debug + Send {
    /// Build the non-dominated subset of `points` that lies strictly inside
    /// the box bounded by `reference_point`.
    fn from_points(
        points: Vec<ObjectiveVector>,
        reference_point: &[f64],
    ) -> Result<Self, ArchiveError>
    where
        Self: Sized;

    /// Reference point bounding hypervolume integration.
    fn reference_point(&self) -> &[f64];

    /// Current members.
    fn points(&self) -> &[ObjectiveVector];

    /// Exact membership of `point`.
    fn contains(&self, point: &[f64]) -> bool;

    /// Hypervolume dominated by the members.
    fn hypervolume(&self) -> f64;

    /// Uncrowded hypervolume improvement of adding `point`: the hypervolume
    /// gain when `point` would enter the archive, otherwise minus its
    /// distance to the region where it would.
    fn hypervolume_improvement(&self, point: &[f64]) -> Result<f64, ArchiveError>;

    /// Insert `point`, evicting members it dominates. Returns whether it was
    /// inserted.
    fn add(&mut self, point: ObjectiveVector) -> Result<bool, ArchiveError>;

    /// Remove one exact copy of `point`. Returns whether it was present.
    fn remove(&mut self, point: &[f64]) -> bool;

    /// Insert several points. Returns how many were inserted.
    fn add_list(&mut self, points: Vec<ObjectiveVector>) -> Result<usize, ArchiveError> {
        let mut inserted = 0;
        for point in points {
            if self.add(point)? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn len(&self) -> usize {
        self.points().len()
    }

    fn is_empty(&self) -> bool {
        self.points().is_empty()
    }
}
