/// Errors from the non-dominated archive.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArchiveError {
    #[error("objective vector has {actual} components, reference point has {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("reference point must have at least one component")]
    EmptyReferencePoint,
}
