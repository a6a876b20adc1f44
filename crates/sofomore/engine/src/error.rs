use crate::pool::KernelId;
use sofomore_archive::ArchiveError;
use sofomore_kernel::KernelError;

/// Errors from the Sofomore coordinator.
#[derive(Debug, thiserror::Error)]
pub enum SofomoreError {
    #[error("at least one kernel is required")]
    EmptyKernelList,
    #[error("number of kernels to ask must be positive")]
    InvalidAskCount,
    #[error("no active kernel left to ask")]
    NoActiveKernels,
    #[error("tell called without a preceding ask")]
    NoPendingAsk,
    #[error("operation not allowed while an ask is waiting for its tell")]
    RoundInProgress,
    #[error("{solutions} solutions but {objective_values} objective vectors")]
    SolutionCountMismatch {
        solutions: usize,
        objective_values: usize,
    },
    #[error("ask returned {expected} points but tell received {actual}")]
    BatchSizeMismatch { expected: usize, actual: usize },
    #[error("constraint list has {actual} values, expected {expected}")]
    ConstraintLengthMismatch { expected: usize, actual: usize },
    #[error("objective vector has {actual} components, expected {expected}")]
    ObjectiveDimensionMismatch { expected: usize, actual: usize },
    #[error("kernel searches {actual} dimensions, expected {expected}")]
    KernelDimensionMismatch { expected: usize, actual: usize },
    #[error("no kernel with index {0}")]
    InvalidKernelIndex(KernelId),
    #[error("kernel {0} is already inactive")]
    KernelAlreadyInactive(KernelId),
    #[error("kernel {0} is not inactive")]
    KernelNotInactive(KernelId),
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),
}

pub type SofomoreResult<T> = Result<T, SofomoreError>;

/// Why a restart factory could not deliver a replacement kernel.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RestartError {
    #[error("restart factory failed: {0}")]
    Factory(String),
    #[error("restarted kernel searches {actual} dimensions, expected {expected}")]
    NonConforming { expected: usize, actual: usize },
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),
}
