/// Errors from single-objective kernels.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("tell received {points} points but {fitness} fitness values")]
    FitnessLengthMismatch { points: usize, fitness: usize },
    #[error("invalid step size: {0}")]
    InvalidStepSize(f64),
    #[error("kernel does not support copying")]
    CopyUnsupported,
    #[error("update failed: {0}")]
    Update(String),
    #[error("logging failed: {0}")]
    Logging(String),
}
