use crate::pool::KernelId;
use serde::{Deserialize, Serialize};

/// Non-fatal condition noticed by the coordinator.
///
/// Each one is also emitted through `tracing`; the list kept by
/// [`Sofomore`](crate::Sofomore) lets callers inspect them afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// Malformed options; the affected settings fell back to defaults.
    ConfigurationWarning { message: String },
    /// More kernels asked than active; the request was clipped.
    CapacityWarning { requested: usize, active: usize },
    /// A terminated kernel could not be replaced.
    RestartFailure { kernel: KernelId, reason: String },
    /// A kernel could not be updated with its offspring; the round went on
    /// without it.
    UpdateFailure { kernel: KernelId, reason: String },
    /// A kernel's own logger failed.
    LoggingFailure { kernel: KernelId, reason: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigurationWarning { message } => write!(f, "configuration: {}", message),
            Self::CapacityWarning { requested, active } => write!(
                f,
                "asked {} kernels but only {} are active, clipped to {}",
                requested, active, active
            ),
            Self::RestartFailure { kernel, reason } => {
                write!(f, "restart after kernel {} failed: {}", kernel, reason)
            }
            Self::UpdateFailure { kernel, reason } => {
                write!(f, "update of kernel {} failed: {}", kernel, reason)
            }
            Self::LoggingFailure { kernel, reason } => {
                write!(f, "logging of kernel {} failed: {}", kernel, reason)
            }
        }
    }
}
