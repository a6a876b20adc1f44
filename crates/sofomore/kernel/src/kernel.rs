use crate::error::KernelError;
use crate::types::{Point, StopStatus};

/// A single-objective optimizer with an ask-and-tell interface.
///
/// The coordinator keeps each kernel's incumbent objective vector itself,
/// so implementations only deal with scalar fitness.
pub trait Kernel: Send {
    /// Dimension of the search space.
    fn dimension(&self) -> usize;

    /// Sample new candidate solutions.
    fn ask(&mut self) -> Vec<Point>;

    /// Update the internal state from `fitness[i]` of `points[i]`, lower is
    /// better.
    fn tell(&mut self, points: &[Point], fitness: &[f64]) -> Result<(), KernelError>;

    /// Current best estimate of a solution.
    fn incumbent(&self) -> Point;

    /// Termination status, empty while running.
    fn stop(&self) -> StopStatus;

    /// Current step size, when the kernel has one.
    fn step_size(&self) -> Option<f64> {
        None
    }

    /// Step size the kernel started with.
    fn initial_step_size(&self) -> Option<f64> {
        None
    }

    /// Fresh kernel sharing this kernel's incumbent and settings but none of
    /// its adaptation history or termination status.
    fn copy_light(&self, _step_size: Option<f64>) -> Result<Box<dyn Kernel>, KernelError> {
        Err(KernelError::CopyUnsupported)
    }

    /// Record the current state to the kernel's own log. Best effort.
    fn log_state(&mut self) -> Result<(), KernelError> {
        Ok(())
    }
}
