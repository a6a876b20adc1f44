use crate::error::KernelError;
use crate::kernel::Kernel;
use crate::types::{Point, StopStatus};

/// Deterministic kernel for tests.
///
/// `ask` returns `popsize` points at `incumbent + (k + 1) * spread` along
/// every coordinate; `tell` moves the incumbent onto the best told point.
#[derive(Clone, Debug)]
pub struct SimulatedKernel {
    incumbent: Point,
    popsize: usize,
    spread: f64,
    tells: u64,
    stop_after: Option<(u64, String)>,
    forced_stop: StopStatus,
    fail_logging: bool,
    fail_tell: bool,
    last_fitness: Vec<f64>,
}

impl SimulatedKernel {
    pub fn new(incumbent: Point) -> Self {
        Self {
            incumbent,
            popsize: 2,
            spread: 0.1,
            tells: 0,
            stop_after: None,
            forced_stop: StopStatus::new(),
            fail_logging: false,
            fail_tell: false,
            last_fitness: Vec::new(),
        }
    }

    pub fn with_popsize(mut self, popsize: usize) -> Self {
        self.popsize = popsize;
        self
    }

    pub fn with_spread(mut self, spread: f64) -> Self {
        self.spread = spread;
        self
    }

    /// Report `reason` once `tells` calls to `tell` have happened.
    pub fn with_stop_after(mut self, tells: u64, reason: impl Into<String>) -> Self {
        self.stop_after = Some((tells, reason.into()));
        self
    }

    /// Start out terminated with `reason`.
    pub fn stopped(mut self, reason: impl Into<String>) -> Self {
        self.forced_stop.insert(reason, 1.0);
        self
    }

    /// Make `log_state` fail.
    pub fn with_failing_logger(mut self) -> Self {
        self.fail_logging = true;
        self
    }

    /// Make `tell` fail without touching the incumbent.
    pub fn with_failing_tell(mut self) -> Self {
        self.fail_tell = true;
        self
    }

    pub fn tells(&self) -> u64 {
        self.tells
    }

    /// Fitness values received by the last `tell`.
    pub fn last_fitness(&self) -> &[f64] {
        &self.last_fitness
    }
}

impl Kernel for SimulatedKernel {
    fn dimension(&self) -> usize {
        self.incumbent.len()
    }

    fn ask(&mut self) -> Vec<Point> {
        (0..self.popsize)
            .map(|k| {
                let shift = (k + 1) as f64 * self.spread;
                self.incumbent.iter().map(|x| x + shift).collect()
            })
            .collect()
    }

    fn tell(&mut self, points: &[Point], fitness: &[f64]) -> Result<(), KernelError> {
        if points.len() != fitness.len() {
            return Err(KernelError::FitnessLengthMismatch {
                points: points.len(),
                fitness: fitness.len(),
            });
        }
        if self.fail_tell {
            return Err(KernelError::Update("simulated update failure".into()));
        }
        let best = fitness
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        if let Some(i) = best {
            self.incumbent = points[i].clone();
        }
        self.last_fitness = fitness.to_vec();
        self.tells += 1;
        Ok(())
    }

    fn incumbent(&self) -> Point {
        self.incumbent.clone()
    }

    fn stop(&self) -> StopStatus {
        let mut status = self.forced_stop.clone();
        if let Some((after, reason)) = &self.stop_after {
            if self.tells >= *after {
                status.insert(reason.clone(), self.tells as f64);
            }
        }
        status
    }

    fn step_size(&self) -> Option<f64> {
        Some(self.spread)
    }

    fn copy_light(&self, step_size: Option<f64>) -> Result<Box<dyn Kernel>, KernelError> {
        let copy = SimulatedKernel::new(self.incumbent.clone())
            .with_popsize(self.popsize)
            .with_spread(step_size.unwrap_or(self.spread));
        Ok(Box::new(copy))
    }

    fn log_state(&mut self) -> Result<(), KernelError> {
        if self.fail_logging {
            return Err(KernelError::Logging("simulated logger failure".into()));
        }
        Ok(())
    }
}
