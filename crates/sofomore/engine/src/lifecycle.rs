//! Termination aggregation and restart policies.

use crate::error::RestartError;
use crate::pool::{KernelId, KernelPool};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sofomore_archive::ObjectiveVector;
use sofomore_kernel::{GaussianKernel, GaussianOptions, Kernel, Point, StopStatus};
use std::collections::BTreeMap;
use std::fmt;

/// Stop status of every kernel, including running ones.
pub fn termination_status(pool: &KernelPool) -> BTreeMap<KernelId, StopStatus> {
    pool.iter().map(|(id, slot)| (id, slot.status())).collect()
}

/// `Some` mapping of every kernel's stop status once all kernels have
/// stopped, `None` while any kernel is still running or the pool is empty.
pub fn aggregate_stop(pool: &KernelPool) -> Option<BTreeMap<KernelId, StopStatus>> {
    let status = termination_status(pool);
    if status.is_empty() || status.values().any(StopStatus::is_running) {
        None
    } else {
        Some(status)
    }
}

/// Whether a kernel that stopped with `status` should be replaced.
pub fn restart_allowed(status: &StopStatus, skip_reasons: &[String]) -> bool {
    !skip_reasons.iter().any(|r| status.contains(r))
}

/// What a restart factory gets to see of the coordinator.
pub struct RestartContext<'a> {
    /// Kernel whose termination triggered the restart.
    pub stopped: KernelId,
    pub pool: &'a KernelPool,
    pub reference_point: &'a [f64],
    /// Search space dimension a replacement must have.
    pub dimension: usize,
    /// Hypervolume contribution of each evaluated kernel's incumbent.
    pub contributions: Vec<(KernelId, f64)>,
    /// Current front, sorted lexicographically.
    pub front: Vec<ObjectiveVector>,
}

impl fmt::Debug for RestartContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestartContext")
            .field("stopped", &self.stopped)
            .field("kernels", &self.pool.len())
            .field("dimension", &self.dimension)
            .field("front", &self.front.len())
            .finish()
    }
}

/// Produces a replacement when a kernel terminates.
pub trait RestartFactory: Send {
    fn restart(&mut self, ctx: &RestartContext<'_>) -> Result<Box<dyn Kernel>, RestartError>;
}

impl<F> RestartFactory for F
where
    F: FnMut(&RestartContext<'_>) -> Result<Box<dyn Kernel>, RestartError> + Send,
{
    fn restart(&mut self, ctx: &RestartContext<'_>) -> Result<Box<dyn Kernel>, RestartError> {
        self(ctx)
    }
}

type StartPoint = Box<dyn FnMut(usize, &mut StdRng) -> Point + Send>;

/// New [`GaussianKernel`] at a freshly generated start point.
pub struct RandomRestart {
    x0: StartPoint,
    sigma0: Option<f64>,
    options: GaussianOptions,
    rng: StdRng,
}

impl RandomRestart {
    /// Start points uniform in `[-1, 1]^n`; the step size of the first
    /// kernel of the pool.
    pub fn new(options: GaussianOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            x0: Box::new(|n: usize, rng: &mut StdRng| {
                (0..n).map(|_| rng.gen_range(-1.0..=1.0)).collect()
            }),
            sigma0: None,
            options,
            rng,
        }
    }

    pub fn with_start_point(
        mut self,
        x0: impl FnMut(usize, &mut StdRng) -> Point + Send + 'static,
    ) -> Self {
        self.x0 = Box::new(x0);
        self
    }

    pub fn with_sigma0(mut self, sigma0: f64) -> Self {
        self.sigma0 = Some(sigma0);
        self
    }
}

impl fmt::Debug for RandomRestart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomRestart")
            .field("sigma0", &self.sigma0)
            .field("options", &self.options)
            .finish()
    }
}

impl RestartFactory for RandomRestart {
    fn restart(&mut self, ctx: &RestartContext<'_>) -> Result<Box<dyn Kernel>, RestartError> {
        let sigma0 = self
            .sigma0
            .or_else(|| {
                ctx.pool.iter().next().and_then(|(_, slot)| {
                    let k = slot.kernel();
                    k.initial_step_size().or_else(|| k.step_size())
                })
            })
            .ok_or_else(|| RestartError::Factory("no initial step size available".into()))?;
        let x0 = (self.x0)(ctx.dimension, &mut self.rng);
        let options = GaussianOptions {
            seed: Some(self.rng.gen()),
            ..self.options.clone()
        };
        Ok(Box::new(GaussianKernel::new(x0, sigma0, options)?))
    }
}

/// Light copy of the kernel with the largest hypervolume contribution, its
/// step size scaled by `sigma_factor`.
///
/// With more than one front point, the first kernel in decreasing
/// contribution order that has stopped or does not sit on an extreme of the
/// front is preferred.
#[derive(Clone, Debug)]
pub struct BestContributorRestart {
    pub sigma_factor: f64,
}

impl Default for BestContributorRestart {
    fn default() -> Self {
        Self { sigma_factor: 2.0 }
    }
}

impl BestContributorRestart {
    pub fn new(sigma_factor: f64) -> Self {
        Self { sigma_factor }
    }

    /// Kernel to copy, `None` if no kernel has been evaluated.
    pub fn select(&self, ctx: &RestartContext<'_>) -> Option<KernelId> {
        let mut ranked = ctx.contributions.clone();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        let best = ranked.first()?.0;
        if ctx.front.len() <= 1 {
            return Some(best);
        }
        let extremes = [ctx.front.first(), ctx.front.last()];
        ranked
            .iter()
            .map(|(id, _)| *id)
            .find(|&id| {
                ctx.pool.get(id).is_some_and(|slot| {
                    slot.kernel().stop().is_stopped()
                        || !extremes.contains(&slot.objective_values())
                })
            })
            .or(Some(best))
    }
}

impl RestartFactory for BestContributorRestart {
    fn restart(&mut self, ctx: &RestartContext<'_>) -> Result<Box<dyn Kernel>, RestartError> {
        let id = self
            .select(ctx)
            .ok_or_else(|| RestartError::Factory("no evaluated kernel to copy".into()))?;
        let slot = ctx
            .pool
            .get(id)
            .ok_or_else(|| RestartError::Factory(format!("kernel {} vanished", id)))?;
        let sigma = slot.kernel().step_size().map(|s| s * self.sigma_factor);
        Ok(slot.kernel().copy_light(sigma)?)
    }
}
