use crate::error::KernelError;
use crate::kernel::Kernel;
use crate::types::{Point, StopStatus};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Settings of a [`GaussianKernel`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GaussianOptions {
    /// Offspring per iteration; `None` uses `4 + floor(3 ln n)`.
    pub popsize: Option<usize>,
    /// Stop once the step size falls below this value.
    pub tolx: f64,
    pub maxiter: Option<u64>,
    pub maxfevals: Option<u64>,
    /// Wall-clock budget measured from construction.
    pub timeout: Option<Duration>,
    /// Box bounds used to repair the incumbent.
    pub bounds: Option<(f64, f64)>,
    /// RNG seed; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for GaussianOptions {
    fn default() -> Self {
        Self {
            popsize: None,
            tolx: 1e-4,
            maxiter: None,
            maxfevals: None,
            timeout: None,
            bounds: None,
            seed: None,
        }
    }
}

impl GaussianOptions {
    pub fn with_popsize(mut self, popsize: usize) -> Self {
        self.popsize = Some(popsize);
        self
    }

    pub fn with_tolx(mut self, tolx: f64) -> Self {
        self.tolx = tolx;
        self
    }

    pub fn with_maxiter(mut self, maxiter: u64) -> Self {
        self.maxiter = Some(maxiter);
        self
    }

    pub fn with_maxfevals(mut self, maxfevals: u64) -> Self {
        self.maxfevals = Some(maxfevals);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.bounds = Some((lower, upper));
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// (μ/μ_w, λ) evolution strategy with isotropic cumulative step-size
/// adaptation.
pub struct GaussianKernel {
    mean: Vec<f64>,
    sigma: f64,
    sigma0: f64,
    lambda: usize,
    weights: Vec<f64>,
    mueff: f64,
    cs: f64,
    damps: f64,
    chi_n: f64,
    ps: Vec<f64>,
    count_iter: u64,
    count_evals: u64,
    options: GaussianOptions,
    rng: StdRng,
    started: Instant,
    forced_stop: StopStatus,
}

impl GaussianKernel {
    pub fn new(x0: Point, sigma0: f64, options: GaussianOptions) -> Result<Self, KernelError> {
        if x0.is_empty() {
            return Err(KernelError::InvalidDimension(
                "initial point must not be empty".into(),
            ));
        }
        if !(sigma0.is_finite() && sigma0 > 0.0) {
            return Err(KernelError::InvalidStepSize(sigma0));
        }
        let n = x0.len() as f64;
        let lambda = options
            .popsize
            .unwrap_or(4 + (3.0 * n.ln()).floor() as usize)
            .max(2);
        let mu = lambda / 2;

        let raw: Vec<f64> = (0..mu)
            .map(|i| (mu as f64 + 0.5).ln() - ((i + 1) as f64).ln())
            .collect();
        let total: f64 = raw.iter().sum();
        let weights: Vec<f64> = raw.iter().map(|w| w / total).collect();
        let mueff = 1.0 / weights.iter().map(|w| w * w).sum::<f64>();

        let cs = (mueff + 2.0) / (n + mueff + 5.0);
        let damps = 1.0 + 2.0 * (((mueff - 1.0) / (n + 1.0)).sqrt() - 1.0).max(0.0) + cs;
        let chi_n = n.sqrt() * (1.0 - 1.0 / (4.0 * n) + 1.0 / (21.0 * n * n));

        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            ps: vec![0.0; x0.len()],
            mean: x0,
            sigma: sigma0,
            sigma0,
            lambda,
            weights,
            mueff,
            cs,
            damps,
            chi_n,
            count_iter: 0,
            count_evals: 0,
            options,
            rng,
            started: Instant::now(),
            forced_stop: StopStatus::new(),
        })
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn sigma0(&self) -> f64 {
        self.sigma0
    }

    pub fn popsize(&self) -> usize {
        self.lambda
    }

    pub fn count_iter(&self) -> u64 {
        self.count_iter
    }

    pub fn count_evals(&self) -> u64 {
        self.count_evals
    }

    pub fn options(&self) -> &GaussianOptions {
        &self.options
    }

    /// Add a termination reason from outside.
    pub fn force_stop(&mut self, reason: impl Into<String>) {
        self.forced_stop.insert(reason, 1.0);
    }
}

impl Kernel for GaussianKernel {
    fn dimension(&self) -> usize {
        self.mean.len()
    }

    fn ask(&mut self) -> Vec<Point> {
        let sigma = self.sigma;
        let rng = &mut self.rng;
        let mut offspring = Vec::with_capacity(self.lambda);
        for _ in 0..self.lambda {
            let x: Point = self
                .mean
                .iter()
                .map(|m| {
                    let z: f64 = rng.sample(StandardNormal);
                    m + sigma * z
                })
                .collect();
            offspring.push(x);
        }
        offspring
    }

    fn tell(&mut self, points: &[Point], fitness: &[f64]) -> Result<(), KernelError> {
        if points.len() != fitness.len() {
            return Err(KernelError::FitnessLengthMismatch {
                points: points.len(),
                fitness: fitness.len(),
            });
        }
        if let Some(bad) = points.iter().find(|p| p.len() != self.mean.len()) {
            return Err(KernelError::InvalidDimension(format!(
                "expected {} coordinates, got {}",
                self.mean.len(),
                bad.len()
            )));
        }
        if points.is_empty() {
            return Ok(());
        }

        let mut order: Vec<usize> = (0..points.len()).collect();
        order.sort_by(|&a, &b| fitness[a].total_cmp(&fitness[b]));

        let n = self.mean.len();
        let mut step = vec![0.0; n];
        for (w, &idx) in self.weights.iter().zip(order.iter()) {
            for (s, (x, m)) in step.iter_mut().zip(points[idx].iter().zip(&self.mean)) {
                *s += w * (x - m) / self.sigma;
            }
        }

        for (m, s) in self.mean.iter_mut().zip(&step) {
            *m += self.sigma * s;
        }
        let c = (self.cs * (2.0 - self.cs) * self.mueff).sqrt();
        for (p, s) in self.ps.iter_mut().zip(&step) {
            *p = (1.0 - self.cs) * *p + c * s;
        }
        let ps_norm = self.ps.iter().map(|p| p * p).sum::<f64>().sqrt();
        self.sigma *= ((self.cs / self.damps) * (ps_norm / self.chi_n - 1.0)).exp();

        self.count_iter += 1;
        self.count_evals += points.len() as u64;
        debug!(
            iteration = self.count_iter,
            sigma = self.sigma,
            "gaussian kernel updated"
        );
        Ok(())
    }

    fn incumbent(&self) -> Point {
        match self.options.bounds {
            Some((lower, upper)) => self.mean.iter().map(|m| m.clamp(lower, upper)).collect(),
            None => self.mean.clone(),
        }
    }

    fn stop(&self) -> StopStatus {
        let mut status = self.forced_stop.clone();
        if self.sigma < self.options.tolx {
            status.insert("tolx", self.options.tolx);
        }
        if let Some(maxiter) = self.options.maxiter {
            if self.count_iter >= maxiter {
                status.insert("maxiter", maxiter as f64);
            }
        }
        if let Some(maxfevals) = self.options.maxfevals {
            if self.count_evals >= maxfevals {
                status.insert("maxfevals", maxfevals as f64);
            }
        }
        if let Some(timeout) = self.options.timeout {
            if self.started.elapsed() >= timeout {
                status.insert("timeout", timeout.as_secs_f64());
            }
        }
        status
    }

    fn step_size(&self) -> Option<f64> {
        Some(self.sigma)
    }

    fn initial_step_size(&self) -> Option<f64> {
        Some(self.sigma0)
    }

    fn copy_light(&self, step_size: Option<f64>) -> Result<Box<dyn Kernel>, KernelError> {
        let mut rng = self.rng.clone();
        let options = GaussianOptions {
            seed: Some(rng.gen()),
            ..self.options.clone()
        };
        let kernel = GaussianKernel::new(self.mean.clone(), step_size.unwrap_or(self.sigma), options)?;
        Ok(Box::new(kernel))
    }
}

/// One [`GaussianKernel`] per start point.
///
/// `sigmas` holds either a single step size shared by all kernels or one per
/// start point. With a seed in `options`, kernel `i` is seeded with
/// `seed + i`.
pub fn gaussian_kernels(
    x_starts: Vec<Point>,
    sigmas: &[f64],
    options: GaussianOptions,
) -> Result<Vec<GaussianKernel>, KernelError> {
    if sigmas.len() != 1 && sigmas.len() != x_starts.len() {
        return Err(KernelError::InvalidDimension(format!(
            "{} step sizes for {} start points",
            sigmas.len(),
            x_starts.len()
        )));
    }
    x_starts
        .into_iter()
        .enumerate()
        .map(|(i, x0)| {
            let sigma = if sigmas.len() == 1 { sigmas[0] } else { sigmas[i] };
            let opts = GaussianOptions {
                seed: options.seed.map(|s| s.wrapping_add(i as u64)),
                ..options.clone()
            };
            GaussianKernel::new(x0, sigma, opts)
        })
        .collect()
}
