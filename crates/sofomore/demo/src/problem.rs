//! Test problems for the demo.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sofomore_engine::{ObjectiveFunctions, Point};

/// Two sphere functions centred at the origin and at the all-ones point,
/// scaled by the dimension. The Pareto set is the segment between them and
/// the front is `(sqrt f1 - 1)^2 = f2` on `[0, 1]`.
pub fn bi_sphere() -> ObjectiveFunctions {
    ObjectiveFunctions::new()
        .with(|x| x.iter().map(|v| v * v).sum::<f64>() / x.len() as f64)
        .with(|x| x.iter().map(|v| (v - 1.0) * (v - 1.0)).sum::<f64>() / x.len() as f64)
}

/// Keeps the first coordinate below one half.
pub fn half_space(x: &[f64]) -> f64 {
    x[0] - 0.5
}

/// `count` start points uniform in `[0, 1]^dimension`.
pub fn start_points(count: usize, dimension: usize, seed: u64) -> Vec<Point> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (0..dimension).map(|_| rng.gen::<f64>()).collect())
        .collect()
}
