//! End-to-end test: Gaussian kernels on a bi-objective sphere in three
//! dimensions, with and without restarts.

use sofomore_archive::ParetoArchive;
use sofomore_engine::{
    AskCount, BestContributorRestart, Diagnostic, GaussianOptions, Kernel, ObjectiveFunctions,
    Sofomore, SofomoreOptions,
};
use sofomore_kernel::gaussian_kernels;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const NUM_KERNELS: usize = 5;

fn bi_sphere() -> ObjectiveFunctions {
    ObjectiveFunctions::new()
        .with(|x| x.iter().map(|v| v * v).sum())
        .with(|x| {
            x.iter()
                .enumerate()
                .map(|(i, v)| if i == 0 { (v - 1.0).powi(2) } else { v * v })
                .sum()
        })
}

/// Start points spread along the first axis, shifted off the Pareto set.
fn start_points() -> Vec<Vec<f64>> {
    (0..NUM_KERNELS)
        .map(|i| vec![(i + 1) as f64 / (NUM_KERNELS + 1) as f64, 0.3, 0.3])
        .collect()
}

fn population(maxiter: u64) -> Sofomore {
    let options = GaussianOptions::default().with_maxiter(maxiter).with_seed(17);
    let kernels: Vec<Box<dyn Kernel>> = gaussian_kernels(start_points(), &[0.1], options)
        .unwrap()
        .into_iter()
        .map(|k| Box::new(k) as Box<dyn Kernel>)
        .collect();
    Sofomore::new(
        kernels,
        SofomoreOptions::default().with_seed(5),
        vec![1.1, 1.1],
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn optimize_runs_until_every_kernel_stopped() {
    let objectives = bi_sphere();
    let mut moes = population(80);

    let first = moes.ask_all().unwrap();
    let values: Vec<Vec<f64>> = first.iter().map(|x| objectives.evaluate(x)).collect();
    moes.tell(&first, &values, &[]).unwrap();
    let initial = moes.pareto_front().unwrap().hypervolume();

    let rounds = moes
        .optimize(|x| objectives.evaluate(x), AskCount::All, Some(500))
        .unwrap();
    assert!(rounds < 80);
    assert!(moes.stop().is_some());
    assert!(moes.active_kernels().is_empty());

    let front = moes.pareto_front().unwrap();
    assert!(front.len() > 1);
    assert!(front.hypervolume() > initial);

    let last = moes.convergence().last().unwrap();
    assert!((last - front.hypervolume()).abs() < 1e-12);
    assert!(moes.convergence().best_hypervolume() >= last);

    // every front value was told, so the archive covers the front
    let archive = moes.archive_hypervolume().unwrap();
    assert!(archive >= front.hypervolume() - 1e-12);
    assert!(moes.countevals() > moes.countiter() * NUM_KERNELS as u64);
}

#[test]
fn restarts_keep_the_population_growing() {
    let objectives = bi_sphere();
    let mut moes = population(15).with_restart(BestContributorRestart::default());

    let rounds = moes
        .optimize(|x| objectives.evaluate(x), AskCount::All, Some(40))
        .unwrap();
    assert_eq!(rounds, 40);
    assert!(moes.num_kernels() > NUM_KERNELS);
    assert!(moes.stop().is_none());
    assert!(!moes
        .diagnostics()
        .iter()
        .any(|d| matches!(d, Diagnostic::RestartFailure { .. })));
    assert!(moes
        .pool()
        .iter()
        .all(|(_, slot)| slot.kernel().dimension() == 3));
}

#[test]
fn one_kernel_per_round_still_reaches_every_kernel() {
    let objectives = bi_sphere();
    let mut moes = population(200);
    for _ in 0..3 * NUM_KERNELS {
        let xs = moes.ask(1).unwrap();
        let values: Vec<Vec<f64>> = xs.iter().map(|x| objectives.evaluate(x)).collect();
        moes.tell(&xs, &values, &[]).unwrap();
    }
    for (id, slot) in moes.pool().iter() {
        assert!(slot.objective_values().is_some(), "kernel {id} never evaluated");
        assert!(!slot.last_offspring_values().is_empty(), "kernel {id} never asked");
    }
}
