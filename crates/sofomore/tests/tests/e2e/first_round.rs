//! End-to-end test: the first ask/tell round of a small population.
//!
//! Three kernels, two objectives, reference point (1.1, 1.1), kernels
//! scheduled by ascending index, two kernels asked per round.

use sofomore_archive::ParetoArchive;
use sofomore_engine::{Diagnostic, Kernel, KernelId, Sofomore, SofomoreOptions, UpdateOrder};
use sofomore_kernel::SimulatedKernel;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn three_kernels() -> Sofomore {
    let kernels: Vec<Box<dyn Kernel>> = [0.2, 0.5, 0.8]
        .iter()
        .map(|&x| Box::new(SimulatedKernel::new(vec![x]).with_spread(0.05)) as Box<dyn Kernel>)
        .collect();
    let options = SofomoreOptions::default()
        .with_update_order(UpdateOrder::IndexAscending)
        .with_seed(11);
    Sofomore::new(kernels, options, vec![1.1, 1.1]).unwrap()
}

fn evaluate(x: &[f64]) -> Vec<f64> {
    vec![x[0] * x[0], (x[0] - 1.0) * (x[0] - 1.0)]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn first_ask_returns_incumbents_then_offspring_of_two_kernels() {
    let mut moes = three_kernels();
    let xs = moes.ask(2).unwrap();

    // 3 incumbents, then 2 offspring each from kernels 0 and 1
    assert_eq!(xs.len(), 3 + 2 * 2);
    assert_eq!(&xs[..3], &[vec![0.2], vec![0.5], vec![0.8]]);
    assert!((xs[3][0] - 0.25).abs() < 1e-12);
    assert!((xs[4][0] - 0.30).abs() < 1e-12);
    assert!((xs[5][0] - 0.55).abs() < 1e-12);
    assert!((xs[6][0] - 0.60).abs() < 1e-12);
}

#[test]
fn tell_resets_told_set_and_advances_counters() {
    let mut moes = three_kernels();
    let xs = moes.ask(2).unwrap();
    let fs: Vec<Vec<f64>> = xs.iter().map(|x| evaluate(x)).collect();
    moes.tell(&xs, &fs, &[]).unwrap();

    assert_eq!(moes.told(), &[KernelId(0), KernelId(1)]);
    assert_eq!(moes.countiter(), 1);
    assert_eq!(moes.countevals(), 7);

    for (i, x) in [0.2, 0.5, 0.8].iter().enumerate() {
        let slot = moes.pool().slot(KernelId(i)).unwrap();
        assert_eq!(slot.objective_values(), Some(&evaluate(&[*x])));
    }
    assert_eq!(
        moes.pool().slot(KernelId(0)).unwrap().last_offspring_values(),
        &fs[3..5]
    );
    assert!(moes.pool().slot(KernelId(2)).unwrap().last_offspring_values().is_empty());
}

#[test]
fn second_round_evaluates_the_told_incumbents() {
    let mut moes = three_kernels();
    let xs = moes.ask(2).unwrap();
    let fs: Vec<Vec<f64>> = xs.iter().map(|x| evaluate(x)).collect();
    moes.tell(&xs, &fs, &[]).unwrap();

    let ys = moes.ask(2).unwrap();
    let incumbents: Vec<Vec<f64>> = [KernelId(0), KernelId(1)]
        .iter()
        .map(|&id| moes.kernel(id).unwrap().incumbent())
        .collect();
    assert_eq!(&ys[..2], incumbents.as_slice());
    // kernel 2 has not sampled yet, so it leads the rotation
    assert!((ys[2][0] - 0.85).abs() < 1e-12);
    assert_eq!(ys.len(), 2 + 2 * 2);

    let gs: Vec<Vec<f64>> = ys.iter().map(|x| evaluate(x)).collect();
    moes.tell(&ys, &gs, &[]).unwrap();
    assert_eq!(moes.countiter(), 2);
    assert_eq!(moes.countevals(), 13);
    assert_eq!(moes.told(), &[KernelId(2), KernelId(0)]);
}

#[test]
fn unasked_kernel_is_not_reevaluated() {
    let mut moes = three_kernels();
    let xs = moes.ask(2).unwrap();
    let fs: Vec<Vec<f64>> = xs.iter().map(|x| evaluate(x)).collect();
    moes.tell(&xs, &fs, &[]).unwrap();

    // kernel 2 sampled nothing, its incumbent and stored value still agree
    assert!(!moes.told().contains(&KernelId(2)));
    assert_eq!(moes.kernel(KernelId(2)).unwrap().incumbent(), vec![0.8]);
    let ys = moes.ask(2).unwrap();
    assert!(!ys[..2].contains(&vec![0.8]));

    let gs: Vec<Vec<f64>> = ys.iter().map(|x| evaluate(x)).collect();
    moes.tell(&ys, &gs, &[]).unwrap();
    assert_eq!(
        moes.pool().slot(KernelId(2)).unwrap().objective_values(),
        Some(&evaluate(&[0.8]))
    );
}

#[test]
fn front_and_archive_after_first_round() {
    let mut moes = three_kernels();
    let xs = moes.ask(2).unwrap();
    let fs: Vec<Vec<f64>> = xs.iter().map(|x| evaluate(x)).collect();
    moes.tell(&xs, &fs, &[]).unwrap();

    let front = moes.pareto_front().unwrap();
    assert_eq!(front.len(), 3);
    assert_eq!(moes.pareto_set().unwrap().len(), 3);
    // the archive saw the offspring too
    assert_eq!(moes.archive().unwrap().len(), 7);
    assert!(moes.archive_hypervolume().unwrap() >= front.hypervolume());
    assert!(moes.convergence().best_hypervolume() > 0.0);
}

#[test]
fn json_options_set_the_rotation_and_report_unknown_keys() {
    let kernels: Vec<Box<dyn Kernel>> = [0.2, 0.5, 0.8]
        .iter()
        .map(|&x| Box::new(SimulatedKernel::new(vec![x]).with_spread(0.05)) as Box<dyn Kernel>)
        .collect();
    let options = serde_json::json!({
        "update_order": "index_descending",
        "seed": 11,
        "popsize": 4
    });
    let mut moes = Sofomore::from_json_options(kernels, &options, vec![1.1, 1.1]).unwrap();
    assert!(matches!(
        moes.diagnostics(),
        [Diagnostic::ConfigurationWarning { .. }]
    ));

    let xs = moes.ask(1).unwrap();
    assert_eq!(xs.len(), 3 + 2);
    // kernel 2 leads a descending rotation
    assert!((xs[3][0] - 0.85).abs() < 1e-12);
}
