//! End-to-end test: termination, restart policies and global stop.

use sofomore_engine::{
    AskCount, Diagnostic, GaussianKernel, GaussianOptions, Kernel, KernelId, RandomRestart,
    RestartContext, RestartError, Sofomore, SofomoreOptions, UpdateOrder,
};
use sofomore_kernel::SimulatedKernel;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn options() -> SofomoreOptions {
    SofomoreOptions::default()
        .with_update_order(UpdateOrder::IndexAscending)
        .with_seed(5)
}

fn evaluate(x: &[f64]) -> Vec<f64> {
    let n = x.len() as f64;
    vec![
        x.iter().map(|v| v * v).sum::<f64>() / n,
        x.iter().map(|v| (v - 1.0) * (v - 1.0)).sum::<f64>() / n,
    ]
}

fn run(moes: &mut Sofomore, rounds: usize, count: AskCount) {
    for _ in 0..rounds {
        let xs = moes.ask_count(count).unwrap();
        let fs: Vec<Vec<f64>> = xs.iter().map(|x| evaluate(x)).collect();
        moes.tell(&xs, &fs, &[]).unwrap();
    }
}

fn gaussian(x0: Vec<f64>, options: GaussianOptions) -> Box<dyn Kernel> {
    Box::new(GaussianKernel::new(x0, 0.1, options).unwrap())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn exhausted_kernels_are_replaced_by_random_restarts() {
    let kernel_options = GaussianOptions::default().with_maxiter(3).with_seed(1);
    let kernels = vec![
        gaussian(vec![0.2, 0.2], kernel_options.clone()),
        gaussian(vec![0.8, 0.8], kernel_options.clone().with_seed(2)),
    ];
    let mut moes = Sofomore::new(kernels, options(), vec![1.1, 1.1])
        .unwrap()
        .with_restart(RandomRestart::new(kernel_options.with_maxiter(100).with_seed(9)));

    run(&mut moes, 3, AskCount::All);

    // both kernels reached maxiter in round 3 and were replaced
    assert_eq!(moes.num_kernels(), 4);
    assert_eq!(moes.active_kernels(), &[KernelId(2), KernelId(3)]);
    assert!(moes.told().contains(&KernelId(2)));
    assert!(moes.told().contains(&KernelId(3)));
    assert!(moes.stop().is_none());
    assert!(moes.termination_status()[&KernelId(0)].contains("maxiter"));
    assert!(moes.diagnostics().is_empty());

    // the replacements start from the restart factory's step size
    let replacement = moes.kernel(KernelId(2)).unwrap();
    assert_eq!(replacement.step_size(), Some(0.1));
}

#[test]
fn timeout_stops_without_restart() {
    let kernels: Vec<Box<dyn Kernel>> = vec![
        Box::new(SimulatedKernel::new(vec![0.1]).with_stop_after(1, "timeout")),
        Box::new(SimulatedKernel::new(vec![0.9]).with_stop_after(1, "timeout")),
    ];
    let mut moes = Sofomore::new(kernels, options(), vec![1.1, 1.1])
        .unwrap()
        .with_restart(RandomRestart::new(GaussianOptions::default()));

    run(&mut moes, 1, AskCount::All);

    assert_eq!(moes.num_kernels(), 2);
    assert!(moes.active_kernels().is_empty());
    let status = moes.stop().expect("every kernel timed out");
    assert!(status.values().all(|s| s.contains("timeout")));
}

#[test]
fn custom_skip_reasons_disable_restart() {
    let kernels: Vec<Box<dyn Kernel>> = vec![
        Box::new(SimulatedKernel::new(vec![0.1]).with_stop_after(1, "maxiter")),
        Box::new(SimulatedKernel::new(vec![0.9])),
    ];
    let options = options().with_restart_skip_reasons(vec!["maxiter".into()]);
    let mut moes = Sofomore::new(kernels, options, vec![1.1, 1.1])
        .unwrap()
        .with_restart(RandomRestart::new(GaussianOptions::default()));

    run(&mut moes, 1, AskCount::All);
    assert_eq!(moes.num_kernels(), 2);
    assert_eq!(moes.active_kernels(), &[KernelId(1)]);
}

#[test]
fn closure_factory_sees_the_population() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let factory = move |ctx: &RestartContext<'_>| -> Result<Box<dyn Kernel>, RestartError> {
        seen.fetch_add(1, Ordering::SeqCst);
        assert_eq!(ctx.stopped, KernelId(0));
        assert_eq!(ctx.dimension, 1);
        assert_eq!(ctx.reference_point, &[1.1, 1.1]);
        assert_eq!(ctx.contributions.len(), 2);
        Ok(Box::new(SimulatedKernel::new(vec![0.5])))
    };

    let kernels: Vec<Box<dyn Kernel>> = vec![
        Box::new(SimulatedKernel::new(vec![0.1]).with_stop_after(2, "tolx")),
        Box::new(SimulatedKernel::new(vec![0.9])),
    ];
    let mut moes = Sofomore::new(kernels, options(), vec![1.1, 1.1])
        .unwrap()
        .with_restart(factory);

    run(&mut moes, 2, AskCount::All);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(moes.num_kernels(), 3);
    assert_eq!(moes.told(), &[KernelId(2), KernelId(0), KernelId(1)]);

    // the next round evaluates the new incumbent first
    let xs = moes.ask(1).unwrap();
    assert_eq!(xs[0], vec![0.5]);
}

#[test]
fn failing_factory_leaves_a_diagnostic_and_the_round_completes() {
    let kernels: Vec<Box<dyn Kernel>> = vec![
        Box::new(SimulatedKernel::new(vec![0.1]).with_stop_after(1, "tolx")),
        Box::new(SimulatedKernel::new(vec![0.9]).with_stop_after(1, "tolx")),
    ];
    let mut moes = Sofomore::new(kernels, options(), vec![1.1, 1.1])
        .unwrap()
        .with_restart(
            |_: &RestartContext<'_>| -> Result<Box<dyn Kernel>, RestartError> {
                Err(RestartError::Factory("out of budget".into()))
            },
        );

    run(&mut moes, 1, AskCount::All);
    assert_eq!(moes.countiter(), 1);
    let diagnostics = moes.take_diagnostics();
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics
        .iter()
        .all(|d| matches!(d, Diagnostic::RestartFailure { reason, .. } if reason.contains("out of budget"))));
    assert!(moes.stop().is_some());
}

#[test]
fn already_terminated_kernels_are_not_scheduled() {
    let timed_out = GaussianOptions::default().with_timeout(Duration::ZERO);
    let kernels = vec![
        gaussian(vec![0.3], timed_out),
        gaussian(vec![0.7], GaussianOptions::default().with_seed(3)),
    ];
    let mut moes = Sofomore::new(kernels, options(), vec![1.1, 1.1]).unwrap();
    assert_eq!(moes.active_kernels(), &[KernelId(1)]);

    let xs = moes.ask(2).unwrap();
    assert!(matches!(
        moes.diagnostics(),
        [Diagnostic::CapacityWarning { requested: 2, active: 1 }]
    ));
    // both incumbents, then one offspring batch from kernel 1
    let popsize = 4;
    assert_eq!(xs.len(), 2 + popsize);
}

#[test]
fn ask_with_nothing_active_only_returns_pending_incumbents() {
    let kernels: Vec<Box<dyn Kernel>> = vec![Box::new(SimulatedKernel::new(vec![0.4]).stopped("tolx"))];
    let mut moes = Sofomore::new(kernels, options(), vec![1.1, 1.1]).unwrap();

    let xs = moes.ask(1).unwrap();
    assert_eq!(xs, vec![vec![0.4]]);
    let fs: Vec<Vec<f64>> = xs.iter().map(|x| evaluate(x)).collect();
    moes.tell(&xs, &fs, &[]).unwrap();
    assert!(moes.told().is_empty());
    assert!(moes.pareto_front().is_ok());
    assert!(matches!(
        moes.ask(1),
        Err(sofomore_engine::SofomoreError::NoActiveKernels)
    ));
}
