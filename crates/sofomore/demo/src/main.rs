#![deny(unsafe_code)]
//! Sofomore demo binary.
//!
//! Runs COMO with Gaussian kernels on a bi-objective sphere problem:
//! 1. Unconstrained optimization with restarts
//! 2. The same problem under a half-space constraint
//! 3. Population lifecycle: inactivate, activate, remove, compact
//!
//! An optional first argument holds the options as JSON, e.g.
//! `sofomore-demo '{"update_order": "index_ascending", "seed": 3}'`.
//! Set `RUST_LOG=info` to see the per-round status lines.

mod problem;

use anyhow::Context;
use sofomore_archive::{NondominatedList, ParetoArchive};
use sofomore_engine::{
    AskCount, BestContributorRestart, GaussianOptions, Kernel, KernelId, Sofomore,
    SofomoreOptions,
};
use sofomore_kernel::gaussian_kernels;
use tracing_subscriber::EnvFilter;

// ── Formatting Helpers ──────────────────────────────────────────────────

const BANNER: &str = r#"
 ╔═══════════════════════════════════════════════════════════════╗
 ║                  Sofomore / COMO  --  Demo                    ║
 ║                                                               ║
 ║   Single-objective kernels jointly approximating a Pareto     ║
 ║   front through uncrowded hypervolume improvement.            ║
 ╚═══════════════════════════════════════════════════════════════╝
"#;

const DIMENSION: usize = 5;
const NUM_KERNELS: usize = 11;
const REFERENCE_POINT: [f64; 2] = [1.1, 1.1];

fn section(title: &str) {
    let width: usize = 60;
    let pad = width.saturating_sub(title.len() + 4);
    let left = pad / 2;
    let right = pad - left;
    println!();
    println!(" ┌{}┐", "─".repeat(width));
    println!(" │{}  {}  {}│", " ".repeat(left), title, " ".repeat(right));
    println!(" └{}┘", "─".repeat(width));
}

fn ok(msg: &str) {
    println!("   [OK]  {}", msg);
}

fn info(msg: &str) {
    println!("   [--]  {}", msg);
}

fn warn(msg: &str) {
    println!("   [!!]  {}", msg);
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    println!("{}", BANNER);

    if let Err(e) = run_demo() {
        eprintln!();
        eprintln!("   [FATAL]  Demo failed: {:#}", e);
        std::process::exit(1);
    }

    println!();
    println!(" ════════════════════════════════════════════════════════════════");
    println!("  Demo complete.");
    println!(" ════════════════════════════════════════════════════════════════");
    println!();
}

fn read_options() -> anyhow::Result<serde_json::Value> {
    match std::env::args().nth(1) {
        Some(raw) => serde_json::from_str(&raw).context("first argument is not valid JSON"),
        None => Ok(serde_json::to_value(SofomoreOptions::demo())?),
    }
}

fn build(options: &serde_json::Value, seed: u64) -> anyhow::Result<Sofomore> {
    let kernel_options = GaussianOptions::default()
        .with_seed(seed)
        .with_maxiter(150)
        .with_tolx(1e-5);
    let kernels: Vec<Box<dyn Kernel>> = gaussian_kernels(
        problem::start_points(NUM_KERNELS, DIMENSION, seed),
        &[0.2],
        kernel_options,
    )?
    .into_iter()
    .map(|k| Box::new(k) as Box<dyn Kernel>)
    .collect();
    let sofomore = Sofomore::from_json_options(kernels, options, REFERENCE_POINT.to_vec())?
        .with_restart(BestContributorRestart::default());
    Ok(sofomore)
}

fn run_demo() -> anyhow::Result<()> {
    let options = read_options()?;
    tracing::info!(%options, "coordinator options");
    let objectives = problem::bi_sphere();

    // ── Phase A: Unconstrained ──────────────────────────────────────
    section("Phase A: Bi-objective sphere");

    let mut moes = build(&options, 1)?;
    for d in moes.take_diagnostics() {
        warn(&format!("{}", d));
    }
    info(&format!(
        "{} kernels  dimension={}  reference={:?}",
        moes.num_kernels(),
        moes.dimension(),
        moes.reference_point()
    ));
    info(Sofomore::<NondominatedList>::display_header());

    let mut rounds = 0;
    while moes.stop().is_none() && rounds < 400 {
        let solutions = moes.ask(1)?;
        let values: Vec<Vec<f64>> = solutions.iter().map(|x| objectives.evaluate(x)).collect();
        moes.tell(&solutions, &values, &[])?;
        if let Some(line) = moes.disp(Some(50)) {
            info(&line);
        }
        rounds += 1;
    }
    print_summary(&moes)?;

    // ── Phase B: Constrained ────────────────────────────────────────
    section("Phase B: Half-space constraint  x[0] <= 0.5");

    let mut constrained = build(&options, 2)?;
    for _ in 0..150 {
        let solutions = constrained.ask_count(AskCount::All)?;
        let values: Vec<Vec<f64>> = solutions.iter().map(|x| objectives.evaluate(x)).collect();
        let g: Vec<Vec<f64>> = vec![solutions.iter().map(|x| problem::half_space(x)).collect()];
        constrained.tell(&solutions, &values, &g)?;
    }
    let set = constrained.pareto_set()?;
    let feasible = set.iter().filter(|x| problem::half_space(x) <= 0.0).count();
    ok(&format!(
        "{} of {} Pareto set points satisfy the constraint",
        feasible,
        set.len()
    ));
    print_summary(&constrained)?;

    // ── Phase C: Lifecycle ──────────────────────────────────────────
    section("Phase C: Population lifecycle");

    let mut moes = build(&options, 3)?;
    let rounds = moes.optimize(|x| objectives.evaluate(x), AskCount::Count(2), Some(40))?;
    ok(&format!("{} rounds, {} evaluations", rounds, moes.countevals()));

    moes.inactivate(KernelId(0))?;
    ok(&format!("kernel 0 inactivated, active={:?}", moes.active_kernels()));
    moes.activate(KernelId(0))?;
    ok(&format!("kernel 0 activated, active={:?}", moes.active_kernels()));

    let before = moes.num_kernels();
    moes.remove(&[KernelId(3), KernelId(4)])?;
    ok(&format!("removed kernels 3 and 4: {} -> {}", before, moes.num_kernels()));
    let mapping = moes.compact()?;
    let renumbered = mapping.iter().filter(|(old, new)| old != new).count();
    ok(&format!("compacted, {} ids renumbered", renumbered));

    let rounds = moes.optimize(|x| objectives.evaluate(x), AskCount::All, Some(20))?;
    ok(&format!("{} more rounds after compaction", rounds));
    for d in moes.diagnostics() {
        warn(&format!("{}", d));
    }
    print_summary(&moes)?;

    Ok(())
}

fn print_summary(moes: &Sofomore) -> anyhow::Result<()> {
    let front = moes.pareto_front()?;
    ok(&format!("Rounds            : {}", moes.countiter()));
    ok(&format!("Evaluations       : {}", moes.countevals()));
    ok(&format!("Front size        : {}", front.len()));
    ok(&format!("Front hypervolume : {:.6}", front.hypervolume()));
    ok(&format!(
        "Best hypervolume  : {:.6}",
        moes.convergence().best_hypervolume()
    ));
    ok(&format!(
        "Convergence gap   : {:.3e}",
        moes.convergence().epsilon_gap()
    ));
    if let Some(hv) = moes.archive_hypervolume() {
        ok(&format!("Archive hypervol. : {:.6}", hv));
    }
    let stopped = moes
        .termination_status()
        .values()
        .filter(|s| s.is_stopped())
        .count();
    info(&format!(
        "Kernels           : {} live, {} stopped, {} active",
        moes.num_kernels(),
        stopped,
        moes.active_kernels().len()
    ));
    if let Some(status) = moes.stop() {
        info(&format!("All kernels stopped ({} statuses)", status.len()));
    }
    Ok(())
}
