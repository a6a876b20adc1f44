#![deny(unsafe_code)]
//! # sofomore-engine
//!
//! Coordinates a population of single-objective kernels so that their
//! incumbents jointly approximate the Pareto front of a multiobjective
//! function (COMO / Sofomore). Each round:
//!
//! 1. [`Sofomore::ask`] returns the incumbents pending evaluation followed by
//!    offspring sampled from the kernels picked by the [`AskScheduler`].
//! 2. The caller evaluates every returned point.
//! 3. [`Sofomore::tell`] turns the offspring evaluations into scalar fitness
//!    (uncrowded hypervolume improvement against the front of the *other*
//!    kernels, rank-penalized under constraints), tells each kernel, and
//!    handles terminations and restarts.
//!
//! Non-fatal conditions are collected as [`Diagnostic`]s rather than
//! swallowed.

pub mod convergence;
pub mod diagnostics;
pub mod error;
pub mod fitness;
pub mod lifecycle;
pub mod objective;
pub mod options;
pub mod penalty;
pub mod pool;
pub mod scheduler;
pub mod sofomore;

pub use convergence::ConvergenceTracker;
pub use diagnostics::Diagnostic;
pub use error::{RestartError, SofomoreError, SofomoreResult};
pub use fitness::{Assignment, FitnessAssigner};
pub use lifecycle::{
    aggregate_stop, restart_allowed, termination_status, BestContributorRestart, RandomRestart,
    RestartContext, RestartFactory,
};
pub use objective::ObjectiveFunctions;
pub use options::{OrderKey, SofomoreOptions, UpdateOrder};
pub use penalty::{mean_ranks, RankPenalizer};
pub use pool::{KernelId, KernelPool, KernelSlot, INACTIVE_REASON};
pub use scheduler::{ask_indices, AskScheduler};
pub use sofomore::{AskCount, Sofomore};

pub use sofomore_archive::{NondominatedList, ObjectiveVector, ParetoArchive};
pub use sofomore_kernel::{GaussianKernel, GaussianOptions, Kernel, Point, StopStatus};
