#![deny(unsafe_code)]
//! # sofomore-kernel
//!
//! The single-objective optimizers ("kernels") coordinated by Sofomore.
//!
//! A kernel is anything implementing [`Kernel`]: it samples candidates with
//! `ask`, consumes one scalar fitness per candidate with `tell` (lower is
//! better), exposes its incumbent and reports termination through a
//! [`StopStatus`].
//!
//! - [`GaussianKernel`]: a (μ/μ_w, λ) evolution strategy with cumulative
//!   step-size adaptation.
//! - [`SimulatedKernel`]: deterministic kernel for tests.

pub mod error;
pub mod gaussian;
pub mod kernel;
pub mod simulated;
pub mod types;

pub use error::KernelError;
pub use gaussian::{gaussian_kernels, GaussianKernel, GaussianOptions};
pub use kernel::Kernel;
pub use simulated::SimulatedKernel;
pub use types::{Point, StopStatus};
