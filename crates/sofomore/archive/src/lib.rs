#![deny(unsafe_code)]
//! # sofomore-archive
//!
//! Non-dominated fronts over objective vectors (minimization), bounded by a
//! reference point, together with the hypervolume indicator and the
//! uncrowded hypervolume improvement used to scalarize offspring.
//!
//! The coordinator in `sofomore-engine` only talks to the [`ParetoArchive`]
//! trait; [`NondominatedList`] is the reference implementation.

pub mod archive;
pub mod dominance;
pub mod error;
pub mod hypervolume;
pub mod list;

pub use archive::{ObjectiveVector, ParetoArchive};
pub use dominance::{dominates, nondominated_subset, strictly_inside, weakly_dominates};
pub use error::ArchiveError;
pub use hypervolume::hypervolume;
pub use list::NondominatedList;
