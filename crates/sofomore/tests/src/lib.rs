//! Cross-crate end-to-end and property tests for Sofomore.
//!
//! The tests live in `tests/`: `e2e_tests.rs` drives complete ask/tell runs,
//! `property_tests.rs` checks the invariants of fronts, scheduling and
//! constraint penalization over generated inputs.
