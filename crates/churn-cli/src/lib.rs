//! Library side of the `churn` binary: argument-to-config plumbing and the
//! train / predict / score command bodies, kept here so they can be tested
//! without spawning the binary.
pub mod predict;
pub mod score;
pub mod train;
pub mod util;
