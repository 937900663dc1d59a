//! CLI module for bidscan
//!
//! Thin wrappers over the library: argument handling, output file creation
//! and the operator-facing summary.

pub mod error;
pub mod parse;
pub mod scan;
