//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting, verbosity and log setup
//!
//! # Design
//!
//! Command handlers never print directly; all output goes through this
//! module so quiet mode is honored in one place.

pub mod output;
