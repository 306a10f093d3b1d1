//! core
//!
//! Core domain types and configuration for memberflow.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Uid, GroupName, GroupRecord
//! - [`naming`] - Reserved group names and privilege-group detection
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing

pub mod config;
pub mod naming;
pub mod types;
