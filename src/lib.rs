//! memberflow - Group membership departure for community platforms
//!
//! memberflow removes users from groups and keeps everything derived from
//! membership consistent afterwards: member counts, the visible-groups
//! index, auto-deleted privilege groups, user titles and the membership
//! cache.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to lifecycle)
//! - [`lifecycle`] - `leave`, `kick` and `leave_all_groups` orchestration
//! - [`groups`] - Group membership, catalog and join-request collaborators
//! - [`users`] - User title storage
//! - [`cache`] - Membership read cache
//! - [`hooks`] - Best-effort extension notifications
//! - [`store`] - Key/value storage primitives and the on-disk snapshot
//! - [`core`] - Domain types, naming rules and configuration
//! - [`ui`] - Output and logging
//!
//! # Correctness Invariants
//!
//! 1. A user is never removed from a group they did not belong to
//! 2. Cached membership is invalidated before derived state is recomputed
//! 3. Hook failures never fail the operation that fired them
//! 4. `leave` is idempotent and safe to retry after a partial failure

pub mod cache;
pub mod cli;
pub mod core;
pub mod groups;
pub mod hooks;
pub mod lifecycle;
pub mod store;
pub mod ui;
pub mod users;
