//! lifecycle
//!
//! Leaving, kicking and mass departure.
//!
//! # Modules
//!
//! - [`manager`]: [`MembershipLifecycleManager`] and its collaborators
//! - `title`: title scrubbing after a departure
//! - `errors`: [`LifecycleError`]

mod errors;
pub mod manager;
mod title;

pub use errors::{LifecycleError, GROUP_NEEDS_OWNER};
pub use manager::{LeaveOutcome, LifecycleDeps, MembershipLifecycleManager};
pub use title::scrub_title;
