//! store
//!
//! Storage primitives for membership state.
//!
//! # Architecture
//!
//! The lifecycle manager never talks to a storage engine directly. The
//! groups and users adapters translate their operations into the primitives
//! of the [`KvStore`] trait, which has these implementations:
//!
//! - [`MemoryStore`]: in-process keyspace (tests, CLI)
//! - [`SnapshotFile`]: persists a [`MemoryStore`] keyspace as locked JSON
//!
//! # Example
//!
//! ```
//! use memberflow::store::{KvStore, MemoryStore};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! store.set_add("group:vip:owners", "1").await.unwrap();
//! assert_eq!(store.set_count("group:vip:owners").await.unwrap(), 1);
//! # });
//! ```

pub mod memory;
mod snapshot;
mod traits;

pub use memory::{FailOn, Keyspace, MemoryStore, StoreOp};
pub use snapshot::{SnapshotError, SnapshotFile};
pub use traits::{KvStore, StoreError};
