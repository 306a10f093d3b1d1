//! Shared state handling for command handlers.

use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cache::LocalCache;
use crate::cli::Context;
use crate::hooks::{HookBus, LoggingHookBus, NullHookBus};
use crate::lifecycle::{LifecycleDeps, MembershipLifecycleManager};
use crate::store::{MemoryStore, SnapshotFile};

/// A locked state file loaded into memory.
///
/// Changes made through [`Session::manager`] stay in memory until
/// [`Session::commit`]; dropping the session without committing discards
/// them and releases the lock.
pub struct Session {
    snapshot: SnapshotFile,
    store: MemoryStore,
    manager: MembershipLifecycleManager,
}

impl Session {
    /// Lock and load the state file named by `ctx`.
    pub fn open(ctx: &Context) -> Result<Self> {
        let path = ctx.state_path()?;
        let snapshot = SnapshotFile::open(&path).context("Failed to open state file")?;
        let keyspace = snapshot.load().context("Failed to load state file")?;
        tracing::debug!(path = %path.display(), keys = keyspace.keys.len(), "state loaded");

        let store = MemoryStore::from_keyspace(keyspace);
        let hooks: Arc<dyn HookBus> = if ctx.config.log_events() {
            Arc::new(LoggingHookBus)
        } else {
            Arc::new(NullHookBus)
        };
        let deps = LifecycleDeps::from_store_with(
            Arc::new(store.clone()),
            Arc::new(LocalCache::new(ctx.config.cache_capacity())),
            hooks,
        );

        Ok(Self {
            snapshot,
            store,
            manager: MembershipLifecycleManager::new(deps),
        })
    }

    /// The lifecycle manager bound to this session's store.
    pub fn manager(&self) -> &MembershipLifecycleManager {
        &self.manager
    }

    /// The in-memory store.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Persist the in-memory state and release the lock.
    pub fn commit(self) -> Result<()> {
        let keyspace = self.store.snapshot().context("Failed to read in-memory state")?;
        self.snapshot
            .commit(&keyspace)
            .context("Failed to write state file")?;
        tracing::debug!(path = %self.snapshot.path().display(), "state committed");
        Ok(())
    }
}
