//! hooks
//!
//! Best-effort notifications for extension code.
//!
//! # Design
//!
//! The lifecycle manager fires a [`HookEvent`] after a successful change.
//! Delivery failures are reported through [`HookError`] so the bus can be
//! tested, but callers log and discard them: a listener can never fail the
//! operation that triggered it.
//!
//! # Example
//!
//! ```
//! use memberflow::core::types::{GroupName, Uid};
//! use memberflow::hooks::{HookBus, HookEvent, RecordingHookBus};
//!
//! # tokio_test::block_on(async {
//! let bus = RecordingHookBus::new();
//! bus.fire(HookEvent::GroupLeave {
//!     group_names: vec![GroupName::new("vip").unwrap()],
//!     uid: Uid::new(1),
//! })
//! .await
//! .unwrap();
//!
//! assert_eq!(bus.events()[0].name(), "action:group.leave");
//! # });
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{GroupName, Uid};

/// Errors from hook delivery.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HookError {
    /// A listener rejected the event.
    #[error("hook listener for '{event}' failed: {message}")]
    ListenerFailed {
        /// The event name
        event: &'static str,
        /// What the listener reported
        message: String,
    },

    /// The bus could not dispatch the event.
    #[error("hook bus unavailable: {0}")]
    Unavailable(String),
}

/// An event delivered to hook listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "hook", content = "payload")]
pub enum HookEvent {
    /// A user left one or more groups.
    #[serde(rename = "action:group.leave")]
    GroupLeave {
        #[serde(rename = "groupNames")]
        group_names: Vec<GroupName>,
        uid: Uid,
    },

    /// Pending requests and invitations of a user were cancelled.
    #[serde(rename = "action:group.rejectMembership")]
    GroupRejectMembership {
        #[serde(rename = "groupNames")]
        group_names: Vec<GroupName>,
        uid: Uid,
    },
}

impl HookEvent {
    /// The event name listeners subscribe to.
    pub fn name(&self) -> &'static str {
        match self {
            HookEvent::GroupLeave { .. } => "action:group.leave",
            HookEvent::GroupRejectMembership { .. } => "action:group.rejectMembership",
        }
    }
}

/// Dispatcher of hook events.
#[async_trait]
pub trait HookBus: Send + Sync {
    /// Deliver an event to every listener.
    async fn fire(&self, event: HookEvent) -> Result<(), HookError>;
}

/// Hook bus that only emits a log line per event.
#[derive(Debug, Clone, Default)]
pub struct LoggingHookBus;

#[async_trait]
impl HookBus for LoggingHookBus {
    async fn fire(&self, event: HookEvent) -> Result<(), HookError> {
        let payload = serde_json::to_string(&event).map_err(|e| HookError::ListenerFailed {
            event: event.name(),
            message: e.to_string(),
        })?;
        tracing::info!(hook = event.name(), %payload, "hook fired");
        Ok(())
    }
}

/// Hook bus that discards every event.
#[derive(Debug, Clone, Default)]
pub struct NullHookBus;

#[async_trait]
impl HookBus for NullHookBus {
    async fn fire(&self, _event: HookEvent) -> Result<(), HookError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RecordingInner {
    events: Vec<HookEvent>,
    fail_with: Option<HookError>,
}

/// Hook bus that records events, for tests.
///
/// Events are recorded even when the bus is configured to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingHookBus {
    inner: Arc<Mutex<RecordingInner>>,
}

impl RecordingHookBus {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every delivery fail with `error`.
    pub fn failing(error: HookError) -> Self {
        let bus = Self::new();
        if let Ok(mut inner) = bus.inner.lock() {
            inner.fail_with = Some(error);
        }
        bus
    }

    /// Events fired so far.
    pub fn events(&self) -> Vec<HookEvent> {
        self.inner
            .lock()
            .map(|inner| inner.events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl HookBus for RecordingHookBus {
    async fn fire(&self, event: HookEvent) -> Result<(), HookError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| HookError::Unavailable("recorder lock poisoned".into()))?;
        inner.events.push(event);
        match &inner.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}
