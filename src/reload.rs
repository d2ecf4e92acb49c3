// src/reload.rs

//! Live-reload notification channel.
//!
//! Live clients subscribe to a [`NotificationChannel`] and receive a
//! [`LiveEvent`] after every successful pipeline run in watch mode. The
//! transport that forwards events to browsers lives outside this crate.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::types::AssetKind;

const DEFAULT_CAPACITY: usize = 64;

/// What a live client should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveAction {
    /// Reload the whole page.
    Reload,
    /// Swap the asset in place without a reload.
    Inject,
}

impl From<AssetKind> for LiveAction {
    fn from(kind: AssetKind) -> Self {
        match kind {
            AssetKind::Stylesheet => LiveAction::Inject,
            AssetKind::Markup | AssetKind::Script | AssetKind::Image => LiveAction::Reload,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveEvent {
    pub kind: AssetKind,
    pub action: LiveAction,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("notification channel is closed")]
    Closed,
}

/// Publish side of the live-reload channel. Cheap to clone; every clone
/// publishes to the same subscribers.
#[derive(Clone)]
pub struct NotificationChannel {
    tx: Arc<Mutex<Option<broadcast::Sender<LiveEvent>>>>,
}

impl fmt::Debug for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationChannel")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationChannel {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// `capacity` bounds how far a slow subscriber may lag before it starts
    /// missing events.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        }
    }

    fn sender(&self) -> MutexGuard<'_, Option<broadcast::Sender<LiveEvent>>> {
        self.tx.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Emit the event for `kind`. Returns the number of subscribers reached;
    /// publishing with none is not an error.
    pub fn publish(&self, kind: AssetKind) -> Result<usize, NotifyError> {
        let guard = self.sender();
        let tx = guard.as_ref().ok_or(NotifyError::Closed)?;
        let event = LiveEvent {
            kind,
            action: kind.into(),
        };
        let reached = tx.send(event).unwrap_or(0);
        trace!(%kind, reached, "published live event");
        Ok(reached)
    }

    /// Subscribe to future events. Subscribing to a closed channel yields a
    /// receiver that reports closure immediately.
    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        match self.sender().as_ref() {
            Some(tx) => tx.subscribe(),
            None => broadcast::channel(1).1,
        }
    }

    /// Close the channel: pending subscribers drain what was sent, then see
    /// the channel end; later publishes are rejected.
    pub fn close(&self) {
        if self.sender().take().is_some() {
            debug!("notification channel closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender().is_none()
    }
}
