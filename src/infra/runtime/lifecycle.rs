//! Lifecycle of the one shared solved.ac HTTP client.
//!
//! A [`RemoteClientHandle`] is constructed explicitly and cloned into every
//! component that issues requests. It starts uninitialized, becomes active on
//! [`RemoteClientHandle::activate`] and is closed by
//! [`RemoteClientHandle::deactivate`] (or by dropping a [`ClientScope`]).
//! Operations clone the live client out under a short read lock and never
//! hold the lock across an `.await`.

use std::sync::{Arc, RwLock};

use crate::core::error::{Result, SolvedAcError};
use crate::infra::config::RemoteSettings;
use crate::infra::runtime::limits::make_http_client;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Active,
    Closed,
}

/// The live client plus the base address it is bound to.
#[derive(Clone, Debug)]
pub struct ActiveClient {
    pub http: reqwest::Client,
    base_url: Arc<str>,
}

impl ActiveClient {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug)]
enum Slot {
    Uninitialized,
    Active(ActiveClient),
    Closed,
}

#[derive(Clone, Debug)]
pub struct RemoteClientHandle {
    settings: Arc<RemoteSettings>,
    slot: Arc<RwLock<Slot>>,
}

impl RemoteClientHandle {
    pub fn new(settings: RemoteSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            slot: Arc::new(RwLock::new(Slot::Uninitialized)),
        }
    }

    pub fn settings(&self) -> &RemoteSettings {
        &self.settings
    }

    /// Build the shared client. Activating an already active handle keeps
    /// the existing client.
    pub fn activate(&self) -> Result<()> {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        if matches!(*slot, Slot::Active(_)) {
            tracing::warn!("solved.ac client already active; keeping existing instance");
            return Ok(());
        }
        let http = make_http_client(&self.settings)?;
        *slot = Slot::Active(ActiveClient {
            http,
            base_url: Arc::from(self.settings.base_url.as_str()),
        });
        tracing::info!(
            base_url = %self.settings.base_url,
            timeout_secs = self.settings.timeout_secs,
            "solved.ac client activated"
        );
        Ok(())
    }

    /// Drop the shared client. Requests already in flight finish on their
    /// own clone; no new request can start. No-op when never activated.
    pub fn deactivate(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        if matches!(*slot, Slot::Active(_)) {
            *slot = Slot::Closed;
            tracing::info!("solved.ac client closed");
        }
    }

    pub fn state(&self) -> LifecycleState {
        match *self.slot.read().unwrap_or_else(|e| e.into_inner()) {
            Slot::Uninitialized => LifecycleState::Uninitialized,
            Slot::Active(_) => LifecycleState::Active,
            Slot::Closed => LifecycleState::Closed,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == LifecycleState::Active
    }

    /// The live client, or `ClientUnavailable` when not active.
    pub fn client(&self) -> Result<ActiveClient> {
        match &*self.slot.read().unwrap_or_else(|e| e.into_inner()) {
            Slot::Active(c) => Ok(c.clone()),
            _ => Err(SolvedAcError::ClientUnavailable),
        }
    }

    /// Activate and return a guard that deactivates when dropped.
    pub fn scope(&self) -> Result<ClientScope> {
        self.activate()?;
        Ok(ClientScope { handle: self.clone() })
    }
}

/// Keeps the client active for as long as it lives.
#[must_use = "the client is closed as soon as the scope is dropped"]
#[derive(Debug)]
pub struct ClientScope {
    handle: RemoteClientHandle,
}

impl ClientScope {
    pub fn handle(&self) -> &RemoteClientHandle {
        &self.handle
    }
}

impl Drop for ClientScope {
    fn drop(&mut self) {
        self.handle.deactivate();
    }
}
