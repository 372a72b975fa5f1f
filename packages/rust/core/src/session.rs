//! Per-session state: the Vault and the results of both pipelines.
//!
//! Each session is owned by the [`SessionStore`] and handed out by `&mut`
//! for one interaction at a time. Nothing is persisted across restarts.

use std::collections::HashMap;

use bidflow_shared::{BidFlowError, PipelineResult, Result, SessionId, Vault};
use chrono::{DateTime, Utc};
use tracing::info;

/// What storing a Vault did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultChange {
    /// First Vault of the session.
    Created,
    /// Same content as before; results kept.
    Unchanged,
    /// Different content; downstream results cleared.
    Replaced,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    created_at: DateTime<Utc>,
    vault: Option<Vault>,
    decomposition: Option<PipelineResult>,
    responses: Option<PipelineResult>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            created_at: Utc::now(),
            vault: None,
            decomposition: None,
            responses: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Store a Vault. A Vault with a new fingerprint invalidates both results.
    pub fn store_vault(&mut self, vault: Vault) -> VaultChange {
        let change = match &self.vault {
            None => VaultChange::Created,
            Some(current) if current.fingerprint() == vault.fingerprint() => VaultChange::Unchanged,
            Some(_) => VaultChange::Replaced,
        };
        if change == VaultChange::Replaced {
            self.decomposition = None;
            self.responses = None;
        }
        info!(session = %self.id, ?change, documents = vault.documents().len(), "vault stored");
        self.vault = Some(vault);
        change
    }

    pub fn vault(&self) -> Option<&Vault> {
        self.vault.as_ref()
    }

    pub fn require_vault(&self) -> Result<&Vault> {
        self.vault
            .as_ref()
            .ok_or_else(|| BidFlowError::precondition("upload the tender pack before decomposing it"))
    }

    /// Store a Pipeline A result. Existing responses are stale and dropped.
    pub fn store_decomposition(&mut self, result: PipelineResult) {
        self.responses = None;
        self.decomposition = Some(result);
    }

    pub fn decomposition(&self) -> Option<&PipelineResult> {
        self.decomposition.as_ref()
    }

    /// The Pipeline A result, required before Pipeline B can run.
    pub fn require_decomposition(&self) -> Result<&PipelineResult> {
        self.decomposition.as_ref().ok_or_else(|| {
            BidFlowError::precondition("run the decomposition before generating responses")
        })
    }

    /// Whether Pipeline B may be offered.
    pub fn phase_two_available(&self) -> bool {
        self.decomposition.is_some()
    }

    pub fn store_responses(&mut self, result: PipelineResult) -> Result<()> {
        self.require_decomposition()?;
        self.responses = Some(result);
        Ok(())
    }

    pub fn responses(&self) -> Option<&PipelineResult> {
        self.responses.as_ref()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// All live sessions of the process.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh session and return its id.
    pub fn create(&mut self) -> SessionId {
        let session = Session::new();
        let id = session.id();
        self.sessions.insert(id, session);
        id
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    pub fn remove(&mut self, id: &SessionId) -> Option<Session> {
        self.sessions.remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
