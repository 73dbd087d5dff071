//! Per-session questionnaire state and the registry that keeps sessions apart.
//!
//! Each `FormSession` owns its stepper and answers outright; the registry lock only
//! guards the map and is never held across an external call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::form::answers::AnswerStore;
use crate::form::catalog::StepCatalog;
use crate::form::errors::FormError;
use crate::form::fields::{FieldDecl, FieldValue};
use crate::form::payload::{assemble, Identity, SubmissionPayload};
use crate::form::stepper::Stepper;

#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    #[serde(flatten)]
    pub decl: FieldDecl,
    pub value: FieldValue,
}

/// What the rendering layer needs to draw the current step.
#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub session_id: Uuid,
    pub step: usize,
    pub total_steps: usize,
    pub is_first: bool,
    pub is_final: bool,
    pub title: String,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone)]
pub struct FormSession {
    id: Uuid,
    stepper: Stepper,
    answers: AnswerStore,
    last_seen: Instant,
}

impl FormSession {
    pub fn new(id: Uuid, catalog: Arc<StepCatalog>) -> Self {
        Self {
            id,
            stepper: Stepper::new(catalog.len()),
            answers: AnswerStore::new(catalog),
            last_seen: Instant::now(),
        }
    }

    fn is_idle(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.last_seen) >= ttl
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stepper(&self) -> &Stepper {
        &self.stepper
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn view(&self) -> StepView {
        let ordinal = self.stepper.current();
        let (title, fields) = match self.answers.catalog().step(ordinal) {
            Some(step) => (
                step.title.clone(),
                step.fields
                    .iter()
                    .map(|decl| FieldView {
                        decl: decl.clone(),
                        value: self
                            .answers
                            .get(&decl.id)
                            .cloned()
                            .unwrap_or_else(|_| decl.default_value()),
                    })
                    .collect(),
            ),
            None => (String::new(), Vec::new()),
        };

        StepView {
            session_id: self.id,
            step: ordinal,
            total_steps: self.stepper.total(),
            is_first: self.stepper.is_first(),
            is_final: self.stepper.is_final(),
            title,
            fields,
        }
    }

    /// Writes an answer. Only fields owned by the current step are writable.
    pub fn answer(&mut self, field_id: &str, value: FieldValue) -> Result<(), FormError> {
        let (_, owner) = self
            .answers
            .catalog()
            .field(field_id)
            .ok_or_else(|| FormError::UnknownField(field_id.to_string()))?;
        let current = self.stepper.current();
        if owner != current {
            return Err(FormError::FieldNotOnStep {
                field: field_id.to_string(),
                owner,
                current,
            });
        }
        self.answers.set(field_id, value)
    }

    pub fn back(&mut self) -> usize {
        self.stepper.back()
    }

    /// Moves forward once the current step's minimum selections are met.
    pub fn advance(&mut self) -> Result<usize, FormError> {
        self.answers.check_step(self.stepper.current())?;
        Ok(self.stepper.next())
    }

    /// Assembles the submission payload from this session's answers.
    ///
    /// Order matters: the final-step guard, then identity, then every step's
    /// minimum selections. All of this runs before any external call.
    pub fn prepare_submission(&self) -> Result<SubmissionPayload, FormError> {
        if !self.stepper.is_final() {
            return Err(FormError::NotOnFinalStep {
                current: self.stepper.current(),
            });
        }
        let identity = Identity::from_answers(&self.answers.snapshot());
        let payload = assemble(&self.answers, &identity)?;
        self.answers.check_all_steps()?;
        Ok(payload)
    }
}

/// Registry of live sessions keyed by session id.
///
/// A session untouched for `idle_ttl` is gone: lookups treat it as missing and
/// `expire_idle` drops it from the map.
#[derive(Clone)]
pub struct SessionStore {
    catalog: Arc<StepCatalog>,
    sessions: Arc<RwLock<HashMap<Uuid, FormSession>>>,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(catalog: Arc<StepCatalog>, idle_ttl: Duration) -> Self {
        Self {
            catalog,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    pub fn catalog(&self) -> &Arc<StepCatalog> {
        &self.catalog
    }

    /// Starts a new, empty session.
    pub async fn create(&self) -> FormSession {
        let session = FormSession::new(Uuid::new_v4(), self.catalog.clone());
        self.sessions
            .write()
            .await
            .insert(session.id(), session.clone());
        debug!(session_id = %session.id(), "Session created");
        session
    }

    /// Returns a copy of the session and marks it as seen.
    pub async fn get(&self, id: Uuid) -> Result<FormSession, FormError> {
        self.update(id, |s| Ok(s.clone())).await
    }

    /// Applies `f` to the session in place and returns its result.
    pub async fn update<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut FormSession) -> Result<T, FormError>,
    ) -> Result<T, FormError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let expired = match sessions.get(&id) {
            Some(s) => s.is_idle(now, self.idle_ttl),
            None => return Err(FormError::SessionNotFound(id)),
        };
        if expired {
            sessions.remove(&id);
            debug!(session_id = %id, "Session expired");
            return Err(FormError::SessionNotFound(id));
        }
        let session = sessions.get_mut(&id).ok_or(FormError::SessionNotFound(id))?;
        session.last_seen = now;
        f(session)
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), FormError> {
        if self.sessions.write().await.remove(&id).is_none() {
            return Err(FormError::SessionNotFound(id));
        }
        debug!(session_id = %id, "Session discarded");
        Ok(())
    }

    /// Drops every session idle for at least the TTL. Returns how many were dropped.
    pub async fn expire_idle(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_idle(now, self.idle_ttl));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Spawn a background task that periodically drops idle sessions.
pub fn spawn_expiry_task(store: SessionStore, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        loop {
            tick.tick().await;
            let expired = store.expire_idle().await;
            if expired > 0 {
                info!(expired, "Expired idle sessions");
            }
        }
    })
}
