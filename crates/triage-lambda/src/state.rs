use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jiff::tz::TimeZone;
use tokio::sync::{Mutex, OwnedMutexGuard, watch};
use tracing::debug;
use uuid::Uuid;

use triage_auth::cognito::CognitoIdentity;
use triage_auth::identity::{IdentityProvider, LayeredIdentity};
use triage_auth::jwt::TokenVerifier;
use triage_bedrock::generator::TextGenerator;
use triage_core::models::note::StoredNote;
use triage_dialogue::policy::SufficiencyPolicy;
use triage_dialogue::session::TriageSession;
use triage_dialogue::submission::NoteSubmitter;

use crate::error::ApiError;

pub type SessionHandle = Arc<Mutex<TriageSession>>;

/// How long a session may go untouched before it is dropped.
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

struct SessionSlot {
    handle: SessionHandle,
    touched: Instant,
}

/// Sessions by id. Idle sessions, finished or not, are evicted whenever the
/// map is consulted; a session mid-call is never evicted.
#[derive(Clone, Default)]
pub struct SessionMap {
    slots: Arc<Mutex<HashMap<Uuid, SessionSlot>>>,
}

impl SessionMap {
    async fn insert(&self, id: Uuid, handle: SessionHandle, idle: Duration) {
        let mut slots = self.slots.lock().await;
        evict_idle(&mut slots, idle);
        slots.insert(
            id,
            SessionSlot {
                handle,
                touched: Instant::now(),
            },
        );
    }

    async fn touch(&self, id: Uuid, idle: Duration) -> Option<SessionHandle> {
        let mut slots = self.slots.lock().await;
        evict_idle(&mut slots, idle);
        let slot = slots.get_mut(&id)?;
        slot.touched = Instant::now();
        Some(Arc::clone(&slot.handle))
    }

    async fn remove(&self, id: Uuid) -> bool {
        self.slots.lock().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn evict_idle(slots: &mut HashMap<Uuid, SessionSlot>, idle: Duration) {
    slots.retain(|id, slot| {
        // A held lock means a request is still using the session.
        let keep = slot.touched.elapsed() < idle || slot.handle.try_lock().is_err();
        if !keep {
            debug!(session_id = %id, "evicting idle session");
        }
        keep
    });
}

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn TextGenerator>,
    pub policy: SufficiencyPolicy,
    pub submitter: NoteSubmitter,
    pub service_identity: Arc<dyn IdentityProvider>,
    pub cognito: Option<Arc<CognitoIdentity>>,
    pub verifier: Option<Arc<TokenVerifier>>,
    pub sessions: SessionMap,
    pub session_idle: Duration,
    /// Latest note set delivered by the store subscription, newest first.
    pub notes: Arc<watch::Sender<Vec<StoredNote>>>,
    pub display_tz: TimeZone,
}

impl AppState {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        policy: SufficiencyPolicy,
        submitter: NoteSubmitter,
        service_identity: Arc<dyn IdentityProvider>,
        display_tz: TimeZone,
    ) -> Self {
        Self {
            generator,
            policy,
            submitter,
            service_identity,
            cognito: None,
            verifier: None,
            sessions: SessionMap::default(),
            session_idle: DEFAULT_SESSION_IDLE,
            notes: Arc::new(watch::Sender::new(Vec::new())),
            display_tz,
        }
    }

    /// Replace the published note set. Sets are applied in call order.
    pub fn publish_notes(&self, latest: Vec<StoredNote>) {
        self.notes.send_replace(latest);
    }

    /// A subscription callback that publishes every delivered set.
    pub fn note_feed(&self) -> impl FnMut(Vec<StoredNote>) + Send + 'static {
        let notes = Arc::clone(&self.notes);
        move |latest| {
            notes.send_replace(latest);
        }
    }

    /// Open a session whose note is attributed to `caller_sub` when given,
    /// otherwise to the service identity.
    pub async fn open_session(&self, caller_sub: Option<String>) -> SessionHandle {
        let identity = LayeredIdentity::new(caller_sub, Arc::clone(&self.service_identity));
        let session = TriageSession::new(self.policy, Arc::clone(&self.generator))
            .with_submitter(self.submitter.with_identity(Arc::new(identity)));

        let id = session.id();
        let handle = Arc::new(Mutex::new(session));
        self.sessions
            .insert(id, Arc::clone(&handle), self.session_idle)
            .await;
        handle
    }

    /// Lock a session for one request. A session still serving another
    /// request is reported as a conflict rather than waited on.
    pub async fn lock_session(&self, id: Uuid) -> Result<OwnedMutexGuard<TriageSession>, ApiError> {
        let handle = self
            .sessions
            .touch(id, self.session_idle)
            .await
            .ok_or_else(|| ApiError::NotFound(format!("session not found: {id}")))?;

        handle
            .try_lock_owned()
            .map_err(|_| ApiError::Conflict("session is busy".to_string()))
    }

    pub async fn remove_session(&self, id: Uuid) -> Result<(), ApiError> {
        if self.sessions.remove(id).await {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("session not found: {id}")))
        }
    }
}
