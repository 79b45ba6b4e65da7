//! The session store: who is logged in, persisted across restarts.
//!
//! A store starts `Pending` and becomes ready exactly once, when the persisted
//! session has been read back (or found missing). From then on it flips
//! between authenticated and anonymous through `login` / `logout`.
//!
//! Storage is best-effort. Read failures and corrupt entries degrade to an
//! anonymous session; write failures are logged and the in-memory session
//! stays authoritative for the rest of the process.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::models::{Identity, LoginResponse};
use crate::storage::DurableStorage;

/// Storage key holding the raw bearer token.
pub const TOKEN_KEY: &str = "flavorai_token";

/// Storage key holding the JSON-encoded `Identity`.
pub const USER_KEY: &str = "flavorai_user";

/// An authenticated session: the credential and whom it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub identity: Identity,
}

impl Session {
    pub fn new(token: impl Into<String>, identity: Identity) -> Self {
        Self {
            token: token.into(),
            identity,
        }
    }
}

impl From<LoginResponse> for Session {
    fn from(response: LoginResponse) -> Self {
        Self::new(response.access_token, response.user)
    }
}

/// What the rest of the application sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus<'a> {
    /// Persisted state has not been read yet. Session-dependent UI should wait.
    Pending,
    Authenticated(&'a Session),
    Anonymous,
}

#[derive(Debug)]
enum State {
    Pending,
    Ready(Option<Session>),
}

pub struct SessionStore {
    storage: Arc<dyn DurableStorage>,
    state: State,
}

impl SessionStore {
    /// Create a store in the `Pending` state. Call `initialize` (or
    /// `restore` + `apply_restored`) before relying on the session.
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        Self {
            storage,
            state: State::Pending,
        }
    }

    pub fn storage(&self) -> Arc<dyn DurableStorage> {
        Arc::clone(&self.storage)
    }

    /// Read the persisted session and become ready.
    pub async fn initialize(&mut self) {
        let restored = Self::restore(self.storage()).await;
        self.apply_restored(restored);
    }

    /// Read the persisted session off the async runtime's worker threads.
    /// Never fails: anything unexpected reads as "no session".
    pub async fn restore(storage: Arc<dyn DurableStorage>) -> Option<Session> {
        match tokio::task::spawn_blocking(move || Self::read_persisted(storage.as_ref())).await {
            Ok(restored) => restored,
            Err(e) => {
                warn!(error = %e, "Session restore task failed");
                None
            }
        }
    }

    /// Synchronous part of `restore`. Both entries must be present and the
    /// identity must parse, otherwise the result is `None`.
    pub fn read_persisted(storage: &dyn DurableStorage) -> Option<Session> {
        let token = match storage.get_item(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, storage = %storage.describe(), "Failed to read stored token");
                return None;
            }
        };
        let user = match storage.get_item(USER_KEY) {
            Ok(user) => user.filter(|u| !u.is_empty()),
            Err(e) => {
                warn!(error = %e, storage = %storage.describe(), "Failed to read stored identity");
                return None;
            }
        };

        let (token, user) = match (token, user) {
            (Some(token), Some(user)) => (token, user),
            (None, None) => {
                debug!("No stored session");
                return None;
            }
            (token, user) => {
                warn!(
                    has_token = token.is_some(),
                    has_identity = user.is_some(),
                    "Ignoring incomplete stored session"
                );
                return None;
            }
        };

        match serde_json::from_str::<Identity>(&user) {
            Ok(identity) => {
                debug!(user_id = identity.id, "Stored session found");
                Some(Session::new(token, identity))
            }
            Err(e) => {
                warn!(error = %e, "Stored identity is not valid, starting anonymous");
                None
            }
        }
    }

    /// Finish initialization with the result of `restore`.
    ///
    /// Only the first call while `Pending` has an effect. If the user logged in
    /// or out while the read was in flight, that newer state wins. Returns
    /// whether the restored value was applied.
    pub fn apply_restored(&mut self, restored: Option<Session>) -> bool {
        match self.state {
            State::Pending => {
                info!(authenticated = restored.is_some(), "Session initialized");
                self.state = State::Ready(restored);
                true
            }
            State::Ready(_) => {
                debug!("Session already initialized, ignoring restored value");
                false
            }
        }
    }

    /// Replace the session and persist it.
    pub fn login(&mut self, token: impl Into<String>, identity: Identity) {
        let session = Session::new(token, identity);
        info!(user_id = session.identity.id, "Logged in");
        self.persist(&session);
        self.state = State::Ready(Some(session));
    }

    /// `login` from a `POST /auth/login` response.
    pub fn login_with(&mut self, response: LoginResponse) {
        self.login(response.access_token, response.user);
    }

    /// Clear the session and its persisted copy. Safe to call when anonymous.
    pub fn logout(&mut self) {
        if let State::Ready(Some(ref session)) = self.state {
            info!(user_id = session.identity.id, "Logged out");
        }
        self.state = State::Ready(None);
        self.clear_persisted();
    }

    pub fn status(&self) -> SessionStatus<'_> {
        match &self.state {
            State::Pending => SessionStatus::Pending,
            State::Ready(Some(session)) => SessionStatus::Authenticated(session),
            State::Ready(None) => SessionStatus::Anonymous,
        }
    }

    /// The current session, if any. `None` both while pending and when anonymous.
    pub fn current_session(&self) -> Option<&Session> {
        match &self.state {
            State::Ready(Some(session)) => Some(session),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.current_session().map(|s| s.token.as_str())
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.current_session().map(|s| &s.identity)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_session().is_some()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    fn persist(&self, session: &Session) {
        let user = match serde_json::to_string(&session.identity) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Failed to encode identity, session not persisted");
                return;
            }
        };

        let written = self
            .storage
            .set_item(TOKEN_KEY, &session.token)
            .and_then(|()| self.storage.set_item(USER_KEY, &user));

        if let Err(e) = written {
            warn!(error = %e, storage = %self.storage.describe(), "Failed to persist session");
            // Never leave one entry without the other.
            self.clear_persisted();
        }
    }

    fn clear_persisted(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove_item(key) {
                warn!(error = %e, key, storage = %self.storage.describe(), "Failed to remove stored session entry");
            }
        }
    }
}
