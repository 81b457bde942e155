//! crates/commodities_core/src/auth.rs
//!
//! The auth gate: in-memory authentication state hydrated once from durable
//! storage, with login/logout mutators that mirror changes back to it.

use crate::domain::{Role, Session, User};
use crate::ports::KeyValueStorage;
use crate::session::SessionStore;
use tracing::{debug, info, warn};

/// Lifecycle of the gate. Moves from `Hydrating` to `Settled` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Hydrating,
    Settled,
}

/// A point-in-time copy of the gate's state, handed to whoever renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub is_loading: bool,
    pub access_token: Option<String>,
    pub user: Option<User>,
}

impl AuthSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.user.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }
}

pub struct AuthGate<S> {
    store: SessionStore<S>,
    phase: Phase,
    access_token: Option<String>,
    user: Option<User>,
}

impl<S: KeyValueStorage> AuthGate<S> {
    /// Creates a gate in the `Hydrating` phase. Nothing is read until `initialize`.
    pub fn new(storage: S) -> Self {
        Self {
            store: SessionStore::new(storage),
            phase: Phase::Hydrating,
            access_token: None,
            user: None,
        }
    }

    /// Reads the persisted session, if any, and settles the gate.
    ///
    /// Unreadable or corrupt storage leaves the gate logged out. Calls after the
    /// gate has settled do nothing.
    pub fn initialize(&mut self) {
        if self.phase == Phase::Settled {
            debug!("Auth gate already settled; skipping hydration.");
            return;
        }
        match self.store.load() {
            Some(Session { access_token, user }) => {
                info!("Restored session for {} ({}).", user.email, user.role);
                self.access_token = Some(access_token);
                self.user = Some(user);
            }
            None => {
                info!("No stored session; starting anonymous.");
                self.access_token = None;
                self.user = None;
            }
        }
        self.phase = Phase::Settled;
    }

    /// Records a session that was already established elsewhere.
    ///
    /// A storage failure is logged and the session is kept in memory only.
    pub fn login(&mut self, access_token: impl Into<String>, user: User) {
        let session = Session {
            access_token: access_token.into(),
            user,
        };
        if let Err(e) = self.store.save(&session) {
            warn!("Session for {} kept in memory only: {}", session.user.email, e);
        }
        info!("Signed in as {} ({}).", session.user.email, session.user.role);
        self.access_token = Some(session.access_token);
        self.user = Some(session.user);
        self.phase = Phase::Settled;
    }

    /// Forgets the session in memory and in storage. Idempotent.
    pub fn logout(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!("Could not clear stored session: {}", e);
        }
        if let Some(user) = self.user.take() {
            info!("Signed out {}.", user.email);
        }
        self.access_token = None;
        self.phase = Phase::Settled;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Hydrating
    }

    /// True only when both the token and the user are present.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.user.is_some()
    }

    /// Exact role match; there is no hierarchy between roles.
    pub fn has_role(&self, role: Role) -> bool {
        self.user.as_ref().is_some_and(|u| u.role == role)
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        AuthSnapshot {
            is_loading: self.is_loading(),
            access_token: self.access_token.clone(),
            user: self.user.clone(),
        }
    }
}
