//! crates/commodities_core/src/guard.rs
//!
//! Route protection. `decide` is the pure render-or-redirect function; `RouteGuard`
//! re-runs it against an `AuthGate` whenever the inputs it depends on change.

use crate::auth::AuthGate;
use crate::domain::Role;
use crate::ports::KeyValueStorage;
use url::form_urlencoded;

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Hydration is still running; make no decision yet.
    Wait,
    /// Not signed in. `return_to` is the path to come back to after login.
    RedirectLogin { return_to: String },
    /// Signed in, but the role is not one the route allows.
    RedirectUnauthorized,
    Render,
}

impl GuardOutcome {
    /// Where the outcome sends the user, if anywhere.
    pub fn redirect_target(&self) -> Option<String> {
        match self {
            GuardOutcome::RedirectLogin { return_to } => Some(login_redirect_path(return_to)),
            GuardOutcome::RedirectUnauthorized => Some(UNAUTHORIZED_PATH.to_string()),
            GuardOutcome::Wait | GuardOutcome::Render => None,
        }
    }
}

/// `/login?redirect=<path>`, with the path form-encoded.
pub fn login_redirect_path(return_to: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("redirect", return_to)
        .finish();
    format!("{LOGIN_PATH}?{query}")
}

/// An empty `required_roles` admits every authenticated user.
pub fn decide(
    is_loading: bool,
    is_authenticated: bool,
    user_role: Option<Role>,
    required_roles: &[Role],
    requested_path: &str,
) -> GuardOutcome {
    if is_loading {
        return GuardOutcome::Wait;
    }
    if !is_authenticated {
        return GuardOutcome::RedirectLogin {
            return_to: requested_path.to_string(),
        };
    }
    if !required_roles.is_empty() && !user_role.is_some_and(|r| required_roles.contains(&r)) {
        return GuardOutcome::RedirectUnauthorized;
    }
    GuardOutcome::Render
}

type Observed = (bool, bool, Option<Role>);

/// Guards one route. Keeps the inputs it last saw so callers can poll it after
/// every state change and only act when the outcome may have moved.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    required_roles: Vec<Role>,
    requested_path: String,
    last_seen: Option<Observed>,
}

impl RouteGuard {
    pub fn new(requested_path: impl Into<String>, required_roles: &[Role]) -> Self {
        Self {
            required_roles: required_roles.to_vec(),
            requested_path: requested_path.into(),
            last_seen: None,
        }
    }

    pub fn requested_path(&self) -> &str {
        &self.requested_path
    }

    /// Evaluates against the gate's current state.
    pub fn evaluate<S: KeyValueStorage>(&self, gate: &AuthGate<S>) -> GuardOutcome {
        decide(
            gate.is_loading(),
            gate.is_authenticated(),
            gate.user().map(|u| u.role),
            &self.required_roles,
            &self.requested_path,
        )
    }

    /// Returns a fresh outcome the first time and whenever loading, authentication
    /// or role changed since the previous poll; `None` otherwise.
    pub fn poll<S: KeyValueStorage>(&mut self, gate: &AuthGate<S>) -> Option<GuardOutcome> {
        let observed = (
            gate.is_loading(),
            gate.is_authenticated(),
            gate.user().map(|u| u.role),
        );
        if self.last_seen == Some(observed) {
            return None;
        }
        self.last_seen = Some(observed);
        Some(self.evaluate(gate))
    }
}
