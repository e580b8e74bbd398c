//! Process-wide authentication state.
//!
//! The store is created once per front end and shared (it is cheap to wrap in
//! an `Arc`). It is only mutated through [`SessionStore::login`],
//! [`SessionStore::register`], [`SessionStore::logout`] and
//! [`SessionStore::check_auth`]; everything else reads snapshots or subscribes
//! to changes.

use chrono::Utc;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use shared::domain::User;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{error::ClientResult, http::ApiClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing has been checked yet.
    Uninitialized,
    /// A persisted token is being validated against the server.
    Checking,
    Authenticated,
    Unauthenticated,
}

/// Snapshot of the session.
///
/// `user` and `token` are either both set (authenticated) or both empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    user: Option<User>,
    token: Option<String>,
    phase: SessionPhase,
}

impl Session {
    fn uninitialized() -> Self {
        Self {
            user: None,
            token: None,
            phase: SessionPhase::Uninitialized,
        }
    }

    fn checking() -> Self {
        Self {
            user: None,
            token: None,
            phase: SessionPhase::Checking,
        }
    }

    fn authenticated(user: User, token: String) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
            phase: SessionPhase::Authenticated,
        }
    }

    fn unauthenticated() -> Self {
        Self {
            user: None,
            token: None,
            phase: SessionPhase::Unauthenticated,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::Uninitialized | SessionPhase::Checking
        )
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::uninitialized()
    }
}

pub struct SessionStore {
    api: ApiClient,
    state: watch::Sender<Session>,
}

impl SessionStore {
    pub fn new(api: ApiClient) -> Self {
        let (state, _) = watch::channel(Session::uninitialized());
        Self { api, state }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Waits until the session is no longer loading.
    ///
    /// Only resolves once something settles the session, normally
    /// [`SessionStore::check_auth`].
    pub async fn wait_until_resolved(&self) -> Session {
        let mut rx = self.state.subscribe();
        let resolved = match rx.wait_for(|session| !session.is_loading()).await {
            Ok(session) => session.clone(),
            Err(_) => self.snapshot(),
        };
        resolved
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<User> {
        let token = self.api.login(email, password).await?;
        self.api.token_store().save(&token.access_token)?;

        let user = self.api.current_user().await?;
        self.state
            .send_replace(Session::authenticated(user.clone(), token.access_token));
        info!("session: login ok user={}", user.id);
        Ok(user)
    }

    /// Creates the account, then logs in with the same credentials.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> ClientResult<User> {
        self.api.register(email, password, full_name).await?;
        self.login(email, password).await
    }

    pub fn logout(&self) {
        self.discard_persisted_token();
        self.state.send_replace(Session::unauthenticated());
        info!("session: logged out");
    }

    /// Restores the session from the persisted token.
    ///
    /// Never fails: an unreadable store, an expired token or a rejected token
    /// all leave the session unauthenticated, clearing the token where one was
    /// found.
    pub async fn check_auth(&self) -> Session {
        let token = match self.api.token_store().load() {
            Ok(token) => token,
            Err(err) => {
                warn!("session: token store unreadable, treating as signed out: {err}");
                None
            }
        };

        let Some(token) = token else {
            self.state.send_replace(Session::unauthenticated());
            return self.snapshot();
        };

        if token_is_expired(&token, Utc::now().timestamp()) {
            info!("session: persisted token expired");
            self.discard_persisted_token();
            self.state.send_replace(Session::unauthenticated());
            return self.snapshot();
        }

        self.state.send_replace(Session::checking());
        match self.api.current_user().await {
            Ok(user) => {
                info!("session: restored user={}", user.id);
                self.state.send_replace(Session::authenticated(user, token));
            }
            Err(err) => {
                debug!("session: persisted token rejected: {err}");
                self.discard_persisted_token();
                self.state.send_replace(Session::unauthenticated());
            }
        }
        self.snapshot()
    }

    fn discard_persisted_token(&self) {
        if let Err(err) = self.api.token_store().clear() {
            warn!("session: failed to clear persisted token: {err}");
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    #[serde(default)]
    exp: Option<i64>,
}

/// Reads the `exp` claim of a JWT without verifying its signature.
///
/// Returns `None` for tokens that are not JWTs or carry no expiry; those are
/// left for the server to judge.
pub(crate) fn token_expiry(token: &str) -> Option<i64> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()?
        .claims
        .exp
}

pub(crate) fn token_is_expired(token: &str, now: i64) -> bool {
    token_expiry(token).is_some_and(|exp| exp <= now)
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
