//! Front-end-agnostic page state.
//!
//! Each view owns the state one page of the product shows (data, spinner flags,
//! the error line) and exposes the actions that page offers. Actions return a
//! [`Navigation`] when the page would move the user elsewhere.

mod auth;
mod dashboard;
mod detail;
mod form;

pub use auth::{SignInForm, SignUpForm};
pub use dashboard::DecisionListView;
pub use detail::DecisionDetailView;
pub use form::{DecisionForm, CREATED_VIA};

use shared::domain::DecisionId;

use crate::session::{Session, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Landing,
    Login,
    Dashboard,
    NewDecision,
    Decision(DecisionId),
}

/// Where the landing page sends the user once the session is known.
pub async fn landing_destination(session: &SessionStore) -> Navigation {
    let current = revalidate_session(session).await;
    if current.is_authenticated() {
        Navigation::Dashboard
    } else {
        Navigation::Landing
    }
}

/// Revalidates the persisted token, then waits until no other check is in
/// flight. Runs on every page mount, so a token saved or revoked since the last
/// check is picked up.
pub(crate) async fn revalidate_session(session: &SessionStore) -> Session {
    session.check_auth().await;
    session.wait_until_resolved().await
}

#[cfg(test)]
#[path = "../tests/views_tests.rs"]
mod tests;
