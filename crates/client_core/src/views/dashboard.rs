use shared::{
    domain::{Decision, DecisionStatus},
    error::ApiError,
    protocol::ListDecisionsQuery,
};
use tracing::warn;

use super::{revalidate_session, Navigation};
use crate::{http::ApiClient, session::SessionStore};

/// The dashboard: every decision of the signed-in user.
#[derive(Debug, Clone)]
pub struct DecisionListView {
    decisions: Vec<Decision>,
    is_loading: bool,
    error: Option<ApiError>,
}

impl Default for DecisionListView {
    fn default() -> Self {
        Self {
            decisions: Vec::new(),
            is_loading: true,
            error: None,
        }
    }
}

impl DecisionListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|error| error.message.as_str())
    }

    /// The error line with the code of the failure behind it.
    pub fn failure(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        !self.is_loading && self.decisions.is_empty()
    }

    pub fn count_with_status(&self, status: DecisionStatus) -> usize {
        self.decisions
            .iter()
            .filter(|decision| decision.status == status)
            .count()
    }

    /// Revalidates the session, then loads the list.
    ///
    /// Returns `Some(Navigation::Login)` without fetching anything when the user
    /// is not signed in.
    pub async fn mount(&mut self, session: &SessionStore) -> Option<Navigation> {
        let current = revalidate_session(session).await;
        if !current.is_authenticated() {
            self.is_loading = false;
            return Some(Navigation::Login);
        }
        self.refresh(session.api()).await;
        None
    }

    pub async fn refresh(&mut self, api: &ApiClient) {
        self.is_loading = true;
        self.error = None;
        match api.list_decisions(&ListDecisionsQuery::default()).await {
            Ok(decisions) => self.decisions = decisions,
            Err(err) => {
                warn!("dashboard: failed to load decisions: {err}");
                self.error = Some(err.to_view_error("Failed to load decisions"));
            }
        }
        self.is_loading = false;
    }

    pub fn open(&self, index: usize) -> Option<Navigation> {
        self.decisions
            .get(index)
            .map(|decision| Navigation::Decision(decision.id))
    }
}
