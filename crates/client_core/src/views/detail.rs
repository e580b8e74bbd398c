use shared::{
    domain::{Decision, DecisionId, Scenario},
    error::ApiError,
    protocol::SimulationParams,
};
use tracing::warn;

use crate::http::ApiClient;

/// One decision with its scenarios, plus the "generate scenarios" action.
#[derive(Debug, Clone)]
pub struct DecisionDetailView {
    decision_id: DecisionId,
    decision: Option<Decision>,
    scenarios: Vec<Scenario>,
    selected: usize,
    is_loading: bool,
    is_simulating: bool,
    error: Option<ApiError>,
}

impl DecisionDetailView {
    pub fn new(decision_id: DecisionId) -> Self {
        Self {
            decision_id,
            decision: None,
            scenarios: Vec::new(),
            selected: 0,
            is_loading: true,
            is_simulating: false,
            error: None,
        }
    }

    pub fn decision_id(&self) -> DecisionId {
        self.decision_id
    }

    pub fn decision(&self) -> Option<&Decision> {
        self.decision.as_ref()
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_simulating(&self) -> bool {
        self.is_simulating
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|error| error.message.as_str())
    }

    /// The error line with the code of the failure behind it.
    pub fn failure(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    /// Scenarios are only generated for decisions that have none yet.
    pub fn can_simulate(&self) -> bool {
        self.decision.is_some() && self.scenarios.is_empty() && !self.is_simulating
    }

    pub fn current_scenario(&self) -> Option<&Scenario> {
        self.scenarios.get(self.selected)
    }

    /// Selects a scenario tab; out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.scenarios.len() {
            self.selected = index;
            true
        } else {
            false
        }
    }

    /// `("Year N", amount)` points for the selected scenario.
    pub fn financial_series(&self) -> Vec<(String, f64)> {
        self.current_scenario()
            .and_then(Scenario::outcomes)
            .map(|outcomes| outcomes.financial_series())
            .unwrap_or_default()
    }

    pub async fn load(&mut self, api: &ApiClient) {
        self.is_loading = true;
        self.error = None;
        match api.get_decision(self.decision_id).await {
            Ok(data) => {
                self.decision = Some(data.decision);
                self.scenarios = data.scenarios;
                if self.selected >= self.scenarios.len() {
                    self.selected = 0;
                }
            }
            Err(err) => {
                warn!("detail: failed to load decision id={}: {err}", self.decision_id);
                self.error = Some(ApiError::new(err.code(), "Failed to load decision"));
            }
        }
        self.is_loading = false;
    }

    /// Generates scenarios with the default parameters.
    pub async fn simulate(&mut self, api: &ApiClient) {
        self.simulate_with(api, SimulationParams::default()).await;
    }

    pub async fn simulate_with(&mut self, api: &ApiClient, params: SimulationParams) {
        self.is_simulating = true;
        self.error = None;
        match api.simulate(self.decision_id, params).await {
            Ok(data) => {
                self.decision = Some(data.decision);
                self.scenarios = data.scenarios;
                self.selected = 0;
            }
            Err(err) => {
                warn!(
                    "detail: simulation failed id={}: {err}",
                    self.decision_id
                );
                self.error = Some(err.to_view_error("Failed to generate scenarios"));
            }
        }
        self.is_simulating = false;
    }
}
