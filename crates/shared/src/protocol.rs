use serde::{Deserialize, Serialize};

use crate::domain::{
    Decision, DecisionCategory, DecisionContext, DecisionId, DecisionStatus, Scenario,
};

pub const API_PREFIX: &str = "/api/v1";
pub const DEFAULT_NUM_SCENARIOS: u8 = 3;
pub const DEFAULT_TIME_HORIZON_YEARS: u8 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// OAuth2 password-grant form; the server expects the email under `username`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
}

fn bearer() -> String {
    "bearer".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionCreate {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: DecisionCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<DecisionContext>,
}

/// Partial update; only fields that are set are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<DecisionCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<DecisionContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DecisionStatus>,
}

impl DecisionUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.context.is_none()
            && self.status.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListDecisionsQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionWithScenarios {
    pub decision: Decision,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationParams {
    pub num_scenarios: u8,
    pub time_horizon_years: u8,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            num_scenarios: DEFAULT_NUM_SCENARIOS,
            time_horizon_years: DEFAULT_TIME_HORIZON_YEARS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub decision_id: DecisionId,
    pub num_scenarios: u8,
    pub time_horizon_years: u8,
}

impl SimulationRequest {
    pub fn new(decision_id: DecisionId, params: SimulationParams) -> Self {
        Self {
            decision_id,
            num_scenarios: params.num_scenarios,
            time_horizon_years: params.time_horizon_years,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

pub fn auth_route(action: &str) -> String {
    format!("{API_PREFIX}/auth/{action}")
}

pub fn decisions_route() -> String {
    format!("{API_PREFIX}/decisions")
}

pub fn decision_route(decision_id: DecisionId) -> String {
    format!("{API_PREFIX}/decisions/{decision_id}")
}

pub fn simulate_route(decision_id: DecisionId) -> String {
    format!("{API_PREFIX}/decisions/{decision_id}/simulate")
}
