use serde_json::Value;
use shared::{
    domain::{DecisionCategory, DecisionContext},
    error::ApiError,
    protocol::DecisionCreate,
};
use tracing::warn;

use super::Navigation;
use crate::http::ApiClient;

/// Marker stored in the decision context to record where it was created.
pub const CREATED_VIA: &str = "cli";

#[derive(Debug, Clone)]
pub struct DecisionForm {
    pub title: String,
    pub description: String,
    pub category: DecisionCategory,
    pub current_situation: String,
    pub goals: String,
    pub constraints: String,
    pub timeline: String,
    is_submitting: bool,
    error: Option<ApiError>,
}

impl Default for DecisionForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: DecisionCategory::Career,
            current_situation: String::new(),
            goals: String::new(),
            constraints: String::new(),
            timeline: String::new(),
            is_submitting: false,
            error: None,
        }
    }
}

impl DecisionForm {
    pub fn new(title: impl Into<String>, category: DecisionCategory) -> Self {
        Self {
            title: title.into(),
            category,
            ..Self::default()
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|error| error.message.as_str())
    }

    /// The error line with the code of the failure behind it.
    pub fn failure(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    pub fn to_request(&self) -> DecisionCreate {
        let mut context = DecisionContext::new();
        for (key, value) in [
            ("current_situation", &self.current_situation),
            ("goals", &self.goals),
            ("constraints", &self.constraints),
            ("timeline", &self.timeline),
        ] {
            context.insert(key.to_string(), Value::String(value.clone()));
        }
        context.insert("created_via".to_string(), Value::String(CREATED_VIA.into()));

        DecisionCreate {
            title: self.title.clone(),
            description: Some(self.description.clone()),
            category: self.category,
            context: Some(context),
        }
    }

    /// Submits the form and returns the new decision's page on success.
    pub async fn submit(&mut self, api: &ApiClient) -> Option<Navigation> {
        self.is_submitting = true;
        self.error = None;

        let outcome = api.create_decision(&self.to_request()).await;
        self.is_submitting = false;
        match outcome {
            Ok(decision) => Some(Navigation::Decision(decision.id)),
            Err(err) => {
                warn!("form: failed to create decision: {err}");
                self.error = Some(err.to_view_error("Failed to create decision"));
                None
            }
        }
    }
}
