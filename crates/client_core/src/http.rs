use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Decision, DecisionId, User},
    error::{ErrorBody, ErrorCode},
    protocol::{
        auth_route, decision_route, decisions_route, simulate_route, DecisionCreate,
        DecisionUpdate, DecisionWithScenarios, HealthResponse, ListDecisionsQuery, LoginForm,
        RegisterRequest, SimulationParams, SimulationRequest, TokenResponse,
    },
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::{normalize_api_url, ClientSettings},
    error::{ClientError, ClientResult},
    token_store::TokenStore,
};

/// Thin adapter over the decisions API.
///
/// Every request reads the token store and, when a token is present, sends it
/// as `Authorization: Bearer <token>`. Non-2xx responses become
/// [`ClientError::Api`] carrying the server's `detail`.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenStore>) -> ClientResult<Self> {
        Self::with_http_client(base_url, tokens, Client::new())
    }

    pub fn from_settings(
        settings: &ClientSettings,
        tokens: Arc<dyn TokenStore>,
    ) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Self::with_http_client(&settings.api_url, tokens, http)
    }

    pub fn with_http_client(
        base_url: &str,
        tokens: Arc<dyn TokenStore>,
        http: Client,
    ) -> ClientResult<Self> {
        let base_url = normalize_api_url(base_url);
        let parsed = Url::parse(&base_url)?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "api url '{base_url}' cannot be used as a base url"
            )));
        }
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(Url::parse(&format!("{}{path}", self.base_url))?)
    }

    fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let url = self.endpoint(path)?;
        let mut builder = self.http.request(method, url);
        match self.tokens.load() {
            Ok(Some(token)) => builder = builder.bearer_auth(token),
            Ok(None) => {}
            Err(err) => warn!("http: token store unreadable, sending without credentials: {err}"),
        }
        Ok(builder)
    }

    async fn send(&self, builder: RequestBuilder) -> ClientResult<Response> {
        let response = builder.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(error_from_response(response).await)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        Ok(self.send(builder).await?.json().await?)
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> ClientResult<User> {
        let body = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.map(str::to_string),
        };
        let builder = self
            .request(Method::POST, &auth_route("register"))?
            .json(&body);
        let user: User = self.send_json(builder).await?;
        info!("http: registered user={}", user.id);
        Ok(user)
    }

    /// Exchanges credentials for a token. The token is returned, not stored.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<TokenResponse> {
        let form = LoginForm {
            username: email.to_string(),
            password: password.to_string(),
        };
        let builder = self.request(Method::POST, &auth_route("login"))?.form(&form);
        self.send_json(builder).await
    }

    pub async fn current_user(&self) -> ClientResult<User> {
        let builder = self.request(Method::GET, &auth_route("me"))?;
        self.send_json(builder).await
    }

    pub async fn health(&self) -> ClientResult<HealthResponse> {
        let builder = self.request(Method::GET, "/health")?;
        self.send_json(builder).await
    }

    pub async fn create_decision(&self, decision: &DecisionCreate) -> ClientResult<Decision> {
        let builder = self
            .request(Method::POST, &decisions_route())?
            .json(decision);
        let created: Decision = self.send_json(builder).await?;
        info!("http: created decision id={}", created.id);
        Ok(created)
    }

    pub async fn list_decisions(&self, query: &ListDecisionsQuery) -> ClientResult<Vec<Decision>> {
        let builder = self.request(Method::GET, &decisions_route())?.query(query);
        let decisions: Vec<Decision> = self.send_json(builder).await?;
        debug!("http: listed decisions count={}", decisions.len());
        Ok(decisions)
    }

    pub async fn get_decision(&self, decision_id: DecisionId) -> ClientResult<DecisionWithScenarios> {
        let builder = self.request(Method::GET, &decision_route(decision_id))?;
        self.send_json(builder).await
    }

    pub async fn update_decision(
        &self,
        decision_id: DecisionId,
        update: &DecisionUpdate,
    ) -> ClientResult<Decision> {
        let builder = self
            .request(Method::PUT, &decision_route(decision_id))?
            .json(update);
        self.send_json(builder).await
    }

    pub async fn delete_decision(&self, decision_id: DecisionId) -> ClientResult<()> {
        let builder = self.request(Method::DELETE, &decision_route(decision_id))?;
        self.send(builder).await?;
        info!("http: deleted decision id={decision_id}");
        Ok(())
    }

    pub async fn simulate(
        &self,
        decision_id: DecisionId,
        params: SimulationParams,
    ) -> ClientResult<DecisionWithScenarios> {
        let body = SimulationRequest::new(decision_id, params);
        let builder = self
            .request(Method::POST, &simulate_route(decision_id))?
            .json(&body);
        let result: DecisionWithScenarios = self.send_json(builder).await?;
        info!(
            "http: simulated decision id={} scenarios={} status={}",
            decision_id,
            result.scenarios.len(),
            result.decision.status
        );
        Ok(result)
    }
}

async fn error_from_response(response: Response) -> ClientError {
    let status = response.status();
    let body = response.bytes().await.unwrap_or_default();
    let detail = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(|body| body.message())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    debug!("http: request failed status={} detail={detail}", status.as_u16());
    ClientError::Api {
        status: status.as_u16(),
        code: ErrorCode::from_status(status.as_u16()),
        detail,
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
