//! In-process stand-in for the decisions backend.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};
use uuid::Uuid;

use crate::{http::ApiClient, session::SessionStore, token_store::MemoryTokenStore};

const CATEGORIES: [&str; 6] = [
    "career",
    "finance",
    "health",
    "business",
    "education",
    "personal",
];

#[derive(Debug, Clone)]
pub(crate) struct FakeUser {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Default)]
pub(crate) struct FakeState {
    pub users: Vec<FakeUser>,
    pub tokens: HashMap<String, Uuid>,
    pub decisions: Vec<Value>,
    pub scenarios: HashMap<String, Vec<Value>>,
    pub requests: Vec<RecordedRequest>,
    pub simulate_bodies: Vec<Value>,
    pub login_content_types: Vec<String>,
    pub fail_simulation: bool,
}

impl FakeState {
    pub fn count_requests(&self, path: &str) -> usize {
        self.requests.iter().filter(|r| r.path == path).count()
    }
}

type Shared = Arc<Mutex<FakeState>>;

pub(crate) struct FakeApi {
    pub url: String,
    pub state: Shared,
}

impl FakeApi {
    /// Adds an account directly, bypassing the HTTP surface.
    pub async fn seed_user(&self, email: &str, password: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().await.users.push(FakeUser {
            id,
            email: email.to_string(),
            password: password.to_string(),
            full_name: None,
        });
        id
    }

    /// Issues a valid token for an existing account.
    pub async fn issue_token(&self, user_id: Uuid) -> String {
        let token = format!("tok-{}", Uuid::new_v4().simple());
        self.state.lock().await.tokens.insert(token.clone(), user_id);
        token
    }

    pub async fn fail_simulations(&self) {
        self.state.lock().await.fail_simulation = true;
    }
}

pub(crate) async fn spawn_fake_api() -> FakeApi {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state: Shared = Arc::new(Mutex::new(FakeState::default()));

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/me", get(me))
        .route("/api/v1/decisions", get(list_decisions).post(create_decision))
        .route(
            "/api/v1/decisions/:id",
            get(get_decision).put(update_decision).delete(delete_decision),
        )
        .route("/api/v1/decisions/:id/simulate", post(simulate))
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .with_state(state.clone());

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    FakeApi {
        url: format!("http://{addr}"),
        state,
    }
}

async fn record_request(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.lock().await.requests.push(RecordedRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        authorization,
    });
    next.run(request).await
}

fn now() -> String {
    Utc::now()
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn validation_error(field: &str, msg: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "detail": [{"loc": ["body", field], "msg": msg, "type": "value_error"}]
        })),
    )
        .into_response()
}

fn user_json(user: &FakeUser) -> Value {
    json!({
        "id": user.id,
        "email": user.email,
        "full_name": user.full_name,
        "is_active": true,
        "created_at": now(),
    })
}

fn authenticate(state: &FakeState, headers: &HeaderMap) -> Result<FakeUser, Response> {
    let unauthorized = || detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;
    let user_id = state.tokens.get(token).ok_or_else(unauthorized)?;
    state
        .users
        .iter()
        .find(|u| u.id == *user_id)
        .cloned()
        .ok_or_else(unauthorized)
}

fn find_decision_index(state: &FakeState, user: &FakeUser, id: &str) -> Option<usize> {
    let user_id = user.id.to_string();
    state.decisions.iter().position(|d| {
        d["id"].as_str() == Some(id) && d["user_id"].as_str() == Some(user_id.as_str())
    })
}

async fn health() -> Response {
    Json(json!({"status": "healthy", "app": "LifeEcho AI", "database": "connected"})).into_response()
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().await;
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if !email.contains('@') {
        return validation_error("email", "value is not a valid email address");
    }
    if state.users.iter().any(|u| u.email == email) {
        return detail(StatusCode::BAD_REQUEST, "Email already registered");
    }
    let user = FakeUser {
        id: Uuid::new_v4(),
        email,
        password: body["password"].as_str().unwrap_or_default().to_string(),
        full_name: body["full_name"].as_str().map(str::to_string),
    };
    let response = user_json(&user);
    state.users.push(user);
    (StatusCode::CREATED, Json(response)).into_response()
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(
    State(state): State<Shared>,
    headers: HeaderMap,
    Form(body): Form<LoginBody>,
) -> Response {
    let mut state = state.lock().await;
    if let Some(content_type) = headers.get("content-type").and_then(|v| v.to_str().ok()) {
        state.login_content_types.push(content_type.to_string());
    }
    let Some(user_id) = state
        .users
        .iter()
        .find(|u| u.email == body.username && u.password == body.password)
        .map(|u| u.id)
    else {
        return detail(StatusCode::UNAUTHORIZED, "Incorrect email or password");
    };
    let token = format!("tok-{}", Uuid::new_v4().simple());
    state.tokens.insert(token.clone(), user_id);
    Json(json!({"access_token": token, "token_type": "bearer"})).into_response()
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = state.lock().await;
    match authenticate(&state, &headers) {
        Ok(user) => Json(user_json(&user)).into_response(),
        Err(response) => response,
    }
}

async fn create_decision(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().await;
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let title = body["title"].as_str().unwrap_or_default();
    if title.is_empty() {
        return validation_error("title", "ensure this value has at least 1 characters");
    }
    let category = body["category"].as_str().unwrap_or_default();
    if !CATEGORIES.contains(&category) {
        return validation_error("category", "string does not match regex");
    }
    let timestamp = now();
    let decision = json!({
        "id": Uuid::new_v4(),
        "user_id": user.id,
        "title": title,
        "description": body.get("description").cloned().unwrap_or(Value::Null),
        "category": category,
        "context": body.get("context").filter(|c| !c.is_null()).cloned().unwrap_or_else(|| json!({})),
        "status": "draft",
        "created_at": timestamp,
        "updated_at": timestamp,
    });
    state.decisions.push(decision.clone());
    (StatusCode::CREATED, Json(decision)).into_response()
}

#[derive(Deserialize)]
struct ListQuery {
    skip: Option<usize>,
    limit: Option<usize>,
}

async fn list_decisions(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    let state = state.lock().await;
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let user_id = user.id.to_string();
    let decisions: Vec<Value> = state
        .decisions
        .iter()
        .filter(|d| d["user_id"].as_str() == Some(user_id.as_str()))
        .skip(query.skip.unwrap_or(0))
        .take(query.limit.unwrap_or(100))
        .cloned()
        .collect();
    Json(decisions).into_response()
}

async fn get_decision(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let state = state.lock().await;
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let Some(index) = find_decision_index(&state, &user, &id) else {
        return detail(StatusCode::NOT_FOUND, "Decision not found");
    };
    let mut scenarios = state.scenarios.get(&id).cloned().unwrap_or_default();
    scenarios.sort_by_key(|s| s["rank"].as_i64().unwrap_or_default());
    Json(json!({"decision": state.decisions[index], "scenarios": scenarios})).into_response()
}

async fn update_decision(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().await;
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let Some(index) = find_decision_index(&state, &user, &id) else {
        return detail(StatusCode::NOT_FOUND, "Decision not found");
    };
    let decision = &mut state.decisions[index];
    if let Value::Object(fields) = body {
        for (key, value) in fields {
            decision[key.as_str()] = value;
        }
    }
    decision["updated_at"] = Value::String(now());
    Json(decision.clone()).into_response()
}

async fn delete_decision(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut state = state.lock().await;
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let Some(index) = find_decision_index(&state, &user, &id) else {
        return detail(StatusCode::NOT_FOUND, "Decision not found");
    };
    state.decisions.remove(index);
    state.scenarios.remove(&id);
    StatusCode::NO_CONTENT.into_response()
}

async fn simulate(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().await;
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    state.simulate_bodies.push(body.clone());
    let Some(index) = find_decision_index(&state, &user, &id) else {
        return detail(StatusCode::NOT_FOUND, "Decision not found");
    };
    if state.fail_simulation {
        state.decisions[index]["status"] = json!("draft");
        return detail(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error generating scenarios: model unavailable",
        );
    }

    let count = body["num_scenarios"].as_u64().unwrap_or(3);
    let horizon = body["time_horizon_years"].as_u64().unwrap_or(5);
    let title = state.decisions[index]["title"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    let scenarios: Vec<Value> = (0..count)
        .map(|i| generated_scenario(&id, &title, i, horizon))
        .collect();

    state.scenarios.insert(id.clone(), scenarios.clone());
    let decision = &mut state.decisions[index];
    decision["status"] = json!("completed");
    decision["updated_at"] = Value::String(now());
    Json(json!({"decision": decision.clone(), "scenarios": scenarios})).into_response()
}

fn generated_scenario(decision_id: &str, title: &str, index: u64, horizon: u64) -> Value {
    let labels = ["Optimistic Path", "Balanced Approach", "Conservative Path", "Aggressive Strategy", "Gradual Transition"];
    let label = labels[(index as usize) % labels.len()];
    let timeline: Vec<Value> = (1..=horizon)
        .map(|year| {
            json!({
                "period": format!("Year {year}"),
                "event": if year == 1 { "Initial implementation and learning phase" } else { "Continued progress" },
                "impact": if year == 1 { "neutral" } else { "positive" },
            })
        })
        .collect();
    let mut financial = serde_json::Map::new();
    for year in [1u64, 3, 5] {
        if year <= horizon {
            financial.insert(format!("year_{year}"), json!(50_000 + 10_000 * year + 1_000 * index));
        }
    }
    json!({
        "id": Uuid::new_v4(),
        "decision_id": decision_id,
        "title": format!("{label}: {title}"),
        "description": "Projected outcome",
        "probability": 0.75 - 0.1 * index as f64,
        "timeline_data": timeline,
        "outcomes": {
            "financial": financial,
            "satisfaction": 7.0,
            "time_investment_hours": 500,
        },
        "risks": [
            {"factor": "Market conditions may change", "severity": "medium", "mitigation": "Stay informed"},
            {"factor": "Unexpected challenges may arise", "severity": "low"}
        ],
        "recommendations": "Consider your risk tolerance and timeline.",
        "rank": index + 1,
        "created_at": now(),
    })
}

pub(crate) fn client_for(api: &FakeApi, tokens: Arc<MemoryTokenStore>) -> ApiClient {
    ApiClient::new(&api.url, tokens).expect("api client")
}

pub(crate) fn session_for(api: &FakeApi, tokens: Arc<MemoryTokenStore>) -> SessionStore {
    SessionStore::new(client_for(api, tokens))
}
