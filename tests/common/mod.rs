#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    Router,
};
use serde_json::{json, Value};

use scim_bridge::config::{AppConfig, Environment};
use scim_bridge::{app, AppState};

pub const TENANT: &str = "/tenant-1/scim/v2";
/// Tenant whose user listing carries a resource without an `id`
pub const GHOST_TENANT: &str = "/tenant-ghost/scim/v2";
pub const USERS: [&str; 4] = ["u1", "u2", "u3", "u4"];
/// Group whose relationship checks fail downstream
pub const BROKEN_GROUP: &str = "g-broken";

/// (group, user) pairs the fake directory reports as members
const MEMBERSHIP: [(&str, &str); 2] = [("g1", "u1"), ("g1", "u2")];

/// A request as seen by the fake downstream
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

/// In-process stand-in for the downstream SCIM service
#[derive(Default)]
pub struct Downstream {
    requests: Mutex<Vec<Recorded>>,
    throttled_calls: AtomicUsize,
}

impl Downstream {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn requests_with(&self, method: &str) -> Vec<Recorded> {
        self.requests().into_iter().filter(|r| r.method == method).collect()
    }

    fn record(&self, request: Recorded) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
    }
}

pub struct Harness {
    pub bridge_url: String,
    pub downstream: Arc<Downstream>,
    pub client: reqwest::Client,
}

impl Harness {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.bridge_url, path)
    }
}

/// Boot a fake downstream and a bridge pointed at it, both on ephemeral ports
pub async fn spawn() -> Result<Harness> {
    let downstream = Arc::new(Downstream::default());
    let downstream_addr = serve(Router::new().fallback(handle).with_state(downstream.clone())).await?;

    let mut config = AppConfig::new(Environment::Development, &format!("http://{}", downstream_addr))?;
    config.retry.delay_ms = 10;
    let bridge_addr = serve(app(AppState::new(config)?)).await?;

    Ok(Harness {
        bridge_url: format!("http://{}", bridge_addr),
        downstream,
        client: reqwest::Client::new(),
    })
}

async fn serve(router: Router) -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!("test server stopped: {}", e);
        }
    });
    Ok(addr)
}

async fn handle(
    State(state): State<Arc<Downstream>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.record(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers: headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect(),
        body: serde_json::from_slice(&body).ok(),
    });

    let segments: Vec<&str> = uri.path().trim_matches('/').split('/').collect();
    match (method.as_str(), segments.as_slice()) {
        ("GET", ["tenant-ghost", "scim", "v2", "Users"]) => {
            Json(json!({"totalResults": 1, "Resources": [{"userName": "ghost"}]})).into_response()
        }
        ("GET", [_, "scim", "v2", "Users"]) => Json(json!({
            "totalResults": USERS.len(),
            "Resources": USERS.iter().map(|id| user(id)).collect::<Vec<_>>(),
        }))
        .into_response(),
        ("GET", [_, "scim", "v2", "Users", "throttled"]) => {
            if state.throttled_calls.fetch_add(1, Ordering::SeqCst) < 2 {
                too_many_requests()
            } else {
                Json(user("throttled")).into_response()
            }
        }
        ("GET", [_, "scim", "v2", "Users", "always-throttled"]) => too_many_requests(),
        ("GET", [_, "scim", "v2", "Users", id]) => Json(user(id)).into_response(),
        ("POST", [_, "scim", "v2", "Users"]) => {
            let mut created = serde_json::from_slice::<Value>(&body).unwrap_or_else(|_| json!({}));
            created["id"] = json!("u-new");
            (StatusCode::CREATED, Json(created)).into_response()
        }
        ("DELETE", [_, "scim", "v2", "Users", _]) => StatusCode::NO_CONTENT.into_response(),
        ("GET", [_, "scim", "v2", "Groups"]) => relationship(uri.query()),
        ("PATCH", [_, "scim", "v2", "Groups", _]) => StatusCode::NO_CONTENT.into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({"detail": "Resource not found"}))).into_response(),
    }
}

fn user(id: &str) -> Value {
    json!({ "id": id, "userName": format!("{}@example.com", id) })
}

fn too_many_requests() -> Response {
    (StatusCode::TOO_MANY_REQUESTS, Json(json!({"detail": "Rate exceeded"}))).into_response()
}

/// Answers `filter=id eq "G" and members eq "U"`
fn relationship(query: Option<&str>) -> Response {
    let filter = query
        .and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == "filter")
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_default();

    let quoted: Vec<&str> = filter.split('"').collect();
    let (group, user_id) = match quoted.as_slice() {
        [_, group, _, user_id, ..] => (*group, *user_id),
        _ => return (StatusCode::BAD_REQUEST, Json(json!({"detail": "Unsupported filter"}))).into_response(),
    };

    if group == BROKEN_GROUP {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"detail": "Directory unavailable"}))).into_response();
    }

    let resources: Vec<Value> = if MEMBERSHIP.iter().any(|(g, u)| *g == group && *u == user_id) {
        vec![json!({ "id": group, "displayName": "Engineering" })]
    } else {
        Vec::new()
    };

    Json(json!({ "totalResults": resources.len(), "Resources": resources })).into_response()
}
