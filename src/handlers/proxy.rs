use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

use crate::client::{RequestDirectory, UpstreamResponse};
use crate::error::ApiError;
use crate::scim::{normalize, HeaderBag, MembershipResolver, MutationRequest, ScimMethod};
use crate::AppState;

/// Downstream response headers tied to the downstream body framing or connection
const HOP_HEADERS: [&str; 4] = ["connection", "content-length", "transfer-encoding", "keep-alive"];

/// ANY /*path - Normalize the request and forward it downstream
pub async fn forward(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let scim_method =
        ScimMethod::from_http(method.as_str()).ok_or_else(|| ApiError::method_not_allowed(method.as_str()))?;

    // Query strings (list filters) travel with the path
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let body: Option<Value> = if body.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&body).map_err(|e| ApiError::invalid_json(e.to_string()))?)
    };

    tracing::debug!("Inbound {} {} body={:?}", scim_method, path, body);

    let header_bag = header_bag(&headers);
    let request = MutationRequest::new(scim_method, header_bag.clone(), path, body);

    let fetch = MembershipResolver::new(RequestDirectory::new(state.client.clone(), header_bag));
    let normalized = normalize(&request, &fetch).await?;

    let data = normalized
        .data_value()
        .map_err(|e| ApiError::internal_server_error(format!("Failed to encode request: {}", e)))?;

    let upstream = state
        .client
        .send(normalized.method, &normalized.headers, data.as_ref(), &normalized.path, true)
        .await?;

    Ok(into_response(upstream, uri.path()))
}

fn header_bag(headers: &HeaderMap) -> HeaderBag {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect()
}

/// Map the downstream answer back to the caller
///
/// Any 2xx becomes 200; a 204 is answered with the id of the addressed resource
/// since the identity provider expects a body on success.
fn into_response(upstream: UpstreamResponse, path: &str) -> Response {
    let status = if upstream.is_success() {
        StatusCode::OK
    } else {
        StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY)
    };

    let data = if upstream.status == 204 {
        Some(json!({ "id": last_segment(path) }))
    } else {
        upstream.data
    };

    let mut headers = HeaderMap::new();
    for (name, value) in &upstream.headers {
        if HOP_HEADERS.contains(&name.as_str()) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            headers.insert(name, value);
        }
    }

    match data {
        Some(data) => (status, headers, Json(data)).into_response(),
        None => (status, headers).into_response(),
    }
}

fn last_segment(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}
