// Downstream SCIM transport

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, HOST};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::AppConfig;
use crate::scim::{GroupLocator, HeaderBag, ListResponse, MemberDirectory, ScimError, ScimMethod, ScimUser};

/// Inbound headers that must not be forwarded as-is: framing, hop-by-hop, and the host we replace
const FILTERED_HEADERS: [&str; 8] = [
    "content-length",
    "host",
    "connection",
    "keep-alive",
    "transfer-encoding",
    "te",
    "upgrade",
    "expect",
];

/// Status, headers and parsed body of a downstream response
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub headers: HeaderBag,
    pub data: Option<Value>,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client for the downstream SCIM endpoint
#[derive(Debug, Clone)]
pub struct ScimClient {
    http: reqwest::Client,
    base_url: String,
    host: String,
    max_retries: u32,
    retry_delay: Duration,
    log_bodies: bool,
}

impl ScimClient {
    pub fn new(config: &AppConfig) -> Result<Self, ScimError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.proxy.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.proxy.url.clone(),
            host: config.proxy.host.clone(),
            max_retries: config.retry.max_retries,
            retry_delay: Duration::from_millis(config.retry.delay_ms),
            log_bodies: config.api.enable_request_logging,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request downstream, retrying on 429
    ///
    /// With `proxy_status` every status is handed back for the caller to map; without
    /// it a non-2xx status is turned into [`ScimError::Upstream`].
    pub async fn send(
        &self,
        method: ScimMethod,
        headers: &HeaderBag,
        data: Option<&Value>,
        path: &str,
        proxy_status: bool,
    ) -> Result<UpstreamResponse, ScimError> {
        let url = format!("{}{}", self.base_url, path);
        let headers = self.outbound_headers(headers, data.is_some());
        let body = data.map(serde_json::to_vec).transpose()?;

        if self.log_bodies {
            tracing::info!("Sending request downstream {} {} {:?}", method, path, data);
        } else {
            tracing::info!("Sending request downstream {} {}", method, path);
        }

        let mut attempt = 0;
        let response = loop {
            let mut request = self.http.request(http_method(method), &url).headers(headers.clone());
            if let Some(body) = &body {
                request = request.body(body.clone());
            }

            let response = request.send().await?;
            if response.status() == StatusCode::TOO_MANY_REQUESTS && attempt < self.max_retries {
                attempt += 1;
                tracing::warn!(
                    "Downstream rate limited {} {}, retry {}/{} in {:?}",
                    method,
                    path,
                    attempt,
                    self.max_retries,
                    self.retry_delay
                );
                tokio::time::sleep(self.retry_delay).await;
                continue;
            }
            break response;
        };

        let upstream = read_response(response).await?;

        if self.log_bodies {
            tracing::info!("Received response downstream {} {:?}", upstream.status, upstream.data);
        } else {
            tracing::info!("Received response downstream {}", upstream.status);
        }

        if !proxy_status && !upstream.is_success() {
            return Err(ScimError::upstream(upstream.status, upstream.data));
        }

        Ok(upstream)
    }

    fn outbound_headers(&self, inbound: &HeaderBag, has_body: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in inbound {
            if FILTERED_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                continue;
            }
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::debug!("Dropping header {} that cannot be forwarded", name),
            }
        }

        if let Ok(host) = HeaderValue::from_str(&self.host) {
            headers.insert(HOST, host);
        }
        if has_body && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/scim+json"));
        }

        headers
    }
}

fn http_method(method: ScimMethod) -> Method {
    match method {
        ScimMethod::Get => Method::GET,
        ScimMethod::Post => Method::POST,
        ScimMethod::Patch => Method::PATCH,
        ScimMethod::Put => Method::PUT,
        ScimMethod::Delete => Method::DELETE,
    }
}

async fn read_response(response: reqwest::Response) -> Result<UpstreamResponse, ScimError> {
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect();

    let bytes = response.bytes().await?;
    let data = if bytes.is_empty() {
        None
    } else {
        // Keep non-JSON bodies (HTML error pages and the like) as plain strings
        Some(
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned())),
        )
    };

    Ok(UpstreamResponse { status, headers, data })
}

/// Directory queries made on behalf of one inbound request, reusing its headers
#[derive(Debug, Clone)]
pub struct RequestDirectory {
    client: ScimClient,
    headers: HeaderBag,
}

impl RequestDirectory {
    pub fn new(client: ScimClient, headers: HeaderBag) -> Self {
        Self { client, headers }
    }
}

#[async_trait]
impl MemberDirectory for RequestDirectory {
    async fn list_users(&self, locator: &GroupLocator) -> Result<Vec<ScimUser>, ScimError> {
        let response = self
            .client
            .send(ScimMethod::Get, &self.headers, None, &locator.users_path(), false)
            .await?;

        let list: ListResponse<ScimUser> = parse_listing(response, &locator.users_path())?;
        Ok(list.resources)
    }

    async fn group_relationship(&self, locator: &GroupLocator, user_id: &str) -> Result<Option<Value>, ScimError> {
        let response = self
            .client
            .send(ScimMethod::Get, &self.headers, None, &locator.relationship_path(user_id), false)
            .await?;

        let list: ListResponse<Value> = parse_listing(response, &locator.relationship_path(user_id))?;
        Ok(list.resources.into_iter().next())
    }
}

fn parse_listing<T: DeserializeOwned>(response: UpstreamResponse, path: &str) -> Result<ListResponse<T>, ScimError> {
    serde_json::from_value(response.data.unwrap_or(Value::Null))
        .map_err(|e| ScimError::malformed_response(format!("{}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    fn client() -> ScimClient {
        let config = AppConfig::new(Environment::Development, "https://scim.example.com/tenant").unwrap();
        ScimClient::new(&config).unwrap()
    }

    #[test]
    fn test_outbound_headers_replace_host_and_drop_length() {
        let mut inbound = HeaderBag::new();
        inbound.insert("content-length".to_string(), "100".to_string());
        inbound.insert("host".to_string(), "bridge.internal".to_string());
        inbound.insert("authorization".to_string(), "Bearer token".to_string());

        let headers = client().outbound_headers(&inbound, false);

        assert_eq!(headers.get(HOST).unwrap(), "scim.example.com");
        assert_eq!(headers.get("authorization").unwrap(), "Bearer token");
        assert!(headers.get("content-length").is_none());
        assert!(headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_outbound_headers_drop_hop_by_hop() {
        let mut inbound = HeaderBag::new();
        for name in ["connection", "keep-alive", "transfer-encoding", "te", "upgrade", "expect"] {
            inbound.insert(name.to_string(), "x".to_string());
        }
        inbound.insert("accept".to_string(), "application/scim+json".to_string());

        let headers = client().outbound_headers(&inbound, false);

        assert_eq!(headers.len(), 2, "unexpected headers: {:?}", headers);
        assert_eq!(headers.get("accept").unwrap(), "application/scim+json");
        assert_eq!(headers.get(HOST).unwrap(), "scim.example.com");
    }

    #[test]
    fn test_outbound_headers_default_content_type_for_bodies() {
        let mut inbound = HeaderBag::new();
        let headers = client().outbound_headers(&inbound, true);
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/scim+json");

        inbound.insert("content-type".to_string(), "application/json".to_string());
        let headers = client().outbound_headers(&inbound, true);
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn test_base_url_keeps_path_prefix() {
        assert_eq!(client().base_url(), "https://scim.example.com/tenant");
    }
}
