//! Client for the Auxilium time-tracking API.
//!
//! The API speaks JSON over HTTP. Every resource path is suffixed with
//! `.json`, requests identify the application with `X-Identifier` and
//! authenticate with `X-Token`. Only the pieces macropad needs are covered:
//! creating, updating, and showing time tracks, and requesting a token.

use reqwest::{Method, RequestBuilder, Response, StatusCode, Url, header};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, trace};

mod error;
mod login;
mod track;

pub use error::{Error, Result};
pub use track::TimeTrack;

/// Identifier sent with every request and token request.
pub const APPLICATION_IDENTIFIER: &str = "macropad";

/// Header carrying the API token.
const TOKEN_HEADER: &str = "X-Token";
/// Header carrying the application identifier.
const IDENTIFIER_HEADER: &str = "X-Identifier";

/// Auxilium API client.
#[derive(Debug, Clone)]
pub struct Client {
    /// Underlying HTTP client.
    http: reqwest::Client,
    /// Base URL, always ending in `/`.
    base_url: Url,
    /// API token; empty when unauthenticated.
    token: String,
    /// Identifier used when requesting tokens and talking to the API.
    identifier: String,
}

impl Client {
    /// Create a client for `base_url` authenticating with `token` (may be empty).
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        Self::with_http(reqwest::Client::new(), base_url, token)
    }

    /// Create a client that reuses an existing `reqwest::Client`.
    pub fn with_http(
        http: reqwest::Client,
        base_url: &str,
        token: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            http,
            base_url: normalize_base(base_url)?,
            token: token.into(),
            identifier: APPLICATION_IDENTIFIER.to_string(),
        })
    }

    /// Return a copy of the base URL.
    pub fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    /// Replace the base URL. A trailing slash is added when missing.
    pub fn set_base_url(&mut self, url: &str) -> Result<()> {
        self.base_url = normalize_base(url)?;
        Ok(())
    }

    /// True when a token is set.
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    /// Resolve `path` (no leading slash, no extension) to a full resource URL.
    pub fn resource_url(&self, path: &str) -> Result<Url> {
        let rel = format!("{}.json", path.trim_start_matches('/'));
        self.base_url.join(&rel).map_err(|e| Error::InvalidUrl {
            url: format!("{}{}", self.base_url, rel),
            message: e.to_string(),
        })
    }

    /// Build a request with the standard headers and an optional JSON body.
    fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<RequestBuilder> {
        let url = self.resource_url(path)?;
        let mut req = self
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/json")
            .header(IDENTIFIER_HEADER, &self.identifier);
        if self.has_token() {
            req = req.header(TOKEN_HEADER, &self.token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        Ok(req)
    }

    /// Send a request and decode the JSON response into `T`.
    async fn send<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let req = self.request(method.clone(), path, body)?;
        trace!(method = %method, path, "auxilium_request");
        let resp = check_response(&method, req.send().await?).await?;
        let decoded = resp.json::<T>().await?;
        debug!(method = %method, path, "auxilium_ok");
        Ok(decoded)
    }
}

/// Parse `url`, adding the trailing slash that relative joins rely on.
fn normalize_base(url: &str) -> Result<Url> {
    let mut s = url.to_string();
    if !s.ends_with('/') {
        s.push('/');
    }
    Url::parse(&s).map_err(|e| Error::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Statuses the API uses for success.
fn is_success(status: StatusCode) -> bool {
    matches!(status.as_u16(), 200 | 201 | 304)
}

/// Pass successful responses through; turn anything else into [`Error::Api`].
async fn check_response(method: &Method, resp: Response) -> Result<Response> {
    if is_success(resp.status()) {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let url = resp.url().to_string();
    let body = resp.bytes().await.unwrap_or_default();
    let message = match serde_json::from_slice::<Value>(&body) {
        Ok(raw) => parse_error(&raw),
        Err(_) => "failed to parse unknown error format".to_string(),
    };
    Err(Error::Api {
        method: method.to_string(),
        url,
        status,
        message,
    })
}

/// Flatten an API error body into one line.
///
/// The service reports errors as a mix of strings, arrays, and objects keyed
/// by property name, e.g. `{"message": {"name": ["is missing"]}, "error": "bad"}`.
/// Strings are returned as-is, arrays render as `[a, b]`, objects as
/// `{key: value}` entries sorted and joined with `, `.
pub fn parse_error(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let errs: Vec<String> = items.iter().map(parse_error).collect();
            format!("[{}]", errs.join(", "))
        }
        Value::Object(map) => {
            let mut errs: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{{{}: {}}}", k, parse_error(v)))
                .collect();
            errs.sort();
            errs.join(", ")
        }
        other => format!("failed to parse unexpected error type: {}", type_name(other)),
    }
}

/// JSON type name used in error messages.
fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let c = Client::new("https://track.example.net/api", "").unwrap();
        assert_eq!(c.base_url().as_str(), "https://track.example.net/api/");
        assert!(!c.has_token());
    }

    #[test]
    fn resource_urls_keep_base_path() {
        let c = Client::new("https://track.example.net/api/", "tok").unwrap();
        assert_eq!(
            c.resource_url("time_tracks").unwrap().as_str(),
            "https://track.example.net/api/time_tracks.json"
        );
        assert_eq!(
            c.resource_url("time_tracks/12").unwrap().as_str(),
            "https://track.example.net/api/time_tracks/12.json"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = Client::new("not a url", "").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn set_base_url_normalizes() {
        let mut c = Client::new("https://a.example/api", "").unwrap();
        c.set_base_url("https://b.example/v2").unwrap();
        assert_eq!(c.base_url().as_str(), "https://b.example/v2/");
    }

    #[test]
    fn parse_error_flattens_nested_bodies() {
        assert_eq!(parse_error(&json!("boom")), "boom");
        assert_eq!(parse_error(&json!(["a", "b"])), "[a, b]");
        let body = json!({
            "message": {"name": ["is missing", "is short"]},
            "error": "invalid"
        });
        assert_eq!(
            parse_error(&body),
            "{error: invalid}, {message: {name: [is missing, is short]}}"
        );
        assert_eq!(
            parse_error(&json!(3)),
            "failed to parse unexpected error type: number"
        );
    }

    #[test]
    fn success_statuses() {
        assert!(is_success(StatusCode::OK));
        assert!(is_success(StatusCode::CREATED));
        assert!(is_success(StatusCode::NOT_MODIFIED));
        assert!(!is_success(StatusCode::NO_CONTENT));
        assert!(!is_success(StatusCode::UNPROCESSABLE_ENTITY));
    }
}
