//! Authenticated GET against the GitHub API with response classification.

use std::sync::Arc;

use url::Url;

use crate::endpoint::{Endpoint, EndpointError, default_base_url};
use crate::error::{ApiError, Result};
use crate::http::{HttpError, HttpHeaders, HttpRequest, HttpResponse, HttpTransport};
use crate::rate_limit::{ApiRateLimiter, RateLimitInfo, remaining_quota};

pub const ACCEPT_HEADER: &str = "Accept";
pub const ACCEPT_GITHUB_JSON: &str = "application/vnd.github+json";
pub const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
pub const API_VERSION: &str = "2022-11-28";
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
    /// Rate limit state, when the response carried the headers.
    pub rate_limit: Option<RateLimitInfo>,
}

/// Issues GitHub API requests over an injected [`HttpTransport`].
///
/// Cheap to clone; clones share the transport and rate limiter.
#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn HttpTransport>,
    base_url: Url,
    rate_limiter: Option<ApiRateLimiter>,
}

impl Gateway {
    /// Create a gateway for the public GitHub API.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            base_url: default_base_url(),
            rate_limiter: None,
        }
    }

    /// Point the gateway at another API root (GitHub Enterprise, test servers).
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Pace outgoing requests with a proactive rate limiter.
    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: ApiRateLimiter) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint against this gateway's base URL.
    pub fn resolve(&self, endpoint: &Endpoint) -> std::result::Result<Url, EndpointError> {
        endpoint.resolve_with_base(&self.base_url)
    }

    /// Issue a single authenticated GET and classify the outcome.
    pub async fn get(&self, url: &Url, auth_token: &str) -> Result<GatewayResponse> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.wait().await;
        }

        tracing::debug!(url = %url, "GET");
        let request = build_request(url, auth_token);

        let response = self.transport.send(request).await.map_err(|e| match e {
            HttpError::Offline(message) => {
                tracing::debug!(url = %url, error = %message, "No connectivity");
                ApiError::NoInternet
            }
            other => ApiError::transport(other.to_string()),
        })?;

        let rate_limit = RateLimitInfo::from_headers(&response.headers);
        if let Some(info) = &rate_limit {
            tracing::debug!(
                limit = info.limit,
                remaining = info.remaining,
                reset_at = ?info.reset_at,
                "Rate limit status"
            );
        }

        classify_status(&response)?;

        Ok(GatewayResponse {
            status: response.status,
            headers: response.headers,
            body: response.body,
            rate_limit,
        })
    }
}

/// Build the GET request with the GitHub media type, API version and optional bearer token.
pub fn build_request(url: &Url, auth_token: &str) -> HttpRequest {
    let mut request = HttpRequest::get(url.as_str())
        .header(ACCEPT_HEADER, ACCEPT_GITHUB_JSON)
        .header(API_VERSION_HEADER, API_VERSION);

    let token = auth_token.trim();
    if !token.is_empty() {
        request = request.header(AUTHORIZATION_HEADER, format!("Bearer {token}"));
    }

    request
}

/// Classify a non-2xx status.
///
/// 403 is always `Unauthorized`. The remaining-quota header is only consulted
/// for other statuses.
pub fn classify_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }

    tracing::warn!(
        status = response.status,
        remaining = ?remaining_quota(&response.headers),
        "Request failed"
    );

    if response.status == 403 {
        Err(ApiError::Unauthorized)
    } else if remaining_quota(&response.headers) == Some(0) {
        Err(ApiError::RateLimitExceeded)
    } else {
        Err(ApiError::InvalidRequest)
    }
}
