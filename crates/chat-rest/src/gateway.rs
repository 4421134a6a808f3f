//! REST gateway - executes requests under rate limits
//!
//! [`RateLimitedGateway`] owns the retry loop and bucket bookkeeping; the wire is behind
//! [`Transport`], so the loop is the same for the reqwest client and for test doubles.

use std::sync::Arc;

use async_trait::async_trait;
use chat_common::RestConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use serde_json::Value;

use crate::error::{RestError, RestResult};
use crate::ratelimit::{RateLimitHeaders, RateLimiter};
use crate::route::{Method, RestRequest, RestResponse, Route};

/// Performs authenticated REST calls
///
/// A rate limited call is delayed and retried internally; only exhaustion of the retry
/// budget is surfaced, as [`RestError::RateLimitExhausted`].
#[async_trait]
pub trait RestGateway: Send + Sync {
    async fn execute(&self, request: RestRequest) -> RestResult<RestResponse>;
}

/// Raw response from a transport, before status interpretation
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: RateLimitHeaders,
    pub body: Value,
}

/// Sends a single request over the wire
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RestRequest) -> RestResult<TransportResponse>;
}

/// [`RestGateway`] that respects per-route and global rate limits
pub struct RateLimitedGateway<T> {
    transport: T,
    limiter: Arc<RateLimiter>,
    max_retries: u32,
}

impl<T: Transport> RateLimitedGateway<T> {
    pub fn new(transport: T, max_retries: u32) -> Self {
        Self {
            transport,
            limiter: Arc::new(RateLimiter::new()),
            max_retries,
        }
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[inline]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}

#[async_trait]
impl<T: Transport> RestGateway for RateLimitedGateway<T> {
    async fn execute(&self, request: RestRequest) -> RestResult<RestResponse> {
        let key = request.route.bucket_key();
        let mut retries = 0;

        loop {
            self.limiter.acquire(&key).await;

            let response = self.transport.send(&request).await?;
            self.limiter
                .update(&key, response.status, &response.headers, &response.body);

            match response.status {
                200..=299 => {
                    tracing::trace!(
                        method = %request.method,
                        route = %request.route,
                        status = response.status,
                        "REST request completed"
                    );
                    return Ok(RestResponse {
                        status: response.status,
                        body: response.body,
                    });
                }
                429 => {
                    retries += 1;
                    if retries > self.max_retries {
                        tracing::warn!(
                            route = %request.route,
                            retries = self.max_retries,
                            "Rate limited and out of retries"
                        );
                        return Err(RestError::RateLimitExhausted {
                            route: request.route.to_string(),
                        });
                    }
                    tracing::debug!(
                        route = %request.route,
                        retry = retries,
                        "Retrying rate limited request"
                    );
                }
                status => {
                    tracing::debug!(
                        method = %request.method,
                        route = %request.route,
                        status,
                        "REST request failed"
                    );
                    return Err(RestError::Http {
                        status,
                        body: response.body,
                    });
                }
            }
        }
    }
}

/// [`Transport`] over `reqwest`
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Build a client sending `Authorization: Bot <token>`
    pub fn new(token: &str, config: &RestConfig) -> RestResult<Self> {
        let mut authorization = HeaderValue::try_from(format!("Bot {token}"))
            .map_err(|e| RestError::InvalidHeader(format!("token: {e}")))?;
        authorization.set_sensitive(true);

        let user_agent = HeaderValue::try_from(config.user_agent.as_str())
            .map_err(|e| RestError::InvalidHeader(format!("user agent: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(USER_AGENT, user_agent);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &RestRequest) -> RestResult<TransportResponse> {
        let url = format!("{}{}", self.base_url, request.route.path());
        let mut builder = self.client.request(Self::method(request.method), url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = RateLimitHeaders::from_header_map(response.headers());

        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

/// Rate limited REST client over HTTP
pub type HttpRestGateway = RateLimitedGateway<ReqwestTransport>;

impl HttpRestGateway {
    pub fn from_config(token: &str, config: &RestConfig) -> RestResult<Self> {
        Ok(Self::new(
            ReqwestTransport::new(token, config)?,
            config.max_retries,
        ))
    }
}

/// Resolve the gateway WebSocket URL
pub async fn get_gateway_url(rest: &dyn RestGateway) -> RestResult<String> {
    let response = rest.execute(RestRequest::get(Route::gateway())).await?;
    response
        .body
        .get("url")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(RestError::MissingField("url"))
}
