//! The HTTP client adapter.

use std::{sync::Arc, time::Duration};

use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use storefront_core::session::SessionProvider;

use crate::{
  Error, Result,
  config::{ClientConfig, TimeoutClass},
};

/// Header the upstream reads the session token from.
pub const TOKEN_HEADER: &str = "token";

// ─── Request / response ───────────────────────────────────────────────────────

/// One outbound call, relative to the configured base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
  pub method: Method,
  pub path:   String,
  pub query:  Vec<(String, String)>,
  pub body:   Option<Value>,
  pub class:  TimeoutClass,
}

impl ApiRequest {
  fn new(method: Method, path: impl Into<String>, body: Option<Value>) -> Self {
    Self {
      method,
      path: path.into(),
      query: Vec::new(),
      body,
      class: TimeoutClass::Standard,
    }
  }

  pub fn get(path: impl Into<String>) -> Self { Self::new(Method::GET, path, None) }

  pub fn post(path: impl Into<String>, body: Value) -> Self {
    Self::new(Method::POST, path, Some(body))
  }

  pub fn put(path: impl Into<String>, body: Value) -> Self {
    Self::new(Method::PUT, path, Some(body))
  }

  pub fn delete(path: impl Into<String>) -> Self { Self::new(Method::DELETE, path, None) }

  pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
    self.query.push((key.to_owned(), value.into()));
    self
  }

  pub fn class(mut self, class: TimeoutClass) -> Self {
    self.class = class;
    self
  }
}

/// What came back, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
  pub status: StatusCode,
  /// Parsed JSON body; `None` when the body was empty or not JSON.
  pub body:   Option<Value>,
}

// ─── Client ───────────────────────────────────────────────────────────────────

/// Sends [`ApiRequest`]s to the upstream.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpClient {
  client:  Client,
  config:  ClientConfig,
  session: Arc<dyn SessionProvider>,
}

impl HttpClient {
  pub fn new(config: ClientConfig, session: Arc<dyn SessionProvider>) -> Result<Self> {
    let client = Client::builder().build().map_err(Error::Client)?;
    Ok(Self { client, config, session })
  }

  pub fn config(&self) -> &ClientConfig { &self.config }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/{}",
      self.config.base_url.trim_end_matches('/'),
      path.trim_start_matches('/')
    )
  }

  /// Send `request` once.
  ///
  /// Fails with [`Error::Timeout`] when the upstream takes longer than the
  /// request's budget and [`Error::Network`] when the transport fails first.
  pub async fn send(&self, request: ApiRequest) -> Result<RawResponse> {
    let timeout = self.config.timeout_for(request.class);

    let mut builder = self
      .client
      .request(request.method.clone(), self.url(&request.path))
      .timeout(timeout);
    if !request.query.is_empty() {
      builder = builder.query(&request.query);
    }
    if let Some(token) = self.session.token() {
      builder = builder.header(TOKEN_HEADER, token);
    }
    if let Some(body) = &request.body {
      builder = builder.json(body);
    }

    tracing::debug!(method = %request.method, path = %request.path, ?timeout, "sending request");

    let resp = builder
      .send()
      .await
      .map_err(|e| transport_error(e, timeout))?;
    let status = resp.status();
    let bytes = resp
      .bytes()
      .await
      .map_err(|e| transport_error(e, timeout))?;

    let body = if bytes.is_empty() {
      None
    } else {
      serde_json::from_slice(&bytes).ok()
    };

    tracing::debug!(method = %request.method, path = %request.path, %status, "response received");
    Ok(RawResponse { status, body })
  }
}

fn transport_error(e: reqwest::Error, timeout: Duration) -> Error {
  if e.is_timeout() {
    Error::Timeout(timeout)
  } else if e.is_builder() {
    Error::Request(e)
  } else {
    Error::Network(e)
  }
}
