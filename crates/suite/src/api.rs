//! Thin HTTP client wrapper for the bank's REST API.
//!
//! Requests carry JSON default headers; every response is logged and its body
//! mirrored into the report sink when one is attached. Transport failures
//! propagate unmodified to the caller.

use std::sync::Arc;

use harness::outcome::TestId;
use harness::report::ReportSink;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use tracing::debug;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Longest response body inlined into the report before truncation.
const BODY_ATTACHMENT_LIMIT: usize = 1000;

/// A fully-read API response.
#[derive(Debug)]
pub struct ApiResponse {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: String,
}

impl ApiResponse {
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	pub fn content_type(&self) -> Option<&str> {
		self.headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok())
	}

	pub fn json(&self) -> serde_json::Result<serde_json::Value> {
		serde_json::from_str(&self.body)
	}
}

pub struct ApiClient {
	base_url: String,
	client: Client,
	auth_token: Option<String>,
	report: Option<(Arc<ReportSink>, TestId)>,
}

impl ApiClient {
	pub fn new(base_url: impl Into<String>) -> reqwest::Result<Self> {
		let mut headers = HeaderMap::new();
		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
		let client = Client::builder()
			.default_headers(headers)
			.timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
			.build()?;
		Ok(Self {
			base_url: base_url.into().trim_end_matches('/').to_owned(),
			client,
			auth_token: None,
			report: None,
		})
	}

	/// Mirrors response bodies into `sink` under the given test.
	pub fn with_report(mut self, sink: Arc<ReportSink>, test: TestId) -> Self {
		self.report = Some((sink, test));
		self
	}

	pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
		self.auth_token = Some(token.into());
		self
	}

	pub async fn get(&self, endpoint: &str) -> reqwest::Result<ApiResponse> {
		self.execute(self.request(Method::GET, endpoint)).await
	}

	pub async fn get_with_query(&self, endpoint: &str, query: &[(&str, &str)]) -> reqwest::Result<ApiResponse> {
		self.execute(self.request(Method::GET, endpoint).query(query)).await
	}

	pub async fn post(&self, endpoint: &str, body: &serde_json::Value) -> reqwest::Result<ApiResponse> {
		self.execute(self.request(Method::POST, endpoint).json(body)).await
	}

	pub async fn put(&self, endpoint: &str, body: &serde_json::Value) -> reqwest::Result<ApiResponse> {
		self.execute(self.request(Method::PUT, endpoint).json(body)).await
	}

	pub async fn patch(&self, endpoint: &str, body: &serde_json::Value) -> reqwest::Result<ApiResponse> {
		self.execute(self.request(Method::PATCH, endpoint).json(body)).await
	}

	pub async fn delete(&self, endpoint: &str) -> reqwest::Result<ApiResponse> {
		self.execute(self.request(Method::DELETE, endpoint)).await
	}

	fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
		let url = format!("{}{endpoint}", self.base_url);
		debug!(target = "suite", %method, %url, "api request");
		let builder = self.client.request(method, url);
		match &self.auth_token {
			Some(token) => builder.bearer_auth(token),
			None => builder,
		}
	}

	async fn execute(&self, builder: RequestBuilder) -> reqwest::Result<ApiResponse> {
		let response = builder.send().await?;
		let status = response.status();
		let headers = response.headers().clone();
		let body = response.text().await?;
		debug!(target = "suite", status = status.as_u16(), bytes = body.len(), "api response");
		self.record(status, &body);
		Ok(ApiResponse { status, headers, body })
	}

	fn record(&self, status: StatusCode, body: &str) {
		let Some((sink, test)) = &self.report else {
			return;
		};
		let name = format!("Response {}", status.as_u16());
		match serde_json::from_str::<serde_json::Value>(body) {
			Ok(value) => sink.attach_json(test, &name, &value),
			Err(_) if body.is_empty() => {}
			Err(_) => {
				let truncated: String = body.chars().take(BODY_ATTACHMENT_LIMIT).collect();
				sink.attach_text(test, &name, truncated);
			}
		}
	}
}
