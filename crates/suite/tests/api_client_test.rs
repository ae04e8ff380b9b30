//! API helper tests against a mock HTTP service.

use std::sync::Arc;

use harness::outcome::TestId;
use harness::report::{AttachmentKind, ReportSink};
use httpmock::prelude::*;
use serde_json::json;
use suite::ApiClient;

#[tokio::test]
async fn get_parses_json_and_mirrors_it_into_the_report() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/customers/12212");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({"id": 12212, "firstName": "John"}));
		})
		.await;

	let sink = Arc::new(ReportSink::in_memory());
	let test = TestId::new("api_customer_lookup");
	let client = ApiClient::new(server.base_url())
		.unwrap()
		.with_report(Arc::clone(&sink), test.clone());

	let response = client.get("/customers/12212").await.unwrap();
	mock.assert_async().await;

	assert!(response.is_success());
	assert_eq!(response.json().unwrap()["id"], 12212);
	assert!(response.content_type().unwrap_or_default().contains("application/json"));

	let attachments = sink.attachments_for(&test);
	assert_eq!(attachments.len(), 1);
	assert_eq!(attachments[0].kind, AttachmentKind::Json);
	assert_eq!(attachments[0].name, "Response 200");
}

#[tokio::test]
async fn non_json_body_is_attached_as_truncated_text() {
	let server = MockServer::start_async().await;
	let long_body = "x".repeat(5000);
	server
		.mock_async(|when, then| {
			when.method(GET).path("/status");
			then.status(200).header("content-type", "text/plain").body(&long_body);
		})
		.await;

	let sink = Arc::new(ReportSink::in_memory());
	let test = TestId::new("api_status_text");
	let client = ApiClient::new(server.base_url())
		.unwrap()
		.with_report(Arc::clone(&sink), test.clone());

	let response = client.get("/status").await.unwrap();
	assert_eq!(response.body.len(), 5000);

	let attachments = sink.attachments_for(&test);
	assert_eq!(attachments.len(), 1);
	assert_eq!(attachments[0].kind, AttachmentKind::Text);
	assert_eq!(attachments[0].body.len(), 1000);
}

#[tokio::test]
async fn requests_send_json_default_headers() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/customers/12212/accounts")
				.header("accept", "application/json")
				.header("content-type", "application/json");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!([]));
		})
		.await;

	let client = ApiClient::new(server.base_url()).unwrap();
	let response = client.get("/customers/12212/accounts").await.unwrap();
	mock.assert_async().await;
	assert!(response.is_success());
}

#[tokio::test]
async fn auth_token_is_sent_as_a_bearer_header() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/transfers")
				.header("authorization", "Bearer sekrit");
			then.status(201)
				.header("content-type", "application/json")
				.json_body(json!({"status": "accepted"}));
		})
		.await;

	let client = ApiClient::new(server.base_url()).unwrap().with_auth_token("sekrit");
	let response = client
		.post("/transfers", &json!({"fromAccountId": 13344, "toAccountId": 13566, "amount": 10}))
		.await
		.unwrap();
	mock.assert_async().await;
	assert_eq!(response.status.as_u16(), 201);
}

#[tokio::test]
async fn query_parameters_reach_the_service() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/login")
				.query_param("username", "john")
				.query_param("password", "demo");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({"id": 12212}));
		})
		.await;

	let client = ApiClient::new(server.base_url()).unwrap();
	let response = client
		.get_with_query("/login", &[("username", "john"), ("password", "demo")])
		.await
		.unwrap();
	mock.assert_async().await;
	assert!(response.is_success());
	assert!(!response.body.is_empty());
}
