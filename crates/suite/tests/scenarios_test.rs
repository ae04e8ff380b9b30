//! Hermetic scenario runs: UI scenarios against the scripted bank engine,
//! API scenarios against a mock HTTP service.

use std::sync::Arc;

use harness::config::{Credentials, RunConfiguration, Users};
use harness::engine::fake::FakeBank;
use harness::outcome::FailureCapture;
use harness::report::ReportSink;
use harness::runner::{Runner, Suite};
use httpmock::prelude::*;
use serde_json::json;
use suite::scenarios;

fn run_config(api_url: Option<String>) -> Arc<RunConfiguration> {
	Arc::new(RunConfiguration {
		environment: "dev".into(),
		base_url: "https://parabank.parasoft.com/parabank".into(),
		api_url,
		test_customer_id: Some("12212".into()),
		users: Users {
			default: Credentials {
				username: "john".into(),
				password: "demo".into(),
			},
			new_user: None,
		},
		test_data: serde_json::Map::new(),
	})
}

#[tokio::test]
async fn ui_scenarios_pass_against_the_scripted_bank() {
	let bank = FakeBank::parabank();
	let sink = Arc::new(ReportSink::in_memory());
	let screenshots = tempfile::tempdir().unwrap();

	let mut cases = Suite::new();
	scenarios::register(&mut cases);
	cases.retain_matching("ui_");
	assert_eq!(cases.len(), 4);

	let mut runner = Runner::new(run_config(None), Arc::clone(&sink), Some(Box::new(bank.session())));
	runner.observe(Arc::new(FailureCapture::new(Arc::clone(&sink), screenshots.path())));
	let summary = runner.run(cases).await;

	assert_eq!(summary.failed, 0, "journal: {:?}", bank.journal());
	assert_eq!(summary.passed, 4);
	// Four tests, four isolated pages, session closed last.
	assert_eq!(bank.journal().last().map(String::as_str), Some("session closed"));
}

#[tokio::test]
async fn api_scenarios_pass_against_a_mock_service() {
	let server = MockServer::start_async().await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/customers/12212");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({"id": 12212, "firstName": "John", "lastName": "Smith"}));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/customers/12212/accounts");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!([{"id": 13344, "customerId": 12212, "type": "CHECKING", "balance": 515.5}]));
		})
		.await;
	server
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

	let sink = Arc::new(ReportSink::in_memory());
	let mut cases = Suite::new();
	scenarios::register(&mut cases);
	cases.retain_matching("api_");
	assert_eq!(cases.len(), 3);
	assert!(!cases.needs_browser());

	// API-only run: no browser session at all.
	let runner = Runner::new(run_config(Some(server.base_url())), sink, None);
	let summary = runner.run(cases).await;

	assert_eq!(summary.failed, 0);
	assert_eq!(summary.passed, 3);
}

#[tokio::test]
async fn invalid_login_scenario_fails_when_the_error_panel_is_missing() {
	// A bank that accepts every login makes the invalid-credentials scenario
	// fail substantively, which must be recorded as a plain failure.
	let bank = FakeBank::new("invalid_user", "invalid_password");
	let sink = Arc::new(ReportSink::in_memory());
	let screenshots = tempfile::tempdir().unwrap();

	let mut cases = Suite::new();
	scenarios::register(&mut cases);
	cases.retain_matching("ui_login_with_invalid_credentials");
	assert_eq!(cases.len(), 1);

	let mut runner = Runner::new(run_config(None), Arc::clone(&sink), Some(Box::new(bank.session())));
	runner.observe(Arc::new(FailureCapture::new(Arc::clone(&sink), screenshots.path())));
	let summary = runner.run(cases).await;

	assert_eq!(summary.failed, 1);
	// The failure capture ran against the live handle.
	assert!(screenshots.path().join("ui_login_with_invalid_credentials.png").is_file());
}
