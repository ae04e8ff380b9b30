//! Sequential test runner.
//!
//! Owns the per-worker browser session and drives every registered case
//! through `SETUP -> BODY -> TEARDOWN`, invoking the phase observers at each
//! transition. Tests run one at a time to completion; the session is closed
//! exactly once after the last test, whatever the bodies did (panics
//! included).

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{error, info, warn};

use crate::config::RunConfiguration;
use crate::engine::BrowserSession;
use crate::outcome::{PhaseObserver, PhaseOutcome, TestId, TestPhase, TestStatus};
use crate::page::PageHandle;
use crate::report::ReportSink;
use crate::session::NAVIGATION_TIMEOUT_MS;

/// What a test body needs from the harness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestKind {
	/// Gets a fresh [`PageHandle`] at setup.
	Ui,
	/// No browser involvement; the reporter is a no-op for these.
	Api,
}

pub type TestBody = for<'a> fn(&'a mut TestContext) -> BoxFuture<'a, anyhow::Result<()>>;

/// One registered test case.
pub struct TestCase {
	name: &'static str,
	kind: TestKind,
	body: TestBody,
}

impl TestCase {
	pub fn ui(name: &'static str, body: TestBody) -> Self {
		Self { name, kind: TestKind::Ui, body }
	}

	pub fn api(name: &'static str, body: TestBody) -> Self {
		Self { name, kind: TestKind::Api, body }
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn kind(&self) -> TestKind {
		self.kind
	}
}

/// Ordered collection of cases for one run.
#[derive(Default)]
pub struct Suite {
	cases: Vec<TestCase>,
}

impl Suite {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn case(&mut self, case: TestCase) {
		self.cases.push(case);
	}

	/// Keeps only cases whose name contains `filter`.
	pub fn retain_matching(&mut self, filter: &str) {
		self.cases.retain(|case| case.name.contains(filter));
	}

	pub fn is_empty(&self) -> bool {
		self.cases.is_empty()
	}

	pub fn len(&self) -> usize {
		self.cases.len()
	}

	/// True when at least one case needs a browser session.
	pub fn needs_browser(&self) -> bool {
		self.cases.iter().any(|case| case.kind == TestKind::Ui)
	}
}

/// Run-scoped state handed to each test body.
pub struct TestContext {
	pub config: Arc<RunConfiguration>,
	pub sink: Arc<ReportSink>,
	test: TestId,
	page: Option<PageHandle>,
}

impl TestContext {
	pub fn test(&self) -> &TestId {
		&self.test
	}

	/// The page handle created for this test.
	///
	/// Fails for API-only cases, which never get one.
	pub fn page(&self) -> anyhow::Result<&PageHandle> {
		self.page
			.as_ref()
			.ok_or_else(|| anyhow::anyhow!("test '{}' has no page handle (registered as an API case?)", self.test))
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
	pub passed: usize,
	pub failed: usize,
	pub skipped: usize,
}

impl RunSummary {
	pub fn is_success(&self) -> bool {
		self.failed == 0
	}

	pub fn total(&self) -> usize {
		self.passed + self.failed + self.skipped
	}
}

/// Per-worker sequential runner.
pub struct Runner {
	config: Arc<RunConfiguration>,
	sink: Arc<ReportSink>,
	session: Option<Box<dyn BrowserSession>>,
	observers: Vec<Arc<dyn PhaseObserver>>,
	navigation_timeout_ms: u64,
}

impl Runner {
	/// `session` is `None` for API-only runs; UI cases then fail in setup.
	pub fn new(config: Arc<RunConfiguration>, sink: Arc<ReportSink>, session: Option<Box<dyn BrowserSession>>) -> Self {
		Self {
			config,
			sink,
			session,
			observers: Vec::new(),
			navigation_timeout_ms: NAVIGATION_TIMEOUT_MS,
		}
	}

	pub fn with_navigation_timeout(mut self, timeout_ms: u64) -> Self {
		self.navigation_timeout_ms = timeout_ms;
		self
	}

	pub fn observe(&mut self, observer: Arc<dyn PhaseObserver>) {
		self.observers.push(observer);
	}

	/// Runs every case to completion, then closes the session.
	pub async fn run(mut self, suite: Suite) -> RunSummary {
		let mut summary = RunSummary::default();

		for case in suite.cases {
			let test = TestId::new(case.name);
			info!(target = "harness", test = %test, "running");

			let (setup, page) = self.set_up(&case, &test).await;
			for observer in &self.observers {
				observer.on_setup_done(&test, &setup).await;
			}

			let mut context = TestContext {
				config: Arc::clone(&self.config),
				sink: Arc::clone(&self.sink),
				test: test.clone(),
				page,
			};

			let body = if setup.is_failure() {
				PhaseOutcome::skipped(TestPhase::Body)
			} else {
				match AssertUnwindSafe((case.body)(&mut context)).catch_unwind().await {
					Ok(Ok(())) => PhaseOutcome::passed(TestPhase::Body),
					Ok(Err(err)) => PhaseOutcome::failed(TestPhase::Body, format!("{err:#}")),
					Err(panic) => PhaseOutcome::failed(TestPhase::Body, panic_message(&panic)),
				}
			};
			for observer in &self.observers {
				observer.on_body_done(&test, &body, context.page.as_ref()).await;
			}

			let teardown = match context.page.take() {
				Some(page) => match page.close().await {
					Ok(()) => PhaseOutcome::passed(TestPhase::Teardown),
					Err(err) => PhaseOutcome::failed(TestPhase::Teardown, err.to_string()),
				},
				None => PhaseOutcome::passed(TestPhase::Teardown),
			};
			for observer in &self.observers {
				observer.on_teardown_done(&test, &teardown).await;
			}

			let status = worst(&[&setup, &body, &teardown]);
			if let Err(err) = self.sink.persist(&test, status) {
				warn!(target = "harness", test = %test, error = %err, "report record persist failed");
			}

			match status {
				TestStatus::Passed => {
					info!(target = "harness", test = %test, "passed");
					summary.passed += 1;
				}
				TestStatus::Failed => {
					let detail = [&setup, &body, &teardown]
						.into_iter()
						.find_map(|outcome| outcome.error.as_deref())
						.unwrap_or("unknown failure");
					error!(target = "harness", test = %test, error = detail, "failed");
					summary.failed += 1;
				}
				TestStatus::Skipped => {
					info!(target = "harness", test = %test, "skipped");
					summary.skipped += 1;
				}
			}
		}

		if let Some(session) = self.session.take() {
			if let Err(err) = session.close().await {
				warn!(target = "harness", error = %err, "browser session close failed");
			}
		}

		summary
	}

	async fn set_up(&self, case: &TestCase, test: &TestId) -> (PhaseOutcome, Option<PageHandle>) {
		if case.kind != TestKind::Ui {
			return (PhaseOutcome::passed(TestPhase::Setup), None);
		}
		let Some(session) = &self.session else {
			return (
				PhaseOutcome::failed(TestPhase::Setup, "UI test requires a browser session and none was launched"),
				None,
			);
		};
		let driver = match session.new_page().await {
			Ok(driver) => driver,
			Err(err) => return (PhaseOutcome::failed(TestPhase::Setup, err.to_string()), None),
		};
		match PageHandle::install(driver, Arc::clone(&self.sink), test.clone(), self.navigation_timeout_ms).await {
			Ok(page) => (PhaseOutcome::passed(TestPhase::Setup), Some(page)),
			Err(err) => (PhaseOutcome::failed(TestPhase::Setup, err.to_string()), None),
		}
	}
}

fn worst(outcomes: &[&PhaseOutcome]) -> TestStatus {
	if outcomes.iter().any(|outcome| outcome.status == TestStatus::Failed) {
		TestStatus::Failed
	} else if outcomes.iter().any(|outcome| outcome.status == TestStatus::Skipped) {
		TestStatus::Skipped
	} else {
		TestStatus::Passed
	}
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
	if let Some(message) = panic.downcast_ref::<&str>() {
		format!("panicked: {message}")
	} else if let Some(message) = panic.downcast_ref::<String>() {
		format!("panicked: {message}")
	} else {
		"panicked".to_owned()
	}
}
