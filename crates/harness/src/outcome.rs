//! Test outcome observation and failure capture.
//!
//! The runner drives each test through `SETUP -> BODY -> TEARDOWN` and
//! invokes [`PhaseObserver`] callbacks at every transition. [`FailureCapture`]
//! is the observer that turns a failed body phase into report evidence:
//! best-effort screenshot capture, report attachment, and a file in the
//! screenshots directory. Nothing in this module ever raises past the
//! observer boundary.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::page::PageHandle;
use crate::report::ReportSink;

/// Fixed logical name of the failure screenshot attachment.
pub const FAILURE_SCREENSHOT_NAME: &str = "screenshot_on_failure";

/// Identifier of a single test invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestId(String);

impl TestId {
	pub fn new(name: impl Into<String>) -> Self {
		Self(name.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Filesystem-safe form of the identifier, used for artifact filenames.
	pub fn file_stem(&self) -> String {
		self.0
			.chars()
			.map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
			.collect()
	}
}

impl std::fmt::Display for TestId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
	Setup,
	Body,
	Teardown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
	Passed,
	Failed,
	Skipped,
}

impl TestStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			TestStatus::Passed => "passed",
			TestStatus::Failed => "failed",
			TestStatus::Skipped => "skipped",
		}
	}
}

impl std::fmt::Display for TestStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Terminal record of one phase of one test.
#[derive(Debug, Clone)]
pub struct PhaseOutcome {
	pub phase: TestPhase,
	pub status: TestStatus,
	pub error: Option<String>,
}

impl PhaseOutcome {
	pub fn passed(phase: TestPhase) -> Self {
		Self { phase, status: TestStatus::Passed, error: None }
	}

	pub fn failed(phase: TestPhase, error: impl Into<String>) -> Self {
		Self {
			phase,
			status: TestStatus::Failed,
			error: Some(error.into()),
		}
	}

	pub fn skipped(phase: TestPhase) -> Self {
		Self { phase, status: TestStatus::Skipped, error: None }
	}

	pub fn is_failure(&self) -> bool {
		self.status == TestStatus::Failed
	}
}

/// Observer invoked by the runner at each phase transition.
#[async_trait]
pub trait PhaseObserver: Send + Sync {
	async fn on_setup_done(&self, test: &TestId, outcome: &PhaseOutcome) {
		let _ = (test, outcome);
	}

	/// `page` is the handle created for this test, absent for API-only tests.
	async fn on_body_done(&self, test: &TestId, outcome: &PhaseOutcome, page: Option<&PageHandle>) {
		let _ = (test, outcome, page);
	}

	async fn on_teardown_done(&self, test: &TestId, outcome: &PhaseOutcome) {
		let _ = (test, outcome);
	}
}

/// Captures a screenshot when a test body fails.
///
/// Only a `BODY` phase ending in `Failed` triggers capture; setup and
/// teardown failures are recorded by the runner but produce no screenshot.
/// Every step is independently best-effort: a capture or write error is
/// logged and swallowed, and the recorded test outcome is never altered.
pub struct FailureCapture {
	sink: Arc<ReportSink>,
	screenshots_dir: PathBuf,
}

impl FailureCapture {
	pub fn new(sink: Arc<ReportSink>, screenshots_dir: impl Into<PathBuf>) -> Self {
		Self {
			sink,
			screenshots_dir: screenshots_dir.into(),
		}
	}
}

#[async_trait]
impl PhaseObserver for FailureCapture {
	async fn on_body_done(&self, test: &TestId, outcome: &PhaseOutcome, page: Option<&PageHandle>) {
		if !outcome.is_failure() {
			return;
		}
		let Some(page) = page else {
			debug!(target = "harness", test = %test, "no page handle for failed test, skipping capture");
			return;
		};

		// The traced screenshot wrapper on the handle attaches the same bytes
		// under its own name; both attachments are kept.
		let bytes = match page.screenshot().await {
			Ok(bytes) => bytes,
			Err(err) => {
				warn!(target = "harness", test = %test, error = %err, "failure screenshot capture failed");
				return;
			}
		};

		self.sink.attach_png(test, FAILURE_SCREENSHOT_NAME, bytes.clone());

		let path = self.screenshots_dir.join(format!("{}.png", test.file_stem()));
		if let Err(err) = std::fs::write(&path, &bytes) {
			warn!(
				target = "harness",
				test = %test,
				path = %path.display(),
				error = %err,
				"failure screenshot write failed"
			);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn file_stem_replaces_unsafe_characters() {
		let id = TestId::new("login with spaces/and:colons");
		assert_eq!(id.file_stem(), "login_with_spaces_and_colons");
	}

	#[test]
	fn phase_outcome_constructors_set_status() {
		assert_eq!(PhaseOutcome::passed(TestPhase::Body).status, TestStatus::Passed);
		assert!(PhaseOutcome::failed(TestPhase::Body, "boom").is_failure());
		assert_eq!(PhaseOutcome::skipped(TestPhase::Body).status, TestStatus::Skipped);
	}
}
