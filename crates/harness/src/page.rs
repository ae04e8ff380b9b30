//! Per-test page handles.
//!
//! [`PageHandle::install`] takes the raw engine driver and returns a composed
//! handle with the diagnostic wrappers attached: a console forwarder into the
//! tracing log, a navigation wrapper that records every destination in the
//! report, and a screenshot wrapper that mirrors captured bytes into the
//! report. Installation completes before the handle is handed to the test
//! body, so no operation can be observed unwrapped. The wrappers are
//! transparent: return values and error behavior are identical to the raw
//! driver; the only observable difference is the side-channel attachment.

use std::sync::Arc;

use tracing::debug;

use crate::engine::{ConsoleMessage, PageDriver};
use crate::error::{HarnessError, Result};
use crate::outcome::TestId;
use crate::report::ReportSink;

/// Timeout for wait-then-act interaction helpers.
pub const ACTION_TIMEOUT_MS: u64 = 10_000;

/// Timeout for boolean presence checks.
pub const PRESENCE_TIMEOUT_MS: u64 = 5_000;

/// One isolated tab, exclusively owned by a single test invocation.
pub struct PageHandle {
	driver: Box<dyn PageDriver>,
	sink: Arc<ReportSink>,
	test: TestId,
	navigation_timeout_ms: u64,
}

impl PageHandle {
	/// Wraps `driver` for `test`, installing the console forwarder before the
	/// handle is exposed.
	pub async fn install(
		driver: Box<dyn PageDriver>,
		sink: Arc<ReportSink>,
		test: TestId,
		navigation_timeout_ms: u64,
	) -> Result<Self> {
		let console_test = test.clone();
		driver
			.install_console_forwarder(Box::new(move |message: &ConsoleMessage| {
				debug!(
					target = "browser",
					test = %console_test,
					level = %message.level,
					text = %message.text,
					"console message"
				);
			}))
			.await?;

		Ok(Self {
			driver,
			sink,
			test,
			navigation_timeout_ms,
		})
	}

	pub fn test(&self) -> &TestId {
		&self.test
	}

	/// Navigates to `url`, recording the destination in the report first.
	pub async fn goto(&self, url: &str) -> Result<()> {
		self.sink.attach_text(&self.test, "navigation", format!("Navigating to: {url}"));
		self.driver.goto(url, self.navigation_timeout_ms).await
	}

	/// Captures a screenshot, mirroring the bytes into the report.
	pub async fn screenshot(&self) -> Result<Vec<u8>> {
		let bytes = self.driver.screenshot().await?;
		self.sink.attach_png(&self.test, "screenshot", bytes.clone());
		Ok(bytes)
	}

	pub async fn url(&self) -> Result<String> {
		self.driver.url().await
	}

	pub async fn title(&self) -> Result<String> {
		self.driver.title().await
	}

	pub async fn content(&self) -> Result<String> {
		self.driver.content().await
	}

	/// Waits for `selector` to be visible, then fills it with `text`.
	pub async fn fill(&self, selector: &str, text: &str) -> Result<()> {
		self.driver.fill(selector, text, ACTION_TIMEOUT_MS).await
	}

	/// Waits for `selector` to be visible, then clicks it.
	pub async fn click(&self, selector: &str) -> Result<()> {
		self.driver.click(selector, ACTION_TIMEOUT_MS).await
	}

	pub async fn wait_for_visible(&self, selector: &str) -> Result<()> {
		self.driver.wait_for_visible(selector, ACTION_TIMEOUT_MS).await
	}

	pub async fn text_content(&self, selector: &str) -> Result<String> {
		self.driver.text_content(selector, ACTION_TIMEOUT_MS).await
	}

	/// Presence check: timeout expiry maps to `false`; other failures
	/// propagate.
	pub async fn is_visible(&self, selector: &str) -> Result<bool> {
		match self.driver.wait_for_visible(selector, PRESENCE_TIMEOUT_MS).await {
			Ok(()) => Ok(true),
			Err(HarnessError::Timeout { .. }) => Ok(false),
			Err(other) => Err(other),
		}
	}

	/// Closes the underlying tab. Safe to call more than once.
	pub async fn close(&self) -> Result<()> {
		self.driver.close().await
	}
}
