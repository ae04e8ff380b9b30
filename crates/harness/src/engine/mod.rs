//! Browser engine capability layer.
//!
//! The engine itself is an external collaborator: this module defines the
//! closed set of engines, the capability traits the harness consumes
//! ([`BrowserSession`], [`PageDriver`]), and an explicit dispatch table from
//! engine kind to launch function. Engines not compiled into the build fail
//! fast with [`HarnessError::EngineUnavailable`] instead of an opaque lookup
//! failure.

#[cfg(feature = "live-browser")]
pub mod cdp;
pub mod fake;

use async_trait::async_trait;
use clap::ValueEnum;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};
use crate::session::{ContextParameters, LaunchParameters};

/// Browser engine selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
	/// Chromium-based browser (Chrome, Edge)
	#[default]
	Chromium,
	/// Mozilla Firefox
	Firefox,
	/// WebKit (Safari)
	Webkit,
}

impl std::fmt::Display for BrowserKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			BrowserKind::Chromium => write!(f, "chromium"),
			BrowserKind::Firefox => write!(f, "firefox"),
			BrowserKind::Webkit => write!(f, "webkit"),
		}
	}
}

/// Severity of a forwarded browser console message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleLevel {
	Log,
	Info,
	Warning,
	Error,
	Debug,
}

impl std::fmt::Display for ConsoleLevel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ConsoleLevel::Log => write!(f, "log"),
			ConsoleLevel::Info => write!(f, "info"),
			ConsoleLevel::Warning => write!(f, "warn"),
			ConsoleLevel::Error => write!(f, "error"),
			ConsoleLevel::Debug => write!(f, "debug"),
		}
	}
}

/// A console message emitted by the page under test.
#[derive(Clone, Debug)]
pub struct ConsoleMessage {
	pub level: ConsoleLevel,
	pub text: String,
}

/// Callback receiving every console message from one page.
pub type ConsoleForwarder = Box<dyn Fn(&ConsoleMessage) + Send + Sync>;

/// One isolated browser tab.
///
/// Every blocking operation takes a caller-specified timeout and surfaces
/// expiry as [`HarnessError::Timeout`] rather than hanging. `close` is
/// idempotent; other operations on a closed page fail with
/// [`HarnessError::PageClosed`].
#[async_trait]
pub trait PageDriver: Send + Sync {
	async fn goto(&self, url: &str, timeout_ms: u64) -> Result<()>;
	async fn url(&self) -> Result<String>;
	async fn title(&self) -> Result<String>;
	async fn content(&self) -> Result<String>;
	async fn fill(&self, selector: &str, text: &str, timeout_ms: u64) -> Result<()>;
	async fn click(&self, selector: &str, timeout_ms: u64) -> Result<()>;
	async fn wait_for_visible(&self, selector: &str, timeout_ms: u64) -> Result<()>;
	async fn text_content(&self, selector: &str, timeout_ms: u64) -> Result<String>;
	async fn screenshot(&self) -> Result<Vec<u8>>;
	async fn install_console_forwarder(&self, forwarder: ConsoleForwarder) -> Result<()>;
	async fn close(&self) -> Result<()>;
}

/// The process-lifetime browser session: one browser plus one shared context.
///
/// Outlives every page derived from it; torn down exactly once by the runner
/// after the last test completes.
#[async_trait]
pub trait BrowserSession: Send + Sync {
	async fn new_page(&self) -> Result<Box<dyn PageDriver>>;
	async fn close(&self) -> Result<()>;
}

type LaunchFn = for<'a> fn(&'a LaunchParameters, &'a ContextParameters) -> BoxFuture<'a, Result<Box<dyn BrowserSession>>>;

fn launcher(kind: BrowserKind) -> Option<LaunchFn> {
	match kind {
		#[cfg(feature = "live-browser")]
		BrowserKind::Chromium => Some(|launch, context| Box::pin(cdp::launch_chromium(launch, context))),
		_ => None,
	}
}

/// Launches the engine named by `launch.kind` through the dispatch table.
pub async fn launch(launch: &LaunchParameters, context: &ContextParameters) -> Result<Box<dyn BrowserSession>> {
	match launcher(launch.kind) {
		Some(launch_fn) => launch_fn(launch, context).await,
		None => Err(HarnessError::EngineUnavailable { kind: launch.kind }),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn browser_kind_round_trips_through_serde() {
		let json = serde_json::to_string(&BrowserKind::Firefox).unwrap();
		assert_eq!(json, "\"firefox\"");
		let back: BrowserKind = serde_json::from_str(&json).unwrap();
		assert_eq!(back, BrowserKind::Firefox);
	}

	#[cfg(not(feature = "live-browser"))]
	#[tokio::test]
	async fn launch_without_compiled_engine_fails_fast() {
		let launch_params = LaunchParameters::default_for(BrowserKind::Webkit);
		let context = ContextParameters::localhost();
		let err = match launch(&launch_params, &context).await {
			Ok(_) => panic!("expected launch to fail"),
			Err(e) => e,
		};
		match err {
			HarnessError::EngineUnavailable { kind } => assert_eq!(kind, BrowserKind::Webkit),
			other => panic!("expected EngineUnavailable, got {other}"),
		}
	}
}
