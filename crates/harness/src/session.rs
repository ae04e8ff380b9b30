//! Session-scoped browser parameters.
//!
//! The provider derives two immutable bundles from the run configuration and
//! the invocation options: launch parameters and context parameters. It does
//! not open or close the browser itself; the runner owns that lifecycle and
//! closes the session exactly once after the last test.

use std::fs;
use std::path::PathBuf;

use url::Url;

use crate::config::RunConfiguration;
use crate::engine::BrowserKind;
use crate::error::{HarnessError, Result};
use crate::layout::ResultsLayout;

/// Hard cap on browser launch time.
pub const LAUNCH_TIMEOUT_MS: u64 = 30_000;

/// Default navigation timeout when the invocation does not set one.
pub const NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Fixed viewport used for every context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
	pub width: u32,
	pub height: u32,
}

impl Default for Viewport {
	fn default() -> Self {
		Self { width: 1366, height: 768 }
	}
}

/// Per-run invocation options, resolved once at process start from the
/// command line and environment.
#[derive(Debug, Clone)]
pub struct InvocationOptions {
	pub browser: BrowserKind,
	pub headless: bool,
	pub slow_mo_ms: u64,
	pub navigation_timeout_ms: u64,
	pub record_video: bool,
}

impl Default for InvocationOptions {
	fn default() -> Self {
		Self {
			browser: BrowserKind::default(),
			headless: false,
			slow_mo_ms: 100,
			navigation_timeout_ms: NAVIGATION_TIMEOUT_MS,
			record_video: false,
		}
	}
}

/// Engine launch parameters.
#[derive(Debug, Clone)]
pub struct LaunchParameters {
	pub kind: BrowserKind,
	pub headless: bool,
	pub slow_mo_ms: u64,
	pub launch_timeout_ms: u64,
}

impl LaunchParameters {
	pub fn default_for(kind: BrowserKind) -> Self {
		Self {
			kind,
			headless: true,
			slow_mo_ms: 0,
			launch_timeout_ms: LAUNCH_TIMEOUT_MS,
		}
	}
}

/// Shared-context parameters.
#[derive(Debug, Clone)]
pub struct ContextParameters {
	pub ignore_tls_errors: bool,
	pub viewport: Viewport,
	pub base_url: Url,
	/// Present only when video recording is toggled on; the directory is
	/// created eagerly at provider construction.
	pub video_dir: Option<PathBuf>,
	pub navigation_timeout_ms: u64,
}

impl ContextParameters {
	/// Context pointed at a localhost application, used by hermetic tests.
	pub fn localhost() -> Self {
		Self {
			ignore_tls_errors: true,
			viewport: Viewport::default(),
			base_url: Url::parse("http://localhost:8080/parabank").expect("static URL parses"),
			video_dir: None,
			navigation_timeout_ms: NAVIGATION_TIMEOUT_MS,
		}
	}
}

/// Owns the two session-scoped bundles; read-only after construction.
#[derive(Debug, Clone)]
pub struct SessionProvider {
	pub launch: LaunchParameters,
	pub context: ContextParameters,
}

impl SessionProvider {
	pub fn new(config: &RunConfiguration, options: &InvocationOptions, layout: &ResultsLayout) -> Result<Self> {
		let base_url = Url::parse(&config.base_url).map_err(|source| HarnessError::BaseUrl {
			url: config.base_url.clone(),
			source,
		})?;

		let video_dir = if options.record_video {
			let dir = layout.root().join("videos");
			fs::create_dir_all(&dir)?;
			Some(dir)
		} else {
			None
		};

		Ok(Self {
			launch: LaunchParameters {
				kind: options.browser,
				headless: options.headless,
				slow_mo_ms: options.slow_mo_ms,
				launch_timeout_ms: LAUNCH_TIMEOUT_MS,
			},
			context: ContextParameters {
				ignore_tls_errors: true,
				viewport: Viewport::default(),
				base_url,
				video_dir,
				navigation_timeout_ms: options.navigation_timeout_ms,
			},
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::{Credentials, Users};

	fn test_config(base_url: &str) -> RunConfiguration {
		RunConfiguration {
			environment: "dev".into(),
			base_url: base_url.into(),
			api_url: None,
			test_customer_id: None,
			users: Users {
				default: Credentials {
					username: "john".into(),
					password: "demo".into(),
				},
				new_user: None,
			},
			test_data: serde_json::Map::new(),
		}
	}

	#[test]
	fn video_dir_absent_when_recording_disabled() {
		let dir = tempfile::tempdir().unwrap();
		let layout = ResultsLayout::create(dir.path().join("results")).unwrap();
		let provider = SessionProvider::new(
			&test_config("https://parabank.parasoft.com/parabank"),
			&InvocationOptions::default(),
			&layout,
		)
		.unwrap();
		assert!(provider.context.video_dir.is_none());
	}

	#[test]
	fn video_dir_created_eagerly_when_recording_enabled() {
		let dir = tempfile::tempdir().unwrap();
		let layout = ResultsLayout::create(dir.path().join("results")).unwrap();
		let options = InvocationOptions {
			record_video: true,
			..Default::default()
		};
		let provider = SessionProvider::new(
			&test_config("https://parabank.parasoft.com/parabank"),
			&options,
			&layout,
		)
		.unwrap();
		let video_dir = provider.context.video_dir.expect("video dir set");
		assert!(video_dir.is_dir());
	}

	#[test]
	fn malformed_base_url_is_rejected() {
		let dir = tempfile::tempdir().unwrap();
		let layout = ResultsLayout::create(dir.path().join("results")).unwrap();
		let err = SessionProvider::new(&test_config("not a url"), &InvocationOptions::default(), &layout).unwrap_err();
		assert!(matches!(err, HarnessError::BaseUrl { .. }));
	}
}
