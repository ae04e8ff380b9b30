//! Command-line surface of the test-run entry point.

use std::path::PathBuf;

use clap::Parser;
use harness::BrowserKind;

/// ParaBank end-to-end test runner.
#[derive(Parser, Debug)]
#[command(name = "pb-test")]
#[command(about = "ParaBank end-to-end UI and API test runner")]
#[command(version)]
pub struct Cli {
	/// Browser engine to run UI tests with.
	#[arg(long, value_enum, default_value_t = BrowserKind::Chromium, env = "BROWSER")]
	pub browser: BrowserKind,

	/// Run the browser headless.
	#[arg(long, env = "HEADLESS")]
	pub headless: bool,

	/// Slow down each browser operation by this many milliseconds.
	#[arg(long, value_name = "MS", default_value_t = 100)]
	pub slow_mo: u64,

	/// Environment to run against (dev, qa, ...).
	#[arg(long = "env", value_name = "NAME", env = "TEST_ENV")]
	pub environment: Option<String>,

	/// Only run cases whose name contains this substring.
	#[arg(long, value_name = "SUBSTRING")]
	pub filter: Option<String>,

	/// Record context video (when the engine supports it).
	#[arg(long, env = "RECORD_VIDEO")]
	pub record_video: bool,

	/// Directory holding per-environment configuration resources.
	#[arg(long, value_name = "DIR", default_value = "config")]
	pub config_dir: PathBuf,

	/// Results root directory.
	#[arg(long, value_name = "DIR", env = "TEST_RESULTS_DIR", default_value = "test-results")]
	pub results_dir: PathBuf,

	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_the_documented_invocation_surface() {
		let cli = Cli::parse_from(["pb-test"]);
		assert_eq!(cli.browser, BrowserKind::Chromium);
		assert!(!cli.headless);
		assert_eq!(cli.slow_mo, 100);
		assert_eq!(cli.config_dir, PathBuf::from("config"));
	}

	#[test]
	fn browser_and_environment_are_selectable() {
		let cli = Cli::parse_from(["pb-test", "--browser", "firefox", "--env", "qa", "--headless"]);
		assert_eq!(cli.browser, BrowserKind::Firefox);
		assert_eq!(cli.environment.as_deref(), Some("qa"));
		assert!(cli.headless);
	}

	#[test]
	fn unknown_browser_is_rejected() {
		assert!(Cli::try_parse_from(["pb-test", "--browser", "netscape"]).is_err());
	}
}
