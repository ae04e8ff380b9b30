mod cli;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use harness::outcome::FailureCapture;
use harness::report::ReportSink;
use harness::runner::{RunSummary, Runner, Suite};
use harness::session::{InvocationOptions, NAVIGATION_TIMEOUT_MS, SessionProvider};
use harness::{EnvOverrides, ResultsLayout, engine};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();
	logging::init(cli.verbose);

	match run(cli).await {
		Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
		Ok(_) => ExitCode::FAILURE,
		Err(err) => {
			eprintln!("error: {err:#}");
			ExitCode::FAILURE
		}
	}
}

async fn run(cli: Cli) -> anyhow::Result<RunSummary> {
	// Configuration resolves before any browser session exists; a missing
	// environment aborts the whole run here.
	let overrides = EnvOverrides::from_process_env();
	let config = Arc::new(harness::resolve(&cli.config_dir, cli.environment.as_deref(), &overrides)?);
	tracing::info!(
		target = "harness",
		environment = %config.environment,
		base_url = %config.base_url,
		"configuration resolved"
	);

	let layout = ResultsLayout::create(&cli.results_dir)?;
	let sink = Arc::new(ReportSink::persistent(layout.raw()));

	let mut cases = Suite::new();
	suite::scenarios::register(&mut cases);
	if let Some(filter) = &cli.filter {
		cases.retain_matching(filter);
	}
	anyhow::ensure!(!cases.is_empty(), "no test cases match the requested filter");

	let options = InvocationOptions {
		browser: cli.browser,
		headless: cli.headless,
		slow_mo_ms: cli.slow_mo,
		navigation_timeout_ms: NAVIGATION_TIMEOUT_MS,
		record_video: cli.record_video,
	};

	// API-only runs never launch a browser.
	let session = if cases.needs_browser() {
		let provider = SessionProvider::new(&config, &options, &layout)?;
		Some(engine::launch(&provider.launch, &provider.context).await?)
	} else {
		None
	};

	let mut runner = Runner::new(Arc::clone(&config), Arc::clone(&sink), session)
		.with_navigation_timeout(options.navigation_timeout_ms);
	runner.observe(Arc::new(FailureCapture::new(Arc::clone(&sink), layout.screenshots())));

	let summary = runner.run(cases).await;
	tracing::info!(
		target = "harness",
		passed = summary.passed,
		failed = summary.failed,
		skipped = summary.skipped,
		"run complete"
	);
	Ok(summary)
}
