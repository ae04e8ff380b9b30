//! Chromium adapter over the DevTools protocol.
//!
//! Compiled only with the `live-browser` feature. One launched browser
//! process backs the session; each page driver wraps a devtools tab.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use chromiumoxide::cdp::js_protocol::runtime::{ConsoleApiCalledType, EventConsoleApiCalled};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{BrowserSession, ConsoleForwarder, ConsoleLevel, ConsoleMessage, PageDriver};
use crate::error::{HarnessError, Result};
use crate::session::{ContextParameters, LaunchParameters};

pub(crate) async fn launch_chromium(
	launch: &LaunchParameters,
	context: &ContextParameters,
) -> Result<Box<dyn BrowserSession>> {
	let mut builder = BrowserConfig::builder().window_size(context.viewport.width, context.viewport.height);
	if !launch.headless {
		builder = builder.with_head();
	}
	if context.ignore_tls_errors {
		builder = builder.arg("--ignore-certificate-errors");
	}
	if context.video_dir.is_some() {
		debug!(
			target = "harness",
			"video recording is not supported by the chromium adapter; directory left unused"
		);
	}
	let config = builder.build().map_err(|e| HarnessError::BrowserLaunch(e.to_string()))?;

	let (browser, mut handler) =
		tokio::time::timeout(Duration::from_millis(launch.launch_timeout_ms), Browser::launch(config))
			.await
			.map_err(|_| HarnessError::Timeout {
				ms: launch.launch_timeout_ms,
				condition: "browser launch".into(),
			})?
			.map_err(|e| HarnessError::BrowserLaunch(e.to_string()))?;

	let handler_task = tokio::spawn(async move {
		while let Some(event) = handler.next().await {
			if event.is_err() {
				break;
			}
		}
	});

	Ok(Box::new(CdpSession {
		browser: tokio::sync::Mutex::new(browser),
		handler_task,
		slow_mo_ms: launch.slow_mo_ms,
		closed: AtomicBool::new(false),
	}))
}

struct CdpSession {
	browser: tokio::sync::Mutex<Browser>,
	handler_task: JoinHandle<()>,
	slow_mo_ms: u64,
	closed: AtomicBool,
}

#[async_trait]
impl BrowserSession for CdpSession {
	async fn new_page(&self) -> Result<Box<dyn PageDriver>> {
		if self.closed.load(Ordering::SeqCst) {
			return Err(HarnessError::Engine("session is closed".into()));
		}
		let browser = self.browser.lock().await;
		let page = browser
			.new_page("about:blank")
			.await
			.map_err(|e| HarnessError::Engine(e.to_string()))?;
		Ok(Box::new(CdpPage {
			page,
			slow_mo_ms: self.slow_mo_ms,
			closed: AtomicBool::new(false),
			console_task: parking_lot::Mutex::new(None),
		}))
	}

	async fn close(&self) -> Result<()> {
		if self.closed.swap(true, Ordering::SeqCst) {
			return Ok(());
		}
		let mut browser = self.browser.lock().await;
		let result = browser.close().await.map_err(|e| HarnessError::Engine(e.to_string()));
		self.handler_task.abort();
		result.map(|_| ())
	}
}

struct CdpPage {
	page: chromiumoxide::Page,
	slow_mo_ms: u64,
	closed: AtomicBool,
	console_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl CdpPage {
	fn ensure_open(&self) -> Result<()> {
		if self.closed.load(Ordering::SeqCst) {
			return Err(HarnessError::PageClosed);
		}
		Ok(())
	}

	async fn pace(&self) {
		if self.slow_mo_ms > 0 {
			tokio::time::sleep(Duration::from_millis(self.slow_mo_ms)).await;
		}
	}

	async fn wait_for_element(&self, selector: &str, timeout_ms: u64) -> Result<chromiumoxide::Element> {
		let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
		loop {
			match self.page.find_element(selector).await {
				Ok(element) => return Ok(element),
				Err(_) if tokio::time::Instant::now() < deadline => {
					tokio::time::sleep(Duration::from_millis(100)).await;
				}
				Err(_) => {
					return Err(HarnessError::Timeout {
						ms: timeout_ms,
						condition: format!("visibility of {selector}"),
					});
				}
			}
		}
	}
}

#[async_trait]
impl PageDriver for CdpPage {
	async fn goto(&self, url: &str, timeout_ms: u64) -> Result<()> {
		self.ensure_open()?;
		self.pace().await;
		match tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url.to_owned())).await {
			Ok(Ok(_)) => Ok(()),
			Ok(Err(err)) => Err(HarnessError::Navigation {
				url: url.to_owned(),
				source: anyhow::anyhow!(err),
			}),
			Err(_) => Err(HarnessError::Timeout {
				ms: timeout_ms,
				condition: format!("navigation to {url}"),
			}),
		}
	}

	async fn url(&self) -> Result<String> {
		self.ensure_open()?;
		let url = self.page.url().await.map_err(|e| HarnessError::Engine(e.to_string()))?;
		Ok(url.unwrap_or_default())
	}

	async fn title(&self) -> Result<String> {
		self.ensure_open()?;
		let title = self.page.get_title().await.map_err(|e| HarnessError::Engine(e.to_string()))?;
		Ok(title.unwrap_or_default())
	}

	async fn content(&self) -> Result<String> {
		self.ensure_open()?;
		self.page.content().await.map_err(|e| HarnessError::Engine(e.to_string()))
	}

	async fn fill(&self, selector: &str, text: &str, timeout_ms: u64) -> Result<()> {
		self.ensure_open()?;
		self.pace().await;
		let element = self.wait_for_element(selector, timeout_ms).await?;
		element.click().await.map_err(|e| HarnessError::Engine(e.to_string()))?;
		element.type_str(text).await.map_err(|e| HarnessError::Engine(e.to_string()))?;
		Ok(())
	}

	async fn click(&self, selector: &str, timeout_ms: u64) -> Result<()> {
		self.ensure_open()?;
		self.pace().await;
		let element = self.wait_for_element(selector, timeout_ms).await?;
		element.click().await.map_err(|e| HarnessError::Engine(e.to_string()))?;
		Ok(())
	}

	async fn wait_for_visible(&self, selector: &str, timeout_ms: u64) -> Result<()> {
		self.ensure_open()?;
		self.wait_for_element(selector, timeout_ms).await.map(|_| ())
	}

	async fn text_content(&self, selector: &str, timeout_ms: u64) -> Result<String> {
		self.ensure_open()?;
		let element = self.wait_for_element(selector, timeout_ms).await?;
		let text = element.inner_text().await.map_err(|e| HarnessError::Engine(e.to_string()))?;
		Ok(text.unwrap_or_default())
	}

	async fn screenshot(&self) -> Result<Vec<u8>> {
		self.ensure_open()?;
		let params = CaptureScreenshotParams::builder().format(CaptureScreenshotFormat::Png).build();
		let response = self
			.page
			.execute(params)
			.await
			.map_err(|e| HarnessError::Screenshot(e.to_string()))?;
		base64::engine::general_purpose::STANDARD
			.decode(&response.data)
			.map_err(|e| HarnessError::Screenshot(e.to_string()))
	}

	async fn install_console_forwarder(&self, forwarder: ConsoleForwarder) -> Result<()> {
		self.ensure_open()?;
		let mut events = self
			.page
			.event_listener::<EventConsoleApiCalled>()
			.await
			.map_err(|e| HarnessError::Engine(e.to_string()))?;
		let task = tokio::spawn(async move {
			while let Some(event) = events.next().await {
				let text = event
					.args
					.iter()
					.filter_map(|arg| arg.value.as_ref().map(ToString::to_string))
					.collect::<Vec<_>>()
					.join(" ");
				let level = match event.r#type {
					ConsoleApiCalledType::Error => ConsoleLevel::Error,
					ConsoleApiCalledType::Warning => ConsoleLevel::Warning,
					ConsoleApiCalledType::Info => ConsoleLevel::Info,
					ConsoleApiCalledType::Debug => ConsoleLevel::Debug,
					_ => ConsoleLevel::Log,
				};
				forwarder(&ConsoleMessage { level, text });
			}
		});
		if let Some(previous) = self.console_task.lock().replace(task) {
			previous.abort();
		}
		Ok(())
	}

	async fn close(&self) -> Result<()> {
		if self.closed.swap(true, Ordering::SeqCst) {
			return Ok(());
		}
		if let Some(task) = self.console_task.lock().take() {
			task.abort();
		}
		self.page
			.clone()
			.close()
			.await
			.map_err(|e| HarnessError::Engine(e.to_string()))
	}
}
