//! Scripted in-memory bank engine.
//!
//! A small state machine emulating the ParaBank login, logout, and
//! registration flows, used for hermetic harness and suite tests. All
//! lifecycle events (page open/close, navigation, screenshot attempts) are
//! recorded in a shared journal so tests can assert on ordering without
//! reaching into a boxed driver.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{BrowserSession, ConsoleForwarder, ConsoleLevel, ConsoleMessage, PageDriver};
use crate::error::{HarnessError, Result};

pub const INVALID_LOGIN_ERROR: &str = "The username and password could not be verified.";
pub const EMPTY_LOGIN_ERROR: &str = "Please enter a username and password.";
pub const USERNAME_TAKEN_ERROR: &str = "This username already exists.";
pub const PASSWORD_MISMATCH_ERROR: &str = "Passwords did not match.";
pub const REGISTER_SUCCESS: &str = "Your account was created successfully. You are now logged in.";

const USERNAME_INPUT: &str = "input[name='username']";
const PASSWORD_INPUT: &str = "input[name='password']";
const LOGIN_BUTTON: &str = "input[type='submit'][value='Log In']";
const ERROR_PANEL: &str = ".error";
const LOGOUT_LINK: &str = "a[href*='logout.htm']";
const REGISTER_LINK: &str = "a[href*='register.htm']";
const PANEL_TITLE: &str = "#rightPanel h1";
const PANEL_TEXT: &str = "#rightPanel p";
const REGISTER_BUTTON: &str = "input[type='submit'][value='Register']";

const REGISTER_INPUTS: &[&str] = &[
	"input[id='customer.firstName']",
	"input[id='customer.lastName']",
	"input[id='customer.address.street']",
	"input[id='customer.address.city']",
	"input[id='customer.address.state']",
	"input[id='customer.address.zipCode']",
	"input[id='customer.phoneNumber']",
	"input[id='customer.ssn']",
	"input[id='customer.username']",
	"input[id='customer.password']",
	"input[id='repeatedPassword']",
];

const REGISTER_REQUIRED: &[(&str, &str)] = &[
	("input[id='customer.firstName']", "First name"),
	("input[id='customer.lastName']", "Last name"),
	("input[id='customer.address.street']", "Address"),
	("input[id='customer.address.city']", "City"),
	("input[id='customer.address.state']", "State"),
	("input[id='customer.address.zipCode']", "Zip Code"),
	("input[id='customer.ssn']", "Social Security Number"),
	("input[id='customer.username']", "Username"),
	("input[id='customer.password']", "Password"),
];

#[derive(Debug, Clone)]
enum View {
	Blank,
	LoginForm { error: Option<String> },
	AccountsOverview,
	RegisterForm { error: Option<String> },
	RegisterComplete { username: String },
}

struct BankState {
	accounts: HashMap<String, String>,
	journal: Vec<String>,
	fail_screenshots: bool,
	next_page: usize,
}

/// Shared scripted backend. Cloning shares the same bank state.
#[derive(Clone)]
pub struct FakeBank {
	state: Arc<Mutex<BankState>>,
}

impl FakeBank {
	pub fn new(username: &str, password: &str) -> Self {
		let mut accounts = HashMap::new();
		accounts.insert(username.to_owned(), password.to_owned());
		Self {
			state: Arc::new(Mutex::new(BankState {
				accounts,
				journal: Vec::new(),
				fail_screenshots: false,
				next_page: 1,
			})),
		}
	}

	/// Bank seeded with the well-known demo account.
	pub fn parabank() -> Self {
		Self::new("john", "demo")
	}

	/// Session handle over this bank.
	pub fn session(&self) -> FakeBankSession {
		FakeBankSession {
			bank: self.clone(),
			closed: AtomicBool::new(false),
		}
	}

	/// Opens a page outside any session, for driving the raw driver directly.
	pub fn open_page(&self) -> FakePage {
		let id = {
			let mut state = self.state.lock();
			let id = state.next_page;
			state.next_page += 1;
			state.journal.push(format!("page {id} opened"));
			id
		};
		FakePage {
			bank: self.clone(),
			id,
			page: Mutex::new(PageState {
				url: String::new(),
				fields: HashMap::new(),
				view: View::Blank,
			}),
			forwarder: Mutex::new(None),
			closed: AtomicBool::new(false),
		}
	}

	/// Ordered lifecycle journal across all pages of this bank.
	pub fn journal(&self) -> Vec<String> {
		self.state.lock().journal.clone()
	}

	pub fn screenshot_attempts(&self) -> usize {
		self.state
			.lock()
			.journal
			.iter()
			.filter(|entry| entry.ends_with("screenshot"))
			.count()
	}

	/// Makes every subsequent screenshot attempt fail.
	pub fn set_fail_screenshots(&self, fail: bool) {
		self.state.lock().fail_screenshots = fail;
	}

	fn record(&self, entry: String) {
		self.state.lock().journal.push(entry);
	}
}

pub struct FakeBankSession {
	bank: FakeBank,
	closed: AtomicBool,
}

#[async_trait]
impl BrowserSession for FakeBankSession {
	async fn new_page(&self) -> Result<Box<dyn PageDriver>> {
		if self.closed.load(Ordering::SeqCst) {
			return Err(HarnessError::Engine("session is closed".into()));
		}
		Ok(Box::new(self.bank.open_page()))
	}

	async fn close(&self) -> Result<()> {
		if !self.closed.swap(true, Ordering::SeqCst) {
			self.bank.record("session closed".into());
		}
		Ok(())
	}
}

struct PageState {
	url: String,
	fields: HashMap<String, String>,
	view: View,
}

pub struct FakePage {
	bank: FakeBank,
	id: usize,
	page: Mutex<PageState>,
	forwarder: Mutex<Option<ConsoleForwarder>>,
	closed: AtomicBool,
}

impl FakePage {
	fn ensure_open(&self) -> Result<()> {
		if self.closed.load(Ordering::SeqCst) {
			return Err(HarnessError::PageClosed);
		}
		Ok(())
	}

	fn emit_console(&self, level: ConsoleLevel, text: String) {
		if let Some(forwarder) = self.forwarder.lock().as_ref() {
			forwarder(&ConsoleMessage { level, text });
		}
	}

	fn visible(view: &View, selector: &str) -> bool {
		match view {
			View::Blank => false,
			View::LoginForm { error } => match selector {
				USERNAME_INPUT | PASSWORD_INPUT | LOGIN_BUTTON | REGISTER_LINK => true,
				ERROR_PANEL => error.is_some(),
				_ => false,
			},
			View::AccountsOverview => matches!(selector, LOGOUT_LINK | PANEL_TITLE),
			View::RegisterForm { error } => {
				REGISTER_INPUTS.contains(&selector)
					|| selector == REGISTER_BUTTON
					|| (selector == ERROR_PANEL && error.is_some())
			}
			View::RegisterComplete { .. } => matches!(selector, LOGOUT_LINK | PANEL_TITLE | PANEL_TEXT),
		}
	}

	fn require_visible(&self, state: &PageState, selector: &str, timeout_ms: u64) -> Result<()> {
		if Self::visible(&state.view, selector) {
			Ok(())
		} else {
			Err(HarnessError::Timeout {
				ms: timeout_ms,
				condition: format!("visibility of {selector}"),
			})
		}
	}

	fn submit_login(&self, state: &mut PageState) {
		let username = state.fields.get(USERNAME_INPUT).cloned().unwrap_or_default();
		let password = state.fields.get(PASSWORD_INPUT).cloned().unwrap_or_default();
		if username.is_empty() || password.is_empty() {
			state.view = View::LoginForm {
				error: Some(EMPTY_LOGIN_ERROR.to_owned()),
			};
			return;
		}
		let known = self.bank.state.lock().accounts.get(&username) == Some(&password);
		if known {
			self.bank.record(format!("page {} login {username}", self.id));
			state.view = View::AccountsOverview;
			state.url = rewrite_path(&state.url, "overview.htm");
		} else {
			state.view = View::LoginForm {
				error: Some(INVALID_LOGIN_ERROR.to_owned()),
			};
		}
	}

	fn submit_registration(&self, state: &mut PageState) {
		for (selector, label) in REGISTER_REQUIRED {
			if state.fields.get(*selector).is_none_or(|value| value.is_empty()) {
				state.view = View::RegisterForm {
					error: Some(format!("{label} is required.")),
				};
				return;
			}
		}
		let password = state.fields.get("input[id='customer.password']").cloned().unwrap_or_default();
		let confirm = state.fields.get("input[id='repeatedPassword']").cloned().unwrap_or_default();
		if password != confirm {
			state.view = View::RegisterForm {
				error: Some(PASSWORD_MISMATCH_ERROR.to_owned()),
			};
			return;
		}
		let username = state.fields.get("input[id='customer.username']").cloned().unwrap_or_default();
		let mut bank = self.bank.state.lock();
		if bank.accounts.contains_key(&username) {
			drop(bank);
			state.view = View::RegisterForm {
				error: Some(USERNAME_TAKEN_ERROR.to_owned()),
			};
			return;
		}
		bank.accounts.insert(username.clone(), password);
		bank.journal.push(format!("page {} registered {username}", self.id));
		drop(bank);
		state.view = View::RegisterComplete { username };
	}
}

#[async_trait]
impl PageDriver for FakePage {
	async fn goto(&self, url: &str, _timeout_ms: u64) -> Result<()> {
		self.ensure_open()?;
		self.bank.record(format!("page {} goto {url}", self.id));
		{
			let mut state = self.page.lock();
			state.url = url.to_owned();
			state.fields.clear();
			state.view = if url.contains("register.htm") {
				View::RegisterForm { error: None }
			} else if url.contains("index.htm") || url.trim_end_matches('/').ends_with("/parabank") {
				View::LoginForm { error: None }
			} else {
				View::Blank
			};
		}
		self.emit_console(ConsoleLevel::Log, format!("loaded {url}"));
		Ok(())
	}

	async fn url(&self) -> Result<String> {
		self.ensure_open()?;
		Ok(self.page.lock().url.clone())
	}

	async fn title(&self) -> Result<String> {
		self.ensure_open()?;
		let title = match &self.page.lock().view {
			View::Blank => "ParaBank",
			View::LoginForm { .. } => "ParaBank | Welcome | Online Banking",
			View::AccountsOverview => "ParaBank | Accounts Overview",
			View::RegisterForm { .. } => "ParaBank | Register for Free Online Account Access",
			View::RegisterComplete { .. } => "ParaBank | Customer Created",
		};
		Ok(title.to_owned())
	}

	async fn content(&self) -> Result<String> {
		self.ensure_open()?;
		let state = self.page.lock();
		let content = match &state.view {
			View::Blank => String::new(),
			View::LoginForm { error } => {
				let mut content = "Customer Login Username Password Log In Register".to_owned();
				if let Some(error) = error {
					content.push(' ');
					content.push_str(error);
				}
				content
			}
			View::AccountsOverview => "Accounts Overview Log Out".to_owned(),
			View::RegisterForm { error } => {
				let mut content = "Signing up is easy! Register".to_owned();
				if let Some(error) = error {
					content.push(' ');
					content.push_str(error);
				}
				content
			}
			View::RegisterComplete { username } => {
				format!("Welcome {username} {REGISTER_SUCCESS} Log Out")
			}
		};
		Ok(content)
	}

	async fn fill(&self, selector: &str, text: &str, timeout_ms: u64) -> Result<()> {
		self.ensure_open()?;
		let mut state = self.page.lock();
		self.require_visible(&state, selector, timeout_ms)?;
		state.fields.insert(selector.to_owned(), text.to_owned());
		Ok(())
	}

	async fn click(&self, selector: &str, timeout_ms: u64) -> Result<()> {
		self.ensure_open()?;
		let mut state = self.page.lock();
		self.require_visible(&state, selector, timeout_ms)?;
		match selector {
			LOGIN_BUTTON => self.submit_login(&mut state),
			REGISTER_BUTTON => self.submit_registration(&mut state),
			REGISTER_LINK => {
				state.view = View::RegisterForm { error: None };
				state.url = rewrite_path(&state.url, "register.htm");
				state.fields.clear();
			}
			LOGOUT_LINK => {
				state.view = View::LoginForm { error: None };
				state.url = rewrite_path(&state.url, "index.htm");
				state.fields.clear();
			}
			_ => {}
		}
		Ok(())
	}

	async fn wait_for_visible(&self, selector: &str, timeout_ms: u64) -> Result<()> {
		self.ensure_open()?;
		let state = self.page.lock();
		self.require_visible(&state, selector, timeout_ms)
	}

	async fn text_content(&self, selector: &str, timeout_ms: u64) -> Result<String> {
		self.ensure_open()?;
		let state = self.page.lock();
		self.require_visible(&state, selector, timeout_ms)?;
		let text = match (&state.view, selector) {
			(View::LoginForm { error: Some(error) }, ERROR_PANEL) => error.clone(),
			(View::RegisterForm { error: Some(error) }, ERROR_PANEL) => error.clone(),
			(View::AccountsOverview, PANEL_TITLE) => "Accounts Overview".to_owned(),
			(View::RegisterComplete { username }, PANEL_TITLE) => format!("Welcome {username}"),
			(View::RegisterComplete { .. }, PANEL_TEXT) => REGISTER_SUCCESS.to_owned(),
			_ => String::new(),
		};
		Ok(text)
	}

	async fn screenshot(&self) -> Result<Vec<u8>> {
		self.ensure_open()?;
		self.bank.record(format!("page {} screenshot", self.id));
		if self.bank.state.lock().fail_screenshots {
			return Err(HarnessError::Screenshot("scripted capture failure".into()));
		}
		let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
		bytes.extend_from_slice(&(self.id as u32).to_le_bytes());
		Ok(bytes)
	}

	async fn install_console_forwarder(&self, forwarder: ConsoleForwarder) -> Result<()> {
		self.ensure_open()?;
		self.bank.record(format!("page {} console forwarder installed", self.id));
		*self.forwarder.lock() = Some(forwarder);
		Ok(())
	}

	async fn close(&self) -> Result<()> {
		if !self.closed.swap(true, Ordering::SeqCst) {
			self.bank.record(format!("page {} closed", self.id));
			*self.forwarder.lock() = None;
		}
		Ok(())
	}
}

fn rewrite_path(url: &str, leaf: &str) -> String {
	match url.rfind('/') {
		Some(index) => format!("{}/{leaf}", &url[..index]),
		None => leaf.to_owned(),
	}
}
