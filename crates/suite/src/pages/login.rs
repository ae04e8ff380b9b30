//! Login page object.

use harness::error::Result;
use harness::page::PageHandle;
use tracing::{info, warn};

pub struct LoginPage<'a> {
	page: &'a PageHandle,
	base_url: String,
}

impl<'a> LoginPage<'a> {
	pub const USERNAME_INPUT: &'static str = "input[name='username']";
	pub const PASSWORD_INPUT: &'static str = "input[name='password']";
	pub const LOGIN_BUTTON: &'static str = "input[type='submit'][value='Log In']";
	pub const ERROR_MESSAGE: &'static str = ".error";
	pub const FORGOT_LOGIN_INFO_LINK: &'static str = "a[href*='lookup.htm']";
	pub const REGISTER_LINK: &'static str = "a[href*='register.htm']";
	pub const LOGOUT_LINK: &'static str = "a[href*='logout.htm']";
	pub const ACCOUNTS_OVERVIEW_TITLE: &'static str = "#rightPanel h1";

	pub fn new(page: &'a PageHandle, base_url: &str) -> Self {
		Self {
			page,
			base_url: base_url.trim_end_matches('/').to_owned(),
		}
	}

	/// Navigates to the login page and waits for the form.
	pub async fn open(&self) -> Result<()> {
		self.page.goto(&format!("{}/index.htm", self.base_url)).await?;
		self.page.wait_for_visible(Self::USERNAME_INPUT).await
	}

	pub async fn login(&self, username: &str, password: &str) -> Result<()> {
		info!(target = "suite", username, "logging in");
		self.page.fill(Self::USERNAME_INPUT, username).await?;
		self.page.fill(Self::PASSWORD_INPUT, password).await?;
		self.page.click(Self::LOGIN_BUTTON).await
	}

	/// Error panel text after a failed login, if one is shown.
	pub async fn error_message(&self) -> Result<Option<String>> {
		if self.page.is_visible(Self::ERROR_MESSAGE).await? {
			let text = self.page.text_content(Self::ERROR_MESSAGE).await?;
			info!(target = "suite", error = %text, "login error shown");
			Ok(Some(text))
		} else {
			Ok(None)
		}
	}

	pub async fn is_login_form_visible(&self) -> Result<bool> {
		Ok(self.page.is_visible(Self::USERNAME_INPUT).await?
			&& self.page.is_visible(Self::PASSWORD_INPUT).await?
			&& self.page.is_visible(Self::LOGIN_BUTTON).await?)
	}

	pub async fn is_user_logged_in(&self) -> Result<bool> {
		self.page.is_visible(Self::LOGOUT_LINK).await
	}

	/// Logs out if a user is logged in; returns whether a logout happened.
	pub async fn logout(&self) -> Result<bool> {
		if !self.is_user_logged_in().await? {
			warn!(target = "suite", "logout requested but no user is logged in");
			return Ok(false);
		}
		self.page.click(Self::LOGOUT_LINK).await?;
		Ok(true)
	}

	pub async fn go_to_registration(&self) -> Result<()> {
		self.page.click(Self::REGISTER_LINK).await
	}

	/// Accounts overview heading text, when that page is showing.
	pub async fn accounts_overview_title(&self) -> Result<Option<String>> {
		if self.page.is_visible(Self::ACCOUNTS_OVERVIEW_TITLE).await? {
			Ok(Some(self.page.text_content(Self::ACCOUNTS_OVERVIEW_TITLE).await?))
		} else {
			Ok(None)
		}
	}
}
