//! Registration page object.

use harness::error::Result;
use harness::page::PageHandle;
use tracing::{error, info};

use crate::data::NewUser;

pub struct RegisterPage<'a> {
	page: &'a PageHandle,
	base_url: String,
}

impl<'a> RegisterPage<'a> {
	pub const FIRST_NAME_INPUT: &'static str = "input[id='customer.firstName']";
	pub const LAST_NAME_INPUT: &'static str = "input[id='customer.lastName']";
	pub const ADDRESS_INPUT: &'static str = "input[id='customer.address.street']";
	pub const CITY_INPUT: &'static str = "input[id='customer.address.city']";
	pub const STATE_INPUT: &'static str = "input[id='customer.address.state']";
	pub const ZIP_CODE_INPUT: &'static str = "input[id='customer.address.zipCode']";
	pub const PHONE_INPUT: &'static str = "input[id='customer.phoneNumber']";
	pub const SSN_INPUT: &'static str = "input[id='customer.ssn']";
	pub const USERNAME_INPUT: &'static str = "input[id='customer.username']";
	pub const PASSWORD_INPUT: &'static str = "input[id='customer.password']";
	pub const CONFIRM_PASSWORD_INPUT: &'static str = "input[id='repeatedPassword']";
	pub const REGISTER_BUTTON: &'static str = "input[type='submit'][value='Register']";
	pub const ERROR_MESSAGE: &'static str = ".error";
	pub const SUCCESS_MESSAGE: &'static str = "#rightPanel p";

	pub fn new(page: &'a PageHandle, base_url: &str) -> Self {
		Self {
			page,
			base_url: base_url.trim_end_matches('/').to_owned(),
		}
	}

	/// Navigates to the registration page and waits for the form.
	pub async fn open(&self) -> Result<()> {
		self.page.goto(&format!("{}/register.htm", self.base_url)).await?;
		self.page.wait_for_visible(Self::FIRST_NAME_INPUT).await
	}

	/// Submits the registration form; true when the success panel confirms
	/// the account was created.
	pub async fn register(&self, user: &NewUser) -> Result<bool> {
		info!(target = "suite", username = %user.username, "registering new user");

		self.page.fill(Self::FIRST_NAME_INPUT, &user.first_name).await?;
		self.page.fill(Self::LAST_NAME_INPUT, &user.last_name).await?;
		self.page.fill(Self::ADDRESS_INPUT, &user.address).await?;
		self.page.fill(Self::CITY_INPUT, &user.city).await?;
		self.page.fill(Self::STATE_INPUT, &user.state).await?;
		self.page.fill(Self::ZIP_CODE_INPUT, &user.zip_code).await?;
		self.page.fill(Self::PHONE_INPUT, &user.phone).await?;
		self.page.fill(Self::SSN_INPUT, &user.ssn).await?;
		self.page.fill(Self::USERNAME_INPUT, &user.username).await?;
		self.page.fill(Self::PASSWORD_INPUT, &user.password).await?;
		self.page.fill(Self::CONFIRM_PASSWORD_INPUT, &user.password).await?;
		self.page.click(Self::REGISTER_BUTTON).await?;

		if let Some(message) = self.error_message().await? {
			error!(target = "suite", error = %message, "registration rejected");
			return Ok(false);
		}
		match self.success_message().await? {
			Some(message) => Ok(message.to_lowercase().contains("created successfully")),
			None => Ok(false),
		}
	}

	pub async fn error_message(&self) -> Result<Option<String>> {
		if self.page.is_visible(Self::ERROR_MESSAGE).await? {
			Ok(Some(self.page.text_content(Self::ERROR_MESSAGE).await?))
		} else {
			Ok(None)
		}
	}

	pub async fn success_message(&self) -> Result<Option<String>> {
		if self.page.is_visible(Self::SUCCESS_MESSAGE).await? {
			Ok(Some(self.page.text_content(Self::SUCCESS_MESSAGE).await?))
		} else {
			Ok(None)
		}
	}

	pub async fn is_registration_form_visible(&self) -> Result<bool> {
		Ok(self.page.is_visible(Self::FIRST_NAME_INPUT).await?
			&& self.page.is_visible(Self::LAST_NAME_INPUT).await?
			&& self.page.is_visible(Self::REGISTER_BUTTON).await?)
	}
}
