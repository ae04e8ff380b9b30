//! Registered UI and API scenarios.
//!
//! Each scenario is a plain async function over [`TestContext`]; `register`
//! wires them into a runner [`Suite`]. UI scenarios drive the page objects,
//! API scenarios drive [`ApiClient`] and never touch a browser.

use anyhow::Context as _;
use harness::runner::{Suite, TestCase, TestContext};

use crate::api::ApiClient;
use crate::data::NewUser;
use crate::pages::{LoginPage, RegisterPage};

/// Error fragments ParaBank is known to show for a rejected login.
const INVALID_LOGIN_FRAGMENTS: &[&str] = &[
	"could not be verified",
	"invalid username",
	"invalid password",
	"username and password are required",
	"error logging in",
];

/// Registers every scenario of the suite.
pub fn register(suite: &mut Suite) {
	suite.case(TestCase::ui("ui_login_with_valid_credentials", |cx| {
		Box::pin(login_with_valid_credentials(cx))
	}));
	suite.case(TestCase::ui("ui_login_with_invalid_credentials", |cx| {
		Box::pin(login_with_invalid_credentials(cx))
	}));
	suite.case(TestCase::ui("ui_logout_after_login", |cx| Box::pin(logout_after_login(cx))));
	suite.case(TestCase::ui("ui_register_new_user", |cx| Box::pin(register_new_user(cx))));
	suite.case(TestCase::api("api_customer_endpoint_available", |cx| {
		Box::pin(customer_endpoint_available(cx))
	}));
	suite.case(TestCase::api("api_accounts_endpoint_shape", |cx| {
		Box::pin(accounts_endpoint_shape(cx))
	}));
	suite.case(TestCase::api("api_login_with_default_credentials", |cx| {
		Box::pin(login_with_default_credentials(cx))
	}));
}

async fn login_with_valid_credentials(cx: &mut TestContext) -> anyhow::Result<()> {
	let page = cx.page()?;
	let login = LoginPage::new(page, &cx.config.base_url);
	login.open().await?;

	let credentials = &cx.config.users.default;
	login.login(&credentials.username, &credentials.password).await?;
	page.screenshot().await?;

	let title = page.title().await?;
	anyhow::ensure!(
		title.contains("Accounts Overview"),
		"expected accounts overview after login, page title was {title:?}"
	);
	anyhow::ensure!(login.is_user_logged_in().await?, "Log Out link not visible after login");
	Ok(())
}

async fn login_with_invalid_credentials(cx: &mut TestContext) -> anyhow::Result<()> {
	let page = cx.page()?;
	let login = LoginPage::new(page, &cx.config.base_url);
	login.open().await?;

	login.login("invalid_user", "invalid_password").await?;
	page.screenshot().await?;

	let message = login
		.error_message()
		.await?
		.context("no error message displayed for invalid login")?;
	let lowered = message.to_lowercase();
	anyhow::ensure!(
		INVALID_LOGIN_FRAGMENTS.iter().any(|fragment| lowered.contains(fragment)),
		"unexpected login error message: {message:?}"
	);
	anyhow::ensure!(
		login.is_login_form_visible().await?,
		"login form not visible after failed login"
	);
	Ok(())
}

async fn logout_after_login(cx: &mut TestContext) -> anyhow::Result<()> {
	let page = cx.page()?;
	let login = LoginPage::new(page, &cx.config.base_url);
	login.open().await?;

	let credentials = &cx.config.users.default;
	login.login(&credentials.username, &credentials.password).await?;
	anyhow::ensure!(login.is_user_logged_in().await?, "login failed, Log Out link not visible");

	anyhow::ensure!(login.logout().await?, "logout did not run");
	page.screenshot().await?;
	anyhow::ensure!(login.is_login_form_visible().await?, "login form not visible after logout");
	Ok(())
}

async fn register_new_user(cx: &mut TestContext) -> anyhow::Result<()> {
	let page = cx.page()?;
	let register = RegisterPage::new(page, &cx.config.base_url);
	register.open().await?;

	let user = match &cx.config.users.new_user {
		Some(template) => NewUser::from_template(template),
		None => NewUser::generate(),
	};
	let created = register.register(&user).await?;
	page.screenshot().await?;

	anyhow::ensure!(created, "registration with valid data was not accepted");
	Ok(())
}

async fn customer_endpoint_available(cx: &mut TestContext) -> anyhow::Result<()> {
	let client = api_client(cx)?;
	let customer = cx.config.test_customer_id.as_deref().unwrap_or("12212");

	let response = client.get(&format!("/customers/{customer}")).await?;
	// A stale customer id is fine; the endpoint responding at all is the check.
	anyhow::ensure!(
		matches!(response.status.as_u16(), 200 | 404),
		"unexpected status {} from customers endpoint",
		response.status
	);
	let content_type = response.content_type().unwrap_or_default().to_owned();
	anyhow::ensure!(
		content_type.contains("application/json"),
		"expected JSON content type, got {content_type:?}"
	);
	Ok(())
}

async fn accounts_endpoint_shape(cx: &mut TestContext) -> anyhow::Result<()> {
	let client = api_client(cx)?;
	let customer = cx.config.test_customer_id.as_deref().unwrap_or("12212");

	let response = client.get(&format!("/customers/{customer}/accounts")).await?;
	anyhow::ensure!(
		matches!(response.status.as_u16(), 200 | 404),
		"unexpected status {} from accounts endpoint",
		response.status
	);
	if response.is_success() {
		let data = response.json().context("accounts endpoint returned unparseable JSON")?;
		if let Some(first) = data.as_array().and_then(|accounts| accounts.first()) {
			anyhow::ensure!(first.get("id").is_some(), "account record missing 'id'");
			anyhow::ensure!(first.get("balance").is_some(), "account record missing 'balance'");
		}
	}
	Ok(())
}

async fn login_with_default_credentials(cx: &mut TestContext) -> anyhow::Result<()> {
	let client = api_client(cx)?;
	let credentials = &cx.config.users.default;

	let response = client
		.get_with_query(
			"/login",
			&[
				("username", credentials.username.as_str()),
				("password", credentials.password.as_str()),
			],
		)
		.await?;
	anyhow::ensure!(response.is_success(), "login API failed with status {}", response.status);
	anyhow::ensure!(!response.body.is_empty(), "login API returned an empty response");
	Ok(())
}

fn api_client(cx: &TestContext) -> anyhow::Result<ApiClient> {
	let api_url = cx
		.config
		.api_url
		.as_deref()
		.context("environment configuration has no apiUrl")?;
	Ok(ApiClient::new(api_url)?.with_report(cx.sink.clone(), cx.test().clone()))
}
