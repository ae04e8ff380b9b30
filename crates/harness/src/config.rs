//! Environment configuration resolution.
//!
//! Configuration lives in per-environment JSON resources under a config
//! directory (`dev.json`, `qa.json`, ...). A project-level override resource
//! ([`OVERRIDE_RESOURCE`]) takes unconditional precedence over the requested
//! environment when present. Resolution happens once per run; the resolved
//! [`RunConfiguration`] is immutable afterwards.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{HarnessError, Result};

/// Override resource returned unconditionally when present, regardless of the
/// requested environment name. Known surprising behavior, preserved on
/// purpose: a `--env` selection is silently shadowed by this file.
pub const OVERRIDE_RESOURCE: &str = "parabank.json";

/// Environment used when neither the invocation nor `TEST_ENV` names one.
pub const DEFAULT_ENVIRONMENT: &str = "dev";

/// Immutable run-scoped configuration, resolved once at run start.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfiguration {
	/// Environment name the run resolved against.
	#[serde(default)]
	pub environment: String,
	/// Base URL of the application under test.
	pub base_url: String,
	/// Base URL of the REST API, when the environment exposes one.
	#[serde(default)]
	pub api_url: Option<String>,
	/// Known customer id usable for read-only API checks.
	#[serde(default)]
	pub test_customer_id: Option<String>,
	pub users: Users,
	/// Arbitrary nested test data carried through to test bodies.
	#[serde(flatten)]
	pub test_data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Users {
	pub default: Credentials,
	#[serde(default)]
	pub new_user: Option<NewUserTemplate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
	pub username: String,
	pub password: String,
}

/// Registration template seeding generated users for register flows.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserTemplate {
	pub first_name: String,
	pub last_name: String,
	pub address: String,
	pub city: String,
	pub state: String,
	pub zip_code: String,
	pub phone: String,
	pub ssn: String,
	pub password: String,
}

/// Process-wide overrides, read from the environment exactly once at startup.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
	pub environment: Option<String>,
	pub base_url: Option<String>,
	pub username: Option<String>,
	pub password: Option<String>,
}

impl EnvOverrides {
	pub fn from_process_env() -> Self {
		Self {
			environment: std::env::var("TEST_ENV").ok(),
			base_url: std::env::var("BASE_URL").ok(),
			username: std::env::var("TEST_USERNAME").ok(),
			password: std::env::var("TEST_PASSWORD").ok(),
		}
	}
}

/// Resolves the active configuration for `environment`.
///
/// Precedence: the [`OVERRIDE_RESOURCE`] in `config_dir` wins unconditionally;
/// otherwise `<environment>.json` by exact name; otherwise
/// [`HarnessError::ConfigurationNotFound`]. `overrides` are applied on top of
/// whichever resource loaded.
pub fn resolve(config_dir: &Path, environment: Option<&str>, overrides: &EnvOverrides) -> Result<RunConfiguration> {
	let environment = environment
		.map(str::to_owned)
		.or_else(|| overrides.environment.clone())
		.unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_owned());

	let override_path = config_dir.join(OVERRIDE_RESOURCE);
	let path = if override_path.exists() {
		debug!(
			target = "harness",
			environment = %environment,
			resource = %override_path.display(),
			"override resource present, requested environment shadowed"
		);
		override_path
	} else {
		let env_path = config_dir.join(format!("{environment}.json"));
		if !env_path.exists() {
			return Err(HarnessError::ConfigurationNotFound {
				environment,
				searched: env_path,
			});
		}
		env_path
	};

	let raw = fs::read_to_string(&path)?;
	let mut config: RunConfiguration = serde_json::from_str(&raw)?;
	config.environment = environment;
	apply_overrides(&mut config, overrides);
	Ok(config)
}

fn apply_overrides(config: &mut RunConfiguration, overrides: &EnvOverrides) {
	if let Some(base_url) = &overrides.base_url {
		config.base_url = base_url.clone();
	}
	if let Some(username) = &overrides.username {
		config.users.default.username = username.clone();
	}
	if let Some(password) = &overrides.password {
		config.users.default.password = password.clone();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const DEV: &str = r#"{
		"baseUrl": "https://dev.parabank.example/parabank",
		"apiUrl": "https://dev.parabank.example/parabank/services/bank",
		"users": { "default": { "username": "john", "password": "demo" } }
	}"#;

	const QA: &str = r#"{
		"baseUrl": "https://qa.parabank.example/parabank",
		"users": { "default": { "username": "jane", "password": "secret" } }
	}"#;

	fn config_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
		let dir = tempfile::tempdir().unwrap();
		for (name, body) in files {
			fs::write(dir.path().join(name), body).unwrap();
		}
		dir
	}

	#[test]
	fn resolves_environment_resource_by_exact_name() {
		let dir = config_dir(&[("dev.json", DEV), ("qa.json", QA)]);
		let config = resolve(dir.path(), Some("qa"), &EnvOverrides::default()).unwrap();
		assert_eq!(config.environment, "qa");
		assert_eq!(config.base_url, "https://qa.parabank.example/parabank");
		assert_eq!(config.users.default.username, "jane");
	}

	#[test]
	fn override_resource_wins_regardless_of_requested_environment() {
		let override_body = r#"{
			"baseUrl": "https://parabank.parasoft.com/parabank",
			"users": { "default": { "username": "john", "password": "demo" } }
		}"#;
		let dir = config_dir(&[("parabank.json", override_body), ("qa.json", QA)]);
		let config = resolve(dir.path(), Some("qa"), &EnvOverrides::default()).unwrap();
		assert_eq!(config.base_url, "https://parabank.parasoft.com/parabank");
		assert_eq!(config.users.default.username, "john");
	}

	#[test]
	fn missing_environment_fails_with_configuration_not_found() {
		let dir = config_dir(&[("dev.json", DEV)]);
		let err = resolve(dir.path(), Some("nonexistent_env"), &EnvOverrides::default()).unwrap_err();
		match err {
			HarnessError::ConfigurationNotFound { environment, searched } => {
				assert_eq!(environment, "nonexistent_env");
				assert!(searched.ends_with("nonexistent_env.json"));
			}
			other => panic!("expected ConfigurationNotFound, got {other}"),
		}
	}

	#[test]
	fn defaults_to_dev_when_nothing_requested() {
		let dir = config_dir(&[("dev.json", DEV)]);
		let config = resolve(dir.path(), None, &EnvOverrides::default()).unwrap();
		assert_eq!(config.environment, "dev");
	}

	#[test]
	fn overrides_replace_credentials_and_base_url() {
		let dir = config_dir(&[("dev.json", DEV)]);
		let overrides = EnvOverrides {
			environment: None,
			base_url: Some("http://localhost:8080/parabank".into()),
			username: Some("ci-user".into()),
			password: Some("ci-pass".into()),
		};
		let config = resolve(dir.path(), Some("dev"), &overrides).unwrap();
		assert_eq!(config.base_url, "http://localhost:8080/parabank");
		assert_eq!(config.users.default.username, "ci-user");
		assert_eq!(config.users.default.password, "ci-pass");
	}

	#[test]
	fn environment_override_selects_resource_when_invocation_silent() {
		let dir = config_dir(&[("dev.json", DEV), ("qa.json", QA)]);
		let overrides = EnvOverrides {
			environment: Some("qa".into()),
			..Default::default()
		};
		let config = resolve(dir.path(), None, &overrides).unwrap();
		assert_eq!(config.environment, "qa");
		assert_eq!(config.users.default.username, "jane");
	}

	#[test]
	fn unknown_keys_land_in_test_data() {
		let body = r#"{
			"baseUrl": "https://parabank.parasoft.com/parabank",
			"users": { "default": { "username": "john", "password": "demo" } },
			"loans": { "minAmount": 1000 }
		}"#;
		let dir = config_dir(&[("dev.json", body)]);
		let config = resolve(dir.path(), Some("dev"), &EnvOverrides::default()).unwrap();
		assert_eq!(config.test_data["loans"]["minAmount"], 1000);
	}
}
