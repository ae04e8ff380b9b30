use std::path::PathBuf;

use thiserror::Error;

use crate::engine::BrowserKind;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
	/// No configuration resource resolvable for the requested environment.
	/// Fatal to run setup; surfaced before any browser session is created.
	#[error("no configuration found for environment '{environment}' (looked for {})", .searched.display())]
	ConfigurationNotFound { environment: String, searched: PathBuf },

	#[error("browser engine '{kind}' is not available in this build")]
	EngineUnavailable { kind: BrowserKind },

	#[error("browser launch failed: {0}")]
	BrowserLaunch(String),

	#[error("navigation failed: {url}")]
	Navigation {
		url: String,
		#[source]
		source: anyhow::Error,
	},

	#[error("timeout after {ms}ms waiting for: {condition}")]
	Timeout { ms: u64, condition: String },

	#[error("screenshot failed: {0}")]
	Screenshot(String),

	#[error("page is closed")]
	PageClosed,

	/// Unreinterpreted failure from the underlying browser engine.
	#[error("engine error: {0}")]
	Engine(String),

	#[error("invalid base URL '{url}': {source}")]
	BaseUrl {
		url: String,
		#[source]
		source: url::ParseError,
	},

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl HarnessError {
	/// True for timeout expiry on an element or navigation wait.
	pub fn is_timeout(&self) -> bool {
		matches!(self, HarnessError::Timeout { .. })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn timeout_is_distinguishable() {
		let err = HarnessError::Timeout {
			ms: 5000,
			condition: "visibility of .error".into(),
		};
		assert!(err.is_timeout());
		assert!(!HarnessError::PageClosed.is_timeout());
	}

	#[test]
	fn configuration_not_found_names_the_environment() {
		let err = HarnessError::ConfigurationNotFound {
			environment: "staging".into(),
			searched: PathBuf::from("config/staging.json"),
		};
		let msg = err.to_string();
		assert!(msg.contains("staging"));
		assert!(msg.contains("config/staging.json"));
	}
}
