//! Results directory layout.
//!
//! Replaces import-time directory creation with an explicit context object
//! constructed once at run start: [`ResultsLayout::create`] makes the results
//! root and its subdirectories idempotently and hands out their paths.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Default results root, relative to the working directory.
pub const DEFAULT_RESULTS_ROOT: &str = "test-results";

/// Created-once filesystem layout for run artifacts.
#[derive(Debug, Clone)]
pub struct ResultsLayout {
	root: PathBuf,
	screenshots: PathBuf,
	reports: PathBuf,
	raw: PathBuf,
}

impl ResultsLayout {
	/// Creates the layout under `root`, making every directory if absent.
	pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
		let root = root.into();
		let layout = Self {
			screenshots: root.join("screenshots"),
			reports: root.join("reports"),
			raw: root.join("raw"),
			root,
		};
		for dir in [&layout.root, &layout.screenshots, &layout.reports, &layout.raw] {
			fs::create_dir_all(dir)?;
		}
		Ok(layout)
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Failure screenshots, one file per test identifier.
	pub fn screenshots(&self) -> &Path {
		&self.screenshots
	}

	/// Rendered human-readable reports.
	pub fn reports(&self) -> &Path {
		&self.reports
	}

	/// Raw structured report data (per-test records and attachment bodies).
	pub fn raw(&self) -> &Path {
		&self.raw
	}
}
