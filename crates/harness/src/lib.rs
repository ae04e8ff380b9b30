//! Fixture and session lifecycle core for the ParaBank end-to-end suite.
//!
//! The harness wires browser sessions, configuration, per-test page handles,
//! and report attachment together with guaranteed setup/teardown ordering:
//!
//! - [`config`] resolves the active environment to an immutable
//!   [`RunConfiguration`], once per run.
//! - [`session`] derives the session-scoped launch and context parameter
//!   bundles the engine consumes.
//! - [`engine`] is the capability boundary to the external browser engine,
//!   with a scripted in-memory implementation for hermetic tests.
//! - [`page`] produces one composed [`PageHandle`] per test, diagnostic
//!   wrappers installed before the test body ever sees it.
//! - [`outcome`] observes phase transitions and captures failure evidence.
//! - [`runner`] executes registered cases sequentially and tears the session
//!   down exactly once.

pub mod config;
pub mod engine;
pub mod error;
pub mod layout;
pub mod outcome;
pub mod page;
pub mod report;
pub mod runner;
pub mod session;

pub use config::{EnvOverrides, RunConfiguration, resolve};
pub use engine::{BrowserKind, BrowserSession, PageDriver};
pub use error::{HarnessError, Result};
pub use layout::ResultsLayout;
pub use outcome::{FailureCapture, PhaseObserver, PhaseOutcome, TestId, TestPhase, TestStatus};
pub use page::PageHandle;
pub use report::{Attachment, AttachmentKind, ReportSink};
pub use runner::{RunSummary, Runner, Suite, TestCase, TestContext, TestKind};
pub use session::{InvocationOptions, SessionProvider};
