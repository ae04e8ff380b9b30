//! Structured report sink.
//!
//! An append-only channel of named, typed attachments associated with the
//! currently-executing test. Attachments accumulate in memory; when the sink
//! is backed by a raw-results directory, each test's record is persisted as a
//! JSON document with PNG bodies written beside it.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::Result;
use crate::outcome::{TestId, TestStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
	Text,
	Png,
	Json,
}

/// One named piece of report evidence.
#[derive(Debug, Clone)]
pub struct Attachment {
	pub name: String,
	pub kind: AttachmentKind,
	pub body: Vec<u8>,
}

/// Append-style report channel shared by the page wrappers, the failure
/// capture observer, and test bodies.
pub struct ReportSink {
	raw_dir: Option<PathBuf>,
	records: Mutex<HashMap<TestId, Vec<Attachment>>>,
}

impl ReportSink {
	/// Sink that keeps attachments in memory only. Used by hermetic tests.
	pub fn in_memory() -> Self {
		Self {
			raw_dir: None,
			records: Mutex::new(HashMap::new()),
		}
	}

	/// Sink that persists per-test records into `raw_dir`.
	pub fn persistent(raw_dir: impl Into<PathBuf>) -> Self {
		Self {
			raw_dir: Some(raw_dir.into()),
			records: Mutex::new(HashMap::new()),
		}
	}

	pub fn attach_text(&self, test: &TestId, name: &str, text: impl Into<String>) {
		self.attach(test, Attachment {
			name: name.to_owned(),
			kind: AttachmentKind::Text,
			body: text.into().into_bytes(),
		});
	}

	pub fn attach_png(&self, test: &TestId, name: &str, bytes: Vec<u8>) {
		self.attach(test, Attachment {
			name: name.to_owned(),
			kind: AttachmentKind::Png,
			body: bytes,
		});
	}

	pub fn attach_json(&self, test: &TestId, name: &str, value: &serde_json::Value) {
		self.attach(test, Attachment {
			name: name.to_owned(),
			kind: AttachmentKind::Json,
			body: value.to_string().into_bytes(),
		});
	}

	fn attach(&self, test: &TestId, attachment: Attachment) {
		self.records.lock().entry(test.clone()).or_default().push(attachment);
	}

	/// Snapshot of the attachments recorded for `test` so far.
	pub fn attachments_for(&self, test: &TestId) -> Vec<Attachment> {
		self.records.lock().get(test).cloned().unwrap_or_default()
	}

	/// Writes the test's record to the raw-results directory, if configured.
	///
	/// PNG bodies land in sibling files named after the test; text and JSON
	/// bodies are inlined into the record.
	pub fn persist(&self, test: &TestId, status: TestStatus) -> Result<()> {
		let Some(raw_dir) = &self.raw_dir else {
			return Ok(());
		};
		let attachments = self.attachments_for(test);
		let stem = test.file_stem();

		let mut records = Vec::with_capacity(attachments.len());
		for (index, attachment) in attachments.iter().enumerate() {
			let record = match attachment.kind {
				AttachmentKind::Png => {
					let file_name = format!("{stem}-{index}-{}.png", sanitize(&attachment.name));
					fs::write(raw_dir.join(&file_name), &attachment.body)?;
					AttachmentRecord {
						name: &attachment.name,
						kind: attachment.kind,
						body: None,
						source: Some(file_name),
					}
				}
				AttachmentKind::Text | AttachmentKind::Json => AttachmentRecord {
					name: &attachment.name,
					kind: attachment.kind,
					body: Some(String::from_utf8_lossy(&attachment.body).into_owned()),
					source: None,
				},
			};
			records.push(record);
		}

		let record = TestRecord {
			name: test.as_str(),
			status: status.as_str(),
			attachments: records,
		};
		let path = raw_dir.join(format!("{stem}-result.json"));
		fs::write(path, serde_json::to_vec_pretty(&record)?)?;
		Ok(())
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TestRecord<'a> {
	name: &'a str,
	status: &'a str,
	attachments: Vec<AttachmentRecord<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AttachmentRecord<'a> {
	name: &'a str,
	kind: AttachmentKind,
	#[serde(skip_serializing_if = "Option::is_none")]
	body: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	source: Option<String>,
}

fn sanitize(name: &str) -> String {
	name.chars()
		.map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn attachments_accumulate_per_test() {
		let sink = ReportSink::in_memory();
		let a = TestId::new("a");
		let b = TestId::new("b");
		sink.attach_text(&a, "navigation", "Navigating to: /index.htm");
		sink.attach_png(&a, "screenshot", vec![1, 2, 3]);
		sink.attach_text(&b, "navigation", "Navigating to: /register.htm");

		assert_eq!(sink.attachments_for(&a).len(), 2);
		assert_eq!(sink.attachments_for(&b).len(), 1);
		assert_eq!(sink.attachments_for(&TestId::new("c")).len(), 0);
	}

	#[test]
	fn persist_writes_record_and_png_bodies() {
		let dir = tempfile::tempdir().unwrap();
		let sink = ReportSink::persistent(dir.path());
		let test = TestId::new("login_test");
		sink.attach_text(&test, "navigation", "Navigating to: /index.htm");
		sink.attach_png(&test, "screenshot", vec![0x89, b'P', b'N', b'G']);

		sink.persist(&test, TestStatus::Failed).unwrap();

		let record: serde_json::Value =
			serde_json::from_str(&fs::read_to_string(dir.path().join("login_test-result.json")).unwrap()).unwrap();
		assert_eq!(record["status"], "failed");
		assert_eq!(record["attachments"][0]["body"], "Navigating to: /index.htm");
		let source = record["attachments"][1]["source"].as_str().unwrap();
		assert!(dir.path().join(source).is_file());
	}

	#[test]
	fn in_memory_persist_is_a_no_op() {
		let sink = ReportSink::in_memory();
		let test = TestId::new("t");
		sink.attach_text(&test, "note", "hello");
		sink.persist(&test, TestStatus::Passed).unwrap();
	}
}
