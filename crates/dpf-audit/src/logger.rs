//! [`AuditLogger`] port backed by an [`AuditWriter`] JSONL log.

use std::cell::RefCell;
use std::path::Path;

use anyhow::Result;
use dpf_reconcile::{AuditLogger, HostResult, WorkRef};
use serde_json::json;
use tracing::debug;

use crate::AuditWriter;

pub const TOPIC_FORMAT: &str = "publication_format";
pub const EVENT_FORMAT_CREATED: &str = "FORMAT_CREATED";
pub const EVENT_FORMAT_REMOVED: &str = "FORMAT_REMOVED";

/// Writes one audit line per created/removed format.
///
/// The writer sits behind a `RefCell` because reconciler ports take `&self`.
pub struct JsonlAuditLogger {
    writer: RefCell<AuditWriter>,
}

impl JsonlAuditLogger {
    pub fn new(writer: AuditWriter) -> Self {
        Self {
            writer: RefCell::new(writer),
        }
    }

    /// Open `path`, continuing an existing chain if the file is present.
    pub fn open(path: impl AsRef<Path>, hash_chain: bool) -> Result<Self> {
        Ok(Self::new(AuditWriter::resume(path, hash_chain)?))
    }

    /// Events written so far, including those from earlier sessions.
    pub fn seq(&self) -> u64 {
        self.writer.borrow().seq()
    }

    fn emit(&self, work: &WorkRef, event_type: &str, format_name: &str) -> HostResult<()> {
        let payload = json!({
            "formatName": format_name,
            "locale": work.locale,
        });
        let ev = self
            .writer
            .borrow_mut()
            .append(&work.work_id, TOPIC_FORMAT, event_type, payload)?;
        debug!(event_id = %ev.event_id, event_type, format = format_name, "audit event written");
        Ok(())
    }
}

impl AuditLogger for JsonlAuditLogger {
    fn log_format_created(&self, work: &WorkRef, format_name: &str) -> HostResult<()> {
        self.emit(work, EVENT_FORMAT_CREATED, format_name)
    }

    fn log_format_removed(&self, work: &WorkRef, format_name: &str) -> HostResult<()> {
        self.emit(work, EVENT_FORMAT_REMOVED, format_name)
    }
}
