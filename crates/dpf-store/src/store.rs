use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dpf_reconcile::{
    AuditLogger, ExistingFormat, FormatCreator, FormatId, FormatRemover, HostError, HostResult,
    NewFormat, WorkFormatsAccessor, WorkRef, WorkUpdater,
};
use tracing::{debug, info};

use crate::document::{StoredFormat, StoredWork, WorksDocument};

/// File-backed implementation of every reconciler port.
pub struct JsonWorkStore {
    path: Option<PathBuf>,
    doc: RefCell<WorksDocument>,
}

fn unknown_work(work: &WorkRef) -> HostError {
    format!("work '{}' is not in the store", work.work_id).into()
}

impl JsonWorkStore {
    /// Load the document at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("read work store: {}", path.display()))?;
        let doc: WorksDocument = serde_json::from_str(&raw)
            .with_context(|| format!("parse work store json: {}", path.display()))?;
        debug!(path = %path.display(), works = doc.works.len(), "work store loaded");
        Ok(Self {
            path: Some(path),
            doc: RefCell::new(doc),
        })
    }

    /// In-memory store with no backing file; `save` is a no-op.
    pub fn from_document(doc: WorksDocument) -> Self {
        Self {
            path: None,
            doc: RefCell::new(doc),
        }
    }

    /// Write the document back to its file (pretty JSON, trailing newline).
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut json = serde_json::to_string_pretty(&*self.doc.borrow())
            .context("serialize work store failed")?;
        json.push('\n');
        fs::write(path, json).with_context(|| format!("write work store: {}", path.display()))?;
        info!(path = %path.display(), "work store saved");
        Ok(())
    }

    pub fn document(&self) -> WorksDocument {
        self.doc.borrow().clone()
    }

    pub fn work(&self, work_id: &str) -> Option<StoredWork> {
        self.doc.borrow().work(work_id).cloned()
    }

    fn with_work_mut<T>(
        &self,
        work: &WorkRef,
        f: impl FnOnce(&mut StoredWork) -> HostResult<T>,
    ) -> HostResult<T> {
        let mut doc = self.doc.borrow_mut();
        let stored = doc.work_mut(&work.work_id).ok_or_else(|| unknown_work(work))?;
        f(stored)
    }
}

impl WorkFormatsAccessor for JsonWorkStore {
    fn find_work(&self, work_id: &str) -> HostResult<Option<WorkRef>> {
        Ok(self.doc.borrow().work(work_id).map(StoredWork::work_ref))
    }

    fn current_formats(&self, work: &WorkRef) -> HostResult<Vec<ExistingFormat>> {
        let doc = self.doc.borrow();
        let stored = doc.work(&work.work_id).ok_or_else(|| unknown_work(work))?;
        Ok(stored.formats.iter().map(ExistingFormat::from).collect())
    }

    fn marker_field(&self, work: &WorkRef, field_name: &str) -> HostResult<Option<String>> {
        let doc = self.doc.borrow();
        let stored = doc.work(&work.work_id).ok_or_else(|| unknown_work(work))?;
        Ok(stored.fields.get(field_name).cloned())
    }
}

impl FormatCreator for JsonWorkStore {
    fn create(&self, work: &WorkRef, attributes: &NewFormat) -> HostResult<ExistingFormat> {
        let id = self.doc.borrow().next_format_id();
        self.with_work_mut(work, |stored| {
            let format = StoredFormat::from_new(id, attributes);
            let existing = ExistingFormat::from(&format);
            stored.formats.push(format);
            Ok(existing)
        })
    }
}

impl WorkUpdater for JsonWorkStore {
    fn set_marker_field(
        &self,
        work: &WorkRef,
        field_name: &str,
        json_value: &str,
    ) -> HostResult<()> {
        self.with_work_mut(work, |stored| {
            stored
                .fields
                .insert(field_name.to_string(), json_value.to_string());
            Ok(())
        })
    }

    fn set_sequence_position(
        &self,
        work: &WorkRef,
        format_id: FormatId,
        position: u32,
    ) -> HostResult<()> {
        self.with_work_mut(work, |stored| {
            let format = stored
                .formats
                .iter_mut()
                .find(|f| f.id == format_id)
                .ok_or_else(|| HostError::from(format!("format {format_id} not found")))?;
            format.seq = position;
            Ok(())
        })
    }
}

impl FormatRemover for JsonWorkStore {
    fn delete(&self, work: &WorkRef, format_id: FormatId) -> HostResult<()> {
        self.with_work_mut(work, |stored| {
            let before = stored.formats.len();
            stored.formats.retain(|f| f.id != format_id);
            if stored.formats.len() == before {
                return Err(format!("format {format_id} not found").into());
            }
            Ok(())
        })
    }
}

/// Store-level audit sink used when no JSONL audit log is configured: events
/// go to the tracing subscriber only.
impl AuditLogger for JsonWorkStore {
    fn log_format_created(&self, work: &WorkRef, format_name: &str) -> HostResult<()> {
        info!(work_id = %work.work_id, format = format_name, "publication format created");
        Ok(())
    }

    fn log_format_removed(&self, work: &WorkRef, format_name: &str) -> HostResult<()> {
        info!(work_id = %work.work_id, format = format_name, "publication format removed");
        Ok(())
    }
}
