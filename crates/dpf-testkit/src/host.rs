use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use dpf_reconcile::{
    AuditLogger, ExistingFormat, FormatCreator, FormatId, FormatRemover, HostError, HostResult,
    NewFormat, WorkFormatsAccessor, WorkRef, WorkUpdater,
};

/// One recorded port call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostCall {
    FindWork { work_id: String },
    CurrentFormats { work_id: String },
    MarkerRead { field: String },
    Create { name: String, position: u32 },
    SetSequence { format_id: FormatId, position: u32 },
    SetMarker { field: String, value: String },
    Delete { format_id: FormatId },
    AuditCreated { name: String },
    AuditRemoved { name: String },
}

#[derive(Default)]
struct WorkState {
    work: Option<WorkRef>,
    formats: Vec<ExistingFormat>,
    fields: BTreeMap<String, String>,
}

#[derive(Default)]
struct HostState {
    works: BTreeMap<String, WorkState>,
    next_format_id: FormatId,
    calls: Vec<HostCall>,
    create_attempts: usize,
    delete_attempts: usize,
}

/// Recording in-memory host with failure injection.
#[derive(Default)]
pub struct RecordingHost {
    state: RefCell<HostState>,
    fail_create_on: Cell<Option<usize>>,
    fail_delete_on: Cell<Option<usize>>,
    fail_marker_write: Cell<bool>,
    fail_audit: Cell<bool>,
}

fn injected(what: &str) -> HostError {
    format!("injected failure: {what}").into()
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Fixture setup
    // -----------------------------------------------------------------------

    /// Register a work with no formats and no fields.
    pub fn add_work(&self, work_id: &str, locale: &str) -> WorkRef {
        let work = WorkRef::new(work_id, locale);
        self.state.borrow_mut().works.insert(
            work_id.to_string(),
            WorkState {
                work: Some(work.clone()),
                ..WorkState::default()
            },
        );
        work
    }

    /// Attach a manually added format named `name` (in the work locale) at
    /// `position`.
    pub fn add_format_at(&self, work: &WorkRef, name: &str, position: u32) -> FormatId {
        let mut st = self.state.borrow_mut();
        st.next_format_id += 1;
        let id = st.next_format_id;
        let ws = st
            .works
            .get_mut(&work.work_id)
            .expect("add_work must be called before add_format_at");
        ws.formats
            .push(ExistingFormat::named(id, position, work.locale.clone(), name));
        id
    }

    /// Attach a manually added format after the current last position.
    pub fn add_format(&self, work: &WorkRef, name: &str) -> FormatId {
        let next = self
            .formats(work)
            .iter()
            .map(|f| f.sequence_position)
            .max()
            .unwrap_or(0)
            + 1;
        self.add_format_at(work, name, next)
    }

    pub fn set_field(&self, work: &WorkRef, field: &str, value: &str) {
        let mut st = self.state.borrow_mut();
        if let Some(ws) = st.works.get_mut(&work.work_id) {
            ws.fields.insert(field.to_string(), value.to_string());
        }
    }

    // -----------------------------------------------------------------------
    // Failure injection
    // -----------------------------------------------------------------------

    /// Fail the `n`-th create call (1-based, counted across the host's life).
    pub fn fail_create_on(&self, n: usize) {
        self.fail_create_on.set(Some(n));
    }

    /// Fail the `n`-th delete call (1-based, counted across the host's life).
    pub fn fail_delete_on(&self, n: usize) {
        self.fail_delete_on.set(Some(n));
    }

    pub fn fail_marker_write(&self) {
        self.fail_marker_write.set(true);
    }

    pub fn fail_audit(&self) {
        self.fail_audit.set(true);
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// Formats of `work` sorted by sequence position.
    pub fn formats(&self, work: &WorkRef) -> Vec<ExistingFormat> {
        let st = self.state.borrow();
        let mut out = st
            .works
            .get(&work.work_id)
            .map(|ws| ws.formats.clone())
            .unwrap_or_default();
        out.sort_by_key(|f| f.sequence_position);
        out
    }

    /// Work-locale name -> sequence position.
    pub fn positions(&self, work: &WorkRef) -> BTreeMap<String, u32> {
        self.formats(work)
            .into_iter()
            .filter_map(|f| {
                f.names
                    .get(&work.locale)
                    .map(|n| (n.clone(), f.sequence_position))
            })
            .collect()
    }

    /// Work-locale names in sequence order.
    pub fn names(&self, work: &WorkRef) -> Vec<String> {
        self.formats(work)
            .into_iter()
            .filter_map(|f| f.names.get(&work.locale).cloned())
            .collect()
    }

    pub fn field(&self, work: &WorkRef, field: &str) -> Option<String> {
        let st = self.state.borrow();
        st.works
            .get(&work.work_id)
            .and_then(|ws| ws.fields.get(field).cloned())
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Number of recorded calls matching `pred`.
    pub fn count_calls(&self, pred: impl Fn(&HostCall) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn marker_writes(&self) -> usize {
        self.count_calls(|c| matches!(c, HostCall::SetMarker { .. }))
    }

    fn record(&self, call: HostCall) {
        self.state.borrow_mut().calls.push(call);
    }

    fn with_work<T>(
        &self,
        work: &WorkRef,
        f: impl FnOnce(&mut WorkState, &mut FormatId) -> T,
    ) -> HostResult<T> {
        let mut st = self.state.borrow_mut();
        let st = &mut *st;
        let ws = st
            .works
            .get_mut(&work.work_id)
            .ok_or_else(|| HostError::from(format!("unknown work '{}'", work.work_id)))?;
        Ok(f(ws, &mut st.next_format_id))
    }
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

impl WorkFormatsAccessor for RecordingHost {
    fn find_work(&self, work_id: &str) -> HostResult<Option<WorkRef>> {
        self.record(HostCall::FindWork {
            work_id: work_id.to_string(),
        });
        Ok(self
            .state
            .borrow()
            .works
            .get(work_id)
            .and_then(|ws| ws.work.clone()))
    }

    fn current_formats(&self, work: &WorkRef) -> HostResult<Vec<ExistingFormat>> {
        self.record(HostCall::CurrentFormats {
            work_id: work.work_id.clone(),
        });
        self.with_work(work, |ws, _| ws.formats.clone())
    }

    fn marker_field(&self, work: &WorkRef, field_name: &str) -> HostResult<Option<String>> {
        self.record(HostCall::MarkerRead {
            field: field_name.to_string(),
        });
        self.with_work(work, |ws, _| ws.fields.get(field_name).cloned())
    }
}

impl FormatCreator for RecordingHost {
    fn create(&self, work: &WorkRef, attributes: &NewFormat) -> HostResult<ExistingFormat> {
        let attempt = {
            let mut st = self.state.borrow_mut();
            st.create_attempts += 1;
            st.create_attempts
        };
        if self.fail_create_on.get() == Some(attempt) {
            return Err(injected("create"));
        }
        self.record(HostCall::Create {
            name: attributes.name.clone(),
            position: attributes.sequence_position,
        });
        self.with_work(work, |ws, next_id| {
            *next_id += 1;
            let mut names = BTreeMap::new();
            names.insert(attributes.locale.clone(), attributes.name.clone());
            let created = ExistingFormat {
                format_id: *next_id,
                sequence_position: attributes.sequence_position,
                names,
                category_code: attributes.category_code.clone(),
                is_physical: attributes.is_physical,
                dimensions: attributes.dimensions,
            };
            ws.formats.push(created.clone());
            created
        })
    }
}

impl WorkUpdater for RecordingHost {
    fn set_marker_field(
        &self,
        work: &WorkRef,
        field_name: &str,
        json_value: &str,
    ) -> HostResult<()> {
        if self.fail_marker_write.get() {
            return Err(injected("set_marker_field"));
        }
        self.record(HostCall::SetMarker {
            field: field_name.to_string(),
            value: json_value.to_string(),
        });
        self.with_work(work, |ws, _| {
            ws.fields
                .insert(field_name.to_string(), json_value.to_string());
        })
    }

    fn set_sequence_position(
        &self,
        work: &WorkRef,
        format_id: FormatId,
        position: u32,
    ) -> HostResult<()> {
        self.record(HostCall::SetSequence {
            format_id,
            position,
        });
        self.with_work(work, |ws, _| {
            match ws.formats.iter_mut().find(|f| f.format_id == format_id) {
                Some(f) => {
                    f.sequence_position = position;
                    true
                }
                None => false,
            }
        })
        .and_then(|found| {
            if found {
                Ok(())
            } else {
                Err(format!("unknown format {format_id}").into())
            }
        })
    }
}

impl FormatRemover for RecordingHost {
    fn delete(&self, work: &WorkRef, format_id: FormatId) -> HostResult<()> {
        let attempt = {
            let mut st = self.state.borrow_mut();
            st.delete_attempts += 1;
            st.delete_attempts
        };
        if self.fail_delete_on.get() == Some(attempt) {
            return Err(injected("delete"));
        }
        self.record(HostCall::Delete { format_id });
        self.with_work(work, |ws, _| ws.formats.retain(|f| f.format_id != format_id))
    }
}

impl AuditLogger for RecordingHost {
    fn log_format_created(&self, _work: &WorkRef, format_name: &str) -> HostResult<()> {
        if self.fail_audit.get() {
            return Err(injected("log_format_created"));
        }
        self.record(HostCall::AuditCreated {
            name: format_name.to_string(),
        });
        Ok(())
    }

    fn log_format_removed(&self, _work: &WorkRef, format_name: &str) -> HostResult<()> {
        if self.fail_audit.get() {
            return Err(injected("log_format_removed"));
        }
        self.record(HostCall::AuditRemoved {
            name: format_name.to_string(),
        });
        Ok(())
    }
}
