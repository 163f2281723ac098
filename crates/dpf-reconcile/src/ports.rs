//! Host collaborator ports.
//!
//! The reconciler owns no storage. Every read and write goes through one of
//! these traits, implemented by the host (a database-backed service in
//! production, `dpf-store` for the CLI, `dpf-testkit` in tests).
//!
//! Implementations report failure as [`HostError`]; the engine wraps it in
//! [`ReconcileError::Persistence`](crate::ReconcileError::Persistence) and
//! aborts the run. Ports must not retry on the engine's behalf silently if
//! the retry can duplicate a create.
//!
//! All methods take `&self`: hosts that mutate in memory use interior
//! mutability. Blanket impls for `&T` let one host value back every port.

use crate::types::{ExistingFormat, FormatId, NewFormat, WorkRef};

/// Boxed host failure.
pub type HostError = Box<dyn std::error::Error + Send + Sync>;

/// Convenience alias used by every port method.
pub type HostResult<T> = std::result::Result<T, HostError>;

/// Read access to works, their formats, and their fields.
pub trait WorkFormatsAccessor {
    /// Resolve a work by id. `Ok(None)` when the work does not exist.
    fn find_work(&self, work_id: &str) -> HostResult<Option<WorkRef>>;

    /// Formats currently attached to `work`, in any order.
    fn current_formats(&self, work: &WorkRef) -> HostResult<Vec<ExistingFormat>>;

    /// Raw value of a work field. `Ok(None)` when the field was never set.
    fn marker_field(&self, work: &WorkRef, field_name: &str) -> HostResult<Option<String>>;
}

/// Creates format records. The host assigns the new identity.
pub trait FormatCreator {
    fn create(&self, work: &WorkRef, attributes: &NewFormat) -> HostResult<ExistingFormat>;
}

/// Writes to the work record and its existing formats.
pub trait WorkUpdater {
    fn set_marker_field(&self, work: &WorkRef, field_name: &str, json_value: &str)
        -> HostResult<()>;

    fn set_sequence_position(
        &self,
        work: &WorkRef,
        format_id: FormatId,
        position: u32,
    ) -> HostResult<()>;
}

/// Deletes format records. Only used by bulk removal of auto-created formats.
pub trait FormatRemover {
    fn delete(&self, work: &WorkRef, format_id: FormatId) -> HostResult<()>;
}

/// Audit trail sink.
pub trait AuditLogger {
    fn log_format_created(&self, work: &WorkRef, format_name: &str) -> HostResult<()>;

    fn log_format_removed(&self, work: &WorkRef, format_name: &str) -> HostResult<()>;
}

/// Derives the matching key (display name) of an existing format.
pub trait LocalizedNameResolver {
    fn resolve(&self, work: &WorkRef, format: &ExistingFormat) -> String;
}

// ---------------------------------------------------------------------------
// Default resolver
// ---------------------------------------------------------------------------

/// Resolves a format name in the work's locale.
///
/// Falls back to the first non-empty localized name (locale order), then to
/// the empty string. An empty name never matches a catalog entry because
/// catalog names are non-empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorkLocaleResolver;

impl LocalizedNameResolver for WorkLocaleResolver {
    fn resolve(&self, work: &WorkRef, format: &ExistingFormat) -> String {
        if let Some(name) = format.names.get(&work.locale) {
            if !name.is_empty() {
                return name.clone();
            }
        }
        format
            .names
            .values()
            .find(|n| !n.is_empty())
            .cloned()
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Blanket impls for shared references
// ---------------------------------------------------------------------------

impl<T: WorkFormatsAccessor + ?Sized> WorkFormatsAccessor for &T {
    fn find_work(&self, work_id: &str) -> HostResult<Option<WorkRef>> {
        (**self).find_work(work_id)
    }

    fn current_formats(&self, work: &WorkRef) -> HostResult<Vec<ExistingFormat>> {
        (**self).current_formats(work)
    }

    fn marker_field(&self, work: &WorkRef, field_name: &str) -> HostResult<Option<String>> {
        (**self).marker_field(work, field_name)
    }
}

impl<T: FormatCreator + ?Sized> FormatCreator for &T {
    fn create(&self, work: &WorkRef, attributes: &NewFormat) -> HostResult<ExistingFormat> {
        (**self).create(work, attributes)
    }
}

impl<T: WorkUpdater + ?Sized> WorkUpdater for &T {
    fn set_marker_field(
        &self,
        work: &WorkRef,
        field_name: &str,
        json_value: &str,
    ) -> HostResult<()> {
        (**self).set_marker_field(work, field_name, json_value)
    }

    fn set_sequence_position(
        &self,
        work: &WorkRef,
        format_id: FormatId,
        position: u32,
    ) -> HostResult<()> {
        (**self).set_sequence_position(work, format_id, position)
    }
}

impl<T: FormatRemover + ?Sized> FormatRemover for &T {
    fn delete(&self, work: &WorkRef, format_id: FormatId) -> HostResult<()> {
        (**self).delete(work, format_id)
    }
}

impl<T: AuditLogger + ?Sized> AuditLogger for &T {
    fn log_format_created(&self, work: &WorkRef, format_name: &str) -> HostResult<()> {
        (**self).log_format_created(work, format_name)
    }

    fn log_format_removed(&self, work: &WorkRef, format_name: &str) -> HostResult<()> {
        (**self).log_format_removed(work, format_name)
    }
}

impl<T: LocalizedNameResolver + ?Sized> LocalizedNameResolver for &T {
    fn resolve(&self, work: &WorkRef, format: &ExistingFormat) -> String {
        (**self).resolve(work, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_prefers_work_locale_then_falls_back() {
        let work = WorkRef::new("w1", "de_DE");

        let mut f = ExistingFormat::named(1, 1, "en_US", "PDF");
        assert_eq!(WorkLocaleResolver.resolve(&work, &f), "PDF");

        f.names.insert("de_DE".to_string(), "PDF-Datei".to_string());
        assert_eq!(WorkLocaleResolver.resolve(&work, &f), "PDF-Datei");

        let empty = ExistingFormat {
            names: Default::default(),
            ..f
        };
        assert_eq!(WorkLocaleResolver.resolve(&work, &empty), "");
    }
}
