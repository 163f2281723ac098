use dpf_catalog::CatalogError;

use crate::ports::HostError;

/// Errors surfaced by [`FormatReconciler`](crate::FormatReconciler).
///
/// Collaborator failures are never swallowed: the first one aborts the run
/// and is returned as [`ReconcileError::Persistence`].
#[derive(Debug)]
pub enum ReconcileError {
    /// The requested work could not be resolved.
    NotFound { work_id: String },
    /// A host port failed. `operation` names the port method.
    Persistence {
        operation: &'static str,
        source: HostError,
    },
    /// The desired catalog is invalid.
    Configuration(CatalogError),
    /// The stored marker field is not a JSON list of strings.
    CorruptMarker { field: String, reason: String },
}

impl ReconcileError {
    pub(crate) fn persistence(operation: &'static str) -> impl FnOnce(HostError) -> Self {
        move |source| ReconcileError::Persistence { operation, source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReconcileError::NotFound { .. })
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, ReconcileError::Persistence { .. })
    }
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { work_id } => write!(f, "work '{work_id}' not found"),
            Self::Persistence { operation, source } => {
                write!(f, "host operation '{operation}' failed: {source}")
            }
            Self::Configuration(e) => write!(f, "invalid format catalog: {e}"),
            Self::CorruptMarker { field, reason } => {
                write!(f, "marker field '{field}' is corrupt: {reason}")
            }
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Persistence { source, .. } => Some(source.as_ref()),
            Self::Configuration(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CatalogError> for ReconcileError {
    fn from(e: CatalogError) -> Self {
        ReconcileError::Configuration(e)
    }
}
