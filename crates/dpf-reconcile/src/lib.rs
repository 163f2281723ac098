//! dpf-reconcile
//!
//! Publication-format reconciliation engine.
//!
//! Given a desired catalog and the formats currently attached to a work:
//! - Missing catalog entries are created, in catalog order
//! - Pre-existing matches are re-sequenced to their catalog rank
//! - Auto-created names are recorded in a marker field on the work
//! - Manually added formats are never duplicated or removed
//!
//! The engine is stateless. All host state is read and written through the
//! collaborator ports in [`ports`]; no port call is retried here.

mod engine;
mod error;
mod marker;
pub mod ports;
mod types;

pub use engine::FormatReconciler;
pub use error::ReconcileError;
pub use marker::{MarkerDecodeError, ReconciliationMarker};
pub use ports::{
    AuditLogger, FormatCreator, FormatRemover, HostError, HostResult, LocalizedNameResolver,
    WorkFormatsAccessor, WorkLocaleResolver, WorkUpdater,
};
pub use types::*;
