//! dpf-testkit
//!
//! In-memory host for scenario tests. Implements every reconciler port,
//! records each call in order, and can be told to fail specific calls.
//!
//! NOT for production use: state lives in `RefCell`s and is not `Sync`.

mod host;

pub use host::{HostCall, RecordingHost};

use dpf_catalog::{DesiredFormat, FormatCatalog};

/// Digital catalog named after `names`, category `DA`, in the given order.
pub fn catalog_of(names: &[&str]) -> FormatCatalog {
    let entries = names
        .iter()
        .map(|n| DesiredFormat::digital(*n, "DA"))
        .collect();
    FormatCatalog::new(entries).expect("test catalog names must be unique and non-empty")
}
