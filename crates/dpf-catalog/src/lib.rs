//! dpf-catalog
//!
//! Desired publication-format catalog.
//!
//! - A catalog is an ordered list of format definitions every work should expose
//! - Names are unique (exact, case-sensitive) and act as the matching key
//! - Physical entries carry dimensions; digital entries never do
//! - Effective order is a policy ([`CatalogOrder`]), not a constant
//!
//! Pure types + validation. No IO.

mod catalog;
mod defaults;
mod types;

pub use catalog::{CatalogError, FormatCatalog};
pub use defaults::{default_catalog, DEFAULT_MARKER_FIELD};
pub use types::*;
