use std::collections::BTreeMap;

use dpf_catalog::{CatalogOrder, DesiredFormat, Dimensions, DEFAULT_MARKER_FIELD};
use serde::Serialize;

/// Host-assigned identity of a format record.
pub type FormatId = u64;

/// Handle to a resolved work (the publishable entity).
///
/// The reconciler never creates or deletes works; it only receives handles
/// to works the host has already resolved.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WorkRef {
    pub work_id: String,
    /// Primary locale of the work. New format names are stored under it.
    pub locale: String,
}

impl WorkRef {
    pub fn new(work_id: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            work_id: work_id.into(),
            locale: locale.into(),
        }
    }
}

/// A format record currently attached to a work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExistingFormat {
    pub format_id: FormatId,
    pub sequence_position: u32,
    /// Localized display names (locale -> name).
    pub names: BTreeMap<String, String>,
    pub category_code: String,
    pub is_physical: bool,
    pub dimensions: Option<Dimensions>,
}

impl ExistingFormat {
    /// Single-locale record, mostly useful for hosts and tests.
    pub fn named(
        format_id: FormatId,
        sequence_position: u32,
        locale: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let mut names = BTreeMap::new();
        names.insert(locale.into(), name.into());
        Self {
            format_id,
            sequence_position,
            names,
            category_code: String::new(),
            is_physical: false,
            dimensions: None,
        }
    }
}

/// Attributes handed to [`FormatCreator::create`](crate::FormatCreator::create).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewFormat {
    pub name: String,
    /// Locale the name is stored under (the work's locale).
    pub locale: String,
    pub category_code: String,
    pub is_physical: bool,
    pub dimensions: Option<Dimensions>,
    pub sequence_position: u32,
}

impl NewFormat {
    pub(crate) fn from_desired(desired: &DesiredFormat, locale: &str, position: u32) -> Self {
        Self {
            name: desired.name.clone(),
            locale: locale.to_string(),
            category_code: desired.category_code.clone(),
            is_physical: desired.is_physical,
            dimensions: if desired.is_physical {
                desired.dimensions
            } else {
                None
            },
            sequence_position: position,
        }
    }
}

/// Per-deployment reconciler policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileSettings {
    /// How the catalog is walked for ranking and creation.
    pub order: CatalogOrder,
    /// Work field holding the JSON-encoded auto-created names.
    pub marker_field: String,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            order: CatalogOrder::Declared,
            marker_field: DEFAULT_MARKER_FIELD.to_string(),
        }
    }
}

/// Outcome of one reconciliation run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub created: usize,
    /// Created names in creation (catalog) order.
    pub created_names: Vec<String>,
    /// Pre-existing formats whose stored position was rewritten.
    pub resequenced: usize,
}

impl ReconciliationResult {
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.resequenced == 0
    }
}

/// Outcome of removing auto-created formats.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RemovalResult {
    pub removed: usize,
    pub removed_names: Vec<String>,
}
