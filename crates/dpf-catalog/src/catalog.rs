//! Validated desired-format catalog.
//!
//! # Invariants
//!
//! - Names are non-empty and unique (compared exactly, no case-folding).
//! - Category codes are non-empty.
//! - `is_physical == dimensions.is_some()`, and dimensions are non-zero.
//! - Declaration order is preserved; [`CatalogOrder`] only changes how the
//!   entries are walked, never how they are stored.
//!
//! A `FormatCatalog` can only be obtained through [`FormatCatalog::new`] (or
//! deserialization, which routes through it), so downstream code never has to
//! re-validate.

use serde::{Deserialize, Serialize};

use crate::{CatalogOrder, DesiredFormat};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Catalog declaration errors (the configuration error taxonomy).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogError {
    /// An entry name is empty or whitespace only.
    EmptyName { index: usize },
    /// Two entries share the same name.
    DuplicateName { name: String },
    /// An entry has an empty category code.
    EmptyCategoryCode { name: String },
    /// A physical entry declares no dimensions.
    MissingDimensions { name: String },
    /// A non-physical entry declares dimensions.
    UnexpectedDimensions { name: String },
    /// A physical entry declares a zero width or height.
    InvalidDimensions {
        name: String,
        width: u32,
        height: u32,
    },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName { index } => {
                write!(f, "catalog entry #{index} has an empty name")
            }
            Self::DuplicateName { name } => {
                write!(f, "catalog declares '{name}' more than once")
            }
            Self::EmptyCategoryCode { name } => {
                write!(f, "catalog entry '{name}' has an empty category code")
            }
            Self::MissingDimensions { name } => {
                write!(f, "physical catalog entry '{name}' declares no dimensions")
            }
            Self::UnexpectedDimensions { name } => {
                write!(
                    f,
                    "catalog entry '{name}' is not physical but declares dimensions"
                )
            }
            Self::InvalidDimensions {
                name,
                width,
                height,
            } => write!(
                f,
                "catalog entry '{name}' has invalid dimensions {width}x{height}"
            ),
        }
    }
}

impl std::error::Error for CatalogError {}

// ---------------------------------------------------------------------------
// FormatCatalog
// ---------------------------------------------------------------------------

/// Ordered, validated list of desired formats.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DesiredFormat>", into = "Vec<DesiredFormat>")]
pub struct FormatCatalog {
    /// Entries in declaration order.
    entries: Vec<DesiredFormat>,
}

impl FormatCatalog {
    /// Validate and build a catalog. The first violation found (in declaration
    /// order) is returned.
    pub fn new(entries: Vec<DesiredFormat>) -> Result<Self, CatalogError> {
        for (index, entry) in entries.iter().enumerate() {
            validate_entry(index, entry)?;
            if entries[..index].iter().any(|e| e.name == entry.name) {
                return Err(CatalogError::DuplicateName {
                    name: entry.name.clone(),
                });
            }
        }
        Ok(Self { entries })
    }

    /// An empty catalog. Reconciling against it is a no-op.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> &[DesiredFormat] {
        &self.entries
    }

    /// Entries in the effective order for `order`. Index `i` of the returned
    /// vector has sequence position `i + 1`.
    pub fn ordered(&self, order: CatalogOrder) -> Vec<&DesiredFormat> {
        match order {
            CatalogOrder::Declared => self.entries.iter().collect(),
            CatalogOrder::Reversed => self.entries.iter().rev().collect(),
        }
    }

    /// Names in the effective order for `order`.
    pub fn names(&self, order: CatalogOrder) -> Vec<&str> {
        self.ordered(order)
            .into_iter()
            .map(|e| e.name.as_str())
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&DesiredFormat> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// 1-based sequence position of `name` under `order`.
    pub fn position_of(&self, name: &str, order: CatalogOrder) -> Option<u32> {
        let idx = self.entries.iter().position(|e| e.name == name)?;
        let rank = match order {
            CatalogOrder::Declared => idx,
            CatalogOrder::Reversed => self.entries.len() - 1 - idx,
        };
        Some(rank as u32 + 1)
    }
}

impl TryFrom<Vec<DesiredFormat>> for FormatCatalog {
    type Error = CatalogError;

    fn try_from(entries: Vec<DesiredFormat>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<FormatCatalog> for Vec<DesiredFormat> {
    fn from(catalog: FormatCatalog) -> Self {
        catalog.entries
    }
}

fn validate_entry(index: usize, entry: &DesiredFormat) -> Result<(), CatalogError> {
    if entry.name.trim().is_empty() {
        return Err(CatalogError::EmptyName { index });
    }
    if entry.category_code.trim().is_empty() {
        return Err(CatalogError::EmptyCategoryCode {
            name: entry.name.clone(),
        });
    }
    match (entry.is_physical, entry.dimensions) {
        (true, None) => Err(CatalogError::MissingDimensions {
            name: entry.name.clone(),
        }),
        (false, Some(_)) => Err(CatalogError::UnexpectedDimensions {
            name: entry.name.clone(),
        }),
        (true, Some(d)) if d.width == 0 || d.height == 0 => Err(CatalogError::InvalidDimensions {
            name: entry.name.clone(),
            width: d.width,
            height: d.height,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dimensions;

    #[test]
    fn position_of_follows_policy() {
        let cat = FormatCatalog::new(vec![
            DesiredFormat::digital("A", "DA"),
            DesiredFormat::digital("B", "DA"),
            DesiredFormat::digital("C", "DA"),
        ])
        .unwrap();

        assert_eq!(cat.position_of("A", CatalogOrder::Declared), Some(1));
        assert_eq!(cat.position_of("C", CatalogOrder::Declared), Some(3));
        assert_eq!(cat.position_of("A", CatalogOrder::Reversed), Some(3));
        assert_eq!(cat.position_of("C", CatalogOrder::Reversed), Some(1));
        assert_eq!(cat.position_of("Z", CatalogOrder::Declared), None);
    }

    #[test]
    fn zero_dimension_rejected() {
        let err = FormatCatalog::new(vec![DesiredFormat::physical(
            "Hardcover",
            "BB",
            Dimensions::new(0, 245),
        )])
        .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidDimensions { .. }));
    }
}
