use serde::{Deserialize, Serialize};

/// Physical size of a bound format, in millimetres.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// One entry of the desired catalog.
///
/// Position in the catalog is implicit: it is the index in the owning
/// [`FormatCatalog`](crate::FormatCatalog), never stored on the entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredFormat {
    /// Display label, treated as an opaque matching key.
    pub name: String,

    /// Short classification code (e.g. `DA` digital document, `BB` bound
    /// book, `BC` purchase link).
    pub category_code: String,

    #[serde(default, rename = "physical")]
    pub is_physical: bool,

    /// Present only when `is_physical` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
}

impl DesiredFormat {
    /// A non-physical (digital or link) format.
    pub fn digital(name: impl Into<String>, category_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category_code: category_code.into(),
            is_physical: false,
            dimensions: None,
        }
    }

    /// A physical format with its dimensions.
    pub fn physical(
        name: impl Into<String>,
        category_code: impl Into<String>,
        dimensions: Dimensions,
    ) -> Self {
        Self {
            name: name.into(),
            category_code: category_code.into(),
            is_physical: true,
            dimensions: Some(dimensions),
        }
    }
}

/// Order in which the catalog is walked when assigning sequence positions
/// and creating missing formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogOrder {
    /// Declaration order (first declared entry gets position 1).
    #[default]
    Declared,
    /// Reverse declaration order (last declared entry gets position 1).
    Reversed,
}

impl CatalogOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogOrder::Declared => "declared",
            CatalogOrder::Reversed => "reversed",
        }
    }

    /// Parse a config/CLI token. Case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "declared" | "ascending" => Some(CatalogOrder::Declared),
            "reversed" | "descending" => Some(CatalogOrder::Reversed),
            _ => None,
        }
    }
}
