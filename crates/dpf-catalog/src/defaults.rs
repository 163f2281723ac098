use crate::{DesiredFormat, Dimensions, FormatCatalog};

/// Field on the work record that stores the names of auto-created formats.
pub const DEFAULT_MARKER_FIELD: &str = "defaultPubFormatsCreated";

/// Built-in catalog used when configuration declares none.
pub fn default_catalog() -> FormatCatalog {
    let entries = vec![
        DesiredFormat::digital("PDF", "DA"),
        DesiredFormat::digital("Bibliography", "DA"),
        DesiredFormat::physical("Hardcover", "BB", Dimensions::new(180, 245)),
        DesiredFormat::digital("Buy from Amazon.de", "BC"),
        DesiredFormat::digital("Buy from Amazon.co.uk", "BC"),
        DesiredFormat::digital("Buy from Amazon.com", "BC"),
        DesiredFormat::digital("Collaborative reading on Paperhive", "DA"),
    ];
    // Static entries above satisfy every catalog invariant.
    FormatCatalog::new(entries).unwrap_or_default()
}
