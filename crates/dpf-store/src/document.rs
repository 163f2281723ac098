use std::collections::BTreeMap;

use dpf_catalog::Dimensions;
use dpf_reconcile::{ExistingFormat, FormatId, NewFormat, WorkRef};
use serde::{Deserialize, Serialize};

/// On-disk layout.
///
/// ```json
/// { "works": [ { "id": "42", "locale": "en_US",
///                "formats": [ { "id": 1, "seq": 1, "names": {"en_US": "PDF"},
///                               "category_code": "DA", "physical": false } ],
///                "fields": { "defaultPubFormatsCreated": "[\"PDF\"]" } } ] }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorksDocument {
    #[serde(default)]
    pub works: Vec<StoredWork>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredWork {
    pub id: String,
    pub locale: String,
    #[serde(default)]
    pub formats: Vec<StoredFormat>,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFormat {
    pub id: FormatId,
    pub seq: u32,
    #[serde(default)]
    pub names: BTreeMap<String, String>,
    #[serde(default)]
    pub category_code: String,
    #[serde(default)]
    pub physical: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
}

impl WorksDocument {
    pub fn work(&self, work_id: &str) -> Option<&StoredWork> {
        self.works.iter().find(|w| w.id == work_id)
    }

    pub fn work_mut(&mut self, work_id: &str) -> Option<&mut StoredWork> {
        self.works.iter_mut().find(|w| w.id == work_id)
    }

    /// Next free format id across the whole document.
    pub fn next_format_id(&self) -> FormatId {
        self.works
            .iter()
            .flat_map(|w| w.formats.iter().map(|f| f.id))
            .max()
            .unwrap_or(0)
            + 1
    }
}

impl StoredWork {
    pub fn work_ref(&self) -> WorkRef {
        WorkRef::new(self.id.clone(), self.locale.clone())
    }
}

impl StoredFormat {
    pub fn from_new(id: FormatId, attributes: &NewFormat) -> Self {
        let mut names = BTreeMap::new();
        names.insert(attributes.locale.clone(), attributes.name.clone());
        Self {
            id,
            seq: attributes.sequence_position,
            names,
            category_code: attributes.category_code.clone(),
            physical: attributes.is_physical,
            dimensions: attributes.dimensions,
        }
    }
}

impl From<&StoredFormat> for ExistingFormat {
    fn from(f: &StoredFormat) -> Self {
        ExistingFormat {
            format_id: f.id,
            sequence_position: f.seq,
            names: f.names.clone(),
            category_code: f.category_code.clone(),
            is_physical: f.physical,
            dimensions: f.dimensions,
        }
    }
}
