//! Reconciliation marker codec.
//!
//! The marker is an ordered set of format names created by the reconciler,
//! persisted on the work as a UTF-8 JSON array of strings. An absent field or
//! an empty string both mean "no auto-created formats".

/// Ordered, duplicate-free list of auto-created format names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconciliationMarker {
    names: Vec<String>,
}

/// Stored marker value is not a JSON list of strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkerDecodeError {
    pub reason: String,
}

impl std::fmt::Display for MarkerDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "marker is not a JSON list of strings: {}", self.reason)
    }
}

impl std::error::Error for MarkerDecodeError {}

impl ReconciliationMarker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a stored field value. Later duplicates are dropped.
    pub fn decode(raw: Option<&str>) -> Result<Self, MarkerDecodeError> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(Self::new()),
            Some(s) => s,
        };
        let names: Vec<String> = serde_json::from_str(raw).map_err(|e| MarkerDecodeError {
            reason: e.to_string(),
        })?;
        let mut marker = Self::new();
        marker.extend(names);
        Ok(marker)
    }

    /// Encode for storage. An empty marker encodes to the empty string (the
    /// field's default value).
    pub fn encode(&self) -> String {
        if self.names.is_empty() {
            return String::new();
        }
        // A Vec<String> always serializes.
        serde_json::to_string(&self.names).unwrap_or_default()
    }

    /// Append names not already present, preserving their order.
    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.contains(&name) {
                self.names.push(name);
            }
        }
    }

    /// Drop `name` if present. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_empty_decode_to_empty() {
        assert!(ReconciliationMarker::decode(None).unwrap().is_empty());
        assert!(ReconciliationMarker::decode(Some("")).unwrap().is_empty());
        assert!(ReconciliationMarker::decode(Some("  ")).unwrap().is_empty());
        assert!(ReconciliationMarker::decode(Some("[]")).unwrap().is_empty());
    }

    #[test]
    fn encode_matches_stored_layout() {
        let mut m = ReconciliationMarker::new();
        assert_eq!(m.encode(), "");
        m.extend(["A", "C"]);
        assert_eq!(m.encode(), r#"["A","C"]"#);
    }

    #[test]
    fn decode_dedups_and_keeps_order() {
        let m = ReconciliationMarker::decode(Some(r#"["B","A","B"]"#)).unwrap();
        assert_eq!(m.names(), &["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn non_list_rejected() {
        assert!(ReconciliationMarker::decode(Some(r#"{"a":1}"#)).is_err());
        assert!(ReconciliationMarker::decode(Some("[1,2]")).is_err());
        assert!(ReconciliationMarker::decode(Some("not json")).is_err());
    }

    #[test]
    fn remove_reports_presence() {
        let mut m = ReconciliationMarker::decode(Some(r#"["A","B"]"#)).unwrap();
        assert!(m.remove("A"));
        assert!(!m.remove("A"));
        assert_eq!(m.names(), &["B".to_string()]);
    }
}
