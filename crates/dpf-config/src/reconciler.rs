use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use dpf_catalog::{default_catalog, CatalogOrder, FormatCatalog, DEFAULT_MARKER_FIELD};
use dpf_reconcile::ReconcileSettings;
use serde_json::Value;

/// Where audit events go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditConfig {
    /// JSONL log path. `None` disables the file audit trail.
    pub path: Option<PathBuf>,
    pub hash_chain: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            path: None,
            hash_chain: true,
        }
    }
}

/// Everything the reconciler needs from configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcilerConfig {
    pub catalog: FormatCatalog,
    pub settings: ReconcileSettings,
    pub audit: AuditConfig,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            settings: ReconcileSettings::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl ReconcilerConfig {
    /// Build from merged config JSON (produced by `load_layered_yaml*`).
    ///
    /// All keys are optional:
    /// - catalog.order: `declared` | `reversed` (default `declared`)
    /// - catalog.formats: list of entries (default: built-in catalog)
    /// - marker.field_name: non-empty string (default `defaultPubFormatsCreated`)
    /// - audit.path: string (default: no file audit)
    /// - audit.hash_chain: bool (default true)
    pub fn from_config_json(cfg: &Value) -> Result<Self> {
        let order = match cfg.pointer("/catalog/order") {
            None | Some(Value::Null) => CatalogOrder::default(),
            Some(Value::String(s)) => CatalogOrder::parse(s).ok_or_else(|| {
                anyhow!("catalog.order must be 'declared' or 'reversed' (got '{s}')")
            })?,
            Some(other) => return Err(anyhow!("catalog.order must be a string (got {other})")),
        };

        let catalog = match cfg.pointer("/catalog/formats") {
            None | Some(Value::Null) => default_catalog(),
            Some(v) => serde_json::from_value::<FormatCatalog>(v.clone())
                .context("CONFIG_INVALID_CATALOG: catalog.formats")?,
        };

        let marker_field = match cfg.pointer("/marker/field_name") {
            None | Some(Value::Null) => DEFAULT_MARKER_FIELD.to_string(),
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(other) => {
                return Err(anyhow!(
                    "marker.field_name must be a non-empty string (got {other})"
                ))
            }
        };

        let audit_path = cfg
            .pointer("/audit/path")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let hash_chain = match cfg.pointer("/audit/hash_chain") {
            None | Some(Value::Null) => true,
            Some(Value::Bool(b)) => *b,
            Some(other) => return Err(anyhow!("audit.hash_chain must be a bool (got {other})")),
        };

        Ok(Self {
            catalog,
            settings: ReconcileSettings {
                order,
                marker_field,
            },
            audit: AuditConfig {
                path: audit_path,
                hash_chain,
            },
        })
    }
}
