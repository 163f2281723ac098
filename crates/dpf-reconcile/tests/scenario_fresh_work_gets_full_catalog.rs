//! Scenario: a work with no formats receives the whole catalog.
//!
//! # Invariants under test
//!
//! 1. Exactly `len(catalog)` formats are created.
//! 2. Positions are 1..=len in catalog order.
//! 3. The marker lists every catalog name, in catalog order.
//! 4. Attributes (category code, physical flag, dimensions) are copied from
//!    the catalog entry; digital entries carry no dimensions.
//! 5. One audit entry per created format, emitted after its create.
//! 6. New names are stored under the work's locale.

use dpf_catalog::{default_catalog, Dimensions, DEFAULT_MARKER_FIELD};
use dpf_reconcile::{FormatReconciler, ReconcileSettings};
use dpf_testkit::{catalog_of, HostCall, RecordingHost};

#[test]
fn every_entry_created_in_catalog_order() {
    let host = RecordingHost::new();
    let work = host.add_work("w1", "en_US");
    let catalog = catalog_of(&["A", "B", "C"]);

    let rec = FormatReconciler::new(&host, &host, &host, &host, ReconcileSettings::default());
    let r = rec.reconcile(&catalog, &work).unwrap();

    assert_eq!(r.created, 3);
    assert_eq!(r.created_names, vec!["A", "B", "C"]);
    assert_eq!(r.resequenced, 0);

    let positions = host.positions(&work);
    assert_eq!(positions["A"], 1);
    assert_eq!(positions["B"], 2);
    assert_eq!(positions["C"], 3);

    assert_eq!(
        host.field(&work, DEFAULT_MARKER_FIELD).as_deref(),
        Some(r#"["A","B","C"]"#)
    );
    assert_eq!(host.marker_writes(), 1);
}

#[test]
fn default_catalog_attributes_copied() {
    let host = RecordingHost::new();
    let work = host.add_work("w1", "de_DE");
    let catalog = default_catalog();

    let rec = FormatReconciler::new(&host, &host, &host, &host, ReconcileSettings::default());
    let r = rec.reconcile(&catalog, &work).unwrap();
    assert_eq!(r.created, 7);

    let formats = host.formats(&work);
    assert_eq!(formats.len(), 7);

    let hardcover = formats
        .iter()
        .find(|f| f.names.get("de_DE").map(String::as_str) == Some("Hardcover"))
        .expect("Hardcover must be created");
    assert!(hardcover.is_physical);
    assert_eq!(hardcover.dimensions, Some(Dimensions::new(180, 245)));
    assert_eq!(hardcover.category_code, "BB");
    assert_eq!(hardcover.sequence_position, 3);

    let pdf = &formats[0];
    assert_eq!(pdf.names.get("de_DE").map(String::as_str), Some("PDF"));
    assert!(!pdf.is_physical);
    assert_eq!(pdf.dimensions, None);
    assert_eq!(pdf.category_code, "DA");

    let amazon_com = formats
        .iter()
        .find(|f| f.names.get("de_DE").map(String::as_str) == Some("Buy from Amazon.com"))
        .unwrap();
    assert_eq!(amazon_com.category_code, "BC");
    assert_eq!(amazon_com.sequence_position, 6);
}

#[test]
fn audit_follows_each_create() {
    let host = RecordingHost::new();
    let work = host.add_work("w1", "en_US");
    let catalog = catalog_of(&["A", "B"]);

    let rec = FormatReconciler::new(&host, &host, &host, &host, ReconcileSettings::default());
    rec.reconcile(&catalog, &work).unwrap();

    let writes: Vec<HostCall> = host
        .calls()
        .into_iter()
        .filter(|c| {
            matches!(
                c,
                HostCall::Create { .. } | HostCall::AuditCreated { .. } | HostCall::SetMarker { .. }
            )
        })
        .collect();

    assert_eq!(
        writes,
        vec![
            HostCall::Create {
                name: "A".to_string(),
                position: 1
            },
            HostCall::AuditCreated {
                name: "A".to_string()
            },
            HostCall::Create {
                name: "B".to_string(),
                position: 2
            },
            HostCall::AuditCreated {
                name: "B".to_string()
            },
            HostCall::SetMarker {
                field: DEFAULT_MARKER_FIELD.to_string(),
                value: r#"["A","B"]"#.to_string()
            },
        ]
    );
}
