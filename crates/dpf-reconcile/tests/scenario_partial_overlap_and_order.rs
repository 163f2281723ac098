//! Scenario: partial overlap and canonical re-sequencing.
//!
//! # Invariants under test
//!
//! 1. Catalog [A,B,C] with existing [B] creates [A,C] at positions 1 and 3,
//!    moves B to 2, and writes marker ["A","C"].
//! 2. Catalog [A,B,C] with existing [C,A] (out of order) ends at
//!    {A:1, B:2, C:3} regardless of prior positions.
//! 3. Formats outside the catalog are left untouched.
//! 4. The `Reversed` policy ranks and creates back to front.
//! 5. When two existing formats share a catalog name, only the first (by
//!    current position) is re-sequenced.

use dpf_catalog::{CatalogOrder, DEFAULT_MARKER_FIELD};
use dpf_reconcile::{FormatReconciler, ReconcileSettings};
use dpf_testkit::{catalog_of, HostCall, RecordingHost};

#[test]
fn partial_overlap_creates_missing_in_catalog_order() {
    let host = RecordingHost::new();
    let work = host.add_work("w1", "en_US");
    host.add_format_at(&work, "B", 1);
    let catalog = catalog_of(&["A", "B", "C"]);

    let rec = FormatReconciler::new(&host, &host, &host, &host, ReconcileSettings::default());
    let r = rec.reconcile(&catalog, &work).unwrap();

    assert_eq!(r.created, 2);
    assert_eq!(r.created_names, vec!["A", "C"]);
    assert_eq!(r.resequenced, 1);

    let positions = host.positions(&work);
    assert_eq!(positions["A"], 1);
    assert_eq!(positions["B"], 2);
    assert_eq!(positions["C"], 3);

    assert_eq!(
        host.field(&work, DEFAULT_MARKER_FIELD).as_deref(),
        Some(r#"["A","C"]"#)
    );
}

#[test]
fn out_of_order_existing_formats_are_resequenced() {
    let host = RecordingHost::new();
    let work = host.add_work("w1", "en_US");
    host.add_format_at(&work, "C", 1);
    host.add_format_at(&work, "A", 2);
    let catalog = catalog_of(&["A", "B", "C"]);

    let rec = FormatReconciler::new(&host, &host, &host, &host, ReconcileSettings::default());
    let r = rec.reconcile(&catalog, &work).unwrap();

    assert_eq!(r.created_names, vec!["B"]);
    assert_eq!(r.resequenced, 2);
    assert_eq!(host.names(&work), vec!["A", "B", "C"]);

    let positions = host.positions(&work);
    assert_eq!(positions["A"], 1);
    assert_eq!(positions["B"], 2);
    assert_eq!(positions["C"], 3);
}

#[test]
fn resequencing_alone_when_all_present() {
    let host = RecordingHost::new();
    let work = host.add_work("w1", "en_US");
    host.add_format_at(&work, "B", 5);
    host.add_format_at(&work, "A", 9);
    let catalog = catalog_of(&["A", "B"]);

    let rec = FormatReconciler::new(&host, &host, &host, &host, ReconcileSettings::default());
    let r = rec.reconcile(&catalog, &work).unwrap();

    assert_eq!(r.created, 0);
    assert_eq!(r.resequenced, 2);
    assert_eq!(host.marker_writes(), 0);
    assert_eq!(host.positions(&work)["A"], 1);
    assert_eq!(host.positions(&work)["B"], 2);
}

#[test]
fn non_catalog_formats_untouched() {
    let host = RecordingHost::new();
    let work = host.add_work("w1", "en_US");
    let manual = host.add_format_at(&work, "Audiobook", 1);
    let catalog = catalog_of(&["A"]);

    let rec = FormatReconciler::new(&host, &host, &host, &host, ReconcileSettings::default());
    rec.reconcile(&catalog, &work).unwrap();

    assert_eq!(
        host.count_calls(|c| matches!(c, HostCall::SetSequence { format_id, .. } if *format_id == manual)),
        0
    );
    assert_eq!(host.positions(&work)["Audiobook"], 1);
}

#[test]
fn reversed_policy_ranks_back_to_front() {
    let host = RecordingHost::new();
    let work = host.add_work("w1", "en_US");
    let catalog = catalog_of(&["A", "B", "C"]);
    let settings = ReconcileSettings {
        order: CatalogOrder::Reversed,
        ..ReconcileSettings::default()
    };

    let rec = FormatReconciler::new(&host, &host, &host, &host, settings);
    let r = rec.reconcile(&catalog, &work).unwrap();

    assert_eq!(r.created_names, vec!["C", "B", "A"]);
    let positions = host.positions(&work);
    assert_eq!(positions["C"], 1);
    assert_eq!(positions["B"], 2);
    assert_eq!(positions["A"], 3);
    assert_eq!(
        host.field(&work, DEFAULT_MARKER_FIELD).as_deref(),
        Some(r#"["C","B","A"]"#)
    );
}

#[test]
fn duplicate_existing_name_only_first_resequenced() {
    let host = RecordingHost::new();
    let work = host.add_work("w1", "en_US");
    let first = host.add_format_at(&work, "A", 4);
    let second = host.add_format_at(&work, "A", 7);
    let catalog = catalog_of(&["A"]);

    let rec = FormatReconciler::new(&host, &host, &host, &host, ReconcileSettings::default());
    let r = rec.reconcile(&catalog, &work).unwrap();

    assert_eq!(r.created, 0);
    assert_eq!(r.resequenced, 1);
    let calls = host.calls();
    assert!(calls.contains(&HostCall::SetSequence {
        format_id: first,
        position: 1
    }));
    assert!(!calls
        .iter()
        .any(|c| matches!(c, HostCall::SetSequence { format_id, .. } if *format_id == second)));
}
