//! Scenario: catalog declarations are validated up front.
//!
//! # Invariants under test
//!
//! 1. Duplicate names are rejected (exact match, case-sensitive).
//! 2. Names differing only by case are distinct entries.
//! 3. A physical entry without dimensions is rejected.
//! 4. A digital entry with dimensions is rejected.
//! 5. Empty names and category codes are rejected.
//! 6. `Reversed` walks entries back to front without reordering storage.
//! 7. Deserialization routes through validation.

use dpf_catalog::{CatalogError, CatalogOrder, DesiredFormat, Dimensions, FormatCatalog};

#[test]
fn duplicate_name_rejected() {
    let err = FormatCatalog::new(vec![
        DesiredFormat::digital("PDF", "DA"),
        DesiredFormat::digital("EPUB", "DA"),
        DesiredFormat::digital("PDF", "BC"),
    ])
    .unwrap_err();

    assert_eq!(
        err,
        CatalogError::DuplicateName {
            name: "PDF".to_string()
        }
    );
}

#[test]
fn case_variants_are_distinct() {
    let cat = FormatCatalog::new(vec![
        DesiredFormat::digital("PDF", "DA"),
        DesiredFormat::digital("pdf", "DA"),
    ])
    .expect("case variants must not collide");
    assert_eq!(cat.len(), 2);
}

#[test]
fn physical_without_dimensions_rejected() {
    let mut hardcover = DesiredFormat::physical("Hardcover", "BB", Dimensions::new(180, 245));
    hardcover.dimensions = None;

    let err = FormatCatalog::new(vec![hardcover]).unwrap_err();
    assert_eq!(
        err,
        CatalogError::MissingDimensions {
            name: "Hardcover".to_string()
        }
    );
}

#[test]
fn digital_with_dimensions_rejected() {
    let mut pdf = DesiredFormat::digital("PDF", "DA");
    pdf.dimensions = Some(Dimensions::new(10, 10));

    let err = FormatCatalog::new(vec![pdf]).unwrap_err();
    assert!(matches!(err, CatalogError::UnexpectedDimensions { .. }));
}

#[test]
fn empty_name_and_code_rejected() {
    let err = FormatCatalog::new(vec![
        DesiredFormat::digital("PDF", "DA"),
        DesiredFormat::digital("   ", "DA"),
    ])
    .unwrap_err();
    assert_eq!(err, CatalogError::EmptyName { index: 1 });

    let err = FormatCatalog::new(vec![DesiredFormat::digital("PDF", "")]).unwrap_err();
    assert!(matches!(err, CatalogError::EmptyCategoryCode { .. }));
}

#[test]
fn reversed_policy_walks_back_to_front() {
    let cat = FormatCatalog::new(vec![
        DesiredFormat::digital("A", "DA"),
        DesiredFormat::digital("B", "DA"),
        DesiredFormat::digital("C", "DA"),
    ])
    .unwrap();

    assert_eq!(cat.names(CatalogOrder::Declared), vec!["A", "B", "C"]);
    assert_eq!(cat.names(CatalogOrder::Reversed), vec!["C", "B", "A"]);
    // Storage is untouched.
    assert_eq!(cat.entries()[0].name, "A");
}

#[test]
fn deserialization_validates() {
    let ok = r#"[
        {"name": "PDF", "category_code": "DA"},
        {"name": "Hardcover", "category_code": "BB", "physical": true,
         "dimensions": {"width": 180, "height": 245}}
    ]"#;
    let cat: FormatCatalog = serde_json::from_str(ok).unwrap();
    assert_eq!(cat.len(), 2);
    assert!(cat.get("Hardcover").unwrap().is_physical);

    let dup = r#"[
        {"name": "PDF", "category_code": "DA"},
        {"name": "PDF", "category_code": "DA"}
    ]"#;
    assert!(serde_json::from_str::<FormatCatalog>(dup).is_err());
}

#[test]
fn order_tokens_parse() {
    assert_eq!(CatalogOrder::parse("Declared"), Some(CatalogOrder::Declared));
    assert_eq!(CatalogOrder::parse("descending"), Some(CatalogOrder::Reversed));
    assert_eq!(CatalogOrder::parse("sideways"), None);
    assert_eq!(CatalogOrder::default(), CatalogOrder::Declared);
}
