//! Audit trail, catalog listing, and config hashing through the CLI.
//!
//! Validates:
//! 1) With /audit/path configured, reconcile appends one chained line per
//!    created format and `dpf audit verify` accepts the file.
//! 2) A tampered audit file makes `dpf audit verify` exit non-zero.
//! 3) `dpf catalog` prints the built-in catalog when no config is given,
//!    and honours the reversed order policy.
//! 4) `dpf config-hash` is stable across runs for the same inputs.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn dpf(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("dpf").unwrap();
    cmd.current_dir(dir).env_remove("DPF_STORE").env("RUST_LOG", "warn");
    cmd
}

#[test]
fn reconcile_writes_verifiable_audit_chain() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("works.json");
    std::fs::write(
        &store,
        r#"{ "works": [ { "id": "7", "locale": "de_DE", "formats": [] } ] }"#,
    )
    .unwrap();
    let audit = dir.path().join("audit.jsonl");
    let cfg = dir.path().join("dpf.yaml");
    std::fs::write(
        &cfg,
        format!(
            "catalog:\n  formats:\n    - {{ name: PDF, category_code: DA }}\n    - {{ name: EPUB, category_code: DA }}\naudit:\n  path: {}\n",
            audit.display()
        ),
    )
    .unwrap();

    dpf(dir.path())
        .args(["reconcile", "--work", "7", "--store"])
        .arg(&store)
        .arg("--config")
        .arg(&cfg)
        .assert()
        .success();

    let content = std::fs::read_to_string(&audit).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(content.contains("FORMAT_CREATED"));

    dpf(dir.path())
        .args(["audit", "verify"])
        .arg(&audit)
        .assert()
        .success()
        .stdout(predicate::str::contains("audit_valid=true lines=2"));

    let tampered = content.replacen("\"PDF\"", "\"XPS\"", 1);
    std::fs::write(&audit, tampered).unwrap();

    dpf(dir.path())
        .args(["audit", "verify"])
        .arg(&audit)
        .assert()
        .failure()
        .stdout(predicate::str::contains("audit_valid=false line=1"));
}

#[test]
fn catalog_lists_defaults_and_honours_order() {
    let dir = tempfile::tempdir().unwrap();

    dpf(dir.path())
        .arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("order=declared"))
        .stdout(predicate::str::contains("Collaborative reading on Paperhive"));

    let cfg = dir.path().join("rev.yaml");
    std::fs::write(
        &cfg,
        "catalog:\n  order: reversed\n  formats:\n    - { name: A, category_code: DA }\n    - { name: B, category_code: DA }\n",
    )
    .unwrap();

    let out = dpf(dir.path())
        .args(["catalog", "--config"])
        .arg(&cfg)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("order=reversed"));
    let a = text.find("\"A\"").unwrap();
    let b = text.find("\"B\"").unwrap();
    assert!(b < a, "reversed policy lists B first:\n{text}");
}

#[test]
fn config_hash_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    std::fs::write(&base, "marker:\n  field_name: autoFormats\ncatalog:\n  order: declared\n").unwrap();

    let run = || {
        dpf(dir.path())
            .arg("config-hash")
            .arg(&base)
            .assert()
            .success()
            .stdout(predicate::str::starts_with("config_hash="))
            .get_output()
            .stdout
            .clone()
    };
    assert_eq!(run(), run());
}
