//! End-to-end tests that invoke the compiled `cc-bindings-ir` binary as a
//! subprocess: CLI argument parsing, config loading, translation unit
//! deserialization, IR output, and exit codes.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use cc_bindings_ir::ast::types::BuiltinType;
use cc_bindings_ir::ast::{QualType, TranslationUnit, TuBuilder};
use cc_bindings_ir::ir::{Identifier, Item, UnqualifiedIdentifier};
use cc_bindings_ir::Ir;

/// Locate the compiled binary built by `cargo test`.
fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_cc-bindings-ir"))
}

/// Run the binary with the given arguments, returning the full Output.
fn run_importer(args: &[&str]) -> Output {
    Command::new(binary_path())
        .args(args)
        .output()
        .expect("failed to execute cc-bindings-ir binary")
}

fn write_config(dir: &Path) -> PathBuf {
    let config_path = dir.join("cc-bindings-ir.toml");
    std::fs::write(
        &config_path,
        r#"current_target = "//example:lib"
public_headers = ["example.h"]

[header_targets]
"example.h" = "//example:lib"
"#,
    )
    .expect("write config");
    config_path
}

fn write_tu(dir: &Path, tu: &TranslationUnit) -> PathBuf {
    let ast_path = dir.join("tu.json");
    std::fs::write(&ast_path, serde_json::to_string(tu).expect("serialize tu"))
        .expect("write tu");
    ast_path
}

fn example_tu() -> TranslationUnit {
    TuBuilder::new("example.h")
        .func("Frobnicate", |f| {
            f.returns(QualType::builtin(BuiltinType::Int))
                .param("level", QualType::builtin(BuiltinType::Int));
        })
        .record("Gadget", |r| {
            r.field("id", QualType::builtin(BuiltinType::Int));
        })
        .build()
}

#[test]
fn test_ir_on_stdout() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config_path = write_config(tmp.path());
    let ast_path = write_tu(tmp.path(), &example_tu());

    let output = run_importer(&[
        "--ast",
        &ast_path.to_string_lossy(),
        "--config",
        &config_path.to_string_lossy(),
    ]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let ir: Ir = serde_json::from_slice(&output.stdout).expect("parse IR JSON");
    assert_eq!(ir.current_target.0, "//example:lib");
    assert_eq!(ir.items.len(), 2);
    assert!(matches!(
        &ir.items[0],
        Item::Func(f) if f.name == UnqualifiedIdentifier::Identifier(Identifier::new("Frobnicate"))
    ));
    assert!(matches!(
        &ir.items[1],
        Item::Record(r) if r.identifier == Identifier::new("Gadget")
    ));
}

#[test]
fn test_ir_to_output_file_pretty() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config_path = write_config(tmp.path());
    let ast_path = write_tu(tmp.path(), &example_tu());
    let out_path = tmp.path().join("ir.json");

    let output = run_importer(&[
        "--ast",
        &ast_path.to_string_lossy(),
        "--config",
        &config_path.to_string_lossy(),
        "--output",
        &out_path.to_string_lossy(),
        "--pretty",
    ]);

    assert!(output.status.success());
    let rendered = std::fs::read_to_string(&out_path).expect("read output");
    // Pretty output spans multiple lines.
    assert!(rendered.lines().count() > 1);
    let ir: Ir = serde_json::from_str(&rendered).expect("parse IR JSON");
    assert_eq!(ir.functions().count(), 1);
}

#[test]
fn test_unsupported_items_do_not_fail_the_run() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config_path = write_config(tmp.path());
    let tu = TuBuilder::new("example.h")
        .record("U", |r| {
            r.union_();
        })
        .build();
    let ast_path = write_tu(tmp.path(), &tu);

    let output = run_importer(&[
        "--ast",
        &ast_path.to_string_lossy(),
        "--config",
        &config_path.to_string_lossy(),
    ]);

    assert!(output.status.success());
    let ir: Ir = serde_json::from_slice(&output.stdout).expect("parse IR JSON");
    assert_eq!(ir.unsupported_items().count(), 1);
}

#[test]
fn test_missing_config_exits_nonzero() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let ast_path = write_tu(tmp.path(), &example_tu());

    let output = run_importer(&[
        "--ast",
        &ast_path.to_string_lossy(),
        "--config",
        &tmp.path().join("nope.toml").to_string_lossy(),
    ]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("configuration"));
}

#[test]
fn test_malformed_tu_exits_nonzero() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config_path = write_config(tmp.path());
    let ast_path = tmp.path().join("tu.json");
    std::fs::write(&ast_path, "{ not json").expect("write");

    let output = run_importer(&[
        "--ast",
        &ast_path.to_string_lossy(),
        "--config",
        &config_path.to_string_lossy(),
    ]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("translation unit"));
}
