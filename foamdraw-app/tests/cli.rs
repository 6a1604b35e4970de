use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

fn foamdraw() -> Command {
    let mut cmd = Command::cargo_bin("foamdraw").expect("foamdraw binary");
    cmd.env_remove("FOAMDRAW_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn renders_one_page_per_layer() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let output = dir.path().join("out.pdf");

    foamdraw()
        .current_dir(dir.path())
        .arg("--input")
        .arg(fixture("two_layer.json"))
        .arg("--output")
        .arg(&output)
        .args(["--date", "2026-05-01"])
        .assert()
        .success();

    let bytes = fs::read(&output).expect("读取输出失败");
    assert!(bytes.starts_with(b"%PDF-"));
    let doc = lopdf::Document::load_mem(&bytes).expect("解析输出失败");
    assert_eq!(doc.get_pages().len(), 2);
}

#[test]
fn default_output_path_uses_config_directory_and_quote() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let out_dir = dir.path().join("drawings");
    fs::create_dir(&out_dir).expect("创建输出目录失败");
    let config = dir.path().join("foamdraw.toml");
    fs::write(
        &config,
        format!(
            "[output]\ndirectory = {:?}\n\n[logging]\nlevel = \"warn\"\n",
            out_dir.display().to_string()
        ),
    )
    .expect("写配置失败");

    foamdraw()
        .arg("--input")
        .arg(fixture("two_layer.json"))
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    assert!(out_dir.join("Q-5150.pdf").exists());
}

#[test]
fn strict_mode_rejects_overtall_stack_without_writing() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let output = dir.path().join("tall.pdf");

    foamdraw()
        .current_dir(dir.path())
        .arg("--input")
        .arg(fixture("too_tall.json"))
        .arg("--output")
        .arg(&output)
        .arg("--strict")
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceeds block height"));
    assert!(!output.exists());

    foamdraw()
        .current_dir(dir.path())
        .arg("--input")
        .arg(fixture("too_tall.json"))
        .arg("--output")
        .arg(&output)
        .assert()
        .success();
    assert!(output.exists());
}

fn page_texts(path: &std::path::Path) -> Vec<Vec<u8>> {
    let doc = lopdf::Document::load(path).expect("解析输出失败");
    let page = doc.get_pages().values().next().copied().expect("第一页");
    let raw = doc.get_page_content(page).expect("页面内容");
    let content = lopdf::content::Content::decode(&raw).expect("解析内容流");
    content
        .operations
        .iter()
        .filter(|operation| operation.operator == "Tj")
        .filter_map(|operation| operation.operands.first())
        .filter_map(|operand| operand.as_str().ok())
        .map(<[u8]>::to_vec)
        .collect()
}

#[test]
fn explicit_date_overrides_layout_date() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let output = dir.path().join("dated.pdf");

    foamdraw()
        .current_dir(dir.path())
        .arg("--input")
        .arg(fixture("dated.json"))
        .arg("--output")
        .arg(&output)
        .args(["--date", "2026-09-30"])
        .assert()
        .success();
    let texts = page_texts(&output);
    assert!(texts.iter().any(|t| t.as_slice() == b"2026-09-30"));
    assert!(!texts.iter().any(|t| t.as_slice() == b"2024-07-04"));

    foamdraw()
        .current_dir(dir.path())
        .arg("--input")
        .arg(fixture("dated.json"))
        .arg("--output")
        .arg(&output)
        .assert()
        .success();
    let texts = page_texts(&output);
    assert!(texts.iter().any(|t| t.as_slice() == b"2024-07-04"));
}

#[test]
fn missing_input_fails() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    foamdraw()
        .current_dir(dir.path())
        .arg("--input")
        .arg(dir.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.json"));
}
