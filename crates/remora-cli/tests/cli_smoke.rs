use std::process::Command;

use assert_cmd::prelude::*;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

fn cli() -> Command {
    Command::new(assert_cmd::cargo_bin!("remora-cli"))
}

#[test]
fn no_action_prints_usage_and_exits_2() {
    cli().assert().failure().code(2);
}

#[test]
fn conflicting_actions_exit_2() {
    cli()
        .args(["-t", "graph TD; A-->B", "--sample"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn sample_writes_a_mermaid_file() {
    let tmp = tempfile::tempdir().expect("tempdir");
    cli().current_dir(tmp.path()).arg("--sample").assert().success();

    let sample = std::fs::read_to_string(tmp.path().join("sample.mmd")).expect("read sample");
    assert!(sample.starts_with("graph TD"));
}

#[test]
fn text_conversion_always_produces_a_png() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = tmp.path().join("out.png");

    cli()
        .current_dir(tmp.path())
        .args(["-t", "graph TD; A-->B", "-o"])
        .arg(&out)
        .assert()
        .success();

    let bytes = std::fs::read(&out).expect("read png");
    assert!(bytes.starts_with(PNG_MAGIC), "output is not a PNG");
}

#[test]
fn file_conversion_defaults_output_next_to_input() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = tmp.path().join("flow.mmd");
    std::fs::write(&input, "graph TD; A-->B").expect("write input");

    cli().current_dir(tmp.path()).arg("-f").arg(&input).assert().success();

    let bytes = std::fs::read(tmp.path().join("flow.png")).expect("read png");
    assert!(bytes.starts_with(PNG_MAGIC));
}

#[test]
fn missing_input_file_exits_1() {
    let tmp = tempfile::tempdir().expect("tempdir");
    cli()
        .current_dir(tmp.path())
        .args(["-f", "absent.mmd"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn batch_conversion_converts_every_file() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input_dir = tmp.path().join("diagrams");
    std::fs::create_dir(&input_dir).expect("mkdir");
    for name in ["a", "b"] {
        std::fs::write(input_dir.join(format!("{name}.mmd")), "graph TD; A-->B")
            .expect("write input");
    }
    let out_dir = tmp.path().join("images");

    cli()
        .current_dir(tmp.path())
        .arg("-d")
        .arg(&input_dir)
        .arg("--out-dir")
        .arg(&out_dir)
        .assert()
        .success();

    for name in ["a", "b"] {
        let bytes = std::fs::read(out_dir.join(format!("{name}.png"))).expect("read png");
        assert!(bytes.starts_with(PNG_MAGIC));
    }
}

#[test]
fn malformed_config_json_exits_1() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = tmp.path().join("config.json");
    std::fs::write(&config, "{not json").expect("write config");

    cli()
        .current_dir(tmp.path())
        .args(["-t", "graph TD; A-->B", "-c"])
        .arg(&config)
        .assert()
        .failure()
        .code(1);
}
