//! End-to-end discovery/conversion tests against stub renderer executables.
//!
//! The stubs model the failure modes the probe exists to catch: a binary whose
//! `--version` works but whose real rendering is broken (the classic
//! missing-headless-browser case), and one that exits zero without producing output.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use remora::{Converter, Error, InvocationCandidate, probe};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

fn write_stub(dir: &Path, name: &str, script: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, script).expect("write stub");
    let mut perms = std::fs::metadata(&path).expect("stat stub").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod stub");
    path
}

/// Answers `--version` and writes bytes to the `-o` path on render.
fn working_stub(dir: &Path) -> PathBuf {
    write_stub(
        dir,
        "mmdc-working",
        r#"#!/bin/sh
if [ "$1" = "--version" ]; then echo 10.9.9; exit 0; fi
if [ "$1" = "--help" ]; then echo usage; exit 0; fi
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
printf 'STUB-RENDERED-PNG' > "$out"
exit 0
"#,
    )
}

/// Passes the version check but fails every real render.
fn version_only_stub(dir: &Path) -> PathBuf {
    write_stub(
        dir,
        "mmdc-version-only",
        r#"#!/bin/sh
if [ "$1" = "--version" ]; then echo 10.9.9; exit 0; fi
echo "Chromium revision is not downloaded" >&2
exit 1
"#,
    )
}

/// Exits zero on render without ever creating the output file.
fn silent_stub(dir: &Path) -> PathBuf {
    write_stub(
        dir,
        "mmdc-silent",
        r#"#!/bin/sh
if [ "$1" = "--version" ]; then echo 10.9.9; exit 0; fi
exit 0
"#,
    )
}

/// Like [`working_stub`], but first records its render arguments into `capture`.
fn recording_stub(dir: &Path, capture: &Path) -> PathBuf {
    write_stub(
        dir,
        "mmdc-recording",
        &format!(
            r#"#!/bin/sh
if [ "$1" = "--version" ]; then echo 10.9.9; exit 0; fi
echo "$@" > "{capture}"
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
printf 'STUB-RENDERED-PNG' > "$out"
exit 0
"#,
            capture = capture.display()
        ),
    )
}

/// Records its render arguments into `capture`, then fails.
fn recording_failing_stub(dir: &Path, capture: &Path) -> PathBuf {
    write_stub(
        dir,
        "mmdc-recording-failing",
        &format!(
            r#"#!/bin/sh
if [ "$1" = "--version" ]; then echo 10.9.9; exit 0; fi
echo "$@" > "{capture}"
echo "render exploded" >&2
exit 1
"#,
            capture = capture.display()
        ),
    )
}

/// Extracts the value following `flag` from a space-separated capture line.
fn captured_value(capture: &Path, flag: &str) -> PathBuf {
    let line = std::fs::read_to_string(capture).expect("read capture");
    let mut args = line.split_whitespace();
    while let Some(arg) = args.next() {
        if arg == flag {
            return PathBuf::from(args.next().expect("flag has a value"));
        }
    }
    panic!("{flag} not found in captured args: {line}");
}

#[test]
fn probe_accepts_a_stub_that_actually_renders() {
    let dir = tempfile::tempdir().expect("tempdir");
    let candidate = InvocationCandidate::LocalBinary(working_stub(dir.path()));
    let verdict = probe(&candidate);
    assert!(verdict.usable, "unexpected verdict: {}", verdict.detail);
    assert!(verdict.detail.contains("10.9.9"));
}

#[test]
fn probe_rejects_a_stub_whose_version_works_but_rendering_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let candidate = InvocationCandidate::LocalBinary(version_only_stub(dir.path()));
    let verdict = probe(&candidate);
    assert!(!verdict.usable);
    assert!(verdict.detail.contains("test conversion"));
    assert!(verdict.detail.contains("Chromium"));
}

#[test]
fn convert_uses_the_working_candidate_directly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let converter = Converter::with_candidate(Some(InvocationCandidate::LocalBinary(
        working_stub(dir.path()),
    )));

    let out = dir.path().join("real.png");
    let conversion = converter
        .convert("graph TD; A-->B", &out, None)
        .expect("convert");

    assert!(!conversion.degraded);
    assert_eq!(
        std::fs::read(&out).expect("read output"),
        b"STUB-RENDERED-PNG"
    );
}

#[test]
fn broken_renderer_falls_back_to_placeholder() {
    let dir = tempfile::tempdir().expect("tempdir");
    let converter = Converter::with_candidate(Some(InvocationCandidate::LocalBinary(
        version_only_stub(dir.path()),
    )));

    let out = dir.path().join("fallback.png");
    let conversion = converter
        .convert("graph TD; A-->B", &out, None)
        .expect("convert");

    assert!(conversion.degraded);
    assert!(conversion.detail.expect("detail").contains("Chromium"));
    let bytes = std::fs::read(&out).expect("read output");
    assert!(bytes.starts_with(PNG_MAGIC));
}

#[test]
fn zero_exit_without_output_file_is_still_a_fallback() {
    let dir = tempfile::tempdir().expect("tempdir");
    let converter = Converter::with_candidate(Some(InvocationCandidate::LocalBinary(
        silent_stub(dir.path()),
    )));

    let out = dir.path().join("missing.png");
    let conversion = converter
        .convert("graph TD; A-->B", &out, None)
        .expect("convert");

    assert!(conversion.degraded);
    assert!(conversion.detail.expect("detail").contains("no output"));
    assert!(out.exists(), "placeholder should have been written");
}

#[test]
fn successful_conversion_removes_its_temp_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let capture = dir.path().join("args.txt");
    let converter = Converter::with_candidate(Some(InvocationCandidate::LocalBinary(
        recording_stub(dir.path(), &capture),
    )));

    let out = dir.path().join("real.png");
    let conversion = converter
        .convert(
            "graph TD; A-->B",
            &out,
            Some(&serde_json::json!({"theme": "dark"})),
        )
        .expect("convert");
    assert!(!conversion.degraded);

    // The stub saw concrete temp paths for the source and the config; both must be
    // gone once convert has returned.
    let input = captured_value(&capture, "-i");
    let config = captured_value(&capture, "-c");
    assert!(input.extension().is_some_and(|e| e == "mmd"));
    assert!(config.extension().is_some_and(|e| e == "json"));
    assert!(!input.exists(), "leaked temp input: {}", input.display());
    assert!(!config.exists(), "leaked temp config: {}", config.display());
}

#[test]
fn failed_conversion_removes_its_temp_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let capture = dir.path().join("args.txt");
    let converter = Converter::with_candidate(Some(InvocationCandidate::LocalBinary(
        recording_failing_stub(dir.path(), &capture),
    )));

    let out = dir.path().join("fallback.png");
    let conversion = converter
        .convert(
            "graph TD; A-->B",
            &out,
            Some(&serde_json::json!({"theme": "dark"})),
        )
        .expect("convert");
    assert!(conversion.degraded);

    let input = captured_value(&capture, "-i");
    let config = captured_value(&capture, "-c");
    assert!(!input.exists(), "leaked temp input: {}", input.display());
    assert!(!config.exists(), "leaked temp config: {}", config.display());
}

#[test]
fn missing_input_file_bypasses_fallback_entirely() {
    let dir = tempfile::tempdir().expect("tempdir");
    let converter = Converter::with_candidate(Some(InvocationCandidate::LocalBinary(
        working_stub(dir.path()),
    )));

    let err = converter
        .convert_file(&dir.path().join("absent.mmd"), None, None)
        .unwrap_err();
    assert!(matches!(err, Error::InputNotFound { .. }));
}
