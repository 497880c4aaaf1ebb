//! Mermaid CLI discovery: candidate enumeration and the two-stage probe.
//!
//! Enumeration is pure data; it never spawns processes. The probe is where a candidate
//! earns the "usable" verdict, and it is intentionally strict: a `--version` reply is
//! only the cheap first stage, because the CLI's deeper runtime dependencies (the
//! headless Chromium it drives, fonts, sandbox permissions) routinely pass a version
//! check and then fail on the first actual render. A candidate is usable only after a
//! trivial real conversion exits zero.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::error::Error;
use crate::exec::{ExecOutcome, run_with_timeout};

/// npm package name of the external renderer.
pub const MERMAID_PACKAGE: &str = "@mermaid-js/mermaid-cli";

/// Fixed trivial diagram rendered by the probe's second stage.
pub(crate) const PROBE_DIAGRAM: &str = "graph TD; A-->B";

const CHEAP_CHECK_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// One concrete way of invoking the external Mermaid renderer.
///
/// Ordering policy (see [`candidates`]): local, project-scoped installs are preferred
/// over global ones, and direct binary execution over interpreter- or package-runner-
/// mediated execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationCandidate {
    /// The project-local `node_modules/.bin/mmdc` shim.
    LocalBinary(PathBuf),
    /// `node <path-to-cli.js>`, bypassing the shim.
    NodeScript(PathBuf),
    /// A bare command name resolved through `PATH`.
    PathBinary(&'static str),
    /// `npx @mermaid-js/mermaid-cli`; cheap-checked via `npm list` rather than
    /// `--version`, since npx may otherwise download the package on the spot.
    PackageRunner,
}

impl InvocationCandidate {
    /// Base command for this candidate; callers append renderer flags (`-i`, `-o`, ...).
    pub fn command(&self) -> Command {
        match self {
            Self::LocalBinary(path) => Command::new(path),
            Self::NodeScript(script) => {
                let mut cmd = Command::new("node");
                cmd.arg(script);
                cmd
            }
            Self::PathBinary(name) => Command::new(name),
            Self::PackageRunner => {
                let mut cmd = Command::new("npx");
                cmd.arg(MERMAID_PACKAGE);
                cmd
            }
        }
    }

    /// Human-readable invocation, used in diagnostics and the HTTP dependency report.
    pub fn label(&self) -> String {
        match self {
            Self::LocalBinary(path) => path.display().to_string(),
            Self::NodeScript(script) => format!("node {}", script.display()),
            Self::PathBinary(name) => (*name).to_string(),
            Self::PackageRunner => format!("npx {MERMAID_PACKAGE}"),
        }
    }

    /// Static precondition: candidates that point at a concrete file are skipped
    /// without probing when the file does not exist.
    fn is_plausible(&self) -> bool {
        match self {
            Self::LocalBinary(path) | Self::NodeScript(path) => path.exists(),
            Self::PathBinary(_) | Self::PackageRunner => true,
        }
    }
}

/// Produces the ordered candidate list for a project rooted at `project_root`.
///
/// Pure data production; nothing is probed here.
pub fn candidates(project_root: &Path) -> Vec<InvocationCandidate> {
    let bin_dir = project_root.join("node_modules").join(".bin");
    let cli_js = project_root
        .join("node_modules")
        .join("@mermaid-js")
        .join("mermaid-cli")
        .join("dist")
        .join("cli.js");

    let mut list = Vec::with_capacity(5);
    #[cfg(windows)]
    list.push(InvocationCandidate::LocalBinary(bin_dir.join("mmdc.cmd")));
    list.push(InvocationCandidate::LocalBinary(bin_dir.join("mmdc")));
    list.push(InvocationCandidate::NodeScript(cli_js));
    list.push(InvocationCandidate::PathBinary("mmdc"));
    list.push(InvocationCandidate::PackageRunner);
    list
}

/// Verdict of probing one candidate, with diagnostic detail for the unusable case.
#[derive(Debug, Clone)]
pub struct ProbeVerdict {
    pub usable: bool,
    pub detail: String,
}

impl ProbeVerdict {
    fn unusable(detail: impl Into<String>) -> Self {
        Self {
            usable: false,
            detail: detail.into(),
        }
    }
}

/// Runs the two-stage capability check against one candidate.
pub fn probe(candidate: &InvocationCandidate) -> ProbeVerdict {
    probe_with_deadlines(candidate, CHEAP_CHECK_TIMEOUT, PROBE_RENDER_TIMEOUT)
}

fn probe_with_deadlines(
    candidate: &InvocationCandidate,
    cheap_timeout: Duration,
    render_timeout: Duration,
) -> ProbeVerdict {
    if !candidate.is_plausible() {
        return ProbeVerdict::unusable("target file does not exist");
    }

    let cheap = match cheap_check(candidate, cheap_timeout) {
        Ok(outcome) => outcome,
        Err(err) => return ProbeVerdict::unusable(format!("failed to start: {err}")),
    };
    if cheap.timed_out {
        return ProbeVerdict::unusable(
            Error::ToolUnresponsive {
                seconds: cheap_timeout.as_secs(),
            }
            .to_string(),
        );
    }
    if cheap.status != Some(0) {
        return ProbeVerdict::unusable(format!(
            "capability check exited with status {:?}: {}",
            cheap.status,
            cheap.diagnostic_excerpt()
        ));
    }
    if matches!(candidate, InvocationCandidate::PackageRunner)
        && !cheap.stdout.contains(MERMAID_PACKAGE)
    {
        return ProbeVerdict::unusable("package not present in npm list output");
    }

    match probe_render(candidate, render_timeout) {
        Ok(outcome) if outcome.success() => ProbeVerdict {
            usable: true,
            detail: cheap.stdout.trim().to_string(),
        },
        Ok(outcome) if outcome.timed_out => ProbeVerdict::unusable(
            Error::ToolUnresponsive {
                seconds: render_timeout.as_secs(),
            }
            .to_string(),
        ),
        Ok(outcome) => ProbeVerdict::unusable(format!(
            "version check passed but test conversion exited with status {:?}: {}",
            outcome.status,
            outcome.diagnostic_excerpt()
        )),
        Err(err) => ProbeVerdict::unusable(format!("test conversion failed to start: {err}")),
    }
}

/// Returns the highest-priority usable candidate, if any.
pub fn discover(project_root: &Path) -> Option<InvocationCandidate> {
    for candidate in candidates(project_root) {
        let verdict = probe(&candidate);
        tracing::debug!(
            candidate = %candidate.label(),
            usable = verdict.usable,
            detail = %verdict.detail,
            "probed Mermaid CLI candidate"
        );
        if verdict.usable {
            tracing::info!(candidate = %candidate.label(), "found working Mermaid CLI");
            return Some(candidate);
        }
    }
    tracing::warn!("no working Mermaid CLI found; placeholder rendering will be used");
    None
}

fn cheap_check(
    candidate: &InvocationCandidate,
    timeout: Duration,
) -> std::io::Result<ExecOutcome> {
    let cmd = match candidate {
        InvocationCandidate::PackageRunner => {
            let mut cmd = Command::new("npm");
            cmd.args(["list", MERMAID_PACKAGE]);
            cmd
        }
        other => {
            let mut cmd = other.command();
            cmd.arg("--version");
            cmd
        }
    };
    run_with_timeout(cmd, timeout)
}

fn probe_render(
    candidate: &InvocationCandidate,
    timeout: Duration,
) -> std::io::Result<ExecOutcome> {
    let input = tempfile::Builder::new()
        .prefix("remora-probe-")
        .suffix(".mmd")
        .tempfile()?;
    std::fs::write(input.path(), PROBE_DIAGRAM)?;

    // The output lives in its own tempdir so cleanup happens on every path,
    // including the common one where the renderer never creates the file.
    let out_dir = tempfile::tempdir()?;
    let output = out_dir.path().join("probe.png");

    let mut cmd = candidate.command();
    cmd.arg("-i").arg(input.path()).arg("-o").arg(&output);
    run_with_timeout(cmd, PROBE_RENDER_TIMEOUT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_order_prefers_local_then_direct() {
        let list = candidates(Path::new("/proj"));
        let labels: Vec<String> = list.iter().map(InvocationCandidate::label).collect();

        let local = labels
            .iter()
            .position(|l| l.ends_with("mmdc") && l.contains("node_modules"))
            .expect("local shim candidate");
        let node = labels
            .iter()
            .position(|l| l.starts_with("node "))
            .expect("node script candidate");
        let global = labels.iter().position(|l| l == "mmdc").expect("global");
        let npx = labels
            .iter()
            .position(|l| l.starts_with("npx "))
            .expect("package runner");

        assert!(local < node);
        assert!(node < global);
        assert!(global < npx);
    }

    #[test]
    fn enumeration_spawns_nothing_and_is_stable() {
        let a = candidates(Path::new("/proj"));
        let b = candidates(Path::new("/proj"));
        assert_eq!(a, b);
    }

    #[test]
    fn missing_local_binary_is_rejected_without_probing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let verdict = probe(&InvocationCandidate::LocalBinary(dir.path().join("mmdc")));
        assert!(!verdict.usable);
        assert!(verdict.detail.contains("does not exist"));
    }

    #[cfg(unix)]
    #[test]
    fn hung_candidate_is_reported_as_unresponsive() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mmdc-hang");
        std::fs::write(&path, "#!/bin/sh\nsleep 30\n").expect("write stub");
        let mut perms = std::fs::metadata(&path).expect("stat stub").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("chmod stub");

        let verdict = probe_with_deadlines(
            &InvocationCandidate::LocalBinary(path),
            Duration::from_millis(200),
            Duration::from_millis(200),
        );
        assert!(!verdict.usable);
        assert!(verdict.detail.contains("did not respond"), "{}", verdict.detail);
    }
}
