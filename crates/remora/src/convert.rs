//! Conversion front end: runs the discovered Mermaid CLI with timeouts and falls back
//! to placeholder rendering on any failure.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::discover::{self, InvocationCandidate};
use crate::error::{Error, Result};
use crate::exec::run_with_timeout;
use crate::placeholder;

/// File extension of Mermaid source files handled by file and batch conversion.
pub const SOURCE_EXTENSION: &str = "mmd";

// Full conversions get a longer deadline than the probe's trivial render: real
// diagrams can be large.
const CONVERT_TIMEOUT: Duration = Duration::from_secs(45);
const HELP_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one conversion. `degraded` marks a placeholder fallback; `detail` then
/// carries the reason the real renderer was not used.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub output: PathBuf,
    pub degraded: bool,
    pub detail: Option<String>,
}

/// Aggregate result of a batch conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub converted: usize,
    pub total: usize,
}

impl BatchSummary {
    pub fn all_converted(&self) -> bool {
        self.converted == self.total
    }
}

/// Converts Mermaid source to PNG via the external CLI, with placeholder fallback.
///
/// Discovery runs once at construction; the active candidate (or its absence) is an
/// explicit field fixed for the instance's lifetime and is never re-probed per request.
pub struct Converter {
    active: Option<InvocationCandidate>,
}

impl Converter {
    /// Probes the candidate list rooted at the current directory and caches the winner.
    pub fn discover() -> Self {
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            active: discover::discover(&root),
        }
    }

    /// Builds a converter with a fixed candidate, skipping discovery.
    ///
    /// `None` forces placeholder rendering for every conversion; tests use this to get
    /// deterministic instances without touching the environment.
    pub fn with_candidate(active: Option<InvocationCandidate>) -> Self {
        Self { active }
    }

    pub fn active_candidate(&self) -> Option<&InvocationCandidate> {
        self.active.as_ref()
    }

    pub fn is_available(&self) -> bool {
        self.active.is_some()
    }

    /// Confirms the active candidate still answers `--help` within a short deadline.
    pub fn check_dependencies(&self) -> bool {
        let Some(candidate) = &self.active else {
            return false;
        };
        let mut cmd = candidate.command();
        cmd.arg("--help");
        match run_with_timeout(cmd, HELP_TIMEOUT) {
            Ok(outcome) => outcome.success(),
            Err(_) => false,
        }
    }

    /// Converts `source` to a PNG at `output`.
    ///
    /// The caller-visible contract is "you get an image": every failure mode of the
    /// external tool (absent, spawn error, timeout, non-zero exit, zero exit without an
    /// output file) is absorbed by rendering the placeholder instead, annotated as
    /// degraded. The only errors surfaced are placeholder-renderer failures and I/O
    /// errors writing the final image.
    pub fn convert(
        &self,
        source: &str,
        output: &Path,
        config: Option<&serde_json::Value>,
    ) -> Result<Conversion> {
        match self.convert_with_cli(source, output, config) {
            Ok(()) => {
                tracing::debug!(output = %output.display(), "mermaid CLI conversion succeeded");
                Ok(Conversion {
                    output: output.to_path_buf(),
                    degraded: false,
                    detail: None,
                })
            }
            Err(err) => {
                tracing::warn!(error = %err, "mermaid CLI conversion failed; rendering placeholder");
                placeholder::render_placeholder(source, output)?;
                Ok(Conversion {
                    output: output.to_path_buf(),
                    degraded: true,
                    detail: Some(err.to_string()),
                })
            }
        }
    }

    fn convert_with_cli(
        &self,
        source: &str,
        output: &Path,
        config: Option<&serde_json::Value>,
    ) -> Result<()> {
        let candidate = self.active.as_ref().ok_or(Error::ToolNotFound)?;

        // Temp input/config files are cleaned up by drop on every exit path.
        let input = tempfile::Builder::new()
            .prefix("remora-")
            .suffix(".mmd")
            .tempfile()?;
        std::fs::write(input.path(), source)?;

        let mut cmd = candidate.command();
        cmd.arg("-i").arg(input.path()).arg("-o").arg(output);

        let _config_file = match config {
            Some(value) => {
                let file = tempfile::Builder::new()
                    .prefix("remora-")
                    .suffix(".json")
                    .tempfile()?;
                std::fs::write(file.path(), serde_json::to_vec_pretty(value)?)?;
                cmd.arg("-c").arg(file.path());
                Some(file)
            }
            None => None,
        };

        let outcome = run_with_timeout(cmd, CONVERT_TIMEOUT)?;
        if outcome.timed_out {
            return Err(Error::ConversionTimeout {
                seconds: CONVERT_TIMEOUT.as_secs(),
            });
        }
        if outcome.status != Some(0) {
            return Err(Error::ConversionFailed {
                status: outcome.status,
                detail: outcome.diagnostic_excerpt(),
            });
        }
        // A zero exit without the output file is still a failure.
        if !output.exists() {
            return Err(Error::OutputMissing {
                path: output.to_path_buf(),
            });
        }
        Ok(())
    }

    /// Converts a `.mmd` file. A missing input is surfaced immediately as
    /// [`Error::InputNotFound`] with no fallback attempted; the default output path is
    /// the input with a `.png` extension.
    pub fn convert_file(
        &self,
        input: &Path,
        output: Option<&Path>,
        config: Option<&serde_json::Value>,
    ) -> Result<Conversion> {
        if !input.exists() {
            return Err(Error::InputNotFound {
                path: input.to_path_buf(),
            });
        }
        let source = std::fs::read_to_string(input)?;
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| input.with_extension("png"));
        self.convert(&source, &output, config)
    }

    /// Converts every `.mmd` file in `dir`, writing PNGs to `out_dir` (defaults to
    /// `dir`). Items are independent: individual failures are counted, not propagated.
    pub fn batch_convert(
        &self,
        dir: &Path,
        out_dir: Option<&Path>,
        config: Option<&serde_json::Value>,
    ) -> Result<BatchSummary> {
        if !dir.is_dir() {
            return Err(Error::InputNotFound {
                path: dir.to_path_buf(),
            });
        }
        let out_dir = out_dir.unwrap_or(dir);
        std::fs::create_dir_all(out_dir)?;

        let mut inputs: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
            })
            .collect();
        inputs.sort();

        let total = inputs.len();
        let mut converted = 0usize;
        for input in &inputs {
            let stem = input.file_stem().unwrap_or_default();
            let output = out_dir.join(stem).with_extension("png");
            match self.convert_file(input, Some(&output), config) {
                Ok(conversion) => {
                    if conversion.degraded {
                        tracing::debug!(
                            input = %input.display(),
                            detail = conversion.detail.as_deref().unwrap_or(""),
                            "batch item fell back to placeholder"
                        );
                    }
                    converted += 1;
                }
                Err(err) => {
                    tracing::warn!(input = %input.display(), error = %err, "batch item failed");
                }
            }
        }

        Ok(BatchSummary { converted, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn offline() -> Converter {
        Converter::with_candidate(None)
    }

    #[test]
    fn convert_without_tool_yields_placeholder_png() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("diagram.png");

        let conversion = offline()
            .convert("graph TD; A-->B", &out, None)
            .expect("convert");

        assert!(conversion.degraded);
        assert!(conversion.detail.is_some());
        let bytes = std::fs::read(&out).expect("read output");
        assert!(bytes.starts_with(PNG_MAGIC));
    }

    #[test]
    fn convert_file_missing_input_is_surfaced_not_hidden() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = offline()
            .convert_file(&dir.path().join("nope.mmd"), None, None)
            .unwrap_err();
        assert!(matches!(err, Error::InputNotFound { .. }));
    }

    #[test]
    fn convert_file_defaults_output_next_to_input() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("flow.mmd");
        std::fs::write(&input, "graph TD; A-->B").expect("write input");

        let conversion = offline().convert_file(&input, None, None).expect("convert");
        assert_eq!(conversion.output, dir.path().join("flow.png"));
        assert!(conversion.output.exists());
    }

    #[test]
    fn batch_convert_without_tool_converts_everything_via_placeholder() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["a", "b", "c"] {
            std::fs::write(dir.path().join(format!("{name}.mmd")), "graph TD; A-->B")
                .expect("write input");
        }
        // Non-matching files are ignored.
        std::fs::write(dir.path().join("notes.txt"), "not a diagram").expect("write noise");

        let out_dir = dir.path().join("images");
        let summary = offline()
            .batch_convert(dir.path(), Some(&out_dir), None)
            .expect("batch");

        assert_eq!(summary, BatchSummary { converted: 3, total: 3 });
        assert!(summary.all_converted());
        for name in ["a", "b", "c"] {
            assert!(out_dir.join(format!("{name}.png")).exists());
        }
    }

    #[test]
    fn batch_convert_missing_dir_is_input_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = offline()
            .batch_convert(&dir.path().join("absent"), None, None)
            .unwrap_err();
        assert!(matches!(err, Error::InputNotFound { .. }));
    }

    #[test]
    fn batch_convert_empty_dir_reports_zero_of_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        let summary = offline().batch_convert(dir.path(), None, None).expect("batch");
        assert_eq!(summary, BatchSummary { converted: 0, total: 0 });
    }

    #[test]
    fn check_dependencies_is_false_without_candidate() {
        assert!(!offline().check_dependencies());
    }
}
