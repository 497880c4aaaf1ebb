use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy for discovery and conversion.
///
/// Everything except [`Error::PlaceholderRender`] and [`Error::InputNotFound`] is
/// recovered internally by falling back to the placeholder renderer; callers of
/// [`crate::Converter::convert`] normally never see those variants surface.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Mermaid CLI not found; no invocation candidate survived probing")]
    ToolNotFound,

    #[error("Mermaid CLI did not respond within {seconds}s")]
    ToolUnresponsive { seconds: u64 },

    #[error("Conversion exited with status {status:?}: {detail}")]
    ConversionFailed {
        status: Option<i32>,
        detail: String,
    },

    #[error("Conversion timed out after {seconds}s")]
    ConversionTimeout { seconds: u64 },

    #[error("Renderer reported success but produced no output at {}", path.display())]
    OutputMissing { path: PathBuf },

    #[error("Input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Invalid configuration JSON: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Placeholder rendering failed: {message}")]
    PlaceholderRender { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
