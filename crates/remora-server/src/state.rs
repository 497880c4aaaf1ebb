use std::path::PathBuf;
use std::sync::Arc;

use remora::Converter;

/// Maximum accepted request body (uploads included).
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared application state: the one-time discovery result plus the working
/// directories for uploads and generated images.
#[derive(Clone)]
pub struct AppState {
    pub converter: Arc<Converter>,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl AppState {
    /// Creates the state, ensuring both working directories exist.
    pub fn new(
        converter: Converter,
        upload_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> std::io::Result<Self> {
        let upload_dir = upload_dir.into();
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&upload_dir)?;
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            converter: Arc::new(converter),
            upload_dir,
            output_dir,
        })
    }
}
