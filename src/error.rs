use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for planktool operations
pub type Result<T> = std::result::Result<T, PlanktoolError>;

/// Failures that abort processing of a single image.
///
/// Regions that merely do not admit a feature vector are not errors; see
/// [`crate::features::FeatureOutcome`].
#[derive(Debug, Error)]
pub enum PlanktoolError {
    /// Image has no pixels
    #[error("image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// Image file could not be opened or decoded
    #[error("failed to load image {}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Ensemble was built without any member strategy
    #[error("ensemble needs at least one strategy")]
    EmptyEnsemble,

    /// A strategy returned a mask whose size differs from its input
    #[error("strategy `{strategy}` produced a {got_width}x{got_height} mask for a {width}x{height} image")]
    MaskSize {
        strategy: String,
        width: u32,
        height: u32,
        got_width: u32,
        got_height: u32,
    },

    /// A strategy failed outright
    #[error("strategy `{strategy}` failed: {reason}")]
    Strategy { strategy: String, reason: String },

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("encoding error: {0}")]
    Encode(#[from] image::ImageError),
}

impl PlanktoolError {
    /// Reject images without pixels before any stage touches them.
    pub fn check_image(image: &image::GrayImage) -> Result<()> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PlanktoolError::EmptyImage { width, height });
        }
        Ok(())
    }
}
