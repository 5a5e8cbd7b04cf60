use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the extractor and the header encoder.
///
/// The first group is caller-correctable (bad input or parameters). `Image`
/// and `Io` pass the underlying library error through untouched.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("no .jpg files found in {}", .dir.display())]
    NoStillImages { dir: PathBuf },

    #[error("similarity threshold must be a finite number >= 0, got {0}")]
    InvalidThreshold(f64),

    #[error("target size must be non-zero, got {width}x{height}")]
    InvalidTargetSize { width: u32, height: u32 },

    #[error("JPEG quality must be between 1 and 100, got {0}")]
    InvalidJpegQuality(u8),

    #[error("variable name {0:?} is not a valid C identifier")]
    InvalidVariableName(String),

    #[error(
        "{} is {}x{}, expected {}x{} like the first image",
        .path.display(), .actual.0, .actual.1, .expected.0, .expected.1
    )]
    DimensionMismatch {
        path: PathBuf,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// True for failures the caller can fix by changing inputs or parameters.
    pub fn is_validation(&self) -> bool {
        !matches!(self, ConvertError::Image(_) | ConvertError::Io(_))
    }
}
