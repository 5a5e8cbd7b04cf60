use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::error::ConvertError;

/// Exact output resolution for extracted frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseTargetSizeError {
    #[error("expected WIDTHxHEIGHT, got {0:?}")]
    MissingSeparator(String),
    #[error("invalid dimension {0:?}")]
    InvalidDimension(String),
}

impl FromStr for TargetSize {
    type Err = ParseTargetSizeError;

    /// Parses `128x128` (either `x` or `X` as separator).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| ParseTargetSizeError::MissingSeparator(s.to_string()))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|_| ParseTargetSizeError::InvalidDimension(v.to_string()))
        };
        Ok(TargetSize::new(parse(w)?, parse(h)?))
    }
}

/// Parameters for the frame extractor.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Frames whose MSE against a kept frame is strictly below this are dropped.
    pub similarity_threshold: f64,
    /// Resize every frame to this size before comparison, or None to keep the source size.
    pub target_size: Option<TargetSize>,
    /// JPEG quality (1-100) for the written frames.
    pub jpeg_quality: u8,
    /// Directory to write annotated debug frames, or None to skip.
    pub debug_frames_dir: Option<PathBuf>,
    /// TrueType font for debug frame text. Without it only borders are drawn.
    pub debug_font: Option<PathBuf>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 10.0,
            target_size: None,
            jpeg_quality: 75,
            debug_frames_dir: None,
            debug_font: None,
        }
    }
}

impl ExtractConfig {
    pub fn validate(&self) -> Result<(), ConvertError> {
        if !self.similarity_threshold.is_finite() || self.similarity_threshold < 0.0 {
            return Err(ConvertError::InvalidThreshold(self.similarity_threshold));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConvertError::InvalidJpegQuality(self.jpeg_quality));
        }
        if let Some(size) = self.target_size {
            if size.width == 0 || size.height == 0 {
                return Err(ConvertError::InvalidTargetSize {
                    width: size.width,
                    height: size.height,
                });
            }
        }
        Ok(())
    }
}

/// How the header encoder orders the still images it finds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingOrder {
    /// Lexicographic by file name, so `frame_000.jpg` precedes `frame_001.jpg`.
    #[default]
    Sorted,
    /// Whatever order the OS returns. Filesystem-dependent and not reproducible.
    Directory,
}

/// Parameters for the header encoder.
#[derive(Debug, Clone)]
pub struct HeaderConfig {
    /// Array name; upper-cased for the include guard.
    pub variable_name: String,
    pub listing_order: ListingOrder,
    /// Emit rows for images whose size differs from the first one instead of failing.
    pub allow_ragged_rows: bool,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            variable_name: "walk".to_string(),
            listing_order: ListingOrder::Sorted,
            allow_ragged_rows: false,
        }
    }
}

impl HeaderConfig {
    pub fn validate(&self) -> Result<(), ConvertError> {
        if !is_c_identifier(&self.variable_name) {
            return Err(ConvertError::InvalidVariableName(
                self.variable_name.clone(),
            ));
        }
        Ok(())
    }
}

fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
