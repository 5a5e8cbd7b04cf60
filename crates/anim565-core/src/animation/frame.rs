use image::RgbImage;

/// A single decoded animation frame with metadata.
pub struct Frame {
    /// The frame's image data, already resized if a target size was requested.
    pub image: RgbImage,
    /// Frame number in the source animation (0-based).
    pub frame_number: u32,
    /// Sum of the delays of all preceding frames.
    pub timestamp_seconds: f64,
}

impl Frame {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
