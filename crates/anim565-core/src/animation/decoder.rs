use std::path::Path;

use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::imageops::{self, FilterType};
use image::{AnimationDecoder, DynamicImage, Frames, ImageFormat, ImageReader};
use tracing::{debug, info};

use super::frame::Frame;
use crate::config::TargetSize;
use crate::error::ConvertError;

/// Decodes an animated image one composited frame at a time.
///
/// GIF, APNG and animated WebP go through the image crate's animation
/// decoders. Anything else the image crate can read is a one-frame animation.
pub struct FrameDecoder {
    frames: Frames<'static>,
    target_size: Option<TargetSize>,
    format: Option<ImageFormat>,
    frame_count: u32,
    elapsed_ms: f64,
}

impl FrameDecoder {
    /// Open an animation for decoding. Decode errors are returned as the image crate reports them.
    pub fn open(path: &Path, target_size: Option<TargetSize>) -> Result<Self, ConvertError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader.format();

        info!(?path, ?format, ?target_size, "opening animation");

        let frames = match format {
            Some(ImageFormat::Gif) => GifDecoder::new(reader.into_inner())?.into_frames(),
            Some(ImageFormat::Png) => {
                let decoder = PngDecoder::new(reader.into_inner())?;
                if decoder.is_apng()? {
                    decoder.apng()?.into_frames()
                } else {
                    still_frames(DynamicImage::from_decoder(decoder)?)
                }
            }
            Some(ImageFormat::WebP) => {
                let decoder = WebPDecoder::new(reader.into_inner())?;
                if decoder.has_animation() {
                    decoder.into_frames()
                } else {
                    still_frames(DynamicImage::from_decoder(decoder)?)
                }
            }
            _ => still_frames(reader.decode()?),
        };

        Ok(Self {
            frames,
            target_size,
            format,
            frame_count: 0,
            elapsed_ms: 0.0,
        })
    }

    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    /// Number of frames returned so far.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Decode the next frame, or `None` once the animation is exhausted.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, ConvertError> {
        let Some(decoded) = self.frames.next() else {
            info!(total_frames = self.frame_count, "animation ended");
            return Ok(None);
        };
        let decoded = decoded?;

        let (numer, denom) = decoded.delay().numer_denom_ms();
        let delay_ms = if denom > 0 {
            numer as f64 / denom as f64
        } else {
            0.0
        };

        // Alpha is dropped, not composited against a background.
        let mut image = DynamicImage::ImageRgba8(decoded.into_buffer()).into_rgb8();
        if let Some(size) = self.target_size {
            if image.dimensions() != (size.width, size.height) {
                image = imageops::resize(&image, size.width, size.height, FilterType::Lanczos3);
            }
        }

        let frame_number = self.frame_count;
        let timestamp_seconds = self.elapsed_ms / 1000.0;
        self.frame_count += 1;
        self.elapsed_ms += delay_ms;

        debug!(
            frame_number,
            timestamp_seconds,
            width = image.width(),
            height = image.height(),
            "decoded frame"
        );

        Ok(Some(Frame {
            image,
            frame_number,
            timestamp_seconds,
        }))
    }
}

impl Drop for FrameDecoder {
    fn drop(&mut self) {
        debug!(total_frames = self.frame_count, "closing animation decoder");
    }
}

fn still_frames(image: DynamicImage) -> Frames<'static> {
    let frame = image::Frame::new(image.into_rgba8());
    Frames::new(Box::new(std::iter::once(Ok(frame))))
}
