use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::{debug, info, warn};

use crate::animation::Frame;
use crate::dedup::Verdict;
use crate::error::ConvertError;

const TEXT_SCALE: f32 = 14.0;
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const TEXT_LINE_HEIGHT: i32 = 16;

const KEPT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const DUPLICATE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Saves every decoded frame with an overlay describing its dedup verdict.
pub struct DebugRenderer {
    font: Option<FontVec>,
}

impl DebugRenderer {
    /// Create a renderer. Text is only drawn if `font_path` loads.
    pub fn new(font_path: Option<&Path>) -> Self {
        let font = font_path.and_then(Self::load_font);
        Self { font }
    }

    pub fn save_frame(
        &self,
        frame: &Frame,
        verdict: &Verdict,
        kept_index: Option<usize>,
        dir: &Path,
    ) -> Result<(), ConvertError> {
        let mut img = frame.image.clone();

        let color = if verdict.is_unique() {
            KEPT_COLOR
        } else {
            DUPLICATE_COLOR
        };
        let rect = Rect::at(0, 0).of_size(img.width(), img.height());
        draw_hollow_rect_mut(&mut img, rect, color);

        self.draw_text_overlay(&mut img, frame, verdict, kept_index);

        let path = dir.join(format!("debug_{:04}.png", frame.frame_number));
        img.save(&path)?;

        debug!(?path, "saved debug frame");
        Ok(())
    }

    fn draw_text_overlay(
        &self,
        img: &mut RgbImage,
        frame: &Frame,
        verdict: &Verdict,
        kept_index: Option<usize>,
    ) {
        let Some(font) = &self.font else { return };
        let scale = PxScale::from(TEXT_SCALE);
        let x = 4;
        let mut y = 4;

        let header = format!("F:{} T:{:.2}s", frame.frame_number, frame.timestamp_seconds);
        draw_text_mut(img, TEXT_COLOR, x, y, scale, font, &header);
        y += TEXT_LINE_HEIGHT;

        draw_text_mut(img, TEXT_COLOR, x, y, scale, font, &verdict_text(verdict, kept_index));
        y += TEXT_LINE_HEIGHT;

        if let Verdict::Unique {
            closest_mse: Some(mse),
        } = verdict
        {
            let mse_text = format!("closest MSE:{mse:.1}");
            draw_text_mut(img, TEXT_COLOR, x, y, scale, font, &mse_text);
        }
    }

    fn load_font(path: &Path) -> Option<FontVec> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                warn!(?path, error = %e, "failed to read font file");
                return None;
            }
        };
        match FontVec::try_from_vec(data) {
            Ok(font) => {
                info!(?path, "loaded debug font");
                Some(font)
            }
            Err(e) => {
                warn!(?path, error = %e, "failed to parse font file");
                None
            }
        }
    }
}

fn verdict_text(verdict: &Verdict, kept_index: Option<usize>) -> String {
    match (verdict, kept_index) {
        (Verdict::Unique { .. }, Some(index)) => format!("KEPT #{index:03}"),
        (Verdict::Unique { .. }, None) => "KEPT".to_string(),
        (Verdict::Duplicate { of, mse }, _) => format!("DUP of #{of:03} MSE:{mse:.1}"),
    }
}
