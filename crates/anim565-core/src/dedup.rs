use image::RgbImage;
use tracing::{debug, warn};

use crate::animation::Frame;

/// Mean squared difference over every pixel channel of two same-sized images.
///
/// Returns `None` when the dimensions differ, since the score is meaningless then.
pub fn mean_squared_error(a: &RgbImage, b: &RgbImage) -> Option<f64> {
    if a.dimensions() != b.dimensions() {
        return None;
    }
    let samples = a.as_raw().len();
    if samples == 0 {
        return Some(0.0);
    }
    let sum: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&x, &y)| {
            let d = x.abs_diff(y) as u64;
            d * d
        })
        .sum();
    Some(sum as f64 / samples as f64)
}

/// Outcome of comparing a candidate frame against the kept set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// No kept frame is similar enough. `closest_mse` is the lowest score seen, if any.
    Unique { closest_mse: Option<f64> },
    /// Scored strictly below the threshold against kept frame `of`.
    Duplicate { of: usize, mse: f64 },
}

impl Verdict {
    pub fn is_unique(&self) -> bool {
        matches!(self, Verdict::Unique { .. })
    }
}

/// Frames accepted as visually distinct during one extraction run, in acceptance order.
pub struct UniqueFrameSet {
    threshold: f64,
    frames: Vec<Frame>,
}

impl UniqueFrameSet {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            frames: Vec::new(),
        }
    }

    /// Compare `frame` against kept frames in order, stopping at the first duplicate.
    pub fn classify(&self, frame: &Frame) -> Verdict {
        let mut closest_mse: Option<f64> = None;

        for (index, kept) in self.frames.iter().enumerate() {
            let Some(mse) = mean_squared_error(&frame.image, &kept.image) else {
                warn!(
                    frame_number = frame.frame_number,
                    kept_frame = kept.frame_number,
                    candidate = ?frame.dimensions(),
                    kept_size = ?kept.dimensions(),
                    "frame size differs from kept frame, treating as distinct"
                );
                continue;
            };

            if mse < self.threshold {
                debug!(
                    frame_number = frame.frame_number,
                    duplicate_of = index,
                    mse,
                    "duplicate frame"
                );
                return Verdict::Duplicate { of: index, mse };
            }

            closest_mse = Some(closest_mse.map_or(mse, |c| c.min(mse)));
        }

        debug!(frame_number = frame.frame_number, ?closest_mse, "unique frame");
        Verdict::Unique { closest_mse }
    }

    /// Append a frame to the kept set, returning its index.
    pub fn push(&mut self, frame: Frame) -> usize {
        self.frames.push(frame);
        self.frames.len() - 1
    }

    /// Classify and keep the frame if it is unique.
    pub fn offer(&mut self, frame: Frame) -> Verdict {
        let verdict = self.classify(&frame);
        if verdict.is_unique() {
            self.push(frame);
        }
        verdict
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}
