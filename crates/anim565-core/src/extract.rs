use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use tracing::{debug, info};

use crate::animation::{Frame, FrameDecoder};
use crate::config::ExtractConfig;
use crate::debug::DebugRenderer;
use crate::dedup::UniqueFrameSet;
use crate::error::ConvertError;

/// What one extraction run produced.
#[derive(Debug, Clone)]
pub struct ExtractSummary {
    /// Frames decoded from the source animation.
    pub decoded_frames: u32,
    /// Written still images, in kept order.
    pub written: Vec<PathBuf>,
}

impl ExtractSummary {
    pub fn kept_frames(&self) -> usize {
        self.written.len()
    }
}

/// File name for the kept frame at `index`: `frame_000.jpg`, `frame_001.jpg`, ...
pub fn frame_file_name(index: usize) -> String {
    format!("frame_{index:03}.jpg")
}

/// Decode `input`, drop near-duplicate frames and write the rest as numbered JPEGs.
///
/// Files already written stay in place if a later step fails.
pub fn extract_frames(
    input: &Path,
    output_dir: &Path,
    config: &ExtractConfig,
) -> Result<ExtractSummary, ConvertError> {
    config.validate()?;

    info!(
        ?input,
        ?output_dir,
        similarity_threshold = config.similarity_threshold,
        target_size = ?config.target_size,
        "extraction starting"
    );

    std::fs::create_dir_all(output_dir)?;

    let mut decoder = FrameDecoder::open(input, config.target_size)?;
    info!(format = ?decoder.format(), "decoding animation");

    let debug_renderer = match &config.debug_frames_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            info!(?dir, "debug frames directory ready");
            Some(DebugRenderer::new(config.debug_font.as_deref()))
        }
        None => None,
    };

    let unique = collect_unique_frames(&mut decoder, config, &debug_renderer)?;
    let decoded_frames = decoder.frame_count();
    drop(decoder);

    info!(
        decoded_frames,
        kept_frames = unique.len(),
        "frame deduplication complete"
    );

    let written = write_frames(&unique.into_frames(), output_dir, config.jpeg_quality)?;

    info!(kept_frames = written.len(), ?output_dir, "extraction complete");

    Ok(ExtractSummary {
        decoded_frames,
        written,
    })
}

fn collect_unique_frames(
    decoder: &mut FrameDecoder,
    config: &ExtractConfig,
    debug_renderer: &Option<DebugRenderer>,
) -> Result<UniqueFrameSet, ConvertError> {
    let mut unique = UniqueFrameSet::new(config.similarity_threshold);

    while let Some(frame) = decoder.next_frame()? {
        let verdict = unique.classify(&frame);
        let kept_index = verdict.is_unique().then(|| unique.len());

        if let (Some(renderer), Some(dir)) = (debug_renderer, &config.debug_frames_dir) {
            renderer.save_frame(&frame, &verdict, kept_index, dir)?;
        }

        if verdict.is_unique() {
            unique.push(frame);
        }
    }

    Ok(unique)
}

fn write_frames(frames: &[Frame], dir: &Path, quality: u8) -> Result<Vec<PathBuf>, ConvertError> {
    let mut written = Vec::with_capacity(frames.len());

    for (index, frame) in frames.iter().enumerate() {
        let path = dir.join(frame_file_name(index));
        let mut writer = BufWriter::new(File::create(&path)?);
        JpegEncoder::new_with_quality(&mut writer, quality).encode_image(&frame.image)?;
        writer.flush()?;

        debug!(?path, source_frame = frame.frame_number, "wrote frame");
        written.push(path);
    }

    Ok(written)
}
