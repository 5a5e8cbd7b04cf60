use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::ImageReader;
use tracing::{debug, info, warn};

use crate::color::Rgb565;
use crate::config::{HeaderConfig, ListingOrder};
use crate::error::ConvertError;

/// Still-image extension picked up by the encoder. Matched case-sensitively.
pub const STILL_IMAGE_EXTENSION: &str = ".jpg";

/// A C header declaring an RGB565 animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderDocument {
    pub variable_name: String,
    pub width: u32,
    pub height: u32,
    /// One row of packed pixels per frame, row-major.
    pub rows: Vec<Vec<Rgb565>>,
}

impl HeaderDocument {
    pub fn frame_count(&self) -> usize {
        self.rows.len()
    }

    pub fn pixels_per_frame(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// The document as individual lines, without line terminators.
    pub fn lines(&self) -> Vec<String> {
        let guard = format!("{}_H", self.variable_name.to_uppercase());
        let mut lines = Vec::with_capacity(self.rows.len() + 12);

        lines.push(format!("#ifndef {guard}"));
        lines.push(format!("#define {guard}"));
        lines.push(String::new());
        lines.push(format!("int frames = {};", self.frame_count()));
        lines.push(format!("int animation_width = {};", self.width));
        lines.push(format!("int animation_height = {};", self.height));
        lines.push(format!(
            "const unsigned short PROGMEM {}[][ {} ] = {{",
            self.variable_name,
            self.pixels_per_frame()
        ));

        for row in &self.rows {
            let literals: Vec<String> = row.iter().map(Rgb565::to_string).collect();
            lines.push(format!("    {{{}}},", literals.join(", ")));
        }

        lines.push("};".to_string());
        lines.push(String::new());
        lines.push(format!("#endif // {guard}"));
        lines
    }

    pub fn render(&self) -> String {
        self.lines().join("\n")
    }
}

/// What one header run produced.
#[derive(Debug, Clone)]
pub struct HeaderSummary {
    pub output: PathBuf,
    pub frame_count: usize,
    pub width: u32,
    pub height: u32,
}

/// List the still images in `dir` in the requested order.
pub fn list_still_images(dir: &Path, order: ListingOrder) -> Result<Vec<PathBuf>, ConvertError> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.as_encoded_bytes().ends_with(STILL_IMAGE_EXTENSION.as_bytes()) {
            names.push(name);
        }
    }

    if order == ListingOrder::Sorted {
        names.sort();
    }

    debug!(?dir, count = names.len(), ?order, "listed still images");
    Ok(names.into_iter().map(|name| dir.join(name)).collect())
}

/// Open an image with its format sniffed from the content, not the extension.
fn open_still(path: &Path) -> Result<ImageReader<BufReader<File>>, ConvertError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?)
}

/// Open one image and pack its pixels, y outer and x inner.
fn pack_image(path: &Path) -> Result<((u32, u32), Vec<Rgb565>), ConvertError> {
    let image = open_still(path)?.decode()?.into_rgb8();
    let pixels = image.pixels().map(|&p| Rgb565::from(p)).collect();
    Ok((image.dimensions(), pixels))
}

/// Build the header document for every still image in `input_dir`.
pub fn build_document(
    input_dir: &Path,
    config: &HeaderConfig,
) -> Result<HeaderDocument, ConvertError> {
    config.validate()?;

    let images = list_still_images(input_dir, config.listing_order)?;
    let Some(first) = images.first() else {
        return Err(ConvertError::NoStillImages {
            dir: input_dir.to_path_buf(),
        });
    };

    let (width, height) = open_still(first)?.into_dimensions()?;
    info!(frames = images.len(), width, height, "encoding still images");

    let mut rows = Vec::with_capacity(images.len());
    for path in &images {
        let (size, pixels) = pack_image(path)?;
        if size != (width, height) {
            if !config.allow_ragged_rows {
                return Err(ConvertError::DimensionMismatch {
                    path: path.clone(),
                    expected: (width, height),
                    actual: size,
                });
            }
            warn!(
                ?path,
                expected = ?(width, height),
                actual = ?size,
                "image size differs from the first image, row length will not match"
            );
        }
        debug!(?path, pixels = pixels.len(), "packed image");
        rows.push(pixels);
    }

    Ok(HeaderDocument {
        variable_name: config.variable_name.clone(),
        width,
        height,
        rows,
    })
}

/// Encode every still image in `input_dir` into an RGB565 header at `output`.
///
/// Nothing is written unless the whole document builds.
pub fn generate_header(
    input_dir: &Path,
    output: &Path,
    config: &HeaderConfig,
) -> Result<HeaderSummary, ConvertError> {
    info!(?input_dir, ?output, variable_name = %config.variable_name, "header generation starting");

    let document = build_document(input_dir, config)?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let text = document.render();
    std::fs::write(output, &text)?;

    info!(
        ?output,
        frames = document.frame_count(),
        bytes = text.len(),
        "header written"
    );

    Ok(HeaderSummary {
        output: output.to_path_buf(),
        frame_count: document.frame_count(),
        width: document.width,
        height: document.height,
    })
}

#[cfg(test)]
mod tests {
    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;

    fn save(dir: &Path, name: &str, w: u32, h: u32, color: [u8; 3]) {
        RgbImage::from_pixel(w, h, Rgb(color))
            .save(dir.join(name))
            .unwrap();
    }

    fn is_hex_literal(s: &str) -> bool {
        s.len() == 6
            && s.starts_with("0x")
            && s[2..]
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    }

    #[test]
    fn renders_exact_layout() {
        let document = HeaderDocument {
            variable_name: "walk".to_string(),
            width: 2,
            height: 1,
            rows: vec![
                vec![Rgb565(0xF800), Rgb565(0x07E0)],
                vec![Rgb565(0x001F), Rgb565(0xFFFF)],
            ],
        };
        let expected = "\
#ifndef WALK_H
#define WALK_H

int frames = 2;
int animation_width = 2;
int animation_height = 1;
const unsigned short PROGMEM walk[][ 2 ] = {
    {0xF800, 0x07E0},
    {0x001F, 0xFFFF},
};

#endif // WALK_H";
        assert_eq!(document.render(), expected);
    }

    #[test]
    fn lists_only_lowercase_jpg_sorted() {
        let dir = tempfile::tempdir().unwrap();
        save(dir.path(), "frame_002.jpg", 1, 1, [0, 0, 0]);
        save(dir.path(), "frame_000.jpg", 1, 1, [0, 0, 0]);
        save(dir.path(), "frame_001.jpg", 1, 1, [0, 0, 0]);
        save(dir.path(), "upper.JPG", 1, 1, [0, 0, 0]);
        save(dir.path(), "other.png", 1, 1, [0, 0, 0]);

        let listed = list_still_images(dir.path(), ListingOrder::Sorted).unwrap();
        let names: Vec<_> = listed
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["frame_000.jpg", "frame_001.jpg", "frame_002.jpg"]);

        let unsorted = list_still_images(dir.path(), ListingOrder::Directory).unwrap();
        assert_eq!(unsorted.len(), 3);
    }

    #[test]
    fn pixels_are_packed_row_major() {
        let dir = tempfile::tempdir().unwrap();
        // Left half red, right half blue; a transposed scan would break the pattern.
        let image = RgbImage::from_fn(16, 8, |x, _| {
            if x < 8 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        image.save(dir.path().join("frame_000.jpg")).unwrap();

        let document = build_document(dir.path(), &HeaderConfig::default()).unwrap();
        assert_eq!((document.width, document.height), (16, 8));
        let row = &document.rows[0];
        assert_eq!(row.len(), 128);
        assert_eq!(row[0], Rgb565(0xF800));
        assert_eq!(row[7], Rgb565(0xF800));
        assert_eq!(row[8], Rgb565(0x001F));
        assert_eq!(row[16], Rgb565(0xF800));
        assert_eq!(row[127], Rgb565(0x001F));
    }

    #[test]
    fn format_is_detected_from_content() {
        let dir = tempfile::tempdir().unwrap();
        let image = RgbImage::from_fn(16, 8, |x, y| Rgb([(x * 16) as u8, (y * 32) as u8, 7]));
        image
            .save_with_format(dir.path().join("frame_000.jpg"), ImageFormat::Png)
            .unwrap();

        let document = build_document(dir.path(), &HeaderConfig::default()).unwrap();
        assert_eq!((document.width, document.height), (16, 8));
        // Lossless PNG data, so every pixel packs exactly.
        let expected: Vec<Rgb565> = image.pixels().map(|&p| Rgb565::from(p)).collect();
        assert_eq!(document.rows[0], expected);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_names_are_counted() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        save(dir.path(), "frame_000.jpg", 1, 1, [0, 0, 0]);
        let odd = dir.path().join(OsStr::from_bytes(b"frame_\xff.jpg"));
        RgbImage::from_pixel(1, 1, Rgb([0, 0, 0]))
            .save_with_format(&odd, ImageFormat::Jpeg)
            .unwrap();

        let listed = list_still_images(dir.path(), ListingOrder::Sorted).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1], odd);
    }

    #[test]
    fn header_structure_matches_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let frames = dir.path().join("frames");
        std::fs::create_dir(&frames).unwrap();
        for i in 0..3 {
            save(&frames, &format!("frame_{i:03}.jpg"), 5, 4, [i * 80, 255, 0]);
        }
        let output = dir.path().join("out/include/anim.h");
        let config = HeaderConfig {
            variable_name: "anim".to_string(),
            ..Default::default()
        };

        let summary = generate_header(&frames, &output, &config).unwrap();
        assert_eq!(summary.frame_count, 3);
        assert_eq!((summary.width, summary.height), (5, 4));

        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("#ifndef ANIM_H\n#define ANIM_H\n"));
        assert!(text.contains("int frames = 3;"));
        assert!(text.contains("int animation_width = 5;"));
        assert!(text.contains("int animation_height = 4;"));
        assert!(text.contains("const unsigned short PROGMEM anim[][ 20 ] = {"));
        assert!(text.ends_with("#endif // ANIM_H"));

        let rows: Vec<&str> = text.lines().filter(|l| l.starts_with("    {")).collect();
        assert_eq!(rows.len(), 3);
        for row in rows {
            let inner = row
                .trim()
                .strip_prefix('{')
                .and_then(|r| r.strip_suffix("},"))
                .unwrap();
            let literals: Vec<&str> = inner.split(", ").collect();
            assert_eq!(literals.len(), 20);
            assert!(literals.iter().all(|l| is_hex_literal(l)), "bad row: {row}");
        }
    }

    #[test]
    fn empty_directory_is_rejected_without_output() {
        let dir = tempfile::tempdir().unwrap();
        save(dir.path(), "not_a_frame.png", 1, 1, [0, 0, 0]);
        let output = dir.path().join("walk.h");

        let err = generate_header(dir.path(), &output, &HeaderConfig::default()).unwrap_err();
        assert!(matches!(err, ConvertError::NoStillImages { .. }));
        assert!(err.is_validation());
        assert!(!output.exists());
    }

    #[test]
    fn mismatched_sizes_fail_by_default() {
        let dir = tempfile::tempdir().unwrap();
        save(dir.path(), "frame_000.jpg", 4, 4, [0, 0, 0]);
        save(dir.path(), "frame_001.jpg", 2, 2, [0, 0, 0]);
        let output = dir.path().join("walk.h");

        let err = generate_header(dir.path(), &output, &HeaderConfig::default()).unwrap_err();
        match err {
            ConvertError::DimensionMismatch {
                path,
                expected,
                actual,
            } => {
                assert!(path.ends_with("frame_001.jpg"));
                assert_eq!(expected, (4, 4));
                assert_eq!(actual, (2, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!output.exists());
    }

    #[test]
    fn ragged_rows_allowed_on_request() {
        let dir = tempfile::tempdir().unwrap();
        save(dir.path(), "frame_000.jpg", 4, 4, [0, 0, 0]);
        save(dir.path(), "frame_001.jpg", 2, 2, [0, 0, 0]);
        let config = HeaderConfig {
            allow_ragged_rows: true,
            ..Default::default()
        };

        let document = build_document(dir.path(), &config).unwrap();
        assert_eq!(document.pixels_per_frame(), 16);
        assert_eq!(document.rows[0].len(), 16);
        assert_eq!(document.rows[1].len(), 4);
    }

    #[test]
    fn invalid_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        save(dir.path(), "frame_000.jpg", 1, 1, [0, 0, 0]);
        let config = HeaderConfig {
            variable_name: "my-anim".to_string(),
            ..Default::default()
        };
        let err = build_document(dir.path(), &config).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidVariableName(_)));
    }

    #[test]
    fn overwrites_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        save(dir.path(), "frame_000.jpg", 1, 1, [255, 255, 255]);
        let output = dir.path().join("walk.h");
        std::fs::write(&output, "stale content that is much longer than the header").unwrap();

        generate_header(dir.path(), &output, &HeaderConfig::default()).unwrap();
        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("#ifndef WALK_H"));
        assert!(!text.contains("stale"));
    }
}
