use std::path::PathBuf;

use anim565_core::{ExtractConfig, HeaderConfig, ListingOrder, TargetSize};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "anim565", about = "Convert animations into RGB565 C headers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract visually distinct frames from an animation as numbered JPEGs.
    Extract {
        /// Path to the input animation (GIF, APNG, animated WebP).
        #[arg(short, long)]
        input: PathBuf,

        /// Directory to write frame_NNN.jpg files into.
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Encode a directory of JPEG frames into an RGB565 header.
    Header {
        /// Directory containing the .jpg frames.
        #[arg(short, long)]
        input: PathBuf,

        /// Path of the header file to write.
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        header: HeaderArgs,
    },

    /// Extract frames and encode them into a header in one go.
    Convert {
        /// Path to the input animation.
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for the intermediate frame_NNN.jpg files.
        #[arg(long)]
        frames: PathBuf,

        /// Path of the header file to write.
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        extract: ExtractArgs,

        #[command(flatten)]
        header: HeaderArgs,
    },
}

#[derive(Args)]
pub struct ExtractArgs {
    /// Drop frames whose mean squared error against a kept frame is below this.
    #[arg(short, long, default_value_t = 10.0)]
    pub threshold: f64,

    /// Resize every frame to WIDTHxHEIGHT (e.g. 128x128).
    #[arg(short, long)]
    pub size: Option<TargetSize>,

    /// JPEG quality for written frames (1-100).
    #[arg(short, long, default_value_t = 75, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,

    /// Directory to save every decoded frame annotated with its dedup verdict.
    #[arg(long)]
    pub debug_frames: Option<PathBuf>,

    /// TrueType font used for debug frame text.
    #[arg(long, requires = "debug_frames")]
    pub debug_font: Option<PathBuf>,
}

impl From<ExtractArgs> for ExtractConfig {
    fn from(args: ExtractArgs) -> Self {
        ExtractConfig {
            similarity_threshold: args.threshold,
            target_size: args.size,
            jpeg_quality: args.quality,
            debug_frames_dir: args.debug_frames,
            debug_font: args.debug_font,
        }
    }
}

#[derive(Args)]
pub struct HeaderArgs {
    /// Array name; its upper-cased form becomes the include guard.
    #[arg(short, long, default_value = "walk")]
    pub name: String,

    /// Keep the OS directory order instead of sorting file names.
    #[arg(long)]
    pub directory_order: bool,

    /// Emit rows for frames whose size differs from the first one instead of failing.
    #[arg(long)]
    pub allow_ragged: bool,
}

impl From<HeaderArgs> for HeaderConfig {
    fn from(args: HeaderArgs) -> Self {
        HeaderConfig {
            variable_name: args.name,
            listing_order: if args.directory_order {
                ListingOrder::Directory
            } else {
                ListingOrder::Sorted
            },
            allow_ragged_rows: args.allow_ragged,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn convert_uses_documented_defaults() {
        let cli = Cli::parse_from([
            "anim565", "convert", "-i", "walk.gif", "--frames", "frames", "-o", "walk.h",
        ]);
        let Command::Convert { extract, header, .. } = cli.command else {
            panic!("expected convert");
        };
        let extract = ExtractConfig::from(extract);
        let header = HeaderConfig::from(header);
        assert_eq!(extract.similarity_threshold, 10.0);
        assert!(extract.target_size.is_none());
        assert_eq!(extract.jpeg_quality, 75);
        assert_eq!(header.variable_name, "walk");
        assert_eq!(header.listing_order, ListingOrder::Sorted);
        assert!(!header.allow_ragged_rows);
    }

    #[test]
    fn extract_parses_size() {
        let cli = Cli::parse_from([
            "anim565", "extract", "-i", "a.gif", "-o", "out", "--size", "128x64", "-t", "2.5",
        ]);
        let Command::Extract { extract, .. } = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(extract.size, Some(TargetSize::new(128, 64)));
        assert_eq!(extract.threshold, 2.5);
    }

    #[test]
    fn rejects_malformed_size() {
        let result = Cli::try_parse_from(["anim565", "extract", "-i", "a.gif", "-o", "out", "--size", "big"]);
        assert!(result.is_err());
    }
}
