mod cli;

use std::path::Path;

use anim565_core::{extract_frames, generate_header, ExtractConfig, HeaderConfig};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Command::Extract {
            input,
            output,
            extract,
        } => run_extract(&input, &output, &ExtractConfig::from(extract)),
        cli::Command::Header {
            input,
            output,
            header,
        } => run_header(&input, &output, &HeaderConfig::from(header)),
        cli::Command::Convert {
            input,
            frames,
            output,
            extract,
            header,
        } => {
            run_extract(&input, &frames, &ExtractConfig::from(extract))?;
            run_header(&frames, &output, &HeaderConfig::from(header))
        }
    }
}

fn run_extract(input: &Path, output: &Path, config: &ExtractConfig) -> Result<()> {
    info!(?input, ?output, "extracting frames");

    let summary = extract_frames(input, output, config)
        .with_context(|| format!("failed to extract frames from {}", input.display()))?;

    if summary.kept_frames() == 0 {
        warn!(?input, "animation contained no frames");
    }

    info!(
        decoded_frames = summary.decoded_frames,
        kept_frames = summary.kept_frames(),
        dropped_frames = summary.decoded_frames as usize - summary.kept_frames(),
        ?output,
        "frames extracted"
    );
    Ok(())
}

fn run_header(input: &Path, output: &Path, config: &HeaderConfig) -> Result<()> {
    info!(?input, ?output, name = %config.variable_name, "generating header");

    let summary = generate_header(input, output, config)
        .with_context(|| format!("failed to generate header from {}", input.display()))?;

    info!(
        frames = summary.frame_count,
        width = summary.width,
        height = summary.height,
        output = ?summary.output,
        "header generated"
    );
    Ok(())
}
