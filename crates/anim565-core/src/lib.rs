pub mod animation;
pub mod color;
pub mod config;
pub mod debug;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod header;

pub use config::{ExtractConfig, HeaderConfig, ListingOrder, TargetSize};
pub use error::ConvertError;
pub use extract::{extract_frames, ExtractSummary};
pub use header::{generate_header, HeaderSummary};
