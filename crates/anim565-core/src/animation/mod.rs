pub mod decoder;
pub mod frame;

pub use decoder::FrameDecoder;
pub use frame::Frame;
