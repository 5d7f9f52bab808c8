pub mod avi;
pub mod discover;
pub mod image_io;
pub mod mrc;

pub use avi::{AviWriter, Codec};
pub use discover::discover_inputs;
pub use mrc::MrcReader;
