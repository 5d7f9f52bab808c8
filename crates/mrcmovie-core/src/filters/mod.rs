pub mod clahe;
pub mod normalize;
pub mod resize;
