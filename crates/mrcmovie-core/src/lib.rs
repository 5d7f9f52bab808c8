pub mod assemble;
pub mod consts;
pub mod enhance;
pub mod error;
pub mod filters;
pub mod frame;
pub mod io;
pub mod memory;
pub mod pipeline;
pub mod range;
pub mod stats;
