pub mod config;
pub mod estimate;
pub mod info;
pub mod options;
pub mod png;
pub mod run;
