pub mod analyzer;
pub mod filesystem;
pub mod pipeline;
