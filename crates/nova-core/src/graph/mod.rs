//! Project-wide graph stages: aggregation, pruning and serialization.

pub mod aggregate;
pub mod builder;
pub mod builtins;
pub mod serialize;
