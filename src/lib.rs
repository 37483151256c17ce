//! Heap SizeOf - object graph size measurement for heap cache tiers
//!
//! Walks object graphs of runtime-determined shape, prices each distinct
//! object once, and stops early when a graph is too large to be worth caching.

pub mod config;
pub mod error;
pub mod graph;
pub mod sizeof;

pub use config::SizeOfEngineConfig;
pub use error::SizeOfError;
pub use sizeof::{SizeOfEngine, SizeOfResult};
