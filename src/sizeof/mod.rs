//! SizeOf Module
//!
//! Bounded measurement of object graphs: shape pricing, exclusion rules,
//! breadth-first walking, and the engine façade tying them together.

mod engine;
mod filter;
mod model;
mod result;
mod shape;
mod visited;
mod walker;


// Re-export public types
pub use engine::{SizeOfEngine, SizeOfEngineBuilder};
pub use filter::{FilterChain, FilterPolicy, FilterRules, NoFilter, ObjectView};
pub use model::SizeModel;
pub use result::{Outcome, SizeOfResult};
pub use shape::{ElementKind, FieldShape, Primitive, Shape};
pub use visited::VisitedSet;
pub use walker::GraphWalker;
