//! Size Engine Module
//!
//! Public façade wired into a heap store. Holds the immutable limits, size
//! model and filter policy, and runs a fresh walk per call.

use std::fmt;

use tracing::debug;

use crate::config::SizeOfEngineConfig;
use crate::error::Result;
use crate::graph::ObjectGraph;
use crate::sizeof::filter::{FilterPolicy, NoFilter};
use crate::sizeof::model::SizeModel;
use crate::sizeof::result::SizeOfResult;
use crate::sizeof::walker::GraphWalker;

// == Size Engine ==
/// Measures object graphs under configured limits.
///
/// Read-only after construction. Every call owns its traversal state, so a
/// single engine can be shared across threads behind an `Arc`.
///
/// ```
/// use heap_sizeof::graph::Heap;
/// use heap_sizeof::sizeof::{Outcome, Primitive, SizeOfEngine};
/// use heap_sizeof::SizeOfEngineConfig;
///
/// let mut heap = Heap::new();
/// let value = heap.boxed("Long", Primitive::Long);
///
/// let engine = SizeOfEngine::new(SizeOfEngineConfig::new(500, 200_000)?)?;
/// let result = engine.measure(&heap, value)?;
/// assert_eq!(result.outcome(), Outcome::Complete);
/// assert_eq!(result.size(), Some(8));
/// # Ok::<(), heap_sizeof::error::SizeOfError>(())
/// ```
pub struct SizeOfEngine {
    /// Traversal limits
    config: SizeOfEngineConfig,
    /// Per-object pricing
    model: SizeModel,
    /// Exclusion rules
    filter: Box<dyn FilterPolicy>,
}

impl SizeOfEngine {
    // == Constructor ==
    /// Creates an engine with the default size model and no filter.
    ///
    /// Fails with `InvalidConfiguration` if either limit is below 1.
    pub fn new(config: SizeOfEngineConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Starts building an engine with a custom model or filter.
    pub fn builder() -> SizeOfEngineBuilder {
        SizeOfEngineBuilder::new()
    }

    pub fn config(&self) -> &SizeOfEngineConfig {
        &self.config
    }

    pub fn model(&self) -> &SizeModel {
        &self.model
    }

    // == Measure ==
    /// Measures the graph reachable from `root`.
    ///
    /// A `None` root measures as empty and complete.
    pub fn measure<G>(&self, graph: &G, root: impl Into<Option<G::Ref>>) -> Result<SizeOfResult>
    where
        G: ObjectGraph + ?Sized,
    {
        let root: Option<G::Ref> = root.into();
        self.walker().walk(graph, root)
    }

    // == Measure All ==
    /// Measures several roots in one traversal; shared objects are priced once.
    pub fn measure_all<G, I>(&self, graph: &G, roots: I) -> Result<SizeOfResult>
    where
        G: ObjectGraph + ?Sized,
        I: IntoIterator<Item = G::Ref>,
    {
        self.walker().walk(graph, roots)
    }

    // == Measure Entry ==
    /// Measures a cache mapping: key and value graphs plus the store's per-entry node.
    ///
    /// The entry overhead is only added to complete results.
    pub fn measure_entry<G>(&self, graph: &G, key: G::Ref, value: G::Ref) -> Result<SizeOfResult>
    where
        G: ObjectGraph + ?Sized,
    {
        let result = self
            .measure_all(graph, [key, value])?
            .with_overhead(self.model.entry_overhead());
        debug!(
            "Sized cache entry: {:?} ({} bytes, {} objects)",
            result.outcome(),
            result.total_size(),
            result.visited_count()
        );
        Ok(result)
    }

    fn walker(&self) -> GraphWalker<'_> {
        GraphWalker::new(&self.config, &self.model, self.filter.as_ref())
    }
}

impl fmt::Debug for SizeOfEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizeOfEngine")
            .field("config", &self.config)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

// == Builder ==
/// Builder for [`SizeOfEngine`].
pub struct SizeOfEngineBuilder {
    config: SizeOfEngineConfig,
    model: SizeModel,
    filter: Box<dyn FilterPolicy>,
}

impl SizeOfEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: SizeOfEngineConfig::default(),
            model: SizeModel::default(),
            filter: Box::new(NoFilter),
        }
    }

    /// Sets the traversal limits (default: unbounded).
    pub fn config(mut self, config: SizeOfEngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the size model (default: 64-bit compressed references).
    pub fn model(mut self, model: SizeModel) -> Self {
        self.model = model;
        self
    }

    /// Sets the filter policy (default: [`NoFilter`]).
    pub fn filter<P>(mut self, filter: P) -> Self
    where
        P: FilterPolicy + 'static,
    {
        self.filter = Box::new(filter);
        self
    }

    /// Validates the configuration and builds the engine.
    pub fn build(self) -> Result<SizeOfEngine> {
        self.config.validate()?;
        debug!(
            "Size-of engine created: max_object_graph_size={}, max_object_size={}",
            self.config.max_object_graph_size(),
            self.config.max_object_size()
        );

        Ok(SizeOfEngine {
            config: self.config,
            model: self.model,
            filter: self.filter,
        })
    }
}

impl Default for SizeOfEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
