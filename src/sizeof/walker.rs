//! Graph Walker Module
//!
//! Bounded breadth-first traversal of an object graph. The walk keeps its own
//! frontier queue and visited set, so graph depth never turns into call-stack
//! depth, and stops as soon as either configured limit is crossed.

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::config::SizeOfEngineConfig;
use crate::error::{Result, SizeOfError};
use crate::graph::ObjectGraph;
use crate::sizeof::filter::{FilterPolicy, ObjectView};
use crate::sizeof::model::SizeModel;
use crate::sizeof::result::{Outcome, SizeOfResult};
use crate::sizeof::visited::VisitedSet;

// == Graph Walker ==
/// One configured traversal strategy. Cheap to build; holds only borrows.
#[derive(Clone, Copy)]
pub struct GraphWalker<'e> {
    config: &'e SizeOfEngineConfig,
    model: &'e SizeModel,
    filter: &'e dyn FilterPolicy,
}

impl<'e> GraphWalker<'e> {
    // == Constructor ==
    pub fn new(
        config: &'e SizeOfEngineConfig,
        model: &'e SizeModel,
        filter: &'e dyn FilterPolicy,
    ) -> Self {
        Self {
            config,
            model,
            filter,
        }
    }

    // == Walk ==
    /// Measures everything reachable from `roots` in a single traversal.
    ///
    /// Objects shared between roots are priced once. An empty root set yields
    /// an empty complete result.
    ///
    /// # Errors
    /// `UnmeasurableType` when an object's shape is unknown and the filter
    /// marks its class fail-closed. Unknown shapes of other classes are
    /// skipped.
    pub fn walk<G, I>(&self, graph: &G, roots: I) -> Result<SizeOfResult>
    where
        G: ObjectGraph + ?Sized,
        I: IntoIterator<Item = G::Ref>,
    {
        let max_object_graph_size = self.config.max_object_graph_size();
        let max_object_size = self.config.max_object_size();

        // Every identity enters the frontier at most once per walk
        let mut enqueued = VisitedSet::new();
        let mut frontier: VecDeque<G::Ref> = roots
            .into_iter()
            .filter(|root| !self.filter.exclude_subgraph(graph.class_name(root)))
            .filter(|root| enqueued.insert(graph.identity(root)))
            .collect();
        if frontier.is_empty() {
            return Ok(SizeOfResult::empty());
        }

        let mut visited = VisitedSet::new();
        let mut total_size: u64 = 0;

        while let Some(object) = frontier.pop_front() {
            let id = graph.identity(&object);
            let class = graph.class_name(&object);

            if self.filter.exclude_object(&ObjectView { id, class }) {
                trace!("Excluded object {} of class {}", id, class);
                continue;
            }

            // Already measured through another path
            if !visited.insert(id) {
                continue;
            }

            let visited_count = visited.len() as u64;
            if visited_count > max_object_graph_size {
                warn!(
                    "Object graph limit of {} reached while sizing; visited {} objects, {} bytes so far",
                    max_object_graph_size, visited_count, total_size
                );
                return Ok(SizeOfResult::new(
                    total_size,
                    visited_count,
                    Outcome::AbortedGraphSizeLimit,
                ));
            }

            let Some(mut shape) = graph.shape(&object) else {
                if self.filter.fail_closed(class) {
                    return Err(SizeOfError::UnmeasurableType {
                        class: class.to_string(),
                    });
                }
                debug!("Skipping object {} of class {}: unknown shape", id, class);
                continue;
            };

            shape.retain_fields(|field| !self.filter.exclude_field(class, field));
            let object_size = self.model.size_of(&shape);
            if object_size > max_object_size {
                warn!(
                    "Object {} of class {} is {} bytes, above the limit of {}",
                    id, class, object_size, max_object_size
                );
                return Ok(SizeOfResult::new(
                    total_size,
                    visited_count,
                    Outcome::AbortedObjectSizeLimit,
                ));
            }
            total_size = total_size.saturating_add(object_size);

            for referent in graph.referents(&object) {
                if referent
                    .field
                    .is_some_and(|field| self.filter.exclude_field(class, field))
                {
                    continue;
                }
                let Some(target) = referent.target else {
                    continue;
                };
                if self.filter.exclude_subgraph(graph.class_name(&target)) {
                    continue;
                }
                if enqueued.insert(graph.identity(&target)) {
                    frontier.push_back(target);
                }
            }
        }

        debug!(
            "Sized object graph: {} bytes across {} objects",
            total_size,
            visited.len()
        );
        Ok(SizeOfResult::new(
            total_size,
            visited.len() as u64,
            Outcome::Complete,
        ))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Handle, Heap};
    use crate::sizeof::filter::{FilterRules, NoFilter};
    use crate::sizeof::shape::Primitive;
    use std::io;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    fn walk_with(
        heap: &Heap,
        roots: Vec<Handle>,
        config: SizeOfEngineConfig,
        filter: &dyn FilterPolicy,
    ) -> Result<SizeOfResult> {
        let model = SizeModel::compressed_64();
        GraphWalker::new(&config, &model, filter).walk(heap, roots)
    }

    fn walk(heap: &Heap, root: Handle) -> SizeOfResult {
        walk_with(heap, vec![root], SizeOfEngineConfig::unbounded(), &NoFilter).unwrap()
    }

    /// Builds `root -> n1 -> ... -> n(len-1)`; every node is 16 bytes.
    fn chain(heap: &mut Heap, len: usize) -> Handle {
        let mut next = None;
        for _ in 0..len {
            next = Some(heap.record("Link").reference("next", next).alloc());
        }
        next.unwrap()
    }

    #[test]
    fn test_walk_no_roots() {
        let heap = Heap::new();
        let result =
            walk_with(&heap, vec![], SizeOfEngineConfig::unbounded(), &NoFilter).unwrap();
        assert_eq!(result, SizeOfResult::empty());
    }

    #[test]
    fn test_walk_single_object() {
        let mut heap = Heap::new();
        let root = heap.boxed("Long", Primitive::Long);

        assert_eq!(walk(&heap, root), SizeOfResult::new(8, 1, Outcome::Complete));
    }

    #[test]
    fn test_walk_chain() {
        let mut heap = Heap::new();
        let root = chain(&mut heap, 5);

        assert_eq!(walk(&heap, root), SizeOfResult::new(80, 5, Outcome::Complete));
    }

    #[test]
    fn test_walk_self_cycle() {
        let mut heap = Heap::new();
        let node = heap.record("Link").reference("next", None).alloc();
        heap.set_field(node, "next", Some(node)).unwrap();

        assert_eq!(walk(&heap, node), SizeOfResult::new(16, 1, Outcome::Complete));
    }

    #[test]
    fn test_walk_skips_nulls() {
        let mut heap = Heap::new();
        let array = heap.reference_array("Object[]", vec![None, None, None, None]);

        // 16 header + 4 * 4 references
        assert_eq!(walk(&heap, array), SizeOfResult::new(32, 1, Outcome::Complete));
    }

    #[test]
    fn test_walk_unknown_shape_is_skipped() {
        let mut heap = Heap::new();
        let hidden = heap.boxed("Integer", Primitive::Int);
        let opaque = heap.opaque("Thread");
        let root = heap
            .record("Holder")
            .reference("thread", Some(opaque))
            .reference("value", Some(hidden))
            .alloc();

        // Opaque object counts as visited but contributes nothing
        assert_eq!(
            walk(&heap, root),
            SizeOfResult::new(24 + 4, 3, Outcome::Complete)
        );
    }

    #[test]
    fn test_walk_unknown_shape_fail_closed() {
        let mut heap = Heap::new();
        let opaque = heap.opaque("Socket");
        let root = heap.record("Holder").reference("socket", Some(opaque)).alloc();
        let rules = FilterRules::new().fail_closed_class("Socket");

        let result = walk_with(&heap, vec![root], SizeOfEngineConfig::unbounded(), &rules);
        assert_eq!(
            result,
            Err(SizeOfError::UnmeasurableType {
                class: "Socket".to_string()
            })
        );
    }

    #[test]
    fn test_walk_graph_limit_boundary() {
        let mut heap = Heap::new();
        let root = chain(&mut heap, 3);

        let exact = SizeOfEngineConfig::new(3, u64::MAX).unwrap();
        let result = walk_with(&heap, vec![root], exact, &NoFilter).unwrap();
        assert_eq!(result, SizeOfResult::new(48, 3, Outcome::Complete));

        let short = SizeOfEngineConfig::new(2, u64::MAX).unwrap();
        let result = walk_with(&heap, vec![root], short, &NoFilter).unwrap();
        assert_eq!(
            result,
            SizeOfResult::new(32, 3, Outcome::AbortedGraphSizeLimit)
        );
    }

    #[test]
    fn test_walk_object_limit_is_strict() {
        let mut heap = Heap::new();
        let root = chain(&mut heap, 2);

        let exact = SizeOfEngineConfig::new(u64::MAX, 16).unwrap();
        let result = walk_with(&heap, vec![root], exact, &NoFilter).unwrap();
        assert_eq!(result, SizeOfResult::new(32, 2, Outcome::Complete));

        let below = SizeOfEngineConfig::new(u64::MAX, 15).unwrap();
        let result = walk_with(&heap, vec![root], below, &NoFilter).unwrap();
        assert_eq!(
            result,
            SizeOfResult::new(0, 1, Outcome::AbortedObjectSizeLimit)
        );
    }

    #[test]
    fn test_walk_excluded_field_not_priced_or_followed() {
        let mut heap = Heap::new();
        let cache = heap.primitive_array("byte[]", Primitive::Byte, 1024);
        let root = heap
            .record("Session")
            .primitive("id", Primitive::Long)
            .reference("cache", Some(cache))
            .alloc();
        let rules = FilterRules::new().ignore_field("Session", "cache");

        let result =
            walk_with(&heap, vec![root], SizeOfEngineConfig::unbounded(), &rules).unwrap();
        // 12 header + 8 id, the cache slot is dropped
        assert_eq!(result, SizeOfResult::new(24, 1, Outcome::Complete));
    }

    #[test]
    fn test_walk_excluded_subgraph_is_zero_size_leaf() {
        let mut heap = Heap::new();
        let parent_loader = heap.record("Loader").reference("parent", None).alloc();
        let loader = heap
            .record("Loader")
            .reference("parent", Some(parent_loader))
            .alloc();
        let root = heap
            .record("Session")
            .primitive("id", Primitive::Long)
            .reference("loader", Some(loader))
            .alloc();
        let rules = FilterRules::new().ignore_class("Loader");

        let result =
            walk_with(&heap, vec![root], SizeOfEngineConfig::unbounded(), &rules).unwrap();
        // 12 header + 8 id + 4 loader slot
        assert_eq!(result, SizeOfResult::new(24, 1, Outcome::Complete));
    }

    #[test]
    fn test_walk_excluded_root() {
        let mut heap = Heap::new();
        let root = chain(&mut heap, 4);
        let rules = FilterRules::new().exclude_instance(root.id());

        let result =
            walk_with(&heap, vec![root], SizeOfEngineConfig::unbounded(), &rules).unwrap();
        assert_eq!(result, SizeOfResult::empty());

        let rules = FilterRules::new().ignore_class("Link");
        let result =
            walk_with(&heap, vec![root], SizeOfEngineConfig::unbounded(), &rules).unwrap();
        assert_eq!(result, SizeOfResult::empty());
    }

    #[test]
    fn test_walk_excluded_object_reached_twice() {
        let mut heap = Heap::new();
        let big = heap.primitive_array("byte[]", Primitive::Byte, 4096);
        let root = heap
            .record("Pair")
            .reference("first", Some(big))
            .reference("second", Some(big))
            .alloc();
        let rules = FilterRules::new().exclude_objects_where(|object| object.class == "byte[]");

        let result =
            walk_with(&heap, vec![root], SizeOfEngineConfig::unbounded(), &rules).unwrap();
        assert_eq!(result, SizeOfResult::new(24, 1, Outcome::Complete));
    }

    #[test]
    fn test_walk_multiple_roots_share_visited_set() {
        let mut heap = Heap::new();
        let shared = heap.boxed("Long", Primitive::Long);
        let key = heap.cell("Key", Some(shared));
        let value = heap.cell("Value", Some(shared));

        let result = walk_with(
            &heap,
            vec![key, value, key],
            SizeOfEngineConfig::unbounded(),
            &NoFilter,
        )
        .unwrap();
        assert_eq!(result, SizeOfResult::new(4 + 4 + 8, 3, Outcome::Complete));
    }

    #[test]
    fn test_walk_is_breadth_first() {
        let mut heap = Heap::new();
        let deep = chain(&mut heap, 3);
        let left = heap.record("Link").reference("next", Some(deep)).alloc();
        let right = heap.primitive_array("byte[]", Primitive::Byte, 84);
        let root = heap
            .record("Pair")
            .reference("left", Some(left))
            .reference("right", Some(right))
            .alloc();

        // Siblings are dequeued in field order: root, left, then right trips the limit.
        let config = SizeOfEngineConfig::new(2, u64::MAX).unwrap();
        let result = walk_with(&heap, vec![root], config, &NoFilter).unwrap();
        assert_eq!(
            result,
            SizeOfResult::new(24 + 16, 3, Outcome::AbortedGraphSizeLimit)
        );

        let result = walk(&heap, root);
        assert_eq!(
            result,
            SizeOfResult::new(24 + 16 + 104 + 48, 6, Outcome::Complete)
        );
    }

    /// Counts how many frontier entries reach the dequeue step.
    #[derive(Default)]
    struct CountingFilter {
        dequeued: AtomicU64,
    }

    impl FilterPolicy for CountingFilter {
        fn exclude_object(&self, _object: &ObjectView<'_>) -> bool {
            self.dequeued.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    #[test]
    fn test_walk_shared_target_enqueued_once() {
        let mut heap = Heap::new();
        let shared = heap.boxed("Long", Primitive::Long);
        let root = heap.reference_array("Object[]", vec![Some(shared); 10_000]);
        let filter = CountingFilter::default();

        let config = SizeOfEngineConfig::new(2, u64::MAX).unwrap();
        let result = walk_with(&heap, vec![root], config, &filter).unwrap();

        assert_eq!(
            result,
            SizeOfResult::new(16 + 40_000 + 8, 2, Outcome::Complete)
        );
        assert_eq!(filter.dequeued.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_walk_duplicate_roots_enqueued_once() {
        let mut heap = Heap::new();
        let value = heap.boxed("Integer", Primitive::Int);
        let filter = CountingFilter::default();

        let result = walk_with(
            &heap,
            vec![value, value, value],
            SizeOfEngineConfig::unbounded(),
            &filter,
        )
        .unwrap();

        assert_eq!(result, SizeOfResult::new(4, 1, Outcome::Complete));
        assert_eq!(filter.dequeued.load(Ordering::Relaxed), 1);
    }

    /// Captures formatted log output for level assertions.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn warnings_during<F: FnOnce()>(run: F) -> String {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, run);
        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_walk_unknown_shape_does_not_warn() {
        let mut heap = Heap::new();
        let opaque = heap.opaque("Thread");
        let root = heap.record("Holder").reference("thread", Some(opaque)).alloc();

        let logs = warnings_during(|| {
            assert_eq!(walk(&heap, root), SizeOfResult::new(16, 2, Outcome::Complete));
        });
        assert!(logs.is_empty(), "unexpected warnings: {}", logs);
    }

    #[test]
    fn test_walk_limit_abort_warns() {
        let mut heap = Heap::new();
        let root = chain(&mut heap, 3);
        let config = SizeOfEngineConfig::new(1, u64::MAX).unwrap();

        let logs = warnings_during(|| {
            let result = walk_with(&heap, vec![root], config, &NoFilter).unwrap();
            assert_eq!(result.outcome(), Outcome::AbortedGraphSizeLimit);
        });
        assert!(logs.contains("Object graph limit of 1 reached"));
    }
}
