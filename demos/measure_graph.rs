//! Measure Graph Demo
//!
//! Builds a small cache-entry-like object graph and measures it under the
//! limits from the environment, then under a few tighter ones.
//!
//! ```text
//! SIZEOF_MAX_OBJECT_GRAPH_SIZE=500 RUST_LOG=heap_sizeof=debug \
//!     cargo run --example measure_graph
//! ```

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use heap_sizeof::graph::{Handle, Heap};
use heap_sizeof::sizeof::{FilterRules, Primitive, SizeOfEngine};
use heap_sizeof::SizeOfEngineConfig;

/// Session record holding a payload, a shared loader and a ring of listeners.
fn build_session(heap: &mut Heap) -> Result<(Handle, Handle)> {
    let loader = heap.primitive_array("ClassLoader", Primitive::Byte, 8192);
    let payload = heap.primitive_array("char[]", Primitive::Char, 256);
    let name = heap
        .record("String")
        .primitive("hash", Primitive::Int)
        .reference("value", Some(payload))
        .alloc();

    let first = heap.record("Listener").reference("next", None).alloc();
    let second = heap.record("Listener").reference("next", Some(first)).alloc();
    let third = heap.record("Listener").reference("next", Some(second)).alloc();
    heap.set_field(first, "next", Some(third))?;

    let key = heap.boxed("Long", Primitive::Long);
    let session = heap
        .record("Session")
        .primitive("created", Primitive::Long)
        .reference("name", Some(name))
        .reference("loader", Some(loader))
        .reference("listeners", Some(first))
        .alloc();

    Ok((key, session))
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "heap_sizeof=info,measure_graph=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut heap = Heap::new();
    let (key, session) = build_session(&mut heap)?;

    let config = SizeOfEngineConfig::from_env()?;
    info!(
        "Configuration loaded: max_object_graph_size={}, max_object_size={}",
        config.max_object_graph_size(),
        config.max_object_size()
    );

    let engine = SizeOfEngine::new(config)?;
    let result = engine.measure_entry(&heap, key, session)?;
    info!("Entry as configured: {}", serde_json::to_string(&result)?);

    let filtered = SizeOfEngine::builder()
        .config(config)
        .filter(FilterRules::new().ignore_class("ClassLoader"))
        .build()?;
    let result = filtered.measure_entry(&heap, key, session)?;
    info!("Entry without loader: {}", serde_json::to_string(&result)?);

    for (graph_limit, object_limit) in [(4, u64::MAX), (u64::MAX, 1024)] {
        let engine = SizeOfEngine::new(SizeOfEngineConfig::new(graph_limit, object_limit)?)?;
        let result = engine.measure(&heap, session)?;
        match result.size() {
            Some(bytes) => info!("Session fits: {} bytes", bytes),
            None => info!(
                "Session not cacheable under ({}, {}): {:?} after {} objects",
                graph_limit,
                object_limit,
                result.outcome(),
                result.visited_count()
            ),
        }
    }

    Ok(())
}
