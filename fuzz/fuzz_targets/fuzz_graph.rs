#![no_main]

//! Fuzz target for dependency graph resolution
//!
//! Builds a random graph of keyed services, some edges pointing at keys that
//! were never registered, and checks that resolution terminates with the
//! outcome a plain depth-first walk predicts.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use service_container::{Container, DiError, Lifecycle, Registration};

const MAX_NODES: usize = 12;

#[derive(Debug, Arbitrary)]
struct Node {
    lifecycle: u8,
    dependencies: Vec<u8>,
    fails: bool,
}

#[derive(Debug, Arbitrary)]
struct Graph {
    nodes: Vec<Node>,
    roots: Vec<u8>,
}

fn key(index: u8) -> String {
    format!("svc-{}", index as usize % (MAX_NODES + 2))
}

fn lifecycle(tag: u8) -> Lifecycle {
    match tag % 3 {
        0 => Lifecycle::Singleton,
        1 => Lifecycle::Scoped,
        _ => Lifecycle::Transient,
    }
}

/// Whether resolving `node` must succeed
fn resolvable(graph: &Graph, node: usize, path: &mut Vec<usize>) -> bool {
    if node >= graph.nodes.len() || path.contains(&node) {
        return false;
    }
    let entry = &graph.nodes[node];
    path.push(node);
    let ok = entry
        .dependencies
        .iter()
        .take(4)
        .all(|&dep| resolvable(graph, dep as usize % (MAX_NODES + 2), path));
    path.pop();
    ok && !entry.fails
}

fuzz_target!(|graph: Graph| {
    let mut graph = graph;
    graph.nodes.truncate(MAX_NODES);

    let container = Container::new();
    for (index, node) in graph.nodes.iter().enumerate() {
        let fails = node.fails;
        let registration = Registration::factory(move |_| {
            if fails {
                Err("refused".into())
            } else {
                Ok(index)
            }
        })
        .with_lifecycle(lifecycle(node.lifecycle))
        .depends_on(node.dependencies.iter().take(4).map(|&dep| key(dep)));
        container.register(key(index as u8), registration);
    }

    container.begin_scope("fuzz");

    for &root in graph.roots.iter().take(16) {
        let index = root as usize % (MAX_NODES + 2);
        let expected = resolvable(&graph, index, &mut Vec::new());

        match container.resolve(&key(root)) {
            Ok(instance) => {
                assert!(expected, "resolved {} despite a broken subgraph", key(root));
                assert_eq!(instance.downcast_ref::<usize>(), Some(&index));
            }
            Err(DiError::CircularDependency { key, path }) => {
                assert!(!expected);
                assert!(path.len() >= 2);
                assert_eq!(path.first(), Some(&key));
                assert_eq!(path.last(), Some(&key));
            }
            Err(DiError::NotRegistered { .. }) | Err(DiError::ConstructionFailed { .. }) => {
                assert!(!expected);
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    container.end_scope();
    container.clear();
    assert!(container.is_empty());
});
