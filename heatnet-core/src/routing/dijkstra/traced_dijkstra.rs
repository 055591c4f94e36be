use std::collections::BinaryHeap;

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::NodeIndexable;

use super::state::State;
use crate::model::StreetGraph;

/// Route through the street graph
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// Nodes from start to end, both included
    pub nodes: Vec<NodeIndex>,
    /// Edges between consecutive nodes
    pub edges: Vec<EdgeIndex>,
    /// Summed edge length
    pub length: f64,
}

/// Shortest paths from one root, stored as predecessor links.
///
/// When several paths share the minimal length, the one kept is whichever the
/// search settles first. Nodes leave the queue ordered by distance and then by
/// node index, and a predecessor is only replaced by a strictly shorter path,
/// so the choice is stable for a given graph but otherwise not meaningful.
#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    root: NodeIndex,
    distances: HashMap<NodeIndex, f64>,
    predecessors: HashMap<NodeIndex, (NodeIndex, EdgeIndex)>,
}

impl ShortestPathTree {
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn distance(&self, node: NodeIndex) -> Option<f64> {
        self.distances.get(&node).copied()
    }

    pub fn reached_count(&self) -> usize {
        self.distances.len()
    }

    /// Path from the root to `node`, `None` if the search never reached it
    pub fn path_to(&self, node: NodeIndex) -> Option<Path> {
        let length = self.distance(node)?;

        let mut nodes = vec![node];
        let mut edges = Vec::new();
        let mut current = node;
        while current != self.root {
            let &(prev, edge) = self.predecessors.get(&current)?;
            nodes.push(prev);
            edges.push(edge);
            current = prev;
        }
        nodes.reverse();
        edges.reverse();

        Some(Path {
            nodes,
            edges,
            length,
        })
    }
}

/// Dijkstra's algorithm over street lengths.
///
/// With a `target` the search stops as soon as the target is settled; only
/// the path to the target is then guaranteed to be shortest.
pub fn dijkstra_tree(
    graph: &StreetGraph,
    start: NodeIndex,
    target: Option<NodeIndex>,
) -> ShortestPathTree {
    let mut distances: HashMap<NodeIndex, f64> = HashMap::new();
    let mut predecessors: HashMap<NodeIndex, (NodeIndex, EdgeIndex)> = HashMap::new();
    let mut settled = FixedBitSet::with_capacity(graph.graph.node_bound());
    let mut heap = BinaryHeap::new();

    if graph.graph.node_weight(start).is_some() {
        heap.push(State {
            cost: 0.0,
            node: start,
        });
        distances.insert(start, 0.0);
    }

    while let Some(State { cost, node }) = heap.pop() {
        // Stale entry, the node was settled through a shorter path
        if settled.put(node.index()) {
            continue;
        }

        if target == Some(node) {
            break;
        }

        for (edge, next, weight) in graph.edges(node) {
            if settled.contains(next.index()) {
                continue;
            }
            let next_cost = cost + weight.length;

            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    predecessors.insert(next, (node, edge));
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        predecessors.insert(next, (node, edge));
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    ShortestPathTree {
        root: start,
        distances,
        predecessors,
    }
}

/// Shortest path between two nodes, `None` if they are not connected
pub fn shortest_path(graph: &StreetGraph, start: NodeIndex, end: NodeIndex) -> Option<Path> {
    dijkstra_tree(graph, start, Some(end)).path_to(end)
}
