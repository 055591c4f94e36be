//! Shortest paths over the street graph

pub mod dijkstra;

pub use dijkstra::{Path, ShortestPathTree, dijkstra_tree, shortest_path};
