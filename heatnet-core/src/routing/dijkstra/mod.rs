mod state;
mod traced_dijkstra;

pub use traced_dijkstra::{Path, ShortestPathTree, dijkstra_tree, shortest_path};
