//! Routable street graph with a spatial index over its segments

use std::collections::VecDeque;

use fixedbitset::FixedBitSet;
use geo::{Coord, Line, Point};
use hashbrown::HashMap;
use petgraph::{
    graph::{EdgeIndex, NodeIndex},
    stable_graph::StableUnGraph,
    visit::{EdgeRef, NodeIndexable},
};
use rstar::{RTree, primitives::GeomWithData};

use super::components::{EdgeKind, StreetEdge, StreetNode};
use crate::{Error, StreetId};

/// Street segment stored in the R-tree, tagged with its graph edge
pub type IndexedSegment = GeomWithData<rstar::primitives::Line<[f64; 2]>, EdgeIndex>;

/// Hashable identity of a coordinate.
///
/// Two coordinates map to the same node exactly when their bit patterns match,
/// with `-0.0` folded into `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CoordKey(u64, u64);

impl From<Coord<f64>> for CoordKey {
    fn from(coord: Coord<f64>) -> Self {
        Self(canonical_bits(coord.x), canonical_bits(coord.y))
    }
}

fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0_f64.to_bits()
    } else {
        value.to_bits()
    }
}

/// Undirected street graph.
///
/// Nodes are unique coordinates, edges are straight segments. The graph is
/// backed by a stable graph so that edge ids stay valid while segments are
/// split to insert connection points. Only street segments are kept in the
/// spatial index; connection edges never take part in snapping.
#[derive(Debug, Clone)]
pub struct StreetGraph {
    pub graph: StableUnGraph<StreetNode, StreetEdge>,
    node_lookup: HashMap<CoordKey, NodeIndex>,
    rtree: RTree<IndexedSegment>,
}

impl Default for StreetGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl StreetGraph {
    pub fn new() -> Self {
        Self {
            graph: StableUnGraph::default(),
            node_lookup: HashMap::new(),
            rtree: RTree::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of street segments available for snapping
    pub fn street_segment_count(&self) -> usize {
        self.rtree.size()
    }

    /// Node located exactly at `coord`, if any
    pub fn node_at(&self, coord: Coord<f64>) -> Option<NodeIndex> {
        self.node_lookup.get(&CoordKey::from(coord)).copied()
    }

    pub fn node_coord(&self, node: NodeIndex) -> Option<Coord<f64>> {
        self.graph.node_weight(node).map(|n| n.geometry.into())
    }

    /// Returns the node at `coord`, creating it when it does not exist yet
    pub fn ensure_node(&mut self, coord: Coord<f64>) -> NodeIndex {
        let key = CoordKey::from(coord);
        if let Some(&node) = self.node_lookup.get(&key) {
            return node;
        }
        let node = self.graph.add_node(StreetNode {
            geometry: Point::from(coord),
        });
        self.node_lookup.insert(key, node);
        node
    }

    /// Adds a street segment between two coordinates.
    ///
    /// Returns `None` when the two endpoints are already joined by an edge; the
    /// first segment inserted between a pair of nodes is kept.
    pub fn add_street_segment(
        &mut self,
        from: Coord<f64>,
        to: Coord<f64>,
        street_id: Option<StreetId>,
    ) -> Option<EdgeIndex> {
        let a = self.ensure_node(from);
        let b = self.ensure_node(to);
        if self.graph.find_edge(a, b).is_some() {
            return None;
        }
        let edge = self
            .graph
            .add_edge(a, b, StreetEdge::street_segment(from, to, street_id));
        self.rtree.insert(indexed_segment(from, to, edge));
        Some(edge)
    }

    /// Adds a building or source connection edge. Not indexed for snapping.
    pub fn add_connection_edge(
        &mut self,
        kind: EdgeKind,
        from: Coord<f64>,
        to: Coord<f64>,
    ) -> EdgeIndex {
        let a = self.ensure_node(from);
        let b = self.ensure_node(to);
        if let Some(existing) = self.graph.find_edge(a, b) {
            return existing;
        }
        self.graph.add_edge(a, b, StreetEdge::connection(kind, from, to))
    }

    /// Straight line covered by an edge
    pub fn edge_line(&self, edge: EdgeIndex) -> Option<Line<f64>> {
        let (a, b) = self.graph.edge_endpoints(edge)?;
        Some(Line::new(self.node_coord(a)?, self.node_coord(b)?))
    }

    pub fn edge(&self, edge: EdgeIndex) -> Option<&StreetEdge> {
        self.graph.edge_weight(edge)
    }

    /// Edges incident to `node` as `(edge, neighbour, weight)`
    pub fn edges(
        &self,
        node: NodeIndex,
    ) -> impl Iterator<Item = (EdgeIndex, NodeIndex, &StreetEdge)> {
        self.graph.edges(node).map(move |edge| {
            let other = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            (edge.id(), other, edge.weight())
        })
    }

    pub(crate) fn rtree_ref(&self) -> &RTree<IndexedSegment> {
        &self.rtree
    }

    /// Replaces the spatial index with one bulk loaded from all street segments
    pub(crate) fn rebuild_rtree(&mut self) {
        let segments = self
            .graph
            .edge_indices()
            .filter(|&e| self.graph[e].is_street())
            .filter_map(|e| {
                let line = self.edge_line(e)?;
                Some(indexed_segment(line.start, line.end, e))
            })
            .collect();
        self.rtree = RTree::bulk_load(segments);
    }

    /// Splits a street segment at `coord`, which becomes a node shared by the
    /// two halves. Both halves keep the street id of the original segment.
    ///
    /// The freed edge id is handed to the half starting at the segment's first
    /// endpoint, so `edge` stays valid but now names that half. An existing
    /// node at `coord` is reused, which joins a side street ending there.
    pub(crate) fn split_edge(
        &mut self,
        edge: EdgeIndex,
        coord: Coord<f64>,
    ) -> Result<NodeIndex, Error> {
        let (a, b) = self
            .graph
            .edge_endpoints(edge)
            .ok_or(Error::InvalidEdgeIndex(edge))?;
        let weight = self
            .graph
            .edge_weight(edge)
            .ok_or(Error::InvalidEdgeIndex(edge))?;
        if !weight.is_street() {
            return Err(Error::InvalidData(format!(
                "cannot split {} edge {edge:?}",
                weight.kind.as_str()
            )));
        }
        let street_id = weight.street_id;
        let (from, to) = match (self.node_coord(a), self.node_coord(b)) {
            (Some(from), Some(to)) => (from, to),
            _ => return Err(Error::InvalidEdgeIndex(edge)),
        };

        self.rtree.remove(&indexed_segment(from, to, edge));
        self.graph.remove_edge(edge);

        let middle = self.ensure_node(coord);
        for (start, start_coord) in [(a, from), (b, to)] {
            let half = self.graph.add_edge(
                start,
                middle,
                StreetEdge::street_segment(start_coord, coord, street_id),
            );
            self.rtree.insert(indexed_segment(start_coord, coord, half));
        }
        Ok(middle)
    }

    /// Nodes connected to `start`, including `start` itself
    pub fn component(&self, start: NodeIndex) -> FixedBitSet {
        let mut visited = FixedBitSet::with_capacity(self.graph.node_bound());
        if self.graph.node_weight(start).is_none() {
            return visited;
        }
        let mut queue = VecDeque::from([start]);
        visited.insert(start.index());

        while let Some(node) = queue.pop_front() {
            for (_, next, _) in self.edges(node) {
                if !visited.put(next.index()) {
                    queue.push_back(next);
                }
            }
        }
        visited
    }

    /// Coordinates of all nodes reachable from `start`, excluding `start`
    pub fn connected_points(&self, start: NodeIndex) -> Vec<Coord<f64>> {
        self.component(start)
            .ones()
            .map(NodeIndex::new)
            .filter(|&node| node != start)
            .filter_map(|node| self.node_coord(node))
            .collect()
    }
}

fn indexed_segment(from: Coord<f64>, to: Coord<f64>, edge: EdgeIndex) -> IndexedSegment {
    GeomWithData::new(
        rstar::primitives::Line::new([from.x, from.y], [to.x, to.y]),
        edge,
    )
}

#[cfg(test)]
mod tests {
    use geo::coord;

    use super::*;

    #[test]
    fn identical_coordinates_share_a_node() {
        let mut streets = StreetGraph::new();
        let a = streets.ensure_node(coord! { x: 1.0, y: 2.0 });
        let b = streets.ensure_node(coord! { x: 1.0, y: 2.0 });
        let c = streets.ensure_node(coord! { x: -0.0, y: 0.0 });
        let d = streets.ensure_node(coord! { x: 0.0, y: -0.0 });

        assert_eq!(a, b);
        assert_eq!(c, d);
        assert_eq!(streets.node_count(), 2);
    }

    #[test]
    fn duplicate_segment_is_ignored() {
        let mut streets = StreetGraph::new();
        let a = coord! { x: 0.0, y: 0.0 };
        let b = coord! { x: 5.0, y: 0.0 };
        let first = streets.add_street_segment(a, b, Some(0));
        let second = streets.add_street_segment(b, a, Some(1));

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(streets.edge_count(), 1);
        assert_eq!(streets.street_segment_count(), 1);
    }

    #[test]
    fn split_keeps_street_id_and_lengths() {
        let mut streets = StreetGraph::new();
        let edge = streets
            .add_street_segment(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 0.0 }, Some(7))
            .unwrap();

        let middle = streets.split_edge(edge, coord! { x: 4.0, y: 0.0 }).unwrap();

        // The old id now names the half from the first endpoint
        let (from, to) = streets.graph.edge_endpoints(edge).unwrap();
        assert_eq!(streets.node_coord(from), Some(coord! { x: 0.0, y: 0.0 }));
        assert_eq!(to, middle);
        assert_eq!(streets.edge(edge).map(|e| e.length), Some(4.0));
        assert_eq!(streets.edge_count(), 2);
        assert_eq!(streets.street_segment_count(), 2);
        let mut lengths: Vec<f64> = streets
            .edges(middle)
            .map(|(_, _, e)| e.length)
            .collect();
        lengths.sort_by(f64::total_cmp);
        assert_eq!(lengths, vec![4.0, 6.0]);
        assert!(streets.edges(middle).all(|(_, _, e)| e.street_id == Some(7)));
    }

    #[test]
    fn connection_edges_are_not_split() {
        let mut streets = StreetGraph::new();
        let edge = streets.add_connection_edge(
            EdgeKind::BuildingConnection,
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 0.0, y: 3.0 },
        );

        assert!(matches!(
            streets.split_edge(edge, coord! { x: 0.0, y: 1.0 }),
            Err(Error::InvalidData(_))
        ));
        assert_eq!(streets.street_segment_count(), 0);
    }

    #[test]
    fn component_stops_at_gaps() {
        let mut streets = StreetGraph::new();
        streets.add_street_segment(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 0.0 }, None);
        streets.add_street_segment(coord! { x: 1.0, y: 0.0 }, coord! { x: 2.0, y: 0.0 }, None);
        streets.add_street_segment(coord! { x: 10.0, y: 0.0 }, coord! { x: 11.0, y: 0.0 }, None);

        let start = streets.node_at(coord! { x: 0.0, y: 0.0 }).unwrap();
        let island = streets.node_at(coord! { x: 10.0, y: 0.0 }).unwrap();
        let component = streets.component(start);

        assert_eq!(component.count_ones(..), 3);
        assert!(!component.contains(island.index()));
        assert_eq!(streets.connected_points(start).len(), 2);
    }
}
