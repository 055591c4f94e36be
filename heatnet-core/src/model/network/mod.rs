//! Reduced heat network: the street segments actually used to supply buildings

mod to_geojson;

use geo::{Coord, Point};
use hashbrown::HashMap;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use serde::Serialize;

use crate::model::streets::{CoordKey, EdgeKind, StreetGraph};
use crate::{Dn, Error, StreetId};

/// Pipe dimensioning results of a network edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PipeSizing {
    /// Simultaneity factor for the number of supplied buildings
    pub glf: f64,
    /// Power after applying the simultaneity factor
    pub power_glf: f64,
    /// Volume flow in l/s
    pub volumeflow: f64,
    /// Nominal size of the selected pipe
    pub dn: Dn,
    /// Flow velocity in the selected pipe in m/s
    pub velocity: f64,
    /// Annual heat loss of supply and return pipe
    pub loss: f64,
}

#[derive(Debug, Clone)]
pub struct NetNode {
    pub geometry: Point<f64>,
}

/// Edge of the reduced network with its accumulated load
#[derive(Debug, Clone, Serialize)]
pub struct NetEdge {
    pub kind: EdgeKind,
    pub length: f64,
    pub street_id: Option<StreetId>,
    /// Number of buildings supplied through this edge
    pub n_building: u32,
    /// Summed nominal power of those buildings
    pub power: f64,
    /// Set once the network has been dimensioned
    #[serde(flatten)]
    pub sizing: Option<PipeSizing>,
}

/// Edge with its endpoint coordinates, as handed to exporters
#[derive(Debug, Clone, Copy)]
pub struct EdgeRecord<'a> {
    pub from: Coord<f64>,
    pub to: Coord<f64>,
    pub edge: &'a NetEdge,
}

/// Subgraph of the street graph that is used by at least one building.
///
/// Owns its own graph; nothing refers back into the street graph it was
/// reduced from except the id maps used while accumulating loads.
#[derive(Debug, Clone)]
pub struct HeatNetwork {
    pub graph: UnGraph<NetNode, NetEdge>,
    source: NodeIndex,
    node_map: HashMap<NodeIndex, NodeIndex>,
    edge_map: HashMap<EdgeIndex, EdgeIndex>,
    coord_lookup: HashMap<CoordKey, NodeIndex>,
}

impl HeatNetwork {
    /// Creates an empty network rooted at the source node of `streets`
    pub(crate) fn new(streets: &StreetGraph, source: NodeIndex) -> Result<Self, Error> {
        let coord = streets.node_coord(source).ok_or(Error::NoSource)?;
        let mut network = Self {
            graph: UnGraph::default(),
            source: NodeIndex::end(),
            node_map: HashMap::new(),
            edge_map: HashMap::new(),
            coord_lookup: HashMap::new(),
        };
        network.source = network.copy_node(source, coord);
        Ok(network)
    }

    fn copy_node(&mut self, street_node: NodeIndex, coord: Coord<f64>) -> NodeIndex {
        if let Some(&node) = self.node_map.get(&street_node) {
            return node;
        }
        let node = self.graph.add_node(NetNode {
            geometry: Point::from(coord),
        });
        self.node_map.insert(street_node, node);
        self.coord_lookup.insert(CoordKey::from(coord), node);
        node
    }

    /// Adds one building's load to a street edge, copying the edge into the
    /// network on first use.
    pub(crate) fn add_load(
        &mut self,
        streets: &StreetGraph,
        street_edge: EdgeIndex,
        power: f64,
    ) -> Result<(), Error> {
        let edge = match self.edge_map.get(&street_edge) {
            Some(&edge) => edge,
            None => {
                let (a, b) = streets
                    .graph
                    .edge_endpoints(street_edge)
                    .ok_or(Error::InvalidEdgeIndex(street_edge))?;
                let weight = streets
                    .edge(street_edge)
                    .ok_or(Error::InvalidEdgeIndex(street_edge))?;
                let (from, to) = match (streets.node_coord(a), streets.node_coord(b)) {
                    (Some(from), Some(to)) => (from, to),
                    _ => return Err(Error::InvalidEdgeIndex(street_edge)),
                };
                let u = self.copy_node(a, from);
                let v = self.copy_node(b, to);
                let edge = self.graph.add_edge(
                    u,
                    v,
                    NetEdge {
                        kind: weight.kind,
                        length: weight.length,
                        street_id: weight.street_id,
                        n_building: 0,
                        power: 0.0,
                        sizing: None,
                    },
                );
                self.edge_map.insert(street_edge, edge);
                edge
            }
        };

        let weight = &mut self.graph[edge];
        weight.power += power;
        weight.n_building += 1;
        Ok(())
    }

    pub fn source(&self) -> Coord<f64> {
        self.graph[self.source].geometry.into()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_dimensioned(&self) -> bool {
        self.graph.edge_weights().all(|e| e.sizing.is_some())
    }

    pub fn total_length(&self) -> f64 {
        self.graph.edge_weights().map(|e| e.length).sum()
    }

    /// All edges with their endpoint coordinates
    pub fn edges(&self) -> impl Iterator<Item = EdgeRecord<'_>> {
        self.graph.edge_indices().filter_map(|edge| {
            let (a, b) = self.graph.edge_endpoints(edge)?;
            Some(EdgeRecord {
                from: self.graph[a].geometry.into(),
                to: self.graph[b].geometry.into(),
                edge: &self.graph[edge],
            })
        })
    }

    /// Edge joining the nodes at two coordinates, in either direction
    pub fn edge_between(&self, a: Coord<f64>, b: Coord<f64>) -> Option<&NetEdge> {
        let u = self.coord_lookup.get(&CoordKey::from(a))?;
        let v = self.coord_lookup.get(&CoordKey::from(b))?;
        let edge = self.graph.find_edge(*u, *v)?;
        self.graph.edge_weight(edge)
    }
}
