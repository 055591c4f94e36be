//! Street network components - nodes and edges

use geo::{Coord, Point};
use serde::{Deserialize, Serialize};

use crate::StreetId;

/// Role of an edge in the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    /// Piece of a street line between two consecutive vertices
    StreetSegment,
    /// Service line between a building and its connection point
    BuildingConnection,
    /// Line between a heat source and its connection point
    SourceConnection,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StreetSegment => "street-segment",
            Self::BuildingConnection => "building-connection",
            Self::SourceConnection => "source-connection",
        }
    }
}

/// Street graph node
#[derive(Debug, Clone)]
pub struct StreetNode {
    /// Node coordinates in the projected reference system
    pub geometry: Point<f64>,
}

/// Street graph edge
#[derive(Debug, Clone)]
pub struct StreetEdge {
    pub kind: EdgeKind,
    /// Planar length of the straight segment between the endpoints
    pub length: f64,
    /// Street feature this segment was cut from
    pub street_id: Option<StreetId>,
}

impl StreetEdge {
    pub fn street_segment(from: Coord<f64>, to: Coord<f64>, street_id: Option<StreetId>) -> Self {
        Self {
            kind: EdgeKind::StreetSegment,
            length: segment_length(from, to),
            street_id,
        }
    }

    pub fn connection(kind: EdgeKind, from: Coord<f64>, to: Coord<f64>) -> Self {
        Self {
            kind,
            length: segment_length(from, to),
            street_id: None,
        }
    }

    pub fn is_street(&self) -> bool {
        self.kind == EdgeKind::StreetSegment
    }
}

/// Euclidean length of a straight segment
pub fn segment_length(from: Coord<f64>, to: Coord<f64>) -> f64 {
    (to.x - from.x).hypot(to.y - from.y)
}
