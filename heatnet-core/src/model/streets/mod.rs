//! Street network model

pub mod components;
pub mod network;

pub use components::{EdgeKind, StreetEdge, StreetNode};
pub use network::{IndexedSegment, StreetGraph};
pub(crate) use network::CoordKey;
