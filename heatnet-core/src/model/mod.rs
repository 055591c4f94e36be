//! Data model for heat network planning
//!
//! Contains the street graph the network is routed on, the buildings and heat
//! sources attached to it and the reduced network that is finally dimensioned.

pub mod consumers;
pub mod network;
pub mod streets;

pub use consumers::{Building, HeatingZone, Source};
pub use network::{HeatNetwork, NetEdge, NetNode, PipeSizing};
pub use streets::{EdgeKind, StreetEdge, StreetGraph, StreetNode};
