//! District heating network planning on top of a street network.
//!
//! The pipeline builds a routable graph from street geometry, snaps buildings
//! and heat sources onto it, keeps only the street segments that the shortest
//! paths from the source to every building actually use, and sizes each of the
//! remaining pipe segments from a discrete pipe catalog.

pub mod algo;
pub mod catalog;
mod error;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;

pub use error::Error;

pub use algo::{
    NetworkSummary, Reduction, dimension_network, reduce_interconnection, reduce_network,
    simultaneity_factor, summarize_network,
};
pub use catalog::{PipeCatalog, PipeSpec};
pub use loading::{
    ConnectionMap, NetworkConfig, NetworkPlan, create_street_graph, plan_interconnection,
    plan_network,
};
pub use model::{Building, HeatNetwork, HeatingZone, Source, StreetGraph};

/// Position of a building in the input building table
pub type BuildingId = usize;
/// Position of a heat source in the input source table
pub type SourceId = usize;
/// Position of a street feature in the input street geometry
pub type StreetId = usize;
/// Nominal pipe size
pub type Dn = u32;
