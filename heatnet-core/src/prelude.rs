// Re-export key components
pub use crate::algo::{
    NetworkSummary, Reduction, dimension_network, reduce_interconnection, reduce_network,
    simultaneity_factor, summarize_network,
};
pub use crate::catalog::{PipeCatalog, PipeSpec};
pub use crate::loading::{
    Connection, ConnectionMap, NetworkConfig, NetworkPlan, closest_point_on_graph,
    connect_to_streets, create_street_graph, insert_connection, plan_interconnection,
    plan_network,
};
pub use crate::model::{
    Building, EdgeKind, HeatNetwork, HeatingZone, NetEdge, PipeSizing, Source, StreetEdge,
    StreetGraph,
};
pub use crate::routing::shortest_path;

// Core identifiers
pub use crate::BuildingId;
pub use crate::Dn;
pub use crate::Error;
pub use crate::SourceId;
pub use crate::StreetId;
