//! This module is responsible for turning street geometry, buildings and heat
//! sources into a routable graph and running the full planning pipeline.

mod builder;
mod config;
mod connections;
mod streets;

pub use builder::{NetworkPlan, plan_interconnection, plan_network};
pub use config::NetworkConfig;
pub(crate) use config::validate_temperatures;
pub use connections::{
    ClosestPoint, Connection, ConnectionMap, closest_point_on_graph, closest_point_on_street,
    connect_to_streets, insert_connection,
};
pub use streets::create_street_graph;
