use geo::LineString;
use log::info;

use super::config::NetworkConfig;
use super::connections::{ConnectionMap, connect_to_streets};
use super::streets::create_street_graph;
use crate::algo::{
    NetworkSummary, Reduction, dimension_network, reduce_interconnection, reduce_network,
    summarize_network,
};
use crate::catalog::PipeCatalog;
use crate::model::{Building, HeatNetwork, HeatingZone, Source, StreetGraph};
use crate::{BuildingId, Error};

/// Result of a planning run
#[derive(Debug, Clone)]
pub struct NetworkPlan {
    /// Dimensioned heat network
    pub network: HeatNetwork,
    /// Buildings whose load the network does not carry
    pub unreachable: Vec<BuildingId>,
    /// Where each building and source was attached to the streets
    pub connections: ConnectionMap,
    pub summary: NetworkSummary,
}

/// Plans and dimensions a heat network.
///
/// Runs the whole pipeline: street graph construction, connection of
/// buildings and sources, reduction to the used streets, dimensioning and
/// summary.
///
/// # Errors
///
/// Returns an error on invalid configuration or input data, a missing or
/// ambiguous source, or an empty street network. Unreachable buildings are
/// reported in the plan instead.
pub fn plan_network(
    streets: &[LineString<f64>],
    buildings: &[Building],
    sources: &[Source],
    catalog: &PipeCatalog,
    config: &NetworkConfig,
) -> Result<NetworkPlan, Error> {
    run_pipeline(streets, buildings, sources, catalog, config, |graph, connections| {
        info!("Routing buildings to the source");
        reduce_network(graph, buildings, connections)
    })
}

/// Plans and dimensions the interconnection between the primary source and
/// the heat centres of several heating zones.
///
/// The first source is the primary one; each zone names the source row of its
/// heat centre. Each zone's buildings load the shortest path from the primary
/// source to that centre. Buildings outside every zone are reported in
/// `unreachable`.
///
/// # Errors
///
/// Same as [`plan_network`], and a zone naming a source row that does not
/// exist is `InvalidData`.
pub fn plan_interconnection(
    streets: &[LineString<f64>],
    buildings: &[Building],
    sources: &[Source],
    zones: &[HeatingZone],
    catalog: &PipeCatalog,
    config: &NetworkConfig,
) -> Result<NetworkPlan, Error> {
    run_pipeline(streets, buildings, sources, catalog, config, |graph, connections| {
        info!("Routing {} heating zones to the primary source", zones.len());
        reduce_interconnection(graph, buildings, connections, zones)
    })
}

fn run_pipeline<F>(
    streets: &[LineString<f64>],
    buildings: &[Building],
    sources: &[Source],
    catalog: &PipeCatalog,
    config: &NetworkConfig,
    reduce: F,
) -> Result<NetworkPlan, Error>
where
    F: FnOnce(&StreetGraph, &ConnectionMap) -> Result<Reduction, Error>,
{
    config.validate()?;
    if sources.is_empty() {
        return Err(Error::NoSource);
    }

    info!("Building street graph from {} street lines", streets.len());
    let mut graph = create_street_graph(streets)?;

    info!(
        "Connecting {} buildings and {} sources",
        buildings.len(),
        sources.len()
    );
    let connections = connect_to_streets(&mut graph, buildings, sources, config.service_lines)?;

    let reduction = reduce(&graph, &connections)?;
    // The street graph is no longer needed once the network is reduced
    drop(graph);

    let mut network = reduction.network;
    dimension_network(&mut network, catalog, config.supply_temp, config.return_temp)?;

    let summary = summarize_network(&network, catalog, buildings, &reduction.unreachable);
    info!(
        "Heat network planned: {:.0} m of pipe, {:.1} annual heat loss, {} buildings connected",
        summary.total_length, summary.total_loss, summary.connected_buildings
    );

    Ok(NetworkPlan {
        network,
        unreachable: reduction.unreachable,
        connections,
        summary,
    })
}
