//! Reduction of the street graph to the edges that supply buildings

use fixedbitset::FixedBitSet;
use log::{debug, info, warn};
use petgraph::graph::{EdgeIndex, NodeIndex};
use rayon::prelude::*;

use crate::loading::ConnectionMap;
use crate::model::{Building, HeatNetwork, HeatingZone, StreetGraph};
use crate::routing::dijkstra_tree;
use crate::{BuildingId, Error};

/// Reduced network and the buildings whose load it does not carry
#[derive(Debug, Clone)]
pub struct Reduction {
    pub network: HeatNetwork,
    /// Buildings left out of the network, in table order: buildings without
    /// any path to the source, or outside every zone of an interconnection run
    pub unreachable: Vec<BuildingId>,
}

/// Terminal node of the first source and the nodes connected to it.
///
/// Every other source has to lie in the same connected part of the graph.
fn routing_root(
    streets: &StreetGraph,
    connections: &ConnectionMap,
) -> Result<(NodeIndex, FixedBitSet), Error> {
    let source = connections.sources.first().ok_or(Error::NoSource)?.terminal;
    let component = streets.component(source);

    let disjoint = connections
        .sources
        .iter()
        .filter(|c| !component.contains(c.terminal.index()))
        .count();
    if disjoint > 0 {
        // Every source outside the first one's component adds at least one part
        return Err(Error::MultipleDisjointSourceComponents(disjoint + 1));
    }
    Ok((source, component))
}

fn check_building_connections(
    buildings: &[Building],
    connections: &ConnectionMap,
) -> Result<(), Error> {
    if connections.buildings.len() != buildings.len() {
        return Err(Error::InvalidData(format!(
            "{} building connections for {} buildings",
            connections.buildings.len(),
            buildings.len()
        )));
    }
    Ok(())
}

/// Builds the heat network from the shortest path between the source and
/// every building.
///
/// The first source is the one routed from. All buildings are routed over
/// one shortest-path tree rooted at it; paths are extracted in parallel and
/// merged into the network in building order, so loads add up the same way
/// on every run. Each edge of a path receives the building's power and one
/// building count, regardless of traversal direction.
///
/// Buildings outside the source's connected component are reported as
/// unreachable instead of failing the run.
///
/// # Errors
///
/// Fails if there is no source, if sources lie in different connected parts
/// of the graph, or if `connections` does not match `buildings`.
pub fn reduce_network(
    streets: &StreetGraph,
    buildings: &[Building],
    connections: &ConnectionMap,
) -> Result<Reduction, Error> {
    check_building_connections(buildings, connections)?;
    let (source, component) = routing_root(streets, connections)?;
    if connections.sources.len() > 1 {
        warn!(
            "{} sources given, routing from the first one",
            connections.sources.len()
        );
    }

    let tree = dijkstra_tree(streets, source, None);
    debug!("Shortest path tree reaches {} nodes", tree.reached_count());

    let paths: Vec<Option<Vec<EdgeIndex>>> = connections
        .buildings
        .par_iter()
        .map(|connection| {
            if !component.contains(connection.terminal.index()) {
                return None;
            }
            tree.path_to(connection.terminal).map(|path| path.edges)
        })
        .collect();

    let mut network = HeatNetwork::new(streets, source)?;
    let mut unreachable = Vec::new();

    for (building_id, (building, path)) in buildings.iter().zip(paths).enumerate() {
        match path {
            Some(edges) => {
                for edge in edges {
                    network.add_load(streets, edge, building.power)?;
                }
            }
            None => {
                warn!(
                    "No connection for building {building_id} at {:?}",
                    building.location
                );
                unreachable.push(building_id);
            }
        }
    }

    info!(
        "Reduced network has {} edges, {} of {} buildings unreachable",
        network.edge_count(),
        unreachable.len(),
        buildings.len()
    );

    Ok(Reduction {
        network,
        unreachable,
    })
}

/// Builds the interconnection between the primary source and the heat
/// centres of several heating zones.
///
/// The first source is the primary one. Every building inside a zone adds its
/// power and one building count to each edge of the shortest path from the
/// primary source to that zone's heat centre. Zones are processed in order and
/// a building inside several zones counts for each of them. Buildings outside
/// every zone are not carried and are listed in `unreachable`.
///
/// # Errors
///
/// Fails if there is no source, if sources lie in different connected parts
/// of the graph, if a zone names a source row that does not exist, or if
/// `connections` does not match `buildings`.
pub fn reduce_interconnection(
    streets: &StreetGraph,
    buildings: &[Building],
    connections: &ConnectionMap,
    zones: &[HeatingZone],
) -> Result<Reduction, Error> {
    check_building_connections(buildings, connections)?;
    let (source, _) = routing_root(streets, connections)?;

    let centres = zones
        .iter()
        .enumerate()
        .map(|(zone_id, zone)| {
            connections
                .sources
                .get(zone.heat_centre)
                .map(|c| c.terminal)
                .ok_or_else(|| {
                    Error::InvalidData(format!(
                        "zone {zone_id} refers to missing source {}",
                        zone.heat_centre
                    ))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let tree = dijkstra_tree(streets, source, None);

    // Membership tests are independent per zone; the merge below stays in order
    let members: Vec<Vec<BuildingId>> = zones
        .par_iter()
        .map(|zone| {
            buildings
                .iter()
                .enumerate()
                .filter(|(_, building)| zone.contains(building))
                .map(|(id, _)| id)
                .collect()
        })
        .collect();

    let mut network = HeatNetwork::new(streets, source)?;
    let mut in_zone = FixedBitSet::with_capacity(buildings.len());

    for (zone_id, (centre, zone_buildings)) in centres.into_iter().zip(members).enumerate() {
        // Sources share one component, so the heat centre is always reached
        let path = tree.path_to(centre).ok_or_else(|| {
            Error::InvalidData(format!("no path to heat centre of zone {zone_id}"))
        })?;
        debug!(
            "Zone {zone_id}: {} buildings over {:.1} m",
            zone_buildings.len(),
            path.length
        );
        for building_id in zone_buildings {
            in_zone.insert(building_id);
            for &edge in &path.edges {
                network.add_load(streets, edge, buildings[building_id].power)?;
            }
        }
    }

    let unreachable: Vec<BuildingId> = in_zone.zeroes().collect();
    if !unreachable.is_empty() {
        warn!("{} buildings lie outside every heating zone", unreachable.len());
    }
    info!(
        "Interconnection of {} heating zones has {} edges",
        zones.len(),
        network.edge_count()
    );

    Ok(Reduction {
        network,
        unreachable,
    })
}

#[cfg(test)]
mod tests {
    use geo::{Point, Polygon, coord, line_string, polygon};

    use super::*;
    use crate::loading::{connect_to_streets, create_street_graph};
    use crate::model::Source;

    #[test]
    fn load_is_summed_per_edge() {
        //        b1      b2
        //        |       |
        // src ---+-------+
        let lines = vec![line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 20.0, y: 0.0)]];
        let mut streets = create_street_graph(&lines).unwrap();
        let buildings = vec![
            Building::new(Point::new(10.0, 5.0), 30.0),
            Building::new(Point::new(20.0, 5.0), 12.0),
        ];
        let sources = vec![Source::new(Point::new(0.0, -5.0))];
        let connections = connect_to_streets(&mut streets, &buildings, &sources, false).unwrap();

        let reduction = reduce_network(&streets, &buildings, &connections).unwrap();
        let network = &reduction.network;

        let trunk = network
            .edge_between(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 0.0 })
            .unwrap();
        assert_eq!(trunk.n_building, 2);
        assert_eq!(trunk.power, 42.0);

        let branch = network
            .edge_between(coord! { x: 20.0, y: 0.0 }, coord! { x: 10.0, y: 0.0 })
            .unwrap();
        assert_eq!(branch.n_building, 1);
        assert_eq!(branch.power, 12.0);
        assert!(reduction.unreachable.is_empty());
    }

    #[test]
    fn unused_streets_are_dropped() {
        let lines = vec![
            line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)],
            line_string![(x: 0.0, y: 0.0), (x: -10.0, y: 0.0)],
        ];
        let mut streets = create_street_graph(&lines).unwrap();
        let buildings = vec![Building::new(Point::new(10.0, 1.0), 5.0)];
        let sources = vec![Source::new(Point::new(0.0, 1.0))];
        let connections = connect_to_streets(&mut streets, &buildings, &sources, false).unwrap();

        let reduction = reduce_network(&streets, &buildings, &connections).unwrap();

        assert_eq!(reduction.network.edge_count(), 1);
        assert!(
            reduction
                .network
                .edge_between(coord! { x: 0.0, y: 0.0 }, coord! { x: -10.0, y: 0.0 })
                .is_none()
        );
    }

    #[test]
    fn missing_source_is_fatal() {
        let lines = vec![line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)]];
        let mut streets = create_street_graph(&lines).unwrap();
        let buildings = vec![Building::new(Point::new(5.0, 1.0), 5.0)];
        let connections = connect_to_streets(&mut streets, &buildings, &[], false).unwrap();

        assert!(matches!(
            reduce_network(&streets, &buildings, &connections),
            Err(Error::NoSource)
        ));
    }

    #[test]
    fn sources_on_separate_networks_are_fatal() {
        let lines = vec![
            line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)],
            line_string![(x: 100.0, y: 0.0), (x: 110.0, y: 0.0)],
        ];
        let mut streets = create_street_graph(&lines).unwrap();
        let buildings = vec![Building::new(Point::new(5.0, 1.0), 5.0)];
        let sources = vec![
            Source::new(Point::new(0.0, -1.0)),
            Source::new(Point::new(105.0, -1.0)),
        ];
        let connections = connect_to_streets(&mut streets, &buildings, &sources, false).unwrap();

        assert!(matches!(
            reduce_network(&streets, &buildings, &connections),
            Err(Error::MultipleDisjointSourceComponents(2))
        ));
    }

    fn square(x: f64, y: f64, side: f64) -> Polygon<f64> {
        polygon![
            (x: x, y: y),
            (x: x + side, y: y),
            (x: x + side, y: y + side),
            (x: x, y: y + side),
        ]
    }

    #[test]
    fn zone_load_runs_to_its_heat_centre() {
        // src ----- A ----- B, zone buildings north of the street
        let lines = vec![line_string![(x: 0.0, y: 0.0), (x: 50.0, y: 0.0), (x: 100.0, y: 0.0)]];
        let mut streets = create_street_graph(&lines).unwrap();
        let buildings = vec![
            Building::new(Point::new(45.0, 20.0), 10.0),
            Building::new(Point::new(55.0, 20.0), 20.0),
            Building::new(Point::new(100.0, 20.0), 5.0),
            Building::new(Point::new(200.0, 200.0), 7.0),
        ];
        let sources = vec![
            Source::new(Point::new(0.0, -5.0)),
            Source::new(Point::new(50.0, -5.0)),
            Source::new(Point::new(100.0, -5.0)),
        ];
        let zones = vec![
            HeatingZone::new(square(40.0, 10.0, 20.0), 1),
            HeatingZone::new(square(90.0, 10.0, 20.0), 2),
        ];
        let connections = connect_to_streets(&mut streets, &buildings, &sources, false).unwrap();

        let reduction =
            reduce_interconnection(&streets, &buildings, &connections, &zones).unwrap();
        let network = &reduction.network;

        for (from, to) in [(0.0, 45.0), (45.0, 50.0)] {
            let edge = network
                .edge_between(coord! { x: from, y: 0.0 }, coord! { x: to, y: 0.0 })
                .unwrap();
            assert_eq!((edge.n_building, edge.power), (3, 35.0));
        }
        for (from, to) in [(50.0, 55.0), (55.0, 100.0)] {
            let edge = network
                .edge_between(coord! { x: from, y: 0.0 }, coord! { x: to, y: 0.0 })
                .unwrap();
            assert_eq!((edge.n_building, edge.power), (1, 5.0));
        }
        assert_eq!(network.edge_count(), 4);
        assert_eq!(network.total_length(), 100.0);
        assert_eq!(reduction.unreachable, vec![3]);
    }

    #[test]
    fn zone_without_its_source_is_rejected() {
        let lines = vec![line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)]];
        let mut streets = create_street_graph(&lines).unwrap();
        let buildings = vec![Building::new(Point::new(5.0, 1.0), 5.0)];
        let sources = vec![Source::new(Point::new(0.0, -1.0))];
        let zones = vec![HeatingZone::new(square(0.0, 0.0, 10.0), 4)];
        let connections = connect_to_streets(&mut streets, &buildings, &sources, false).unwrap();

        assert!(matches!(
            reduce_interconnection(&streets, &buildings, &connections, &zones),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn mismatched_connection_table_is_rejected() {
        let streets = StreetGraph::new();
        let buildings = vec![Building::new(Point::new(5.0, 1.0), 5.0)];

        assert!(matches!(
            reduce_network(&streets, &buildings, &ConnectionMap::default()),
            Err(Error::InvalidData(_))
        ));
    }
}
