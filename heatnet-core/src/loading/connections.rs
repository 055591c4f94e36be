//! Attaching buildings and heat sources to the street graph

use geo::Coord;
use log::{debug, info, trace};
use petgraph::graph::{EdgeIndex, NodeIndex};
use rstar::PointDistance;

use crate::model::{Building, EdgeKind, Source, StreetGraph};
use crate::{Error, StreetId};

/// Nearest point on a street segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPoint {
    pub point: Coord<f64>,
    /// Segment the point lies on
    pub edge: EdgeIndex,
    pub distance: f64,
}

/// Where a building or source was attached to the graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    /// Connection point on the street
    pub point: Coord<f64>,
    /// Graph node at the connection point
    pub connection_node: NodeIndex,
    /// Street segment the point was snapped to. When the point falls inside
    /// it, the segment is split and this id names the half between the
    /// segment's first endpoint and the point.
    pub edge: EdgeIndex,
    /// Node routed to: the connection node, or the location node when service
    /// lines are enabled
    pub terminal: NodeIndex,
}

/// Resolved connections, indexed like the building and source tables
#[derive(Debug, Clone, Default)]
pub struct ConnectionMap {
    pub buildings: Vec<Connection>,
    pub sources: Vec<Connection>,
}

/// Orthogonal projection of `point` onto the segment `a`-`b`, clamped to the
/// segment. Clamped projections return the endpoint itself.
fn project_onto_segment(point: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> Coord<f64> {
    let direction = b - a;
    let length_2 = direction.x * direction.x + direction.y * direction.y;
    if length_2 == 0.0 {
        return a;
    }
    let offset = point - a;
    let t = (offset.x * direction.x + offset.y * direction.y) / length_2;
    if t <= 0.0 {
        a
    } else if t >= 1.0 {
        b
    } else {
        a + direction * t
    }
}

/// Closest point on any street segment of the graph
pub fn closest_point_on_graph(streets: &StreetGraph, point: Coord<f64>) -> Option<ClosestPoint> {
    closest_point_on_street(streets, point, None)
}

/// Closest point on the segments of one street feature, or on all segments
/// when `street_id` is `None`.
///
/// Candidates come from the R-tree in order of distance. Among segments at
/// exactly the same distance the one with the lowest edge index wins, which
/// is the first one a scan over all edges would meet.
pub fn closest_point_on_street(
    streets: &StreetGraph,
    point: Coord<f64>,
    street_id: Option<StreetId>,
) -> Option<ClosestPoint> {
    let query = [point.x, point.y];
    let mut best: Option<(f64, EdgeIndex)> = None;

    let candidates = streets
        .rtree_ref()
        .nearest_neighbor_iter_with_distance_2(&query);
    for (segment, distance_2) in candidates {
        if let Some((best_distance_2, _)) = best
            && distance_2 > best_distance_2
        {
            break;
        }
        let on_street = street_id.is_none()
            || streets.edge(segment.data).and_then(|e| e.street_id) == street_id;
        if !on_street {
            continue;
        }
        match best {
            Some((_, edge)) if edge <= segment.data => {}
            _ => best = Some((distance_2, segment.data)),
        }
    }

    let (_, edge) = best?;
    let line = streets.edge_line(edge)?;
    let closest = project_onto_segment(point, line.start, line.end);
    let distance_2 = rstar::primitives::Line::new(
        [line.start.x, line.start.y],
        [line.end.x, line.end.y],
    )
    .distance_2(&query);

    Some(ClosestPoint {
        point: closest,
        edge,
        distance: distance_2.sqrt(),
    })
}

/// Inserts `point` into street segment `edge` and returns its node.
///
/// If the point coincides with one of the segment's endpoints, that node is
/// returned and the graph is left unchanged. Otherwise the segment is split in
/// two at the point. A node that already sits at the point, such as the end of
/// a side street meeting the segment, becomes the shared node of the halves.
///
/// Splitting hands `edge` to the half that starts at the segment's first
/// endpoint, so inserting the same point again finds it as an endpoint and
/// adds nothing. When `edge` no longer exists, a node already at the point is
/// returned.
///
/// # Errors
///
/// Fails if `edge` does not exist and no node exists at `point`, or if `edge`
/// is not a street segment.
pub fn insert_connection(
    streets: &mut StreetGraph,
    edge: EdgeIndex,
    point: Coord<f64>,
) -> Result<NodeIndex, Error> {
    let Some(line) = streets.edge_line(edge) else {
        trace!("Segment {edge:?} is gone, looking up {point:?}");
        return streets.node_at(point).ok_or(Error::InvalidEdgeIndex(edge));
    };

    if let Some(endpoint) = [line.start, line.end].into_iter().find(|&end| end == point) {
        return streets.node_at(endpoint).ok_or(Error::InvalidEdgeIndex(edge));
    }

    streets.split_edge(edge, point)
}

fn connect_point(
    streets: &mut StreetGraph,
    location: Coord<f64>,
    street_id: Option<StreetId>,
) -> Result<Connection, Error> {
    let closest = closest_point_on_street(streets, location, street_id).ok_or_else(|| {
        match street_id {
            Some(id) => Error::InvalidData(format!("street {id} has no segments to connect to")),
            None => Error::NoStreetsFound,
        }
    })?;
    let connection_node = insert_connection(streets, closest.edge, closest.point)?;
    trace!(
        "Connected {location:?} at {:?}, {:.2} from the street",
        closest.point, closest.distance
    );

    Ok(Connection {
        point: closest.point,
        connection_node,
        edge: closest.edge,
        terminal: connection_node,
    })
}

/// Connects every building, then every source, to its closest street point.
///
/// Connection points are inserted into the street segments first; service
/// lines, when requested, are added after all insertions so that snapping only
/// ever sees street segments.
///
/// # Errors
///
/// Fails on invalid building or source data, a `street_id` without segments,
/// or an empty street graph.
pub fn connect_to_streets(
    streets: &mut StreetGraph,
    buildings: &[Building],
    sources: &[Source],
    service_lines: bool,
) -> Result<ConnectionMap, Error> {
    if streets.street_segment_count() == 0 {
        return Err(Error::NoStreetsFound);
    }

    let nodes_before = streets.node_count();
    let mut map = ConnectionMap {
        buildings: Vec::with_capacity(buildings.len()),
        sources: Vec::with_capacity(sources.len()),
    };

    for building in buildings {
        building.validate()?;
        let connection = connect_point(streets, building.location.into(), building.street_id)?;
        map.buildings.push(connection);
    }
    for source in sources {
        source.validate()?;
        let connection = connect_point(streets, source.location.into(), source.street_id)?;
        map.sources.push(connection);
    }

    debug!(
        "Inserted {} connection nodes into the street graph",
        streets.node_count() - nodes_before
    );

    if service_lines {
        for (connection, building) in map.buildings.iter_mut().zip(buildings) {
            connection.terminal = service_line(
                streets,
                connection,
                building.location.into(),
                EdgeKind::BuildingConnection,
            );
        }
        for (connection, source) in map.sources.iter_mut().zip(sources) {
            connection.terminal = service_line(
                streets,
                connection,
                source.location.into(),
                EdgeKind::SourceConnection,
            );
        }
    }

    info!(
        "Connected {} buildings and {} sources to the street network",
        map.buildings.len(),
        map.sources.len()
    );

    Ok(map)
}

fn service_line(
    streets: &mut StreetGraph,
    connection: &Connection,
    location: Coord<f64>,
    kind: EdgeKind,
) -> NodeIndex {
    if location == connection.point {
        return connection.connection_node;
    }
    streets.add_connection_edge(kind, location, connection.point);
    streets.ensure_node(location)
}
