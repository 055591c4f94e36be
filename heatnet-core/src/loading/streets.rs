use geo::LineString;
use itertools::Itertools;
use log::{debug, info};

use crate::{Error, model::StreetGraph};

/// Builds the street graph from street line geometries.
///
/// Every vertex becomes a node (shared between lines that meet at identical
/// coordinates) and every pair of consecutive vertices becomes a street
/// segment tagged with the index of its line. Repeated vertices produce
/// zero-length segments, which are kept.
///
/// # Errors
///
/// Returns an error if a coordinate is not finite
pub fn create_street_graph(lines: &[LineString<f64>]) -> Result<StreetGraph, Error> {
    let mut streets = StreetGraph::new();
    let mut duplicates = 0usize;

    for (street_id, line) in lines.iter().enumerate() {
        if let Some(bad) = line.coords().find(|c| !(c.x.is_finite() && c.y.is_finite())) {
            return Err(Error::InvalidData(format!(
                "street {street_id} contains a non-finite coordinate {bad:?}"
            )));
        }

        if let [single] = line.0.as_slice() {
            streets.ensure_node(*single);
            continue;
        }

        for (from, to) in line.coords().copied().tuple_windows() {
            if streets.add_street_segment(from, to, Some(street_id)).is_none() {
                duplicates += 1;
            }
        }
    }

    if duplicates > 0 {
        debug!("Skipped {duplicates} street segments that duplicate an existing segment");
    }

    streets.rebuild_rtree();

    info!(
        "Street graph created with {} nodes and {} segments from {} lines",
        streets.node_count(),
        streets.edge_count(),
        lines.len()
    );

    Ok(streets)
}

#[cfg(test)]
mod tests {
    use geo::{coord, line_string};

    use super::*;

    #[test]
    fn lines_meeting_at_a_vertex_share_the_node() {
        let lines = vec![
            line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 20.0, y: 0.0)],
            line_string![(x: 10.0, y: 0.0), (x: 10.0, y: 10.0)],
        ];
        let streets = create_street_graph(&lines).unwrap();

        assert_eq!(streets.node_count(), 4);
        assert_eq!(streets.edge_count(), 3);
        let junction = streets.node_at(coord! { x: 10.0, y: 0.0 }).unwrap();
        assert_eq!(streets.edges(junction).count(), 3);
    }

    #[test]
    fn segments_carry_length_and_street_id() {
        let lines = vec![line_string![(x: 0.0, y: 0.0), (x: 3.0, y: 4.0)]];
        let streets = create_street_graph(&lines).unwrap();

        let start = streets.node_at(coord! { x: 0.0, y: 0.0 }).unwrap();
        let (_, _, edge) = streets.edges(start).next().unwrap();
        assert_eq!(edge.length, 5.0);
        assert_eq!(edge.street_id, Some(0));
    }

    #[test]
    fn repeated_vertex_yields_zero_length_segment() {
        let lines = vec![line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]];
        let streets = create_street_graph(&lines).unwrap();

        assert_eq!(streets.node_count(), 2);
        assert_eq!(streets.edge_count(), 2);
        let origin = streets.node_at(coord! { x: 0.0, y: 0.0 }).unwrap();
        assert!(streets.edges(origin).any(|(_, _, e)| e.length == 0.0));
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let lines = vec![line_string![(x: 0.0, y: 0.0), (x: f64::NAN, y: 1.0)]];
        assert!(matches!(create_street_graph(&lines), Err(Error::InvalidData(_))));
    }
}
