//! Key figures of a dimensioned network

use serde::Serialize;

use super::dimension::simultaneity_factor;
use crate::catalog::PipeCatalog;
use crate::model::{Building, HeatNetwork};
use crate::{BuildingId, Dn};

/// Trench length and heat loss of one pipe size
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DnSummary {
    pub dn: Dn,
    pub length: f64,
    pub loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkSummary {
    /// One entry per catalog size in catalog order, unused sizes included
    pub per_dn: Vec<DnSummary>,
    pub total_length: f64,
    pub total_loss: f64,
    /// Largest simultaneity-adjusted power on any edge
    pub max_power_glf: f64,
    /// Simultaneity factor over all connected buildings
    pub glf: f64,
    pub connected_buildings: u32,
    /// Summed nominal power of the connected buildings
    pub connected_power: f64,
}

/// Summarizes a dimensioned network. Edges that were never dimensioned only
/// count towards the total length. `unreachable` is expected in ascending
/// order, as produced by the reduction.
pub fn summarize_network(
    network: &HeatNetwork,
    catalog: &PipeCatalog,
    buildings: &[Building],
    unreachable: &[BuildingId],
) -> NetworkSummary {
    let mut per_dn: Vec<DnSummary> = catalog
        .sizes()
        .map(|dn| DnSummary {
            dn,
            length: 0.0,
            loss: 0.0,
        })
        .collect();
    let mut total_length = 0.0;
    let mut max_power_glf: f64 = 0.0;

    for edge in network.graph.edge_weights() {
        total_length += edge.length;
        let Some(sizing) = edge.sizing else {
            continue;
        };
        max_power_glf = max_power_glf.max(sizing.power_glf);
        if let Some(entry) = per_dn.iter_mut().find(|entry| entry.dn == sizing.dn) {
            entry.length += edge.length;
            entry.loss += sizing.loss;
        }
    }

    let total_loss = per_dn.iter().map(|entry| entry.loss).sum();

    let mut connected_buildings = 0u32;
    let mut connected_power = 0.0;
    for (id, building) in buildings.iter().enumerate() {
        if unreachable.binary_search(&id).is_err() {
            connected_buildings += 1;
            connected_power += building.power;
        }
    }

    NetworkSummary {
        per_dn,
        total_length,
        total_loss,
        max_power_glf,
        glf: simultaneity_factor(connected_buildings),
        connected_buildings,
        connected_power,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use geo::{Point, line_string};

    use super::*;
    use crate::algo::{dimension_network, reduce_network};
    use crate::catalog::PipeSpec;
    use crate::loading::{connect_to_streets, create_street_graph};
    use crate::model::Source;

    fn catalog() -> PipeCatalog {
        PipeCatalog::new(vec![
            PipeSpec::new(20, 21.7, 0.13, 0.8),
            PipeSpec::new(50, 54.5, 0.20, 1.5),
            PipeSpec::new(100, 107.1, 0.27, 2.1),
        ])
        .unwrap()
    }

    #[test]
    fn unused_sizes_and_unreachable_buildings() {
        let lines = vec![
            line_string![(x: 0.0, y: 0.0), (x: 25.0, y: 0.0)],
            line_string![(x: 500.0, y: 0.0), (x: 510.0, y: 0.0)],
        ];
        let mut streets = create_street_graph(&lines).unwrap();
        let buildings = vec![
            Building::new(Point::new(25.0, 4.0), 8.0),
            Building::new(Point::new(505.0, 4.0), 90.0),
        ];
        let sources = vec![Source::new(Point::new(0.0, -2.0))];
        let connections = connect_to_streets(&mut streets, &buildings, &sources, false).unwrap();
        let mut reduction = reduce_network(&streets, &buildings, &connections).unwrap();
        let catalog = catalog();
        dimension_network(&mut reduction.network, &catalog, 80.0, 60.0).unwrap();

        let summary = summarize_network(
            &reduction.network,
            &catalog,
            &buildings,
            &reduction.unreachable,
        );

        assert_eq!(reduction.unreachable, vec![1]);
        assert_eq!(summary.per_dn.len(), 3);
        assert_relative_eq!(summary.total_length, 25.0);
        let used: Vec<_> = summary.per_dn.iter().filter(|e| e.length > 0.0).collect();
        assert_eq!(used.len(), 1);
        assert_relative_eq!(used[0].length, 25.0);
        assert_relative_eq!(summary.total_loss, used[0].loss);
        assert_eq!(summary.connected_buildings, 1);
        assert_eq!(summary.connected_power, 8.0);
        assert_relative_eq!(summary.glf, simultaneity_factor(1));
        assert_relative_eq!(summary.max_power_glf, 8.0 * simultaneity_factor(1));
    }
}
