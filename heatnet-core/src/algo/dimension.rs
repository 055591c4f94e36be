//! Pipe dimensioning: simultaneity, volume flow and pipe size selection

use log::{info, warn};

use crate::catalog::PipeCatalog;
use crate::loading::validate_temperatures;
use crate::model::{HeatNetwork, PipeSizing};
use crate::{Dn, Error};

// Simultaneity factor curve GLF(n) = a + b / (1 + (n / c)^d)
const GLF_A: f64 = 0.4497;
const GLF_B: f64 = 0.5512;
const GLF_C: f64 = 53.8483;
const GLF_D: f64 = 1.7627;

/// Soil temperature around buried pipes in °C
const GROUND_TEMP: f64 = 10.0;
const HOURS_PER_YEAR: f64 = 8760.0;
/// Relative slack when comparing a velocity against a pipe's limit
const VELOCITY_TOLERANCE: f64 = 1e-9;
/// Velocity in m/s the fallback selection aims for
const FALLBACK_VELOCITY: f64 = 1.0;

// Water properties from 0 to 100 °C in steps of 10 K
const TABLE_TEMPS: [f64; 11] = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0];
/// Density in kg/l
const TABLE_DENSITY: [f64; 11] = [
    0.99984, 0.9997, 0.99821, 0.99565, 0.99222, 0.98803, 0.9832, 0.97778, 0.97182, 0.96535, 0.9584,
];
/// Specific heat capacity in kJ/(kg·K)
const TABLE_HEAT_CAPACITY: [f64; 11] = [
    4.2176, 4.1921, 4.1818, 4.1784, 4.1785, 4.1806, 4.1843, 4.1895, 4.1963, 4.205, 4.2159,
];

/// Simultaneity factor for `n` buildings.
///
/// Decreases from `a + b` at zero buildings towards `a` for large networks.
pub fn simultaneity_factor(n: u32) -> f64 {
    GLF_A + GLF_B / (1.0 + (f64::from(n) / GLF_C).powf(GLF_D))
}

/// Density and specific heat capacity of water
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterProperties {
    pub density: f64,
    pub heat_capacity: f64,
}

/// Water properties at `temp` by linear interpolation of the table.
/// Temperatures outside 0–100 °C take the nearest table value.
pub fn water_properties(temp: f64) -> WaterProperties {
    let last = TABLE_TEMPS.len() - 1;
    if temp <= TABLE_TEMPS[0] {
        return WaterProperties {
            density: TABLE_DENSITY[0],
            heat_capacity: TABLE_HEAT_CAPACITY[0],
        };
    }
    if temp >= TABLE_TEMPS[last] {
        return WaterProperties {
            density: TABLE_DENSITY[last],
            heat_capacity: TABLE_HEAT_CAPACITY[last],
        };
    }

    let upper = TABLE_TEMPS.partition_point(|&t| t <= temp);
    let lower = upper - 1;
    let fraction = (temp - TABLE_TEMPS[lower]) / (TABLE_TEMPS[upper] - TABLE_TEMPS[lower]);
    let lerp = |table: &[f64; 11]| table[lower] + (table[upper] - table[lower]) * fraction;

    WaterProperties {
        density: lerp(&TABLE_DENSITY),
        heat_capacity: lerp(&TABLE_HEAT_CAPACITY),
    }
}

/// Volume flow in l/s for a power in kW.
///
/// Water properties are taken at the supply temperature.
pub fn calculate_volumeflow(power_glf: f64, supply_temp: f64, return_temp: f64) -> f64 {
    let water = water_properties(supply_temp);
    power_glf / (water.density * water.heat_capacity * (supply_temp - return_temp))
}

/// Picks the pipe size for a volume flow and returns `(dn, velocity, loss)`.
///
/// The smallest pipe whose velocity stays within its limit is chosen. If even
/// the largest pipe is too small, the pipe whose velocity is closest to 1 m/s
/// is used instead, exceeding its limit. The heat loss covers supply and return
/// pipe over a year against a ground temperature of 10 °C.
pub fn calculate_diameter_velocity_loss(
    volumeflow: f64,
    supply_temp: f64,
    return_temp: f64,
    length: f64,
    catalog: &PipeCatalog,
) -> (Dn, f64, f64) {
    let specs = catalog.specs();
    let velocities: Vec<f64> = specs.iter().map(|spec| spec.velocity(volumeflow)).collect();

    let fitting = specs
        .iter()
        .zip(&velocities)
        .position(|(spec, &velocity)| {
            velocity <= spec.max_velocity * (1.0 + VELOCITY_TOLERANCE)
        });

    // Catalogs are never empty, so the fallback always finds an entry
    let index = fitting.unwrap_or_else(|| {
        velocities
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (*a - FALLBACK_VELOCITY)
                    .abs()
                    .total_cmp(&(*b - FALLBACK_VELOCITY).abs())
            })
            .map_or(0, |(index, _)| index)
    });

    let spec = &specs[index];
    let mean_temp = (supply_temp + return_temp) / 2.0;
    let loss = HOURS_PER_YEAR
        * 2.0
        * spec.heat_transfer_coefficient
        * (mean_temp - GROUND_TEMP)
        * length
        / 1000.0;

    (spec.dn, velocities[index], loss)
}

/// Dimensioning results for an edge carrying `power` for `n_building`
/// buildings over `length` metres.
pub fn size_edge(
    power: f64,
    n_building: u32,
    length: f64,
    catalog: &PipeCatalog,
    supply_temp: f64,
    return_temp: f64,
) -> PipeSizing {
    let glf = simultaneity_factor(n_building);
    let power_glf = power * glf;
    let volumeflow = calculate_volumeflow(power_glf, supply_temp, return_temp);
    let (dn, velocity, loss) =
        calculate_diameter_velocity_loss(volumeflow, supply_temp, return_temp, length, catalog);

    PipeSizing {
        glf,
        power_glf,
        volumeflow,
        dn,
        velocity,
        loss,
    }
}

/// Dimensions every edge of the network in place.
///
/// # Errors
///
/// Returns an error if the temperatures cannot produce a volume flow.
pub fn dimension_network(
    network: &mut HeatNetwork,
    catalog: &PipeCatalog,
    supply_temp: f64,
    return_temp: f64,
) -> Result<(), Error> {
    validate_temperatures(supply_temp, return_temp)?;
    if !(TABLE_TEMPS[0]..=TABLE_TEMPS[TABLE_TEMPS.len() - 1]).contains(&supply_temp) {
        warn!(
            "Supply temperature {supply_temp} °C is outside the water property table, \
            using the nearest table value"
        );
    }

    let mut over_limit = 0usize;
    for edge in network.graph.edge_weights_mut() {
        let sizing = size_edge(
            edge.power,
            edge.n_building,
            edge.length,
            catalog,
            supply_temp,
            return_temp,
        );
        if catalog
            .get(sizing.dn)
            .is_some_and(|spec| sizing.velocity > spec.max_velocity * (1.0 + VELOCITY_TOLERANCE))
        {
            over_limit += 1;
        }
        edge.sizing = Some(sizing);
    }

    if over_limit > 0 {
        warn!("{over_limit} edges exceed the velocity limit of every catalog pipe");
    }
    info!("Dimensioned {} network edges", network.edge_count());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::catalog::PipeSpec;

    fn catalog() -> PipeCatalog {
        PipeCatalog::new(vec![
            PipeSpec::new(20, 21.7, 0.13, 0.8),
            PipeSpec::new(25, 28.5, 0.15, 1.0),
            PipeSpec::new(32, 37.2, 0.16, 1.2),
            PipeSpec::new(40, 43.1, 0.19, 1.3),
            PipeSpec::new(50, 54.5, 0.20, 1.5),
            PipeSpec::new(65, 70.3, 0.23, 1.7),
            PipeSpec::new(80, 82.5, 0.25, 1.9),
            PipeSpec::new(100, 107.1, 0.27, 2.1),
        ])
        .unwrap()
    }

    #[test]
    fn glf_at_known_points() {
        assert_relative_eq!(simultaneity_factor(0), GLF_A + GLF_B);
        assert_relative_eq!(
            simultaneity_factor(1),
            GLF_A + GLF_B / (1.0 + (1.0 / GLF_C).powf(GLF_D))
        );
        assert!(simultaneity_factor(1_000_000) - GLF_A < 1e-4);
    }

    #[test]
    fn water_table_interpolates_and_clamps() {
        assert_eq!(water_properties(60.0).density, 0.9832);
        assert_relative_eq!(
            water_properties(65.0).density,
            (0.9832 + 0.97778) / 2.0,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            water_properties(65.0).heat_capacity,
            (4.1843 + 4.1895) / 2.0,
            max_relative = 1e-12
        );
        assert_eq!(water_properties(-5.0).density, 0.99984);
        assert_eq!(water_properties(130.0).heat_capacity, 4.2159);
    }

    #[test]
    fn volumeflow_uses_supply_temperature_properties() {
        let flow = calculate_volumeflow(100.0, 80.0, 60.0);
        assert_relative_eq!(flow, 100.0 / (0.97182 * 4.1963 * 20.0));
    }

    #[test]
    fn smallest_fitting_pipe_is_selected() {
        let (dn, velocity, _) = calculate_diameter_velocity_loss(0.5, 80.0, 60.0, 10.0, &catalog());
        // 0.5 l/s: 1.35 m/s in DN 20, 0.78 m/s in DN 25
        assert_eq!(dn, 25);
        assert_relative_eq!(velocity, 0.5 * 1000.0 / (PI * 14.25 * 14.25));
    }

    #[test]
    fn saturating_flow_keeps_the_saturated_pipe() {
        let catalog = catalog();
        for spec in catalog.specs() {
            let flow = spec.max_velocity * spec.cross_section() / 1000.0;
            let (dn, _, _) = calculate_diameter_velocity_loss(flow, 80.0, 60.0, 1.0, &catalog);
            assert_eq!(dn, spec.dn);
        }
    }

    #[test]
    fn oversized_flow_falls_back_to_velocity_nearest_one() {
        let catalog = catalog();
        let (dn, velocity, _) = calculate_diameter_velocity_loss(100.0, 80.0, 60.0, 1.0, &catalog);
        let largest = catalog.specs().last().unwrap();

        assert_eq!(dn, 100);
        assert_relative_eq!(velocity, largest.velocity(100.0));
        assert!(velocity > largest.max_velocity);
    }

    #[test]
    fn fallback_picks_closest_to_one_not_smallest_exceeding() {
        // Both limits are unreachable; 1.6 m/s is closer to 1 than 2.5 m/s
        let catalog = PipeCatalog::new(vec![
            PipeSpec::new(10, 10.0, 0.1, 0.1),
            PipeSpec::new(20, 20.0, 0.1, 0.1),
        ])
        .unwrap();
        let small = catalog.specs()[0];
        let flow = 2.5 * small.cross_section() / 1000.0;

        let (dn, velocity, _) = calculate_diameter_velocity_loss(flow, 80.0, 60.0, 1.0, &catalog);

        assert_eq!(dn, 20);
        assert_relative_eq!(velocity, 2.5 / 4.0, max_relative = 1e-12);
    }

    #[test]
    fn loss_counts_supply_and_return_for_a_year() {
        let (_, _, loss) = calculate_diameter_velocity_loss(0.5, 80.0, 60.0, 100.0, &catalog());
        // DN 25, U = 0.15, mean 70 °C against 10 °C ground
        assert_relative_eq!(loss, 8760.0 * 2.0 * 0.15 * 60.0 * 100.0 / 1000.0);
    }

    #[test]
    fn size_edge_chains_the_formulas() {
        let sizing = size_edge(200.0, 3, 50.0, &catalog(), 80.0, 60.0);

        assert_relative_eq!(sizing.glf, simultaneity_factor(3));
        assert_relative_eq!(sizing.power_glf, 200.0 * sizing.glf);
        assert_relative_eq!(
            sizing.volumeflow,
            calculate_volumeflow(sizing.power_glf, 80.0, 60.0)
        );
    }

    proptest! {
        #[test]
        fn glf_is_bounded_and_decreasing(n in 0u32..100_000) {
            let here = simultaneity_factor(n);
            let next = simultaneity_factor(n + 1);
            prop_assert!(here > GLF_A);
            prop_assert!(here <= GLF_A + GLF_B);
            prop_assert!(next < here);
        }

        #[test]
        fn larger_flow_never_selects_smaller_pipe(
            flow in 0.0f64..40.0,
            extra in 0.0f64..10.0,
        ) {
            let catalog = catalog();
            let (dn_low, _, _) = calculate_diameter_velocity_loss(flow, 80.0, 60.0, 1.0, &catalog);
            let (dn_high, _, _) =
                calculate_diameter_velocity_loss(flow + extra, 80.0, 60.0, 1.0, &catalog);
            prop_assert!(dn_high >= dn_low);
        }
    }
}
