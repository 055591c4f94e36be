use geo::{LineString, Point, Polygon};
use heatnet_core::prelude::*;
use pyo3::prelude::*;
use pyo3::types::PyDict;
#[cfg(feature = "stubgen")]
use pyo3_stub_gen::derive::{gen_stub_pyclass, gen_stub_pyfunction, gen_stub_pymethods};
use wkt::{ToWkt, TryFromWkt};

use crate::catalog::PyPipeCatalog;

/// Errors caused by the caller's data are raised as ValueError, everything
/// else as RuntimeError
fn planning_error(error: Error) -> PyErr {
    match error {
        Error::InvalidData(_)
        | Error::InvalidTemperatures { .. }
        | Error::NoSource
        | Error::NoStreetsFound
        | Error::MultipleDisjointSourceComponents(_)
        | Error::EmptyPipeCatalog
        | Error::MalformedPipeSpec(_) => PyErr::new::<pyo3::exceptions::PyValueError, _>(
            format!("Failed to plan heat network: {error}"),
        ),
        _ => PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
            "Failed to plan heat network: {error}"
        )),
    }
}

/// NetworkPlan
///
/// A dimensioned district heating network.
///
/// Holds the street segments used to supply the buildings, each with the
/// number of buildings behind it, their summed power and the selected pipe,
/// together with the buildings that could not be reached from the source.
#[cfg_attr(feature = "stubgen", gen_stub_pyclass)]
#[pyclass(name = "NetworkPlan")]
pub struct PyNetworkPlan {
    plan: NetworkPlan,
}

#[cfg_attr(feature = "stubgen", gen_stub_pymethods)]
#[pymethods]
impl PyNetworkPlan {
    pub fn edge_count(&self) -> usize {
        self.plan.network.edge_count()
    }

    pub fn total_length(&self) -> f64 {
        self.plan.network.total_length()
    }

    /// Positions of the buildings whose load the network does not carry:
    /// no path to the source, or outside every heating zone
    pub fn unreachable_buildings(&self) -> Vec<usize> {
        self.plan.unreachable.clone()
    }

    /// Connection points of the buildings, in building order
    pub fn building_connections(&self) -> Vec<(f64, f64)> {
        self.plan
            .connections
            .buildings
            .iter()
            .map(|c| (c.point.x, c.point.y))
            .collect()
    }

    /// Network edges as a GeoJSON FeatureCollection string
    pub fn to_geojson(&self) -> PyResult<String> {
        self.plan.network.to_geojson_string().map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                "Failed to export network: {e}"
            ))
        })
    }

    /// Network edges as WKT LineStrings, in edge order
    pub fn to_wkt(&self) -> Vec<String> {
        self.plan
            .network
            .edges()
            .map(|record| LineString::new(vec![record.from, record.to]).wkt_string())
            .collect()
    }

    /// Summary of the plan as a dictionary
    ///
    /// Keys: ``total_length``, ``total_loss``, ``max_power_glf``, ``glf``,
    /// ``connected_buildings``, ``connected_power`` and ``per_dn``, a list of
    /// ``(dn, length, loss)`` tuples covering every catalog size.
    pub fn summary<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let summary = &self.plan.summary;
        let dict = PyDict::new(py);

        dict.set_item("total_length", summary.total_length)?;
        dict.set_item("total_loss", summary.total_loss)?;
        dict.set_item("max_power_glf", summary.max_power_glf)?;
        dict.set_item("glf", summary.glf)?;
        dict.set_item("connected_buildings", summary.connected_buildings)?;
        dict.set_item("connected_power", summary.connected_power)?;

        let per_dn: Vec<(Dn, f64, f64)> = summary
            .per_dn
            .iter()
            .map(|entry| (entry.dn, entry.length, entry.loss))
            .collect();
        dict.set_item("per_dn", per_dn)?;

        Ok(dict)
    }

    /// Summary of the plan as a JSON string
    pub fn summary_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.plan.summary).map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                "Failed to serialize summary: {e}"
            ))
        })
    }

    fn __repr__(&self) -> String {
        format!(
            "NetworkPlan with {} edges, {:.1} m total length, {} unreachable buildings",
            self.plan.network.edge_count(),
            self.plan.network.total_length(),
            self.plan.unreachable.len()
        )
    }

    fn __str__(&self) -> String {
        self.__repr__()
    }
}

/// Building row: ``(x, y, power)`` or ``(x, y, power, street_id)``
#[derive(FromPyObject)]
pub enum BuildingRow {
    OnStreet(f64, f64, f64, StreetId),
    Plain(f64, f64, f64),
}

impl From<BuildingRow> for Building {
    fn from(row: BuildingRow) -> Self {
        match row {
            BuildingRow::OnStreet(x, y, power, street) => {
                Building::new(Point::new(x, y), power).on_street(street)
            }
            BuildingRow::Plain(x, y, power) => Building::new(Point::new(x, y), power),
        }
    }
}

/// Source row: ``(x, y)`` or ``(x, y, street_id)``
#[derive(FromPyObject)]
pub enum SourceRow {
    OnStreet(f64, f64, StreetId),
    Plain(f64, f64),
}

impl From<SourceRow> for Source {
    fn from(row: SourceRow) -> Self {
        match row {
            SourceRow::OnStreet(x, y, street) => Source::new(Point::new(x, y)).on_street(street),
            SourceRow::Plain(x, y) => Source::new(Point::new(x, y)),
        }
    }
}

#[cfg(feature = "stubgen")]
pyo3_stub_gen::impl_stub_type!(BuildingRow = (f64, f64, f64, usize) | (f64, f64, f64));
#[cfg(feature = "stubgen")]
pyo3_stub_gen::impl_stub_type!(SourceRow = (f64, f64, usize) | (f64, f64));

fn parse_wkt<T>(kind: &str, index: usize, wkt: &str) -> PyResult<T>
where
    T: TryFromWkt<f64>,
    <T as TryFromWkt<f64>>::Error: std::fmt::Display,
{
    T::try_from_wkt_str(wkt).map_err(|e| {
        PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
            "Failed to parse {kind} {index} as WKT: {e}"
        ))
    })
}

struct PlanInput {
    streets: Vec<LineString<f64>>,
    buildings: Vec<Building>,
    sources: Vec<Source>,
    config: NetworkConfig,
}

impl PlanInput {
    fn new(
        streets: &[String],
        buildings: Vec<BuildingRow>,
        sources: Vec<SourceRow>,
        supply_temp: f64,
        return_temp: f64,
        service_lines: bool,
    ) -> PyResult<Self> {
        let streets = streets
            .iter()
            .enumerate()
            .map(|(i, wkt)| parse_wkt::<LineString<f64>>("street", i, wkt))
            .collect::<PyResult<Vec<_>>>()?;

        Ok(Self {
            streets,
            buildings: buildings.into_iter().map(Building::from).collect(),
            sources: sources.into_iter().map(Source::from).collect(),
            config: NetworkConfig::new(supply_temp, return_temp)
                .with_service_lines(service_lines),
        })
    }
}

/// Plan and dimension a district heating network
///
/// Builds a graph from the street geometry, attaches every building and
/// source to its nearest street, keeps the streets on the shortest paths
/// from the source to the buildings and picks a pipe size for each of them.
///
/// Parameters
/// ----------
/// streets : list[str]
///     Street center lines as WKT LineStrings in a projected CRS (meters)
/// buildings : list[tuple]
///     ``(x, y, power)`` of every building, or ``(x, y, power, street_id)``
///     to attach the building to the street at that position in ``streets``
/// sources : list[tuple]
///     ``(x, y)`` or ``(x, y, street_id)`` of the heat sources; routing
///     starts at the first one
/// catalog : PipeCatalog
///     Available pipe sizes
/// supply_temp : float, default=80.0
///     Supply temperature in °C
/// return_temp : float, default=60.0
///     Return temperature in °C
/// service_lines : bool, default=False
///     Include the lines from each building and source to its street
///
/// Returns
/// -------
/// NetworkPlan
///     The dimensioned network
///
/// Raises
/// ------
/// ValueError
///     On malformed geometry, invalid temperatures or building data, a
///     missing source or sources on unconnected street networks
///
/// Notes
/// -----
/// The function releases the GIL during processing to allow other Python
/// threads to continue execution.
#[cfg_attr(feature = "stubgen", gen_stub_pyfunction)]
#[pyfunction(name = "plan_network")]
#[pyo3(signature = (
    streets, buildings, sources, catalog, supply_temp=80.0, return_temp=60.0, service_lines=false
))]
#[allow(clippy::too_many_arguments)]
pub fn py_plan_network(
    py: Python<'_>,
    streets: Vec<String>,
    buildings: Vec<BuildingRow>,
    sources: Vec<SourceRow>,
    catalog: &PyPipeCatalog,
    supply_temp: f64,
    return_temp: f64,
    service_lines: bool,
) -> PyResult<PyNetworkPlan> {
    let input = PlanInput::new(
        &streets,
        buildings,
        sources,
        supply_temp,
        return_temp,
        service_lines,
    )?;

    py.detach(|| {
        let plan = plan_network(
            &input.streets,
            &input.buildings,
            &input.sources,
            &catalog.catalog,
            &input.config,
        )
        .map_err(planning_error)?;
        Ok(PyNetworkPlan { plan })
    })
}

/// Plan and dimension the interconnection of several heating zones
///
/// The first source is the primary one. Every zone is a polygon together with
/// the position of its heat centre in ``sources``. The buildings inside a zone
/// load the shortest path from the primary source to the zone's heat centre;
/// a building inside several zones loads each of those paths.
///
/// Parameters
/// ----------
/// streets : list[str]
///     Street center lines as WKT LineStrings in a projected CRS (meters)
/// buildings : list[tuple]
///     ``(x, y, power)`` or ``(x, y, power, street_id)`` of every building
/// sources : list[tuple]
///     ``(x, y)`` or ``(x, y, street_id)``; the primary source first, then
///     the heat centres
/// zones : list[tuple[str, int]]
///     ``(polygon_wkt, source_index)`` of every heating zone
/// catalog : PipeCatalog
///     Available pipe sizes
/// supply_temp : float, default=80.0
///     Supply temperature in °C
/// return_temp : float, default=60.0
///     Return temperature in °C
/// service_lines : bool, default=False
///     Include the lines from each building and source to its street
///
/// Returns
/// -------
/// NetworkPlan
///     The dimensioned interconnection; buildings outside every zone are
///     listed by ``unreachable_buildings``
///
/// Raises
/// ------
/// ValueError
///     On malformed geometry, invalid temperatures or building data, a zone
///     naming a missing source, or sources on unconnected street networks
#[cfg_attr(feature = "stubgen", gen_stub_pyfunction)]
#[pyfunction(name = "plan_interconnection")]
#[pyo3(signature = (
    streets, buildings, sources, zones, catalog,
    supply_temp=80.0, return_temp=60.0, service_lines=false
))]
#[allow(clippy::too_many_arguments)]
pub fn py_plan_interconnection(
    py: Python<'_>,
    streets: Vec<String>,
    buildings: Vec<BuildingRow>,
    sources: Vec<SourceRow>,
    zones: Vec<(String, SourceId)>,
    catalog: &PyPipeCatalog,
    supply_temp: f64,
    return_temp: f64,
    service_lines: bool,
) -> PyResult<PyNetworkPlan> {
    let input = PlanInput::new(
        &streets,
        buildings,
        sources,
        supply_temp,
        return_temp,
        service_lines,
    )?;
    let zones = zones
        .iter()
        .enumerate()
        .map(|(i, (wkt, centre))| {
            parse_wkt::<Polygon<f64>>("zone", i, wkt).map(|area| HeatingZone::new(area, *centre))
        })
        .collect::<PyResult<Vec<_>>>()?;

    py.detach(|| {
        let plan = plan_interconnection(
            &input.streets,
            &input.buildings,
            &input.sources,
            &zones,
            &catalog.catalog,
            &input.config,
        )
        .map_err(planning_error)?;
        Ok(PyNetworkPlan { plan })
    })
}

/// Simultaneity factor for a number of buildings supplied together
#[cfg_attr(feature = "stubgen", gen_stub_pyfunction)]
#[pyfunction(name = "simultaneity_factor")]
pub fn py_simultaneity_factor(n_buildings: u32) -> f64 {
    simultaneity_factor(n_buildings)
}
