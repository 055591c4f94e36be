use petgraph::graph::EdgeIndex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Street network contains no segments to connect to")]
    NoStreetsFound,
    #[error("Invalid edge index: {0:?}")]
    InvalidEdgeIndex(EdgeIndex),
    #[error("No heat source available for the network")]
    NoSource,
    #[error("Heat sources lie in {0} disconnected parts of the street network")]
    MultipleDisjointSourceComponents(usize),
    #[error("Pipe catalog is empty")]
    EmptyPipeCatalog,
    #[error("Malformed pipe spec: {0}")]
    MalformedPipeSpec(String),
    #[error("Invalid temperatures: supply {supply} °C, return {ret} °C")]
    InvalidTemperatures { supply: f64, ret: f64 },
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
}
