use pyo3::prelude::*;
#[cfg(feature = "stubgen")]
use pyo3_stub_gen::define_stub_info_gatherer;

use catalog::PyPipeCatalog;
use network::{
    PyNetworkPlan, py_plan_interconnection, py_plan_network, py_simultaneity_factor,
};

pub mod catalog;
pub mod network;

/// A Python module implemented in Rust.
#[pymodule]
fn heatnet(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();

    m.add_class::<PyPipeCatalog>()?;

    m.add_class::<PyNetworkPlan>()?;
    m.add_function(wrap_pyfunction!(py_plan_network, m)?)?;
    m.add_function(wrap_pyfunction!(py_plan_interconnection, m)?)?;
    m.add_function(wrap_pyfunction!(py_simultaneity_factor, m)?)?;
    Ok(())
}

#[cfg(feature = "stubgen")]
define_stub_info_gatherer!(stub_info);
