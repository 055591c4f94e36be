use heatnet_core::prelude::*;
use pyo3::prelude::*;
#[cfg(feature = "stubgen")]
use pyo3_stub_gen::derive::{gen_stub_pyclass, gen_stub_pymethods};

/// PipeCatalog
///
/// The pipe sizes available for dimensioning, ordered by inner diameter.
///
/// Each entry is ``(dn, inner_diameter_mm, u_value, max_velocity)``. The
/// catalog is checked on creation: it must not be empty, diameters and
/// velocity limits must be positive, and a larger diameter must come with a
/// larger nominal size.
///
/// Example:
///
/// .. code-block:: python
///
///     catalog = PipeCatalog.from_csv("pipe_data.csv")
///     catalog = PipeCatalog([(20, 21.7, 0.13, 0.8), (25, 28.5, 0.15, 1.0)])
#[cfg_attr(feature = "stubgen", gen_stub_pyclass)]
#[pyclass(name = "PipeCatalog")]
pub struct PyPipeCatalog {
    pub(crate) catalog: PipeCatalog,
}

#[cfg_attr(feature = "stubgen", gen_stub_pymethods)]
#[pymethods]
impl PyPipeCatalog {
    #[new]
    pub fn new(rows: Vec<(Dn, f64, f64, f64)>) -> PyResult<Self> {
        let specs = rows
            .into_iter()
            .map(|(dn, di, u_value, v_max)| PipeSpec::new(dn, di, u_value, v_max))
            .collect();
        let catalog = PipeCatalog::new(specs).map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Invalid pipe catalog: {e}"))
        })?;
        Ok(Self { catalog })
    }

    /// Read a catalog from a CSV file with the columns ``DN,di,U-Value,v_max``
    #[staticmethod]
    pub fn from_csv(path: &str) -> PyResult<Self> {
        let catalog = PipeCatalog::from_csv_path(path).map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
                "Failed to read pipe catalog from {path}: {e}"
            ))
        })?;
        Ok(Self { catalog })
    }

    /// Nominal sizes in catalog order
    pub fn sizes(&self) -> Vec<Dn> {
        self.catalog.sizes().collect()
    }

    fn __len__(&self) -> usize {
        self.catalog.len()
    }

    fn __repr__(&self) -> String {
        let sizes = self.sizes();
        match (sizes.first(), sizes.last()) {
            (Some(first), Some(last)) => format!(
                "PipeCatalog with {} sizes from DN{first} to DN{last}",
                sizes.len()
            ),
            _ => "PipeCatalog()".to_string(),
        }
    }
}
