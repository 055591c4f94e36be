//! Discrete pipe sizes available for dimensioning

use std::{f64::consts::PI, io::Read, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Dn, Error};

/// One pipe size of the catalog
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipeSpec {
    /// Nominal size
    #[serde(rename = "DN")]
    pub dn: Dn,
    /// Inner diameter in mm
    #[serde(rename = "di")]
    pub inner_diameter: f64,
    /// Heat transfer coefficient per metre of pipe in W/(m·K)
    #[serde(rename = "U-Value")]
    pub heat_transfer_coefficient: f64,
    /// Highest admissible flow velocity in m/s
    #[serde(rename = "v_max")]
    pub max_velocity: f64,
}

impl PipeSpec {
    pub fn new(
        dn: Dn,
        inner_diameter: f64,
        heat_transfer_coefficient: f64,
        max_velocity: f64,
    ) -> Self {
        Self {
            dn,
            inner_diameter,
            heat_transfer_coefficient,
            max_velocity,
        }
    }

    /// Flow cross section in mm²
    pub fn cross_section(&self) -> f64 {
        let radius = self.inner_diameter / 2.0;
        PI * radius * radius
    }

    /// Velocity in m/s for a volume flow in l/s.
    ///
    /// l/s over mm² gives dm³/mm², which is 1000 m/s.
    pub fn velocity(&self, volumeflow: f64) -> f64 {
        volumeflow * 1000.0 / self.cross_section()
    }

    fn validate(&self) -> Result<(), Error> {
        let fields = [
            ("inner diameter", self.inner_diameter),
            ("heat transfer coefficient", self.heat_transfer_coefficient),
            ("max velocity", self.max_velocity),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(Error::MalformedPipeSpec(format!(
                    "DN {}: {name} is not a finite number",
                    self.dn
                )));
            }
        }
        if self.inner_diameter <= 0.0 || self.max_velocity <= 0.0 {
            return Err(Error::MalformedPipeSpec(format!(
                "DN {}: inner diameter and max velocity must be positive",
                self.dn
            )));
        }
        if self.heat_transfer_coefficient < 0.0 {
            return Err(Error::MalformedPipeSpec(format!(
                "DN {}: negative heat transfer coefficient",
                self.dn
            )));
        }
        Ok(())
    }
}

/// Pipe sizes ordered by ascending inner diameter
#[derive(Debug, Clone)]
pub struct PipeCatalog {
    specs: Vec<PipeSpec>,
}

impl PipeCatalog {
    /// Validates and sorts the given pipe sizes.
    ///
    /// # Errors
    ///
    /// Fails when the list is empty, a spec has missing or non-positive values,
    /// two specs share an inner diameter, or nominal sizes do not grow with
    /// the inner diameter.
    pub fn new(mut specs: Vec<PipeSpec>) -> Result<Self, Error> {
        if specs.is_empty() {
            return Err(Error::EmptyPipeCatalog);
        }
        for spec in &specs {
            spec.validate()?;
        }

        specs.sort_by(|a, b| a.inner_diameter.total_cmp(&b.inner_diameter));

        for pair in specs.windows(2) {
            let (smaller, larger) = (&pair[0], &pair[1]);
            if smaller.inner_diameter == larger.inner_diameter {
                return Err(Error::MalformedPipeSpec(format!(
                    "DN {} and DN {} share the inner diameter {} mm",
                    smaller.dn, larger.dn, smaller.inner_diameter
                )));
            }
            if smaller.dn >= larger.dn {
                return Err(Error::MalformedPipeSpec(format!(
                    "DN {} has a larger inner diameter than DN {}",
                    smaller.dn, larger.dn
                )));
            }
        }

        Ok(Self { specs })
    }

    /// Reads a catalog from CSV with the columns `DN,di,U-Value,v_max`
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let specs = reader
            .deserialize::<PipeSpec>()
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(specs)
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn specs(&self) -> &[PipeSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Always `false`, an empty catalog is rejected on construction
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Nominal sizes in catalog order
    pub fn sizes(&self) -> impl Iterator<Item = Dn> + '_ {
        self.specs.iter().map(|spec| spec.dn)
    }

    pub fn get(&self, dn: Dn) -> Option<&PipeSpec> {
        self.specs.iter().find(|spec| spec.dn == dn)
    }
}
