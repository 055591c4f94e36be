use serde::{Deserialize, Serialize};

use crate::Error;

/// Parameters of a planning run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Supply temperature in °C
    pub supply_temp: f64,
    /// Return temperature in °C
    pub return_temp: f64,
    /// Join each building and source location to its connection point with
    /// a dedicated connection edge and route between the locations
    pub service_lines: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            supply_temp: 80.0,
            return_temp: 60.0,
            service_lines: false,
        }
    }
}

impl NetworkConfig {
    pub fn new(supply_temp: f64, return_temp: f64) -> Self {
        Self {
            supply_temp,
            return_temp,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_service_lines(mut self, service_lines: bool) -> Self {
        self.service_lines = service_lines;
        self
    }

    /// # Errors
    ///
    /// Temperatures must be finite and the supply must be hotter than the
    /// return, otherwise no volume flow can be derived.
    pub fn validate(&self) -> Result<(), Error> {
        validate_temperatures(self.supply_temp, self.return_temp)
    }
}

pub(crate) fn validate_temperatures(supply: f64, ret: f64) -> Result<(), Error> {
    if supply.is_finite() && ret.is_finite() && supply > ret {
        Ok(())
    } else {
        Err(Error::InvalidTemperatures { supply, ret })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: NetworkConfig = serde_json::from_str(r#"{"supply_temp": 90.0}"#).unwrap();

        assert_eq!(config.supply_temp, 90.0);
        assert_eq!(config.return_temp, 60.0);
        assert!(!config.service_lines);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn return_hotter_than_supply_is_rejected() {
        assert!(matches!(
            NetworkConfig::new(60.0, 60.0).validate(),
            Err(Error::InvalidTemperatures { .. })
        ));
        assert!(NetworkConfig::new(f64::NAN, 40.0).validate().is_err());
    }
}
