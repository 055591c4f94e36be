//! Buildings and heat sources attached to the street network

use geo::{Contains, Point, Polygon};

use crate::{Error, SourceId, StreetId};

/// Heat consumer
#[derive(Debug, Clone)]
pub struct Building {
    /// Location the building is connected from, usually its centroid
    pub location: Point<f64>,
    /// Design heat demand
    pub power: f64,
    /// Street feature the building has to be connected to, if already known
    pub street_id: Option<StreetId>,
}

impl Building {
    pub fn new(location: Point<f64>, power: f64) -> Self {
        Self {
            location,
            power,
            street_id: None,
        }
    }

    #[must_use]
    pub fn on_street(mut self, street_id: StreetId) -> Self {
        self.street_id = Some(street_id);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if !(self.location.x().is_finite() && self.location.y().is_finite()) {
            return Err(Error::InvalidData(format!(
                "building location {:?} is not finite",
                self.location
            )));
        }
        if !self.power.is_finite() || self.power < 0.0 {
            return Err(Error::InvalidData(format!(
                "building power {} must be a finite, non-negative number",
                self.power
            )));
        }
        Ok(())
    }
}

/// Heat supply point
#[derive(Debug, Clone)]
pub struct Source {
    pub location: Point<f64>,
    pub street_id: Option<StreetId>,
}

impl Source {
    pub fn new(location: Point<f64>) -> Self {
        Self {
            location,
            street_id: None,
        }
    }

    #[must_use]
    pub fn on_street(mut self, street_id: StreetId) -> Self {
        self.street_id = Some(street_id);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.location.x().is_finite() && self.location.y().is_finite() {
            Ok(())
        } else {
            Err(Error::InvalidData(format!(
                "source location {:?} is not finite",
                self.location
            )))
        }
    }
}

/// Area supplied by its own heat centre in an interconnected network.
///
/// The heat centre is one of the source rows. In an interconnection run the
/// load of every building inside `area` is carried from the primary source to
/// that heat centre.
#[derive(Debug, Clone)]
pub struct HeatingZone {
    pub area: Polygon<f64>,
    /// Source row of the zone's heat centre
    pub heat_centre: SourceId,
}

impl HeatingZone {
    pub fn new(area: Polygon<f64>, heat_centre: SourceId) -> Self {
        Self { area, heat_centre }
    }

    /// Whether the building lies strictly inside the zone, boundary excluded
    pub fn contains(&self, building: &Building) -> bool {
        self.area.contains(&building.location)
    }
}
