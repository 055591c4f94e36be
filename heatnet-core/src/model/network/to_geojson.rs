use geo::LineString;
use geojson::{Feature, FeatureCollection, Geometry, GeometryValue};
use serde_json::Value;

use super::{EdgeRecord, HeatNetwork};
use crate::Error;

impl HeatNetwork {
    /// Converts the network to a `GeoJSON` `FeatureCollection` with one
    /// `LineString` feature per edge.
    pub fn to_geojson(&self) -> Result<FeatureCollection, Error> {
        let features = self
            .edges()
            .map(|record| record.to_feature())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FeatureCollection {
            features,
            bbox: None,
            foreign_members: None,
        })
    }

    pub fn to_geojson_string(&self) -> Result<String, Error> {
        serde_json::to_string(&self.to_geojson()?)
            .map_err(|e| Error::GeoJsonError(e.to_string()))
    }
}

impl EdgeRecord<'_> {
    fn to_feature(&self) -> Result<Feature, Error> {
        let line = LineString::new(vec![self.from, self.to]);
        let geometry = Geometry::new(GeometryValue::from(&line));

        let properties = match serde_json::to_value(self.edge) {
            Ok(Value::Object(properties)) => properties,
            Ok(other) => {
                return Err(Error::GeoJsonError(format!(
                    "edge attributes serialized to {other} instead of an object"
                )));
            }
            Err(e) => return Err(Error::GeoJsonError(e.to_string())),
        };

        Ok(Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        })
    }
}
