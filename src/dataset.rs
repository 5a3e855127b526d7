// Copyright 2018 The GeoRust Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use geojson::Geometry;
use log::warn;

use crate::json::{JsonObject, JsonValue};
use crate::Crs;

/// Key reserved for the geometry; never an attribute column.
pub(crate) const GEOMETRY_KEY: &str = "geometry";

/// One record of a [`VectorDataset`].
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub geometry: Option<Geometry>,
    /// Attribute values, keyed and ordered by the dataset schema.
    pub attributes: JsonObject,
}

/// Ordered features sharing one attribute schema, tagged with a CRS.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorDataset {
    features: Vec<Feature>,
    schema: Vec<String>,
    crs: Crs,
}

impl VectorDataset {
    /// Build a dataset whose schema is the union of every row's keys, in
    /// order of first appearance. Missing values become `null`.
    pub fn new(rows: Vec<(Option<Geometry>, JsonObject)>, crs: Crs) -> Self {
        VectorDataset::with_columns(Vec::new(), rows, crs)
    }

    /// Same as [`new`](VectorDataset::new) with `columns` leading the schema.
    pub fn with_columns(
        columns: Vec<String>,
        rows: Vec<(Option<Geometry>, JsonObject)>,
        crs: Crs,
    ) -> Self {
        let mut schema: Vec<String> = Vec::with_capacity(columns.len());
        let mut reserved_seen = false;
        {
            let mut add = |key: &str| {
                if key.eq_ignore_ascii_case(GEOMETRY_KEY) {
                    reserved_seen = true;
                } else if !schema.iter().any(|k| k == key) {
                    schema.push(key.to_owned());
                }
            };
            for key in &columns {
                add(key);
            }
            for (_, attributes) in &rows {
                for key in attributes.keys() {
                    add(key);
                }
            }
        }
        if reserved_seen {
            warn!("dropping attribute column named like the reserved geometry key");
        }

        let features = rows
            .into_iter()
            .map(|(geometry, mut attributes)| {
                let mut ordered = JsonObject::with_capacity(schema.len());
                for key in &schema {
                    let value = attributes.remove(key).unwrap_or(JsonValue::Null);
                    ordered.insert(key.clone(), value);
                }
                Feature {
                    geometry,
                    attributes: ordered,
                }
            })
            .collect();

        VectorDataset {
            features,
            schema,
            crs,
        }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub(crate) fn features_mut(&mut self) -> &mut [Feature] {
        &mut self.features
    }

    pub fn into_features(self) -> Vec<Feature> {
        self.features
    }

    /// Column names, in the order shared by every feature.
    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    /// Retag the dataset without touching any coordinate.
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = crs;
        self
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::VectorDataset;
    use crate::json::{JsonObject, JsonValue};
    use crate::Crs;
    use geojson::{Geometry, Value};

    fn props(pairs: &[(&str, JsonValue)]) -> JsonObject {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn schema_is_union_in_first_seen_order() {
        let rows = vec![
            (None, props(&[("b", 1.into()), ("a", 2.into())])),
            (None, props(&[("c", "x".into()), ("a", 3.into())])),
        ];
        let ds = VectorDataset::new(rows, Crs::Undefined);
        assert_eq!(ds.schema(), &["b", "a", "c"]);
        for f in ds.features() {
            let keys: Vec<&String> = f.attributes.keys().collect();
            assert_eq!(keys, vec!["b", "a", "c"]);
        }
        assert_eq!(ds.features()[0].attributes["c"], JsonValue::Null);
        assert_eq!(ds.features()[1].attributes["b"], JsonValue::Null);
    }

    #[test]
    fn reserved_geometry_column_is_dropped() {
        let rows = vec![(
            Some(Geometry::new(Value::Point(vec![1.0, 2.0]))),
            props(&[("Geometry", "POINT (1 2)".into()), ("name", "x".into())]),
        )];
        let ds = VectorDataset::with_columns(vec!["geometry".into()], rows, Crs::Undefined);
        assert_eq!(ds.schema(), &["name"]);
        assert!(!ds.features()[0].attributes.contains_key("Geometry"));
        assert_eq!(ds.len(), 1);
    }
}
