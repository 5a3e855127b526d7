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

use std::fmt;

use geojson::Value;
use log::info;
use proj4rs::Proj;

use crate::{Crs, Error, Position, Result, VectorDataset, WGS84};

/// Bring a dataset into WGS84.
///
/// A dataset without CRS is assumed to already be WGS84: nothing in the
/// coordinates tells a projected dataset from a geographic one, so the tag
/// is assigned as is. WGS84 input is returned untouched.
pub fn normalize(dataset: VectorDataset) -> Result<VectorDataset> {
    match dataset.crs() {
        Crs::Undefined => {
            info!("no CRS declared, assuming {}", WGS84);
            Ok(dataset.with_crs(WGS84))
        }
        crs if crs == WGS84 => Ok(dataset),
        _ => reproject(dataset, WGS84),
    }
}

/// Move every coordinate of `dataset` into `target`.
///
/// Either every position is transformed or the whole dataset is rejected.
pub fn reproject(mut dataset: VectorDataset, target: Crs) -> Result<VectorDataset> {
    let source = dataset.crs();
    if source == target {
        return Ok(dataset);
    }
    let transformer = Transformer::new(source, target)?;
    info!(
        "reprojecting {} features from {} to {}",
        dataset.len(),
        source,
        target
    );
    for (ix, feature) in dataset.features_mut().iter_mut().enumerate() {
        if let Some(geometry) = feature.geometry.as_mut() {
            for_each_position(&mut geometry.value, &mut |p| transformer.transform(p)).map_err(
                |detail| Error::Reprojection {
                    feature: Some(ix),
                    detail,
                },
            )?;
            geometry.bbox = None;
        }
    }
    Ok(dataset.with_crs(target))
}

fn for_each_position<F>(value: &mut Value, f: &mut F) -> std::result::Result<(), String>
where
    F: FnMut(&mut Position) -> std::result::Result<(), String>,
{
    match value {
        Value::Point(p) => f(p),
        Value::MultiPoint(ps) | Value::LineString(ps) => ps.iter_mut().try_for_each(f),
        Value::MultiLineString(rings) | Value::Polygon(rings) => rings
            .iter_mut()
            .flat_map(|r| r.iter_mut())
            .try_for_each(f),
        Value::MultiPolygon(polys) => polys
            .iter_mut()
            .flat_map(|p| p.iter_mut())
            .flat_map(|r| r.iter_mut())
            .try_for_each(f),
        Value::GeometryCollection(geoms) => {
            for g in geoms {
                for_each_position(&mut g.value, f)?;
                g.bbox = None;
            }
            Ok(())
        }
    }
}

/// Coordinate transform between two EPSG systems.
pub struct Transformer {
    from: Crs,
    to: Crs,
    src: Proj,
    dst: Proj,
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

fn projection(crs: Crs) -> Result<Proj> {
    let def = crs.proj_definition().ok_or_else(|| Error::Reprojection {
        feature: None,
        detail: format!("no transform known for {}", crs),
    })?;
    Proj::from_proj_string(def).map_err(|e| Error::Reprojection {
        feature: None,
        detail: format!("invalid definition for {}: {:?}", crs, e),
    })
}

impl Transformer {
    pub fn new(from: Crs, to: Crs) -> Result<Self> {
        Ok(Transformer {
            from,
            to,
            src: projection(from)?,
            dst: projection(to)?,
        })
    }

    /// Transform one position in place. A third ordinate is left as is.
    pub fn transform(&self, pos: &mut Position) -> std::result::Result<(), String> {
        if pos.len() < 2 {
            return Err(format!("position {:?} has fewer than two ordinates", pos));
        }
        let (x, y) = (pos[0], pos[1]);
        // geographic systems cross the boundary in radians
        let mut pt = if self.from.is_geographic() {
            (x.to_radians(), y.to_radians(), 0.)
        } else {
            (x, y, 0.)
        };
        proj4rs::transform::transform(&self.src, &self.dst, &mut pt)
            .map_err(|e| format!("({}, {}): {:?}", x, y, e))?;
        let (ox, oy) = if self.to.is_geographic() {
            (pt.0.to_degrees(), pt.1.to_degrees())
        } else {
            (pt.0, pt.1)
        };
        if !(ox.is_finite() && oy.is_finite()) {
            return Err(format!("({}, {}) has no image in {}", x, y, self.to));
        }
        pos[0] = ox;
        pos[1] = oy;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize, reproject, Transformer};
    use crate::json::JsonObject;
    use crate::{Crs, Error, VectorDataset, WGS84};
    use geojson::{Geometry, Value};

    const EPS: f64 = 1e-9;

    fn dataset(values: Vec<Value>, crs: Crs) -> VectorDataset {
        let rows = values
            .into_iter()
            .map(|v| (Some(Geometry::new(v)), JsonObject::new()))
            .collect();
        VectorDataset::new(rows, crs)
    }

    fn coords(ds: &VectorDataset) -> Vec<Value> {
        ds.features()
            .iter()
            .map(|f| f.geometry.as_ref().map(|g| g.value.clone()).unwrap())
            .collect()
    }

    #[test]
    fn wgs84_is_untouched() {
        let values = vec![
            Value::Point(vec![2.3522219, 48.856614]),
            Value::LineString(vec![vec![-0.1, 51.5, 35.0], vec![13.4, 52.5, 40.0]]),
        ];
        let ds = normalize(dataset(values.clone(), WGS84)).unwrap();
        assert_eq!(coords(&ds), values);
        assert_eq!(ds.crs(), WGS84);
    }

    #[test]
    fn undefined_crs_is_assumed_wgs84() {
        let values = vec![Value::Point(vec![500000.0, 4649776.0])];
        let ds = normalize(dataset(values.clone(), Crs::Undefined)).unwrap();
        assert_eq!(ds.crs(), WGS84);
        assert_eq!(coords(&ds), values);
    }

    #[test]
    fn web_mercator_on_the_equator() {
        let ds = dataset(
            vec![Value::Point(vec![1113194.9079327357, 0.0])],
            Crs::Epsg(3857),
        );
        let ds = normalize(ds).unwrap();
        match &coords(&ds)[0] {
            Value::Point(p) => {
                assert!((p[0] - 10.0).abs() < 1e-7, "{:?}", p);
                assert!(p[1].abs() < 1e-7, "{:?}", p);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn round_trip_through_projected_systems() {
        let original = vec![
            Value::Polygon(vec![vec![
                vec![10.0, 50.0],
                vec![11.0, 50.0],
                vec![11.0, 51.0],
                vec![10.0, 50.0],
            ]]),
            Value::MultiPoint(vec![vec![9.19, 45.46], vec![12.5, -0.5]]),
        ];
        for code in [3857, 32632, 3395, 25832] {
            let there = reproject(dataset(original.clone(), WGS84), Crs::Epsg(code)).unwrap();
            assert_eq!(there.crs(), Crs::Epsg(code));
            let back = normalize(there).unwrap();
            for (a, b) in coords(&back).iter().zip(original.iter()) {
                let flat = |v: &Value| -> Vec<f64> {
                    match v {
                        Value::Polygon(r) => r.iter().flatten().flatten().copied().collect(),
                        Value::MultiPoint(p) => p.iter().flatten().copied().collect(),
                        _ => unreachable!(),
                    }
                };
                for (x, y) in flat(a).iter().zip(flat(b).iter()) {
                    assert!((x - y).abs() < 1e-7 + EPS, "EPSG:{} {} vs {}", code, x, y);
                }
            }
        }
    }

    #[test]
    fn swiss_grid_from_the_registry() {
        let ds = dataset(
            vec![Value::Point(vec![2_600_000.0, 1_200_000.0])],
            Crs::Epsg(2056),
        );
        let ds = normalize(ds).unwrap();
        assert_eq!(ds.crs(), WGS84);
        match &coords(&ds)[0] {
            // the LV95 false origin sits in Bern
            Value::Point(p) => {
                assert!((p[0] - 7.4396).abs() < 0.01, "{:?}", p);
                assert!((p[1] - 46.9524).abs() < 0.01, "{:?}", p);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_code_fails_before_touching_data() {
        match normalize(dataset(vec![Value::Point(vec![1., 2.])], Crs::Epsg(70000))) {
            Err(Error::Reprojection { feature: None, .. }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bad_position_fails_the_whole_step() {
        let ds = dataset(
            vec![Value::Point(vec![0., 0.]), Value::Point(vec![1.])],
            Crs::Epsg(3857),
        );
        match normalize(ds) {
            Err(Error::Reprojection {
                feature: Some(1), ..
            }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn transformer_keeps_third_ordinate() {
        let t = Transformer::new(Crs::Epsg(3857), WGS84).unwrap();
        let mut p = vec![0., 0., 123.5];
        t.transform(&mut p).unwrap();
        assert_eq!(p[2], 123.5);
        assert!(p[0].abs() < EPS && p[1].abs() < EPS);
    }
}
