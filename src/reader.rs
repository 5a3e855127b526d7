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

use std::fs;
use std::path::{Path, PathBuf};

use geojson::{GeoJson, Geometry};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::dbf::{self, Encoding};
use crate::json::JsonObject;
use crate::shp::{self, ShapeIndex};
use crate::{util, Crs, Error, ReadErrorKind, Result, VectorDataset};

/// Options of the geodata reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Accept a `.shp` without its `.shx` by rebuilding the record index
    /// from the main file.
    pub tolerate_missing_index: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            tolerate_missing_index: true,
        }
    }
}

/// Input of [`read`].
#[derive(Clone, Copy, Debug)]
pub enum Source<'a> {
    /// A GeoJSON document held in memory.
    Document { name: &'a str, bytes: &'a [u8] },
    /// A `.shp` file whose sidecars sit in the same directory.
    Shapefile { path: &'a Path },
}

/// Read a source into a dataset. The CRS is whatever the source declares.
pub fn read(source: Source<'_>, config: &ReaderConfig) -> Result<VectorDataset> {
    match source {
        Source::Document { name, bytes } => read_document(name, bytes),
        Source::Shapefile { path } => read_shapefile(path, config),
    }
}

fn read_document(name: &str, bytes: &[u8]) -> Result<VectorDataset> {
    let malformed = |detail: String| Error::read(name, ReadErrorKind::MalformedDocument(detail));

    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let text = std::str::from_utf8(bytes).map_err(|e| malformed(e.to_string()))?;
    let geojson: GeoJson = text.parse().map_err(|e: geojson::Error| malformed(e.to_string()))?;

    let (crs, rows) = match geojson {
        GeoJson::FeatureCollection(fc) => {
            let crs = util::get_crs(fc.foreign_members.as_ref());
            let rows = fc
                .features
                .into_iter()
                .map(|f| (f.geometry, f.properties.unwrap_or_default()))
                .collect();
            (crs, rows)
        }
        GeoJson::Feature(f) => (
            util::get_crs(f.foreign_members.as_ref()),
            vec![(f.geometry, f.properties.unwrap_or_default())],
        ),
        GeoJson::Geometry(g) => (
            util::get_crs(g.foreign_members.as_ref()),
            vec![(Some(g), JsonObject::new())],
        ),
    };
    let crs = crs.map_err(|kind| Error::read(name, kind))?;
    debug!("read {} features from '{}' ({})", rows.len(), name, crs);
    Ok(VectorDataset::new(rows, crs))
}

/// Companion files found next to a `.shp`.
#[derive(Debug, Default)]
struct Sidecars {
    shx: Option<PathBuf>,
    dbf: Option<PathBuf>,
    prj: Option<PathBuf>,
    cpg: Option<PathBuf>,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::read(file_name(path), ReadErrorKind::Io(e.to_string())))
}

// Same base name, extension compared case-insensitively.
fn find_sidecars(shp_path: &Path) -> Result<Sidecars> {
    let io_err = |e: std::io::Error| Error::read(file_name(shp_path), ReadErrorKind::Io(e.to_string()));
    let stem = shp_path.file_stem().ok_or_else(|| {
        Error::read(file_name(shp_path), ReadErrorKind::Io("no file stem".to_owned()))
    })?;
    let dir = match shp_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut found = Sidecars::default();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.file_stem() != Some(stem) {
            continue;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let slot = match ext.as_deref() {
            Some("shx") => &mut found.shx,
            Some("dbf") => &mut found.dbf,
            Some("prj") => &mut found.prj,
            Some("cpg") => &mut found.cpg,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(path);
        }
    }
    Ok(found)
}

fn sibling_name(shp_path: &Path, ext: &str) -> String {
    file_name(&shp_path.with_extension(ext))
}

fn read_shapefile(path: &Path, config: &ReaderConfig) -> Result<VectorDataset> {
    let shp_name = file_name(path);
    let sidecars = find_sidecars(path)?;

    let dbf_path = sidecars.dbf.ok_or_else(|| {
        Error::read(sibling_name(path, "dbf"), ReadErrorKind::MissingSidecar("dbf"))
    })?;

    let shp_bytes = read_file(path)?;
    let index = match sidecars.shx {
        Some(shx_path) => {
            let shx_bytes = read_file(&shx_path)?;
            ShapeIndex::from_shx(&shx_bytes)
                .map_err(|d| Error::read(file_name(&shx_path), ReadErrorKind::InvalidShape(d)))?
        }
        None if config.tolerate_missing_index => {
            warn!("'{}' has no .shx index, rebuilding it from the main file", shp_name);
            ShapeIndex::rebuild(&shp_bytes)
                .map_err(|d| Error::read(&shp_name, ReadErrorKind::InvalidShape(d)))?
        }
        None => {
            return Err(Error::read(
                sibling_name(path, "shx"),
                ReadErrorKind::MissingSidecar("shx"),
            ))
        }
    };
    let shapes = shp::read_shapes(&shp_bytes, &index)
        .map_err(|d| Error::read(&shp_name, ReadErrorKind::InvalidShape(d)))?;

    let encoding = match &sidecars.cpg {
        Some(cpg_path) => Encoding::from_cpg(&String::from_utf8_lossy(&read_file(cpg_path)?)),
        None => Encoding::default(),
    };
    let dbf_name = file_name(&dbf_path);
    let table = dbf::read_table(&read_file(&dbf_path)?, encoding)
        .map_err(|d| Error::read(&dbf_name, ReadErrorKind::InvalidTable(d)))?;

    if shapes.len() != table.rows.len() {
        return Err(Error::read(
            &shp_name,
            ReadErrorKind::RecordCountMismatch {
                geometries: shapes.len(),
                records: table.rows.len(),
            },
        ));
    }

    let crs = match &sidecars.prj {
        Some(prj_path) => {
            let wkt = String::from_utf8_lossy(&read_file(prj_path)?).into_owned();
            Crs::from_wkt(&wkt)
                .ok_or_else(|| Error::read(file_name(prj_path), ReadErrorKind::UnknownProjection))?
        }
        None => Crs::Undefined,
    };

    let rows = shapes
        .into_iter()
        .map(|value| value.map(Geometry::new))
        .zip(table.rows)
        .collect::<Vec<_>>();
    debug!("read {} shapes from '{}' ({})", rows.len(), shp_name, crs);
    Ok(VectorDataset::with_columns(table.columns, rows, crs))
}
