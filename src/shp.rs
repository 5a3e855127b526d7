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

//! Main (`.shp`) and index (`.shx`) files of an ESRI Shapefile.

use geojson::Value;

use crate::util::{expect_count_le, expect_f64_le, expect_i32_be, expect_i32_le, expect_words_be};
use crate::Position;

const FILE_CODE: i32 = 9994;
const HEADER_LEN: usize = 100;
const RECORD_HEADER_LEN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShapeKind {
    Null,
    Point,
    MultiPoint,
    PolyLine,
    Polygon,
}

impl ShapeKind {
    // Z and M variants carry x/y first, so they read like their 2D family.
    fn from_code(code: i32) -> Result<Self, String> {
        match code {
            0 => Ok(ShapeKind::Null),
            1 | 11 | 21 => Ok(ShapeKind::Point),
            3 | 13 | 23 => Ok(ShapeKind::PolyLine),
            5 | 15 | 25 => Ok(ShapeKind::Polygon),
            8 | 18 | 28 => Ok(ShapeKind::MultiPoint),
            31 => Err("MultiPatch shapes are not supported".to_owned()),
            other => Err(format!("unknown shape type {}", other)),
        }
    }
}

/// Validate the 100-byte header shared by `.shp` and `.shx` files.
fn check_header(bytes: &[u8]) -> Result<(), String> {
    if bytes.len() < HEADER_LEN {
        return Err(format!("file is {} bytes, shorter than its header", bytes.len()));
    }
    let code = expect_i32_be(bytes, 0)?;
    if code != FILE_CODE {
        return Err(format!("bad file code {}", code));
    }
    let version = expect_i32_le(bytes, 28)?;
    if version != 1000 {
        return Err(format!("unsupported version {}", version));
    }
    ShapeKind::from_code(expect_i32_le(bytes, 32)?)?;
    Ok(())
}

/// Location of one record inside the `.shp` file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    /// Byte offset of the record header.
    pub offset: usize,
    /// Content length in bytes, record header excluded.
    pub content_len: usize,
}

/// Record positions of a `.shp` file, read from `.shx` or rebuilt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShapeIndex {
    entries: Vec<IndexEntry>,
}

impl ShapeIndex {
    pub fn from_shx(shx: &[u8]) -> Result<Self, String> {
        check_header(shx)?;
        let body = shx.len() - HEADER_LEN;
        if body % RECORD_HEADER_LEN != 0 {
            return Err(format!("index body of {} bytes is not a multiple of 8", body));
        }
        let entries = (0..body / RECORD_HEADER_LEN)
            .map(|i| {
                let at = HEADER_LEN + i * RECORD_HEADER_LEN;
                Ok(IndexEntry {
                    offset: expect_words_be(shx, at)?,
                    content_len: expect_words_be(shx, at + 4)?,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;
        Ok(ShapeIndex { entries })
    }

    /// Walk the `.shp` records one after the other, as if no index existed.
    pub fn rebuild(shp: &[u8]) -> Result<Self, String> {
        check_header(shp)?;
        let declared = expect_words_be(shp, 24)?;
        let end = declared.min(shp.len());
        let mut entries = Vec::new();
        let mut pos = HEADER_LEN;
        while pos < end {
            let content_len = expect_words_be(shp, pos + 4)?;
            let next = pos + RECORD_HEADER_LEN + content_len;
            if next > end {
                return Err(format!("record at byte {} runs past the end of file", pos));
            }
            entries.push(IndexEntry {
                offset: pos,
                content_len,
            });
            pos = next;
        }
        Ok(ShapeIndex { entries })
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Decode every record listed in `index`. `None` stands for a null shape.
pub fn read_shapes(shp: &[u8], index: &ShapeIndex) -> Result<Vec<Option<Value>>, String> {
    check_header(shp)?;
    index
        .entries()
        .iter()
        .map(|entry| read_record(shp, *entry))
        .collect()
}

fn read_record(shp: &[u8], entry: IndexEntry) -> Result<Option<Value>, String> {
    let start = entry.offset + RECORD_HEADER_LEN;
    let content = start
        .checked_add(entry.content_len)
        .and_then(|end| shp.get(start..end))
        .ok_or_else(|| format!("record at byte {} runs past the end of file", entry.offset))?;
    let kind = ShapeKind::from_code(expect_i32_le(content, 0)?)?;
    let value = match kind {
        ShapeKind::Null => None,
        ShapeKind::Point => Some(Value::Point(read_point(content, 4)?)),
        ShapeKind::MultiPoint => {
            let n = expect_count_le(content, 36)?;
            let points = read_points(content, 40, n)?;
            Some(Value::MultiPoint(points))
        }
        ShapeKind::PolyLine => {
            let mut parts = read_parts(content)?;
            match parts.len() {
                0 => None,
                1 => parts.pop().map(Value::LineString),
                _ => Some(Value::MultiLineString(parts)),
            }
        }
        ShapeKind::Polygon => assemble_polygon(read_parts(content)?),
    };
    Ok(value)
}

fn read_point(content: &[u8], at: usize) -> Result<Position, String> {
    Ok(vec![expect_f64_le(content, at)?, expect_f64_le(content, at + 8)?])
}

fn read_points(content: &[u8], at: usize, n: usize) -> Result<Vec<Position>, String> {
    (0..n).map(|i| read_point(content, at + i * 16)).collect()
}

// PolyLine and Polygon share: bbox, part count, point count, part starts, points.
fn read_parts(content: &[u8]) -> Result<Vec<Vec<Position>>, String> {
    let num_parts = expect_count_le(content, 36)?;
    let num_points = expect_count_le(content, 40)?;
    if num_parts > content.len() / 4 || num_points > content.len() / 16 {
        return Err(format!("{} parts / {} points do not fit the record", num_parts, num_points));
    }
    let points_at = 44 + num_parts * 4;
    let points = read_points(content, points_at, num_points)?;

    let mut starts = Vec::with_capacity(num_parts + 1);
    for i in 0..num_parts {
        starts.push(expect_count_le(content, 44 + i * 4)?);
    }
    starts.push(num_points);

    let mut parts = Vec::with_capacity(num_parts);
    for w in starts.windows(2) {
        let (from, to) = (w[0], w[1]);
        if from > to || to > num_points {
            return Err(format!("part bounds {}..{} out of order", from, to));
        }
        parts.push(points[from..to].to_vec());
    }
    Ok(parts)
}

/// Shoelace sum; negative for clockwise rings.
fn signed_area(ring: &[Position]) -> f64 {
    let mut sum = 0.;
    for w in ring.windows(2) {
        sum += w[0][0] * w[1][1] - w[1][0] * w[0][1];
    }
    sum / 2.
}

fn ring_contains(ring: &[Position], pt: &[f64]) -> bool {
    let (x, y) = (pt[0], pt[1]);
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let (xi, yi, xj, yj) = (ring[i][0], ring[i][1], ring[j][0], ring[j][1]);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Group shapefile rings into polygons: clockwise rings are outer
/// boundaries, counter-clockwise rings are holes of the outer ring that
/// contains them.
fn assemble_polygon(rings: Vec<Vec<Position>>) -> Option<Value> {
    let mut polygons: Vec<Vec<Vec<Position>>> = Vec::new();
    let mut holes = Vec::new();
    for ring in rings.into_iter().filter(|r| !r.is_empty()) {
        if signed_area(&ring) <= 0. {
            polygons.push(vec![ring]);
        } else {
            holes.push(ring);
        }
    }
    if polygons.is_empty() {
        // wrongly wound file: every ring stands alone
        polygons = holes.drain(..).map(|r| vec![r]).collect();
    }
    for hole in holes {
        let owner = polygons
            .iter()
            .position(|p| ring_contains(&p[0], &hole[0]))
            .unwrap_or(polygons.len() - 1);
        polygons[owner].push(hole);
    }
    match polygons.len() {
        0 => None,
        1 => polygons.pop().map(Value::Polygon),
        _ => Some(Value::MultiPolygon(polygons)),
    }
}
