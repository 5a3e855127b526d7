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

//! Byte-level writers for shapefile fixtures.

pub const SHAPE_POINT: i32 = 1;
pub const SHAPE_POLYLINE: i32 = 3;
pub const SHAPE_POLYGON: i32 = 5;

pub const WEB_MERCATOR_PRJ: &str = r#"PROJCS["WGS 84 / Pseudo-Mercator",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]],PROJECTION["Mercator_1SP"],PARAMETER["central_meridian",0],PARAMETER["scale_factor",1],PARAMETER["false_easting",0],PARAMETER["false_northing",0],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AXIS["X",EAST],AXIS["Y",NORTH],AUTHORITY["EPSG","3857"]]"#;

pub const WGS84_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

fn header(shape_type: i32, file_len: usize) -> Vec<u8> {
    let mut h = Vec::with_capacity(100);
    h.extend_from_slice(&9994i32.to_be_bytes());
    h.extend_from_slice(&[0u8; 20]);
    h.extend_from_slice(&((file_len / 2) as i32).to_be_bytes());
    h.extend_from_slice(&1000i32.to_le_bytes());
    h.extend_from_slice(&shape_type.to_le_bytes());
    h.extend_from_slice(&[0u8; 64]);
    h
}

/// Main and index file for records with the given contents.
pub fn shp_and_shx(shape_type: i32, contents: &[Vec<u8>]) -> (Vec<u8>, Vec<u8>) {
    let shp_len = 100 + contents.iter().map(|c| 8 + c.len()).sum::<usize>();
    let shx_len = 100 + 8 * contents.len();
    let mut shp = header(shape_type, shp_len);
    let mut shx = header(shape_type, shx_len);
    for (i, content) in contents.iter().enumerate() {
        let words = (content.len() / 2) as i32;
        shx.extend_from_slice(&((shp.len() / 2) as i32).to_be_bytes());
        shx.extend_from_slice(&words.to_be_bytes());
        shp.extend_from_slice(&(i as i32 + 1).to_be_bytes());
        shp.extend_from_slice(&words.to_be_bytes());
        shp.extend_from_slice(content);
    }
    (shp, shx)
}

pub fn point_content(x: f64, y: f64) -> Vec<u8> {
    let mut c = SHAPE_POINT.to_le_bytes().to_vec();
    c.extend_from_slice(&x.to_le_bytes());
    c.extend_from_slice(&y.to_le_bytes());
    c
}

fn parts_content(shape_type: i32, parts: &[&[(f64, f64)]]) -> Vec<u8> {
    let mut c = shape_type.to_le_bytes().to_vec();
    c.extend_from_slice(&[0u8; 32]);
    let num_points: usize = parts.iter().map(|p| p.len()).sum();
    c.extend_from_slice(&(parts.len() as i32).to_le_bytes());
    c.extend_from_slice(&(num_points as i32).to_le_bytes());
    let mut start = 0;
    for part in parts {
        c.extend_from_slice(&(start as i32).to_le_bytes());
        start += part.len();
    }
    for (x, y) in parts.iter().flat_map(|p| p.iter()) {
        c.extend_from_slice(&x.to_le_bytes());
        c.extend_from_slice(&y.to_le_bytes());
    }
    c
}

pub fn polyline_content(parts: &[&[(f64, f64)]]) -> Vec<u8> {
    parts_content(SHAPE_POLYLINE, parts)
}

pub fn polygon_content(rings: &[&[(f64, f64)]]) -> Vec<u8> {
    parts_content(SHAPE_POLYGON, rings)
}

/// A dBASE III table. Fields are `(name, type, length, decimals)`; values
/// are padded to the field length. With `latin1`, text is written one byte
/// per char.
pub fn dbf(fields: &[(&str, u8, u8, u8)], rows: &[&[&str]], latin1: bool) -> Vec<u8> {
    let header_len = 32 + 32 * fields.len() + 1;
    let record_len = 1 + fields.iter().map(|f| f.2 as usize).sum::<usize>();
    let mut out = vec![0x03, 124, 1, 1];
    out.extend_from_slice(&(rows.len() as u32).to_le_bytes());
    out.extend_from_slice(&(header_len as u16).to_le_bytes());
    out.extend_from_slice(&(record_len as u16).to_le_bytes());
    out.extend_from_slice(&[0u8; 20]);
    for (name, kind, len, decimals) in fields {
        let mut field = [0u8; 32];
        field[..name.len()].copy_from_slice(name.as_bytes());
        field[11] = *kind;
        field[16] = *len;
        field[17] = *decimals;
        out.extend_from_slice(&field);
    }
    out.push(0x0D);
    for row in rows {
        out.push(b' ');
        for ((_, kind, len, _), value) in fields.iter().zip(row.iter()) {
            let encoded: Vec<u8> = if latin1 {
                value.chars().map(|c| c as u32 as u8).collect()
            } else {
                value.as_bytes().to_vec()
            };
            let pad = vec![b' '; *len as usize - encoded.len()];
            if matches!(kind, b'N' | b'F') {
                out.extend_from_slice(&pad);
                out.extend_from_slice(&encoded);
            } else {
                out.extend_from_slice(&encoded);
                out.extend_from_slice(&pad);
            }
        }
    }
    out.push(0x1A);
    out
}
