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

use crate::json::{JsonObject, JsonValue};
use crate::{Crs, ReadErrorKind};

fn expect_bytes<const N: usize>(bytes: &[u8], at: usize) -> Result<[u8; N], String> {
    at.checked_add(N)
        .and_then(|end| bytes.get(at..end))
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| format!("unexpected end of data at byte {}", at))
}

pub fn expect_u8(bytes: &[u8], at: usize) -> Result<u8, String> {
    bytes
        .get(at)
        .copied()
        .ok_or_else(|| format!("unexpected end of data at byte {}", at))
}

pub fn expect_i32_be(bytes: &[u8], at: usize) -> Result<i32, String> {
    expect_bytes(bytes, at).map(i32::from_be_bytes)
}

pub fn expect_i32_le(bytes: &[u8], at: usize) -> Result<i32, String> {
    expect_bytes(bytes, at).map(i32::from_le_bytes)
}

pub fn expect_u16_le(bytes: &[u8], at: usize) -> Result<u16, String> {
    expect_bytes(bytes, at).map(u16::from_le_bytes)
}

pub fn expect_u32_le(bytes: &[u8], at: usize) -> Result<u32, String> {
    expect_bytes(bytes, at).map(u32::from_le_bytes)
}

pub fn expect_f64_le(bytes: &[u8], at: usize) -> Result<f64, String> {
    expect_bytes(bytes, at).map(f64::from_le_bytes)
}

/// A non-negative count stored as a little-endian `i32`.
pub fn expect_count_le(bytes: &[u8], at: usize) -> Result<usize, String> {
    let n = expect_i32_le(bytes, at)?;
    usize::try_from(n).map_err(|_| format!("negative count {} at byte {}", n, at))
}

/// A length in 16-bit words stored as a big-endian `i32`, returned in bytes.
pub fn expect_words_be(bytes: &[u8], at: usize) -> Result<usize, String> {
    let n = expect_i32_be(bytes, at)?;
    usize::try_from(n)
        .map(|w| w * 2)
        .map_err(|_| format!("negative length {} at byte {}", n, at))
}

/// Retrieve the legacy 'crs' member of a GeoJSON object if any.
///
/// Only named CRS objects are understood; linked ones are ignored.
pub fn get_crs(foreign_members: Option<&JsonObject>) -> Result<Crs, ReadErrorKind> {
    let crs = match foreign_members.and_then(|m| m.get("crs")) {
        None | Some(JsonValue::Null) => return Ok(Crs::Undefined),
        Some(JsonValue::Object(crs)) => crs,
        Some(_) => {
            return Err(ReadErrorKind::MalformedDocument(
                "'crs' member must be an object".to_owned(),
            ))
        }
    };
    if crs.get("type").and_then(JsonValue::as_str) != Some("name") {
        return Ok(Crs::Undefined);
    }
    let name = crs
        .get("properties")
        .and_then(JsonValue::as_object)
        .and_then(|p| p.get("name"))
        .and_then(JsonValue::as_str)
        .ok_or_else(|| {
            ReadErrorKind::MalformedDocument("named 'crs' member has no name".to_owned())
        })?;
    Crs::from_name(name).ok_or(ReadErrorKind::UnknownProjection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn members(value: JsonValue) -> JsonObject {
        match value {
            JsonValue::Object(o) => o,
            _ => unreachable!(),
        }
    }

    #[test]
    fn binary_reads_are_bounds_checked() {
        let bytes = [0u8, 0, 0x27, 0x0a, 0xe8, 0x03, 0, 0];
        assert_eq!(expect_i32_be(&bytes, 0), Ok(9994));
        assert_eq!(expect_i32_le(&bytes, 4), Ok(1000));
        assert!(expect_i32_le(&bytes, 6).is_err());
        assert!(expect_f64_le(&bytes, usize::MAX).is_err());
        assert_eq!(expect_words_be(&bytes, 0), Ok(19988));
    }

    #[test]
    fn negative_counts_are_rejected() {
        let bytes = (-1i32).to_le_bytes();
        assert!(expect_count_le(&bytes, 0).is_err());
    }

    #[test]
    fn crs_member() {
        let m = members(json!({"crs": {"type": "name", "properties": {"name": "EPSG:3857"}}}));
        assert_eq!(get_crs(Some(&m)), Ok(Crs::Epsg(3857)));
        assert_eq!(get_crs(None), Ok(Crs::Undefined));
        let linked = members(json!({"crs": {"type": "link", "properties": {"href": "x"}}}));
        assert_eq!(get_crs(Some(&linked)), Ok(Crs::Undefined));
        let bad = members(json!({"crs": 3}));
        assert!(get_crs(Some(&bad)).is_err());
        let unknown = members(json!({"crs": {"type": "name", "properties": {"name": "foo"}}}));
        assert_eq!(get_crs(Some(&unknown)), Err(ReadErrorKind::UnknownProjection));
    }
}
