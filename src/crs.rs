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

/// Coordinate reference system tag of a dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Crs {
    /// The source declared nothing.
    Undefined,
    /// An EPSG authority code.
    Epsg(u32),
}

/// The rendering CRS.
pub const WGS84: Crs = Crs::Epsg(4326);

const WEB_MERCATOR: &str =
    "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs";

impl Crs {
    pub fn is_defined(self) -> bool {
        !matches!(self, Crs::Undefined)
    }

    pub fn epsg(self) -> Option<u32> {
        match self {
            Crs::Epsg(code) => Some(code),
            Crs::Undefined => None,
        }
    }

    /// Whether coordinates are longitude/latitude degrees.
    pub fn is_geographic(self) -> bool {
        self.proj_definition()
            .map_or(false, |def| def.contains("+proj=longlat") || def.contains("+proj=latlong"))
    }

    /// proj string of the system, looked up in the EPSG registry. Web
    /// Mercator and its legacy aliases use a spherical definition without
    /// grid shift.
    pub fn proj_definition(self) -> Option<&'static str> {
        match self.epsg()? {
            3857 | 900913 | 102100 | 102113 => Some(WEB_MERCATOR),
            code => u16::try_from(code)
                .ok()
                .and_then(crs_definitions::from_code)
                .map(|def| def.proj4),
        }
    }

    /// Read the CRS out of a `.prj` file (WKT1, ESRI WKT or WKT2).
    ///
    /// The outermost authority wins; ESRI files without one are matched by
    /// their coordinate system name.
    pub fn from_wkt(wkt: &str) -> Option<Crs> {
        if let Some(code) = last_epsg_authority(wkt) {
            return Some(Crs::Epsg(code));
        }
        let name = top_level_name(wkt)?;
        from_known_name(&name).map(Crs::Epsg)
    }

    /// Read the CRS out of a GeoJSON `crs` name such as
    /// `urn:ogc:def:crs:EPSG::3857` or `urn:ogc:def:crs:OGC:1.3:CRS84`.
    pub fn from_name(name: &str) -> Option<Crs> {
        let upper = name.trim().to_ascii_uppercase();
        if upper.ends_with("CRS84") {
            return Some(WGS84);
        }
        if !upper.contains("EPSG") {
            return from_known_name(name).map(Crs::Epsg);
        }
        upper
            .rsplit(':')
            .next()
            .and_then(|code| code.trim().parse().ok())
            .map(Crs::Epsg)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Crs::Undefined => write!(f, "undefined"),
            Crs::Epsg(code) => write!(f, "EPSG:{}", code),
        }
    }
}

// Scan for `AUTHORITY["EPSG","3857"]` (WKT1) and `ID["EPSG",3857]` (WKT2).
fn last_epsg_authority(wkt: &str) -> Option<u32> {
    let upper = wkt.to_ascii_uppercase();
    let mut found = None;
    for keyword in ["AUTHORITY[", "ID["] {
        let mut from = 0;
        while let Some(pos) = upper[from..].find(keyword) {
            let start = from + pos;
            from = start + keyword.len();
            let standalone = upper[..start]
                .chars()
                .next_back()
                .map_or(true, |c| !(c.is_ascii_alphanumeric() || c == '_'));
            if !standalone {
                continue;
            }
            let Some(body) = upper[from..].split(']').next() else {
                continue;
            };
            let mut parts = body.split(',').map(|p| p.trim().trim_matches('"').trim());
            if parts.next() != Some("EPSG") {
                continue;
            }
            if let Some(code) = parts.next().and_then(|c| c.parse::<u32>().ok()) {
                if found.map_or(true, |(at, _)| start > at) {
                    found = Some((start, code));
                }
            }
        }
    }
    found.map(|(_, code)| code)
}

// The first quoted string of the WKT, i.e. the outer system's name.
fn top_level_name(wkt: &str) -> Option<String> {
    let start = wkt.find('"')? + 1;
    let len = wkt[start..].find('"')?;
    Some(wkt[start..start + len].to_owned())
}

fn from_known_name(name: &str) -> Option<u32> {
    let mut key = String::with_capacity(name.len());
    for c in name.trim().chars() {
        let c = if c.is_ascii_alphanumeric() {
            c.to_ascii_lowercase()
        } else {
            '_'
        };
        if !(c == '_' && key.ends_with('_')) {
            key.push(c);
        }
    }
    let key = key.trim_matches('_');

    let code = match key {
        "gcs_wgs_1984" | "wgs_84" | "wgs84" | "wgs_1984" => 4326,
        "gcs_north_american_1983" | "nad83" => 4269,
        "gcs_etrs_1989" | "etrs89" => 4258,
        "wgs_1984_web_mercator_auxiliary_sphere"
        | "wgs_1984_web_mercator"
        | "web_mercator"
        | "wgs_84_pseudo_mercator"
        | "pseudo_mercator" => 3857,
        "wgs_1984_world_mercator" | "wgs_84_world_mercator" => 3395,
        "etrs_1989_laea" | "etrs89_laea_europe" | "etrs_1989_laea_europe" => 3035,
        "rgf_1993_lambert_93" | "rgf93_lambert_93" => 2154,
        "british_national_grid" | "osgb_1936_british_national_grid" => 27700,
        _ => return utm_zone(key),
    };
    Some(code)
}

// `wgs_1984_utm_zone_33n` / `wgs_84_utm_zone_33s`
fn utm_zone(key: &str) -> Option<u32> {
    let rest = key
        .strip_prefix("wgs_1984_utm_zone_")
        .or_else(|| key.strip_prefix("wgs_84_utm_zone_"))?;
    let (digits, hemisphere) = rest.split_at(rest.len().checked_sub(1)?);
    let zone: u32 = digits.parse().ok()?;
    if !(1..=60).contains(&zone) {
        return None;
    }
    match hemisphere {
        "n" => Some(32600 + zone),
        "s" => Some(32700 + zone),
        _ => None,
    }
}
