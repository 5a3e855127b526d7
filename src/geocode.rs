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

//! Fixed city markers placed on the map next to uploaded layers.

use geojson::Geometry;
use log::warn;

/// A resolved place name.
#[derive(Clone, Debug, PartialEq)]
pub struct Place {
    pub lat: f64,
    pub lon: f64,
    pub boundary: Option<Geometry>,
}

/// Resolves free-text place names.
pub trait Geocoder {
    fn lookup(&self, place: &str) -> Option<Place>;
}

impl<F> Geocoder for F
where
    F: Fn(&str) -> Option<Place>,
{
    fn lookup(&self, place: &str) -> Option<Place> {
        self(place)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capital {
    pub name: &'static str,
    pub population: u64,
}

pub const CAPITALS: [Capital; 8] = [
    Capital { name: "London", population: 8_961_989 },
    Capital { name: "Paris", population: 2_140_526 },
    Capital { name: "Madrid", population: 3_266_126 },
    Capital { name: "Berlin", population: 3_769_495 },
    Capital { name: "Rome", population: 2_872_800 },
    Capital { name: "Athens", population: 6_640_466 },
    Capital { name: "Vienna", population: 1_911_191 },
    Capital { name: "Amsterdam", population: 873_555 },
];

/// Icon of a highlighted marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkerIcon {
    pub color: &'static str,
    pub icon: &'static str,
}

fn icon_for(city: &str) -> Option<MarkerIcon> {
    let (color, icon) = match city {
        "London" => ("orange", "cloud"),
        "Paris" => ("red", "heart"),
        "Rome" => ("green", "heart"),
        "Vienna" => ("darkpurple", "heart"),
        _ => return None,
    };
    Some(MarkerIcon { color, icon })
}

/// A capital placed on the map. Tooltip and popup show the city name.
#[derive(Clone, Debug, PartialEq)]
pub struct CityMarker {
    pub name: String,
    pub population: u64,
    pub lat: f64,
    pub lon: f64,
    pub boundary: Option<Geometry>,
    /// `None` uses the host's default marker.
    pub icon: Option<MarkerIcon>,
}

impl CityMarker {
    /// `[lat, lon, weight]` for a population heat map.
    pub fn heat_point(&self) -> [f64; 3] {
        [self.lat, self.lon, self.population as f64]
    }
}

/// Resolve every entry of [`CAPITALS`], in list order. Cities the geocoder
/// cannot place are left out.
pub fn seed_markers<G>(geocoder: &G) -> Vec<CityMarker>
where
    G: Geocoder + ?Sized,
{
    CAPITALS
        .iter()
        .filter_map(|capital| match geocoder.lookup(capital.name) {
            Some(place) => Some(CityMarker {
                name: capital.name.to_owned(),
                population: capital.population,
                lat: place.lat,
                lon: place.lon,
                boundary: place.boundary,
                icon: icon_for(capital.name),
            }),
            None => {
                warn!("could not geocode '{}', skipping its marker", capital.name);
                None
            }
        })
        .collect()
}

/// Mean `(lat, lon)` of the markers, where the map opens.
pub fn map_center(markers: &[CityMarker]) -> Option<(f64, f64)> {
    if markers.is_empty() {
        return None;
    }
    let n = markers.len() as f64;
    let (lat, lon) = markers
        .iter()
        .fold((0., 0.), |(lat, lon), m| (lat + m.lat, lon + m.lon));
    Some((lat / n, lon / n))
}

#[cfg(test)]
mod tests {
    use super::{map_center, seed_markers, Geocoder, Place, CAPITALS};

    fn gazetteer(name: &str) -> Option<Place> {
        let (lat, lon) = match name {
            "London" => (51.5074, -0.1278),
            "Paris" => (48.8566, 2.3522),
            "Madrid" => (40.4168, -3.7038),
            "Berlin" => (52.52, 13.405),
            "Rome" => (41.9028, 12.4964),
            "Athens" => (37.9838, 23.7275),
            "Vienna" => (48.2082, 16.3738),
            _ => return None,
        };
        Some(Place {
            lat,
            lon,
            boundary: None,
        })
    }

    #[test]
    fn unresolved_cities_are_skipped() {
        let markers = seed_markers(&gazetteer);
        assert_eq!(markers.len(), CAPITALS.len() - 1);
        assert!(markers.iter().all(|m| m.name != "Amsterdam"));
        assert_eq!(markers[0].name, "London");
        assert_eq!(markers[0].population, 8_961_989);
        assert_eq!(markers[0].icon.map(|i| i.color), Some("orange"));
        assert_eq!(markers[2].icon, None);
        assert_eq!(markers[6].heat_point(), [48.2082, 16.3738, 1_911_191.0]);
    }

    #[test]
    fn center_is_the_mean() {
        let lookup = |name: &str| match name {
            "Paris" => Some(Place { lat: 40.0, lon: 0.0, boundary: None }),
            "Rome" => Some(Place { lat: 50.0, lon: 10.0, boundary: None }),
            _ => None,
        };
        let markers = seed_markers(&lookup);
        assert_eq!(map_center(&markers), Some((45.0, 5.0)));
        assert_eq!(map_center(&[]), None);
    }

    #[test]
    fn trait_objects_work() {
        let geocoder: &dyn Geocoder = &gazetteer;
        assert!(geocoder.lookup("Berlin").is_some());
        assert_eq!(seed_markers(geocoder).len(), 7);
    }
}
