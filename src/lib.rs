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

//! Turn uploaded vector geodata into a renderable map layer.
//!
//! An upload is a bundle of named files: either one GeoJSON document or the
//! component files of a Shapefile (`.shp`, `.shx`, `.dbf`, `.prj`). The
//! pipeline classifies the bundle, reads it into a [`VectorDataset`], moves
//! every coordinate into WGS84 (EPSG:4326) and builds a [`RenderableLayer`]
//! with popup and tooltip configuration for every attribute column.
//!
//! ```no_run
//! use geoupload::{process_upload, UploadBundle};
//!
//! let doc = r#"{"type":"FeatureCollection","features":[]}"#;
//! let layer = process_upload(UploadBundle::single("empty.geojson", doc)).unwrap();
//! assert!(layer.is_empty());
//! ```

mod json {
    pub use serde_json::{Map, Value as JsonValue};
    pub type JsonObject = Map<String, JsonValue>;
}

/// Positions
///
/// [GeoJSON Format Specification § 3.1.1](https://tools.ietf.org/html/rfc7946#section-3.1.1)
pub type Position = Vec<f64>;

pub use crate::json::{JsonObject, JsonValue};

mod error;
pub use crate::error::{Error, PipelineError, ReadErrorKind, Result};

mod bundle;
pub use crate::bundle::{EntryRole, UploadBundle, UploadEntry};

mod classify;
pub use crate::classify::{classify, Classification};

mod staging;
pub use crate::staging::StagingArea;

mod crs;
pub use crate::crs::{Crs, WGS84};

mod dataset;
pub use crate::dataset::{Feature, VectorDataset};

mod util;
mod shp;
mod dbf;

mod reader;
pub use crate::reader::{read, ReaderConfig, Source};

mod normalize;
pub use crate::normalize::{normalize, reproject, Transformer};

mod layer;
pub use crate::layer::{
    build, LayerBuilder, LayerFeature, LayerStyle, PopupConfig, RenderableLayer, TooltipConfig,
    Warning, GEOMETRY_ALIASES, TOOLTIP_CSS,
};

mod pipeline;
pub use crate::pipeline::{process_upload, Pipeline, PipelineConfig, Stage, Step};

mod session;
pub use crate::session::{MapHost, UploadSession};

mod geocode;
pub use crate::geocode::{
    map_center, seed_markers, Capital, CityMarker, Geocoder, MarkerIcon, Place, CAPITALS,
};

#[cfg(test)]
mod test_support;
