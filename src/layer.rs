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

//! Turn a normalized dataset into a styled layer with tooltips and popups.

use std::fmt;

use geojson::{FeatureCollection, Geometry};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::json::{JsonObject, JsonValue};
use crate::{Crs, VectorDataset};

/// Column names that hold geometry in common exports; never shown as fields.
pub const GEOMETRY_ALIASES: [&str; 4] = ["geometry", "geom", "the_geom", "wkb_geometry"];

/// Inline CSS applied to tooltips.
pub const TOOLTIP_CSS: &str = "background-color: grey; color: white; font-family: courier new; font-size: 24px; padding: 10px;";

/// Constant style shared by every feature of a layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerStyle {
    pub fill_color: String,
    pub color: String,
    pub weight: f64,
    pub fill_opacity: f64,
}

impl Default for LayerStyle {
    fn default() -> Self {
        LayerStyle {
            fill_color: "#ff0000".to_owned(),
            color: "#000000".to_owned(),
            weight: 1.0,
            fill_opacity: 0.5,
        }
    }
}

impl LayerStyle {
    fn to_json(&self) -> JsonValue {
        json!({
            "fillColor": self.fill_color,
            "color": self.color,
            "weight": self.weight,
            "fillOpacity": self.fill_opacity,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TooltipConfig {
    pub fields: Vec<String>,
    pub style: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PopupConfig {
    pub fields: Vec<String>,
}

/// Non-fatal findings attached to a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Warning {
    /// The upload was valid but held no features.
    EmptyResult,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Warning::EmptyResult => f.write_str("the upload contains no features"),
        }
    }
}

/// One feature ready for display.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerFeature {
    geometry: Option<Geometry>,
    properties: JsonObject,
    popup: String,
}

impl LayerFeature {
    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    /// Values of the layer fields, in field order.
    pub fn properties(&self) -> &JsonObject {
        &self.properties
    }

    /// `field: value` lines joined by `<br>`, HTML-escaped.
    pub fn popup(&self) -> &str {
        &self.popup
    }
}

/// The layer handed to a map host. Read-only once built.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderableLayer {
    features: Vec<LayerFeature>,
    tooltip: TooltipConfig,
    popup: PopupConfig,
    style: LayerStyle,
    warnings: Vec<Warning>,
    crs: Crs,
}

impl RenderableLayer {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[LayerFeature] {
        &self.features
    }

    pub fn fields(&self) -> &[String] {
        &self.tooltip.fields
    }

    pub fn tooltip(&self) -> &TooltipConfig {
        &self.tooltip
    }

    pub fn popup(&self) -> &PopupConfig {
        &self.popup
    }

    pub fn style(&self) -> &LayerStyle {
        &self.style
    }

    /// Style of one feature. Every feature shares the layer style.
    pub fn style_for(&self, _feature: &LayerFeature) -> &LayerStyle {
        &self.style
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    /// Export as a FeatureCollection. Style, tooltip and popup settings are
    /// carried as foreign members, each feature's popup text too.
    pub fn to_geojson(&self) -> FeatureCollection {
        let features = self
            .features
            .iter()
            .map(|f| {
                let mut foreign = JsonObject::new();
                foreign.insert("popup".to_owned(), JsonValue::from(f.popup.as_str()));
                geojson::Feature {
                    bbox: None,
                    geometry: f.geometry.clone(),
                    id: None,
                    properties: Some(f.properties.clone()),
                    foreign_members: Some(foreign),
                }
            })
            .collect();

        let mut foreign = JsonObject::new();
        foreign.insert("style".to_owned(), self.style.to_json());
        foreign.insert(
            "tooltip".to_owned(),
            json!({ "fields": self.tooltip.fields, "style": self.tooltip.style }),
        );
        foreign.insert("popup".to_owned(), json!({ "fields": self.popup.fields }));

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign),
        }
    }
}

fn is_geometry_alias(name: &str) -> bool {
    GEOMETRY_ALIASES
        .iter()
        .any(|alias| alias.eq_ignore_ascii_case(name))
}

fn render_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

// Popups are rendered as markup; uploaded names and values are escaped.
fn popup_text(fields: &[String], properties: &JsonObject) -> String {
    fields
        .iter()
        .map(|field| {
            let value = properties.get(field).map(render_value).unwrap_or_default();
            format!("{}: {}", escape_html(field), escape_html(&value))
        })
        .collect::<Vec<_>>()
        .join("<br>")
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayerBuilder {
    style: LayerStyle,
    tooltip_css: String,
}

impl Default for LayerBuilder {
    fn default() -> Self {
        LayerBuilder::new(LayerStyle::default(), TOOLTIP_CSS)
    }
}

impl LayerBuilder {
    pub fn new(style: LayerStyle, tooltip_css: impl Into<String>) -> Self {
        LayerBuilder {
            style,
            tooltip_css: tooltip_css.into(),
        }
    }

    pub fn build(&self, dataset: VectorDataset) -> RenderableLayer {
        let fields: Vec<String> = dataset
            .schema()
            .iter()
            .filter(|name| !is_geometry_alias(name))
            .cloned()
            .collect();
        let crs = dataset.crs();

        let features: Vec<LayerFeature> = dataset
            .into_features()
            .into_iter()
            .map(|f| {
                let mut attributes = f.attributes;
                let properties: JsonObject = fields
                    .iter()
                    .map(|name| {
                        let value = attributes.remove(name).unwrap_or(JsonValue::Null);
                        (name.clone(), value)
                    })
                    .collect();
                LayerFeature {
                    popup: popup_text(&fields, &properties),
                    geometry: f.geometry,
                    properties,
                }
            })
            .collect();

        let mut warnings = Vec::new();
        if features.is_empty() {
            warn!("building an empty layer");
            warnings.push(Warning::EmptyResult);
        }

        RenderableLayer {
            features,
            tooltip: TooltipConfig {
                fields: fields.clone(),
                style: self.tooltip_css.clone(),
            },
            popup: PopupConfig { fields },
            style: self.style.clone(),
            warnings,
            crs,
        }
    }
}

/// Build with the default style and tooltip CSS.
pub fn build(dataset: VectorDataset) -> RenderableLayer {
    LayerBuilder::default().build(dataset)
}
