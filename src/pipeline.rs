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
use std::path::PathBuf;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    classify, normalize, read, Classification, Error, LayerBuilder, LayerStyle, ReaderConfig,
    RenderableLayer, Result, Source, StagingArea, UploadBundle, TOOLTIP_CSS,
};

/// Settings of a [`Pipeline`]. Keys missing from a JSON document fall back
/// to their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub reader: ReaderConfig,
    pub style: LayerStyle,
    pub tooltip_css: String,
    /// Parent directory of staging areas; the system temp dir when unset.
    pub staging_root: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            reader: ReaderConfig::default(),
            style: LayerStyle::default(),
            tooltip_css: TOOLTIP_CSS.to_owned(),
            staging_root: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

/// Steps of one upload, in order. `Staging` only runs for shapefiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    Classifying,
    Staging,
    Reading,
    Normalizing,
    Building,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Step::Classifying => "classifying",
            Step::Staging => "staging",
            Step::Reading => "reading",
            Step::Normalizing => "normalizing",
            Step::Building => "building",
        };
        f.write_str(name)
    }
}

/// State of the latest upload event. `Mounted` and `Failed` are final.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    Running(Step),
    Mounted,
    Failed(Step),
}

/// Classify, read, normalize and build, once per upload.
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    config: PipelineConfig,
    builder: LayerBuilder,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let builder = LayerBuilder::new(config.style.clone(), config.tooltip_css.clone());
        Pipeline { config, builder }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn process(&self, bundle: &UploadBundle) -> Result<RenderableLayer> {
        self.process_observed(bundle, |_| {})
    }

    /// Like [`process`](Pipeline::process), calling `on_step` as each step
    /// starts. On error the last reported step is the one that failed.
    pub fn process_observed<F>(
        &self,
        bundle: &UploadBundle,
        mut on_step: F,
    ) -> Result<RenderableLayer>
    where
        F: FnMut(Step),
    {
        let mut enter = |step: Step| {
            debug!("upload step: {}", step);
            on_step(step);
        };

        enter(Step::Classifying);
        let dataset = match classify(bundle) {
            Classification::Unsupported => return Err(Error::UnsupportedFormat),
            Classification::SingleDocument { entry } => {
                enter(Step::Reading);
                let source = Source::Document {
                    name: entry.name(),
                    bytes: entry.bytes(),
                };
                read(source, &self.config.reader)?
            }
            Classification::ShapefileBundle { primary } => {
                enter(Step::Staging);
                let root = self
                    .config
                    .staging_root
                    .clone()
                    .unwrap_or_else(std::env::temp_dir);
                StagingArea::scoped_in(&root, |area| {
                    let path = area.stage_bundle(bundle, primary)?;
                    enter(Step::Reading);
                    read(Source::Shapefile { path: &path }, &self.config.reader)
                })?
            }
        };

        enter(Step::Normalizing);
        let dataset = normalize(dataset)?;

        enter(Step::Building);
        Ok(self.builder.build(dataset))
    }
}

/// Run an upload through a pipeline with default settings.
pub fn process_upload(bundle: UploadBundle) -> Result<RenderableLayer> {
    Pipeline::default().process(&bundle)
}
