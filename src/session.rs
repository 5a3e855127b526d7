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

use log::{debug, warn};

use crate::{Pipeline, RenderableLayer, Result, Stage, Step, UploadBundle};

/// The map that displays uploaded layers.
pub trait MapHost {
    fn mount_layer(&mut self, layer: RenderableLayer);
    fn unmount_previous_layer(&mut self);
}

/// Feeds uploads through a pipeline into a [`MapHost`].
///
/// A successful upload replaces the layer currently shown; a failed one
/// leaves the host as it was.
#[derive(Debug)]
pub struct UploadSession<H> {
    pipeline: Pipeline,
    host: H,
    stage: Stage,
}

impl<H: MapHost> UploadSession<H> {
    pub fn new(pipeline: Pipeline, host: H) -> Self {
        UploadSession {
            pipeline,
            host,
            stage: Stage::Idle,
        }
    }

    /// State of the latest upload.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn handle_upload(&mut self, bundle: &UploadBundle) -> Result<()> {
        let stage = &mut self.stage;
        let result = self
            .pipeline
            .process_observed(bundle, |step| *stage = Stage::Running(step));

        match result {
            Ok(layer) => {
                debug!("mounting layer of {} features", layer.len());
                self.host.unmount_previous_layer();
                self.host.mount_layer(layer);
                self.stage = Stage::Mounted;
                Ok(())
            }
            Err(e) => {
                let step = match self.stage {
                    Stage::Running(step) => step,
                    _ => Step::Classifying,
                };
                warn!("upload failed while {}: {}", step, e);
                self.stage = Stage::Failed(step);
                Err(e)
            }
        }
    }
}
