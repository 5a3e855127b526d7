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

use log::warn;

use crate::{EntryRole, UploadBundle, UploadEntry};

/// Which reading path an upload takes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Classification<'a> {
    /// A GeoJSON document, parsed from memory.
    SingleDocument { entry: &'a UploadEntry },
    /// A shapefile component set; `primary` is the `.shp` entry.
    ShapefileBundle { primary: &'a UploadEntry },
    Unsupported,
}

/// Classify a bundle. A `.shp` wins over a document when both are present.
pub fn classify(bundle: &UploadBundle) -> Classification<'_> {
    if let Some(primary) = first_of(bundle, EntryRole::ShapeGeometry) {
        return Classification::ShapefileBundle { primary };
    }
    if let Some(entry) = first_of(bundle, EntryRole::Document) {
        return Classification::SingleDocument { entry };
    }
    Classification::Unsupported
}

fn first_of(bundle: &UploadBundle, role: EntryRole) -> Option<&UploadEntry> {
    let mut candidates = bundle.find_role(role);
    let first = candidates.next()?;
    for ignored in candidates {
        warn!(
            "ignoring '{}', '{}' is already the primary file",
            ignored.name(),
            first.name()
        );
    }
    Some(first)
}
