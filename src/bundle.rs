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

use std::path::Path;

/// Role an uploaded file plays, derived from its extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryRole {
    /// `.geojson` or `.json`
    Document,
    /// `.shp`
    ShapeGeometry,
    /// `.shx`
    ShapeIndex,
    /// `.dbf`
    AttributeTable,
    /// `.prj`
    Projection,
    /// `.cpg`
    CodePage,
    Other,
}

impl EntryRole {
    pub fn from_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("geojson") | Some("json") => EntryRole::Document,
            Some("shp") => EntryRole::ShapeGeometry,
            Some("shx") => EntryRole::ShapeIndex,
            Some("dbf") => EntryRole::AttributeTable,
            Some("prj") => EntryRole::Projection,
            Some("cpg") => EntryRole::CodePage,
            _ => EntryRole::Other,
        }
    }

    /// Whether a file of this role can carry the geometry of an upload.
    pub fn is_geometry_bearing(self) -> bool {
        matches!(self, EntryRole::Document | EntryRole::ShapeGeometry)
    }
}

/// One uploaded file.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadEntry {
    name: String,
    bytes: Vec<u8>,
    role: EntryRole,
}

impl UploadEntry {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let role = EntryRole::from_name(&name);
        UploadEntry {
            name,
            bytes: bytes.into(),
            role,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn role(&self) -> EntryRole {
        self.role
    }
}

/// The ordered set of files received by one upload event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UploadBundle {
    entries: Vec<UploadEntry>,
}

impl UploadBundle {
    pub fn new(entries: Vec<UploadEntry>) -> Self {
        UploadBundle { entries }
    }

    /// Bundle holding a single file.
    pub fn single(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        UploadBundle::new(vec![UploadEntry::new(name, bytes)])
    }

    pub fn push(&mut self, entry: UploadEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[UploadEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries playing `role`, in bundle order.
    pub fn find_role(&self, role: EntryRole) -> impl Iterator<Item = &UploadEntry> {
        self.entries.iter().filter(move |e| e.role == role)
    }
}

impl FromIterator<UploadEntry> for UploadBundle {
    fn from_iter<I: IntoIterator<Item = UploadEntry>>(iter: I) -> Self {
        UploadBundle::new(iter.into_iter().collect())
    }
}
