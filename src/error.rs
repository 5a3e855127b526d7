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

/// Error raised by any stage of the upload pipeline.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The bundle holds no `.shp`, `.geojson` or `.json` entry.
    UnsupportedFormat,
    /// Writing to or cleaning up the staging directory failed.
    StagingIo {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The geodata itself is malformed or incomplete.
    Read { file: String, kind: ReadErrorKind },
    /// A coordinate could not be moved into the rendering CRS.
    Reprojection { feature: Option<usize>, detail: String },
}

/// What went wrong while reading a file, see [`Error::Read`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReadErrorKind {
    MalformedDocument(String),
    MissingSidecar(&'static str),
    RecordCountMismatch { geometries: usize, records: usize },
    InvalidShape(String),
    InvalidTable(String),
    UnknownProjection,
    Io(String),
}

/// Shorthand used by the hosting collaborator.
pub type PipelineError = Error;

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn read(file: impl Into<String>, kind: ReadErrorKind) -> Self {
        Error::Read {
            file: file.into(),
            kind,
        }
    }

    pub(crate) fn staging(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::StagingIo {
            path: path.into(),
            source,
        }
    }

    /// The file the error refers to, if any.
    pub fn file(&self) -> Option<&str> {
        match self {
            Error::Read { file, .. } => Some(file),
            _ => None,
        }
    }
}

impl fmt::Display for ReadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ReadErrorKind::MalformedDocument(ref detail) => {
                write!(f, "malformed GeoJSON document: {}", detail)
            }
            ReadErrorKind::MissingSidecar(ext) => write!(f, "missing '.{}' sidecar file", ext),
            ReadErrorKind::RecordCountMismatch {
                geometries,
                records,
            } => write!(
                f,
                "{} geometries but {} attribute records",
                geometries, records
            ),
            ReadErrorKind::InvalidShape(ref detail) => write!(f, "invalid shape data: {}", detail),
            ReadErrorKind::InvalidTable(ref detail) => {
                write!(f, "invalid attribute table: {}", detail)
            }
            ReadErrorKind::UnknownProjection => {
                write!(f, "no EPSG authority found in projection definition")
            }
            ReadErrorKind::Io(ref detail) => write!(f, "I/O error: {}", detail),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::UnsupportedFormat => write!(
                f,
                "Unsupported upload: expected a .geojson, .json or .shp file."
            ),
            Error::StagingIo {
                ref path,
                ref source,
            } => write!(f, "Staging failed for '{}': {}", path.display(), source),
            Error::Read { ref file, ref kind } => write!(f, "Unable to read '{}': {}", file, kind),
            Error::Reprojection {
                feature: Some(ix),
                ref detail,
            } => write!(f, "Reprojection failed at feature {}: {}", ix, detail),
            Error::Reprojection {
                feature: None,
                ref detail,
            } => write!(f, "Reprojection failed: {}", detail),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::StagingIo { source, .. } => Some(source),
            _ => None,
        }
    }
}
