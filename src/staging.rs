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

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::TempDir;

use crate::{Error, Result, UploadBundle, UploadEntry};

/// Temporary directory holding the files of one shapefile upload.
///
/// The directory and everything written into it is removed when the value
/// is dropped or [`close`](StagingArea::close)d.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    /// Create a fresh, uniquely named directory in the system temp dir.
    pub fn acquire() -> Result<Self> {
        StagingArea::acquire_in(&std::env::temp_dir())
    }

    /// Create a fresh, uniquely named directory under `root`.
    pub fn acquire_in(root: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("geoupload-")
            .tempdir_in(root)
            .map_err(|e| Error::staging(root, e))?;
        debug!("acquired staging area {}", dir.path().display());
        Ok(StagingArea { dir })
    }

    /// Run `f` with a fresh staging area, releasing it on every exit path.
    pub fn scoped<T, F>(f: F) -> Result<T>
    where
        F: FnOnce(&StagingArea) -> Result<T>,
    {
        StagingArea::scoped_in(&std::env::temp_dir(), f)
    }

    /// [`scoped`](StagingArea::scoped) with the area created under `root`.
    pub fn scoped_in<T, F>(root: &Path, f: F) -> Result<T>
    where
        F: FnOnce(&StagingArea) -> Result<T>,
    {
        let area = StagingArea::acquire_in(root)?;
        let out = f(&area);
        let closed = area.close();
        let value = out?;
        closed?;
        Ok(value)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write an entry verbatim under its own base name.
    pub fn write_entry(&self, entry: &UploadEntry) -> Result<PathBuf> {
        let file_name = Path::new(entry.name())
            .file_name()
            .ok_or_else(|| {
                Error::staging(
                    self.path().join(entry.name()),
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "entry name has no file name component",
                    ),
                )
            })?;
        let target = self.path().join(file_name);
        fs::write(&target, entry.bytes()).map_err(|e| Error::staging(&target, e))?;
        Ok(target)
    }

    /// Write every entry of `bundle` and return the path of `primary`.
    pub fn stage_bundle(&self, bundle: &UploadBundle, primary: &UploadEntry) -> Result<PathBuf> {
        let mut primary_path = None;
        for entry in bundle.entries() {
            let path = self.write_entry(entry)?;
            if std::ptr::eq(entry, primary) {
                primary_path = Some(path);
            }
        }
        match primary_path {
            Some(p) => Ok(p),
            None => self.write_entry(primary),
        }
    }

    /// Release the directory, reporting cleanup failures.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| Error::staging(&path, e))?;
        debug!("released staging area {}", path.display());
        Ok(())
    }
}
