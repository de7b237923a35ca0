// Copyright (c) 2024-2025 Federico G. Schwindt <fgsch@lodoss.net>
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use std::{
    ffi::OsString,
    fs::File,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("create on {path} failed: {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("rename from {path} to {target} failed: {source}")]
    Rename {
        path: String,
        target: String,
        #[source]
        source: std::io::Error,
    },
    #[error("read on {path} failed: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("write to {path} failed: {source}")]
    Write {
        path: String,
        #[source]
        source: cancelable_writer::WriteError,
    },
}

/// Staging file next to the final destination, removed on drop unless
/// committed or explicitly kept.
pub struct PartFile {
    file: File,
    path: PathBuf,
    final_path: PathBuf,
    delete_on_drop: bool,
}

impl PartFile {
    pub fn create(final_path: &Path) -> Result<Self, OutputError> {
        let path = part_path(final_path);
        let file = File::create(&path).map_err(|source| OutputError::Create {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            file,
            path,
            final_path: final_path.to_path_buf(),
            delete_on_drop: true,
        })
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Leave the partial file on disk when dropped.
    pub fn keep(mut self) {
        self.delete_on_drop = false;
    }

    /// Sync the staged data and move it over the final destination.
    pub fn commit(mut self) -> Result<PathBuf, OutputError> {
        let rename_error = |source| OutputError::Rename {
            path: self.path.display().to_string(),
            target: self.final_path.display().to_string(),
            source,
        };
        self.file.sync_all().map_err(rename_error)?;
        match std::fs::remove_file(&self.final_path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(rename_error(err)),
        }
        std::fs::rename(&self.path, &self.final_path).map_err(rename_error)?;
        self.delete_on_drop = false;
        Ok(self.final_path.clone())
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if self.delete_on_drop {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

fn part_path(final_path: &Path) -> PathBuf {
    let mut name = final_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".part");
    final_path.with_file_name(name)
}
