// Copyright (C) 2023 gigablaster

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use std::{io, path::PathBuf};

use lz4_flex::frame;
use thiserror::Error;

use crate::EntryId;

/// Failures raised by a single archive, either while opening it or while
/// extracting one of its entries.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(io::Error),
    #[error("Not a pak archive")]
    InvalidFormat,
    #[error("Archive version isn't supported")]
    InvalidVersion,
    #[error("Archive is corrupt: {0}")]
    Corrupt(String),
    #[error("Entry {0} not found")]
    EntryNotFound(EntryId),
}

impl From<io::Error> for ArchiveError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<frame::Error> for ArchiveError {
    fn from(value: frame::Error) -> Self {
        match value {
            frame::Error::IoError(err) => Self::Io(err),
            err => Self::Corrupt(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum VfsError {
    #[error("Failed to open archive {path:?}: {source}")]
    ArchiveOpen {
        path: PathBuf,
        #[source]
        source: ArchiveError,
    },
    #[error("Failed to read {path}: {source}")]
    ArchiveRead {
        path: String,
        #[source]
        source: ArchiveError,
    },
    #[error("File {0} not found")]
    FileNotFound(String),
    #[error("Invalid path {0:?}")]
    InvalidPath(String),
    #[error("Path of {len} bytes exceeds the {limit} bytes limit")]
    PathTooLong { len: usize, limit: usize },
    #[error("Can't mount more than {} archives", u32::MAX)]
    TooManyArchives,
    #[error("No archives with prefix {prefix:?} found in {dir:?}")]
    NoArchivesFound { dir: PathBuf, prefix: String },
    #[error("Bad config: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for VfsError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}
