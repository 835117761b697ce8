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

use std::{
    fmt,
    path::{Path, PathBuf},
};

use crate::ArchiveError;

/// Opaque handle of a file inside one archive. Only meaningful for the
/// archive that produced it.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct EntryId(u32);

impl EntryId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0 as _
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: String,
    pub id: EntryId,
}

/// A container of named files.
///
/// Entries are listed once when the archive is opened. `extract` must be
/// callable repeatedly and from several threads at once; implementations
/// that can't read concurrently have to serialize access themselves.
pub trait Archive: Send + Sync + fmt::Debug {
    /// Location the archive was opened from, for diagnostics.
    fn source(&self) -> &Path;
    fn entries(&self) -> &[Entry];
    fn extract(&self, id: EntryId) -> Result<Vec<u8>, ArchiveError>;
}

/// Archive held entirely in memory. Handy for tests and for content
/// generated at runtime.
#[derive(Debug, Default)]
pub struct MemoryArchive {
    source: PathBuf,
    entries: Vec<Entry>,
    data: Vec<Vec<u8>>,
}

impl MemoryArchive {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn with_file(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.add_file(path, data);
        self
    }

    pub fn add_file(&mut self, path: &str, data: impl Into<Vec<u8>>) {
        let id = EntryId::new(self.data.len() as _);
        self.data.push(data.into());
        self.entries.push(Entry {
            path: path.into(),
            id,
        });
    }
}

impl Archive for MemoryArchive {
    fn source(&self) -> &Path {
        &self.source
    }

    fn entries(&self) -> &[Entry] {
        &self.entries
    }

    fn extract(&self, id: EntryId) -> Result<Vec<u8>, ArchiveError> {
        self.data
            .get(id.index())
            .cloned()
            .ok_or(ArchiveError::EntryNotFound(id))
    }
}
