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
    io::{Cursor, Read},
    path::{Path, PathBuf},
};

use lz4_flex::frame::FrameDecoder;

use crate::{
    directory::{load_archive_directory, FileHeader, FileSize},
    mmap::MappedFile,
    Archive, ArchiveError, Entry, EntryId,
};

// Unpacked sizes come from the file and aren't trusted for allocation.
const MAX_PREALLOCATION: usize = 1 << 20;

/// Memory mapped `.dess` container.
#[derive(Debug)]
pub struct PackedArchive {
    path: PathBuf,
    file: MappedFile,
    entries: Vec<Entry>,
    headers: Vec<FileHeader>,
}

impl PackedArchive {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = MappedFile::open(path)?;
        let directory = load_archive_directory(&mut Cursor::new(file.data()))?;

        // Sorted so entry ids don't depend on hash order.
        let mut files = directory.into_iter().collect::<Vec<_>>();
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut entries = Vec::with_capacity(files.len());
        let mut headers = Vec::with_capacity(files.len());
        for (index, (path, header)) in files.into_iter().enumerate() {
            entries.push(Entry {
                path,
                id: EntryId::new(index as _),
            });
            headers.push(header);
        }

        Ok(Self {
            path: path.into(),
            file,
            entries,
            headers,
        })
    }

    fn unpack(&self, header: &FileHeader) -> Result<Vec<u8>, ArchiveError> {
        let stored = self
            .file
            .slice(header.offset, header.size.stored())
            .ok_or_else(|| {
                ArchiveError::Corrupt(format!(
                    "entry at {} runs past the end of the file",
                    header.offset
                ))
            })?;
        match header.size {
            FileSize::Raw(_) => Ok(stored.to_vec()),
            FileSize::Compressed(unpacked, _) => {
                let mut data = Vec::with_capacity((unpacked as usize).min(MAX_PREALLOCATION));
                // One byte past the declared size is enough to detect a lie.
                FrameDecoder::new(stored)
                    .take(unpacked as u64 + 1)
                    .read_to_end(&mut data)?;
                if data.len() != unpacked as usize {
                    return Err(ArchiveError::Corrupt(format!(
                        "expected {} bytes, unpacked {}",
                        unpacked,
                        data.len()
                    )));
                }

                Ok(data)
            }
        }
    }
}

impl Archive for PackedArchive {
    fn source(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> &[Entry] {
        &self.entries
    }

    fn extract(&self, id: EntryId) -> Result<Vec<u8>, ArchiveError> {
        let header = self
            .headers
            .get(id.index())
            .ok_or(ArchiveError::EntryNotFound(id))?;

        self.unpack(header)
    }
}
