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

use std::{fs::File, io, ops::Range, path::Path};

use memmap2::{Mmap, MmapOptions};

/// Read-only mapping of a whole archive file.
#[derive(Debug)]
pub(crate) struct MappedFile {
    mmap: Mmap,
}

impl MappedFile {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        // Archives are treated as immutable while mounted.
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        Ok(Self { mmap })
    }

    pub fn data(&self) -> &[u8] {
        self.mmap.as_ref()
    }

    /// Bytes in `offset..offset + size`, or `None` when the range leaves the
    /// mapping.
    pub fn slice(&self, offset: u64, size: u64) -> Option<&[u8]> {
        let range = to_range(offset, size)?;
        self.data().get(range)
    }
}

fn to_range(offset: u64, size: u64) -> Option<Range<usize>> {
    let from = usize::try_from(offset).ok()?;
    let to = from.checked_add(usize::try_from(size).ok()?)?;

    Some(from..to)
}
