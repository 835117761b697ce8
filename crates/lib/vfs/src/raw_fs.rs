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
    fs,
    path::{Path, PathBuf},
};

use log::warn;

use crate::{Archive, ArchiveError, Entry, EntryId};

/// Loose files on disk, used as a patch directory on top of packed
/// archives. The file list is captured when the directory is opened.
#[derive(Debug)]
pub struct RawFsArchive {
    root: PathBuf,
    entries: Vec<Entry>,
}

impl RawFsArchive {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ArchiveError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ArchiveError::InvalidFormat);
        }
        let mut names = Vec::new();
        collect_files(&root, &root, &mut names)?;
        names.sort();

        let entries = names
            .into_iter()
            .enumerate()
            .map(|(index, path)| Entry {
                path,
                id: EntryId::new(index as _),
            })
            .collect();

        Ok(Self { root, entries })
    }
}

fn collect_files(
    root: &Path,
    current: &Path,
    names: &mut Vec<String>,
) -> Result<(), ArchiveError> {
    for path in fs::read_dir(current)? {
        let path = path?.path();
        if path.is_symlink() {
            continue;
        }
        if path.is_dir() {
            collect_files(root, &path, names)?;
        } else if path.is_file() {
            match relative_name(root, &path) {
                Some(name) => names.push(name),
                None => warn!("Skipping {:?}: name isn't valid UTF-8", path),
            }
        }
    }

    Ok(())
}

fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut segments = Vec::new();
    for component in relative.components() {
        segments.push(component.as_os_str().to_str()?);
    }

    Some(segments.join("/"))
}

impl Archive for RawFsArchive {
    fn source(&self) -> &Path {
        &self.root
    }

    fn entries(&self) -> &[Entry] {
        &self.entries
    }

    fn extract(&self, id: EntryId) -> Result<Vec<u8>, ArchiveError> {
        let entry = self
            .entries
            .get(id.index())
            .ok_or(ArchiveError::EntryNotFound(id))?;

        Ok(fs::read(self.root.join(&entry.path))?)
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use tempfile::TempDir;

    use super::RawFsArchive;
    use crate::{Archive, ArchiveError};

    #[test]
    fn lists_nested_files_with_forward_slashes() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("textures/walls")).unwrap();
        fs::write(dir.path().join("textures/walls/brick.tga"), b"brick").unwrap();
        fs::write(dir.path().join("default.cfg"), b"cfg").unwrap();

        let archive = RawFsArchive::open(dir.path()).unwrap();
        let names = archive
            .entries()
            .iter()
            .map(|entry| entry.path.as_str())
            .collect::<Vec<_>>();
        assert_eq!(vec!["default.cfg", "textures/walls/brick.tga"], names);

        let brick = &archive.entries()[1];
        assert_eq!(b"brick".to_vec(), archive.extract(brick.id).unwrap());
    }

    #[test]
    fn removed_file_fails_to_extract() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("gone.txt"), b"soon").unwrap();
        let archive = RawFsArchive::open(dir.path()).unwrap();
        fs::remove_file(dir.path().join("gone.txt")).unwrap();

        let id = archive.entries()[0].id;
        assert!(matches!(archive.extract(id), Err(ArchiveError::Io(_))));
    }

    #[test]
    fn not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, b"").unwrap();

        assert!(matches!(
            RawFsArchive::open(&file),
            Err(ArchiveError::InvalidFormat)
        ));
    }
}
