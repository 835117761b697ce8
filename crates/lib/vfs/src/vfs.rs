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

use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::{
    config::{check_extensions, check_path_limit},
    name_tree::split_path,
    scan::find_archives,
    AcceptAll, Archive, ArchiveId, ExtensionFilter, Locator, NameTree, PackedArchive, PathBuffer,
    PathFilter, RawFsArchive, TreeVisitor, VfsConfig, VfsError, DEFAULT_EXTENSION, MAX_PATH_LEN,
};

/// Archive entry that couldn't be merged, because its path is malformed or
/// longer than the limit.
#[derive(Debug)]
pub struct RejectedEntry {
    pub archive: PathBuf,
    pub path: String,
    pub error: VfsError,
}

/// Outcome of mounting a single archive.
#[derive(Debug)]
pub struct MountReport {
    pub id: ArchiveId,
    pub added: usize,
    pub replaced: usize,
    pub rejected: Vec<RejectedEntry>,
}

impl MountReport {
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Outcome of a batch load. Archives that failed to open were skipped, and
/// so were the entries in `rejected`.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, VfsError)>,
    pub rejected: Vec<RejectedEntry>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.rejected.is_empty()
    }

    fn merge(&mut self, other: LoadReport) {
        self.loaded.extend(other.loaded);
        self.failed.extend(other.failed);
        self.rejected.extend(other.rejected);
    }
}

/// Read-only view over a stack of archives. Archives mounted later shadow
/// files with the same path from archives mounted before them.
#[derive(Debug)]
pub struct Vfs {
    archives: Vec<Box<dyn Archive>>,
    tree: NameTree,
    extensions: Vec<String>,
    strict: bool,
}

impl Default for Vfs {
    fn default() -> Self {
        Self {
            archives: Vec::new(),
            tree: NameTree::with_max_path_len(MAX_PATH_LEN),
            extensions: vec![DEFAULT_EXTENSION.into()],
            strict: false,
        }
    }
}

impl Vfs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty vfs that rejects paths longer than `max_path_len` bytes. The
    /// limit must be within `1..=MAX_PATH_LEN`.
    pub fn with_max_path_len(max_path_len: usize) -> Result<Self, VfsError> {
        check_path_limit(max_path_len)?;

        Ok(Self {
            tree: NameTree::with_max_path_len(max_path_len),
            ..Self::default()
        })
    }

    /// Archive extensions used by [`Vfs::add_archives`], without the dot.
    /// Empty accepts any file.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Result<Self, VfsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let extensions = extensions.into_iter().map(Into::into).collect::<Vec<_>>();
        check_extensions(&extensions)?;
        self.extensions = extensions;

        Ok(self)
    }

    /// Mounts every archive in `base_dir` starting with `prefix`, in file
    /// name order.
    pub fn open(base_dir: &Path, prefix: &str) -> Result<(Self, LoadReport), VfsError> {
        let mut vfs = Self::new();
        let report = vfs.add_archives(base_dir, prefix)?;

        Ok((vfs, report))
    }

    pub fn from_config(config: &VfsConfig) -> Result<(Self, LoadReport), VfsError> {
        config.validate()?;
        let mut vfs = Self {
            archives: Vec::new(),
            tree: NameTree::with_max_path_len(config.max_path_len),
            extensions: config.extensions.clone(),
            strict: config.strict,
        };
        let mut report = LoadReport::default();
        if let Some(base_dir) = &config.base_dir {
            report.merge(vfs.add_archives(base_dir, &config.prefix)?);
        }
        for dir in config.patch_dirs.iter() {
            let mounted = vfs.add_directory(dir);
            vfs.record_mount(&mut report, dir, mounted)?;
        }
        if config.require_archives && report.loaded.is_empty() {
            return Err(VfsError::NoArchivesFound {
                dir: config.base_dir.clone().unwrap_or_default(),
                prefix: config.prefix.clone(),
            });
        }

        Ok((vfs, report))
    }

    pub fn add_archive(&mut self, path: &Path) -> Result<MountReport, VfsError> {
        let archive = PackedArchive::open(path).map_err(|source| VfsError::ArchiveOpen {
            path: path.into(),
            source,
        })?;

        self.mount(Box::new(archive))
    }

    /// Mounts matching archives in file name order. Archives that fail to
    /// open are logged, reported and skipped, unless the vfs is strict.
    pub fn add_archives(&mut self, base_dir: &Path, prefix: &str) -> Result<LoadReport, VfsError> {
        let mut report = LoadReport::default();
        for path in find_archives(base_dir, prefix, &self.extensions)? {
            let mounted = self.add_archive(&path);
            self.record_mount(&mut report, &path, mounted)?;
        }
        if report.loaded.is_empty() && report.failed.is_empty() {
            warn!("No archives matching {:?} in {:?}", prefix, base_dir);
        }

        Ok(report)
    }

    /// Mounts a directory of loose files as a patch layer.
    pub fn add_directory(&mut self, path: &Path) -> Result<MountReport, VfsError> {
        let archive = RawFsArchive::open(path).map_err(|source| VfsError::ArchiveOpen {
            path: path.into(),
            source,
        })?;

        self.mount(Box::new(archive))
    }

    /// Merges all entries of `archive` on top of what is already mounted.
    /// Entries with malformed or over-long paths are left out and listed in
    /// [`MountReport::rejected`].
    pub fn mount(&mut self, archive: Box<dyn Archive>) -> Result<MountReport, VfsError> {
        let id = ArchiveId::new(self.archives.len()).ok_or(VfsError::TooManyArchives)?;
        let mut report = MountReport {
            id,
            added: 0,
            replaced: 0,
            rejected: Vec::new(),
        };
        for entry in archive.entries() {
            let locator = Locator {
                archive: id,
                entry: entry.id,
            };
            let inserted =
                split_path(&entry.path).and_then(|segments| self.tree.insert(&segments, locator));
            match inserted {
                Ok(None) => report.added += 1,
                Ok(Some(_)) => report.replaced += 1,
                Err(error) => {
                    warn!("Skipping entry of {:?}: {}", archive.source(), error);
                    report.rejected.push(RejectedEntry {
                        archive: archive.source().into(),
                        path: entry.path.clone(),
                        error,
                    });
                }
            }
        }
        info!(
            "Added archive {:?} with {} files",
            archive.source(),
            report.added + report.replaced
        );
        debug!(
            "{} files of {:?} override earlier archives",
            report.replaced,
            archive.source()
        );
        self.archives.push(archive);

        Ok(report)
    }

    /// Calls `visitor` with the full path of every file.
    pub fn search(&self, visitor: impl FnMut(&str)) -> Result<(), VfsError> {
        self.search_filtered(&AcceptAll, visitor)
    }

    /// Calls `visitor` for files whose extension is exactly `extension`.
    pub fn search_extension(
        &self,
        extension: &str,
        visitor: impl FnMut(&str),
    ) -> Result<(), VfsError> {
        self.search_filtered(&ExtensionFilter::new(extension), visitor)
    }

    /// Calls `visitor` for files whose full path passes `filter`. The path is
    /// only valid during the call.
    pub fn search_filtered<F: PathFilter + ?Sized>(
        &self,
        filter: &F,
        visitor: impl FnMut(&str),
    ) -> Result<(), VfsError> {
        let mut searcher = DirectorySearcher {
            path: PathBuffer::new(self.tree.max_path_len()),
            filter,
            visitor,
        };

        self.tree.traverse(&mut searcher)
    }

    pub fn read_file(&self, path: &str) -> Result<Vec<u8>, VfsError> {
        let locator = self
            .locate(path)?
            .ok_or_else(|| VfsError::FileNotFound(path.into()))?;
        let archive = self
            .archive(locator.archive)
            .ok_or_else(|| VfsError::FileNotFound(path.into()))?;
        debug!("Reading {} from {:?}", path, archive.source());

        archive
            .extract(locator.entry)
            .map_err(|source| VfsError::ArchiveRead {
                path: path.into(),
                source,
            })
    }

    /// Which archive entry currently provides `path`.
    pub fn locate(&self, path: &str) -> Result<Option<Locator>, VfsError> {
        Ok(self.tree.get(&split_path(path)?))
    }

    pub fn contains(&self, path: &str) -> bool {
        matches!(self.locate(path), Ok(Some(_)))
    }

    pub fn archive(&self, id: ArchiveId) -> Option<&dyn Archive> {
        self.archives.get(id.index()).map(|archive| archive.as_ref())
    }

    pub fn archive_count(&self) -> usize {
        self.archives.len()
    }

    pub fn file_count(&self) -> usize {
        self.tree.len()
    }

    /// Folds one mount into a batch report. A strict vfs fails on the first
    /// archive that didn't open or the first entry that was rejected.
    fn record_mount(
        &self,
        report: &mut LoadReport,
        path: &Path,
        mounted: Result<MountReport, VfsError>,
    ) -> Result<(), VfsError> {
        let mount = match mounted {
            Ok(mount) => mount,
            Err(err) => return self.skip_failed(report, path, err),
        };
        report.loaded.push(path.into());
        let mut rejected = mount.rejected.into_iter();
        if self.strict {
            if let Some(entry) = rejected.next() {
                return Err(entry.error);
            }
        }
        report.rejected.extend(rejected);

        Ok(())
    }

    fn skip_failed(
        &self,
        report: &mut LoadReport,
        path: &Path,
        err: VfsError,
    ) -> Result<(), VfsError> {
        if self.strict {
            return Err(err);
        }
        error!("Failed to add archive {:?} - {}", path, err);
        report.failed.push((path.into(), err));

        Ok(())
    }
}

struct DirectorySearcher<'a, F: ?Sized, V> {
    path: PathBuffer,
    filter: &'a F,
    visitor: V,
}

impl<'a, F, V> TreeVisitor for DirectorySearcher<'a, F, V>
where
    F: PathFilter + ?Sized,
    V: FnMut(&str),
{
    fn enter(&mut self, name: &str) -> Result<(), VfsError> {
        self.path.push_dir(name)
    }

    fn leave(&mut self, name: &str) {
        self.path.pop_dir(name);
    }

    fn visit(&mut self, name: &str, _locator: Locator) -> Result<(), VfsError> {
        let filter = self.filter;
        let visitor = &mut self.visitor;
        self.path.with_file(name, |path| {
            if filter.accept(path) {
                visitor(path);
            }
        })
    }
}
