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

//! Merged namespace of every mounted archive.
//!
//! Nodes only store their own segment name. Full paths are rebuilt by the
//! walker through the [`TreeVisitor`] enter/leave protocol, see
//! [`crate::PathBuffer`].

use std::collections::BTreeMap;

use smol_str::SmolStr;

use crate::{EntryId, VfsError, MAX_PATH_LEN};

/// Position of an archive in the mount order.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ArchiveId(u32);

impl ArchiveId {
    /// `None` once the mount list outgrows the id space.
    pub(crate) fn new(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    pub fn index(&self) -> usize {
        self.0 as _
    }
}

/// Where the winning copy of a file lives.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Locator {
    pub archive: ArchiveId,
    pub entry: EntryId,
}

pub trait TreeVisitor {
    /// Called before the children of directory `name`.
    fn enter(&mut self, name: &str) -> Result<(), VfsError>;
    /// Called after every child of directory `name` was visited.
    fn leave(&mut self, name: &str);
    fn visit(&mut self, name: &str, locator: Locator) -> Result<(), VfsError>;
}

#[derive(Debug, Default)]
struct DirectoryNode {
    directories: BTreeMap<SmolStr, DirectoryNode>,
    files: BTreeMap<SmolStr, Locator>,
}

enum Step<'a> {
    Enter(&'a str, &'a DirectoryNode),
    Leave(&'a str),
}

#[derive(Debug)]
pub struct NameTree {
    root: DirectoryNode,
    count: usize,
    max_path_len: usize,
}

impl Default for NameTree {
    fn default() -> Self {
        Self::with_max_path_len(MAX_PATH_LEN)
    }
}

impl NameTree {
    /// `max_path_len` is clamped to [`MAX_PATH_LEN`].
    pub fn with_max_path_len(max_path_len: usize) -> Self {
        Self {
            root: DirectoryNode::default(),
            count: 0,
            max_path_len: max_path_len.min(MAX_PATH_LEN),
        }
    }

    pub fn max_path_len(&self) -> usize {
        self.max_path_len
    }

    /// Number of distinct file paths.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Sets the locator of a file, creating parent directories as needed.
    /// Returns the locator it replaced, if the path was already present.
    pub fn insert<S: AsRef<str>>(
        &mut self,
        segments: &[S],
        locator: Locator,
    ) -> Result<Option<Locator>, VfsError> {
        self.validate(segments)?;
        let Some((file, parents)) = segments.split_last() else {
            return Err(VfsError::InvalidPath(String::new()));
        };
        let mut node = &mut self.root;
        for segment in parents {
            node = node
                .directories
                .entry(SmolStr::new(segment.as_ref()))
                .or_default();
        }
        let previous = node.files.insert(SmolStr::new(file.as_ref()), locator);
        if previous.is_none() {
            self.count += 1;
        }

        Ok(previous)
    }

    pub fn get<S: AsRef<str>>(&self, segments: &[S]) -> Option<Locator> {
        let (file, parents) = segments.split_last()?;
        let mut node = &self.root;
        for segment in parents {
            node = node.directories.get(segment.as_ref())?;
        }

        node.files.get(file.as_ref()).copied()
    }

    /// Pre-order walk. Inside a directory files come first, then
    /// sub-directories, both in byte order of their names. The first error
    /// returned by the visitor stops the walk.
    pub fn traverse<V: TreeVisitor>(&self, visitor: &mut V) -> Result<(), VfsError> {
        let mut stack = Vec::new();
        Self::expand(&self.root, &mut stack, visitor)?;
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(name, node) => {
                    visitor.enter(name)?;
                    stack.push(Step::Leave(name));
                    Self::expand(node, &mut stack, visitor)?;
                }
                Step::Leave(name) => visitor.leave(name),
            }
        }

        Ok(())
    }

    fn expand<'a, V: TreeVisitor>(
        node: &'a DirectoryNode,
        stack: &mut Vec<Step<'a>>,
        visitor: &mut V,
    ) -> Result<(), VfsError> {
        for (name, locator) in node.files.iter() {
            visitor.visit(name, *locator)?;
        }
        for (name, child) in node.directories.iter().rev() {
            stack.push(Step::Enter(name, child));
        }

        Ok(())
    }

    fn validate<S: AsRef<str>>(&self, segments: &[S]) -> Result<(), VfsError> {
        if segments.is_empty() {
            return Err(VfsError::InvalidPath(String::new()));
        }
        let mut len = segments.len() - 1;
        for segment in segments {
            let segment = segment.as_ref();
            if segment.is_empty() || segment.contains('/') {
                return Err(VfsError::InvalidPath(join(segments)));
            }
            len += segment.len();
        }
        if len > self.max_path_len {
            return Err(VfsError::PathTooLong {
                len,
                limit: self.max_path_len,
            });
        }

        Ok(())
    }
}

fn join<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|segment| segment.as_ref())
        .collect::<Vec<_>>()
        .join("/")
}

/// Splits a canonical `a/b/c` path. Empty paths and empty segments (leading,
/// trailing or doubled `/`) are rejected.
pub fn split_path(path: &str) -> Result<Vec<&str>, VfsError> {
    let segments = path.split('/').collect::<Vec<_>>();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(VfsError::InvalidPath(path.into()));
    }

    Ok(segments)
}
