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

use arrayvec::ArrayString;

use crate::VfsError;

/// Hard capacity of a reconstructed path in bytes.
pub const MAX_PATH_LEN: usize = 2048;

/// Fixed capacity buffer holding the path of the directory currently being
/// walked, always either empty or ending with `/`.
///
/// Every append is checked against the limit before anything is written, so
/// an over-long path fails with [`VfsError::PathTooLong`] and leaves the
/// buffer untouched.
#[derive(Debug, Clone)]
pub struct PathBuffer {
    buf: ArrayString<MAX_PATH_LEN>,
    limit: usize,
}

impl Default for PathBuffer {
    fn default() -> Self {
        Self::new(MAX_PATH_LEN)
    }
}

impl PathBuffer {
    /// `limit` is clamped to [`MAX_PATH_LEN`].
    pub fn new(limit: usize) -> Self {
        Self {
            buf: ArrayString::new(),
            limit: limit.min(MAX_PATH_LEN),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn as_str(&self) -> &str {
        self.buf.as_str()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn push_dir(&mut self, name: &str) -> Result<(), VfsError> {
        self.reserve(name.len() + 1)?;
        self.append(name)?;
        self.append("/")
    }

    /// Drops the trailing `name/` pushed by the matching [`Self::push_dir`].
    pub fn pop_dir(&mut self, name: &str) {
        let suffix = name.len() + 1;
        debug_assert!(self.buf.len() >= suffix);
        debug_assert!(self.buf.as_str()[..self.buf.len() - 1].ends_with(name));
        self.buf.truncate(self.buf.len().saturating_sub(suffix));
    }

    /// Appends a file name for the duration of `cb`. The full path is only
    /// borrowed by the callback.
    pub fn with_file<R>(
        &mut self,
        name: &str,
        cb: impl FnOnce(&str) -> R,
    ) -> Result<R, VfsError> {
        self.reserve(name.len())?;
        let len = self.buf.len();
        self.append(name)?;
        let result = cb(self.buf.as_str());
        self.buf.truncate(len);

        Ok(result)
    }

    fn reserve(&self, extra: usize) -> Result<(), VfsError> {
        let len = self.buf.len() + extra;
        if len > self.limit {
            Err(VfsError::PathTooLong {
                len,
                limit: self.limit,
            })
        } else {
            Ok(())
        }
    }

    fn append(&mut self, s: &str) -> Result<(), VfsError> {
        self.buf
            .try_push_str(s)
            .map_err(|_| VfsError::PathTooLong {
                len: self.buf.len() + s.len(),
                limit: self.limit,
            })
    }
}

#[cfg(test)]
mod test {
    use super::{PathBuffer, MAX_PATH_LEN};
    use crate::VfsError;

    #[test]
    fn push_and_pop() {
        let mut path = PathBuffer::default();
        path.push_dir("textures").unwrap();
        path.push_dir("walls").unwrap();
        assert_eq!("textures/walls/", path.as_str());

        let full = path.with_file("brick.tga", |full| full.to_owned()).unwrap();
        assert_eq!("textures/walls/brick.tga", full);
        assert_eq!("textures/walls/", path.as_str());

        path.pop_dir("walls");
        assert_eq!("textures/", path.as_str());
        path.pop_dir("textures");
        assert!(path.is_empty());
    }

    #[test]
    fn limit_is_exact() {
        let mut path = PathBuffer::new(8);
        path.push_dir("abc").unwrap();
        // "abc/" + "defg" is exactly 8 bytes.
        assert_eq!(8, path.with_file("defg", |full| full.len()).unwrap());
        match path.with_file("defgh", |_| ()) {
            Err(VfsError::PathTooLong { len, limit }) => {
                assert_eq!(9, len);
                assert_eq!(8, limit);
            }
            other => panic!("Unexpected result {:?}", other),
        }
        assert_eq!("abc/", path.as_str());
    }

    #[test]
    fn failed_push_leaves_buffer_untouched() {
        let mut path = PathBuffer::new(6);
        path.push_dir("ab").unwrap();
        assert!(matches!(
            path.push_dir("cde"),
            Err(VfsError::PathTooLong { len: 7, limit: 6 })
        ));
        assert_eq!("ab/", path.as_str());

        path.push_dir("cd").unwrap();
        assert_eq!("ab/cd/", path.as_str());
    }

    #[test]
    fn limit_is_clamped_to_capacity() {
        let mut path = PathBuffer::new(usize::MAX);
        assert_eq!(MAX_PATH_LEN, path.limit());

        let name = "x".repeat(MAX_PATH_LEN);
        assert_eq!(MAX_PATH_LEN, path.with_file(&name, |full| full.len()).unwrap());
        assert!(path.push_dir(&name).is_err());
        assert!(path.is_empty());
    }
}
