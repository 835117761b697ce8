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

use serde::Deserialize;

use crate::{VfsError, MAX_PATH_LEN};

pub const DEFAULT_EXTENSION: &str = "dess";

/// How a [`crate::Vfs`] gets assembled.
///
/// ```toml
/// base_dir = "base"
/// prefix = "pak"
/// extensions = ["dess"]
/// patch_dirs = ["mods/fixes"]
/// strict = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VfsConfig {
    /// Directory scanned for archives. Nothing is scanned when unset.
    pub base_dir: Option<PathBuf>,
    pub prefix: String,
    /// Archive file extensions, without the dot. Empty accepts any.
    pub extensions: Vec<String>,
    /// Loose directories mounted after the archives, in order.
    pub patch_dirs: Vec<PathBuf>,
    pub max_path_len: usize,
    /// Fail on the first archive that can't be opened instead of skipping it.
    pub strict: bool,
    /// Treat an empty result as [`VfsError::NoArchivesFound`].
    pub require_archives: bool,
}

impl Default for VfsConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            prefix: String::new(),
            extensions: vec![DEFAULT_EXTENSION.into()],
            patch_dirs: Vec::new(),
            max_path_len: MAX_PATH_LEN,
            strict: false,
            require_archives: false,
        }
    }
}

impl VfsConfig {
    pub fn from_toml(text: &str) -> Result<Self, VfsError> {
        let config: Self =
            toml::from_str(text).map_err(|err| VfsError::Config(err.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, VfsError> {
        Self::from_toml(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), VfsError> {
        check_path_limit(self.max_path_len)?;
        check_extensions(&self.extensions)
    }
}

pub(crate) fn check_path_limit(limit: usize) -> Result<(), VfsError> {
    if limit == 0 || limit > MAX_PATH_LEN {
        return Err(VfsError::Config(format!(
            "max_path_len must be within 1..={}",
            MAX_PATH_LEN
        )));
    }

    Ok(())
}

pub(crate) fn check_extensions(extensions: &[String]) -> Result<(), VfsError> {
    if extensions.iter().any(|ext| ext.starts_with('.')) {
        return Err(VfsError::Config(
            "extensions are given without the leading dot".into(),
        ));
    }

    Ok(())
}
