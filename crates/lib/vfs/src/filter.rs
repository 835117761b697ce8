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

/// Decides which files a search reports. Receives the full path.
pub trait PathFilter {
    fn accept(&self, path: &str) -> bool;
}

impl<F: Fn(&str) -> bool> PathFilter for F {
    fn accept(&self, path: &str) -> bool {
        self(path)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl PathFilter for AcceptAll {
    fn accept(&self, _path: &str) -> bool {
        true
    }
}

/// Case-sensitive match against the text after the last `.` of the file
/// name. Names without a dot never match.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extension: String,
}

impl ExtensionFilter {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }
}

impl PathFilter for ExtensionFilter {
    fn accept(&self, path: &str) -> bool {
        extension(path) == Some(self.extension.as_str())
    }
}

pub fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next()?;
    let dot = name.rfind('.')?;

    Some(&name[dot + 1..])
}
