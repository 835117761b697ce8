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

use std::{fs::File, path::Path};

use crate::directory::DirectoryBaker;

pub(crate) fn write_archive(path: &Path, files: &[(&str, &[u8])]) {
    let mut baker = DirectoryBaker::new(File::create(path).unwrap()).unwrap();
    for (name, data) in files {
        baker.write(name, data).unwrap();
    }
    baker.finish().unwrap();
}
