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

//! Read-only filesystem layered from pak archives.
//!
//! Archives are mounted in order and merged into one [`NameTree`]; a file in
//! a later archive hides the file with the same path in earlier ones.
//!
//! ```no_run
//! use std::path::Path;
//!
//! let (vfs, _report) = pakfs::Vfs::open(Path::new("base"), "pak")?;
//! vfs.search_extension("tga", |path| println!("{}", path))?;
//! let data = vfs.read_file("textures/base_wall/lfwall13f3.tga")?;
//! println!("{} bytes", data.len());
//! # Ok::<(), pakfs::VfsError>(())
//! ```

mod archive;
mod config;
mod directory;
mod error;
mod filter;
mod mmap;
mod name_tree;
mod packed;
mod path_buffer;
mod raw_fs;
mod scan;
mod vfs;

#[cfg(test)]
mod testing;

pub use archive::*;
pub use config::*;
pub use error::*;
pub use filter::*;
pub use name_tree::*;
pub use packed::PackedArchive;
pub use path_buffer::*;
pub use raw_fs::RawFsArchive;
pub use scan::find_archives;
pub use vfs::*;
