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

//! Directory of a packed archive.
//!
//! Layout: root header (`dess` magic, version), file blobs aligned to
//! a 4096 byte page, the serialized `name -> header` map, and finally the
//! offset of that map as the last 8 bytes of the file.

use std::{
    collections::HashMap,
    io::{self, Read, Seek},
    mem::size_of,
};

use byteorder::{LittleEndian, ReadBytesExt};
use four_cc::FourCC;
use pakfs_common::traits::BinaryDeserialization;

use crate::ArchiveError;

pub(crate) const MAGICK: FourCC = FourCC(*b"dess");
pub(crate) const VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSize {
    /// Unpacked and packed sizes of an LZ4 frame.
    Compressed(u32, u32),
    Raw(u32),
}

impl FileSize {
    pub fn stored(&self) -> u64 {
        match self {
            FileSize::Raw(size) => *size as _,
            FileSize::Compressed(_, packed) => *packed as _,
        }
    }
}

impl BinaryDeserialization for FileSize {
    fn deserialize(r: &mut impl Read) -> io::Result<Self> {
        let ty = r.read_u8()?;
        match ty {
            0 => Ok(FileSize::Raw(r.read_u32::<LittleEndian>()?)),
            1 => {
                let unpacked = r.read_u32::<LittleEndian>()?;
                let packed = r.read_u32::<LittleEndian>()?;
                Ok(FileSize::Compressed(unpacked, packed))
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Unknown file size type",
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub offset: u64,
    pub size: FileSize,
}

impl BinaryDeserialization for FileHeader {
    fn deserialize(r: &mut impl Read) -> io::Result<Self> {
        Ok(Self {
            offset: r.read_u64::<LittleEndian>()?,
            size: FileSize::deserialize(r)?,
        })
    }
}

#[derive(Debug)]
struct RootHeader {
    magick: FourCC,
    version: u32,
}

impl BinaryDeserialization for RootHeader {
    fn deserialize(r: &mut impl Read) -> io::Result<Self> {
        Ok(Self {
            magick: FourCC::deserialize(r)?,
            version: r.read_u32::<LittleEndian>()?,
        })
    }
}

pub type Directory = HashMap<String, FileHeader>;

pub fn load_archive_directory<R: Read + Seek>(r: &mut R) -> Result<Directory, ArchiveError> {
    let root_header = RootHeader::deserialize(r).map_err(|_| ArchiveError::InvalidFormat)?;
    if root_header.magick != MAGICK {
        return Err(ArchiveError::InvalidFormat);
    }
    if root_header.version > VERSION {
        return Err(ArchiveError::InvalidVersion);
    }
    let size = r.seek(io::SeekFrom::End(0))?;
    let tail = size_of::<u64>() as u64;
    if size < tail {
        return Err(ArchiveError::InvalidFormat);
    }
    r.seek(io::SeekFrom::Start(size - tail))?;
    let offset = r.read_u64::<LittleEndian>()?;
    if offset > size - tail {
        return Err(ArchiveError::Corrupt(format!(
            "directory offset {} is outside of the file",
            offset
        )));
    }
    r.seek(io::SeekFrom::Start(offset))?;

    let files = HashMap::<String, FileHeader>::deserialize(r)
        .map_err(|err| ArchiveError::Corrupt(err.to_string()))?;
    for (name, header) in files.iter() {
        if header.offset.saturating_add(header.size.stored()) > offset {
            return Err(ArchiveError::Corrupt(format!(
                "{} overlaps archive directory",
                name
            )));
        }
    }

    Ok(files)
}

#[cfg(test)]
pub(crate) use baker::DirectoryBaker;

#[cfg(test)]
mod baker {
    use std::{
        collections::HashMap,
        io::{self, Seek, Write},
    };

    use byteorder::{LittleEndian, WriteBytesExt};
    use pakfs_common::traits::BinarySerialization;

    use super::{FileHeader, FileSize, MAGICK, VERSION};

    const FILE_ALIGN: u64 = 4096;

    impl BinarySerialization for FileSize {
        fn serialize(&self, w: &mut impl Write) -> io::Result<()> {
            match self {
                FileSize::Raw(size) => {
                    w.write_u8(0)?;
                    w.write_u32::<LittleEndian>(*size)?;
                }
                FileSize::Compressed(unpacked, packed) => {
                    w.write_u8(1)?;
                    w.write_u32::<LittleEndian>(*unpacked)?;
                    w.write_u32::<LittleEndian>(*packed)?;
                }
            }

            Ok(())
        }
    }

    impl BinarySerialization for FileHeader {
        fn serialize(&self, w: &mut impl Write) -> io::Result<()> {
            w.write_u64::<LittleEndian>(self.offset)?;
            self.size.serialize(w)
        }
    }

    /// Writes fixture archives. Files above one alignment page get packed.
    pub(crate) struct DirectoryBaker<W: Write + Seek> {
        w: W,
        files: HashMap<String, FileHeader>,
    }

    impl<W: Write + Seek> DirectoryBaker<W> {
        pub fn new(mut w: W) -> io::Result<Self> {
            MAGICK.serialize(&mut w)?;
            w.write_u32::<LittleEndian>(VERSION)?;

            Ok(Self {
                w,
                files: HashMap::new(),
            })
        }

        pub fn write(&mut self, name: &str, data: &[u8]) -> io::Result<()> {
            let offset = self.align()?;
            let size = if data.len() <= FILE_ALIGN as _ {
                self.w.write_all(data)?;

                FileSize::Raw(data.len() as _)
            } else {
                let mut writer = lz4_flex::frame::FrameEncoder::new(&mut self.w);
                writer.write_all(data)?;
                writer.finish().map_err(io::Error::other)?;
                let end = self.w.stream_position()?;

                FileSize::Compressed(data.len() as _, (end - offset) as _)
            };
            self.files.insert(name.into(), FileHeader { offset, size });

            Ok(())
        }

        pub fn finish(mut self) -> io::Result<W> {
            let offset = self.align()?;
            self.files.serialize(&mut self.w)?;
            self.w.write_u64::<LittleEndian>(offset)?;

            Ok(self.w)
        }

        fn align(&mut self) -> io::Result<u64> {
            let offset = self.w.stream_position()?;
            let aligned = (offset + FILE_ALIGN - 1) & !(FILE_ALIGN - 1);

            self.w.seek(io::SeekFrom::Start(aligned))
        }
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::{load_archive_directory, DirectoryBaker, FileSize};
    use crate::ArchiveError;

    fn bake(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = DirectoryBaker::new(Cursor::new(Vec::new())).unwrap();
        for (name, data) in files {
            builder.write(name, data).unwrap();
        }

        builder.finish().unwrap().into_inner()
    }

    #[test]
    fn empty_archive() {
        let data = bake(&[]);
        let dir = load_archive_directory(&mut Cursor::new(&data)).unwrap();
        assert!(dir.is_empty());
    }

    #[test]
    fn write_read() {
        let data1: &[u8] = b"Hello world!";
        let data2: &[u8] = b"Hi there!";
        let data = bake(&[("file1", data1), ("dir/file2", data2)]);
        let dir = load_archive_directory(&mut Cursor::new(&data)).unwrap();
        assert_eq!(2, dir.len());
        assert_eq!(FileSize::Raw(data1.len() as u32), dir["file1"].size);
        assert_eq!(FileSize::Raw(data2.len() as u32), dir["dir/file2"].size);
    }

    #[test]
    fn large_files_are_compressed() {
        let payload = vec![7u8; 9001];
        let data = bake(&[("big", payload.as_slice())]);
        let dir = load_archive_directory(&mut Cursor::new(&data)).unwrap();
        match dir["big"].size {
            FileSize::Compressed(size, _) => assert_eq!(payload.len(), size as usize),
            other => panic!("Wrong compression {:?}", other),
        }
    }

    #[test]
    fn wrong_magic() {
        let mut data = bake(&[("file", &b"data"[..])]);
        data[0] = b'x';
        assert!(matches!(
            load_archive_directory(&mut Cursor::new(&data)),
            Err(ArchiveError::InvalidFormat)
        ));
    }

    #[test]
    fn newer_version() {
        let mut data = bake(&[]);
        data[4] = 2;
        assert!(matches!(
            load_archive_directory(&mut Cursor::new(&data)),
            Err(ArchiveError::InvalidVersion)
        ));
    }

    #[test]
    fn truncated_file() {
        assert!(matches!(
            load_archive_directory(&mut Cursor::new(&b"des"[..])),
            Err(ArchiveError::InvalidFormat)
        ));
    }

    #[test]
    fn directory_offset_out_of_range() {
        let mut data = bake(&[("file", &b"data"[..])]);
        let len = data.len();
        data[len - 8..].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(
            load_archive_directory(&mut Cursor::new(&data)),
            Err(ArchiveError::Corrupt(_))
        ));
    }
}
