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
    collections::HashMap,
    hash::Hash,
    io::{self, Read, Write},
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc::{Crc, CRC_32_CKSUM};
use four_cc::FourCC;

use crate::traits::{BinaryDeserialization, BinarySerialization};

const CHECKER: Crc<u32> = Crc::<u32>::new(&CRC_32_CKSUM);

// Counts come from untrusted files, don't let them drive allocation.
const MAX_PREALLOCATION: usize = 4096;

impl BinaryDeserialization for String {
    fn deserialize(r: &mut impl Read) -> io::Result<Self> {
        let count = r.read_u16::<LittleEndian>()?;
        let mut buffer = vec![0; count as _];
        r.read_exact(&mut buffer)?;
        let crc = r.read_u32::<LittleEndian>()?;
        if crc != CHECKER.checksum(&buffer) {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "Bad CRC"));
        }

        String::from_utf8(buffer)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "UTF8 conversion failed"))
    }
}

impl BinarySerialization for String {
    fn serialize(&self, w: &mut impl Write) -> io::Result<()> {
        let bytes = self.as_bytes();
        let len = u16::try_from(bytes.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "String is too long"))?;
        w.write_u16::<LittleEndian>(len)?;
        w.write_all(bytes)?;
        w.write_u32::<LittleEndian>(CHECKER.checksum(bytes))?;

        Ok(())
    }
}

impl BinaryDeserialization for FourCC {
    fn deserialize(r: &mut impl Read) -> io::Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;

        Ok(FourCC(magic))
    }
}

impl BinarySerialization for FourCC {
    fn serialize(&self, w: &mut impl Write) -> io::Result<()> {
        w.write_all(&self.0)
    }
}

impl<T, U> BinarySerialization for HashMap<T, U>
where
    T: BinarySerialization,
    U: BinarySerialization,
{
    fn serialize(&self, w: &mut impl Write) -> io::Result<()> {
        w.write_u32::<LittleEndian>(self.len() as _)?;
        for (key, value) in self.iter() {
            key.serialize(w)?;
            value.serialize(w)?;
        }

        Ok(())
    }
}

impl<T, U> BinaryDeserialization for HashMap<T, U>
where
    T: BinaryDeserialization + Hash + Eq,
    U: BinaryDeserialization,
{
    fn deserialize(r: &mut impl Read) -> io::Result<Self> {
        let len = r.read_u32::<LittleEndian>()? as usize;
        let mut map = HashMap::with_capacity(len.min(MAX_PREALLOCATION));
        for _ in 0..len {
            let key = T::deserialize(r)?;
            let value = U::deserialize(r)?;

            map.insert(key, value);
        }

        Ok(map)
    }
}

#[cfg(test)]
mod test {
    use std::{collections::HashMap, io::Cursor};

    use crate::traits::{BinaryDeserialization, BinarySerialization};

    #[test]
    fn string_with_bad_crc_is_rejected() {
        let mut data = Vec::new();
        String::from("textures/wall.tga")
            .serialize(&mut data)
            .unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xff;

        let err = String::deserialize(&mut Cursor::new(&data)).unwrap_err();
        assert_eq!(std::io::ErrorKind::InvalidData, err.kind());
    }

    #[test]
    fn oversized_string_is_not_truncated() {
        let long = "x".repeat(u16::MAX as usize + 1);
        let mut data = Vec::new();
        assert!(long.serialize(&mut data).is_err());
    }

    #[test]
    fn map_of_strings() {
        let mut map = HashMap::new();
        map.insert("a/b.txt".to_string(), "one".to_string());
        map.insert("c.txt".to_string(), "two".to_string());
        let mut data = Vec::new();
        map.serialize(&mut data).unwrap();

        let loaded = HashMap::<String, String>::deserialize(&mut Cursor::new(&data)).unwrap();
        assert_eq!(map, loaded);
    }

    #[test]
    fn truncated_map_fails() {
        let mut map = HashMap::new();
        map.insert("one".to_string(), "1".to_string());
        map.insert("two".to_string(), "2".to_string());
        let mut data = Vec::new();
        map.serialize(&mut data).unwrap();
        data.truncate(data.len() - 3);

        assert!(HashMap::<String, String>::deserialize(&mut Cursor::new(&data)).is_err());
    }

    #[test]
    fn huge_count_does_not_preallocate() {
        let data = u32::MAX.to_le_bytes();
        assert!(HashMap::<String, String>::deserialize(&mut Cursor::new(&data)).is_err());
    }
}
