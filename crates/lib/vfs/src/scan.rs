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
    fs, io,
    path::{Path, PathBuf},
};

/// Archive files directly inside `dir` whose name starts with `prefix` and
/// whose extension is one of `extensions` (any extension when the list is
/// empty). Sorted by file name bytes, which is the mount order.
pub fn find_archives(
    dir: &Path,
    prefix: &str,
    extensions: &[String],
) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for path in fs::read_dir(dir)? {
        let path = path?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !name.starts_with(prefix) {
            continue;
        }
        let extension = path.extension().and_then(|ext| ext.to_str());
        let matches = extensions.is_empty()
            || extensions
                .iter()
                .any(|ext| Some(ext.as_str()) == extension);
        if matches {
            found.push(path);
        }
    }
    found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(found)
}

#[cfg(test)]
mod test {
    use std::fs;

    use tempfile::TempDir;

    use super::find_archives;

    fn names(dir: &TempDir, prefix: &str, extensions: &[&str]) -> Vec<String> {
        let extensions = extensions
            .iter()
            .map(|ext| ext.to_string())
            .collect::<Vec<_>>();
        find_archives(dir.path(), prefix, &extensions)
            .unwrap()
            .iter()
            .map(|path| path.file_name().unwrap().to_str().unwrap().to_owned())
            .collect()
    }

    #[test]
    fn sorted_by_name_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in [
            "pak002.dess",
            "pak000.dess",
            "pak010.dess",
            "pak001.dess",
            "zpak000.dess",
            "pak003.txt",
            "pak004",
        ] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("pak005.dess")).unwrap();

        assert_eq!(
            vec!["pak000.dess", "pak001.dess", "pak002.dess", "pak010.dess"],
            names(&dir, "pak", &["dess"])
        );
        assert_eq!(
            vec![
                "pak000.dess",
                "pak001.dess",
                "pak002.dess",
                "pak003.txt",
                "pak004"
            ],
            names(&dir, "pak00", &[])
        );
    }

    #[test]
    fn extension_match_is_case_sensitive() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pak000.PK4"), b"").unwrap();
        fs::write(dir.path().join("pak001.pk4"), b"").unwrap();

        assert_eq!(vec!["pak001.pk4"], names(&dir, "pak", &["pk4"]));
    }

    #[test]
    fn missing_directory() {
        let dir = TempDir::new().unwrap();
        assert!(find_archives(&dir.path().join("nope"), "pak", &[]).is_err());
    }
}
