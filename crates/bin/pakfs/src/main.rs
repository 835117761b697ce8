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
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{bail, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use glob::Pattern;
use log::{info, warn, LevelFilter};
use pakfs::{ExtensionFilter, PathFilter, Vfs, VfsConfig};
use simple_logger::SimpleLogger;

fn cli() -> Command {
    Command::new("pakfs")
        .version("0.1.0")
        .author("gigablaster")
        .about("Read-only access to layered pak archives")
        .subcommand_required(true)
        .arg(
            Arg::new("base")
                .long("base")
                .short('b')
                .help("Directory with pak archives")
                .value_name("DIR")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("prefix")
                .long("prefix")
                .short('p')
                .help("Archive file name prefix")
                .value_name("PREFIX")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("TOML file with vfs settings")
                .value_name("FILE")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("archive-ext")
                .long("archive-ext")
                .help("Comma separated archive file extensions")
                .value_name("EXT")
                .value_delimiter(',')
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("patch")
                .long("patch")
                .help("Loose directory mounted over the archives")
                .value_name("DIR")
                .global(true)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Fail if any archive can't be opened")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Verbose logging")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("list")
                .about("List files")
                .arg(
                    Arg::new("ext")
                        .long("ext")
                        .short('e')
                        .help("Only files with this extension")
                        .value_name("EXT")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("glob")
                        .long("glob")
                        .short('g')
                        .help("Only files matching the pattern")
                        .value_name("PATTERN")
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("cat")
                .about("Write file to stdout")
                .arg(Arg::new("path").required(true).value_name("PATH")),
        )
        .subcommand(
            Command::new("extract")
                .about("Copy file out of the archives")
                .arg(Arg::new("path").required(true).value_name("PATH"))
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .help("Output file")
                        .value_name("FILE")
                        .required(true)
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("which")
                .about("Show which archive provides a file")
                .arg(Arg::new("path").required(true).value_name("PATH")),
        )
}

fn load_config(args: &ArgMatches) -> anyhow::Result<VfsConfig> {
    let mut config = if let Some(path) = args.get_one::<String>("config") {
        VfsConfig::load(&PathBuf::from(path)).with_context(|| format!("Loading {}", path))?
    } else {
        VfsConfig::default()
    };
    if let Some(base) = args.get_one::<String>("base") {
        config.base_dir = Some(PathBuf::from(base));
    }
    if let Some(prefix) = args.get_one::<String>("prefix") {
        config.prefix = prefix.clone();
    }
    if let Some(extensions) = args.get_many::<String>("archive-ext") {
        config.extensions = extensions.cloned().collect();
    }
    if let Some(patches) = args.get_many::<String>("patch") {
        config.patch_dirs.extend(patches.map(PathBuf::from));
    }
    if args.get_flag("strict") {
        config.strict = true;
    }
    if config.base_dir.is_none() && config.patch_dirs.is_empty() {
        bail!("Need base directory or patch directory");
    }
    config.validate()?;

    Ok(config)
}

struct ListFilter {
    extension: Option<ExtensionFilter>,
    pattern: Option<Pattern>,
}

impl PathFilter for ListFilter {
    fn accept(&self, path: &str) -> bool {
        self.extension
            .as_ref()
            .map_or(true, |filter| filter.accept(path))
            && self
                .pattern
                .as_ref()
                .map_or(true, |pattern| pattern.matches(path))
    }
}

fn list(vfs: &Vfs, args: &ArgMatches) -> anyhow::Result<()> {
    let pattern = match args.get_one::<String>("glob") {
        Some(glob) => Some(Pattern::new(glob).with_context(|| format!("Bad pattern {}", glob))?),
        None => None,
    };
    let filter = ListFilter {
        extension: args.get_one::<String>("ext").map(ExtensionFilter::new),
        pattern,
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut written = Ok(());
    vfs.search_filtered(&filter, |path| {
        if written.is_ok() {
            written = writeln!(out, "{}", path);
        }
    })?;

    Ok(written?)
}

fn path_arg(args: &ArgMatches) -> anyhow::Result<&str> {
    match args.get_one::<String>("path") {
        Some(path) => Ok(path.as_str()),
        None => bail!("Need file path"),
    }
}

fn main() -> anyhow::Result<()> {
    let args = cli().get_matches();
    let level = if args.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    SimpleLogger::new().with_level(level).init()?;

    let config = load_config(&args)?;
    let (vfs, report) = Vfs::from_config(&config)?;
    info!(
        "Mounted {} archives, {} failed, {} files",
        report.loaded.len(),
        report.failed.len(),
        vfs.file_count()
    );
    if !report.rejected.is_empty() {
        warn!("{} entries were left out", report.rejected.len());
    }

    match args.subcommand() {
        Some(("list", sub)) => list(&vfs, sub),
        Some(("cat", sub)) => {
            let data = vfs.read_file(path_arg(sub)?)?;
            io::stdout().lock().write_all(&data)?;

            Ok(())
        }
        Some(("extract", sub)) => {
            let path = path_arg(sub)?;
            let data = vfs.read_file(path)?;
            let out = sub
                .get_one::<String>("out")
                .context("Need output file")?;
            fs::write(out, &data).with_context(|| format!("Writing {}", out))?;
            info!("Extracted {} ({} bytes) to {}", path, data.len(), out);

            Ok(())
        }
        Some(("which", sub)) => {
            let path = path_arg(sub)?;
            let Some(locator) = vfs.locate(path)? else {
                bail!("File {} not found", path);
            };
            if let Some(archive) = vfs.archive(locator.archive) {
                println!("{}", archive.source().display());
            }

            Ok(())
        }
        _ => bail!("Unknown command"),
    }
}

#[cfg(test)]
mod test {
    use super::{cli, load_config, ListFilter};
    use glob::Pattern;
    use pakfs::{ExtensionFilter, PathFilter};

    #[test]
    fn command_line_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let args = cli()
            .try_get_matches_from([
                "pakfs",
                "--base",
                "base",
                "--prefix",
                "pak",
                "--archive-ext",
                "pk4,dess",
                "--patch",
                "mods/a",
                "--patch",
                "mods/b",
                "--strict",
                "list",
            ])
            .unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(Some("base".into()), config.base_dir);
        assert_eq!("pak", config.prefix);
        assert_eq!(vec!["pk4", "dess"], config.extensions);
        assert_eq!(2, config.patch_dirs.len());
        assert!(config.strict);
    }

    #[test]
    fn needs_something_to_mount() {
        let args = cli().try_get_matches_from(["pakfs", "list"]).unwrap();
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn list_filter_combines_extension_and_glob() {
        let filter = ListFilter {
            extension: Some(ExtensionFilter::new("tga")),
            pattern: Some(Pattern::new("textures/*").unwrap()),
        };
        assert!(filter.accept("textures/sky.tga"));
        assert!(!filter.accept("textures/sky.png"));
        assert!(!filter.accept("gfx/sky.tga"));
    }
}
