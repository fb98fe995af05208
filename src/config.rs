use crate::cli::Cli;
use crate::icons::IconMode;
use crate::storage::default_data_dir;
use anyhow::Result;
use simplelog::LevelFilter;
use std::path::PathBuf;

pub const DATA_FILE: &str = "notes.json";
pub const LOG_FILE: &str = "notes-tui.log";

/// Everything `main` needs, resolved from the command line and environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_path: PathBuf,
    pub log_path: PathBuf,
    pub icons: IconMode,
    pub log_level: LevelFilter,
}

impl Settings {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let data_path = match cli.data_path {
            Some(path) => path,
            None => default_data_dir()?.join(DATA_FILE),
        };
        let log_path = match cli.log_file {
            Some(path) => path,
            None => data_path.with_file_name(LOG_FILE),
        };
        let log_level = if cli.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };
        Ok(Settings {
            data_path,
            log_path,
            icons: cli.icons,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        use clap::Parser;
        Cli::try_parse_from(std::iter::once("notes-tui").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn log_file_defaults_next_to_data() {
        let settings = Settings::from_cli(cli(&["--data-path", "/tmp/notes/data.json"])).unwrap();
        assert_eq!(settings.data_path, PathBuf::from("/tmp/notes/data.json"));
        assert_eq!(settings.log_path, PathBuf::from("/tmp/notes/notes-tui.log"));
        assert_eq!(settings.log_level, LevelFilter::Info);
    }

    #[test]
    fn explicit_values_win() {
        let settings = Settings::from_cli(cli(&[
            "--data-path",
            "a.json",
            "--log-file",
            "b.log",
            "--icons",
            "unicode",
            "--debug",
        ]))
        .unwrap();
        assert_eq!(settings.log_path, PathBuf::from("b.log"));
        assert_eq!(settings.icons, IconMode::Unicode);
        assert_eq!(settings.log_level, LevelFilter::Debug);
    }
}
