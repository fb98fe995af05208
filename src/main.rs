mod cli;
mod config;
mod icons;
mod model;
mod repository;
mod search;
mod storage;
mod ui;

use anyhow::Result;
use clap::Parser;
use config::Settings;
use repository::Repository;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::{self, File};
use storage::JsonStorage;
use ui::app::{App, StatusKind};

fn main() -> Result<()> {
    let settings = Settings::from_cli(cli::Cli::parse())?;
    init_logging(&settings);
    log::info!("notes-tui starting, data at {}", settings.data_path.display());

    let (repo, problem) = Repository::open(Box::new(JsonStorage::new(settings.data_path.clone())));
    let mut app = App::new(repo);
    if let Some(err) = problem {
        app.set_status(StatusKind::Error, format!("{} (starting empty)", err));
    }
    ui::run(app, settings.icons.icons())
}

/// Logging goes to a file so it never draws over the interface. A log file
/// that cannot be created leaves logging disabled.
fn init_logging(settings: &Settings) {
    if let Some(dir) = settings.log_path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create(&settings.log_path) {
        let _ = WriteLogger::init(settings.log_level, log_config, log_file);
    }
}
