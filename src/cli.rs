use crate::icons::IconMode;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "notes-tui", version, about = "Terminal notes organised in notebooks")]
pub struct Cli {
    /// JSON data file (defaults to notes.json in the user data directory)
    #[arg(long, value_name = "PATH")]
    pub data_path: Option<PathBuf>,

    /// Glyph set used in the interface
    #[arg(long, env = "NOTES_TUI_ICONS", value_enum, default_value_t)]
    pub icons: IconMode,

    /// Log file (defaults to notes-tui.log next to the data file)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(long)]
    pub debug: bool,
}
