pub mod app;
pub mod editor;
pub mod input;
pub mod render;
pub mod screen;

use crate::icons::IconSet;
use anyhow::{Context, Result};
use app::App;
use crossterm::cursor::Show;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::style::ResetColor;
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::{debug, info};
use render::Renderer;
use screen::ScreenBuffer;
use std::io::{stdout, BufWriter};

/// Puts the terminal in raw mode on the alternate screen and restores it
/// when dropped, including while unwinding from a panic.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("enabling raw mode")?;
        let guard = TerminalGuard;
        execute!(stdout(), EnterAlternateScreen).context("entering alternate screen")?;
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_terminal();
            previous(info);
        }));
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

fn restore_terminal() {
    let _ = execute!(stdout(), ResetColor, Show, LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

pub fn run(mut app: App, icons: &'static IconSet) -> Result<()> {
    let _guard = TerminalGuard::enter()?;
    let (width, height) = terminal::size().context("reading terminal size")?;
    let mut screen = ScreenBuffer::new(width, height);
    let renderer = Renderer::new(icons);
    let mut out = BufWriter::new(stdout());
    info!("terminal ready ({}x{})", width, height);

    loop {
        let written = renderer.render(&app, &mut screen, &mut out)?;
        if written > 0 {
            debug!("frame wrote {} cells", written);
        }
        match event::read()? {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(key) {
                    break;
                }
            }
            // Some terminals clear or scroll the screen on resize even when
            // the size ends up unchanged, so every resize repaints in full.
            Event::Resize(width, height) => {
                debug!("resized to {}x{}", width, height);
                screen.resize(width, height);
            }
            _ => {}
        }
    }
    info!("leaving terminal");
    Ok(())
}
