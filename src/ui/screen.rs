use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{
    Attribute, Color as CColor, Print, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{queue, QueueableCommand};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use std::io::{self, Write};
use unicode_width::UnicodeWidthChar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub symbol: char,
    pub style: Style,
    /// Right half of a double-width glyph drawn in the cell to the left.
    pub continuation: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            symbol: ' ',
            style: Style::default(),
            continuation: false,
        }
    }
}

impl Cell {
    fn blank(style: Style) -> Self {
        Cell {
            symbol: ' ',
            style,
            continuation: false,
        }
    }

    /// Terminal columns the symbol occupies.
    pub fn width(&self) -> u16 {
        if self.continuation {
            0
        } else {
            self.symbol.width().unwrap_or(1).max(1) as u16
        }
    }
}

/// Columns `ch` takes when drawn by `Grid::put_str`. Control characters are
/// drawn as a single space; combining marks take none.
pub fn char_columns(ch: char) -> u16 {
    if ch.is_control() {
        1
    } else {
        ch.width().unwrap_or(1) as u16
    }
}

pub fn str_columns(text: &str) -> u16 {
    text.chars()
        .fold(0u16, |acc, ch| acc.saturating_add(char_columns(ch)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderKind {
    Plain,
    Double,
}

/// Fixed-size character grid addressed by (x, y). Writes outside the grid
/// are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    cursor: Option<(u16, u16)>,
}

impl Grid {
    pub fn new(width: u16, height: u16) -> Self {
        Grid {
            width,
            height,
            cells: vec![Cell::default(); width as usize * height as usize],
            cursor: None,
        }
    }

    pub fn area(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    pub fn reset(&mut self) {
        self.cells.fill(Cell::default());
        self.cursor = None;
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    #[cfg(test)]
    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Writes one glyph at (x, y) and returns the columns it took. A
    /// double-width glyph also claims the cell to its right; one that would
    /// hang off the right edge is drawn as a space.
    pub fn set(&mut self, x: u16, y: u16, symbol: char, style: Style) -> u16 {
        let i = match self.index(x, y) {
            Some(i) => i,
            None => return 0,
        };
        let mut symbol = match symbol.width() {
            Some(w) if w > 0 && !symbol.is_control() => symbol,
            _ => ' ',
        };
        let mut width = symbol.width().unwrap_or(1) as u16;
        if width > 1 && x + 1 >= self.width {
            symbol = ' ';
            width = 1;
        }
        self.release(x, y);
        if width > 1 {
            self.release(x + 1, y);
        }
        self.cells[i] = Cell {
            symbol,
            style,
            continuation: false,
        };
        if width > 1 {
            self.cells[i + 1] = Cell {
                symbol: ' ',
                style,
                continuation: true,
            };
        }
        width
    }

    /// Blanks whichever half of a wide glyph is left behind when (x, y) is
    /// overwritten.
    fn release(&mut self, x: u16, y: u16) {
        let i = match self.index(x, y) {
            Some(i) => i,
            None => return,
        };
        let cell = self.cells[i];
        if cell.continuation && x > 0 {
            let style = self.cells[i - 1].style;
            self.cells[i - 1] = Cell::blank(style);
        } else if cell.width() > 1 {
            if let Some(next) = self.index(x + 1, y) {
                self.cells[next] = Cell::blank(self.cells[next].style);
            }
        }
    }

    /// Writes `text` starting at (x, y), clipped to `max_width` columns.
    /// Returns the number of columns used.
    pub fn put_str(&mut self, x: u16, y: u16, text: &str, max_width: u16, style: Style) -> u16 {
        let limit = max_width.min(self.width.saturating_sub(x));
        let mut used = 0;
        for ch in text.chars() {
            let w = char_columns(ch);
            if w == 0 {
                continue;
            }
            if used + w > limit {
                break;
            }
            used += self.set(x + used, y, ch, style);
        }
        used
    }

    /// Like `put_str`, then pads the remainder of `width` with spaces.
    pub fn put_line(&mut self, x: u16, y: u16, text: &str, width: u16, style: Style) {
        let written = self.put_str(x, y, text, width, style);
        for dx in written..width {
            self.set(x.saturating_add(dx), y, ' ', style);
        }
    }

    pub fn fill(&mut self, area: Rect, style: Style) {
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                self.set(x, y, ' ', style);
            }
        }
    }

    /// Clears `area` and draws a border around it with an optional title in
    /// the top edge.
    pub fn draw_box(&mut self, area: Rect, title: Option<&str>, kind: BorderKind, style: Style) {
        if area.width < 2 || area.height < 2 {
            return;
        }
        let (tl, tr, bl, br, h, v) = match kind {
            BorderKind::Plain => ('┌', '┐', '└', '┘', '─', '│'),
            BorderKind::Double => ('╔', '╗', '╚', '╝', '═', '║'),
        };
        self.fill(area, Style::default());
        let (left, right) = (area.left(), area.right() - 1);
        let (top, bottom) = (area.top(), area.bottom() - 1);
        for x in left + 1..right {
            self.set(x, top, h, style);
            self.set(x, bottom, h, style);
        }
        for y in top + 1..bottom {
            self.set(left, y, v, style);
            self.set(right, y, v, style);
        }
        self.set(left, top, tl, style);
        self.set(right, top, tr, style);
        self.set(left, bottom, bl, style);
        self.set(right, bottom, br, style);
        if let Some(title) = title {
            let label = format!(" {} ", title);
            self.put_str(left + 1, top, &label, area.width.saturating_sub(2), style);
        }
    }

    #[cfg(test)]
    pub fn cursor(&self) -> Option<(u16, u16)> {
        self.cursor
    }

    pub fn set_cursor(&mut self, x: u16, y: u16) {
        if x < self.width && y < self.height {
            self.cursor = Some((x, y));
        }
    }
}

/// Front/back double buffer. The renderer draws a whole frame into `back`;
/// `flush` writes only the cells that differ from `front` and then swaps.
pub struct ScreenBuffer {
    front: Grid,
    back: Grid,
    full_redraw: bool,
}

impl ScreenBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        ScreenBuffer {
            front: Grid::new(width, height),
            back: Grid::new(width, height),
            full_redraw: true,
        }
    }

    #[cfg(test)]
    pub fn size(&self) -> (u16, u16) {
        (self.back.width, self.back.height)
    }

    /// Reallocates both grids; the next flush repaints every cell.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.front = Grid::new(width, height);
        self.back = Grid::new(width, height);
        self.full_redraw = true;
    }

    /// Cleared back grid for the next frame.
    pub fn begin_frame(&mut self) -> &mut Grid {
        self.back.reset();
        &mut self.back
    }

    #[cfg(test)]
    pub fn front(&self) -> &Grid {
        &self.front
    }

    /// Emits the difference between the back and front grids to `out` and
    /// swaps them. Returns the number of columns written; an unchanged frame
    /// writes nothing at all. After a failed write the next flush repaints
    /// everything, since the terminal state is unknown.
    pub fn flush<W: Write>(&mut self, out: &mut W) -> io::Result<usize> {
        match self.write_diff(out) {
            Ok(written) => {
                std::mem::swap(&mut self.front, &mut self.back);
                self.full_redraw = false;
                Ok(written)
            }
            Err(err) => {
                self.full_redraw = true;
                Err(err)
            }
        }
    }

    fn write_diff<W: Write>(&self, out: &mut W) -> io::Result<usize> {
        let full = self.full_redraw;
        let cursor_changed = full || self.back.cursor != self.front.cursor;
        let mut written = 0;
        let mut pen: Option<Style> = None;
        let mut next_pos: Option<(u16, u16)> = None;

        if full {
            queue!(out, Hide, SetAttribute(Attribute::Reset), Clear(ClearType::All))?;
        }
        for y in 0..self.back.height {
            for x in 0..self.back.width {
                let i = y as usize * self.back.width as usize + x as usize;
                let cell = self.back.cells[i];
                if cell.continuation {
                    continue;
                }
                let width = cell.width();
                let span = i..i + width as usize;
                if !full && self.back.cells[span.clone()] == self.front.cells[span] {
                    continue;
                }
                if written == 0 && !full && self.front.cursor.is_some() {
                    out.queue(Hide)?;
                }
                if next_pos != Some((x, y)) {
                    out.queue(MoveTo(x, y))?;
                }
                if pen != Some(cell.style) {
                    apply_style(out, cell.style)?;
                    pen = Some(cell.style);
                }
                out.queue(Print(cell.symbol))?;
                next_pos = Some((x + width, y));
                written += width as usize;
            }
        }
        if written > 0 {
            out.queue(SetAttribute(Attribute::Reset))?;
        }
        if written > 0 || cursor_changed {
            match self.back.cursor {
                Some((x, y)) => queue!(out, MoveTo(x, y), Show)?,
                None => {
                    if cursor_changed {
                        out.queue(Hide)?;
                    }
                }
            }
            out.flush()?;
        }
        Ok(written)
    }
}

fn apply_style<W: Write>(out: &mut W, style: Style) -> io::Result<()> {
    out.queue(SetAttribute(Attribute::Reset))?;
    out.queue(SetForegroundColor(
        style.fg.map(to_crossterm).unwrap_or(CColor::Reset),
    ))?;
    out.queue(SetBackgroundColor(
        style.bg.map(to_crossterm).unwrap_or(CColor::Reset),
    ))?;
    let modifiers = style.add_modifier.difference(style.sub_modifier);
    for (flag, attribute) in [
        (Modifier::BOLD, Attribute::Bold),
        (Modifier::DIM, Attribute::Dim),
        (Modifier::ITALIC, Attribute::Italic),
        (Modifier::UNDERLINED, Attribute::Underlined),
        (Modifier::SLOW_BLINK, Attribute::SlowBlink),
        (Modifier::RAPID_BLINK, Attribute::RapidBlink),
        (Modifier::REVERSED, Attribute::Reverse),
        (Modifier::HIDDEN, Attribute::Hidden),
        (Modifier::CROSSED_OUT, Attribute::CrossedOut),
    ] {
        if modifiers.contains(flag) {
            out.queue(SetAttribute(attribute))?;
        }
    }
    Ok(())
}

fn to_crossterm(color: Color) -> CColor {
    match color {
        Color::Reset => CColor::Reset,
        Color::Black => CColor::Black,
        Color::Red => CColor::DarkRed,
        Color::Green => CColor::DarkGreen,
        Color::Yellow => CColor::DarkYellow,
        Color::Blue => CColor::DarkBlue,
        Color::Magenta => CColor::DarkMagenta,
        Color::Cyan => CColor::DarkCyan,
        Color::Gray => CColor::Grey,
        Color::DarkGray => CColor::DarkGrey,
        Color::LightRed => CColor::Red,
        Color::LightGreen => CColor::Green,
        Color::LightYellow => CColor::Yellow,
        Color::LightBlue => CColor::Blue,
        Color::LightMagenta => CColor::Magenta,
        Color::LightCyan => CColor::Cyan,
        Color::White => CColor::White,
        Color::Rgb(r, g, b) => CColor::Rgb { r, g, b },
        Color::Indexed(i) => CColor::AnsiValue(i),
    }
}
