use super::app::{App, DeleteTarget, Mode, Panel, Pending, Prompt, PromptKind, SearchScope, StatusKind};
use super::editor::{EditTarget, EditorBuffer, EditorField};
use super::screen::{char_columns, str_columns, BorderKind, Grid, ScreenBuffer};
use crate::icons::IconSet;
use chrono::Local;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use std::io::{self, Write};

const SIDEBAR_MAX: u16 = 28;
const HELP_WIDTH: u16 = 52;
const HELP_HEIGHT: u16 = 26;

const HELP_LINES: &[(&str, &str)] = &[
    ("j / Down", "Move down"),
    ("k / Up", "Move up"),
    ("h / Left", "Focus notebooks"),
    ("l / Right", "Focus notes"),
    ("Tab", "Toggle focus"),
    ("Enter", "Open notebook / edit note"),
    ("n", "New note"),
    ("N", "New notebook"),
    ("r", "Rename notebook"),
    ("e", "Edit note"),
    ("m", "Move note to another notebook"),
    ("d", "Delete note or empty notebook"),
    ("D", "Delete notebook and its notes"),
    ("/", "Search"),
    ("?", "This help"),
    ("q", "Quit"),
    ("", ""),
    ("Ctrl+S", "Save note"),
    ("Esc", "Close editor (saves changes)"),
    ("Tab", "Switch title / content"),
    ("Ctrl+T", "Search scope"),
];

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn accent() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

fn danger() -> Style {
    Style::default()
        .fg(Color::LightRed)
        .add_modifier(Modifier::BOLD)
}

fn reversed() -> Style {
    Style::default().add_modifier(Modifier::REVERSED)
}

/// Draws the application state into a grid. Holds nothing but the glyph set,
/// so a frame depends only on the `App` and the grid size.
pub struct Renderer {
    icons: &'static IconSet,
}

impl Renderer {
    pub fn new(icons: &'static IconSet) -> Self {
        Renderer { icons }
    }

    /// Draws a frame and writes the difference to `out`.
    pub fn render<W: Write>(
        &self,
        app: &App,
        screen: &mut ScreenBuffer,
        out: &mut W,
    ) -> io::Result<usize> {
        let grid = screen.begin_frame();
        self.draw(app, grid);
        screen.flush(out)
    }

    pub fn draw(&self, app: &App, grid: &mut Grid) {
        let area = grid.area();
        if area.width < 20 || area.height < 6 {
            grid.put_str(0, 0, "Terminal too small", area.width, danger());
            return;
        }
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

        self.draw_header(app, grid, rows[0]);
        match &app.mode {
            Mode::Editor(buffer) => self.draw_editor(buffer, app, grid, rows[1]),
            Mode::Search => self.draw_search(app, grid, rows[1]),
            Mode::List(pending) => {
                self.draw_list(app, grid, rows[1]);
                match pending {
                    Some(Pending::Delete(target)) => self.draw_delete_confirm(target, grid, area),
                    Some(Pending::Prompt(prompt)) => self.draw_prompt(prompt, grid, area),
                    None => {}
                }
            }
            Mode::Help => {
                self.draw_list(app, grid, rows[1]);
                self.draw_help(grid, area);
            }
            Mode::ConfirmQuit => {
                self.draw_list(app, grid, rows[1]);
                self.draw_quit_confirm(grid, area);
            }
        }
        self.draw_status(app, grid, rows[2]);
    }

    fn draw_header(&self, app: &App, grid: &mut Grid, area: Rect) {
        grid.fill(area, reversed());
        let title = format!(" {} notes-tui", self.icons.app);
        let used = grid.put_str(area.x, area.y, &title, area.width, reversed().patch(bold()));
        let location = app.repo().location();
        let room = area.width.saturating_sub(used + 2);
        let shown = tail_fit(&location, room);
        let x = area.right().saturating_sub(str_columns(shown) + 1);
        grid.put_str(x, area.y, shown, room, reversed());
    }

    fn draw_list(&self, app: &App, grid: &mut Grid, area: Rect) {
        let sidebar = SIDEBAR_MAX.min(area.width / 4);
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(sidebar), Constraint::Min(1)])
            .split(area);
        self.draw_notebooks(app, grid, cols[0]);
        self.draw_notes(app, grid, cols[1]);
    }

    fn panel_border(focused: bool) -> Style {
        if focused {
            Style::default().fg(Color::Cyan)
        } else {
            dim()
        }
    }

    fn selection_style(focused: bool) -> Style {
        if focused {
            reversed()
        } else {
            bold()
        }
    }

    fn draw_notebooks(&self, app: &App, grid: &mut Grid, area: Rect) {
        let focused = app.focus() == Panel::Notebooks;
        grid.draw_box(
            area,
            Some(&format!("{} Notebooks", self.icons.notebook)),
            BorderKind::Plain,
            Self::panel_border(focused),
        );
        let inner = inner(area);
        if inner.height == 0 {
            return;
        }
        let notebooks = app.repo().list_notebooks();
        let offset = scroll_offset(app.selected_notebook, inner.height as usize);
        for (row, (i, nb)) in notebooks
            .iter()
            .enumerate()
            .skip(offset)
            .take(inner.height as usize)
            .enumerate()
        {
            let selected = i == app.selected_notebook;
            let icon = if selected {
                self.icons.folder_open
            } else {
                self.icons.folder
            };
            let count = app.repo().note_count(&nb.id);
            let label = format!("{} {} ({})", icon, nb.name, count);
            let style = if selected {
                Self::selection_style(focused)
            } else {
                Style::default()
            };
            grid.put_line(inner.x, inner.y + row as u16, &label, inner.width, style);
        }
    }

    fn draw_notes(&self, app: &App, grid: &mut Grid, area: Rect) {
        let focused = app.focus() == Panel::Notes;
        let title = app
            .repo()
            .list_notebooks()
            .get(app.selected_notebook)
            .map(|nb| format!("{} {}", self.icons.note, nb.name))
            .unwrap_or_else(|| "Notes".to_string());
        grid.draw_box(area, Some(&title), BorderKind::Plain, Self::panel_border(focused));
        let inner = inner(area);
        if inner.height == 0 {
            return;
        }
        let notes = app.current_notes();
        if notes.is_empty() {
            grid.put_str(
                inner.x + 1,
                inner.y,
                "No notes yet. Press n to create one.",
                inner.width.saturating_sub(1),
                dim(),
            );
            return;
        }
        let offset = scroll_offset(app.selected_note, inner.height as usize);
        for (row, (i, note)) in notes
            .iter()
            .enumerate()
            .skip(offset)
            .take(inner.height as usize)
            .enumerate()
        {
            let y = inner.y + row as u16;
            let selected = i == app.selected_note;
            let style = if selected {
                Self::selection_style(focused)
            } else {
                Style::default()
            };
            let marker = if selected { self.icons.selected } else { " " };
            grid.put_line(
                inner.x,
                y,
                &format!("{} {}", marker, note.title),
                inner.width,
                style,
            );
            let date = note
                .updated_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string();
            let date_w = str_columns(&date);
            if inner.width > date_w + 20 {
                let x = inner.right() - date_w - 1;
                let date_style = if selected { style } else { dim() };
                grid.put_str(x - 1, y, " ", date_w + 1, style);
                grid.put_str(x, y, &date, date_w, date_style);
            }
        }
    }

    fn draw_editor(&self, buffer: &EditorBuffer, app: &App, grid: &mut Grid, area: Rect) {
        let notebook = app
            .repo()
            .notebook(&buffer.notebook_id)
            .map(|nb| nb.name.as_str())
            .unwrap_or("?");
        let heading = match buffer.target {
            EditTarget::New { .. } => format!("{} New note in {}", self.icons.edit, notebook),
            EditTarget::Existing { .. } => format!("{} Editing in {}", self.icons.edit, notebook),
        };
        grid.draw_box(area, Some(&heading), BorderKind::Plain, accent());
        let inner = inner(area);
        if inner.height < 3 || inner.width < 10 {
            return;
        }

        let label = "Title: ";
        let label_w = str_columns(label);
        let title_style = if buffer.field == EditorField::Title {
            bold()
        } else {
            Style::default()
        };
        grid.put_str(inner.x, inner.y, label, label_w, dim());
        let title_room = inner.width - label_w;
        let (title, title_x) = scroll_to_cursor(&buffer.title, buffer.title_col, title_room);
        grid.put_str(inner.x + label_w, inner.y, title, title_room, title_style);
        for x in inner.left()..inner.right() {
            grid.set(x, inner.y + 1, '─', dim());
        }

        let body = Rect::new(inner.x, inner.y + 2, inner.width, inner.height - 2);
        let line_offset = scroll_offset(buffer.line, body.height as usize);
        let mut cursor_x = 0;
        for (row, line) in buffer
            .lines
            .iter()
            .skip(line_offset)
            .take(body.height as usize)
            .enumerate()
        {
            let visible = if line_offset + row == buffer.line {
                let (visible, x) = scroll_to_cursor(line, buffer.col, body.width);
                cursor_x = x;
                visible
            } else {
                line.as_str()
            };
            grid.put_str(body.x, body.y + row as u16, visible, body.width, Style::default());
        }

        match buffer.field {
            EditorField::Title => grid.set_cursor(inner.x + label_w + title_x, inner.y),
            EditorField::Content => grid.set_cursor(
                body.x + cursor_x,
                body.y + (buffer.line - line_offset) as u16,
            ),
        }
    }

    fn draw_search(&self, app: &App, grid: &mut Grid, area: Rect) {
        grid.draw_box(
            area,
            Some(&format!("{} Search", self.icons.search)),
            BorderKind::Plain,
            accent(),
        );
        let inner = inner(area);
        if inner.height < 3 || inner.width < 10 {
            return;
        }
        let search = &app.search;
        let scope = match search.scope {
            SearchScope::All => "[all notebooks]".to_string(),
            SearchScope::FocusedNotebook => format!(
                "[{}]",
                app.repo()
                    .list_notebooks()
                    .get(app.selected_notebook)
                    .map(|nb| nb.name.as_str())
                    .unwrap_or("?")
            ),
        };
        let scope_w = str_columns(&scope);
        let prompt = "> ";
        let query_room = inner.width.saturating_sub(scope_w + 3);
        let query_len = search.query.chars().count();
        let (query, query_x) = scroll_to_cursor(&search.query, query_len, query_room);
        grid.put_str(inner.x, inner.y, prompt, 2, accent());
        grid.put_str(inner.x + 2, inner.y, query, query_room, bold());
        grid.put_str(inner.right().saturating_sub(scope_w), inner.y, &scope, scope_w, dim());

        let summary = if search.query.is_empty() {
            "Type to search titles and content".to_string()
        } else {
            format!("{} result(s)", search.results.len())
        };
        grid.put_str(inner.x, inner.y + 1, &summary, inner.width, dim());

        let body = Rect::new(inner.x, inner.y + 2, inner.width, inner.height - 2);
        let per_page = (body.height / 2).max(1) as usize;
        let offset = scroll_offset(search.selected, per_page);
        for (slot, (i, id)) in search
            .results
            .iter()
            .enumerate()
            .skip(offset)
            .take(per_page)
            .enumerate()
        {
            let note = match app.repo().note(id) {
                Some(note) => note,
                None => continue,
            };
            let y = body.y + (slot as u16) * 2;
            let selected = i == search.selected;
            let style = if selected { reversed() } else { Style::default() };
            let notebook = app
                .repo()
                .notebook(&note.notebook_id)
                .map(|nb| nb.name.as_str())
                .unwrap_or("?");
            grid.put_line(
                body.x,
                y,
                &format!("{} {}  [{}]", self.icons.note, note.title, notebook),
                body.width,
                style.patch(bold()),
            );
            if y + 1 < body.bottom() {
                let preview = note.preview(body.width.saturating_sub(4) as usize);
                grid.put_line(body.x, y + 1, &format!("    {}", preview), body.width, dim());
            }
        }

        grid.set_cursor(inner.x + 2 + query_x, inner.y);
    }

    fn draw_help(&self, grid: &mut Grid, screen: Rect) {
        let area = centered(HELP_WIDTH, HELP_HEIGHT, screen);
        grid.draw_box(
            area,
            Some(&format!("{} Help", self.icons.help)),
            BorderKind::Double,
            accent(),
        );
        let inner = inner(area);
        for (row, (keys, action)) in HELP_LINES.iter().take(inner.height as usize).enumerate() {
            let y = inner.y + row as u16;
            grid.put_str(inner.x + 1, y, keys, 12, bold());
            grid.put_str(inner.x + 14, y, action, inner.width.saturating_sub(14), Style::default());
        }
        if inner.height as usize > HELP_LINES.len() + 1 {
            grid.put_str(
                inner.x + 1,
                inner.bottom() - 1,
                "Press any key to close",
                inner.width.saturating_sub(1),
                dim(),
            );
        }
    }

    fn draw_dialog(&self, grid: &mut Grid, screen: Rect, title: &str, lines: &[(String, Style)]) -> Rect {
        let widest = lines
            .iter()
            .map(|(text, _)| str_columns(text))
            .chain(std::iter::once(str_columns(title) + 4))
            .max()
            .unwrap_or(0);
        let area = centered(widest + 4, lines.len() as u16 + 2, screen);
        grid.draw_box(area, Some(title), BorderKind::Plain, danger());
        let inner = inner(area);
        for (row, (text, style)) in lines.iter().take(inner.height as usize).enumerate() {
            grid.put_str(inner.x + 1, inner.y + row as u16, text, inner.width.saturating_sub(1), *style);
        }
        inner
    }

    fn draw_quit_confirm(&self, grid: &mut Grid, screen: Rect) {
        self.draw_dialog(
            grid,
            screen,
            &format!("{} Quit", self.icons.warning),
            &[
                ("Quit notes-tui?".to_string(), bold()),
                (String::new(), Style::default()),
                ("y to quit, n or Esc to stay".to_string(), dim()),
            ],
        );
    }

    fn draw_delete_confirm(&self, target: &DeleteTarget, grid: &mut Grid, screen: Rect) {
        let question = match target {
            DeleteTarget::Note { title, .. } => format!("Delete note \"{}\"?", title),
            DeleteTarget::Notebook { name, .. } => format!("Delete notebook \"{}\"?", name),
            DeleteTarget::NotebookCascade { name, notes, .. } => {
                format!("Delete notebook \"{}\" and its {} note(s)?", name, notes)
            }
        };
        self.draw_dialog(
            grid,
            screen,
            &format!("{} Confirm Delete", self.icons.warning),
            &[
                (question, danger()),
                (String::new(), Style::default()),
                ("y to confirm, n or Esc to cancel".to_string(), dim()),
            ],
        );
    }

    fn draw_prompt(&self, prompt: &Prompt, grid: &mut Grid, screen: Rect) {
        let title = match prompt.kind {
            PromptKind::NewNotebook => format!("{} New notebook", self.icons.notebook),
            PromptKind::RenameNotebook(_) => format!("{} Rename notebook", self.icons.edit),
            PromptKind::MoveNote(_) => format!("{} Move note to notebook", self.icons.folder),
        };
        let field_w = 32usize.max(str_columns(&prompt.value) as usize + 3);
        let inner = self.draw_dialog(
            grid,
            screen,
            &title,
            &[
                (format!("{:width$}", "", width = field_w), Style::default()),
                (String::new(), Style::default()),
                ("Enter to save, Esc to cancel".to_string(), dim()),
            ],
        );
        if inner.height == 0 {
            return;
        }
        let room = inner.width.saturating_sub(3);
        let len = prompt.value.chars().count();
        let (value, cursor_x) = scroll_to_cursor(&prompt.value, len, room);
        grid.put_str(inner.x + 1, inner.y, "> ", 2, accent());
        grid.put_str(inner.x + 3, inner.y, value, room, bold());
        grid.set_cursor(inner.x + 3 + cursor_x, inner.y);
    }

    fn draw_status(&self, app: &App, grid: &mut Grid, area: Rect) {
        grid.fill(area, reversed());
        if let Some(status) = app.status() {
            let (icon, style) = match status.kind {
                StatusKind::Info => (self.icons.info, reversed()),
                StatusKind::Error => (
                    self.icons.error,
                    Style::default()
                        .fg(Color::White)
                        .bg(Color::Red)
                        .add_modifier(Modifier::BOLD),
                ),
            };
            grid.put_line(
                area.x,
                area.y,
                &format!(" {} {}", icon, status.text),
                area.width,
                style,
            );
            return;
        }
        let hints = match &app.mode {
            Mode::List(Some(_)) | Mode::ConfirmQuit => "",
            Mode::List(None) => " n new  N notebook  e edit  d delete  / search  ? help  q quit",
            Mode::Editor(_) => " Ctrl+S save  Esc close  Tab switch field",
            Mode::Search => " Enter open  Tab/Down next  Ctrl+T scope  Esc back",
            Mode::Help => " Press any key to close help",
        };
        grid.put_str(area.x, area.y, hints, area.width, reversed());
        if let Mode::Editor(buffer) = &app.mode {
            let mark = if buffer.dirty {
                self.icons.modified
            } else {
                self.icons.saved
            };
            let position = match buffer.field {
                EditorField::Title => format!("Title, Col {}", buffer.title_col + 1),
                EditorField::Content => format!("Ln {}, Col {}", buffer.line + 1, buffer.col + 1),
            };
            let right = format!("{}  {} ", position, mark);
            let w = str_columns(&right);
            if area.width > w + 42 {
                grid.put_str(area.right() - w, area.y, &right, w, reversed());
            }
        }
    }
}

fn inner(area: Rect) -> Rect {
    Rect::new(
        area.x + 1,
        area.y + 1,
        area.width.saturating_sub(2),
        area.height.saturating_sub(2),
    )
}

/// Drops leading chars until the cursor, sitting after `cursor` chars, fits
/// inside `room` columns. Returns the visible tail and the cursor column.
fn scroll_to_cursor(text: &str, cursor: usize, room: u16) -> (&str, u16) {
    let room = room.max(1);
    let mut col = text
        .chars()
        .take(cursor)
        .fold(0u16, |acc, ch| acc.saturating_add(char_columns(ch)));
    let mut start = 0;
    for (i, ch) in text.char_indices().take(cursor) {
        if col < room {
            break;
        }
        col -= char_columns(ch);
        start = i + ch.len_utf8();
    }
    (&text[start..], col)
}

/// Longest suffix of `text` that fits in `room` columns.
fn tail_fit(text: &str, room: u16) -> &str {
    let mut width = str_columns(text);
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        if width <= room {
            break;
        }
        width -= char_columns(ch);
        start = i + ch.len_utf8();
    }
    &text[start..]
}

/// First row to show so that `selected` stays inside a window of `rows`.
fn scroll_offset(selected: usize, rows: usize) -> usize {
    if rows == 0 {
        return 0;
    }
    selected.saturating_sub(rows - 1)
}

fn centered(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    Rect::new(
        r.x + (r.width - width) / 2,
        r.y + (r.height - height) / 2,
        width,
        height,
    )
}
