use super::input::CursorMove;
use crate::model::{Note, NoteId, NotebookId};

/// What the buffer will be committed as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    New { notebook_id: NotebookId },
    Existing { note_id: NoteId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorField {
    Title,
    Content,
}

/// Working copy of a note. Columns are counted in chars, not bytes.
#[derive(Debug, Clone)]
pub struct EditorBuffer {
    pub target: EditTarget,
    pub notebook_id: NotebookId,
    pub title: String,
    pub lines: Vec<String>,
    pub field: EditorField,
    pub title_col: usize,
    pub line: usize,
    pub col: usize,
    pub dirty: bool,
    /// Set when the last save attempt failed; cleared by the next edit.
    pub save_failed: bool,
}

impl EditorBuffer {
    pub fn new_note(notebook_id: NotebookId) -> Self {
        EditorBuffer {
            target: EditTarget::New {
                notebook_id: notebook_id.clone(),
            },
            notebook_id,
            title: String::new(),
            lines: vec![String::new()],
            field: EditorField::Title,
            title_col: 0,
            line: 0,
            col: 0,
            dirty: false,
            save_failed: false,
        }
    }

    pub fn from_note(note: &Note) -> Self {
        let lines: Vec<String> = note.content.split('\n').map(str::to_string).collect();
        EditorBuffer {
            target: EditTarget::Existing {
                note_id: note.id.clone(),
            },
            notebook_id: note.notebook_id.clone(),
            title: note.title.clone(),
            title_col: note.title.chars().count(),
            lines,
            field: EditorField::Content,
            line: 0,
            col: 0,
            dirty: false,
            save_failed: false,
        }
    }

    pub fn content(&self) -> String {
        self.lines.join("\n")
    }

    pub fn switch_field(&mut self) {
        self.field = match self.field {
            EditorField::Title => EditorField::Content,
            EditorField::Content => EditorField::Title,
        };
    }

    pub fn insert_char(&mut self, ch: char) {
        match self.field {
            EditorField::Title => {
                let at = byte_index(&self.title, self.title_col);
                self.title.insert(at, ch);
                self.title_col += 1;
            }
            EditorField::Content => {
                let line = &mut self.lines[self.line];
                let at = byte_index(line, self.col);
                line.insert(at, ch);
                self.col += 1;
            }
        }
        self.touch();
    }

    /// Splits the current line. In the title field Enter moves to the content.
    pub fn newline(&mut self) {
        if self.field == EditorField::Title {
            self.field = EditorField::Content;
            return;
        }
        let line = &mut self.lines[self.line];
        let at = byte_index(line, self.col);
        let rest = line.split_off(at);
        self.lines.insert(self.line + 1, rest);
        self.line += 1;
        self.col = 0;
        self.touch();
    }

    pub fn backspace(&mut self) {
        match self.field {
            EditorField::Title => {
                if self.title_col == 0 {
                    return;
                }
                let at = byte_index(&self.title, self.title_col - 1);
                self.title.remove(at);
                self.title_col -= 1;
            }
            EditorField::Content => {
                if self.col > 0 {
                    let line = &mut self.lines[self.line];
                    let at = byte_index(line, self.col - 1);
                    line.remove(at);
                    self.col -= 1;
                } else if self.line > 0 {
                    let current = self.lines.remove(self.line);
                    self.line -= 1;
                    self.col = char_len(&self.lines[self.line]);
                    self.lines[self.line].push_str(&current);
                } else {
                    return;
                }
            }
        }
        self.touch();
    }

    pub fn delete(&mut self) {
        match self.field {
            EditorField::Title => {
                if self.title_col >= char_len(&self.title) {
                    return;
                }
                let at = byte_index(&self.title, self.title_col);
                self.title.remove(at);
            }
            EditorField::Content => {
                if self.col < char_len(&self.lines[self.line]) {
                    let line = &mut self.lines[self.line];
                    let at = byte_index(line, self.col);
                    line.remove(at);
                } else if self.line + 1 < self.lines.len() {
                    let next = self.lines.remove(self.line + 1);
                    self.lines[self.line].push_str(&next);
                } else {
                    return;
                }
            }
        }
        self.touch();
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.save_failed = false;
    }

    pub fn move_cursor(&mut self, movement: CursorMove) {
        match self.field {
            EditorField::Title => self.move_in_title(movement),
            EditorField::Content => self.move_in_content(movement),
        }
    }

    fn move_in_title(&mut self, movement: CursorMove) {
        let len = char_len(&self.title);
        match movement {
            CursorMove::Left => self.title_col = self.title_col.saturating_sub(1),
            CursorMove::Right => self.title_col = (self.title_col + 1).min(len),
            CursorMove::Home => self.title_col = 0,
            CursorMove::End => self.title_col = len,
            CursorMove::Down => self.field = EditorField::Content,
            CursorMove::Up => {}
        }
    }

    fn move_in_content(&mut self, movement: CursorMove) {
        match movement {
            CursorMove::Up => {
                if self.line == 0 {
                    self.field = EditorField::Title;
                } else {
                    self.line -= 1;
                    self.col = self.col.min(char_len(&self.lines[self.line]));
                }
            }
            CursorMove::Down => {
                if self.line + 1 < self.lines.len() {
                    self.line += 1;
                    self.col = self.col.min(char_len(&self.lines[self.line]));
                }
            }
            CursorMove::Left => {
                if self.col > 0 {
                    self.col -= 1;
                } else if self.line > 0 {
                    self.line -= 1;
                    self.col = char_len(&self.lines[self.line]);
                }
            }
            CursorMove::Right => {
                if self.col < char_len(&self.lines[self.line]) {
                    self.col += 1;
                } else if self.line + 1 < self.lines.len() {
                    self.line += 1;
                    self.col = 0;
                }
            }
            CursorMove::Home => self.col = 0,
            CursorMove::End => self.col = char_len(&self.lines[self.line]),
        }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn byte_index(text: &str, col: usize) -> usize {
    text.char_indices()
        .nth(col)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}
