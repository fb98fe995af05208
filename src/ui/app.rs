use super::editor::{EditTarget, EditorBuffer};
use super::input::{map_key, Command, InputContext, Pending as PendingKind};
use crate::model::{Note, NoteId, NotebookId, RepoError, UNTITLED};
use crate::repository::Repository;
use crossterm::event::KeyEvent;
use log::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Editor,
    Search,
    Help,
    ConfirmQuit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Notebooks,
    Notes,
}

/// The active view. The editor buffer only exists while editing.
pub enum Mode {
    List(Option<Pending>),
    Editor(EditorBuffer),
    Search,
    Help,
    ConfirmQuit,
}

pub enum Pending {
    Delete(DeleteTarget),
    Prompt(Prompt),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Note { id: NoteId, title: String },
    Notebook { id: NotebookId, name: String },
    NotebookCascade { id: NotebookId, name: String, notes: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    NewNotebook,
    RenameNotebook(NotebookId),
    MoveNote(NoteId),
}

pub struct Prompt {
    pub kind: PromptKind,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    All,
    FocusedNotebook,
}

pub struct SearchState {
    pub query: String,
    pub results: Vec<NoteId>,
    pub selected: usize,
    pub scope: SearchScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

pub struct App {
    pub(super) repo: Repository,
    pub(super) mode: Mode,
    pub(super) focus: Panel,
    pub(super) selected_notebook: usize,
    pub(super) selected_note: usize,
    pub(super) search: SearchState,
    pub(super) status: Option<Status>,
}

impl SearchState {
    fn new() -> Self {
        SearchState {
            query: String::new(),
            results: Vec::new(),
            selected: 0,
            scope: SearchScope::All,
        }
    }
}

impl App {
    pub fn new(repo: Repository) -> Self {
        App {
            repo,
            mode: Mode::List(None),
            focus: Panel::Notes,
            selected_notebook: 0,
            selected_note: 0,
            search: SearchState::new(),
            status: None,
        }
    }

    pub fn view(&self) -> View {
        match self.mode {
            Mode::List(_) => View::List,
            Mode::Editor(_) => View::Editor,
            Mode::Search => View::Search,
            Mode::Help => View::Help,
            Mode::ConfirmQuit => View::ConfirmQuit,
        }
    }

    pub fn focus(&self) -> Panel {
        self.focus
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    #[cfg(test)]
    pub fn editor(&self) -> Option<&EditorBuffer> {
        match &self.mode {
            Mode::Editor(buffer) => Some(buffer),
            _ => None,
        }
    }

    pub fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Some(Status {
            kind,
            text: text.into(),
        });
    }

    pub fn input_context(&self) -> InputContext {
        let pending = match &self.mode {
            Mode::List(Some(Pending::Delete(_))) => Some(PendingKind::Confirm),
            Mode::List(Some(Pending::Prompt(_))) => Some(PendingKind::Prompt),
            _ => None,
        };
        InputContext {
            view: self.view(),
            focus: self.focus,
            pending,
        }
    }

    /// Feeds one key press through the state machine. Returns true once the
    /// user has confirmed quitting.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match map_key(key, &self.input_context()) {
            Some(command) => self.dispatch(command),
            None => false,
        }
    }

    pub fn dispatch(&mut self, command: Command) -> bool {
        debug!("{:?} in {:?}", command, self.view());
        self.status = None;
        let mode = std::mem::replace(&mut self.mode, Mode::List(None));
        let (next, quit) = match mode {
            Mode::List(None) => (self.on_list(command), false),
            Mode::List(Some(Pending::Delete(target))) => (self.on_delete_confirm(target, command), false),
            Mode::List(Some(Pending::Prompt(prompt))) => (self.on_prompt(prompt, command), false),
            Mode::Editor(buffer) => (self.on_editor(buffer, command), false),
            Mode::Search => (self.on_search(command), false),
            Mode::Help => (Mode::List(None), false),
            Mode::ConfirmQuit => match command {
                Command::Confirm => {
                    info!("quit confirmed");
                    (Mode::ConfirmQuit, true)
                }
                Command::Deny | Command::CancelAny => (Mode::List(None), false),
                _ => (Mode::ConfirmQuit, false),
            },
        };
        self.mode = next;
        self.clamp_selection();
        quit
    }

    pub fn current_notebook_id(&self) -> Option<NotebookId> {
        self.repo
            .list_notebooks()
            .get(self.selected_notebook)
            .map(|nb| nb.id.clone())
    }

    pub fn current_notes(&self) -> Vec<&Note> {
        match self.repo.list_notebooks().get(self.selected_notebook) {
            Some(nb) => self.repo.list_notes(&nb.id),
            None => Vec::new(),
        }
    }

    fn selected_note(&self) -> Option<&Note> {
        self.current_notes().get(self.selected_note).copied()
    }

    fn on_list(&mut self, command: Command) -> Mode {
        match command {
            Command::NavigateDown => {
                match self.focus {
                    Panel::Notebooks => {
                        if self.selected_notebook + 1 < self.repo.list_notebooks().len() {
                            self.selected_notebook += 1;
                            self.selected_note = 0;
                        }
                    }
                    Panel::Notes => {
                        if self.selected_note + 1 < self.current_notes().len() {
                            self.selected_note += 1;
                        }
                    }
                }
                Mode::List(None)
            }
            Command::NavigateUp => {
                match self.focus {
                    Panel::Notebooks => {
                        if self.selected_notebook > 0 {
                            self.selected_notebook -= 1;
                            self.selected_note = 0;
                        }
                    }
                    Panel::Notes => self.selected_note = self.selected_note.saturating_sub(1),
                }
                Mode::List(None)
            }
            Command::FocusLeft => {
                self.focus = Panel::Notebooks;
                Mode::List(None)
            }
            Command::FocusRight => {
                self.focus = Panel::Notes;
                Mode::List(None)
            }
            Command::ToggleFocus => {
                self.focus = match self.focus {
                    Panel::Notebooks => Panel::Notes,
                    Panel::Notes => Panel::Notebooks,
                };
                Mode::List(None)
            }
            Command::OpenSelected if self.focus == Panel::Notebooks => {
                self.focus = Panel::Notes;
                Mode::List(None)
            }
            Command::OpenSelected | Command::EditSelected => match self.selected_note() {
                Some(note) => {
                    debug!("editing {}", note.id);
                    Mode::Editor(EditorBuffer::from_note(note))
                }
                None => {
                    self.set_status(StatusKind::Info, "No note selected");
                    Mode::List(None)
                }
            },
            Command::NewNote => match self.current_notebook_id() {
                Some(id) => Mode::Editor(EditorBuffer::new_note(id)),
                None => Mode::List(None),
            },
            Command::NewNotebook => Mode::List(Some(Pending::Prompt(Prompt {
                kind: PromptKind::NewNotebook,
                value: String::new(),
            }))),
            Command::RenameNotebook => {
                match self.repo.list_notebooks().get(self.selected_notebook) {
                    Some(nb) => Mode::List(Some(Pending::Prompt(Prompt {
                        kind: PromptKind::RenameNotebook(nb.id.clone()),
                        value: nb.name.clone(),
                    }))),
                    None => Mode::List(None),
                }
            }
            Command::MoveSelected => match self.selected_note() {
                Some(note) => Mode::List(Some(Pending::Prompt(Prompt {
                    kind: PromptKind::MoveNote(note.id.clone()),
                    value: String::new(),
                }))),
                None => {
                    self.set_status(StatusKind::Info, "No note selected");
                    Mode::List(None)
                }
            },
            Command::DeleteSelected => {
                let target = match self.focus {
                    Panel::Notes => self.selected_note().map(|note| DeleteTarget::Note {
                        id: note.id.clone(),
                        title: note.title.clone(),
                    }),
                    Panel::Notebooks => self
                        .repo
                        .list_notebooks()
                        .get(self.selected_notebook)
                        .map(|nb| DeleteTarget::Notebook {
                            id: nb.id.clone(),
                            name: nb.name.clone(),
                        }),
                };
                match target {
                    Some(target) => Mode::List(Some(Pending::Delete(target))),
                    None => {
                        self.set_status(StatusKind::Info, "Nothing to delete");
                        Mode::List(None)
                    }
                }
            }
            Command::DeleteCascade => {
                match self.repo.list_notebooks().get(self.selected_notebook) {
                    Some(nb) => Mode::List(Some(Pending::Delete(DeleteTarget::NotebookCascade {
                        id: nb.id.clone(),
                        name: nb.name.clone(),
                        notes: self.repo.note_count(&nb.id),
                    }))),
                    None => Mode::List(None),
                }
            }
            Command::EnterSearch => {
                self.search = SearchState::new();
                Mode::Search
            }
            Command::ShowHelp => Mode::Help,
            Command::Quit => Mode::ConfirmQuit,
            _ => Mode::List(None),
        }
    }

    fn on_delete_confirm(&mut self, target: DeleteTarget, command: Command) -> Mode {
        match command {
            Command::Confirm => {
                let outcome = match &target {
                    DeleteTarget::Note { id, title } => self
                        .repo
                        .delete_note(id)
                        .map(|_| format!("Deleted note \"{}\"", title)),
                    DeleteTarget::Notebook { id, name } => self
                        .repo
                        .delete_notebook(id)
                        .map(|_| format!("Deleted notebook \"{}\"", name)),
                    DeleteTarget::NotebookCascade { id, name, .. } => self
                        .repo
                        .delete_notebook_cascade(id)
                        .map(|(_, n)| format!("Deleted notebook \"{}\" and {} note(s)", name, n)),
                };
                match outcome {
                    Ok(message) => {
                        info!("{}", message);
                        match target {
                            DeleteTarget::Note { .. } => {
                                self.selected_note = self.selected_note.saturating_sub(1)
                            }
                            _ => {
                                self.selected_notebook = self.selected_notebook.saturating_sub(1);
                                self.selected_note = 0;
                            }
                        }
                        self.set_status(StatusKind::Info, message);
                    }
                    Err(err) => self.report(err),
                }
                Mode::List(None)
            }
            Command::Deny | Command::CancelAny => {
                self.set_status(StatusKind::Info, "Delete cancelled");
                Mode::List(None)
            }
            _ => Mode::List(Some(Pending::Delete(target))),
        }
    }

    fn on_prompt(&mut self, mut prompt: Prompt, command: Command) -> Mode {
        match command {
            Command::InputChar(c) => prompt.value.push(c),
            Command::InputBackspace => {
                prompt.value.pop();
            }
            Command::CancelAny => return Mode::List(None),
            Command::Confirm => {
                let outcome = match &prompt.kind {
                    PromptKind::NewNotebook => self.repo.create_notebook(&prompt.value).map(|nb| {
                        self.selected_notebook = self.repo.list_notebooks().len() - 1;
                        self.selected_note = 0;
                        self.focus = Panel::Notebooks;
                        format!("Created notebook \"{}\"", nb.name)
                    }),
                    PromptKind::RenameNotebook(id) => self
                        .repo
                        .rename_notebook(id, &prompt.value)
                        .map(|nb| format!("Renamed notebook to \"{}\"", nb.name)),
                    PromptKind::MoveNote(id) => self.move_note_to(id, &prompt.value),
                };
                match outcome {
                    Ok(message) => {
                        self.set_status(StatusKind::Info, message);
                        return Mode::List(None);
                    }
                    Err(err) => self.report(err),
                }
            }
            _ => {}
        }
        Mode::List(Some(Pending::Prompt(prompt)))
    }

    /// Moves a note into the notebook called `name` and follows it there.
    fn move_note_to(&mut self, id: &str, name: &str) -> Result<String, RepoError> {
        let name = name.trim();
        let target = self
            .repo
            .list_notebooks()
            .iter()
            .find(|nb| nb.name == name)
            .map(|nb| nb.id.clone())
            .ok_or_else(|| RepoError::NotebookNotFound(name.to_string()))?;
        let note = self.repo.move_note(id, &target)?;
        self.select_note(&note);
        Ok(format!("Moved \"{}\" to \"{}\"", note.title, name))
    }

    fn on_editor(&mut self, mut buffer: EditorBuffer, command: Command) -> Mode {
        match command {
            Command::EditorInsertChar(c) => buffer.insert_char(c),
            Command::EditorNewline => buffer.newline(),
            Command::EditorBackspace => buffer.backspace(),
            Command::EditorDelete => buffer.delete(),
            Command::EditorMoveCursor(movement) => buffer.move_cursor(movement),
            Command::EditorSwitchField => buffer.switch_field(),
            Command::SaveEditor => return self.commit_editor(buffer),
            Command::ExitEditor => {
                if buffer.dirty && !buffer.save_failed {
                    return self.commit_editor(buffer);
                }
                if buffer.dirty {
                    warn!("discarding unsaved edits after a failed save");
                    self.set_status(StatusKind::Error, "Unsaved changes discarded");
                } else {
                    debug!("leaving editor without changes");
                }
                return Mode::List(None);
            }
            _ => {}
        }
        Mode::Editor(buffer)
    }

    /// Writes the buffer through the repository. On failure the editor stays
    /// open with the text untouched, and a second Esc discards it.
    fn commit_editor(&mut self, mut buffer: EditorBuffer) -> Mode {
        let title = if buffer.title.trim().is_empty() {
            UNTITLED.to_string()
        } else {
            buffer.title.clone()
        };
        let content = buffer.content();
        let outcome = match &buffer.target {
            EditTarget::New { notebook_id } => self.repo.create_note(notebook_id, &title, &content),
            EditTarget::Existing { note_id } => self.repo.update_note(note_id, &title, &content),
        };
        match outcome {
            Ok(note) => {
                info!("saved note {}", note.id);
                self.select_note(&note);
                self.set_status(StatusKind::Info, "Note saved");
                Mode::List(None)
            }
            Err(err) => {
                warn!("save failed: {}", err);
                self.set_status(StatusKind::Error, format!("{} (Esc again to discard)", err));
                buffer.save_failed = true;
                Mode::Editor(buffer)
            }
        }
    }

    fn on_search(&mut self, command: Command) -> Mode {
        match command {
            Command::InputChar(c) => {
                self.search.query.push(c);
                self.refresh_search();
            }
            Command::InputBackspace => {
                if self.search.query.pop().is_some() {
                    self.refresh_search();
                }
            }
            Command::ToggleSearchScope => {
                self.search.scope = match self.search.scope {
                    SearchScope::All => SearchScope::FocusedNotebook,
                    SearchScope::FocusedNotebook => SearchScope::All,
                };
                self.refresh_search();
            }
            Command::NavigateDown => {
                let n = self.search.results.len();
                if n > 0 {
                    self.search.selected = (self.search.selected + 1) % n;
                }
            }
            Command::NavigateUp => {
                let n = self.search.results.len();
                if n > 0 {
                    self.search.selected = (self.search.selected + n - 1) % n;
                }
            }
            Command::OpenSelected => {
                let note = self
                    .search
                    .results
                    .get(self.search.selected)
                    .and_then(|id| self.repo.note(id));
                if let Some(note) = note {
                    return Mode::Editor(EditorBuffer::from_note(note));
                }
            }
            Command::CancelAny => return Mode::List(None),
            _ => {}
        }
        Mode::Search
    }

    fn refresh_search(&mut self) {
        let scope = match self.search.scope {
            SearchScope::All => None,
            SearchScope::FocusedNotebook => self.current_notebook_id(),
        };
        self.search.results = self
            .repo
            .search(&self.search.query, scope.as_deref())
            .into_iter()
            .map(|note| note.id.clone())
            .collect();
        self.search.selected = 0;
    }

    fn select_note(&mut self, note: &Note) {
        if let Some(pos) = self
            .repo
            .list_notebooks()
            .iter()
            .position(|nb| nb.id == note.notebook_id)
        {
            self.selected_notebook = pos;
        }
        self.selected_note = self
            .current_notes()
            .iter()
            .position(|n| n.id == note.id)
            .unwrap_or(0);
        self.focus = Panel::Notes;
    }

    fn clamp_selection(&mut self) {
        let notebooks = self.repo.list_notebooks().len();
        self.selected_notebook = self.selected_notebook.min(notebooks.saturating_sub(1));
        let notes = self.current_notes().len();
        self.selected_note = self.selected_note.min(notes.saturating_sub(1));
    }

    fn report(&mut self, err: RepoError) {
        warn!("command failed: {}", err);
        self.set_status(StatusKind::Error, err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;
    use crate::ui::input::CursorMove;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn app() -> (App, MemoryStorage) {
        let storage = MemoryStorage::new();
        let (repo, _) = Repository::open(Box::new(storage.clone()));
        (App::new(repo), storage)
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            let code = if ch == '\n' {
                KeyCode::Enter
            } else {
                KeyCode::Char(ch)
            };
            app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
        }
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn new_note(app: &mut App, title: &str, content: &str) -> Note {
        app.dispatch(Command::NewNote);
        type_text(app, title);
        app.dispatch(Command::EditorSwitchField);
        type_text(app, content);
        app.dispatch(Command::SaveEditor);
        app.current_notes()
            .into_iter()
            .find(|n| n.title == title)
            .cloned()
            .unwrap()
    }

    #[test]
    fn starts_in_list_view() {
        let (app, _) = app();
        assert_eq!(app.view(), View::List);
        assert!(app.editor().is_none());
    }

    #[test]
    fn new_note_scenario() {
        let (mut app, storage) = app();
        app.dispatch(Command::NewNote);
        assert_eq!(app.view(), View::Editor);
        assert!(app.editor().is_some());
        type_text(&mut app, "Test\nHello");
        app.dispatch(Command::SaveEditor);

        assert_eq!(app.view(), View::List);
        assert!(app.editor().is_none());
        let notes = app.repo().list_notes("default");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Test");
        assert_eq!(notes[0].content, "Hello");
        assert_eq!(notes[0].created_at, notes[0].updated_at);
        assert_eq!(storage.saved().unwrap().notes.len(), 1);
    }

    #[test]
    fn escape_autosaves_dirty_edit() {
        let (mut app, _) = app();
        let note = new_note(&mut app, "Test", "Hello");
        app.dispatch(Command::EditSelected);
        assert_eq!(app.view(), View::Editor);
        app.dispatch(Command::EditorMoveCursor(CursorMove::End));
        type_text(&mut app, ", world");
        press(&mut app, KeyCode::Esc);

        assert_eq!(app.view(), View::List);
        let saved = app.repo().note(&note.id).unwrap();
        assert_eq!(saved.content, "Hello, world");
        assert!(saved.updated_at > note.updated_at);
        assert_eq!(saved.created_at, note.created_at);
    }

    #[test]
    fn escape_without_changes_discards() {
        let (mut app, storage) = app();
        app.dispatch(Command::NewNote);
        app.dispatch(Command::ExitEditor);
        assert_eq!(app.view(), View::List);
        assert!(app.repo().notes().is_empty());
        assert_eq!(storage.saves(), 0);
    }

    #[test]
    fn editing_works_on_a_copy_until_saved() {
        let (mut app, _) = app();
        let note = new_note(&mut app, "Title", "body");
        app.dispatch(Command::EditSelected);
        type_text(&mut app, "xyz");
        assert_eq!(app.repo().note(&note.id).unwrap().content, "body");
    }

    #[test]
    fn failed_save_keeps_editor_open() {
        let (mut app, storage) = app();
        app.dispatch(Command::NewNote);
        type_text(&mut app, "Draft");
        storage.fail_saves(true);
        app.dispatch(Command::SaveEditor);

        assert_eq!(app.view(), View::Editor);
        assert_eq!(app.editor().unwrap().title, "Draft");
        assert_eq!(app.status().unwrap().kind, StatusKind::Error);

        storage.fail_saves(false);
        app.dispatch(Command::SaveEditor);
        assert_eq!(app.view(), View::List);
        assert_eq!(app.repo().notes().len(), 1);
    }

    #[test]
    fn second_escape_discards_after_failed_autosave() {
        let (mut app, storage) = app();
        let note = new_note(&mut app, "Keep", "body");
        app.dispatch(Command::EditSelected);
        type_text(&mut app, "x");
        storage.fail_saves(true);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view(), View::Editor);
        assert!(app.editor().unwrap().save_failed);
        assert!(app.status().unwrap().text.contains("Esc again"));

        // A further edit means the next Esc tries to save again.
        type_text(&mut app, "y");
        assert!(!app.editor().unwrap().save_failed);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view(), View::Editor);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view(), View::List);
        let status = app.status().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.text, "Unsaved changes discarded");
        let kept = app.repo().note(&note.id).unwrap();
        assert_eq!(kept.title, "Keep");
        assert_eq!(kept.content, "body");
    }

    #[test]
    fn saving_a_deleted_note_reports_not_found() {
        let (mut app, _) = app();
        let note = new_note(&mut app, "Gone", "soon");
        app.dispatch(Command::EditSelected);
        type_text(&mut app, "!");
        app.repo.delete_note(&note.id).unwrap();
        app.dispatch(Command::SaveEditor);
        assert_eq!(app.view(), View::Editor);
        assert!(app.status().unwrap().text.contains("not found"));
    }

    #[test]
    fn empty_title_becomes_untitled() {
        let (mut app, _) = app();
        app.dispatch(Command::NewNote);
        app.dispatch(Command::EditorSwitchField);
        type_text(&mut app, "just content");
        app.dispatch(Command::SaveEditor);
        assert_eq!(app.repo().notes()[0].title, UNTITLED);
    }

    #[test]
    fn help_consumes_one_key() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.view(), View::Help);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.view(), View::List);
    }

    #[test]
    fn quit_requires_confirmation() {
        let (mut app, _) = app();
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.view(), View::ConfirmQuit);
        assert!(!press(&mut app, KeyCode::Esc));
        assert_eq!(app.view(), View::List);
        press(&mut app, KeyCode::Char('q'));
        assert!(!press(&mut app, KeyCode::Char('n')));
        assert_eq!(app.view(), View::List);
        press(&mut app, KeyCode::Char('q'));
        assert!(press(&mut app, KeyCode::Char('y')));
    }

    #[test]
    fn delete_note_asks_first() {
        let (mut app, _) = app();
        new_note(&mut app, "Keep", "");
        app.dispatch(Command::DeleteSelected);
        assert_eq!(app.view(), View::List);
        assert_eq!(app.input_context().pending, Some(PendingKind::Confirm));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.repo().notes().len(), 1);
        assert_eq!(app.input_context().pending, None);

        app.dispatch(Command::DeleteSelected);
        press(&mut app, KeyCode::Char('y'));
        assert!(app.repo().notes().is_empty());
        assert_eq!(app.status().unwrap().kind, StatusKind::Info);
    }

    #[test]
    fn non_empty_notebook_delete_is_reported() {
        let (mut app, _) = app();
        new_note(&mut app, "Keep", "");
        app.dispatch(Command::FocusLeft);
        app.dispatch(Command::DeleteSelected);
        app.dispatch(Command::Confirm);
        assert_eq!(app.view(), View::List);
        assert_eq!(app.status().unwrap().kind, StatusKind::Error);
        assert_eq!(app.repo().notes().len(), 1);

        app.dispatch(Command::DeleteCascade);
        app.dispatch(Command::Confirm);
        assert!(app.repo().notes().is_empty());
        assert_eq!(app.repo().list_notebooks().len(), 1);
    }

    #[test]
    fn notebook_prompt_creates_and_rejects_duplicates() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('N'));
        assert_eq!(app.input_context().pending, Some(PendingKind::Prompt));
        type_text(&mut app, "Work");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.repo().list_notebooks().len(), 2);
        assert_eq!(app.current_notebook_id().unwrap(), app.repo().list_notebooks()[1].id);

        press(&mut app, KeyCode::Char('N'));
        type_text(&mut app, "Work");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_context().pending, Some(PendingKind::Prompt));
        assert_eq!(app.status().unwrap().kind, StatusKind::Error);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_context().pending, None);
        assert_eq!(app.repo().list_notebooks().len(), 2);
    }

    #[test]
    fn rename_prompt_is_prefilled() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('r'));
        for _ in 0.."Default".len() {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "Inbox");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.repo().list_notebooks()[0].name, "Inbox");
    }

    #[test]
    fn move_prompt_moves_note_to_named_notebook() {
        let (mut app, storage) = app();
        let note = new_note(&mut app, "Plan", "steps");
        app.dispatch(Command::NewNotebook);
        type_text(&mut app, "Work");
        app.dispatch(Command::Confirm);
        let work = app.current_notebook_id().unwrap();

        app.selected_notebook = 0;
        app.selected_note = 0;
        app.focus = Panel::Notes;
        press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.input_context().pending, Some(PendingKind::Prompt));

        type_text(&mut app, "Nowhere");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_context().pending, Some(PendingKind::Prompt));
        assert!(app.status().unwrap().text.contains("Nowhere"));
        assert_eq!(app.repo().note(&note.id).unwrap().notebook_id, "default");

        for _ in 0.."Nowhere".len() {
            press(&mut app, KeyCode::Backspace);
        }
        let saves = storage.saves();
        type_text(&mut app, " Work ");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_context().pending, None);
        assert_eq!(app.repo().note(&note.id).unwrap().notebook_id, work);
        assert_eq!(app.current_notebook_id().unwrap(), work);
        assert_eq!(app.repo().list_notes("default").len(), 0);
        assert_eq!(storage.saves(), saves + 1);
        assert!(app.status().unwrap().text.starts_with("Moved \"Plan\""));
    }

    #[test]
    fn move_without_notes_does_nothing() {
        let (mut app, _) = app();
        app.focus = Panel::Notes;
        press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.input_context().pending, None);
        assert_eq!(app.status().unwrap().text, "No note selected");
    }

    #[test]
    fn new_note_goes_to_focused_notebook() {
        let (mut app, _) = app();
        app.dispatch(Command::NewNotebook);
        type_text(&mut app, "Work");
        app.dispatch(Command::Confirm);
        let work = app.current_notebook_id().unwrap();
        new_note(&mut app, "Plan", "");
        assert_eq!(app.repo().list_notes(&work).len(), 1);
        assert_eq!(app.repo().list_notes("default").len(), 0);
    }

    #[test]
    fn navigation_clamps_and_switches_notebooks() {
        let (mut app, _) = app();
        new_note(&mut app, "a", "");
        new_note(&mut app, "b", "");
        app.dispatch(Command::NavigateDown);
        app.dispatch(Command::NavigateDown);
        app.dispatch(Command::NavigateDown);
        assert_eq!(app.selected_note, 1);
        app.dispatch(Command::NavigateUp);
        app.dispatch(Command::NavigateUp);
        assert_eq!(app.selected_note, 0);

        app.dispatch(Command::ToggleFocus);
        assert_eq!(app.focus(), Panel::Notebooks);
        app.dispatch(Command::NavigateDown);
        assert_eq!(app.selected_notebook, 0);
        app.dispatch(Command::OpenSelected);
        assert_eq!(app.focus(), Panel::Notes);
    }

    #[test]
    fn search_flow() {
        let (mut app, _) = app();
        new_note(&mut app, "Meeting Notes", "hi");
        new_note(&mut app, "Shopping", "buy milk for meeting");
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.view(), View::Search);
        assert!(app.search.query.is_empty());
        assert!(app.search.results.is_empty());

        type_text(&mut app, "meeting");
        assert_eq!(app.search.results.len(), 2);
        let first = app.repo().note(&app.search.results[0]).unwrap();
        assert_eq!(first.title, "Meeting Notes");

        press(&mut app, KeyCode::Up);
        assert_eq!(app.search.selected, 1);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view(), View::Editor);
        assert_eq!(app.editor().unwrap().title, "Shopping");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view(), View::List);

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "x");
        press(&mut app, KeyCode::Backspace);
        assert!(app.search.results.is_empty());
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view(), View::List);
    }

    #[test]
    fn search_scope_follows_focused_notebook() {
        let (mut app, _) = app();
        new_note(&mut app, "plan a", "");
        app.dispatch(Command::NewNotebook);
        type_text(&mut app, "Work");
        app.dispatch(Command::Confirm);
        new_note(&mut app, "plan b", "");

        app.dispatch(Command::EnterSearch);
        type_text(&mut app, "plan");
        assert_eq!(app.search.results.len(), 2);
        app.dispatch(Command::ToggleSearchScope);
        assert_eq!(app.search.results.len(), 1);
        assert_eq!(app.repo().note(&app.search.results[0]).unwrap().title, "plan b");
    }

    #[test]
    fn status_clears_on_next_key() {
        let (mut app, _) = app();
        new_note(&mut app, "a", "");
        assert!(app.status().is_some());
        press(&mut app, KeyCode::Char('j'));
        assert!(app.status().is_none());
    }
}
