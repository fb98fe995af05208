use super::app::{Panel, View};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Logical commands the state machine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NavigateUp,
    NavigateDown,
    FocusLeft,
    FocusRight,
    ToggleFocus,
    OpenSelected,
    NewNote,
    NewNotebook,
    RenameNotebook,
    EditSelected,
    MoveSelected,
    DeleteSelected,
    DeleteCascade,
    EnterSearch,
    ToggleSearchScope,
    ShowHelp,
    Quit,
    SaveEditor,
    ExitEditor,
    EditorInsertChar(char),
    EditorNewline,
    EditorBackspace,
    EditorDelete,
    EditorMoveCursor(CursorMove),
    EditorSwitchField,
    InputChar(char),
    InputBackspace,
    Confirm,
    Deny,
    CancelAny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
}

/// Inline sub-state of the list view that changes how keys are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    Confirm,
    Prompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputContext {
    pub view: View,
    pub focus: Panel,
    pub pending: Option<Pending>,
}

/// Maps a key press to a command for the current view. Keys that mean
/// nothing in that view map to `None`.
pub fn map_key(key: KeyEvent, ctx: &InputContext) -> Option<Command> {
    match ctx.view {
        View::List => match ctx.pending {
            None => list_key(key, ctx.focus),
            Some(Pending::Confirm) => confirm_key(key),
            Some(Pending::Prompt) => line_input_key(key).or(match key.code {
                KeyCode::Enter => Some(Command::Confirm),
                KeyCode::Esc => Some(Command::CancelAny),
                _ => None,
            }),
        },
        View::Editor => editor_key(key),
        View::Search => search_key(key),
        View::Help => Some(Command::CancelAny),
        View::ConfirmQuit => confirm_key(key),
    }
}

fn printable(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(c)
        }
        _ => None,
    }
}

fn ctrl(key: &KeyEvent, c: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}

fn list_key(key: KeyEvent, focus: Panel) -> Option<Command> {
    if ctrl(&key, 'q') || ctrl(&key, 'c') {
        return Some(Command::Quit);
    }
    if let Some(c) = printable(&key) {
        return match c {
            'j' => Some(Command::NavigateDown),
            'k' => Some(Command::NavigateUp),
            'h' => Some(Command::FocusLeft),
            'l' => Some(Command::FocusRight),
            'n' => Some(Command::NewNote),
            'N' => Some(Command::NewNotebook),
            'r' => Some(Command::RenameNotebook),
            'e' => Some(Command::EditSelected),
            'm' if focus == Panel::Notes => Some(Command::MoveSelected),
            'd' => Some(Command::DeleteSelected),
            'D' if focus == Panel::Notebooks => Some(Command::DeleteCascade),
            '/' => Some(Command::EnterSearch),
            '?' => Some(Command::ShowHelp),
            'q' | 'Q' => Some(Command::Quit),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Down => Some(Command::NavigateDown),
        KeyCode::Up => Some(Command::NavigateUp),
        KeyCode::Left => Some(Command::FocusLeft),
        KeyCode::Right => Some(Command::FocusRight),
        KeyCode::Tab => Some(Command::ToggleFocus),
        KeyCode::Enter => Some(Command::OpenSelected),
        _ => None,
    }
}

fn confirm_key(key: KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => Some(Command::Confirm),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(Command::Deny),
        _ => None,
    }
}

fn line_input_key(key: KeyEvent) -> Option<Command> {
    if let Some(c) = printable(&key) {
        return Some(Command::InputChar(c));
    }
    match key.code {
        KeyCode::Backspace => Some(Command::InputBackspace),
        _ => None,
    }
}

fn editor_key(key: KeyEvent) -> Option<Command> {
    if ctrl(&key, 's') {
        return Some(Command::SaveEditor);
    }
    if let Some(c) = printable(&key) {
        return Some(Command::EditorInsertChar(c));
    }
    match key.code {
        KeyCode::Esc => Some(Command::ExitEditor),
        KeyCode::Enter => Some(Command::EditorNewline),
        KeyCode::Backspace => Some(Command::EditorBackspace),
        KeyCode::Delete => Some(Command::EditorDelete),
        KeyCode::Tab | KeyCode::BackTab => Some(Command::EditorSwitchField),
        KeyCode::Up => Some(Command::EditorMoveCursor(CursorMove::Up)),
        KeyCode::Down => Some(Command::EditorMoveCursor(CursorMove::Down)),
        KeyCode::Left => Some(Command::EditorMoveCursor(CursorMove::Left)),
        KeyCode::Right => Some(Command::EditorMoveCursor(CursorMove::Right)),
        KeyCode::Home => Some(Command::EditorMoveCursor(CursorMove::Home)),
        KeyCode::End => Some(Command::EditorMoveCursor(CursorMove::End)),
        _ => None,
    }
}

fn search_key(key: KeyEvent) -> Option<Command> {
    if ctrl(&key, 't') {
        return Some(Command::ToggleSearchScope);
    }
    if let Some(cmd) = line_input_key(key) {
        return Some(cmd);
    }
    match key.code {
        KeyCode::Esc => Some(Command::CancelAny),
        KeyCode::Enter => Some(Command::OpenSelected),
        KeyCode::Down | KeyCode::Tab => Some(Command::NavigateDown),
        KeyCode::Up | KeyCode::BackTab => Some(Command::NavigateUp),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl_key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn ctx(view: View) -> InputContext {
        InputContext {
            view,
            focus: Panel::Notes,
            pending: None,
        }
    }

    #[test]
    fn same_key_differs_by_view() {
        let n = key(KeyCode::Char('n'));
        assert_eq!(map_key(n, &ctx(View::List)), Some(Command::NewNote));
        assert_eq!(
            map_key(n, &ctx(View::Editor)),
            Some(Command::EditorInsertChar('n'))
        );
        assert_eq!(map_key(n, &ctx(View::Search)), Some(Command::InputChar('n')));
        assert_eq!(map_key(n, &ctx(View::ConfirmQuit)), Some(Command::Deny));
        assert_eq!(map_key(n, &ctx(View::Help)), Some(Command::CancelAny));
    }

    #[test]
    fn list_shortcuts() {
        let list = ctx(View::List);
        assert_eq!(map_key(key(KeyCode::Char('j')), &list), Some(Command::NavigateDown));
        assert_eq!(map_key(key(KeyCode::Up), &list), Some(Command::NavigateUp));
        assert_eq!(map_key(key(KeyCode::Char('h')), &list), Some(Command::FocusLeft));
        assert_eq!(map_key(key(KeyCode::Right), &list), Some(Command::FocusRight));
        assert_eq!(map_key(key(KeyCode::Tab), &list), Some(Command::ToggleFocus));
        assert_eq!(map_key(key(KeyCode::Char('N')), &list), Some(Command::NewNotebook));
        assert_eq!(map_key(key(KeyCode::Char('/')), &list), Some(Command::EnterSearch));
        assert_eq!(map_key(key(KeyCode::Char('?')), &list), Some(Command::ShowHelp));
        assert_eq!(map_key(key(KeyCode::Enter), &list), Some(Command::OpenSelected));
        assert_eq!(map_key(ctrl_key('c'), &list), Some(Command::Quit));
    }

    #[test]
    fn cascade_delete_only_from_notebook_panel() {
        let mut list = ctx(View::List);
        assert_eq!(map_key(key(KeyCode::Char('D')), &list), None);
        list.focus = Panel::Notebooks;
        assert_eq!(
            map_key(key(KeyCode::Char('D')), &list),
            Some(Command::DeleteCascade)
        );
    }

    #[test]
    fn move_only_from_notes_panel() {
        let mut list = ctx(View::List);
        assert_eq!(map_key(key(KeyCode::Char('m')), &list), Some(Command::MoveSelected));
        list.focus = Panel::Notebooks;
        assert_eq!(map_key(key(KeyCode::Char('m')), &list), None);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        assert_eq!(map_key(key(KeyCode::Char('z')), &ctx(View::List)), None);
        assert_eq!(map_key(key(KeyCode::F(5)), &ctx(View::Editor)), None);
        assert_eq!(map_key(key(KeyCode::Char('x')), &ctx(View::ConfirmQuit)), None);
    }

    #[test]
    fn editor_keys() {
        let editor = ctx(View::Editor);
        assert_eq!(map_key(ctrl_key('s'), &editor), Some(Command::SaveEditor));
        assert_eq!(map_key(key(KeyCode::Esc), &editor), Some(Command::ExitEditor));
        assert_eq!(map_key(key(KeyCode::Enter), &editor), Some(Command::EditorNewline));
        assert_eq!(
            map_key(key(KeyCode::Home), &editor),
            Some(Command::EditorMoveCursor(CursorMove::Home))
        );
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT), &editor),
            Some(Command::EditorInsertChar('A'))
        );
        assert_eq!(map_key(ctrl_key('x'), &editor), None);
    }

    #[test]
    fn search_keys() {
        let search = ctx(View::Search);
        assert_eq!(map_key(key(KeyCode::Esc), &search), Some(Command::CancelAny));
        assert_eq!(map_key(key(KeyCode::Enter), &search), Some(Command::OpenSelected));
        assert_eq!(map_key(key(KeyCode::Tab), &search), Some(Command::NavigateDown));
        assert_eq!(map_key(key(KeyCode::Backspace), &search), Some(Command::InputBackspace));
        assert_eq!(map_key(ctrl_key('t'), &search), Some(Command::ToggleSearchScope));
    }

    #[test]
    fn pending_states_capture_keys() {
        let confirm = InputContext {
            pending: Some(Pending::Confirm),
            ..ctx(View::List)
        };
        assert_eq!(map_key(key(KeyCode::Char('y')), &confirm), Some(Command::Confirm));
        assert_eq!(map_key(key(KeyCode::Esc), &confirm), Some(Command::Deny));
        assert_eq!(map_key(key(KeyCode::Char('j')), &confirm), None);

        let prompt = InputContext {
            pending: Some(Pending::Prompt),
            ..ctx(View::List)
        };
        assert_eq!(map_key(key(KeyCode::Char('q')), &prompt), Some(Command::InputChar('q')));
        assert_eq!(map_key(key(KeyCode::Enter), &prompt), Some(Command::Confirm));
        assert_eq!(map_key(key(KeyCode::Esc), &prompt), Some(Command::CancelAny));
    }
}
