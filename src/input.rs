//! Key bindings: normal and vim-style.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    /// Pop the group under the cursor.
    Pop,
    Restart,
    Pause,
    Quit,
    None,
}

/// Map key event to game action. Supports both normal (arrows, enter/space)
/// and vim (hjkl) layouts.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod && modifiers != KeyModifiers::CONTROL {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc if no_mod => Action::Quit,
        KeyCode::Char('p') if no_mod => Action::Pause,
        KeyCode::Char('r') if no_mod => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') if no_mod => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') if no_mod => Action::MoveRight,
        KeyCode::Up | KeyCode::Char('k') if no_mod => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') if no_mod => Action::MoveDown,
        KeyCode::Enter | KeyCode::Char(' ') if no_mod => Action::Pop,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrows_and_vim_agree() {
        assert_eq!(key_to_action(key(KeyCode::Left)), Action::MoveLeft);
        assert_eq!(key_to_action(key(KeyCode::Char('h'))), Action::MoveLeft);
        assert_eq!(key_to_action(key(KeyCode::Down)), Action::MoveDown);
        assert_eq!(key_to_action(key(KeyCode::Char('j'))), Action::MoveDown);
    }

    #[test]
    fn enter_and_space_pop() {
        assert_eq!(key_to_action(key(KeyCode::Enter)), Action::Pop);
        assert_eq!(key_to_action(key(KeyCode::Char(' '))), Action::Pop);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        assert_eq!(key_to_action(key(KeyCode::Char('z'))), Action::None);
    }
}
