//! Keybinding dispatcher for mentor.
//!
//! Translates crossterm key events into `AppState` mutations and returns a
//! `KeyAction` telling the event loop whether to continue or quit. Dispatch
//! branches on `state.mode` first, then on the active tab.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use mentor_core::settings::ChunkField;

use crate::app::{AppState, Mode, Tab};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return request_quit(state);
    }
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::ConfirmQuit => handle_confirm_quit(key, state),
        Mode::Normal => handle_normal(key, state),
        Mode::Insert => handle_insert(key, state),
    }
}

/// Quits at once when nothing is in flight, otherwise asks first.
fn request_quit(state: &mut AppState) -> KeyAction {
    if state.has_pending_requests() && state.mode != Mode::ConfirmQuit {
        state.mode = Mode::ConfirmQuit;
        KeyAction::Continue
    } else {
        KeyAction::Quit
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if let Some(action) = handle_global_key(key, state) {
        return action;
    }
    match state.tab {
        Tab::Chat => handle_chat_key(key, state),
        Tab::Upload => {
            if key.code == KeyCode::Char('u') {
                state.start_upload();
            }
        }
        Tab::Progress => {
            if key.code == KeyCode::Char('r') {
                state.refresh_progress();
            }
        }
        Tab::Settings => handle_settings_key(key, state),
        Tab::Search => {}
    }
    KeyAction::Continue
}

/// Keys that mean the same thing on every tab. `None` if not consumed.
fn handle_global_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    match key.code {
        KeyCode::Char('q') => Some(request_quit(state)),
        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
            Some(KeyAction::Continue)
        }
        KeyCode::Char(c @ '1'..='5') => {
            let idx = c as usize - '1' as usize;
            state.switch_tab(Tab::ALL[idx]);
            Some(KeyAction::Continue)
        }
        KeyCode::Tab => {
            state.switch_tab(state.tab.next());
            Some(KeyAction::Continue)
        }
        KeyCode::BackTab => {
            state.switch_tab(state.tab.prev());
            Some(KeyAction::Continue)
        }
        KeyCode::Char('i') | KeyCode::Enter if state.tab.has_input() => {
            state.begin_insert();
            Some(KeyAction::Continue)
        }
        _ => None,
    }
}

fn handle_chat_key(key: KeyEvent, state: &mut AppState) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('k') | KeyCode::Up => state.scroll_chat_up(1),
        KeyCode::Char('j') | KeyCode::Down => state.scroll_chat_down(1),
        KeyCode::Char('u') if ctrl => state.scroll_chat_up(state.half_page()),
        KeyCode::Char('d') if ctrl => state.scroll_chat_down(state.half_page()),
        KeyCode::PageUp => state.scroll_chat_up(state.half_page() * 2),
        KeyCode::PageDown => state.scroll_chat_down(state.half_page() * 2),
        // The renderer clamps to the oldest line.
        KeyCode::Char('g') => state.chat_scroll = u16::MAX,
        KeyCode::Char('G') => state.chat_scroll = 0,
        _ => {}
    }
}

fn handle_settings_key(key: KeyEvent, state: &mut AppState) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down | KeyCode::Char('k') | KeyCode::Up => {
            state.settings_field = match state.settings_field {
                ChunkField::Size => ChunkField::Overlap,
                ChunkField::Overlap => ChunkField::Size,
            };
        }
        KeyCode::Char('h') | KeyCode::Char('-') | KeyCode::Left => {
            state.settings.nudge(state.settings_field, -1)
        }
        KeyCode::Char('l') | KeyCode::Char('+') | KeyCode::Right => {
            state.settings.nudge(state.settings_field, 1)
        }
        KeyCode::Char('s') => state.save_settings(),
        KeyCode::Char('R') => state.request_reindex(),
        KeyCode::Esc => state.settings.cancel_reindex(),
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Insert mode
// ---------------------------------------------------------------------------

fn handle_insert(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Esc => {
            if state.tab == Tab::Settings {
                state.settings_input.clear();
            }
            state.mode = Mode::Normal;
        }
        KeyCode::Enter => submit_input(state),
        KeyCode::Backspace => {
            if let Some(buf) = state.active_input_mut() {
                buf.pop();
            }
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(buf) = state.active_input_mut() {
                buf.push(c);
            }
        }
        _ => {}
    }
    KeyAction::Continue
}

/// Enter while typing. Chat stays in Insert mode for the next message.
fn submit_input(state: &mut AppState) {
    match state.tab {
        Tab::Chat => state.submit_chat(),
        Tab::Upload => {
            if state.submit_upload_path() {
                state.mode = Mode::Normal;
            }
        }
        Tab::Settings => {
            state.commit_settings_input();
            state.mode = Mode::Normal;
        }
        Tab::Search => {
            state.submit_search();
            state.mode = Mode::Normal;
        }
        Tab::Progress => state.mode = Mode::Normal,
    }
}

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            state.help_scroll = state.help_scroll.saturating_add(1)
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.help_scroll = state.help_scroll.saturating_sub(1)
        }
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

/// `y` quits; `n` or `Esc` returns to Normal mode.
fn handle_confirm_quit(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => KeyAction::Quit,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Wheel scrolls the chat transcript or the help overlay by three lines.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) -> KeyAction {
    let up = match mouse.kind {
        MouseEventKind::ScrollUp => true,
        MouseEventKind::ScrollDown => false,
        _ => return KeyAction::Continue,
    };
    match (state.mode, state.tab) {
        (Mode::HelpOverlay, _) if up => state.help_scroll = state.help_scroll.saturating_sub(3),
        (Mode::HelpOverlay, _) => state.help_scroll = state.help_scroll.saturating_add(3),
        (_, Tab::Chat) if up => state.scroll_chat_up(3),
        (_, Tab::Chat) => state.scroll_chat_down(3),
        _ => {}
    }
    KeyAction::Continue
}
