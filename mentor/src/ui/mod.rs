//! UI rendering for mentor.
//!
//! `render()` is the single entry point, called from the event loop's
//! `terminal.draw()` closure. Layout arithmetic lives in `layout.rs`; each tab
//! has its own view module.

pub mod chat_view;
pub mod help;
pub mod keybindings;
mod layout;
pub mod progress_view;
pub mod search_view;
pub mod settings_view;
pub mod upload_view;

use ratatui::{
    Frame,
    layout::{Constraint, Position, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Clear, Paragraph},
};

use crate::app::{AppState, Mode, Tab};
use crate::theme::Theme;
use layout::{compute_layout, inner_rect, panel_block, render_status_bar, render_tabs};

/// Renders one frame: tab bar, the active tab, status bar, then any overlay.
///
/// Takes `state` mutably so views can cache viewport heights for the next
/// keypress.
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let [tab_bar, body, status_bar] = compute_layout(frame.area());

    render_tabs(frame, tab_bar, state, theme);
    match state.tab {
        Tab::Chat => chat_view::render_chat(frame, body, state, theme),
        Tab::Upload => upload_view::render_upload(frame, body, state, theme),
        Tab::Progress => progress_view::render_progress(frame, body, state, theme),
        Tab::Settings => settings_view::render_settings(frame, body, state, theme),
        Tab::Search => search_view::render_search(frame, body, state, theme),
    }
    render_status_bar(frame, status_bar, state, theme);

    match state.mode {
        Mode::HelpOverlay => help::render_help_overlay(frame, theme, state.help_scroll),
        Mode::ConfirmQuit => render_confirm_quit(frame, state, theme),
        Mode::Normal | Mode::Insert => {}
    }
}

/// One-line text input in a bordered panel. When `active`, the terminal
/// cursor is placed after the text and the tail is kept visible.
pub(crate) fn render_input(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    text: &str,
    active: bool,
    theme: &Theme,
) {
    let inner = inner_rect(area);
    let room = usize::from(inner.width.saturating_sub(1));

    let mut start = 0;
    let mut width = Line::raw(text).width();
    for (i, c) in text.char_indices() {
        if width <= room {
            break;
        }
        start = i + c.len_utf8();
        width -= Line::raw(&text[i..start]).width();
    }
    let visible = &text[start..];

    frame.render_widget(
        Paragraph::new(visible).block(panel_block(title, active, theme)),
        area,
    );
    if active && inner.width > 0 && inner.height > 0 {
        let offset = u16::try_from(width).unwrap_or(u16::MAX).min(inner.width - 1);
        frame.set_cursor_position(Position::new(inner.x + offset, inner.y));
    }
}

fn render_confirm_quit(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let area = frame
        .area()
        .centered(Constraint::Length(48), Constraint::Length(5));
    frame.render_widget(Clear, area);

    let block = Block::bordered()
        .title(" Quit? ")
        .border_style(Style::default().fg(theme.warning));
    let text = vec![
        Line::from(format!("{} request(s) still in flight.", state.in_flight)),
        Line::styled(
            "Quit anyway? y / n",
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];
    frame.render_widget(Paragraph::new(text).block(block).centered(), area);
}
