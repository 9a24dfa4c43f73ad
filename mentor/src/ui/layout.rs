//! Layout arithmetic and the shared chrome: tab bar, panel blocks, status bar.
//!
//! Called inside `terminal.draw()` on every render, so each frame's layout
//! reflects the live terminal size. Returned `Rect`s are valid only for the
//! current draw closure.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph, Tabs},
};

use crate::app::{AppState, Mode, Tab};
use crate::theme::Theme;

const SPINNER: [&str; 4] = ["⠋", "⠙", "⠸", "⠴"];

/// Returns `[tab_bar, body, status_bar]`.
pub fn compute_layout(area: Rect) -> [Rect; 3] {
    area.layout(&Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ]))
}

/// Splits a tab body into `[content, input]`, the input panel being three
/// rows tall. The two borders overlap into one shared line.
pub fn split_with_input(body: Rect) -> [Rect; 2] {
    body.layout(
        &Layout::vertical([Constraint::Fill(1), Constraint::Length(3)])
            .spacing(Spacing::Overlap(1)),
    )
}

/// Inner `Rect` of a bordered panel.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Bordered block; thick and highlighted when `is_focused`. Fuzzy merging
/// keeps junctions correct where thick and plain borders meet.
pub fn panel_block<'a>(title: &'a str, is_focused: bool, theme: &'a Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

pub fn spinner(frame: usize) -> &'static str {
    SPINNER[frame % SPINNER.len()]
}

pub fn render_tabs(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let titles = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| Line::from(format!(" {} {} ", i + 1, tab.title())));
    let tabs = Tabs::new(titles)
        .select(state.tab.index())
        .style(Style::default().fg(theme.tab_inactive))
        .highlight_style(
            Style::default()
                .fg(theme.tab_active)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        )
        .divider("│");
    frame.render_widget(tabs, area);
}

/// Text of the knowledge-base footer, or `None` until the info has loaded.
pub fn knowledge_footer(state: &AppState) -> Option<String> {
    state
        .knowledge
        .as_ref()
        .map(|k| format!("Knowledge base holds {} document chunks", k.document_count))
}

/// One-row status bar: mode, identity and pending work on the left, the
/// knowledge-base size on the right.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::Insert => (" INSERT ", theme.status_mode_insert),
        Mode::Normal | Mode::ConfirmQuit | Mode::HelpOverlay => {
            (" NORMAL ", theme.status_mode_normal)
        }
    };

    let mut left = vec![
        Span::styled(mode_text, Style::default().fg(mode_fg).add_modifier(Modifier::BOLD)),
        Span::raw(format!(" {} ", state.session.user_id())),
    ];
    if state.has_pending_requests() {
        left.push(Span::raw(format!(
            " {} {} pending ",
            spinner(state.spinner_frame),
            state.in_flight
        )));
    }
    left.push(Span::styled(" ? help ", Style::default().fg(theme.meta)));

    let right = knowledge_footer(state).unwrap_or_default();
    let right_width = u16::try_from(right.chars().count() + 1).unwrap_or(u16::MAX);
    let [left_area, right_area] = area.layout(&Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(right_width),
    ]));

    let bar_style = Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg);
    frame.render_widget(Paragraph::new(Line::from(left)).style(bar_style), left_area);
    frame.render_widget(
        Paragraph::new(Line::from(right).right_aligned()).style(bar_style),
        right_area,
    );
}
