//! Chat tab: the transcript and the message input.
//!
//! The transcript is wrapped here rather than by `Paragraph::wrap` so the
//! total line count is known, which lets the view stay pinned to the newest
//! message while `chat_scroll` is zero.

use chrono::Local;
use mentor_core::types::{Message, Role};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::{AppState, Mode, Tab};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block, spinner, split_with_input};
use crate::ui::render_input;

/// Shown above the transcript. Not part of the conversation sent anywhere.
pub const GREETING: &str = "Hello! I'm your financial economics tutor. I can explain concepts, \
     quiz you, and tailor lessons to your progress. What would you like to learn?";

const INDENT: &str = "  ";

/// Terminal column width of `s`.
fn display_width(s: &str) -> usize {
    Span::raw(s).width()
}

/// Breaks `text` into lines no wider than `width` columns.
///
/// Embedded newlines start new lines, words are kept whole where they fit,
/// and runs without spaces (including CJK text) are split per character.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_width = 0;

        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let word_width = display_width(word);
            let needed = if line.is_empty() { word_width } else { line_width + 1 + word_width };
            if needed <= width {
                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(word);
                line_width = needed;
                continue;
            }

            if !line.is_empty() {
                out.push(std::mem::take(&mut line));
                line_width = 0;
            }
            if word_width <= width {
                line.push_str(word);
                line_width = word_width;
                continue;
            }

            let mut buf = [0u8; 4];
            for c in word.chars() {
                let w = display_width(c.encode_utf8(&mut buf));
                if line_width + w > width && !line.is_empty() {
                    out.push(std::mem::take(&mut line));
                    line_width = 0;
                }
                line.push(c);
                line_width += w;
            }
        }
        out.push(line);
    }
    out
}

fn push_wrapped(lines: &mut Vec<Line<'static>>, text: &str, width: usize, style: Style) {
    let body_width = width.saturating_sub(INDENT.len());
    for l in wrap_text(text, body_width) {
        lines.push(Line::styled(format!("{INDENT}{l}"), style));
    }
}

fn message_lines(lines: &mut Vec<Line<'static>>, msg: &Message, width: usize, theme: &Theme) {
    let (who, color) = match msg.role {
        Role::User => ("You", theme.user_message),
        Role::Assistant => ("Tutor", theme.assistant_message),
    };
    lines.push(Line::from(vec![
        Span::styled(who, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(
            format!(" · {}", msg.timestamp.with_timezone(&Local).format("%H:%M")),
            Style::default().fg(theme.meta),
        ),
    ]));
    push_wrapped(lines, &msg.content, width, Style::default().fg(color));

    let meta = Style::default().fg(theme.meta).add_modifier(Modifier::ITALIC);
    if let Some(intent) = &msg.intent {
        push_wrapped(lines, &format!("intent: {intent}"), width, meta);
    }
    if let Some(sources) = msg.sources.as_ref().filter(|s| !s.is_empty()) {
        push_wrapped(lines, &format!("sources: {}", sources.join(", ")), width, meta);
    }
    lines.push(Line::default());
}

/// All transcript lines at `width` columns, greeting first.
pub fn transcript_lines(state: &AppState, width: usize, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = vec![Line::styled(
        "Tutor",
        Style::default().fg(theme.assistant_message).add_modifier(Modifier::BOLD),
    )];
    push_wrapped(&mut lines, GREETING, width, Style::default().fg(theme.meta));
    lines.push(Line::default());

    for msg in state.session.transcript() {
        message_lines(&mut lines, msg, width, theme);
    }

    if state.session.is_sending() {
        lines.push(Line::styled(
            format!("Tutor is thinking {}", spinner(state.spinner_frame)),
            Style::default().fg(theme.meta),
        ));
    }
    lines
}

pub fn render_chat(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let [transcript_area, input_area] = split_with_input(area);
    let inner = inner_rect(transcript_area);
    state.chat_viewport_height = inner.height;

    let lines = transcript_lines(state, usize::from(inner.width), theme);
    let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let max_offset = total.saturating_sub(inner.height);
    state.chat_scroll = state.chat_scroll.min(max_offset);
    let top = max_offset - state.chat_scroll;

    let title = if state.chat_scroll > 0 {
        " Conversation (scrolled, G to follow) "
    } else {
        " Conversation "
    };
    let typing = state.mode == Mode::Insert && state.tab == Tab::Chat;
    frame.render_widget(
        Paragraph::new(lines)
            .block(panel_block(title, !typing, theme))
            .scroll((top, 0)),
        transcript_area,
    );

    let title = if state.session.is_sending() { " Message (waiting for reply) " } else { " Message " };
    render_input(frame, input_area, title, &state.chat_input, typing, theme);
}
