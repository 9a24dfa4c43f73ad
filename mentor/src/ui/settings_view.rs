//! Settings tab: chunk size and overlap, save, and the two-step reindex.

use mentor_core::settings::{ChunkField, NoticeKind};
use mentor_core::types::ChunkConfig;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use crate::app::{AppState, Mode, Tab};
use crate::theme::Theme;
use crate::ui::layout::{panel_block, spinner, split_with_input};
use crate::ui::render_input;

fn field_line(
    label: &str,
    value: u32,
    range: (u32, u32),
    selected: bool,
    theme: &Theme,
) -> Line<'static> {
    let marker = if selected { "▶ " } else { "  " };
    let value_style = if selected {
        Style::default().fg(theme.border_active).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::raw(format!("{marker}{label:<15}")),
        Span::styled(format!("{value:>5}"), value_style),
        Span::styled(format!("   ({} – {})", range.0, range.1), Style::default().fg(theme.meta)),
    ])
}

pub fn render_settings(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let [form_area, input_area] = split_with_input(area);
    let typing = state.mode == Mode::Insert && state.tab == Tab::Settings;
    let cfg = state.settings.config();
    let meta = Style::default().fg(theme.meta);

    let mut lines = vec![
        field_line(
            "Chunk size",
            cfg.chunk_size,
            (ChunkConfig::MIN_SIZE, ChunkConfig::MAX_SIZE),
            state.settings_field == ChunkField::Size,
            theme,
        ),
        field_line(
            "Chunk overlap",
            cfg.chunk_overlap,
            (ChunkConfig::MIN_OVERLAP, ChunkConfig::MAX_OVERLAP),
            state.settings_field == ChunkField::Overlap,
            theme,
        ),
        Line::default(),
        Line::styled(
            "Saving only affects documents uploaded afterwards. Reindex to rebuild existing chunks.",
            meta,
        ),
        Line::default(),
    ];

    if state.settings.is_saving() {
        lines.push(Line::from(format!("Saving {}", spinner(state.spinner_frame))));
    }
    if state.settings.is_reindexing() {
        lines.push(Line::from(format!(
            "Reindexing, this may take a while {}",
            spinner(state.spinner_frame)
        )));
    }
    if let Some(notice) = state.settings.notice() {
        let color = match notice.kind {
            _ if state.settings.is_armed() => theme.warning,
            NoticeKind::Success => theme.success,
            NoticeKind::Error => theme.error,
        };
        lines.push(Line::styled(
            notice.text.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        lines.push(Line::default());
    }

    let reindex_hint = if state.settings.is_armed() {
        "R: confirm reindex   Esc: cancel"
    } else {
        "R: reindex"
    };
    lines.push(Line::styled(
        format!("j/k: field   h/l: -/+   i: type value   s: save   {reindex_hint}"),
        meta,
    ));

    frame.render_widget(
        Paragraph::new(lines)
            .block(panel_block(" Chunk settings ", !typing, theme))
            .wrap(Wrap { trim: false }),
        form_area,
    );

    let title = match state.settings_field {
        ChunkField::Size => " New chunk size ",
        ChunkField::Overlap => " New chunk overlap ",
    };
    let shown = if typing { state.settings_input.as_str() } else { "" };
    render_input(frame, input_area, title, shown, typing, theme);
}
