//! Progress tab: per-topic mastery bars, mastered topics, weak points.

use mentor_core::types::{MasteryBand, UserProgress};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Wrap},
};

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block, spinner};

/// Only the first few weak points are listed.
pub const WEAK_POINTS_SHOWN: usize = 5;

fn ratio(level: f64) -> f64 {
    if level.is_finite() {
        (level / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn header_lines(state: &AppState, progress: &UserProgress, theme: &Theme) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![Line::from(vec![
        Span::styled("Current topic: ", bold),
        Span::raw(progress.current_topic.clone().unwrap_or_else(|| "none yet".to_owned())),
    ])];
    if let Some(updated) = &progress.last_updated {
        lines.push(Line::styled(
            format!("Last updated {updated}"),
            Style::default().fg(theme.meta),
        ));
    }
    if let Some(err) = &state.progress.error {
        lines.push(Line::styled(
            format!("Refresh failed: {err}"),
            Style::default().fg(theme.error),
        ));
    }
    lines.push(Line::styled("Mastery", bold));
    lines
}

fn footer_lines(progress: &UserProgress, theme: &Theme) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![Line::default()];

    let mastered = if progress.mastered_topics.is_empty() {
        "none yet".to_owned()
    } else {
        progress.mastered_topics.iter().cloned().collect::<Vec<_>>().join(", ")
    };
    lines.push(Line::from(vec![
        Span::styled("Mastered: ", bold),
        Span::styled(mastered, Style::default().fg(theme.success)),
    ]));

    if !progress.weak_points.is_empty() {
        lines.push(Line::styled("Needs work:", bold));
        for point in progress.weak_points.iter().take(WEAK_POINTS_SHOWN) {
            lines.push(Line::styled(format!("  • {point}"), Style::default().fg(theme.warning)));
        }
    }
    lines
}

pub fn render_progress(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let title = if state.progress.loading {
        format!(" Progress {} ", spinner(state.spinner_frame))
    } else {
        " Progress (r to refresh) ".to_owned()
    };
    frame.render_widget(panel_block(&title, true, theme), area);
    let inner = inner_rect(area);

    let Some(progress) = &state.progress.data else {
        let text = match (&state.progress.error, state.progress.loading) {
            (_, true) => Line::styled("Loading progress…", Style::default().fg(theme.meta)),
            (Some(err), false) => Line::styled(err.clone(), Style::default().fg(theme.error)),
            (None, false) => Line::styled(
                "No progress recorded yet. Answer a few questions in Chat.",
                Style::default().fg(theme.meta),
            ),
        };
        frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), inner);
        return;
    };

    let header = header_lines(state, progress, theme);
    let header_rows = u16::try_from(header.len()).unwrap_or(u16::MAX);
    let room = inner.height.saturating_sub(header_rows);
    let gauge_rows = u16::try_from(progress.mastery_level.len().max(1))
        .unwrap_or(u16::MAX)
        .min(room);

    let [header_area, gauges_area, footer_area] = inner.layout(&Layout::vertical([
        Constraint::Length(header_rows),
        Constraint::Length(gauge_rows),
        Constraint::Fill(1),
    ]));
    frame.render_widget(Paragraph::new(header), header_area);

    if progress.mastery_level.is_empty() {
        frame.render_widget(
            Paragraph::new(Line::styled("  no topics yet", Style::default().fg(theme.meta))),
            gauges_area,
        );
    }
    let rows = Layout::vertical((0..gauge_rows).map(|_| Constraint::Length(1))).split(gauges_area);
    for ((topic, level), row) in progress.mastery_level.iter().zip(rows.iter().copied()) {
        let color = theme.band(MasteryBand::of(*level));
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(color).bg(theme.background))
            .ratio(ratio(*level))
            .label(format!("{topic}  {level:.1}%"));
        frame.render_widget(gauge, row);
    }

    frame.render_widget(
        Paragraph::new(footer_lines(progress, theme)).wrap(Wrap { trim: false }),
        footer_area,
    );
}
