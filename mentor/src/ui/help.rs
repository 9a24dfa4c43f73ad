//! Help overlay: a centred modal listing every keybinding.
//!
//! Drawn in the same `terminal.draw()` closure as the tabs; `Clear` erases the
//! area underneath first.

use ratatui::{
    Frame,
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

/// Skipped on terminals narrower than 40 columns.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 40 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));
    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help  (j/k scroll, ? or Esc to close) ")
        .border_style(Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn section(title: &'static str) -> Line<'static> {
    Line::styled(title, Style::default().add_modifier(Modifier::BOLD))
}

fn build_help_text() -> Text<'static> {
    Text::from(vec![
        section("General"),
        Line::from("  1-5 / Tab / S-Tab   Switch tab"),
        Line::from("  i / Enter           Start typing in this tab's input"),
        Line::from("  Esc                 Stop typing"),
        Line::from("  ?                   Open / close this help"),
        Line::from("  q / Ctrl-c          Quit (asks first while requests are pending)"),
        Line::from(""),
        section("Chat"),
        Line::from("  Enter (typing)      Send the message"),
        Line::from("  j / k               Scroll one line"),
        Line::from("  Ctrl-d / Ctrl-u     Scroll half a page"),
        Line::from("  g / G               Oldest / follow newest"),
        Line::from(""),
        section("Upload"),
        Line::from("  Enter (typing)      Select the typed file path"),
        Line::from("  u                   Upload the selected file"),
        Line::from(""),
        section("Progress"),
        Line::from("  r                   Refresh"),
        Line::from(""),
        section("Settings"),
        Line::from("  j / k               Choose field"),
        Line::from("  h / l  or  - / +    Decrease / increase the field"),
        Line::from("  Enter (typing)      Apply the typed value"),
        Line::from("  s                   Save (affects future uploads only)"),
        Line::from("  R                   Reindex: press once to arm, again to confirm"),
        Line::from("  Esc                 Cancel an armed reindex"),
        Line::from(""),
        section("Search"),
        Line::from("  Enter (typing)      Search the knowledge base"),
    ])
}
