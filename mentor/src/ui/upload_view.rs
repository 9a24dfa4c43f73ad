//! Upload tab: choose a local document and send it to the knowledge base.

use mentor_core::upload::SUPPORTED_EXTENSIONS;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{Paragraph, Wrap},
};

use crate::app::{AppState, Mode, Tab};
use crate::theme::Theme;
use crate::ui::layout::{panel_block, spinner, split_with_input};
use crate::ui::render_input;

pub fn render_upload(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let [status_area, input_area] = split_with_input(area);
    let typing = state.mode == Mode::Insert && state.tab == Tab::Upload;
    let meta = Style::default().fg(theme.meta);

    let mut lines = vec![
        Line::styled(
            format!("Supported: .{}", SUPPORTED_EXTENSIONS.join(" .")),
            meta,
        ),
        Line::default(),
    ];

    match state.upload.selected() {
        Some(file) => {
            lines.push(Line::styled(
                format!("Selected: {}", file.name),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            lines.push(Line::styled(format!("Size: {:.2} MB", file.size_mb()), meta));
            lines.push(Line::styled(format!("Path: {}", file.path.display()), meta));
        }
        None => lines.push(Line::styled("No file selected.", meta)),
    }
    lines.push(Line::default());

    if state.upload.is_uploading() {
        lines.push(Line::from(format!("Uploading {}", spinner(state.spinner_frame))));
    } else if let Some(receipt) = state.upload.receipt() {
        lines.push(Line::styled(
            format!(
                "Uploaded {}: {} chunks added to the knowledge base.",
                receipt.filename, receipt.chunks_count
            ),
            Style::default().fg(theme.success),
        ));
    }
    if let Some(err) = state.upload.error() {
        lines.push(Line::styled(err.to_owned(), Style::default().fg(theme.error)));
    }

    lines.push(Line::default());
    lines.push(Line::styled(
        "i: type a path, Enter: select it   u: upload the selected file",
        meta,
    ));

    frame.render_widget(
        Paragraph::new(lines)
            .block(panel_block(" Upload document ", !typing, theme))
            .wrap(Wrap { trim: false }),
        status_area,
    );
    render_input(frame, input_area, " File path ", &state.upload_input, typing, theme);
}
