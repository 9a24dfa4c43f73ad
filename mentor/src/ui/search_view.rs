//! Search tab: query the knowledge base directly.

use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
};

use crate::app::{AppState, Mode, Tab};
use crate::theme::Theme;
use crate::ui::chat_view::wrap_text;
use crate::ui::layout::{inner_rect, panel_block, spinner, split_with_input};
use crate::ui::render_input;

pub fn render_search(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let [results_area, input_area] = split_with_input(area);
    let typing = state.mode == Mode::Insert && state.tab == Tab::Search;
    let search = &state.search;

    let title = if search.loading {
        format!(" Results for \"{}\" {} ", search.query, spinner(state.spinner_frame))
    } else if search.searched {
        format!(" Results for \"{}\" ({}) ", search.query, search.results.len())
    } else {
        " Results ".to_owned()
    };
    let block = panel_block(&title, !typing, theme);

    let placeholder = if let Some(err) = &search.error {
        Some(Line::styled(err.clone(), Style::default().fg(theme.error)))
    } else if search.searched && search.results.is_empty() && !search.loading {
        Some(Line::styled("No matching passages.", Style::default().fg(theme.meta)))
    } else if !search.searched && !search.loading {
        Some(Line::styled(
            "Press i, type a query and Enter to search the uploaded documents.",
            Style::default().fg(theme.meta),
        ))
    } else {
        None
    };

    match placeholder {
        Some(line) => frame.render_widget(Paragraph::new(line).block(block), results_area),
        None => {
            let width = usize::from(inner_rect(results_area).width).saturating_sub(4);
            let items: Vec<ListItem> = search
                .results
                .iter()
                .enumerate()
                .map(|(i, passage)| {
                    let mut lines: Vec<Line> = wrap_text(passage, width)
                        .into_iter()
                        .enumerate()
                        .map(|(n, l)| {
                            let prefix = if n == 0 { format!("{:>2}. ", i + 1) } else { "    ".to_owned() };
                            Line::from(vec![
                                Span::styled(prefix, Style::default().fg(theme.meta)),
                                Span::raw(l),
                            ])
                        })
                        .collect();
                    lines.push(Line::default());
                    ListItem::new(lines)
                })
                .collect();
            frame.render_widget(List::new(items).block(block), results_area);
        }
    }

    render_input(frame, input_area, " Search ", &state.search_input, typing, theme);
}
