// Bottom row: the search box while typing, otherwise the last notice and
// key hints.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::ViewState;

pub const KEY_HINTS: &str = "↑↓:Move Enter:Select p:Pick a:Auto /:Search P:Pos s:Start r:Refresh c:Clear q:Quit";

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let paragraph = Paragraph::new(help_line(state)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

pub fn help_line(state: &ViewState) -> Line<'static> {
    if state.filter_mode {
        return Line::from(vec![
            Span::styled(" Search: ", Style::default().fg(Color::Yellow)),
            Span::raw(format!("{}_", state.filter_text)),
            Span::styled("  (Enter apply, Esc cancel)", Style::default().add_modifier(Modifier::DIM)),
        ]);
    }
    let mut spans = Vec::new();
    if let Some(message) = &state.message {
        spans.push(Span::styled(format!(" {message} "), Style::default().fg(Color::Yellow)));
        spans.push(Span::raw("|"));
    }
    spans.push(Span::styled(
        format!(" {KEY_HINTS}"),
        Style::default().fg(Color::White).add_modifier(Modifier::DIM),
    ));
    Line::from(spans)
}
