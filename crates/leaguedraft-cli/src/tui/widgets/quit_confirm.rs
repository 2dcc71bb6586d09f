// Leave confirmation drawn over the board.

use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

const DIALOG_WIDTH: u16 = 30;
const DIALOG_HEIGHT: u16 = 3;

pub fn render(frame: &mut Frame, area: Rect) {
    let dialog_area = centered_rect(DIALOG_WIDTH, DIALOG_HEIGHT, area);
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let bold = Modifier::BOLD;
    let text = Line::from(vec![
        Span::raw(" Leave draft room? ("),
        Span::styled("y", Style::default().fg(Color::Green).add_modifier(bold)),
        Span::raw("/"),
        Span::styled("n", Style::default().fg(Color::Red).add_modifier(bold)),
        Span::raw(")"),
    ]);
    frame.render_widget(
        Paragraph::new(text).block(block).style(Style::default().bg(Color::Black)),
        dialog_area,
    );
}

/// A `width` x `height` rect centered in `area`, clamped to fit.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .split(area);
    Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .split(vertical[0])[0]
}
