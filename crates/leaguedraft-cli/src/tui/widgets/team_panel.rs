// This team's side of the board: next picks, roster so far, and the
// pending selection.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use leaguedraft_app::ViewSnapshot;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let title = match state.view.as_ref() {
        Some(view) => format!("Your Team ({})", view.my_team),
        None => "Your Team".to_string(),
    };
    let lines = state.view.as_ref().map(panel_lines).unwrap_or_default();
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);
}

pub fn panel_lines(view: &ViewSnapshot) -> Vec<Line<'static>> {
    let label = Style::default().fg(Color::Gray);
    let mut lines = Vec::new();

    let next = if view.upcoming_picks.is_empty() {
        "-".to_string()
    } else {
        view.upcoming_picks
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    lines.push(Line::from(vec![Span::styled("Next picks: ", label), Span::raw(next)]));

    let selection = match &view.selection {
        Some(s) => format!("{} [{}]", s.player_name.as_deref().unwrap_or("?"), s.player_id),
        None => "none".to_string(),
    };
    lines.push(Line::from(vec![
        Span::styled("Selected: ", label),
        Span::styled(selection, Style::default().fg(Color::Yellow)),
    ]));

    if view.submission_pending {
        lines.push(Line::from(Span::styled(
            "Pick pending...",
            Style::default().add_modifier(Modifier::ITALIC),
        )));
    }
    if view.start_running {
        lines.push(Line::from(Span::styled(
            "Starting draft...",
            Style::default().add_modifier(Modifier::ITALIC),
        )));
    }

    lines.push(Line::from(Span::styled(format!("Roster ({}):", view.my_picks.len()), label)));
    for pick in &view.my_picks {
        lines.push(Line::from(format!(
            "  R{} {} ({})",
            pick.round,
            pick.display_name(),
            pick.position.as_deref().unwrap_or("-")
        )));
    }
    lines
}
