// Recent picks, newest first. This team's picks are highlighted.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use leaguedraft_core::draft::snapshot::Pick;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default().borders(Borders::ALL).title("Recent Picks");
    let picks = state.view.as_ref().map_or(&[][..], |v| v.recent_picks.as_slice());
    if picks.is_empty() {
        let paragraph = Paragraph::new("  No picks yet.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let my_team = state.view.as_ref().map(|v| v.my_team);
    let visible = (area.height as usize).saturating_sub(2).max(1);
    let items: Vec<ListItem> = picks
        .iter()
        .rev()
        .take(visible)
        .map(|pick| {
            let color = if Some(pick.team_id) == my_team {
                Color::Cyan
            } else {
                Color::White
            };
            ListItem::new(Line::from(Span::styled(format_pick(pick), Style::default().fg(color))))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

/// "#12 R2 T4: Duke Barnes (PG)"
pub fn format_pick(pick: &Pick) -> String {
    format!(
        "#{} R{} T{}: {} ({})",
        pick.pick_number,
        pick.round,
        pick.team_id,
        pick.display_name(),
        pick.position.as_deref().unwrap_or("-")
    )
}
