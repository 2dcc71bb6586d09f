// Available players table: the filtered catalog, cursor row highlighted,
// the selected player marked.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use leaguedraft_app::ViewSnapshot;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(view) = state.view.as_ref() else {
        let paragraph = Paragraph::new("  Loading players...")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Available Players"));
        frame.render_widget(paragraph, area);
        return;
    };

    let block = Block::default().borders(Borders::ALL).title(build_title(view));
    if view.players.is_empty() {
        let paragraph = Paragraph::new("  No players match.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let selected = view.selection.as_ref().map(|s| s.player_id);
    let header = Row::new(vec!["ID", "Name", "Pos", "Team", "OVR"])
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = view
        .players
        .iter()
        .map(|p| {
            let style = if selected == Some(p.id) {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(p.id.to_string()),
                Cell::from(p.name.clone()),
                Cell::from(p.position.clone()),
                Cell::from(p.team.clone()),
                Cell::from(p.overall_rating.to_string()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Min(16),
        Constraint::Length(4),
        Constraint::Length(5),
        Constraint::Length(4),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol(">> ");

    let mut table_state = TableState::default().with_selected(Some(state.cursor));
    frame.render_stateful_widget(table, area, &mut table_state);
}

/// "Available Players [PG] "du" (12 of 40)"
pub fn build_title(view: &ViewSnapshot) -> Line<'static> {
    let mut title = String::from("Available Players");
    if let Some(position) = view.query.position.as_query_param() {
        title.push_str(&format!(" [{position}]"));
    }
    if !view.query.search.is_empty() {
        title.push_str(&format!(" \"{}\"", view.query.search));
    }
    title.push_str(&format!(" ({} of {})", view.players.len(), view.total_matching));
    Line::from(title)
}
