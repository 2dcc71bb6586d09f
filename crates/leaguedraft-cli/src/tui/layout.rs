// Screen layout for the draft board.
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +-------------------------+------------------------+
// | Available Players (62%)  | Your Team (45%)        |
// |                          +------------------------+
// |                          | Recent Picks (55%)     |
// +-------------------------+------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Debug, Clone)]
pub struct BoardLayout {
    /// Phase, turn, connectivity.
    pub status_bar: Rect,
    pub available: Rect,
    /// Upcoming picks, roster and selection for this team.
    pub team_panel: Rect,
    pub draft_log: Rect,
    /// Last notice and key hints.
    pub help_bar: Rect,
}

pub fn build_layout(area: Rect) -> BoardLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(vertical[1]);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(horizontal[1]);

    BoardLayout {
        status_bar: vertical[0],
        available: horizontal[0],
        team_panel: sidebar[0],
        draft_log: sidebar[1],
        help_bar: vertical[2],
    }
}
