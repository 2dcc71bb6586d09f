// Status bar: connectivity dot, draft phase and turn, push state.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use leaguedraft_app::poller::ConnectivityState;
use leaguedraft_app::{SessionPhase, ViewSnapshot};

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let paragraph = Paragraph::new(Line::from(status_spans(state.view.as_ref())))
        .style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

pub fn status_spans(view: Option<&ViewSnapshot>) -> Vec<Span<'static>> {
    let Some(view) = view else {
        return vec![Span::styled(" Loading draft...", Style::default().fg(Color::Gray))];
    };

    let (dot, dot_color) = connection_indicator(view.connectivity);
    let mut spans = vec![
        Span::styled(format!(" {dot} "), Style::default().fg(dot_color)),
        Span::styled(format!("Draft {}", view.phase), Style::default().fg(Color::White)),
    ];

    if view.phase == SessionPhase::InProgress {
        spans.push(separator());
        spans.push(Span::raw(format!(
            "Round {}, Pick {}",
            view.current_round, view.current_pick_number
        )));
        if let Some(team) = view.on_the_clock {
            spans.push(separator());
            if view.is_my_turn {
                spans.push(Span::styled(
                    "YOU ARE ON THE CLOCK",
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ));
            } else {
                spans.push(Span::raw(format!("Team {team} on the clock")));
            }
        }
    }

    spans.push(separator());
    spans.push(Span::styled(view.push.to_string(), Style::default().fg(Color::Gray)));
    if let ConnectivityState::Degraded { .. } = view.connectivity {
        spans.push(separator());
        spans.push(Span::styled(view.connectivity.to_string(), Style::default().fg(Color::Red)));
    }
    if let Some(at) = view.fetched_at {
        spans.push(separator());
        spans.push(Span::styled(
            format!("updated {}", at.format("%H:%M:%S")),
            Style::default().fg(Color::Gray),
        ));
    }
    spans
}

fn separator() -> Span<'static> {
    Span::styled(" | ", Style::default().fg(Color::Gray))
}

pub fn connection_indicator(connectivity: ConnectivityState) -> (&'static str, Color) {
    match connectivity {
        ConnectivityState::Healthy => ("●", Color::Green),
        ConnectivityState::Degraded { .. } => ("●", Color::Red),
    }
}
