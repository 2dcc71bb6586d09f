// Plain-text rendering of the draft room.

use std::fmt::Write as _;

use leaguedraft_app::coordinator::Reconciliation;
use leaguedraft_app::{PickError, SessionPhase, ViewSnapshot, ViewUpdate};
use leaguedraft_core::draft::snapshot::Pick;

fn pick_line(pick: &Pick) -> String {
    let position = pick.position.as_deref().unwrap_or("-");
    format!(
        "#{:<3} R{:<2} team {:<6} {} ({position})",
        pick.pick_number,
        pick.round,
        pick.team_id,
        pick.display_name()
    )
}

pub fn render_view(view: &ViewSnapshot) -> String {
    let mut out = String::new();

    let _ = write!(out, "== Draft: {}", view.phase);
    if view.phase == SessionPhase::InProgress {
        let _ = write!(out, " | round {}, pick {}", view.current_round, view.current_pick_number);
        match view.on_the_clock {
            Some(team) if view.is_my_turn => {
                let _ = write!(out, " | team {team} on the clock (YOU)");
            }
            Some(team) => {
                let _ = write!(out, " | team {team} on the clock");
            }
            None => {}
        }
    }
    let _ = writeln!(out, " ==");

    let _ = write!(out, "{} | {}", view.connectivity, view.push);
    if let Some(at) = view.fetched_at {
        let _ = write!(out, " | updated {}", at.format("%H:%M:%S"));
    }
    let _ = writeln!(out);

    if !view.upcoming_picks.is_empty() {
        let picks: Vec<String> = view.upcoming_picks.iter().map(u32::to_string).collect();
        let _ = writeln!(out, "Your next picks: {}", picks.join(", "));
    }

    if !view.my_picks.is_empty() {
        let names: Vec<&str> = view.my_picks.iter().map(Pick::display_name).collect();
        let _ = writeln!(out, "Your roster: {}", names.join(", "));
    }

    if !view.recent_picks.is_empty() {
        let _ = writeln!(out, "Recent picks:");
        for pick in &view.recent_picks {
            let _ = writeln!(out, "  {}", pick_line(pick));
        }
    }

    let _ = write!(out, "Available ({} of {}", view.players.len(), view.total_matching);
    if !view.query.search.is_empty() {
        let _ = write!(out, ", search \"{}\"", view.query.search);
    }
    let _ = writeln!(out, ", position {}):", view.query.position);
    if view.players.is_empty() {
        let _ = writeln!(out, "  (no players match)");
    }
    for player in &view.players {
        let marker = if view.selection.as_ref().is_some_and(|s| s.player_id == player.id) {
            '>'
        } else {
            ' '
        };
        let _ = writeln!(
            out,
            "{marker} [{:>5}] {:<24} {:<3} {:<4} {:>3}",
            player.id, player.name, player.position, player.team, player.overall_rating
        );
    }

    match &view.selection {
        Some(selection) => {
            let name = selection.player_name.as_deref().unwrap_or("?");
            let _ = write!(out, "Selected: {name} [{}]", selection.player_id);
        }
        None => {
            let _ = write!(out, "Selected: none");
        }
    }
    if view.submission_pending {
        let _ = write!(out, " | pick pending...");
    }
    if view.start_running {
        let _ = write!(out, " | starting draft...");
    }
    let _ = writeln!(out);
    out
}

fn pick_failure(err: &PickError) -> String {
    match err {
        PickError::Transport(_) => format!("Pick not confirmed: {err}"),
        _ => format!("Pick failed: {err}"),
    }
}

/// One update as console text. Status-only updates get one line.
pub fn render_update(update: &ViewUpdate) -> String {
    match update {
        ViewUpdate::View(view) => render_view(view),
        ViewUpdate::PhaseChanged(phase) => format!("Draft is now {phase}\n"),
        ViewUpdate::Connectivity(state) => format!("Connectivity: {state}\n"),
        ViewUpdate::Push(status) => format!("Live updates: {status}\n"),
        ViewUpdate::PickCommitted(pick) => format!("Pick in: {}\n", pick_line(pick)),
        ViewUpdate::PickFailed(err) => format!("{}\n", pick_failure(err)),
        ViewUpdate::Reconciled(Reconciliation::Committed(pick)) => {
            format!("Your pick went through: {}\n", pick_line(pick))
        }
        ViewUpdate::Reconciled(Reconciliation::TakenByOther(pick)) => {
            format!("That player went elsewhere: {}\n", pick_line(pick))
        }
        ViewUpdate::Reconciled(Reconciliation::NotCommitted { request }) => {
            format!("Pick ({request}) did not go through; you can submit again\n")
        }
        ViewUpdate::StartFinished(Ok(())) => "Draft started\n".to_string(),
        ViewUpdate::StartFinished(Err(e)) => format!("Could not start draft: {e}\n"),
    }
}
