// Line commands typed into the draft room console.

use leaguedraft_app::SessionCommand;
use leaguedraft_core::draft::player::PositionFilter;
use leaguedraft_core::PlayerId;

pub const HELP: &str = "\
commands:
  search [text]   filter players by name (no text clears)
  pos <P|all>     filter players by position
  select <id>     select a player
  clear           clear the selection
  pick [id]       submit the selected player, or player <id>
  autopick        let the league server pick for your team
  start           initialize and start the draft
  refresh         refresh now
  show            print the board
  quit            leave the draft room";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Command(SessionCommand),
    Help,
    Empty,
    Invalid(String),
}

pub fn parse_line(line: &str) -> Input {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Input::Empty,
        "help" | "?" => Input::Help,
        "search" | "/" => Input::Command(SessionCommand::SetSearch(rest.to_string())),
        "pos" | "position" => Input::Command(SessionCommand::SetPosition(PositionFilter::parse(rest))),
        "select" | "sel" => match parse_player_id(rest) {
            Ok(id) => Input::Command(SessionCommand::Select(id)),
            Err(e) => Input::Invalid(e),
        },
        "clear" => Input::Command(SessionCommand::ClearSelection),
        "pick" | "p" => {
            if rest.is_empty() {
                Input::Command(SessionCommand::SubmitSelected)
            } else {
                match parse_player_id(rest) {
                    Ok(id) => Input::Command(SessionCommand::Submit(id)),
                    Err(e) => Input::Invalid(e),
                }
            }
        }
        "autopick" | "auto" => Input::Command(SessionCommand::AutoPick),
        "start" => Input::Command(SessionCommand::Start),
        "refresh" | "r" => Input::Command(SessionCommand::Refresh),
        "show" | "ls" => Input::Command(SessionCommand::Show),
        "quit" | "q" | "leave" | "exit" => Input::Command(SessionCommand::Leave),
        other => Input::Invalid(format!("unknown command '{other}' (try 'help')")),
    }
}

fn parse_player_id(s: &str) -> Result<PlayerId, String> {
    if s.is_empty() {
        return Err("missing player id".to_string());
    }
    s.trim_start_matches('#')
        .parse()
        .map_err(|_| format!("'{s}' is not a player id"))
}
