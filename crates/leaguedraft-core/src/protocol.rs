// Wire protocol: JSON shapes exchanged with the league collaborator over REST,
// Socket.IO framing for the push channel, and conversion into the snapshot
// model.
//
// The collaborator has served two draft-state shapes over time: a bare turn
// counter (`current_pick`) and the richer round + team pointer. Both decode
// here; missing pieces are derived from the pick order when it is known.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::draft::order::{DraftOrder, DraftType};
use crate::draft::player::AvailablePlayer;
use crate::draft::snapshot::{DraftSession, DraftSnapshot, DraftStatus, Pick};
use crate::error::{ApiError, TransportError};
use crate::{LeagueId, PlayerId, TeamId};

// ---------------------------------------------------------------------------
// GET draft-state
// ---------------------------------------------------------------------------

/// Body of `GET /api/draft/{league}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftStateResponse {
    /// `null` until the draft has been initialized.
    #[serde(default)]
    pub draft_state: Option<DraftStatePayload>,
    #[serde(default)]
    pub picks: Vec<PickPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftStatePayload {
    #[serde(default)]
    pub league_id: Option<LeagueId>,
    pub status: DraftStatus,
    #[serde(default)]
    pub current_round: Option<u32>,
    #[serde(default, alias = "current_pick")]
    pub current_pick_number: Option<u32>,
    #[serde(default, alias = "current_team_id")]
    pub on_the_clock_team_id: Option<TeamId>,
    #[serde(default)]
    pub draft_order: Vec<TeamId>,
    #[serde(default, alias = "type")]
    pub draft_type: Option<DraftType>,
    #[serde(default, alias = "total_rounds")]
    pub rounds: Option<u32>,
    /// Settings the draft was initialized with, as stored by the server.
    #[serde(default)]
    pub settings: Value,
}

impl DraftStatePayload {
    /// Round count from the top level or the stored settings.
    fn rounds(&self) -> Option<u32> {
        self.rounds.or_else(|| {
            self.settings
                .get("rounds")
                .and_then(Value::as_u64)
                .and_then(|r| u32::try_from(r).ok())
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickPayload {
    pub pick_number: u32,
    #[serde(default)]
    pub round: Option<u32>,
    pub team_id: TeamId,
    #[serde(default)]
    pub player_id: Option<PlayerId>,
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

impl PickPayload {
    fn into_pick(self, order: &DraftOrder) -> Pick {
        let round = self
            .round
            .or_else(|| order.round_for_pick(self.pick_number))
            .unwrap_or(0);
        Pick {
            pick_number: self.pick_number,
            round,
            team_id: self.team_id,
            player_id: self.player_id,
            player_name: self.player_name,
            position: self.position,
        }
    }
}

impl From<&Pick> for PickPayload {
    fn from(pick: &Pick) -> Self {
        PickPayload {
            pick_number: pick.pick_number,
            round: Some(pick.round),
            team_id: pick.team_id,
            player_id: pick.player_id,
            player_name: pick.player_name.clone(),
            position: pick.position.clone(),
        }
    }
}

impl DraftStateResponse {
    /// Convert a decoded response into a snapshot stamped with `fetched_at`.
    ///
    /// Fails with [`TransportError::Decode`] when an in-progress draft names
    /// no team on the clock and the pick order cannot supply one.
    pub fn into_snapshot(
        self,
        league_id: LeagueId,
        fetched_at: DateTime<Utc>,
    ) -> Result<DraftSnapshot, TransportError> {
        let Some(state) = self.draft_state else {
            let order = DraftOrder::new(Vec::new(), DraftType::Snake);
            let picks = self.picks.into_iter().map(|p| p.into_pick(&order)).collect();
            return Ok(DraftSnapshot::new(
                DraftSession::not_started(league_id),
                picks,
                fetched_at,
            ));
        };

        if let Some(reported) = state.league_id {
            if reported != league_id {
                return Err(TransportError::Decode(format!(
                    "draft state for league {reported}, expected {league_id}"
                )));
            }
        }

        let draft_type = state.draft_type.unwrap_or_default();
        let rounds = state.rounds();
        let order = DraftOrder::new(state.draft_order.clone(), draft_type);
        let picks: Vec<Pick> = self
            .picks
            .into_iter()
            .map(|p| p.into_pick(&order))
            .collect();
        let last_committed = picks
            .iter()
            .filter(|p| p.player_id.is_some())
            .map(|p| p.pick_number)
            .max()
            .unwrap_or(0);

        let current_pick_number = match state.status {
            DraftStatus::NotStarted => state.current_pick_number.unwrap_or(0),
            DraftStatus::InProgress => state
                .current_pick_number
                .unwrap_or(last_committed + 1)
                .max(last_committed + 1),
            DraftStatus::Completed => state
                .current_pick_number
                .unwrap_or(last_committed)
                .max(last_committed),
        };

        let current_round = state
            .current_round
            .or_else(|| order.round_for_pick(current_pick_number))
            .unwrap_or(0);

        let on_the_clock_team_id = match state.status {
            DraftStatus::InProgress => {
                let team = state
                    .on_the_clock_team_id
                    .or_else(|| order.team_for_pick(current_pick_number));
                if team.is_none() {
                    return Err(TransportError::Decode(
                        "in-progress draft without a team on the clock".into(),
                    ));
                }
                team
            }
            _ => {
                if state.on_the_clock_team_id.is_some() {
                    warn!(
                        "Ignoring on-the-clock team for a draft with status {}",
                        state.status
                    );
                }
                None
            }
        };

        let session = DraftSession {
            league_id,
            status: state.status,
            current_round,
            current_pick_number,
            on_the_clock_team_id,
            draft_order: state.draft_order,
            draft_type,
            initialized: true,
            rounds,
        };
        Ok(DraftSnapshot::new(session, picks, fetched_at))
    }
}

// ---------------------------------------------------------------------------
// GET available-players / POST make-pick
// ---------------------------------------------------------------------------

/// Body of `GET /api/draft/{league}/available-players`: either wrapped in
/// `{ "players": [...] }` or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PlayersResponse {
    Wrapped { players: Vec<AvailablePlayer> },
    Bare(Vec<AvailablePlayer>),
}

impl PlayersResponse {
    pub fn into_players(self) -> Vec<AvailablePlayer> {
        match self {
            PlayersResponse::Wrapped { players } => players,
            PlayersResponse::Bare(players) => players,
        }
    }
}

/// Body of a successful `POST /api/draft/pick`: the pick, bare or wrapped.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PickResponse {
    Wrapped { pick: PickPayload },
    Bare(PickPayload),
}

impl PickResponse {
    pub fn into_pick(self, order: &DraftOrder) -> Pick {
        match self {
            PickResponse::Wrapped { pick } => pick.into_pick(order),
            PickResponse::Bare(pick) => pick.into_pick(order),
        }
    }
}

/// Request body of `POST /api/draft/pick`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MakePickRequest {
    pub league_id: LeagueId,
    pub team_id: TeamId,
    pub player_id: PlayerId,
}

// ---------------------------------------------------------------------------
// Error bodies
// ---------------------------------------------------------------------------

/// Body of a non-2xx response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Classify a non-2xx response into an [`ApiError`].
///
/// Race outcomes are recognized by `code` first and message text second.
/// 401 is an authentication failure, other 4xx are definitive refusals, and
/// everything else (5xx, unexpected codes) is a transport-level failure with
/// no definitive answer.
pub fn classify_error_response(status: u16, body: &str) -> ApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .error
        .clone()
        .unwrap_or_else(|| body.trim().chars().take(200).collect());

    match parsed.code.as_deref().map(str::to_ascii_uppercase).as_deref() {
        Some("NOT_YOUR_TURN") => return ApiError::NotYourTurn,
        Some("PLAYER_UNAVAILABLE") | Some("PLAYER_ALREADY_DRAFTED") => {
            return ApiError::PlayerUnavailable
        }
        _ => {}
    }

    if status == 401 {
        return ApiError::Transport(TransportError::Unauthorized);
    }

    if (400..500).contains(&status) {
        let lower = message.to_lowercase();
        if lower.contains("not your turn") {
            return ApiError::NotYourTurn;
        }
        if lower.contains("already drafted")
            || lower.contains("not available")
            || lower.contains("unavailable")
        {
            return ApiError::PlayerUnavailable;
        }
        return ApiError::Rejected { message };
    }

    ApiError::Transport(TransportError::Status { status, message })
}

// ---------------------------------------------------------------------------
// Push channel
// ---------------------------------------------------------------------------
//
// The league pushes over Socket.IO (Engine.IO v4) on the websocket transport.
// Every text frame opens with an Engine.IO packet type. Type 4 carries a
// Socket.IO packet: its own type digit, an optional `/namespace,` and ack id,
// then a JSON payload. Events look like `42["name",{...}]`.

/// Query string selecting Engine.IO v4 over a plain websocket.
pub const ENGINE_IO_QUERY: &str = "EIO=4&transport=websocket";

/// Request to join the default namespace.
pub const CONNECT_FRAME: &str = "40";

/// Answer to an Engine.IO ping.
pub const PONG_FRAME: &str = "3";

/// Out-of-band league events. Hints only: their payloads are never applied
/// to draft state.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    LeagueDayAdvanced { league_id: Option<LeagueId> },
    GameCompleted { league_id: Option<LeagueId> },
    NewStorylines { league_id: Option<LeagueId>, count: usize },
    Other { name: String, league_id: Option<LeagueId> },
}

/// Everything the push transport reports to the listener.
#[derive(Debug, Clone, PartialEq)]
pub enum PushSignal {
    Connected,
    Disconnected,
    Event(PushEvent),
}

/// One decoded push frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PushFrame {
    /// Engine.IO handshake, `0{"sid":..}`.
    Open,
    /// Engine.IO close.
    Close,
    Ping,
    Pong,
    /// The default namespace accepted the connection.
    Connected,
    /// The server dropped the namespace.
    Disconnected,
    /// The namespace refused the connection.
    ConnectRefused(String),
    Event(PushEvent),
    /// Upgrades, noops, acks and binary attachments.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,

    #[error("unknown packet type in {0:?}")]
    UnknownType(String),

    #[error("malformed event payload: {0}")]
    Payload(String),
}

fn league_id_of(data: &Value) -> Option<LeagueId> {
    let raw = data.get("leagueId").or_else(|| data.get("league_id"))?;
    match raw {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

impl PushFrame {
    /// Decode one websocket text frame.
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        let mut chars = text.chars();
        let engine_type = chars.next().ok_or(FrameError::Empty)?;
        match engine_type {
            '0' => Ok(PushFrame::Open),
            '1' => Ok(PushFrame::Close),
            '2' => Ok(PushFrame::Ping),
            '3' => Ok(PushFrame::Pong),
            '4' => decode_socket_packet(chars.as_str()),
            '5' | '6' => Ok(PushFrame::Ignored),
            _ => Err(FrameError::UnknownType(text.chars().take(16).collect())),
        }
    }
}

fn decode_socket_packet(packet: &str) -> Result<PushFrame, FrameError> {
    let mut chars = packet.chars();
    let packet_type = chars.next().ok_or(FrameError::Empty)?;
    let payload = strip_namespace_and_ack(chars.as_str());
    match packet_type {
        '0' => Ok(PushFrame::Connected),
        '1' => Ok(PushFrame::Disconnected),
        '2' => decode_event(payload).map(PushFrame::Event),
        '4' => Ok(PushFrame::ConnectRefused(connect_error_message(payload))),
        '3' | '5' | '6' => Ok(PushFrame::Ignored),
        other => Err(FrameError::UnknownType(format!("4{other}"))),
    }
}

fn strip_namespace_and_ack(body: &str) -> &str {
    let body = match body.strip_prefix('/') {
        Some(rest) => rest.split_once(',').map_or("", |(_, payload)| payload),
        None => body,
    };
    body.trim_start_matches(|c: char| c.is_ascii_digit())
}

fn decode_event(payload: &str) -> Result<PushEvent, FrameError> {
    let args: Vec<Value> = serde_json::from_str(payload).map_err(|e| FrameError::Payload(e.to_string()))?;
    let mut args = args.into_iter();
    let Some(Value::String(name)) = args.next() else {
        return Err(FrameError::Payload("event without a name".into()));
    };
    let data = args.next().unwrap_or(Value::Null);
    Ok(PushEvent::from_parts(name, &data))
}

fn connect_error_message(payload: &str) -> String {
    serde_json::from_str::<Value>(payload)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| payload.to_string())
}

impl PushEvent {
    /// Build an event from its name and first argument.
    pub fn from_parts(name: String, data: &Value) -> Self {
        let league_id = league_id_of(data);
        match name.as_str() {
            "league_day_advanced" => PushEvent::LeagueDayAdvanced { league_id },
            "game_completed" => PushEvent::GameCompleted { league_id },
            "new_storylines" => PushEvent::NewStorylines {
                league_id,
                count: data
                    .get("storylines")
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len),
            },
            _ => PushEvent::Other { name, league_id },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PushEvent::LeagueDayAdvanced { .. } => "league_day_advanced",
            PushEvent::GameCompleted { .. } => "game_completed",
            PushEvent::NewStorylines { .. } => "new_storylines",
            PushEvent::Other { name, .. } => name,
        }
    }

    pub fn league_id(&self) -> Option<LeagueId> {
        match self {
            PushEvent::LeagueDayAdvanced { league_id }
            | PushEvent::GameCompleted { league_id }
            | PushEvent::NewStorylines { league_id, .. }
            | PushEvent::Other { league_id, .. } => *league_id,
        }
    }
}

/// Room membership messages sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushCommand {
    JoinLeague(LeagueId),
    LeaveLeague(LeagueId),
}

impl PushCommand {
    /// The command as a Socket.IO event frame, e.g. `42["join_league",7]`.
    pub fn to_frame(&self) -> String {
        let (event, league_id) = match self {
            PushCommand::JoinLeague(id) => ("join_league", *id),
            PushCommand::LeaveLeague(id) => ("leave_league", *id),
        };
        format!("42{}", serde_json::json!([event, league_id]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> DraftStateResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn null_draft_state_is_not_started() {
        let snap = decode(r#"{"draftState": null, "picks": []}"#)
            .into_snapshot(5, Utc::now())
            .unwrap();
        assert_eq!(snap.status(), DraftStatus::NotStarted);
        assert_eq!(snap.session.league_id, 5);
        assert!(snap.on_the_clock().is_none());
        assert!(!snap.session.initialized);
    }

    #[test]
    fn initialized_draft_reports_its_rounds() {
        let snap = decode(r#"{"draftState": {"status": "not_started", "settings": {"rounds": 12, "type": "snake"}}}"#)
            .into_snapshot(5, Utc::now())
            .unwrap();
        assert_eq!(snap.status(), DraftStatus::NotStarted);
        assert!(snap.session.initialized);
        assert_eq!(snap.session.rounds, Some(12));

        let snap = decode(r#"{"draftState": {"status": "not_started", "total_rounds": 3}}"#)
            .into_snapshot(5, Utc::now())
            .unwrap();
        assert_eq!(snap.session.rounds, Some(3));
    }

    #[test]
    fn rich_shape_decodes() {
        let snap = decode(
            r#"{
                "draftState": {
                    "status": "in_progress",
                    "current_round": 2,
                    "current_pick_number": 6,
                    "on_the_clock_team_id": 3,
                    "draft_order": [1, 2, 3, 4]
                },
                "picks": [
                    {"pick_number": 1, "round": 1, "team_id": 1, "player_id": 10, "player_name": "James", "position": "SF"}
                ]
            }"#,
        )
        .into_snapshot(5, Utc::now())
        .unwrap();
        assert_eq!(snap.current_round(), 2);
        assert_eq!(snap.current_pick_number(), 6);
        assert_eq!(snap.on_the_clock(), Some(3));
        assert_eq!(snap.picks.len(), 1);
    }

    #[test]
    fn turn_counter_shape_derives_round_and_team() {
        let snap = decode(
            r#"{
                "draftState": {"status": "in_progress", "current_pick": 6, "draft_order": [1, 2, 3, 4]},
                "picks": [
                    {"pick_number": 5, "team_id": 4, "player_id": 50}
                ]
            }"#,
        )
        .into_snapshot(5, Utc::now())
        .unwrap();
        assert_eq!(snap.current_pick_number(), 6);
        assert_eq!(snap.current_round(), 2);
        // Snake: pick 6 belongs to the third team of the reversed round.
        assert_eq!(snap.on_the_clock(), Some(3));
        assert_eq!(snap.picks[0].round, 2);
    }

    #[test]
    fn in_progress_without_team_or_order_is_rejected() {
        let result = decode(r#"{"draftState": {"status": "in_progress", "current_pick": 1}}"#)
            .into_snapshot(5, Utc::now());
        assert!(matches!(result, Err(TransportError::Decode(_))));
    }

    #[test]
    fn completed_draft_drops_team_pointer() {
        let snap = decode(
            r#"{"draftState": {"status": "completed", "current_pick": 8, "on_the_clock_team_id": 2}}"#,
        )
        .into_snapshot(5, Utc::now())
        .unwrap();
        assert_eq!(snap.status(), DraftStatus::Completed);
        assert!(snap.on_the_clock().is_none());
        assert!(snap.session.is_consistent());
    }

    #[test]
    fn pick_number_never_trails_committed_picks() {
        let snap = decode(
            r#"{
                "draftState": {"status": "in_progress", "current_pick": 1, "on_the_clock_team_id": 2},
                "picks": [{"pick_number": 1, "team_id": 1, "player_id": 10}]
            }"#,
        )
        .into_snapshot(5, Utc::now())
        .unwrap();
        assert_eq!(snap.current_pick_number(), 2);
    }

    #[test]
    fn wrong_league_is_rejected() {
        let result = decode(r#"{"draftState": {"league_id": 6, "status": "not_started"}}"#)
            .into_snapshot(5, Utc::now());
        assert!(matches!(result, Err(TransportError::Decode(_))));
    }

    #[test]
    fn players_response_both_shapes() {
        let wrapped: PlayersResponse =
            serde_json::from_str(r#"{"players": [{"id": 1, "name": "A", "position": "C"}]}"#).unwrap();
        let bare: PlayersResponse =
            serde_json::from_str(r#"[{"id": 2, "name": "B", "position": "P"}]"#).unwrap();
        assert_eq!(wrapped.into_players()[0].id, 1);
        assert_eq!(bare.into_players()[0].id, 2);
    }

    #[test]
    fn pick_response_both_shapes() {
        let order = DraftOrder::new(vec![1, 2], DraftType::Snake);
        let wrapped: PickResponse =
            serde_json::from_str(r#"{"pick": {"pick_number": 3, "team_id": 2, "player_id": 9}}"#).unwrap();
        let pick = wrapped.into_pick(&order);
        assert_eq!(pick.round, 2);
        assert_eq!(pick.player_id, Some(9));

        let bare: PickResponse =
            serde_json::from_str(r#"{"pick_number": 1, "round": 1, "team_id": 1, "player_id": 4}"#).unwrap();
        assert_eq!(bare.into_pick(&order).pick_number, 1);
    }

    #[test]
    fn make_pick_request_uses_camel_case() {
        let body = serde_json::to_value(MakePickRequest {
            league_id: 1,
            team_id: 2,
            player_id: 3,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"leagueId": 1, "teamId": 2, "playerId": 3}));
    }

    // -- error classification --

    #[test]
    fn classify_by_code() {
        assert_eq!(
            classify_error_response(409, r#"{"error": "nope", "code": "NOT_YOUR_TURN"}"#),
            ApiError::NotYourTurn
        );
        assert_eq!(
            classify_error_response(409, r#"{"code": "player_unavailable"}"#),
            ApiError::PlayerUnavailable
        );
    }

    #[test]
    fn classify_by_message() {
        assert_eq!(
            classify_error_response(400, r#"{"error": "Not your turn"}"#),
            ApiError::NotYourTurn
        );
        assert_eq!(
            classify_error_response(400, r#"{"error": "Player already drafted"}"#),
            ApiError::PlayerUnavailable
        );
    }

    #[test]
    fn classify_other_client_errors_as_rejections() {
        assert_eq!(
            classify_error_response(400, r#"{"error": "Roster is full at C"}"#),
            ApiError::rejected("Roster is full at C")
        );
    }

    #[test]
    fn classify_unauthorized_and_server_errors_as_transport() {
        assert_eq!(
            classify_error_response(401, "{}"),
            ApiError::Transport(TransportError::Unauthorized)
        );
        assert_eq!(
            classify_error_response(502, "Bad Gateway"),
            ApiError::Transport(TransportError::Status {
                status: 502,
                message: "Bad Gateway".into()
            })
        );
    }

    // -- push channel --

    #[test]
    fn event_frames_decode() {
        assert_eq!(
            PushFrame::decode(r#"42["league_day_advanced",{"leagueId":4}]"#).unwrap(),
            PushFrame::Event(PushEvent::LeagueDayAdvanced { league_id: Some(4) })
        );
        assert_eq!(
            PushFrame::decode(r#"42["game_completed"]"#).unwrap(),
            PushFrame::Event(PushEvent::GameCompleted { league_id: None })
        );
        assert_eq!(
            PushFrame::decode(r#"42["new_storylines",{"leagueId":"4","storylines":[{},{}]}]"#).unwrap(),
            PushFrame::Event(PushEvent::NewStorylines {
                league_id: Some(4),
                count: 2
            })
        );
    }

    #[test]
    fn namespace_and_ack_id_are_skipped() {
        assert_eq!(
            PushFrame::decode(r#"42/league,17["trade_proposed",{"league_id":2}]"#).unwrap(),
            PushFrame::Event(PushEvent::Other {
                name: "trade_proposed".into(),
                league_id: Some(2)
            })
        );
        assert_eq!(
            PushFrame::decode(r#"4212["game_completed",{}]"#).unwrap(),
            PushFrame::Event(PushEvent::GameCompleted { league_id: None })
        );
    }

    #[test]
    fn control_frames_decode() {
        assert_eq!(
            PushFrame::decode(r#"0{"sid":"a","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#).unwrap(),
            PushFrame::Open
        );
        assert_eq!(PushFrame::decode("2").unwrap(), PushFrame::Ping);
        assert_eq!(PushFrame::decode("3").unwrap(), PushFrame::Pong);
        assert_eq!(PushFrame::decode(r#"40{"sid":"b"}"#).unwrap(), PushFrame::Connected);
        assert_eq!(PushFrame::decode("41").unwrap(), PushFrame::Disconnected);
        assert_eq!(PushFrame::decode("6").unwrap(), PushFrame::Ignored);
        assert_eq!(
            PushFrame::decode(r#"44{"message":"not authorized"}"#).unwrap(),
            PushFrame::ConnectRefused("not authorized".into())
        );
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert_eq!(PushFrame::decode(""), Err(FrameError::Empty));
        assert!(matches!(PushFrame::decode("not json"), Err(FrameError::UnknownType(_))));
        assert!(matches!(
            PushFrame::decode(r#"{"event": "game_completed"}"#),
            Err(FrameError::UnknownType(_))
        ));
        assert!(matches!(PushFrame::decode("42{}"), Err(FrameError::Payload(_))));
        assert!(matches!(PushFrame::decode("42[7]"), Err(FrameError::Payload(_))));
    }

    #[test]
    fn push_commands_encode_as_event_frames() {
        assert_eq!(PushCommand::JoinLeague(7).to_frame(), r#"42["join_league",7]"#);
        assert_eq!(PushCommand::LeaveLeague(7).to_frame(), r#"42["leave_league",7]"#);
    }
}
