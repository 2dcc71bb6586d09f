// Push-channel client for league notifications.
//
// Speaks Socket.IO over the websocket transport: waits for the Engine.IO open
// packet, joins the default namespace, emits `join_league`, then forwards
// decoded events as `PushSignal`s over an mpsc channel and answers pings.
// Reconnection is left to whoever owns the subscription.

use std::time::Duration;

use anyhow::Context;
use futures_util::sink::Sink;
use futures_util::stream::Stream;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

use leaguedraft_core::api::PushSubscription;
use leaguedraft_core::protocol::{
    PushCommand, PushFrame, PushSignal, CONNECT_FRAME, ENGINE_IO_QUERY, PONG_FRAME,
};
use leaguedraft_core::LeagueId;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Frames queued for the socket writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Frame(String),
    Close,
}

/// A live push subscription. Unsubscribing (or dropping the handle) emits
/// `leave_league`, closes the socket and stops forwarding.
pub struct PushHandle {
    league_id: LeagueId,
    outbound: Option<mpsc::UnboundedSender<Outbound>>,
    reader: JoinHandle<()>,
}

impl PushHandle {
    pub fn league_id(&self) -> LeagueId {
        self.league_id
    }

    pub fn is_active(&self) -> bool {
        self.outbound.is_some() && !self.reader.is_finished()
    }
}

impl PushSubscription for PushHandle {
    fn unsubscribe(&mut self) {
        if let Some(outbound) = self.outbound.take() {
            info!("Leaving push room for league {}", self.league_id);
            let _ = outbound.send(Outbound::Frame(PushCommand::LeaveLeague(self.league_id).to_frame()));
            let _ = outbound.send(Outbound::Close);
        }
        self.reader.abort();
    }
}

impl Drop for PushHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// The Socket.IO websocket endpoint for a server URL. `http(s)` schemes map
/// to `ws(s)`; a URL already carrying an Engine.IO query is used as is.
pub fn engine_url(url: &str) -> String {
    let url = url.trim();
    let url = if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else {
        url.to_string()
    };
    if url.contains("EIO=") {
        return url;
    }
    let base = url.trim_end_matches('/');
    let base = base.strip_suffix("/socket.io").unwrap_or(base);
    format!("{base}/socket.io/?{ENGINE_IO_QUERY}")
}

/// Connect to the server at `url`, join the room for `league_id`, and start
/// forwarding signals through `tx`. `Connected` is sent once the room has
/// been joined; `Disconnected` when the server goes away.
pub async fn subscribe(
    url: &str,
    league_id: LeagueId,
    tx: mpsc::Sender<PushSignal>,
) -> anyhow::Result<PushHandle> {
    let endpoint = engine_url(url);
    let (ws_stream, _response) = tokio_tungstenite::connect_async(endpoint.as_str())
        .await
        .with_context(|| format!("failed to connect to push channel at {endpoint}"))?;
    info!("Connected to push channel at {endpoint}");

    let (mut write, mut read) = ws_stream.split();
    tokio::time::timeout(HANDSHAKE_TIMEOUT, handshake(&mut write, &mut read))
        .await
        .context("push handshake timed out")??;

    write
        .send(Message::Text(PushCommand::JoinLeague(league_id).to_frame().into()))
        .await
        .context("failed to join league room")?;

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Outbound>();
    tokio::spawn(async move {
        while let Some(outbound) = outbound_rx.recv().await {
            match outbound {
                Outbound::Frame(frame) => {
                    if let Err(e) = write.send(Message::Text(frame.into())).await {
                        debug!("Push write failed: {e}");
                        break;
                    }
                }
                Outbound::Close => {
                    let _ = write.close().await;
                    break;
                }
            }
        }
    });

    let replies = outbound_tx.clone();
    let reader = tokio::spawn(async move {
        if tx.send(PushSignal::Connected).await.is_err() {
            return;
        }
        if process_message_stream(read, &tx, &replies).await.is_err() {
            return;
        }
        let _ = tx.send(PushSignal::Disconnected).await;
    });

    Ok(PushHandle {
        league_id,
        outbound: Some(outbound_tx),
        reader,
    })
}

/// Wait for the Engine.IO open packet, request the default namespace and
/// wait for it to be acknowledged.
async fn handshake<W, R>(write: &mut W, read: &mut R) -> anyhow::Result<()>
where
    W: Sink<Message, Error = tungstenite::Error> + Unpin,
    R: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(message) = read.next().await {
        let Message::Text(text) = message.context("push channel failed during handshake")? else {
            continue;
        };
        match PushFrame::decode(&text) {
            Ok(PushFrame::Open) => {
                write
                    .send(Message::Text(CONNECT_FRAME.into()))
                    .await
                    .context("failed to open push namespace")?;
            }
            Ok(PushFrame::Ping) => {
                write
                    .send(Message::Text(PONG_FRAME.into()))
                    .await
                    .context("failed to answer push ping")?;
            }
            Ok(PushFrame::Connected) => return Ok(()),
            Ok(PushFrame::ConnectRefused(message)) => {
                anyhow::bail!("push namespace refused the connection: {message}")
            }
            Ok(other) => debug!("Ignoring {other:?} during push handshake"),
            Err(e) => warn!("Ignoring malformed push frame during handshake: {e}"),
        }
    }
    anyhow::bail!("push channel closed during handshake")
}

/// Decode frames from any message stream: events are forwarded as
/// [`PushSignal::Event`], pings are answered through `replies`, and a server
/// disconnect ends the stream. Undecodable frames are logged and skipped.
/// Returns `Err(())` when the receiver has been dropped.
pub async fn process_message_stream<St>(
    mut stream: St,
    tx: &mpsc::Sender<PushSignal>,
    replies: &mpsc::UnboundedSender<Outbound>,
) -> Result<(), ()>
where
    St: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => match PushFrame::decode(&text) {
                Ok(PushFrame::Event(event)) => {
                    debug!("Push event: {}", event.name());
                    if tx.send(PushSignal::Event(event)).await.is_err() {
                        return Err(());
                    }
                }
                Ok(PushFrame::Ping) => {
                    let _ = replies.send(Outbound::Frame(PONG_FRAME.to_string()));
                }
                Ok(PushFrame::Close) | Ok(PushFrame::Disconnected) => {
                    info!("Push server ended the session");
                    break;
                }
                Ok(PushFrame::ConnectRefused(message)) => {
                    warn!("Push namespace refused: {message}");
                    break;
                }
                Ok(_) => {}
                Err(e) => warn!("Ignoring malformed push frame: {e}"),
            },
            Ok(Message::Close(_)) => {
                info!("Push channel closed by server");
                break;
            }
            Err(e) => {
                warn!("Push channel error: {e}");
                break;
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use leaguedraft_core::protocol::PushEvent;
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
    use tokio_tungstenite::tungstenite::Error as WsError;
    use tokio_tungstenite::WebSocketStream;

    const OPEN: &str = r#"0{"sid":"e1","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

    fn mock_stream(
        messages: Vec<Result<Message, WsError>>,
    ) -> impl Stream<Item = Result<Message, WsError>> + Unpin {
        stream::iter(messages)
    }

    fn text(s: &str) -> Result<Message, WsError> {
        Ok(Message::Text(s.into()))
    }

    async fn next_text(ws: &mut WebSocketStream<tokio::net::TcpStream>) -> String {
        loop {
            match ws.next().await.unwrap().unwrap() {
                Message::Text(text) => return text.as_str().to_string(),
                _ => continue,
            }
        }
    }

    #[test]
    fn engine_url_targets_socket_io_endpoint() {
        assert_eq!(
            engine_url("http://localhost:5000"),
            "ws://localhost:5000/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(
            engine_url("wss://league.example/socket.io/"),
            "wss://league.example/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(
            engine_url("ws://h:1/socket.io/?EIO=4&transport=websocket&token=x"),
            "ws://h:1/socket.io/?EIO=4&transport=websocket&token=x"
        );
    }

    #[tokio::test]
    async fn event_frames_forwarded_in_order() {
        let (tx, mut rx) = mpsc::channel(16);
        let (out_tx, _out_rx) = mpsc::unbounded_channel();
        let messages = vec![
            text(r#"42["league_day_advanced",{"leagueId":1}]"#),
            text(r#"42["game_completed",{}]"#),
        ];
        process_message_stream(mock_stream(messages), &tx, &out_tx).await.unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            PushSignal::Event(PushEvent::LeagueDayAdvanced { league_id: Some(1) })
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            PushSignal::Event(PushEvent::GameCompleted { league_id: None })
        );
    }

    #[tokio::test]
    async fn pings_are_answered_and_malformed_frames_skipped() {
        let (tx, mut rx) = mpsc::channel(16);
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let messages = vec![
            text("not a frame"),
            text("2"),
            Ok(Message::Binary(vec![1, 2].into())),
            text(r#"{"event": "game_completed"}"#),
            text(r#"42["new_storylines",{"leagueId":1,"storylines":[]}]"#),
        ];
        process_message_stream(mock_stream(messages), &tx, &out_tx).await.unwrap();

        assert_eq!(out_rx.try_recv().unwrap(), Outbound::Frame("3".into()));
        assert_eq!(
            rx.recv().await.unwrap(),
            PushSignal::Event(PushEvent::NewStorylines {
                league_id: Some(1),
                count: 0
            })
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn disconnect_close_and_error_stop_forwarding() {
        let (tx, mut rx) = mpsc::channel(16);
        let (out_tx, _out_rx) = mpsc::unbounded_channel();
        for first in [text("41"), text("1"), Ok(Message::Close(None)), Err(WsError::ConnectionClosed)] {
            let messages = vec![first, text(r#"42["game_completed"]"#)];
            process_message_stream(mock_stream(messages), &tx, &out_tx).await.unwrap();
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn dropped_receiver_reports_err() {
        let (tx, rx) = mpsc::channel(16);
        let (out_tx, _out_rx) = mpsc::unbounded_channel();
        drop(rx);
        let messages = vec![text(r#"42["game_completed"]"#)];
        assert!(process_message_stream(mock_stream(messages), &tx, &out_tx).await.is_err());
    }

    #[tokio::test]
    async fn subscribe_handshakes_joins_forwards_and_leaves() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut path = String::new();
            let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                path = req.uri().to_string();
                Ok(resp)
            };
            let mut ws = tokio_tungstenite::accept_hdr_async(socket, callback).await.unwrap();

            ws.send(Message::Text(OPEN.into())).await.unwrap();
            let connect = next_text(&mut ws).await;
            ws.send(Message::Text(r#"40{"sid":"n1"}"#.into())).await.unwrap();
            let join = next_text(&mut ws).await;
            ws.send(Message::Text("2".into())).await.unwrap();
            let pong = next_text(&mut ws).await;
            ws.send(Message::Text(r#"42["league_day_advanced",{"leagueId":3}]"#.into()))
                .await
                .unwrap();
            let leave = next_text(&mut ws).await;
            (path, connect, join, pong, leave)
        });

        let (tx, mut rx) = mpsc::channel(16);
        let mut handle = subscribe(&format!("http://{addr}"), 3, tx).await.unwrap();
        assert_eq!(handle.league_id(), 3);
        assert_eq!(rx.recv().await.unwrap(), PushSignal::Connected);
        assert_eq!(
            rx.recv().await.unwrap(),
            PushSignal::Event(PushEvent::LeagueDayAdvanced { league_id: Some(3) })
        );

        handle.unsubscribe();
        assert!(!handle.is_active());

        let (path, connect, join, pong, leave) = server.await.unwrap();
        assert_eq!(path, "/socket.io/?EIO=4&transport=websocket");
        assert_eq!(connect, "40");
        assert_eq!(join, r#"42["join_league",3]"#);
        assert_eq!(pong, "3");
        assert_eq!(leave, r#"42["leave_league",3]"#);
    }

    #[tokio::test]
    async fn refused_namespace_fails_subscribe() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(socket).await.unwrap();
            ws.send(Message::Text(OPEN.into())).await.unwrap();
            let _connect = next_text(&mut ws).await;
            ws.send(Message::Text(r#"44{"message":"not authorized"}"#.into()))
                .await
                .unwrap();
            let _ = ws.next().await;
        });

        let (tx, _rx) = mpsc::channel(16);
        let err = subscribe(&format!("ws://{addr}"), 3, tx).await.err().unwrap();
        assert!(format!("{err:#}").contains("not authorized"));
    }

    #[tokio::test]
    async fn subscribe_to_closed_port_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let (tx, _rx) = mpsc::channel(16);
        assert!(subscribe(&format!("ws://{addr}"), 3, tx).await.is_err());
    }
}
