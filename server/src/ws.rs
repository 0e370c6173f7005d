use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, oneshot};
use uuid::Uuid;

use arena_shared::{ClientMsg, ServerMsg};

use crate::game_loop::{request_resync, GameBroadcast, GameCommand};

/// Undecodable frames tolerated before the connection is closed.
pub const MAX_PARSE_ERRORS: u32 = 5;

/// Shared app state passed to each WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub game_tx: mpsc::Sender<GameCommand>,
    pub broadcast_tx: broadcast::Sender<GameBroadcast>,
    pub max_message_bytes: usize,
}

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    // Frames over the limit are refused while reading, before they are buffered.
    ws.max_message_size(app_state.max_message_bytes)
        .max_frame_size(app_state.max_message_bytes)
        .on_upgrade(|socket| handle_socket(socket, app_state))
}

type WsSink = SplitSink<WebSocket, Message>;

/// Why a connection loop stopped.
enum Exit {
    /// Peer closed or the socket failed.
    Closed,
    /// We are closing the peer for misbehaving.
    Kicked(&'static str),
    /// Game loop is gone.
    Shutdown,
}

async fn send_msg(sink: &mut WsSink, msg: &ServerMsg) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => sink.send(Message::Text(json.into())).await,
        Err(e) => {
            tracing::error!("Failed to encode {:?}: {}", msg, e);
            Ok(())
        }
    }
}

async fn handle_socket(socket: WebSocket, app_state: AppState) {
    let (mut sink, mut stream) = socket.split();

    // The identity doubles as the player's id for the lifetime of the socket.
    let conn = Uuid::new_v4().to_string();

    // Subscribe before joining so no broadcast after our announce is missed.
    let mut broadcast_rx = app_state.broadcast_tx.subscribe();

    if app_state
        .game_tx
        .send(GameCommand::Connect { conn: conn.clone() })
        .await
        .is_err()
    {
        tracing::error!("Failed to send Connect command");
        return;
    }
    tracing::info!("Connection {} opened", conn);

    let exit = if send_msg(&mut sink, &ServerMsg::Connected { id: conn.clone() })
        .await
        .is_err()
    {
        Exit::Closed
    } else {
        run_connection(&conn, &app_state, &mut sink, &mut stream, &mut broadcast_rx).await
    };

    match exit {
        Exit::Closed => {}
        Exit::Kicked(reason) => {
            tracing::warn!("Closing {}: {}", conn, reason);
            let _ = sink.send(Message::Close(None)).await;
        }
        Exit::Shutdown => {
            tracing::error!("Game loop unavailable, closing {}", conn);
            let _ = sink.send(Message::Close(None)).await;
        }
    }

    // Cleanup on disconnect
    let _ = app_state
        .game_tx
        .send(GameCommand::Disconnect { conn: conn.clone() })
        .await;
    tracing::info!("Connection {} closed", conn);
}

async fn run_connection(
    conn: &str,
    app_state: &AppState,
    sink: &mut WsSink,
    stream: &mut futures_util::stream::SplitStream<WebSocket>,
    broadcast_rx: &mut broadcast::Receiver<GameBroadcast>,
) -> Exit {
    let mut parse_errors = 0;

    loop {
        tokio::select! {
            // Client -> Server
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let text = text.as_str();
                        // Normally caught by the upgrade's size limit already.
                        if text.len() > app_state.max_message_bytes {
                            return Exit::Kicked("oversized message");
                        }
                        match serde_json::from_str::<ClientMsg>(text) {
                            Ok(client_msg) => {
                                if let Some(exit) = forward(conn, app_state, sink, client_msg).await {
                                    return exit;
                                }
                            }
                            Err(e) => {
                                parse_errors += 1;
                                tracing::warn!(
                                    "Bad message from {} ({}/{}): {}",
                                    conn,
                                    parse_errors,
                                    MAX_PARSE_ERRORS,
                                    e
                                );
                                if parse_errors >= MAX_PARSE_ERRORS {
                                    return Exit::Kicked("too many parse errors");
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return Exit::Closed,
                    Some(Err(e)) => {
                        tracing::debug!("Socket error on {}: {}", conn, e);
                        return Exit::Closed;
                    }
                    _ => {} // Ignore ping/pong/binary
                }
            }

            // Server -> Client (broadcast)
            result = broadcast_rx.recv() => {
                match result {
                    Ok(broadcast) => {
                        if send_msg(sink, &broadcast.to_server_msg()).await.is_err() {
                            return Exit::Closed;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Missed messages may include an item-update, so push
                        // the whole state instead of waiting for the next one.
                        tracing::warn!(
                            "Connection {} lagged by {} messages, resyncing",
                            conn,
                            n
                        );
                        let Some(messages) = request_resync(&app_state.game_tx).await else {
                            return Exit::Shutdown;
                        };
                        for msg in &messages {
                            if send_msg(sink, msg).await.is_err() {
                                return Exit::Closed;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => return Exit::Shutdown,
                }
            }
        }
    }
}

/// Hand one decoded client message to the game loop. Announces wait for the
/// init reply and send it before any further broadcast is relayed.
async fn forward(
    conn: &str,
    app_state: &AppState,
    sink: &mut WsSink,
    msg: ClientMsg,
) -> Option<Exit> {
    let command = match msg {
        ClientMsg::NewPlayer(player) => {
            let (resp_tx, resp_rx) = oneshot::channel();
            let cmd = GameCommand::Announce {
                conn: conn.to_string(),
                player,
                response: resp_tx,
            };
            if app_state.game_tx.send(cmd).await.is_err() {
                return Some(Exit::Shutdown);
            }
            return match resp_rx.await {
                Ok(Some(init)) => match send_msg(sink, &ServerMsg::Init(init)).await {
                    Ok(()) => None,
                    Err(_) => Some(Exit::Closed),
                },
                Ok(None) => None,
                Err(_) => Some(Exit::Shutdown),
            };
        }
        ClientMsg::UpdatePlayer(player) => GameCommand::Move {
            conn: conn.to_string(),
            player,
        },
        ClientMsg::ItemCollected { id } => GameCommand::Collect {
            conn: conn.to_string(),
            echoed: id,
        },
    };

    if app_state.game_tx.send(command).await.is_err() {
        return Some(Exit::Shutdown);
    }
    None
}
