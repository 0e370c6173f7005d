use arena_shared::{InitMsg, Item, Player, ServerMsg};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::config::ServerConfig;
use crate::coordinator::{AnnounceOutcome, CollectResult, Coordinator, MoveResult};

/// Commands from client connections to the game loop
pub enum GameCommand {
    Connect {
        conn: String,
    },
    /// `response` receives the init reply, or `None` if the announce was
    /// refused.
    Announce {
        conn: String,
        player: Player,
        response: oneshot::Sender<Option<InitMsg>>,
    },
    Move {
        conn: String,
        player: Player,
    },
    Collect {
        conn: String,
        echoed: Option<u64>,
    },
    Disconnect {
        conn: String,
    },
    /// Current player list and item, answered without mutating anything.
    Snapshot {
        response: oneshot::Sender<(Vec<Player>, Item)>,
    },
}

/// Broadcasts from game loop to all clients
#[derive(Debug, Clone)]
pub enum GameBroadcast {
    Players(Vec<Player>),
    Item(Item),
}

impl GameBroadcast {
    pub fn to_server_msg(&self) -> ServerMsg {
        match self {
            GameBroadcast::Players(players) => ServerMsg::Update {
                players: players.clone(),
            },
            GameBroadcast::Item(item) => ServerMsg::ItemUpdate(item.clone()),
        }
    }
}

/// Ask the game loop for the full state and return it as the `update` and
/// `item-update` a client needs to catch up. `None` if the loop is gone.
pub async fn request_resync(game_tx: &mpsc::Sender<GameCommand>) -> Option<[ServerMsg; 2]> {
    let (response, rx) = oneshot::channel();
    game_tx.send(GameCommand::Snapshot { response }).await.ok()?;
    let (players, item) = rx.await.ok()?;
    Some([ServerMsg::Update { players }, ServerMsg::ItemUpdate(item)])
}

/// Run the game loop. Owns all game state and handles one command to
/// completion (mutation plus broadcast) before taking the next.
pub async fn run_game_loop(
    cmd_rx: mpsc::Receiver<GameCommand>,
    broadcast_tx: broadcast::Sender<GameBroadcast>,
    server_config: ServerConfig,
) {
    let coordinator = Coordinator::from_config(&server_config);
    run_with(coordinator, cmd_rx, broadcast_tx).await;
}

/// Same as [`run_game_loop`] with a caller-built coordinator.
pub async fn run_with(
    mut coordinator: Coordinator,
    mut cmd_rx: mpsc::Receiver<GameCommand>,
    broadcast_tx: broadcast::Sender<GameBroadcast>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            GameCommand::Connect { conn } => {
                coordinator.connect(&conn);
            }
            GameCommand::Announce {
                conn,
                player,
                response,
            } => match coordinator.announce(&conn, player) {
                AnnounceOutcome::Joined { init, players } => {
                    tracing::info!("Player {} joined ({} online)", conn, players.len());
                    let _ = response.send(Some(init));
                    let _ = broadcast_tx.send(GameBroadcast::Players(players));
                }
                AnnounceOutcome::Rejected(reason) => {
                    tracing::warn!("Announce from {} rejected: {}", conn, reason);
                    let _ = response.send(None);
                }
            },
            GameCommand::Move { conn, player } => match coordinator.move_player(&conn, player) {
                MoveResult::Applied(players) => {
                    let _ = broadcast_tx.send(GameBroadcast::Players(players));
                }
                MoveResult::UnknownPlayer => {
                    tracing::debug!(
                        "Move from {} ({:?}) for unknown player dropped",
                        conn,
                        coordinator.phase(&conn)
                    );
                }
                MoveResult::Rejected(reason) => {
                    tracing::debug!("Move from {} rejected: {}", conn, reason);
                }
            },
            GameCommand::Collect { conn, echoed } => match coordinator.collect(&conn, echoed) {
                CollectResult::Respawned(item) => {
                    tracing::debug!(
                        "{} collected, new item {} at ({}, {})",
                        conn,
                        item.id,
                        item.x,
                        item.y
                    );
                    let _ = broadcast_tx.send(GameBroadcast::Item(item));
                }
                CollectResult::Rejected(reason) => {
                    tracing::debug!("Collect from {} rejected: {}", conn, reason);
                }
            },
            GameCommand::Disconnect { conn } => {
                let outcome = coordinator.disconnect(&conn);
                if outcome.removed.is_some() {
                    tracing::info!("Player {} left", conn);
                }
                let _ = broadcast_tx.send(GameBroadcast::Players(outcome.players));
            }
            GameCommand::Snapshot { response } => {
                let _ = response.send(coordinator.snapshot());
            }
        }
    }

    tracing::info!("Game loop ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Permissive;
    use arena_shared::WorldBounds;

    fn spawn_loop() -> (
        mpsc::Sender<GameCommand>,
        broadcast::Receiver<GameBroadcast>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (broadcast_tx, broadcast_rx) = broadcast::channel(16);
        let coordinator =
            Coordinator::new(WorldBounds::default(), Some(3), Box::new(Permissive));
        tokio::spawn(run_with(coordinator, cmd_rx, broadcast_tx));
        (cmd_tx, broadcast_rx)
    }

    async fn announce(tx: &mpsc::Sender<GameCommand>, id: &str, score: u32) -> Option<InitMsg> {
        tx.send(GameCommand::Connect { conn: id.to_string() })
            .await
            .unwrap();
        let (response, rx) = oneshot::channel();
        let mut player = Player::new(id, 0, 0);
        player.score = score;
        tx.send(GameCommand::Announce {
            conn: id.to_string(),
            player,
            response,
        })
        .await
        .unwrap();
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn announce_replies_then_broadcasts() {
        let (tx, mut rx) = spawn_loop();
        let init = announce(&tx, "A", 0).await.unwrap();
        assert_eq!(init.id, "A");

        match rx.recv().await.unwrap() {
            GameBroadcast::Players(players) => assert_eq!(players.len(), 1),
            other => panic!("Expected Players, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_move_is_silent() {
        let (tx, mut rx) = spawn_loop();
        tx.send(GameCommand::Move {
            conn: "ghost".to_string(),
            player: Player::new("ghost", 1, 1),
        })
        .await
        .unwrap();
        // A later collect proves the move produced nothing.
        tx.send(GameCommand::Collect {
            conn: "ghost".to_string(),
            echoed: None,
        })
        .await
        .unwrap();
        assert!(matches!(rx.recv().await.unwrap(), GameBroadcast::Item(_)));
    }

    #[tokio::test]
    async fn disconnect_broadcasts_remaining() {
        let (tx, mut rx) = spawn_loop();
        announce(&tx, "A", 0).await.unwrap();
        announce(&tx, "B", 5).await.unwrap();
        tx.send(GameCommand::Disconnect {
            conn: "A".to_string(),
        })
        .await
        .unwrap();

        let mut last = None;
        for _ in 0..3 {
            if let GameBroadcast::Players(players) = rx.recv().await.unwrap() {
                last = Some(players);
            }
        }
        let last = last.unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].id, "B");
    }

    #[tokio::test]
    async fn lagged_receiver_recovers_missed_item() {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (broadcast_tx, mut slow_rx) = broadcast::channel(1);
        let coordinator =
            Coordinator::new(WorldBounds::default(), Some(3), Box::new(Permissive));
        tokio::spawn(run_with(coordinator, cmd_rx, broadcast_tx));

        announce(&cmd_tx, "A", 0).await.unwrap();
        cmd_tx
            .send(GameCommand::Collect {
                conn: "A".to_string(),
                echoed: None,
            })
            .await
            .unwrap();
        cmd_tx
            .send(GameCommand::Move {
                conn: "A".to_string(),
                player: Player::new("A", 10, 0),
            })
            .await
            .unwrap();

        // Round-trip through the loop so every command above has been handled.
        let [_, expected_item] = request_resync(&cmd_tx).await.unwrap();

        // The item-update was overwritten in the one-slot channel.
        assert!(matches!(
            slow_rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
        assert!(matches!(
            slow_rx.recv().await.unwrap(),
            GameBroadcast::Players(_)
        ));

        let [update, item_update] = request_resync(&cmd_tx).await.unwrap();
        match update {
            ServerMsg::Update { players } => assert_eq!(players, vec![Player::new("A", 10, 0)]),
            other => panic!("Expected Update, got {:?}", other),
        }
        match (item_update, expected_item) {
            (ServerMsg::ItemUpdate(item), ServerMsg::ItemUpdate(expected)) => {
                assert_eq!(item, expected);
                assert_ne!(item.id, 1, "resync must carry the respawned item");
            }
            other => panic!("Expected ItemUpdates, got {:?}", other),
        }
    }

    #[test]
    fn broadcasts_map_to_wire_messages() {
        let msg = GameBroadcast::Players(vec![Player::new("a", 0, 0)]).to_server_msg();
        assert!(matches!(msg, ServerMsg::Update { ref players } if players.len() == 1));
        let item = Item {
            x: 1,
            y: 2,
            value: 1,
            id: 3,
        };
        let msg = GameBroadcast::Item(item.clone()).to_server_msg();
        assert!(matches!(msg, ServerMsg::ItemUpdate(i) if i == item));
    }
}
