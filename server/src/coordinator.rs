//! Translates client events into registry and spawner mutations.
//!
//! The coordinator is plain synchronous state. It returns what should be
//! sent instead of sending it, so the transport decides how replies and
//! broadcasts reach sockets. Every outcome that mutates the player list
//! carries the full list as it stood right after the mutation.

use std::collections::HashMap;

use arena_shared::{InitMsg, Item, Player, WorldBounds};

use crate::config::ServerConfig;
use crate::policy::{ValidationPolicy, Verdict};
use crate::registry::SessionRegistry;
use crate::spawner::ItemSpawner;

/// Lifecycle of one transport connection. A connection becomes `Active`
/// once it announces a player; unknown connections report `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Connected,
    Active,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnounceOutcome {
    /// `init` goes to the announcing connection only, `players` to everyone.
    Joined { init: InitMsg, players: Vec<Player> },
    Rejected(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveResult {
    Applied(Vec<Player>),
    UnknownPlayer,
    Rejected(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectResult {
    Respawned(Item),
    Rejected(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectOutcome {
    pub removed: Option<Player>,
    pub players: Vec<Player>,
}

pub struct Coordinator {
    registry: SessionRegistry,
    spawner: ItemSpawner,
    policy: Box<dyn ValidationPolicy>,
    connections: HashMap<String, ConnectionPhase>,
    seed: Option<u64>,
}

impl Coordinator {
    pub fn new(world: WorldBounds, seed: Option<u64>, policy: Box<dyn ValidationPolicy>) -> Self {
        Self {
            registry: SessionRegistry::new(),
            spawner: ItemSpawner::new(world, seed),
            policy,
            connections: HashMap::new(),
            seed,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.world, config.rng_seed, config.policy.build())
    }

    /// Drop every player and connection and place a fresh item.
    pub fn reset(&mut self) {
        self.registry = SessionRegistry::new();
        self.spawner = ItemSpawner::new(self.spawner.bounds(), self.seed);
        self.connections.clear();
    }

    pub fn connect(&mut self, connection: &str) {
        self.connections
            .insert(connection.to_string(), ConnectionPhase::Connected);
    }

    pub fn phase(&self, connection: &str) -> ConnectionPhase {
        self.connections
            .get(connection)
            .copied()
            .unwrap_or(ConnectionPhase::Disconnected)
    }

    /// `new-player`: store the record (replacing any previous one with the
    /// same identity) and produce the init reply plus the list broadcast.
    pub fn announce(&mut self, connection: &str, player: Player) -> AnnounceOutcome {
        if let Verdict::Reject(reason) = self.policy.check_announce(connection, &player) {
            return AnnounceOutcome::Rejected(reason);
        }

        self.registry.upsert(player);
        self.connections
            .insert(connection.to_string(), ConnectionPhase::Active);

        let players = self.registry.list();
        AnnounceOutcome::Joined {
            init: InitMsg {
                id: connection.to_string(),
                players: players.clone(),
                item: self.spawner.current().clone(),
            },
            players,
        }
    }

    /// `update-player`: replace an existing record. Unknown identities are
    /// dropped, never inserted.
    pub fn move_player(&mut self, connection: &str, player: Player) -> MoveResult {
        let Some(previous) = self.registry.get(&player.id) else {
            return MoveResult::UnknownPlayer;
        };
        if let Verdict::Reject(reason) = self.policy.check_move(connection, previous, &player) {
            return MoveResult::Rejected(reason);
        }

        self.registry.replace(player);
        MoveResult::Applied(self.registry.list())
    }

    /// `item-collected`: replace the item. Scores are not touched here; the
    /// collecting client reports its new score through its next move.
    pub fn collect(&mut self, connection: &str, echoed: Option<u64>) -> CollectResult {
        let collector = self.registry.get(connection);
        let verdict = self
            .policy
            .check_collect(collector, echoed, self.spawner.current());
        if let Verdict::Reject(reason) = verdict {
            return CollectResult::Rejected(reason);
        }

        CollectResult::Respawned(self.spawner.spawn().clone())
    }

    /// Connection closed: drop its player (if any) and report the list left.
    pub fn disconnect(&mut self, connection: &str) -> DisconnectOutcome {
        self.connections.remove(connection);
        let removed = self.registry.remove(connection);
        DisconnectOutcome {
            removed,
            players: self.registry.list(),
        }
    }

    /// Full player list and live item, for clients that missed broadcasts.
    pub fn snapshot(&self) -> (Vec<Player>, Item) {
        (self.registry.list(), self.spawner.current().clone())
    }

    pub fn players(&self) -> Vec<Player> {
        self.registry.list()
    }

    pub fn item(&self) -> &Item {
        self.spawner.current()
    }
}
