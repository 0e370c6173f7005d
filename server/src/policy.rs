//! Pluggable checks on client-submitted state.
//!
//! Clients are authoritative over their own position and score, and the
//! server accepts every collect. [`Permissive`] keeps exactly that
//! behaviour and is the default. [`Strict`] is opt-in and changes what
//! clients observe, so it must be chosen explicitly in the config.

use std::str::FromStr;

use arena_shared::config::{ITEM_VALUE, MOVE_STEP};
use arena_shared::geometry::{collides, Direction};
use arena_shared::{Item, Player};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(&'static str),
}

impl Verdict {
    pub fn is_accept(self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

pub trait ValidationPolicy: Send {
    fn check_announce(&self, _connection: &str, _player: &Player) -> Verdict {
        Verdict::Accept
    }

    /// `previous` is the registry's current record for the same identity.
    fn check_move(&self, _connection: &str, _previous: &Player, _next: &Player) -> Verdict {
        Verdict::Accept
    }

    /// `collector` is the registry record of the requesting connection, if
    /// it has announced. `echoed` is the item id the client claims to have
    /// touched.
    fn check_collect(
        &self,
        _collector: Option<&Player>,
        _echoed: Option<u64>,
        _item: &Item,
    ) -> Verdict {
        Verdict::Accept
    }
}

/// Accepts everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Permissive;

impl ValidationPolicy for Permissive {}

/// Server-side rechecks.
///
/// - records must carry the connection's own identity
/// - a move may travel at most one step per axis
/// - a move may raise the score by at most one item's value, never lower it
/// - a collect must come from an announced player whose last known box
///   touches the item, either where it stands or one step away (clients
///   report the collect before the move that reached the item)
/// - a collect naming a stale item id is refused
#[derive(Debug, Default, Clone, Copy)]
pub struct Strict;

impl ValidationPolicy for Strict {
    fn check_announce(&self, connection: &str, player: &Player) -> Verdict {
        if player.id != connection {
            return Verdict::Reject("identity does not match connection");
        }
        Verdict::Accept
    }

    fn check_move(&self, connection: &str, previous: &Player, next: &Player) -> Verdict {
        if next.id != connection {
            return Verdict::Reject("identity does not match connection");
        }
        let dx = (i64::from(next.x) - i64::from(previous.x)).abs();
        let dy = (i64::from(next.y) - i64::from(previous.y)).abs();
        if dx > i64::from(MOVE_STEP) || dy > i64::from(MOVE_STEP) {
            return Verdict::Reject("moved too far");
        }
        if next.score < previous.score {
            return Verdict::Reject("score decreased");
        }
        if u64::from(next.score) > u64::from(previous.score) + u64::from(ITEM_VALUE) {
            return Verdict::Reject("score rose too fast");
        }
        Verdict::Accept
    }

    fn check_collect(&self, collector: Option<&Player>, echoed: Option<u64>, item: &Item) -> Verdict {
        let Some(collector) = collector else {
            return Verdict::Reject("collector has not announced");
        };
        if echoed.is_some_and(|id| id != item.id) {
            return Verdict::Reject("stale item");
        }
        let within_reach = collides(collector, item)
            || Direction::ALL.iter().any(|&dir| {
                let mut probe = collector.clone();
                probe.step(dir, MOVE_STEP);
                collides(&probe, item)
            });
        if !within_reach {
            return Verdict::Reject("item out of reach");
        }
        Verdict::Accept
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    #[default]
    Permissive,
    Strict,
}

impl PolicyKind {
    pub fn build(self) -> Box<dyn ValidationPolicy> {
        match self {
            PolicyKind::Permissive => Box::new(Permissive),
            PolicyKind::Strict => Box::new(Strict),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "permissive" => Ok(PolicyKind::Permissive),
            "strict" => Ok(PolicyKind::Strict),
            other => Err(format!("unknown policy {:?}", other)),
        }
    }
}
