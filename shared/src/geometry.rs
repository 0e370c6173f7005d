//! Box collision and keyboard movement, shared by server checks and clients.

use crate::config::{ITEM_SIZE, PLAYER_SIZE};
use crate::protocol::{Item, Player};

/// Half-open AABB overlap between a player's 30x30 box and an item's 20x20
/// box. Boxes that only touch along an edge do not collide.
pub fn collides(player: &Player, item: &Item) -> bool {
    // Widen so huge client-supplied coordinates cannot overflow.
    let (px, py) = (i64::from(player.x), i64::from(player.y));
    let (ix, iy) = (i64::from(item.x), i64::from(item.y));
    let (ps, is) = (i64::from(PLAYER_SIZE), i64::from(ITEM_SIZE));

    px < ix + is && px + ps > ix && py < iy + is && py + ps > iy
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Keyboard mapping used by the browser client (WASD and arrows).
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "w" | "ArrowUp" => Some(Direction::Up),
            "s" | "ArrowDown" => Some(Direction::Down),
            "a" | "ArrowLeft" => Some(Direction::Left),
            "d" | "ArrowRight" => Some(Direction::Right),
            _ => None,
        }
    }

    /// Unit offset in screen coordinates (y grows downwards).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

impl Player {
    /// Move by `speed` units. No clamping to the world.
    pub fn step(&mut self, dir: Direction, speed: i32) {
        let (dx, dy) = dir.delta();
        self.x = self.x.saturating_add(dx.saturating_mul(speed));
        self.y = self.y.saturating_add(dy.saturating_mul(speed));
    }

    pub fn collides_with(&self, item: &Item) -> bool {
        collides(self, item)
    }
}
