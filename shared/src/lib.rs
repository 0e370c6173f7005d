//! Types and rules shared by the arena server and its clients.
//!
//! Anything that must agree bit-for-bit between the two sides (world size,
//! box sizes, the collision test, ranking) lives here.

pub mod config;
pub mod geometry;
pub mod protocol;
pub mod rank;

pub use config::WorldBounds;
pub use protocol::{ClientMsg, InitMsg, Item, Player, ServerMsg};
pub use rank::{rank, Rank};
