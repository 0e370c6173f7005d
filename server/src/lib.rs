//! Arena server library.
//!
//! This module exposes the server components for use in tests and binaries.

pub mod config;
pub mod coordinator;
pub mod game_loop;
pub mod http;
pub mod policy;
pub mod registry;
pub mod spawner;
pub mod ws;
