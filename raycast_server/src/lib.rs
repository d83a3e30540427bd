//! `raycast_server`
//!
//! Host-side systems:
//! - Entity spawning and movement
//! - Named hitbox groups refreshed every tick
//! - Console-driven raycast queries
//! - Fixed timestep loop

pub mod server;

pub use server::RaycastServer;
