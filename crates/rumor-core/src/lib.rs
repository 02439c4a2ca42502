//! Rumor Core - Fundamental types for the dissemination overlay
//!
//! This crate defines the types used throughout the rumor protocol:
//! - The Message model and control-message vocabulary
//! - Peer registry handles (PeerId)
//! - The error taxonomy shared by every layer

pub mod error;
pub mod message;
pub mod peer;

pub use error::*;
pub use message::*;
pub use peer::*;
