//! Rumor Runtime - the dissemination engine
//!
//! This crate provides:
//! - The engine actor owning membership, dedup, and routing state
//! - A cloneable handle for origination, bootstrap, and stats
//! - The peer registry mapping handles to live links

pub mod config;
pub mod engine;
pub mod registry;

pub use config::EngineConfig;
pub use engine::{Engine, EngineEvent, EngineEventReceiver, EngineHandle, EngineStats};
pub use registry::{PeerEntry, PeerRegistry};
