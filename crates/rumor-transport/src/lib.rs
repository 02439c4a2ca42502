//! Rumor Transport Layer - TCP peer links
//!
//! This crate provides:
//! - Outbound and inbound peer links over TCP
//! - Frame-at-a-time reads through the stream resynchronizer
//! - A listener task surfacing accepted connections

pub mod link;
pub mod listener;

pub use link::*;
pub use listener::spawn_listener;
