//! Rumor Crypto - Signing collaborator and admission primitives
//!
//! Nothing here sits on the dissemination path: the engine forwards
//! unsigned and unverified. Hosts use this crate at the edges to sign
//! content before origination, verify at delivery, and optionally
//! demand proof-of-work before admitting a message.

pub mod identity;
pub mod pow;

pub use identity::*;
pub use pow::*;
