//! Message model and control vocabulary
//!
//! A message is the unit of dissemination: a short UTF-8 content string
//! qualified by group (topic), sender address, and a random 128-bit id
//! that serves as the dedup key. Control traffic reuses the same shape
//! with an empty id.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

/// Content marker carried by unicast acknowledgments
pub const ACK_CONTENT: &str = "Message received";

/// Control verb requesting the remote membership list
pub const REQUEST_PEERS: &str = "RequestPeers";

/// Control prefix announcing a membership list
pub const PEER_LIST_PREFIX: &str = "PeerList:";

/// Control prefix announcing topic interests
pub const INTERESTS_PREFIX: &str = "Interests:";

/// Default hop budget stamped on new messages
pub const DEFAULT_TTL: u32 = 10;

/// A single disseminated message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Dedup key: 32 lowercase hex chars, or empty for control traffic
    pub id: String,
    /// Topic for routed delivery; unknown topics fall back to flood
    pub group_id: String,
    /// Originator address ("host:port"); target of the unicast ack
    pub sender_id: String,
    /// Origination time, seconds since the epoch
    pub timestamp: i64,
    /// Payload text; must not contain `|`
    pub content: String,
    /// Detached signature over the content, hex; empty if unsigned
    pub signature: String,
    /// Hop budget; carried on the wire, not enforced by forwarding
    pub ttl: u32,
    /// Ack marker; derived on decode, never a wire field
    pub is_acknowledgment: bool,
}

impl Message {
    /// Create a content message with a fresh random id
    pub fn new<R: Rng>(group_id: &str, sender_id: &str, content: &str, rng: &mut R) -> Self {
        Message {
            id: generate_id(rng),
            group_id: group_id.to_string(),
            sender_id: sender_id.to_string(),
            timestamp: now_epoch(),
            content: content.to_string(),
            signature: String::new(),
            ttl: DEFAULT_TTL,
            is_acknowledgment: false,
        }
    }

    /// Create a control message; the empty id marks it as such
    pub fn control(content: impl Into<String>) -> Self {
        Message {
            id: String::new(),
            group_id: String::new(),
            sender_id: String::new(),
            timestamp: now_epoch(),
            content: content.into(),
            signature: String::new(),
            ttl: DEFAULT_TTL,
            is_acknowledgment: false,
        }
    }

    /// Create the fixed unicast acknowledgment
    pub fn acknowledgment() -> Self {
        let mut ack = Message::control(ACK_CONTENT);
        ack.is_acknowledgment = true;
        ack
    }

    /// Attach a detached hex signature (set once, pre-send)
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    /// Override the default hop budget (set once, pre-send)
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Control traffic is marked by an empty id
    #[inline]
    pub fn is_control(&self) -> bool {
        self.id.is_empty()
    }
}

/// Generate a 32-char lowercase hex dedup key (128 bits of entropy)
pub fn generate_id<R: Rng>(rng: &mut R) -> String {
    let bytes: [u8; 16] = rng.gen();
    hex::encode(bytes)
}

fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_id_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let id = generate_id(&mut rng);
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        let other = generate_id(&mut rng);
        assert_ne!(id, other);
    }

    #[test]
    fn test_content_message_is_not_control() {
        let mut rng = StdRng::seed_from_u64(7);
        let msg = Message::new("memes", "127.0.0.1:6881", "hello", &mut rng);
        assert!(!msg.is_control());
        assert!(!msg.is_acknowledgment);
        assert_eq!(msg.ttl, DEFAULT_TTL);
        assert!(msg.timestamp > 0);
    }

    #[test]
    fn test_control_message_has_empty_id() {
        let msg = Message::control(REQUEST_PEERS);
        assert!(msg.is_control());
        assert!(msg.group_id.is_empty());
        assert!(msg.sender_id.is_empty());
    }

    #[test]
    fn test_acknowledgment_marker() {
        let ack = Message::acknowledgment();
        assert!(ack.is_acknowledgment);
        assert!(ack.is_control());
        assert_eq!(ack.content, ACK_CONTENT);
    }

    #[test]
    fn test_builders_set_once() {
        let msg = Message::control("x").with_signature("ab12").with_ttl(3);
        assert_eq!(msg.signature, "ab12");
        assert_eq!(msg.ttl, 3);
    }
}
