//! Canonical text envelope for messages
//!
//! A message travels as UTF-8 text, seven fields joined by `|` in fixed
//! order: `id|group|sender|timestamp|content|signature|ttl`. One message
//! is wrapped into exactly one packet; fragmentation does not exist at
//! this layer, so callers keep messages comfortably under the payload
//! ceiling.

use rumor_core::{Message, RumorError, RumorResult, ACK_CONTENT};

/// Number of `|`-separated fields in the envelope
pub const FIELD_COUNT: usize = 7;

/// Encode a message into a packet payload
///
/// Field values must not contain `|`; the delimiter is not escaped.
pub fn encode_message(msg: &Message) -> Vec<u8> {
    format!(
        "{}|{}|{}|{}|{}|{}|{}",
        msg.id, msg.group_id, msg.sender_id, msg.timestamp, msg.content, msg.signature, msg.ttl
    )
    .into_bytes()
}

/// Decode a packet payload into a message
///
/// Fewer than seven fields is a parse error; trailing extras are
/// tolerated. The ack flag is not a wire field: it is re-derived from
/// the empty id plus the fixed ack marker.
pub fn decode_message(payload: &[u8]) -> RumorResult<Message> {
    let text = std::str::from_utf8(payload)?;
    let fields: Vec<&str> = text.split('|').collect();
    if fields.len() < FIELD_COUNT {
        return Err(RumorError::FieldCount {
            expected: FIELD_COUNT,
            actual: fields.len(),
        });
    }

    let timestamp = fields[3].parse::<i64>().map_err(|_| RumorError::BadNumber {
        field: "timestamp",
        value: fields[3].to_string(),
    })?;
    let ttl = fields[6].parse::<u32>().map_err(|_| RumorError::BadNumber {
        field: "ttl",
        value: fields[6].to_string(),
    })?;

    let id = fields[0].to_string();
    let content = fields[4].to_string();
    let is_acknowledgment = id.is_empty() && content == ACK_CONTENT;

    Ok(Message {
        id,
        group_id: fields[1].to_string(),
        sender_id: fields[2].to_string(),
        timestamp,
        content,
        signature: fields[5].to_string(),
        ttl,
        is_acknowledgment,
    })
}
