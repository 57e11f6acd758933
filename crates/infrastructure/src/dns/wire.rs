//! Wire-format encoding and decoding of DNS messages.

use dns_retry_domain::DomainError;
use hickory_proto::op::Message;
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};

/// Size of the fixed DNS message header.
pub const HEADER_LEN: usize = 12;

/// Serializes a message, compressing repeated names.
pub fn encode_message(message: &Message) -> Result<Vec<u8>, DomainError> {
    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);

    message.emit(&mut encoder).map_err(|e| {
        DomainError::InvalidDnsMessage(format!("Failed to serialize DNS message: {}", e))
    })?;

    Ok(buf)
}

pub fn decode_message(bytes: &[u8]) -> Result<Message, DomainError> {
    Message::from_vec(bytes)
        .map_err(|e| DomainError::InvalidDnsMessage(format!("Failed to parse DNS message: {}", e)))
}

/// Transaction ID of a raw message whose full header is present.
pub fn peek_id(bytes: &[u8]) -> Option<u16> {
    if bytes.len() < HEADER_LEN {
        return None;
    }
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}
