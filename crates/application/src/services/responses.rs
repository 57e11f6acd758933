//! Locally built responses and the final touch applied to forwarded ones.

use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};

/// Prepares an accepted upstream response for the client: the transaction
/// ID is rewritten to the client's.
///
/// Name compression needs no flag here; messages are always compressed
/// when encoded to wire format.
pub fn finalize_response(mut response: Message, query: &Message) -> Message {
    let mut header = *response.header();
    header.set_id(query.id());
    response.set_header(header);
    response
}

/// SERVFAIL reply to `query`, echoing its ID, opcode, RD bit and question.
pub fn server_failure(query: &Message) -> Message {
    reply_with_code(query, ResponseCode::ServFail)
}

/// FORMERR reply for an inbound message that could not be decoded.
pub fn format_error(id: u16) -> Message {
    let mut response = Message::new(id, MessageType::Response, OpCode::Query);
    response.set_response_code(ResponseCode::FormErr);
    response
}

fn reply_with_code(query: &Message, code: ResponseCode) -> Message {
    let mut response = Message::new(query.id(), MessageType::Response, query.op_code());
    response.set_recursion_desired(query.recursion_desired());
    for question in query.queries() {
        response.add_query(question.clone());
    }
    response.set_response_code(code);
    response
}
