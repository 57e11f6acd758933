#![allow(dead_code)]

mod mock_upstream;

pub use mock_upstream::{unused_addr, MockUpstream};

use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use std::net::Ipv4Addr;
use std::str::FromStr;

pub fn query(domain: &str) -> Message {
    let mut message = Message::new(fastrand::u16(..), MessageType::Query, OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(Query::query(Name::from_str(domain).unwrap(), RecordType::A));
    message
}

pub fn reply(query: &Message, code: ResponseCode) -> Message {
    let mut response = Message::new(query.id(), MessageType::Response, OpCode::Query);
    response.set_recursion_desired(query.recursion_desired());
    response.set_recursion_available(true);
    for question in query.queries() {
        response.add_query(question.clone());
    }
    response.set_response_code(code);
    response
}

pub fn answer(query: &Message, ip: Ipv4Addr) -> Message {
    let mut response = reply(query, ResponseCode::NoError);
    let name = query.queries()[0].name().clone();
    response.add_answer(Record::from_rdata(name, 60, RData::A(A(ip))));
    response
}

pub fn first_a(response: &Message) -> Option<Ipv4Addr> {
    response.answers().iter().find_map(|r| match r.data() {
        RData::A(a) => Some(a.0),
        _ => None,
    })
}
