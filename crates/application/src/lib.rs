//! dns-retry application layer: the forwarding and retry policy, expressed
//! over the [`ports::UpstreamExchanger`] port.
pub mod ports;
pub mod services;
pub mod use_cases;
