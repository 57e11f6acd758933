//! dns-retry infrastructure: upstream transports and the DNS listener.
pub mod dns;
