pub mod exchanger;
pub mod listener;
pub mod server;
pub mod transport;
pub mod wire;

pub use exchanger::{UpstreamClient, UpstreamClients};
pub use listener::DnsListener;
pub use server::DnsServerHandler;
