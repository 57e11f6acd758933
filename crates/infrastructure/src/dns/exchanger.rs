//! Upstream exchanges with single-inflight deduplication.
//!
//! Overlapping exchanges that target the same nameserver and are
//! wire-identical apart from the transaction ID share one network round
//! trip: the first caller leads, later callers subscribe to its outcome and
//! get the reply back under their own ID.

use super::transport::{self, ExchangeTimeouts};
use super::wire;
use async_trait::async_trait;
use dashmap::DashMap;
use dns_retry_application::ports::UpstreamExchanger;
use dns_retry_domain::{DomainError, ProxyConfig, Transport};
use hickory_proto::op::Message;
use rustc_hash::FxBuildHasher;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

type ExchangeOutcome = Arc<Result<Message, DomainError>>;
type InflightSender = Arc<watch::Sender<Option<ExchangeOutcome>>>;
type InflightMap = DashMap<InflightKey, InflightSender, FxBuildHasher>;

/// Nameserver plus the query's wire bytes after the 2-byte transaction ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct InflightKey {
    nameserver: Arc<str>,
    body: Arc<[u8]>,
}

impl InflightKey {
    fn new(nameserver: &str, query_bytes: &[u8]) -> Self {
        Self {
            nameserver: Arc::from(nameserver),
            body: Arc::from(query_bytes.get(2..).unwrap_or_default()),
        }
    }
}

/// Clears the leader's slot even when its future is dropped mid-exchange,
/// so followers fall back to their own exchange instead of waiting forever.
struct InflightLeaderGuard {
    inflight: Arc<InflightMap>,
    key: InflightKey,
}

impl Drop for InflightLeaderGuard {
    fn drop(&mut self) {
        if let Some((_, tx)) = self.inflight.remove(&self.key) {
            let _ = tx.send(None);
        }
    }
}

/// Exchanges queries over one transport, bounded by its read and write
/// timeouts.
pub struct UpstreamClient {
    transport: Transport,
    timeouts: ExchangeTimeouts,
    inflight: Arc<InflightMap>,
}

impl UpstreamClient {
    pub fn new(transport: Transport, read_timeout: Duration, write_timeout: Duration) -> Self {
        Self {
            transport,
            timeouts: ExchangeTimeouts {
                read: read_timeout,
                write: write_timeout,
            },
            inflight: Arc::new(DashMap::with_hasher(FxBuildHasher)),
        }
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Number of exchanges currently on the wire.
    pub fn inflight_len(&self) -> usize {
        self.inflight.len()
    }

    pub async fn exchange(&self, nameserver: &str, query: &Message) -> Result<Message, DomainError> {
        let query_bytes = wire::encode_message(query)?;
        let key = InflightKey::new(nameserver, &query_bytes);

        let (is_leader, rx) = self.register_or_join_inflight(&key);
        if !is_leader {
            return self
                .exchange_as_follower(&key, &query_bytes, rx)
                .await
                .map(|response| with_id(response, query.id()));
        }

        self.exchange_as_leader(key, &query_bytes).await
    }

    fn register_or_join_inflight(
        &self,
        key: &InflightKey,
    ) -> (bool, watch::Receiver<Option<ExchangeOutcome>>) {
        match self.inflight.entry(key.clone()) {
            dashmap::Entry::Occupied(e) => {
                let rx = e.get().subscribe();
                drop(e);
                (false, rx)
            }
            dashmap::Entry::Vacant(e) => {
                let (tx, rx) = watch::channel(None::<ExchangeOutcome>);
                e.insert(Arc::new(tx));
                (true, rx)
            }
        }
    }

    async fn exchange_as_leader(
        &self,
        key: InflightKey,
        query_bytes: &[u8],
    ) -> Result<Message, DomainError> {
        let guard = InflightLeaderGuard {
            inflight: Arc::clone(&self.inflight),
            key: key.clone(),
        };

        let result = self.exchange_on_wire(&key.nameserver, query_bytes).await;

        if let Some((_, tx)) = self.inflight.remove(&key) {
            let _ = tx.send(Some(Arc::new(result.clone())));
        }

        drop(guard);
        result
    }

    async fn exchange_as_follower(
        &self,
        key: &InflightKey,
        query_bytes: &[u8],
        mut rx: watch::Receiver<Option<ExchangeOutcome>>,
    ) -> Result<Message, DomainError> {
        debug!(
            server = %key.nameserver,
            transport = %self.transport,
            "Joining in-flight exchange"
        );

        if rx.changed().await.is_ok() {
            let shared = rx.borrow().clone();
            if let Some(outcome) = shared {
                return (*outcome).clone();
            }
        }

        self.exchange_on_wire(&key.nameserver, query_bytes).await
    }

    async fn exchange_on_wire(&self, nameserver: &str, query: &[u8]) -> Result<Message, DomainError> {
        let server_addr = resolve_nameserver(nameserver).await?;
        let upstream = transport::create_transport(self.transport, server_addr);

        let response_bytes = upstream.send(query, self.timeouts).await?;

        wire::decode_message(&response_bytes).map_err(|e| {
            DomainError::InvalidDnsResponse(format!("{} from {}: {}", upstream.protocol_name(), nameserver, e))
        })
    }
}

fn with_id(mut response: Message, id: u16) -> Message {
    let mut header = *response.header();
    header.set_id(id);
    response.set_header(header);
    response
}

async fn resolve_nameserver(nameserver: &str) -> Result<SocketAddr, DomainError> {
    if let Ok(addr) = nameserver.parse::<SocketAddr>() {
        return Ok(addr);
    }

    tokio::net::lookup_host(nameserver)
        .await
        .map_err(|e| DomainError::InvalidNameserver(format!("{}: {}", nameserver, e)))?
        .next()
        .ok_or_else(|| DomainError::InvalidNameserver(format!("{}: no addresses", nameserver)))
}

/// One [`UpstreamClient`] per transport, shared by every query.
pub struct UpstreamClients {
    udp: UpstreamClient,
    tcp: UpstreamClient,
}

impl UpstreamClients {
    pub fn new(read_timeout: Duration, write_timeout: Duration) -> Self {
        Self {
            udp: UpstreamClient::new(Transport::Udp, read_timeout, write_timeout),
            tcp: UpstreamClient::new(Transport::Tcp, read_timeout, write_timeout),
        }
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::new(config.read_timeout, config.write_timeout)
    }

    pub fn client(&self, transport: Transport) -> &UpstreamClient {
        match transport {
            Transport::Udp => &self.udp,
            Transport::Tcp => &self.tcp,
        }
    }
}

#[async_trait]
impl UpstreamExchanger for UpstreamClients {
    async fn exchange(
        &self,
        nameserver: &str,
        transport: Transport,
        query: &Message,
    ) -> Result<Message, DomainError> {
        self.client(transport).exchange(nameserver, query).await
    }
}
