//! Inbound UDP and TCP listeners sharing one bind address.

use super::server::DnsServerHandler;
use super::transport::tcp::{read_with_length_prefix, send_with_length_prefix};
use dns_retry_domain::Transport;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Largest inbound datagram accepted.
const MAX_UDP_MESSAGE_SIZE: usize = 4096;

/// How long an inbound TCP connection may sit idle between queries.
pub const TCP_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct DnsListener {
    udp: Arc<UdpSocket>,
    tcp: TcpListener,
    handler: Arc<DnsServerHandler>,
}

impl DnsListener {
    /// Binds UDP first, then TCP on the same local port. An unspecified
    /// port (`:0`) is resolved by the UDP bind.
    pub async fn bind(bind_address: &str, handler: DnsServerHandler) -> io::Result<Self> {
        let socket_addr = tokio::net::lookup_host(bind_address)
            .await?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("bind address {} resolved to nothing", bind_address),
                )
            })?;

        let udp = create_udp_socket(socket_addr)?;
        let tcp_addr = SocketAddr::new(socket_addr.ip(), udp.local_addr()?.port());
        let tcp = create_tcp_listener(tcp_addr)?;

        Ok(Self {
            udp: Arc::new(udp),
            tcp,
            handler: Arc::new(handler),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.udp.local_addr()
    }

    /// Serves until either listener fails.
    pub async fn serve(self) -> io::Result<()> {
        let local_addr = self.local_addr()?;
        info!(bind_address = %local_addr, "DNS listener ready (UDP + TCP)");

        let mut join_set: JoinSet<io::Result<()>> = JoinSet::new();
        join_set.spawn(run_udp_loop(self.udp, Arc::clone(&self.handler)));
        join_set.spawn(run_tcp_accept_loop(self.tcp, self.handler));

        let outcome = match join_set.join_next().await {
            Some(Ok(Ok(()))) | None => Err(io::Error::other("DNS listener stopped")),
            Some(Ok(Err(e))) => Err(e),
            Some(Err(e)) => Err(io::Error::other(e)),
        };

        join_set.shutdown().await;
        outcome
    }
}

async fn run_udp_loop(socket: Arc<UdpSocket>, handler: Arc<DnsServerHandler>) -> io::Result<()> {
    let mut recv_buf = vec![0u8; MAX_UDP_MESSAGE_SIZE];

    loop {
        let (n, from) = match socket.recv_from(&mut recv_buf).await {
            Ok(received) => received,
            Err(e) if is_transient(&e) => continue,
            Err(e) => {
                error!(error = %e, "UDP recv error");
                return Err(e);
            }
        };

        let query: Arc<[u8]> = Arc::from(&recv_buf[..n]);
        let socket = Arc::clone(&socket);
        let handler = Arc::clone(&handler);
        tokio::spawn(async move {
            if let Some(response) = handler.handle_raw(&query, Transport::Udp, from).await {
                if let Err(e) = socket.send_to(&response, from).await {
                    warn!(client = %from, error = %e, "Failed to send UDP response");
                }
            }
        });
    }
}

async fn run_tcp_accept_loop(listener: TcpListener, handler: Arc<DnsServerHandler>) -> io::Result<()> {
    loop {
        let (stream, from) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) if is_transient(&e) || e.kind() == io::ErrorKind::ConnectionAborted => continue,
            Err(e) => {
                error!(error = %e, "TCP accept error");
                return Err(e);
            }
        };

        let handler = Arc::clone(&handler);
        tokio::spawn(async move {
            if let Err(e) = serve_tcp_connection(stream, from, &handler).await {
                debug!(client = %from, error = %e, "TCP connection closed with error");
            }
        });
    }
}

/// Answers length-prefixed queries one after another until the client
/// closes the connection or stays idle past [`TCP_IDLE_TIMEOUT`].
async fn serve_tcp_connection(
    mut stream: TcpStream,
    from: SocketAddr,
    handler: &DnsServerHandler,
) -> io::Result<()> {
    loop {
        let query = match tokio::time::timeout(TCP_IDLE_TIMEOUT, read_with_length_prefix(&mut stream)).await {
            Ok(Ok(query)) => query,
            Ok(Err(e)) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                debug!(client = %from, "TCP connection idle, closing");
                return Ok(());
            }
        };

        match handler.handle_raw(&query, Transport::Tcp, from).await {
            Some(response) => send_with_length_prefix(&mut stream, &response).await?,
            None => return Ok(()),
        }
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::ConnectionReset | io::ErrorKind::WouldBlock
    )
}

fn socket_domain(socket_addr: SocketAddr) -> Domain {
    if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    }
}

fn create_udp_socket(socket_addr: SocketAddr) -> io::Result<UdpSocket> {
    let socket = Socket::new(socket_domain(socket_addr), Type::DGRAM, Some(Protocol::UDP))?;
    socket.bind(&socket_addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket)
}

fn create_tcp_listener(socket_addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = Socket::new(socket_domain(socket_addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
