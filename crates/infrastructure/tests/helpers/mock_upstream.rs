use hickory_proto::op::Message;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::task::JoinHandle;

type Behavior = Arc<dyn Fn(&Message) -> Option<Message> + Send + Sync>;

/// Loopback nameserver answering over UDP and TCP on one port.
///
/// `behavior` builds the reply for each decoded query; `None` means stay
/// silent. Every received query bumps the hit counter before the optional
/// delay.
pub struct MockUpstream {
    addr: SocketAddr,
    udp_hits: Arc<AtomicUsize>,
    tcp_hits: Arc<AtomicUsize>,
    tasks: Vec<JoinHandle<()>>,
}

impl MockUpstream {
    pub async fn start<F>(behavior: F) -> Self
    where
        F: Fn(&Message) -> Option<Message> + Send + Sync + 'static,
    {
        Self::with_delay(Duration::ZERO, behavior).await
    }

    pub async fn with_delay<F>(delay: Duration, behavior: F) -> Self
    where
        F: Fn(&Message) -> Option<Message> + Send + Sync + 'static,
    {
        let behavior: Behavior = Arc::new(behavior);
        let udp_hits = Arc::new(AtomicUsize::new(0));
        let tcp_hits = Arc::new(AtomicUsize::new(0));

        let udp = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let addr = udp.local_addr().unwrap();
        let tcp = TcpListener::bind(addr).await.unwrap();

        let udp_task = tokio::spawn(run_udp(udp, Arc::clone(&behavior), Arc::clone(&udp_hits), delay));
        let tcp_task = tokio::spawn(run_tcp(tcp, behavior, Arc::clone(&tcp_hits), delay));

        Self {
            addr,
            udp_hits,
            tcp_hits,
            tasks: vec![udp_task, tcp_task],
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn nameserver(&self) -> String {
        self.addr.to_string()
    }

    pub fn hits(&self) -> usize {
        self.udp_hits() + self.tcp_hits()
    }

    pub fn udp_hits(&self) -> usize {
        self.udp_hits.load(Ordering::SeqCst)
    }

    pub fn tcp_hits(&self) -> usize {
        self.tcp_hits.load(Ordering::SeqCst)
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// A loopback address nothing is listening on.
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

async fn run_udp(socket: Arc<UdpSocket>, behavior: Behavior, hits: Arc<AtomicUsize>, delay: Duration) {
    let mut buf = vec![0u8; 4096];
    loop {
        let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
            return;
        };
        hits.fetch_add(1, Ordering::SeqCst);

        let Ok(query) = Message::from_vec(&buf[..len]) else {
            continue;
        };
        let socket = Arc::clone(&socket);
        let behavior = Arc::clone(&behavior);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(response) = behavior(&query) {
                let _ = socket.send_to(&response.to_vec().unwrap(), peer).await;
            }
        });
    }
}

async fn run_tcp(listener: TcpListener, behavior: Behavior, hits: Arc<AtomicUsize>, delay: Duration) {
    loop {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        let behavior = Arc::clone(&behavior);
        let hits = Arc::clone(&hits);
        tokio::spawn(serve_tcp(stream, behavior, hits, delay));
    }
}

async fn serve_tcp(mut stream: TcpStream, behavior: Behavior, hits: Arc<AtomicUsize>, delay: Duration) {
    loop {
        let mut len_buf = [0u8; 2];
        if stream.read_exact(&mut len_buf).await.is_err() {
            return;
        }
        let mut message = vec![0u8; u16::from_be_bytes(len_buf) as usize];
        if stream.read_exact(&mut message).await.is_err() {
            return;
        }
        hits.fetch_add(1, Ordering::SeqCst);

        let Ok(query) = Message::from_vec(&message) else {
            return;
        };
        tokio::time::sleep(delay).await;
        let Some(response) = behavior(&query) else {
            continue;
        };
        let bytes = response.to_vec().unwrap();
        let _ = stream.write_all(&(bytes.len() as u16).to_be_bytes()).await;
        let _ = stream.write_all(&bytes).await;
    }
}
