use async_trait::async_trait;
use dns_retry_application::ports::UpstreamExchanger;
use dns_retry_domain::{DomainError, Transport};
use hickory_proto::op::{Message, ResponseCode};
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::sync::Mutex;

use super::{answer, reply};

/// What a scripted nameserver does on one exchange.
#[derive(Debug, Clone)]
pub enum Reply {
    Answer(Ipv4Addr),
    Code(ResponseCode),
    Unreachable,
}

/// Upstream exchanger replaying a per-nameserver script.
///
/// Each call pops the next scripted reply for the nameserver; once a script
/// runs out, its last reply repeats. Unscripted nameservers time out.
#[derive(Default)]
pub struct MockExchanger {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, Transport)>>,
}

impl MockExchanger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, nameserver: &str, replies: &[Reply]) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(nameserver.to_string(), replies.iter().cloned().collect());
        self
    }

    pub fn calls(&self) -> Vec<(String, Transport)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn nameservers_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|(ns, _)| ns).collect()
    }

    fn next_reply(&self, nameserver: &str) -> Option<Reply> {
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.get_mut(nameserver)?;
        if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        }
    }
}

#[async_trait]
impl UpstreamExchanger for MockExchanger {
    async fn exchange(
        &self,
        nameserver: &str,
        transport: Transport,
        query: &Message,
    ) -> Result<Message, DomainError> {
        self.calls
            .lock()
            .unwrap()
            .push((nameserver.to_string(), transport));

        match self.next_reply(nameserver) {
            Some(Reply::Answer(ip)) => Ok(answer(query, ip)),
            Some(Reply::Code(code)) => Ok(reply(query, code)),
            Some(Reply::Unreachable) => Err(DomainError::TransportConnectionRefused {
                server: nameserver.to_string(),
            }),
            None => Err(DomainError::TransportTimeout {
                server: nameserver.to_string(),
            }),
        }
    }
}
