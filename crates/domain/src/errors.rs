use std::io;
use thiserror::Error;

/// Failures of a single upstream exchange.
///
/// Every variant is a transport-level failure from the forwarding engine's
/// point of view: the nameserver is abandoned and the next one is tried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Transport timeout exchanging with {server}")]
    TransportTimeout { server: String },

    #[error("Transport connection refused by {server}")]
    TransportConnectionRefused { server: String },

    #[error("Transport connection reset by {server}")]
    TransportConnectionReset { server: String },

    #[error("Transport I/O error with {server}: {reason}")]
    TransportIo { server: String, reason: String },

    #[error("Invalid nameserver address: {0}")]
    InvalidNameserver(String),

    #[error("Invalid DNS response: {0}")]
    InvalidDnsResponse(String),

    #[error("Invalid DNS message: {0}")]
    InvalidDnsMessage(String),
}

impl DomainError {
    /// Classifies an I/O failure that happened while talking to `server`.
    pub fn from_io(server: impl Into<String>, err: &io::Error) -> Self {
        let server = server.into();
        match err.kind() {
            io::ErrorKind::TimedOut => DomainError::TransportTimeout { server },
            io::ErrorKind::ConnectionRefused => DomainError::TransportConnectionRefused { server },
            io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                DomainError::TransportConnectionReset { server }
            }
            _ => DomainError::TransportIo {
                server,
                reason: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_classifies_kinds() {
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert_eq!(
            DomainError::from_io("10.0.0.1:53", &refused),
            DomainError::TransportConnectionRefused {
                server: "10.0.0.1:53".to_string()
            }
        );

        let timed_out = io::Error::from(io::ErrorKind::TimedOut);
        assert!(matches!(
            DomainError::from_io("10.0.0.1:53", &timed_out),
            DomainError::TransportTimeout { .. }
        ));

        let other = io::Error::other("network unreachable");
        match DomainError::from_io("10.0.0.1:53", &other) {
            DomainError::TransportIo { server, reason } => {
                assert_eq!(server, "10.0.0.1:53");
                assert!(reason.contains("network unreachable"));
            }
            e => panic!("unexpected variant: {e:?}"),
        }
    }
}
