//! Host resolver configuration (`resolv.conf(5)`).
//!
//! Only `nameserver` directives are read; every other directive is ignored.

use std::io;
use std::net::IpAddr;
use std::path::Path;

use super::errors::ConfigError;

pub const DEFAULT_RESOLV_CONF: &str = "/etc/resolv.conf";

const DEFAULT_NAMESERVER_PORT: u16 = 53;

/// Reads the nameserver list from a resolver file.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn read_nameservers(path: &Path) -> Result<Option<Vec<String>>, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ConfigError::ResolverConfig(
                path.display().to_string(),
                e.to_string(),
            ))
        }
    };

    parse_nameservers(&contents)
        .map(Some)
        .map_err(|reason| ConfigError::ResolverConfig(path.display().to_string(), reason))
}

/// Extracts `host:port` entries, in file order, from resolver file contents.
pub fn parse_nameservers(contents: &str) -> Result<Vec<String>, String> {
    let mut servers = Vec::new();

    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        let mut fields = line.split_ascii_whitespace();
        if fields.next() != Some("nameserver") {
            continue;
        }
        let Some(value) = fields.next() else {
            continue;
        };

        // Link-local IPv6 entries may carry a zone suffix (fe80::1%eth0).
        let address = value.split('%').next().unwrap_or(value);
        let ip: IpAddr = address.parse().map_err(|_| {
            format!(
                "line {}: invalid nameserver address '{}'",
                index + 1,
                value
            )
        })?;

        servers.push(join_host_port(ip, value, DEFAULT_NAMESERVER_PORT));
    }

    Ok(servers)
}

fn join_host_port(ip: IpAddr, raw: &str, port: u16) -> String {
    match ip {
        IpAddr::V4(_) => format!("{}:{}", raw, port),
        IpAddr::V6(_) => format!("[{}]:{}", raw, port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nameservers_in_order() {
        let contents = "\
# generated by NetworkManager
search corp.example
nameserver 10.1.2.254
nameserver 10.1.3.254
options ndots:2 timeout:1
";
        assert_eq!(
            parse_nameservers(contents).unwrap(),
            vec!["10.1.2.254:53".to_string(), "10.1.3.254:53".to_string()]
        );
    }

    #[test]
    fn test_parse_nameservers_ipv6_is_bracketed() {
        let contents = "nameserver 2001:4860:4860::8888\nnameserver fe80::1%eth0\n";
        assert_eq!(
            parse_nameservers(contents).unwrap(),
            vec![
                "[2001:4860:4860::8888]:53".to_string(),
                "[fe80::1%eth0]:53".to_string()
            ]
        );
    }

    #[test]
    fn test_parse_nameservers_skips_comments_and_bare_directive() {
        let contents = "; nameserver 9.9.9.9\n#nameserver 1.1.1.1\nnameserver\n  nameserver 8.8.8.8  \n";
        assert_eq!(
            parse_nameservers(contents).unwrap(),
            vec!["8.8.8.8:53".to_string()]
        );
    }

    #[test]
    fn test_parse_nameservers_rejects_hostnames() {
        let err = parse_nameservers("nameserver 8.8.8.8\nnameserver dns.example\n").unwrap_err();
        assert!(err.contains("line 2"));
        assert!(err.contains("dns.example"));
    }

    #[test]
    fn test_empty_file_yields_no_servers() {
        assert!(parse_nameservers("").unwrap().is_empty());
    }
}
