//! Check server mappings.
//!
//! Maps TLDs to the host and port of the registry's availability check
//! service. Only registries speaking the `<code>: <text>` line protocol
//! are listed; anything else needs an explicit `--server`.

use crate::error::ScanError;
use std::fmt;
use std::str::FromStr;

/// Port of the check service when none is given.
pub const DEFAULT_CHECK_PORT: u16 = 4343;

/// Address of a check server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckServer {
    pub host: String,
    pub port: u16,
}

impl CheckServer {
    pub fn new<H: Into<String>>(host: H, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl FromStr for CheckServer {
    type Err = ScanError;

    /// Parse `host` or `host:port`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ScanError::config("Check server address cannot be empty"));
        }

        match s.rsplit_once(':') {
            Some((host, port)) => {
                if host.is_empty() {
                    return Err(ScanError::config(format!(
                        "Invalid check server '{}': missing host",
                        s
                    )));
                }
                let port = port.parse::<u16>().map_err(|_| {
                    ScanError::config(format!("Invalid check server '{}': bad port", s))
                })?;
                Ok(Self::new(host, port))
            }
            None => Ok(Self::new(s, DEFAULT_CHECK_PORT)),
        }
    }
}

impl fmt::Display for CheckServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

const CHECK_SERVERS: &[(&str, &str, u16)] = &[
    ("li", "whois.nic.ch", DEFAULT_CHECK_PORT), // Liechtenstein
    ("ch", "whois.nic.ch", DEFAULT_CHECK_PORT), // Switzerland
];

/// Look up the check server for a TLD (case-insensitive, leading dot allowed).
pub fn get_check_server(tld: &str) -> Option<CheckServer> {
    let tld = tld.trim().trim_start_matches('.').to_lowercase();
    CHECK_SERVERS
        .iter()
        .find(|(known, _, _)| *known == tld)
        .map(|(_, host, port)| CheckServer::new(*host, *port))
}

/// TLDs with a built-in check server, sorted.
pub fn supported_tlds() -> Vec<&'static str> {
    let mut tlds: Vec<&'static str> = CHECK_SERVERS.iter().map(|(tld, _, _)| *tld).collect();
    tlds.sort_unstable();
    tlds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_servers() {
        let server = get_check_server("li").unwrap();
        assert_eq!(server.host, "whois.nic.ch");
        assert_eq!(server.port, 4343);
        assert_eq!(get_check_server(".CH"), Some(server));
        assert_eq!(get_check_server("com"), None);
    }

    #[test]
    fn test_supported_tlds() {
        assert_eq!(supported_tlds(), vec!["ch", "li"]);
    }

    #[test]
    fn test_parse_server() {
        let server: CheckServer = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(server, CheckServer::new("127.0.0.1", 5000));
        assert_eq!(server.to_string(), "127.0.0.1:5000");

        let server: CheckServer = "whois.example".parse().unwrap();
        assert_eq!(server.port, DEFAULT_CHECK_PORT);

        assert!("".parse::<CheckServer>().is_err());
        assert!(":4343".parse::<CheckServer>().is_err());
        assert!("host:notaport".parse::<CheckServer>().is_err());
        assert!("host:70000".parse::<CheckServer>().is_err());
    }
}
