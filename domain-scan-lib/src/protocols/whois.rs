//! Domain check protocol over TCP.
//!
//! The Swiss registry runs a line-based check service next to its WHOIS
//! server. A query is the fully qualified domain followed by CRLF; the first
//! line of the answer is `<code>: <message>`, for example
//! `1: sample.li is available` or `-95: Access control limit exceeded`.
//! The code is all the scanner needs.

use super::registry::{get_check_server, CheckServer};
use super::AvailabilityClient;
use crate::error::ScanError;
use crate::types::ScanConfig;
use crate::utils::qualify;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// Responses longer than this are cut off; the status line comes first.
const MAX_RESPONSE_BYTES: usize = 8192;

const READ_CHUNK: usize = 4096;

/// Client for the `<code>: <message>` check service.
#[derive(Debug, Clone)]
pub struct WhoisClient {
    server: CheckServer,
    tld: String,
    /// Deadline for connecting and for each read
    timeout: Duration,
}

impl WhoisClient {
    /// Create a client querying `server` for bodies under `tld`.
    pub fn new<T: Into<String>>(server: CheckServer, tld: T) -> Self {
        Self {
            server,
            tld: tld.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a client from the scan configuration.
    ///
    /// An explicit server wins; otherwise the TLD must have a built-in
    /// check server.
    pub fn from_config(config: &ScanConfig) -> Result<Self, ScanError> {
        let server = match &config.server {
            Some(address) => address.parse::<CheckServer>()?,
            None => get_check_server(&config.tld).ok_or_else(|| {
                ScanError::config(format!(
                    "No check server known for '.{}'. Pass --server HOST:PORT",
                    config.tld
                ))
            })?,
        };

        let tld = config.tld.trim().trim_start_matches('.');
        Ok(Self::new(server, tld).with_timeout(config.query_timeout))
    }

    pub fn server(&self) -> &CheckServer {
        &self.server
    }

    /// Send one query and return the whole (trimmed) response text.
    pub async fn query_raw(&self, candidate: &str) -> Result<String, ScanError> {
        let domain = qualify(candidate, &self.tld);

        let mut stream = match timeout(
            self.timeout,
            TcpStream::connect((self.server.host.as_str(), self.server.port)),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(ScanError::network_with_source(
                    format!("Cannot connect to {}", self.server),
                    e.to_string(),
                ))
            }
            Err(_) => {
                return Err(ScanError::timeout(
                    format!("connect to {}", self.server),
                    self.timeout,
                ))
            }
        };

        let request = format!("{}\r\n", domain);
        match timeout(self.timeout, stream.write_all(request.as_bytes())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(ScanError::network_with_source(
                    format!("Cannot send query for {}", domain),
                    e.to_string(),
                ))
            }
            Err(_) => return Err(ScanError::timeout(format!("send {}", domain), self.timeout)),
        }

        let mut response = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match timeout(self.timeout, stream.read(&mut chunk)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => {
                    response.extend_from_slice(&chunk[..n]);
                    if is_complete(&response) {
                        break;
                    }
                }
                Ok(Err(e)) => {
                    return Err(ScanError::network_with_source(
                        format!("Error reading answer for {}", domain),
                        e.to_string(),
                    ))
                }
                // A stalled server that already sent something has answered
                Err(_) if !response.is_empty() => break,
                Err(_) => {
                    return Err(ScanError::timeout(
                        format!("read answer for {}", domain),
                        self.timeout,
                    ))
                }
            }
        }

        let _ = stream.shutdown().await;

        let text = String::from_utf8_lossy(&response).trim().to_string();
        trace!(domain = %domain, response = %text, "Check server answered");
        Ok(text)
    }
}

impl AvailabilityClient for WhoisClient {
    async fn query(&self, candidate: &str) -> Result<i32, ScanError> {
        let response = self.query_raw(candidate).await?;
        parse_status_line(&response)
    }
}

fn is_complete(response: &[u8]) -> bool {
    response.len() > MAX_RESPONSE_BYTES
        || response.windows(2).any(|w| w == b"\n\n")
        || response.windows(4).any(|w| w == b"\r\n\r\n")
}

/// Extract the status code from a check-service response.
///
/// An empty response counts as a network failure (the server hung up
/// without answering); a first line without a `<int>:` prefix is a parse
/// error.
pub fn parse_status_line(response: &str) -> Result<i32, ScanError> {
    let response = response.trim();
    if response.is_empty() {
        return Err(ScanError::network("Empty response from check server"));
    }

    let first_line = response.lines().next().unwrap_or_default().trim();
    let (code, _) = first_line.split_once(':').ok_or_else(|| {
        ScanError::parse(
            "No status code in response (missing ':')",
            Some(response.to_string()),
        )
    })?;

    code.trim().parse::<i32>().map_err(|_| {
        ScanError::parse(
            format!("Status code '{}' is not an integer", code.trim()),
            Some(response.to_string()),
        )
    })
}
