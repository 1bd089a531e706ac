//! Protocol implementations for availability queries.
//!
//! The scanner only depends on [`AvailabilityClient`]; the TCP check
//! protocol spoken by the Swiss registry lives in [`whois`], and the
//! TLD-to-server table in [`registry`].

use crate::error::ScanError;

/// Line-based check protocol over TCP
pub mod whois;

/// Check server mappings per TLD
pub mod registry;

pub use registry::{get_check_server, supported_tlds, CheckServer};
pub use whois::{parse_status_line, WhoisClient};

/// Something that can ask a registry whether one domain body is taken.
///
/// Implementations return the raw status code from the response; the
/// caller classifies it. A transport failure is an `Err`, a well-formed
/// answer with an unexpected code is still `Ok`.
#[allow(async_fn_in_trait)]
pub trait AvailabilityClient {
    async fn query(&self, candidate: &str) -> Result<i32, ScanError>;
}

impl<T: AvailabilityClient> AvailabilityClient for &T {
    async fn query(&self, candidate: &str) -> Result<i32, ScanError> {
        (**self).query(candidate).await
    }
}
