//! # Domain Scan Library
//!
//! Scans every candidate name of a fixed length under one TLD for
//! registration availability.
//!
//! Candidates come from one or more generation strategies (exhaustive
//! combinations, dictionary words, repeated-character patterns, pinyin
//! syllables), are merged without duplicates and then queried one at a time
//! against the registry's check service, with a delay between queries and
//! bounded retries for rate limiting and transient failures. Available names
//! are written to disk as soon as they are found.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_scan_lib::{CandidatePlan, ScanConfig, Scanner, SilentObserver, Strategy, WhoisClient};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScanConfig::new(3, vec![Strategy::Repeats]).with_live_log("found.txt");
//!
//!     let candidates = CandidatePlan::from_config(&config)?.candidates()?;
//!     let client = WhoisClient::from_config(&config)?;
//!     let mut scanner = Scanner::new(client, &config).open_sinks(&config)?;
//!
//!     let summary = scanner.run(candidates, &mut SilentObserver).await?;
//!     println!("{} of {} available", summary.available, summary.checked);
//!     Ok(())
//! }
//! ```

// Re-export main public API types and functions
pub use candidates::{CandidatePlan, CandidateSource, Candidates};
pub use config::{
    load_env_config, load_env_config_from, parse_delay_seconds, parse_duration_string,
    ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
};
pub use error::ScanError;
pub use merge::Merger;
pub use output::ResultSink;
pub use protocols::{get_check_server, supported_tlds, AvailabilityClient, CheckServer, WhoisClient};
pub use retry::RetryPolicy;
pub use scanner::{ScanObserver, Scanner, SilentObserver};
pub use types::{
    CandidateState, Charset, CheckReport, QueryOutcome, QueryStatus, ScanConfig, ScanResult,
    ScanSummary, Strategy, DEFAULT_DICT_FILE, DEFAULT_TLD, STATUS_CODES,
};
pub use utils::{is_valid_label, qualify};

// Public modules
pub mod generate;
pub mod protocols;

pub use generate::{combination_count, LARGE_SCAN_THRESHOLD};

// Internal modules - their public items are re-exported above
mod candidates;
mod config;
mod error;
mod merge;
mod output;
mod retry;
mod scanner;
mod types;
mod utils;

pub type Result<T> = std::result::Result<T, ScanError>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
