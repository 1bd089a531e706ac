//! Core data types for domain availability scanning.
//!
//! This module defines the scan configuration, the character sets and
//! strategies candidates are generated from, and the per-candidate and
//! per-run result types.

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default word list used by the `dict` strategy.
pub const DEFAULT_DICT_FILE: &str = "/usr/share/dict/words";

/// Default top-level domain scanned.
pub const DEFAULT_TLD: &str = "li";

/// Character set a candidate's characters are drawn from.
///
/// The order of [`Charset::chars`] is the digit order used by exhaustive
/// generation: digits, then letters, then hyphen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Charset {
    Letters,
    Digits,
    #[default]
    Alnum,
    LettersHyphen,
    DigitsHyphen,
    AlnumHyphen,
}

impl Charset {
    /// All accepted names, in `--chars` order.
    pub const NAMES: [&'static str; 6] = [
        "letters",
        "digits",
        "alnum",
        "letters-hyphen",
        "digits-hyphen",
        "alnum-hyphen",
    ];

    /// The ordered characters of this set.
    pub fn chars(&self) -> Vec<char> {
        let digits = '0'..='9';
        let letters = 'a'..='z';
        let mut chars: Vec<char> = match self {
            Charset::Letters | Charset::LettersHyphen => letters.collect(),
            Charset::Digits | Charset::DigitsHyphen => digits.collect(),
            Charset::Alnum | Charset::AlnumHyphen => digits.chain(letters).collect(),
        };
        if self.allows_hyphen() {
            chars.push('-');
        }
        chars
    }

    pub fn allows_hyphen(&self) -> bool {
        matches!(
            self,
            Charset::LettersHyphen | Charset::DigitsHyphen | Charset::AlnumHyphen
        )
    }

    /// Whether `c` belongs to this set (exact, no case folding).
    pub fn contains(&self, c: char) -> bool {
        match c {
            '0'..='9' => !matches!(self, Charset::Letters | Charset::LettersHyphen),
            'a'..='z' => !matches!(self, Charset::Digits | Charset::DigitsHyphen),
            '-' => self.allows_hyphen(),
            _ => false,
        }
    }
}

impl FromStr for Charset {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "letters" => Ok(Charset::Letters),
            "digits" => Ok(Charset::Digits),
            "alnum" => Ok(Charset::Alnum),
            "letters-hyphen" => Ok(Charset::LettersHyphen),
            "digits-hyphen" => Ok(Charset::DigitsHyphen),
            "alnum-hyphen" => Ok(Charset::AlnumHyphen),
            other => Err(ScanError::config(format!(
                "Unknown character set '{}'. Use one of: {}",
                other,
                Charset::NAMES.join(", ")
            ))),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Charset::Letters => "letters",
            Charset::Digits => "digits",
            Charset::Alnum => "alnum",
            Charset::LettersHyphen => "letters-hyphen",
            Charset::DigitsHyphen => "digits-hyphen",
            Charset::AlnumHyphen => "alnum-hyphen",
        };
        write!(f, "{}", name)
    }
}

/// Candidate generation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Every string of the configured length over the charset
    All,
    /// Words from a dictionary file
    Dict,
    /// Strings containing a run of repeated characters
    Repeats,
    /// Syllables from a pinyin dictionary file
    Pinyin,
}

impl Strategy {
    pub const NAMES: [&'static str; 4] = ["all", "dict", "repeats", "pinyin"];
}

impl FromStr for Strategy {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Strategy::All),
            "dict" => Ok(Strategy::Dict),
            "repeats" => Ok(Strategy::Repeats),
            "pinyin" => Ok(Strategy::Pinyin),
            other => Err(ScanError::config(format!(
                "Unknown method '{}'. Use one of: {}",
                other,
                Strategy::NAMES.join(", ")
            ))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::All => write!(f, "all"),
            Strategy::Dict => write!(f, "dict"),
            Strategy::Repeats => write!(f, "repeats"),
            Strategy::Pinyin => write!(f, "pinyin"),
        }
    }
}

/// Configuration for one scan run.
///
/// Built once at startup (usually by merging CLI flags, environment and
/// config files) and validated with [`ScanConfig::validate`] before any
/// generator is built or file is opened.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Length of the domain body (without TLD)
    pub length: usize,

    /// Characters candidates are drawn from
    pub charset: Charset,

    /// Selected strategies, in the order their output is merged
    pub strategies: Vec<Strategy>,

    /// Minimum run length for the `repeats` strategy (>= 2)
    pub min_repeats: usize,

    /// Pause between successive queries, also used between retries
    pub delay: Duration,

    /// Retries after the first attempt for transient failures
    pub max_retries: u32,

    /// Pause longer after a candidate fails on rate limiting (5x delay)
    /// or server errors (2x delay)
    pub cooldown: bool,

    /// Report every candidate, not just notable ones
    pub verbose: bool,

    /// Word list for the `dict` strategy
    pub dict_file: Option<PathBuf>,

    /// Syllable list for the `pinyin` strategy
    pub pinyin_dict_file: Option<PathBuf>,

    /// File receiving each available body as soon as it is found
    pub live_log: Option<PathBuf>,

    /// File receiving each available fully qualified domain
    pub output: Option<PathBuf>,

    /// Top-level domain appended to every body (without leading dot)
    pub tld: String,

    /// Deadline for a single query (connect + read)
    pub query_timeout: Duration,

    /// Explicit `host:port` of the check server, overriding the registry
    pub server: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            length: 0,
            charset: Charset::default(),
            strategies: Vec::new(),
            min_repeats: 2,
            delay: Duration::from_secs(1),
            max_retries: 2,
            cooldown: false,
            verbose: false,
            dict_file: Some(PathBuf::from(DEFAULT_DICT_FILE)),
            pinyin_dict_file: None,
            live_log: None,
            output: None,
            tld: DEFAULT_TLD.to_string(),
            query_timeout: Duration::from_secs(10),
            server: None,
        }
    }
}

impl ScanConfig {
    /// Create a configuration for bodies of `length` using `strategies`.
    pub fn new(length: usize, strategies: Vec<Strategy>) -> Self {
        Self {
            length,
            strategies,
            ..Default::default()
        }
    }

    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    pub fn with_min_repeats(mut self, min_repeats: usize) -> Self {
        self.min_repeats = min_repeats;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_dict_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.dict_file = Some(path.into());
        self
    }

    pub fn with_pinyin_dict_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.pinyin_dict_file = Some(path.into());
        self
    }

    pub fn with_live_log<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.live_log = Some(path.into());
        self
    }

    pub fn with_output<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn with_tld<T: Into<String>>(mut self, tld: T) -> Self {
        self.tld = tld.into();
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_server<S: Into<String>>(mut self, server: S) -> Self {
        self.server = Some(server.into());
        self
    }

    pub fn with_cooldown(mut self, cooldown: bool) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Check the configuration for errors that must stop the scan up front.
    ///
    /// Source files are only checked for presence here; readability is
    /// checked when the generators are built.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.length == 0 {
            return Err(ScanError::config("--length must be a positive integer"));
        }
        if self.strategies.is_empty() {
            return Err(ScanError::config(
                "At least one generation method must be selected",
            ));
        }
        if self.strategies.contains(&Strategy::Repeats) && self.min_repeats < 2 {
            return Err(ScanError::config(
                "--min-repeats must be >= 2 when using the 'repeats' method",
            ));
        }
        if self.strategies.contains(&Strategy::Dict) && self.dict_file.is_none() {
            return Err(ScanError::config(
                "The 'dict' method requires --dict-file",
            ));
        }
        if self.strategies.contains(&Strategy::Pinyin) && self.pinyin_dict_file.is_none() {
            return Err(ScanError::config(
                "The 'pinyin' method requires --pinyin-dict-file",
            ));
        }
        if let (Some(live_log), Some(output)) = (&self.live_log, &self.output) {
            if same_file(live_log, output) {
                return Err(ScanError::config(format!(
                    "--live-log and --output must be different files, both are '{}'",
                    output.display()
                )));
            }
        }
        crate::utils::validate_tld(&self.tld)?;
        Ok(())
    }
}

/// Whether two result paths name the same file, including through
/// symlinks or `./` prefixes when the file already exists.
fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Status reported by the check server for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Available,
    Registered,
    Invalid,
    RateLimited,
    ServerError,
    Unknown,
}

/// Raw status codes of the check protocol and their meaning.
///
/// Codes not listed here map to [`QueryStatus::Unknown`].
pub const STATUS_CODES: &[(i32, QueryStatus)] = &[
    (1, QueryStatus::Available),
    (0, QueryStatus::Registered),
    (-1, QueryStatus::Invalid),
    (-95, QueryStatus::RateLimited),
    (-99, QueryStatus::ServerError),
];

impl QueryStatus {
    /// Classify a raw status code.
    pub fn from_code(code: i32) -> Self {
        STATUS_CODES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, status)| *status)
            .unwrap_or(QueryStatus::Unknown)
    }

    /// Transient statuses are retried; all others settle the candidate.
    pub fn is_transient(&self) -> bool {
        matches!(self, QueryStatus::RateLimited | QueryStatus::ServerError)
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryStatus::Available => write!(f, "available"),
            QueryStatus::Registered => write!(f, "registered"),
            QueryStatus::Invalid => write!(f, "invalid query"),
            QueryStatus::RateLimited => write!(f, "rate limited"),
            QueryStatus::ServerError => write!(f, "server error"),
            QueryStatus::Unknown => write!(f, "unknown response"),
        }
    }
}

/// One classified response for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryOutcome {
    pub candidate: String,
    pub status: QueryStatus,
    pub raw_code: i32,
}

impl QueryOutcome {
    pub fn from_code<C: Into<String>>(candidate: C, raw_code: i32) -> Self {
        Self {
            candidate: candidate.into(),
            status: QueryStatus::from_code(raw_code),
            raw_code,
        }
    }
}

/// Terminal state of a candidate once the retry policy is done with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateState {
    Available,
    Registered,
    Invalid,
    Unknown,
    /// Transient failures exhausted the retry budget
    FailedFinal,
}

impl fmt::Display for CandidateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateState::Available => write!(f, "AVAILABLE"),
            CandidateState::Registered => write!(f, "REGISTERED"),
            CandidateState::Invalid => write!(f, "INVALID"),
            CandidateState::Unknown => write!(f, "UNKNOWN"),
            CandidateState::FailedFinal => write!(f, "FAILED"),
        }
    }
}

/// Everything known about one candidate after it has been checked.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub candidate: String,
    pub state: CandidateState,

    /// Status of the last response, `None` if the last attempt got no response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_status: Option<QueryStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_code: Option<i32>,

    /// Number of queries issued for this candidate (>= 1)
    pub attempts: u32,

    /// Attempts answered with a rate-limit status
    pub rate_limit_hits: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl CheckReport {
    pub fn is_available(&self) -> bool {
        self.state == CandidateState::Available
    }
}

/// Available candidates in discovery order. Append-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScanResult {
    found: Vec<String>,
}

impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, candidate: String) {
        self.found.push(candidate);
    }

    pub fn len(&self) -> usize {
        self.found.len()
    }

    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.found.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.found
    }
}

/// Counters describing a finished (or interrupted) scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    pub checked: usize,
    pub available: usize,
    pub registered: usize,
    pub invalid: usize,
    pub unknown: usize,
    pub failed: usize,

    /// Responses with status `RateLimited`, counting retried attempts
    pub rate_limit_hits: usize,

    /// Total queries issued, including retries
    pub attempts: usize,

    #[serde(skip)]
    pub duration: Duration,

    pub interrupted: bool,
}

impl ScanSummary {
    pub(crate) fn record(&mut self, report: &CheckReport) {
        self.checked += 1;
        self.attempts += report.attempts as usize;
        self.rate_limit_hits += report.rate_limit_hits as usize;
        match report.state {
            CandidateState::Available => self.available += 1,
            CandidateState::Registered => self.registered += 1,
            CandidateState::Invalid => self.invalid += 1,
            CandidateState::Unknown => self.unknown += 1,
            CandidateState::FailedFinal => self.failed += 1,
        }
    }

    /// Candidates that did not end in a definite answer.
    pub fn errors(&self) -> usize {
        self.invalid + self.unknown + self.failed
    }

    /// Share of checked candidates with a definite answer, in percent.
    pub fn success_rate(&self) -> Option<f64> {
        if self.checked == 0 {
            return None;
        }
        let ok = self.checked - self.errors();
        Some(ok as f64 / self.checked as f64 * 100.0)
    }

    /// Candidates per second, including delays. `None` for very short runs.
    pub fn throughput(&self) -> Option<f64> {
        let secs = self.duration.as_secs_f64();
        if self.checked == 0 || secs <= 0.01 {
            return None;
        }
        Some(self.checked as f64 / secs)
    }
}
