//! The sequential scan loop.
//!
//! One candidate at a time: wait out the inter-query delay, query through
//! the retry policy, persist an available body, report, move on. Nothing is
//! queried concurrently and results are written in discovery order.

use crate::error::ScanError;
use crate::output::ResultSink;
use crate::protocols::AvailabilityClient;
use crate::retry::RetryPolicy;
use crate::types::{
    CandidateState, CheckReport, QueryStatus, ScanConfig, ScanResult, ScanSummary,
};
use crate::utils::qualify;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Receives per-candidate progress from [`Scanner::run`].
pub trait ScanObserver {
    /// Called after a candidate settles, with its 1-based position in the
    /// scan and its fully qualified name.
    ///
    /// Registered candidates are only reported in verbose mode; every other
    /// outcome is always reported.
    fn on_report(&mut self, _index: usize, _domain: &str, _report: &CheckReport) {}

    /// Called once an available domain has been written to every sink.
    fn on_available(&mut self, _index: usize, _domain: &str) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl ScanObserver for SilentObserver {}

/// Floor for the cooldown pause when no inter-query delay is configured.
const COOLDOWN_BASE: Duration = Duration::from_secs(1);

/// Drives candidates through a client and records what is available.
pub struct Scanner<C> {
    client: C,
    policy: RetryPolicy,
    delay: Duration,
    cooldown: bool,
    tld: String,
    verbose: bool,
    live_log: Option<ResultSink>,
    output: Option<ResultSink>,
    results: ScanResult,
}

impl<C: AvailabilityClient> Scanner<C> {
    /// Create a scanner with no result files attached.
    pub fn new(client: C, config: &ScanConfig) -> Self {
        Self {
            client,
            policy: RetryPolicy::from_config(config),
            delay: config.delay,
            cooldown: config.cooldown,
            tld: config.tld.trim().trim_start_matches('.').to_string(),
            verbose: config.verbose,
            live_log: None,
            output: None,
            results: ScanResult::new(),
        }
    }

    /// Create (truncating) the live log and output files named in `config`.
    ///
    /// Call this only after the candidate stream has been built, so a
    /// configuration error never touches existing result files.
    pub fn open_sinks(mut self, config: &ScanConfig) -> Result<Self, ScanError> {
        if let Some(path) = &config.live_log {
            self.live_log = Some(ResultSink::create(path)?);
        }
        if let Some(path) = &config.output {
            self.output = Some(ResultSink::create(path)?);
        }
        Ok(self)
    }

    pub fn with_live_log(mut self, sink: ResultSink) -> Self {
        self.live_log = Some(sink);
        self
    }

    pub fn with_output(mut self, sink: ResultSink) -> Self {
        self.output = Some(sink);
        self
    }

    pub fn results(&self) -> &ScanResult {
        &self.results
    }

    pub fn into_results(self) -> ScanResult {
        self.results
    }

    /// Scan every candidate.
    pub async fn run<I, O>(
        &mut self,
        candidates: I,
        observer: &mut O,
    ) -> Result<ScanSummary, ScanError>
    where
        I: IntoIterator<Item = String>,
        O: ScanObserver + ?Sized,
    {
        self.run_until(candidates, std::future::pending::<()>(), observer)
            .await
    }

    /// Scan candidates until they run out or `shutdown` completes.
    ///
    /// `shutdown` is only observed while waiting (delay or query). Appends
    /// to the result files are never cut short. On shutdown the summary is
    /// returned with `interrupted` set.
    ///
    /// Fails only if a result file cannot be written; everything written
    /// before the failure stays in place.
    pub async fn run_until<I, F, O>(
        &mut self,
        candidates: I,
        shutdown: F,
        observer: &mut O,
    ) -> Result<ScanSummary, ScanError>
    where
        I: IntoIterator<Item = String>,
        F: Future<Output = ()>,
        O: ScanObserver + ?Sized,
    {
        let started = Instant::now();
        let mut summary = ScanSummary::default();
        tokio::pin!(shutdown);

        info!(
            tld = %self.tld,
            max_retries = self.policy.max_retries,
            delay_ms = self.delay.as_millis() as u64,
            "Scan started"
        );

        for (position, candidate) in candidates.into_iter().enumerate() {
            let index = position + 1;

            if position > 0 && !self.delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = &mut shutdown => {
                        summary.interrupted = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.delay) => {}
                }
            }

            let report = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    summary.interrupted = true;
                    break;
                }
                report = self.policy.check(&self.client, &candidate) => report,
            };

            summary.record(&report);
            let domain = qualify(&candidate, &self.tld);
            debug!(
                index,
                domain = %domain,
                state = %report.state,
                attempts = report.attempts,
                "Candidate settled"
            );

            if self.verbose || report.state != CandidateState::Registered {
                observer.on_report(index, &domain, &report);
            }
            if self.verbose && report.state == CandidateState::Unknown {
                warn!(
                    domain = %domain,
                    raw_code = ?report.raw_code,
                    error = ?report.error_message,
                    "Unrecognised response from check server"
                );
            }

            if report.is_available() {
                self.persist(&candidate, &domain)?;
                observer.on_available(index, &domain);
            }

            if let Some(pause) = self.cooldown_after(&report) {
                warn!(
                    domain = %domain,
                    pause_ms = pause.as_millis() as u64,
                    "Check server keeps failing, cooling down"
                );
                tokio::select! {
                    biased;
                    _ = &mut shutdown => {
                        summary.interrupted = true;
                        break;
                    }
                    _ = tokio::time::sleep(pause) => {}
                }
            }
        }

        summary.duration = started.elapsed();
        info!(
            checked = summary.checked,
            available = summary.available,
            interrupted = summary.interrupted,
            "Scan finished"
        );
        Ok(summary)
    }

    /// Extra pause after a candidate that ran out of retries, when enabled.
    fn cooldown_after(&self, report: &CheckReport) -> Option<Duration> {
        if !self.cooldown || report.state != CandidateState::FailedFinal {
            return None;
        }
        let base = if self.delay.is_zero() {
            COOLDOWN_BASE
        } else {
            self.delay
        };
        match report.last_status {
            Some(QueryStatus::RateLimited) => Some(base * 5),
            Some(QueryStatus::ServerError) => Some(base * 2),
            _ => None,
        }
    }

    fn persist(&mut self, body: &str, domain: &str) -> Result<(), ScanError> {
        if let Some(sink) = self.live_log.as_mut() {
            sink.append(body)?;
        }
        if let Some(sink) = self.output.as_mut() {
            sink.append(domain)?;
        }
        self.results.push(body.to_string());
        Ok(())
    }
}
