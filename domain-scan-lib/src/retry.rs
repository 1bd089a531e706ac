//! Bounded retry of transient query failures.

use crate::protocols::AvailabilityClient;
use crate::types::{CandidateState, CheckReport, QueryOutcome, QueryStatus, ScanConfig};
use std::time::Duration;
use tracing::debug;

/// Retry policy for one candidate: up to `max_retries` extra attempts,
/// `delay` apart.
///
/// Rate limiting, server errors and network failures are retried. Every
/// other outcome settles the candidate on the attempt that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.max_retries, config.delay)
    }

    /// Upper bound on queries issued for one candidate.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Query `candidate` until it settles or the retry budget runs out.
    ///
    /// Never fails: exhausted retries produce a [`CandidateState::FailedFinal`]
    /// report carrying the last thing observed.
    pub async fn check<C: AvailabilityClient>(&self, client: &C, candidate: &str) -> CheckReport {
        let mut report = CheckReport {
            candidate: candidate.to_string(),
            state: CandidateState::FailedFinal,
            last_status: None,
            raw_code: None,
            attempts: 0,
            rate_limit_hits: 0,
            error_message: None,
        };

        loop {
            report.attempts += 1;

            match client.query(candidate).await {
                Ok(code) => {
                    let outcome = QueryOutcome::from_code(candidate, code);
                    report.last_status = Some(outcome.status);
                    report.raw_code = Some(outcome.raw_code);
                    report.error_message = None;

                    if outcome.status == QueryStatus::RateLimited {
                        report.rate_limit_hits += 1;
                    }
                    if !outcome.status.is_transient() {
                        report.state = settled_state(outcome.status);
                        return report;
                    }
                }
                Err(e) if e.is_retryable() => {
                    report.last_status = None;
                    report.raw_code = None;
                    report.error_message = Some(e.to_string());
                }
                Err(e) => {
                    // Malformed answers are not expected to improve on retry
                    report.last_status = Some(QueryStatus::Unknown);
                    report.raw_code = None;
                    report.error_message = Some(e.to_string());
                    report.state = CandidateState::Unknown;
                    return report;
                }
            }

            if report.attempts >= self.max_attempts() {
                debug!(
                    candidate,
                    attempts = report.attempts,
                    "Giving up after transient failures"
                );
                report.state = CandidateState::FailedFinal;
                return report;
            }

            debug!(
                candidate,
                attempt = report.attempts,
                max_attempts = self.max_attempts(),
                reason = %describe_failure(&report),
                "Transient failure, retrying"
            );
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
    }
}

fn settled_state(status: QueryStatus) -> CandidateState {
    match status {
        QueryStatus::Available => CandidateState::Available,
        QueryStatus::Registered => CandidateState::Registered,
        QueryStatus::Invalid => CandidateState::Invalid,
        _ => CandidateState::Unknown,
    }
}

fn describe_failure(report: &CheckReport) -> String {
    match (&report.last_status, &report.error_message) {
        (Some(status), _) => status.to_string(),
        (None, Some(message)) => message.clone(),
        (None, None) => "no response".to_string(),
    }
}
