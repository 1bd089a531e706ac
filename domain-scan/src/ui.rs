//! Terminal output for domain-scan.
//!
//! Configuration banner, per-candidate lines and the final summary. Uses only
//! the `console` crate. Everything goes to stdout; logs and prompts use stderr.

use console::{pad_str, style, Alignment};
use domain_scan_lib::{
    CandidatePlan, CandidateState, CheckReport, CheckServer, ScanConfig, ScanObserver,
    ScanResult, ScanSummary, Strategy,
};

// ── Reporter ─────────────────────────────────────────────────────────────────

/// Prints one line per reported candidate, prefixed with its position.
pub struct ConsoleReporter;

impl ScanObserver for ConsoleReporter {
    fn on_report(&mut self, index: usize, domain: &str, report: &CheckReport) {
        let padded_domain = pad_str(domain, 24, Alignment::Left, Some(".."));
        let prefix = format!("{} ", style(format!("[{}]", index)).dim());

        match report.state {
            CandidateState::Available => println!(
                "  {}{}  {}",
                prefix,
                style(&padded_domain).white().bold(),
                style("AVAILABLE").green().bold(),
            ),
            CandidateState::Registered => println!(
                "  {}{}  {}",
                prefix,
                style(&padded_domain).white(),
                style("REGISTERED").red(),
            ),
            state => println!(
                "  {}{}  {}  {}",
                prefix,
                style(&padded_domain).white(),
                style(state).yellow(),
                style(brief_reason(report)).dim(),
            ),
        }
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print the scan configuration before the first query.
pub fn print_config(config: &ScanConfig, plan: &CandidatePlan, server: &CheckServer) {
    let methods: Vec<String> = plan.strategies().iter().map(|s| s.to_string()).collect();

    println!(
        "{} {}",
        style("domain-scan").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
    );
    println!("{}", style("── Scan configuration ──").yellow().bold());
    println!("  Length:        {}", config.length);
    println!("  Characters:    {}", config.charset);
    println!("  Methods:       {}", methods.join(", "));
    if plan.strategies().contains(&Strategy::Repeats) {
        println!("  Min repeats:   {}", config.min_repeats);
    }
    if plan.strategies().contains(&Strategy::Dict) {
        if let Some(path) = &config.dict_file {
            println!("  Dictionary:    {}", path.display());
        }
    }
    if plan.strategies().contains(&Strategy::Pinyin) {
        if let Some(path) = &config.pinyin_dict_file {
            println!("  Pinyin list:   {}", path.display());
        }
    }
    if let Some(count) = plan.estimated_count() {
        println!("  Generated:     up to {} candidates", count);
    }
    println!("  Domain:        .{}  via {}", config.tld, server);
    if config.delay.is_zero() {
        println!(
            "  Delay:         {}",
            style("none (the server may start rate limiting)").yellow()
        );
    } else {
        println!("  Delay:         {:.2}s", config.delay.as_secs_f64());
    }
    println!("  Max retries:   {}", config.max_retries);
    if config.cooldown {
        println!("  Cooldown:      5x delay after rate limiting, 2x after server errors");
    }
    if let Some(path) = &config.live_log {
        println!("  Live log:      {}", path.display());
    }
    if let Some(path) = &config.output {
        println!("  Output:        {}", path.display());
    }
    println!();
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final counters and the available domains.
pub fn print_summary(summary: &ScanSummary, results: &ScanResult, tld: &str) {
    println!();
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} checked in {:.1}s  {}  {}  {}  {}  {}  {}",
        style(summary.checked).bold(),
        summary.duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} available", summary.available)).green(),
        style("|").dim(),
        style(format!("{} rate limited", summary.rate_limit_hits)).yellow(),
        style("|").dim(),
        style(format!("{} errors", summary.errors())).red(),
    );

    let speed = summary
        .throughput()
        .map(|s| format!("{:.2} domains/s", s))
        .unwrap_or_else(|| "n/a".to_string());
    let success = summary
        .success_rate()
        .map(|r| format!("{:.1}%", r))
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "  {}",
        style(format!(
            "{} queries, speed {}, success rate {}",
            summary.attempts, speed, success
        ))
        .dim()
    );

    if !results.is_empty() {
        println!();
        println!(
            "  {}",
            style(format!("── Available ({}) ", results.len())).green().bold()
        );
        for body in results.iter() {
            println!("  {}", domain_scan_lib::qualify(body, tld));
        }
    }
}

/// Tell the user the scan stopped early and what was kept.
pub fn print_interrupted(summary: &ScanSummary) {
    eprintln!(
        "{} after {} candidates; results found so far are saved.",
        style("Interrupted").yellow().bold(),
        summary.checked
    );
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Short reason for a candidate that did not get a definite answer.
fn brief_reason(report: &CheckReport) -> String {
    if let Some(message) = &report.error_message {
        let m = message.to_lowercase();
        return if m.contains("timeout") {
            "(timeout)".to_string()
        } else if m.contains("parse") {
            "(unreadable response)".to_string()
        } else {
            "(network error)".to_string()
        };
    }

    match (report.last_status, report.raw_code) {
        (Some(status), Some(code)) => format!("({}, code {})", status, code),
        (Some(status), None) => format!("({})", status),
        _ => "(no response)".to_string(),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
