//! Domain Scan CLI Application
//!
//! Scans every name of a fixed length under one TLD and records the ones
//! that are still available. Thin front end over domain-scan-lib.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use console::Term;
use domain_scan_lib::{
    load_env_config, parse_delay_seconds, parse_duration_string, qualify, CandidatePlan, Charset,
    ConfigManager, ScanConfig, ScanError, ScanObserver, Scanner, SilentObserver, Strategy,
    WhoisClient, LARGE_SCAN_THRESHOLD,
};
use std::io::{BufRead, BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::time::Instant;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for domain-scan
#[derive(Parser, Debug)]
#[command(name = "domain-scan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scan fixed-length domain names for registration availability")]
#[command(
    long_about = "Scan every name of a fixed length under one TLD (default .li) against the registry's check service.\n\nCandidates come from exhaustive combinations, dictionary words, repeated-character patterns and pinyin syllables. Available names are written to disk as soon as they are found."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Length of the name body, without the TLD
    #[arg(short = 'l', long = "length", value_name = "N", help_heading = "Candidates")]
    pub length: usize,

    /// Character set for generated names
    #[arg(
        short = 'c',
        long = "chars",
        value_name = "SET",
        value_parser = Charset::NAMES,
        help_heading = "Candidates"
    )]
    pub chars: Option<String>,

    /// Generation methods, queried in the order given
    #[arg(
        short = 'm',
        long = "methods",
        value_name = "METHOD",
        num_args = 1..,
        required = true,
        value_parser = Strategy::NAMES,
        help_heading = "Candidates"
    )]
    pub methods: Vec<String>,

    /// Minimum run of identical characters for the 'repeats' method (default: 2)
    #[arg(long = "min-repeats", value_name = "N", help_heading = "Candidates")]
    pub min_repeats: Option<usize>,

    /// Word list for the 'dict' method (default: /usr/share/dict/words)
    #[arg(long = "dict-file", value_name = "FILE", help_heading = "Candidates")]
    pub dict_file: Option<PathBuf>,

    /// Syllable list for the 'pinyin' method
    #[arg(long = "pinyin-dict-file", value_name = "FILE", help_heading = "Candidates")]
    pub pinyin_dict_file: Option<PathBuf>,

    /// Top-level domain to scan (default: li)
    #[arg(short = 't', long = "tld", value_name = "TLD", help_heading = "Candidates")]
    pub tld: Option<String>,

    /// Print the candidates without querying anything
    #[arg(long = "dry-run", help_heading = "Candidates")]
    pub dry_run: bool,

    /// File receiving each available domain (name.tld), one per line
    #[arg(short = 'o', long = "output", value_name = "FILE", help_heading = "Output")]
    pub output: Option<PathBuf>,

    /// File receiving each available name body as soon as it is found
    #[arg(long = "live-log", value_name = "FILE", help_heading = "Output")]
    pub live_log: Option<PathBuf>,

    /// Print the summary and available domains as JSON
    #[arg(short = 'j', long = "json", help_heading = "Output")]
    pub json: bool,

    /// Report every candidate, including registered ones (ignored with --json)
    #[arg(short = 'v', long = "verbose", help_heading = "Output")]
    pub verbose: bool,

    /// Seconds to wait between queries (default: 1.0)
    #[arg(long = "delay", value_name = "SECONDS", help_heading = "Query")]
    pub delay: Option<f64>,

    /// Retries for rate-limited or failed queries (default: 2)
    #[arg(long = "max-retries", value_name = "N", help_heading = "Query")]
    pub max_retries: Option<u32>,

    /// Per-query timeout, e.g. 10s, 500ms, 1m (default: 10s)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Query")]
    pub timeout: Option<String>,

    /// Pause longer after a candidate fails on rate limiting (5x delay) or server errors (2x delay)
    #[arg(long = "cooldown", help_heading = "Query")]
    pub cooldown: bool,

    /// Check server to query instead of the registry default
    #[arg(long = "server", value_name = "HOST:PORT", help_heading = "Query")]
    pub server: Option<String>,

    /// Skip the confirmation prompt for large scans
    #[arg(short = 'y', long = "yes", help_heading = "Query")]
    pub yes: bool,

    /// Use a specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<PathBuf>,

    /// Show debug logging on stderr
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    init_tracing(args.debug);

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run_scan(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins unless `--debug` is set.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Validate command line arguments that clap cannot check on its own
fn validate_args(args: &Args) -> Result<(), String> {
    if args.length == 0 {
        return Err("--length must be a positive integer".to_string());
    }

    if let Some(delay) = args.delay {
        if !delay.is_finite() || delay < 0.0 {
            return Err(format!("--delay must be a non-negative number, got {}", delay));
        }
    }

    if let Some(timeout) = &args.timeout {
        if parse_duration_string(timeout).is_none() {
            return Err(format!(
                "Invalid --timeout '{}'. Use a positive duration like 10s, 500ms or 1m",
                timeout
            ));
        }
    }

    Ok(())
}

async fn run_scan(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&args)?;
    let plan = CandidatePlan::from_config(&config)?;

    if args.dry_run {
        return print_dry_run(&plan, &config, args.json);
    }

    if plan.is_large() && !args.yes && !confirm_large_scan(&plan)? {
        eprintln!("Aborted.");
        return Ok(());
    }

    // Everything that can fail on bad input happens before the result files are opened
    let client = WhoisClient::from_config(&config)?;
    let candidates = plan.candidates()?;

    if !args.json {
        ui::print_config(&config, &plan, client.server());
    }

    let mut scanner = Scanner::new(client, &config).open_sinks(&config)?;
    let mut observer: Box<dyn ScanObserver> = if args.json {
        Box::new(SilentObserver)
    } else {
        Box::new(ui::ConsoleReporter)
    };

    let started = Instant::now();
    let summary = scanner
        .run_until(candidates, shutdown_signal(), observer.as_mut())
        .await?;

    if args.json {
        let available: Vec<String> = scanner
            .results()
            .iter()
            .map(|body| qualify(body, &config.tld))
            .collect();
        let document = serde_json::json!({
            "tld": config.tld,
            "summary": summary,
            "elapsed_secs": started.elapsed().as_secs_f64(),
            "available": available,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        ui::print_summary(&summary, scanner.results(), &config.tld);
    }

    if summary.interrupted {
        ui::print_interrupted(&summary);
    }

    Ok(())
}

/// Build the scan configuration with proper precedence:
/// CLI > environment variables > config file > defaults
fn build_config(args: &Args) -> Result<ScanConfig, ScanError> {
    let mut config = ScanConfig::default();
    let env_config = load_env_config();

    let explicit = args.config.as_deref().or(env_config.config.as_deref());
    if let Some(path) = explicit {
        debug!(path = %path.display(), "Using explicit config file");
    }

    let file_config = ConfigManager::new(args.verbose).load(explicit)?;
    if let Some(defaults) = &file_config.defaults {
        defaults.apply(&mut config)?;
    }

    env_config.apply(&mut config);
    apply_cli_args_to_config(&mut config, args)?;

    config.validate()?;
    Ok(config)
}

/// Overlay command line values onto `config`; only flags actually given win.
fn apply_cli_args_to_config(config: &mut ScanConfig, args: &Args) -> Result<(), ScanError> {
    config.length = args.length;
    config.strategies = args
        .methods
        .iter()
        .map(|m| m.parse::<Strategy>())
        .collect::<Result<Vec<_>, _>>()?;
    config.verbose = args.verbose;

    if let Some(chars) = &args.chars {
        config.charset = chars.parse()?;
    }
    if let Some(min_repeats) = args.min_repeats {
        config.min_repeats = min_repeats;
    }
    if let Some(path) = &args.dict_file {
        config.dict_file = Some(path.clone());
    }
    if let Some(path) = &args.pinyin_dict_file {
        config.pinyin_dict_file = Some(path.clone());
    }
    if let Some(tld) = &args.tld {
        config.tld = tld.clone();
    }
    if let Some(path) = &args.output {
        config.output = Some(path.clone());
    }
    if let Some(path) = &args.live_log {
        config.live_log = Some(path.clone());
    }
    if let Some(delay) = args.delay {
        config.delay = parse_delay_seconds(delay)?;
    }
    if let Some(max_retries) = args.max_retries {
        config.max_retries = max_retries;
    }
    if args.cooldown {
        config.cooldown = true;
    }
    if let Some(timeout) = &args.timeout {
        config.query_timeout = parse_duration_string(timeout)
            .ok_or_else(|| ScanError::config(format!("Invalid --timeout '{}'", timeout)))?;
    }
    if let Some(server) = &args.server {
        config.server = Some(server.clone());
    }

    Ok(())
}

/// Print every candidate as name.tld without touching the network or any file.
///
/// The JSON form is written element by element so memory stays flat however
/// many candidates there are.
fn print_dry_run(
    plan: &CandidatePlan,
    config: &ScanConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut count = 0usize;

    if json {
        write!(out, "[")?;
        for body in plan.candidates()? {
            let separator = if count == 0 { "\n  " } else { ",\n  " };
            write!(out, "{}", separator)?;
            serde_json::to_writer(&mut out, &qualify(&body, &config.tld))?;
            count += 1;
        }
        writeln!(out, "{}]", if count == 0 { "" } else { "\n" })?;
    } else {
        for body in plan.candidates()? {
            writeln!(out, "{}", qualify(&body, &config.tld))?;
            count += 1;
        }
    }
    out.flush()?;

    eprintln!("{} domains would be checked", count);
    Ok(())
}

/// Ask before a scan over more than [`LARGE_SCAN_THRESHOLD`] candidates.
///
/// Only prompts on a terminal; otherwise the scan goes ahead with a warning.
fn confirm_large_scan(plan: &CandidatePlan) -> Result<bool, std::io::Error> {
    let estimate = plan.estimated_count().unwrap_or(u128::MAX);
    warn!(
        candidates = estimate,
        threshold = LARGE_SCAN_THRESHOLD,
        "Large candidate space"
    );

    let term = Term::stderr();
    if !term.is_term() {
        return Ok(true);
    }

    eprint!(
        "Will query up to {} candidates, one at a time. Proceed? [Y/n] ",
        estimate
    );
    let mut input = String::new();
    std::io::stdin().lock().read_line(&mut input)?;
    let answer = input.trim().to_lowercase();
    Ok(answer != "n" && answer != "no")
}

/// Completes on Ctrl-C. If the handler cannot be installed the scan simply
/// runs to the end.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
