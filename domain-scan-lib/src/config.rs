//! Configuration file parsing and management.
//!
//! Settings come from four layers. Highest precedence first:
//!
//! 1. command-line flags (applied by the binary)
//! 2. `DS_*` environment variables ([`load_env_config`])
//! 3. TOML configuration files ([`ConfigManager`])
//! 4. built-in defaults ([`ScanConfig::default`])
//!
//! Each layer only overrides the values it actually sets.

use crate::error::ScanError;
use crate::protocols::CheckServer;
use crate::types::{Charset, ScanConfig};
use crate::utils::validate_tld;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default values that map to CLI options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Character set name (e.g. "alnum", "letters-hyphen")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chars: Option<String>,

    /// TLD without the leading dot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tld: Option<String>,

    /// Delay between queries, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// Pause longer after candidates that fail on rate limiting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_repeats: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dict_file: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinyin_dict_file: Option<PathBuf>,

    /// Per-query timeout (as string, e.g. "10s", "500ms")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Check server as `host:port`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

impl DefaultsConfig {
    /// Overlay the values set here onto `config`.
    pub fn apply(&self, config: &mut ScanConfig) -> Result<(), ScanError> {
        if let Some(chars) = &self.chars {
            config.charset = chars.parse::<Charset>()?;
        }
        if let Some(tld) = &self.tld {
            config.tld = tld.trim().to_string();
        }
        if let Some(delay) = self.delay {
            config.delay = parse_delay_seconds(delay)?;
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(cooldown) = self.cooldown {
            config.cooldown = cooldown;
        }
        if let Some(min_repeats) = self.min_repeats {
            config.min_repeats = min_repeats;
        }
        if let Some(path) = &self.dict_file {
            config.dict_file = Some(path.clone());
        }
        if let Some(path) = &self.pinyin_dict_file {
            config.pinyin_dict_file = Some(path.clone());
        }
        if let Some(timeout) = &self.timeout {
            config.query_timeout = parse_duration_string(timeout).ok_or_else(|| {
                ScanError::config(format!(
                    "Invalid timeout format '{}'. Use format like '10s', '500ms', '1m'",
                    timeout
                ))
            })?;
        }
        if let Some(server) = &self.server {
            config.server = Some(server.trim().to_string());
        }
        Ok(())
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to report which files were loaded
    pub verbose: bool,
}

impl ConfigManager {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, ScanError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScanError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ScanError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            ScanError::config(format!(
                "Failed to parse TOML configuration '{}': {}",
                path.display(),
                e
            ))
        })?;

        self.validate_config(&config)?;
        debug!(path = %path.display(), "Loaded configuration file");

        Ok(config)
    }

    /// Load the explicit file if one is given, otherwise discover files in
    /// the standard locations.
    pub fn load(&self, explicit: Option<&Path>) -> Result<FileConfig, ScanError> {
        match explicit {
            Some(path) => self.load_file(path),
            None => self.discover_and_load(),
        }
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Later files override earlier ones key by key: XDG config, then
    /// `~/.domain-scan.toml`, then `./domain-scan.toml`. A file that exists
    /// but does not parse is an error.
    pub fn discover_and_load(&self) -> Result<FileConfig, ScanError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            let config = self.load_file(&path)?;
            merged_config = self.merge_configs(merged_config, config);
            loaded_files.push(path);
        }

        if self.verbose && loaded_files.len() > 1 {
            for path in &loaded_files {
                warn!(path = %path.display(), "Merging configuration file (later files win)");
            }
        }

        Ok(merged_config)
    }

    fn get_local_config_path(&self) -> Option<PathBuf> {
        let path = Path::new("./domain-scan.toml");
        path.exists().then(|| path.to_path_buf())
    }

    fn get_global_config_path(&self) -> Option<PathBuf> {
        let path = Path::new(&env::var_os("HOME")?).join(".domain-scan.toml");
        path.exists().then_some(path)
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("domain-scan").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations; values from `higher` take precedence.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                    chars: higher_defaults.chars.or(lower_defaults.chars),
                    tld: higher_defaults.tld.or(lower_defaults.tld),
                    delay: higher_defaults.delay.or(lower_defaults.delay),
                    max_retries: higher_defaults.max_retries.or(lower_defaults.max_retries),
                    cooldown: higher_defaults.cooldown.or(lower_defaults.cooldown),
                    min_repeats: higher_defaults.min_repeats.or(lower_defaults.min_repeats),
                    dict_file: higher_defaults.dict_file.or(lower_defaults.dict_file),
                    pinyin_dict_file: higher_defaults
                        .pinyin_dict_file
                        .or(lower_defaults.pinyin_dict_file),
                    timeout: higher_defaults.timeout.or(lower_defaults.timeout),
                    server: higher_defaults.server.or(lower_defaults.server),
                }),
                (None, higher_defaults) => higher_defaults,
                (lower_defaults, None) => lower_defaults,
            },
        }
    }

    /// Validate a configuration for common issues.
    pub fn validate_config(&self, config: &FileConfig) -> Result<(), ScanError> {
        let Some(defaults) = &config.defaults else {
            return Ok(());
        };

        if let Some(chars) = &defaults.chars {
            chars.parse::<Charset>()?;
        }
        if let Some(tld) = &defaults.tld {
            validate_tld(tld)?;
        }
        if let Some(delay) = defaults.delay {
            parse_delay_seconds(delay)?;
        }
        if let Some(min_repeats) = defaults.min_repeats {
            if min_repeats < 2 {
                return Err(ScanError::config("min_repeats must be >= 2"));
            }
        }
        if let Some(timeout) = &defaults.timeout {
            if parse_duration_string(timeout).is_none() {
                return Err(ScanError::config(format!(
                    "Invalid timeout format '{}'. Use format like '10s', '500ms', '1m'",
                    timeout
                )));
            }
        }
        if let Some(server) = &defaults.server {
            server.parse::<CheckServer>()?;
        }

        Ok(())
    }
}

/// Values taken from `DS_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub charset: Option<Charset>,
    pub tld: Option<String>,
    pub delay: Option<Duration>,
    pub max_retries: Option<u32>,
    pub cooldown: Option<bool>,
    pub min_repeats: Option<usize>,
    pub dict_file: Option<PathBuf>,
    pub pinyin_dict_file: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub server: Option<String>,
    pub config: Option<PathBuf>,
}

impl EnvConfig {
    /// Overlay the values set here onto `config`.
    pub fn apply(&self, config: &mut ScanConfig) {
        if let Some(charset) = self.charset {
            config.charset = charset;
        }
        if let Some(tld) = &self.tld {
            config.tld = tld.clone();
        }
        if let Some(delay) = self.delay {
            config.delay = delay;
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(cooldown) = self.cooldown {
            config.cooldown = cooldown;
        }
        if let Some(min_repeats) = self.min_repeats {
            config.min_repeats = min_repeats;
        }
        if let Some(path) = &self.dict_file {
            config.dict_file = Some(path.clone());
        }
        if let Some(path) = &self.pinyin_dict_file {
            config.pinyin_dict_file = Some(path.clone());
        }
        if let Some(timeout) = self.timeout {
            config.query_timeout = timeout;
        }
        if let Some(server) = &self.server {
            config.server = Some(server.clone());
        }
    }
}

/// Load configuration from the process environment.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok())
}

/// Load configuration through an arbitrary variable lookup.
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();
    let get = |key: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    // DS_CHARS - character set name
    if let Some(val) = get("DS_CHARS") {
        match val.parse::<Charset>() {
            Ok(charset) => env_config.charset = Some(charset),
            Err(_) => warn!("Ignoring invalid DS_CHARS='{}'", val),
        }
    }

    // DS_TLD - TLD without the leading dot
    if let Some(val) = get("DS_TLD") {
        match validate_tld(&val) {
            Ok(()) => env_config.tld = Some(val),
            Err(_) => warn!("Ignoring invalid DS_TLD='{}'", val),
        }
    }

    // DS_DELAY - seconds between queries, fractional allowed
    if let Some(val) = get("DS_DELAY") {
        match val.parse::<f64>().ok().map(parse_delay_seconds) {
            Some(Ok(delay)) => env_config.delay = Some(delay),
            _ => warn!("Ignoring invalid DS_DELAY='{}', must be a number >= 0", val),
        }
    }

    // DS_MAX_RETRIES
    if let Some(val) = get("DS_MAX_RETRIES") {
        match val.parse::<u32>() {
            Ok(retries) => env_config.max_retries = Some(retries),
            Err(_) => warn!("Ignoring invalid DS_MAX_RETRIES='{}'", val),
        }
    }

    // DS_COOLDOWN - true/false
    if let Some(val) = get("DS_COOLDOWN") {
        match val.to_lowercase().as_str() {
            "true" | "1" | "yes" => env_config.cooldown = Some(true),
            "false" | "0" | "no" => env_config.cooldown = Some(false),
            _ => warn!("Ignoring invalid DS_COOLDOWN='{}', use true or false", val),
        }
    }

    // DS_MIN_REPEATS - at least 2
    if let Some(val) = get("DS_MIN_REPEATS") {
        match val.parse::<usize>() {
            Ok(min) if min >= 2 => env_config.min_repeats = Some(min),
            _ => warn!("Ignoring invalid DS_MIN_REPEATS='{}', must be >= 2", val),
        }
    }

    if let Some(val) = get("DS_DICT_FILE") {
        env_config.dict_file = Some(PathBuf::from(val));
    }

    if let Some(val) = get("DS_PINYIN_DICT_FILE") {
        env_config.pinyin_dict_file = Some(PathBuf::from(val));
    }

    // DS_TIMEOUT - e.g. "10s", "500ms"
    if let Some(val) = get("DS_TIMEOUT") {
        match parse_duration_string(&val) {
            Some(timeout) => env_config.timeout = Some(timeout),
            None => warn!(
                "Ignoring invalid DS_TIMEOUT='{}', use format like '10s', '500ms', '1m'",
                val
            ),
        }
    }

    // DS_SERVER - host:port of the check server
    if let Some(val) = get("DS_SERVER") {
        match val.parse::<CheckServer>() {
            Ok(_) => env_config.server = Some(val),
            Err(_) => warn!("Ignoring invalid DS_SERVER='{}'", val),
        }
    }

    // DS_CONFIG - explicit config file
    if let Some(val) = get("DS_CONFIG") {
        env_config.config = Some(PathBuf::from(val));
    }

    env_config
}

/// Parse a duration like "500ms", "10s", "2m", or a bare number of seconds.
pub fn parse_duration_string(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    let duration = if let Some(ms) = value.strip_suffix("ms") {
        Duration::from_millis(ms.trim().parse::<u64>().ok()?)
    } else if let Some(secs) = value.strip_suffix('s') {
        Duration::from_secs(secs.trim().parse::<u64>().ok()?)
    } else if let Some(mins) = value.strip_suffix('m') {
        Duration::from_secs(mins.trim().parse::<u64>().ok()?.checked_mul(60)?)
    } else {
        Duration::from_secs(value.parse::<u64>().ok()?)
    };

    (!duration.is_zero()).then_some(duration)
}

/// Convert a (possibly fractional) number of seconds into a delay.
pub fn parse_delay_seconds(seconds: f64) -> Result<Duration, ScanError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ScanError::config(format!(
            "Delay must be a number of seconds >= 0, got {}",
            seconds
        )));
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|e| ScanError::config(format!("Delay {} is out of range: {}", seconds, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    fn env_from(pairs: &[(&str, &str)]) -> EnvConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        load_env_config_from(|key| vars.get(key).cloned())
    }

    // ── Durations ───────────────────────────────────────────────────

    #[test]
    fn test_parse_duration_string() {
        assert_eq!(parse_duration_string("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration_string("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration_string("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration_string("7"), Some(Duration::from_secs(7)));
        assert_eq!(parse_duration_string("0s"), None);
        assert_eq!(parse_duration_string("invalid"), None);
    }

    #[test]
    fn test_parse_delay_seconds() {
        assert_eq!(parse_delay_seconds(0.0).unwrap(), Duration::ZERO);
        assert_eq!(parse_delay_seconds(1.5).unwrap(), Duration::from_millis(1500));
        assert!(parse_delay_seconds(-1.0).is_err());
        assert!(parse_delay_seconds(f64::NAN).is_err());
    }

    // ── Files ───────────────────────────────────────────────────────

    #[test]
    fn test_load_valid_config() {
        let temp_file = write_config(
            r#"
[defaults]
chars = "letters"
tld = "ch"
delay = 0.5
max_retries = 4
cooldown = true
timeout = "3s"
server = "127.0.0.1:4343"
"#,
        );

        let manager = ConfigManager::new(false);
        let config = manager.load_file(temp_file.path()).unwrap();
        let defaults = config.defaults.unwrap();
        assert_eq!(defaults.chars.as_deref(), Some("letters"));
        assert_eq!(defaults.max_retries, Some(4));

        let mut scan = ScanConfig::default();
        defaults.apply(&mut scan).unwrap();
        assert_eq!(scan.charset, Charset::Letters);
        assert_eq!(scan.tld, "ch");
        assert_eq!(scan.delay, Duration::from_millis(500));
        assert_eq!(scan.max_retries, 4);
        assert!(scan.cooldown);
        assert_eq!(scan.query_timeout, Duration::from_secs(3));
        assert_eq!(scan.server.as_deref(), Some("127.0.0.1:4343"));
        // Untouched keys keep their defaults
        assert_eq!(scan.min_repeats, 2);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let manager = ConfigManager::new(false);
        for content in [
            "[defaults]\nchars = \"emoji\"\n",
            "[defaults]\ndelay = -1.0\n",
            "[defaults]\nmin_repeats = 1\n",
            "[defaults]\ntimeout = \"soon\"\n",
            "[defaults]\ntld = \".li\"\n",
            "[defaults]\nconcurrency = 10\n",
        ] {
            let temp_file = write_config(content);
            let result = manager.load_file(temp_file.path());
            assert!(
                matches!(result, Err(ScanError::ConfigError { .. })),
                "accepted: {}",
                content
            );
        }
    }

    #[test]
    fn test_missing_file() {
        let manager = ConfigManager::new(false);
        let result = manager.load(Some(Path::new("/no/such/domain-scan.toml")));
        assert!(matches!(result, Err(ScanError::FileError { .. })));
    }

    #[test]
    fn test_merge_configs() {
        let manager = ConfigManager::new(false);

        let lower = FileConfig {
            defaults: Some(DefaultsConfig {
                chars: Some("digits".to_string()),
                delay: Some(2.0),
                max_retries: Some(1),
                ..Default::default()
            }),
        };

        let higher = FileConfig {
            defaults: Some(DefaultsConfig {
                delay: Some(0.25),
                tld: Some("ch".to_string()),
                ..Default::default()
            }),
        };

        let merged = manager.merge_configs(lower, higher);
        let defaults = merged.defaults.unwrap();

        assert_eq!(defaults.delay, Some(0.25)); // Higher wins
        assert_eq!(defaults.chars.as_deref(), Some("digits")); // Lower preserved
        assert_eq!(defaults.max_retries, Some(1));
        assert_eq!(defaults.tld.as_deref(), Some("ch"));
    }

    // ── Environment ─────────────────────────────────────────────────

    #[test]
    fn test_env_config_values() {
        let env = env_from(&[
            ("DS_CHARS", "digits-hyphen"),
            ("DS_TLD", "ch"),
            ("DS_DELAY", "0.2"),
            ("DS_MAX_RETRIES", "5"),
            ("DS_COOLDOWN", "yes"),
            ("DS_MIN_REPEATS", "3"),
            ("DS_TIMEOUT", "750ms"),
            ("DS_SERVER", "localhost:9000"),
            ("DS_CONFIG", "/etc/domain-scan.toml"),
        ]);

        assert_eq!(env.charset, Some(Charset::DigitsHyphen));
        assert_eq!(env.tld.as_deref(), Some("ch"));
        assert_eq!(env.delay, Some(Duration::from_millis(200)));
        assert_eq!(env.max_retries, Some(5));
        assert_eq!(env.cooldown, Some(true));
        assert_eq!(env.min_repeats, Some(3));
        assert_eq!(env.timeout, Some(Duration::from_millis(750)));
        assert_eq!(env.server.as_deref(), Some("localhost:9000"));
        assert_eq!(env.config, Some(PathBuf::from("/etc/domain-scan.toml")));

        let mut scan = ScanConfig::default();
        env.apply(&mut scan);
        assert_eq!(scan.charset, Charset::DigitsHyphen);
        assert_eq!(scan.max_retries, 5);
    }

    #[test]
    fn test_env_invalid_values_ignored() {
        let env = env_from(&[
            ("DS_CHARS", "klingon"),
            ("DS_DELAY", "-3"),
            ("DS_MAX_RETRIES", "many"),
            ("DS_COOLDOWN", "sometimes"),
            ("DS_MIN_REPEATS", "1"),
            ("DS_TIMEOUT", "forever"),
            ("DS_SERVER", "host:port"),
            ("DS_TLD", "   "),
        ]);
        assert_eq!(env, EnvConfig::default());
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_file = write_config("[defaults]\nmax_retries = 7\nchars = \"letters\"\n");
        let file = ConfigManager::new(false).load_file(temp_file.path()).unwrap();
        let env = env_from(&[("DS_MAX_RETRIES", "1")]);

        let mut scan = ScanConfig::default();
        file.defaults.unwrap().apply(&mut scan).unwrap();
        env.apply(&mut scan);

        assert_eq!(scan.max_retries, 1);
        assert_eq!(scan.charset, Charset::Letters);
    }
}
