// domain-scan/tests/cli_integration.rs

//! Network-free CLI tests: argument validation, configuration layering and
//! `--dry-run` output.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::{tempdir, TempDir};

const DS_VARS: [&str; 11] = [
    "DS_CHARS",
    "DS_TLD",
    "DS_DELAY",
    "DS_MAX_RETRIES",
    "DS_COOLDOWN",
    "DS_MIN_REPEATS",
    "DS_DICT_FILE",
    "DS_PINYIN_DICT_FILE",
    "DS_TIMEOUT",
    "DS_SERVER",
    "DS_CONFIG",
];

/// Command isolated from the user's environment and config files.
fn domain_scan(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("domain-scan").unwrap();
    for var in DS_VARS {
        cmd.env_remove(var);
    }
    cmd.env_remove("RUST_LOG")
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .current_dir(home.path());
    cmd
}

#[test]
fn test_help_lists_flags() {
    let home = tempdir().unwrap();
    domain_scan(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--length"))
        .stdout(predicate::str::contains("--methods"))
        .stdout(predicate::str::contains("--live-log"))
        .stdout(predicate::str::contains("--max-retries"));
}

#[test]
fn test_version() {
    let home = tempdir().unwrap();
    domain_scan(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_methods_fails() {
    let home = tempdir().unwrap();
    domain_scan(&home)
        .args(["-l", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--methods"));
}

#[test]
fn test_missing_length_fails() {
    let home = tempdir().unwrap();
    domain_scan(&home)
        .args(["-m", "all"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--length"));
}

#[test]
fn test_invalid_charset_and_method_rejected() {
    let home = tempdir().unwrap();
    domain_scan(&home)
        .args(["-l", "2", "-c", "emoji", "-m", "all"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("emoji"));

    domain_scan(&home)
        .args(["-l", "2", "-m", "everything"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("everything"));
}

#[test]
fn test_zero_length_rejected() {
    let home = tempdir().unwrap();
    domain_scan(&home)
        .args(["-l", "0", "-m", "all", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("--length"));
}

#[test]
fn test_dry_run_lists_candidates_in_order() {
    let home = tempdir().unwrap();
    let expected: String = (0..10).map(|d| format!("{}.li\n", d)).collect();

    domain_scan(&home)
        .args(["-l", "1", "-c", "digits", "-m", "all", "--dry-run"])
        .assert()
        .success()
        .stdout(expected)
        .stderr(predicate::str::contains("10 domains would be checked"));
}

#[test]
fn test_dry_run_json() {
    let home = tempdir().unwrap();
    let output = domain_scan(&home)
        .args(["-l", "1", "-c", "digits", "-m", "all", "--dry-run", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let domains: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(domains.len(), 10);
    assert_eq!(domains[0], "0.li");
    assert_eq!(domains[9], "9.li");
}

#[test]
fn test_dry_run_json_empty_and_with_verbose() {
    let home = tempdir().unwrap();
    let words = home.path().join("words.txt");
    fs::write(&words, "toolong\nab\n").unwrap();

    domain_scan(&home)
        .args(["-l", "3", "-c", "digits", "-m", "dict", "--dry-run", "--json", "--verbose"])
        .arg("--dict-file")
        .arg(&words)
        .assert()
        .success()
        .stdout("[]\n")
        .stderr(predicate::str::contains("0 domains would be checked"));
}

#[test]
fn test_same_live_log_and_output_rejected() {
    let home = tempdir().unwrap();
    let found = home.path().join("found.txt");
    fs::write(&found, "from-last-run\n").unwrap();

    domain_scan(&home)
        .args(["-l", "1", "-c", "digits", "-m", "all"])
        .arg("--live-log")
        .arg(&found)
        .arg("-o")
        .arg(&found)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--live-log and --output"));

    assert_eq!(fs::read_to_string(&found).unwrap(), "from-last-run\n");
}

#[test]
fn test_dry_run_dictionary_first_without_duplicates() {
    let home = tempdir().unwrap();
    let words = home.path().join("words.txt");
    fs::write(&words, "42\nab\n42\n7\n").unwrap();

    let output = domain_scan(&home)
        .args(["-l", "2", "-c", "digits", "-m", "dict", "all", "--dry-run"])
        .arg("--dict-file")
        .arg(&words)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 100);
    assert_eq!(lines[0], "42.li");
    assert_eq!(lines[1], "00.li");
    assert_eq!(lines.iter().filter(|l| **l == "42.li").count(), 1);
}

#[test]
fn test_dry_run_touches_no_files() {
    let home = tempdir().unwrap();
    let live = home.path().join("live.txt");
    fs::write(&live, "keep\n").unwrap();

    domain_scan(&home)
        .args(["-l", "1", "-c", "digits", "-m", "all", "--dry-run"])
        .arg("--live-log")
        .arg(&live)
        .arg("-o")
        .arg(home.path().join("out.txt"))
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&live).unwrap(), "keep\n");
    assert!(!home.path().join("out.txt").exists());
}

#[test]
fn test_min_repeats_below_two_rejected() {
    let home = tempdir().unwrap();
    domain_scan(&home)
        .args(["-l", "3", "-m", "repeats", "--min-repeats", "1", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--min-repeats"));
}

#[test]
fn test_missing_dictionary_leaves_live_log_alone() {
    let home = tempdir().unwrap();
    let live = home.path().join("live.txt");
    fs::write(&live, "from-last-run\n").unwrap();

    domain_scan(&home)
        .args(["-l", "3", "-m", "dict", "--delay", "0"])
        .arg("--dict-file")
        .arg(home.path().join("no-such-words"))
        .arg("--live-log")
        .arg(&live)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no-such-words"));

    assert_eq!(fs::read_to_string(&live).unwrap(), "from-last-run\n");
}

#[test]
fn test_pinyin_requires_a_list() {
    let home = tempdir().unwrap();
    domain_scan(&home)
        .args(["-l", "3", "-m", "pinyin", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--pinyin-dict-file"));
}

#[test]
fn test_unknown_tld_needs_server() {
    let home = tempdir().unwrap();
    let output = home.path().join("out.txt");

    domain_scan(&home)
        .args(["-l", "1", "-c", "digits", "-m", "all", "-t", "zz"])
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--server"));

    assert!(!output.exists());
}

#[test]
fn test_env_tld_and_cli_override() {
    let home = tempdir().unwrap();

    domain_scan(&home)
        .env("DS_TLD", "ch")
        .args(["-l", "1", "-c", "digits", "-m", "all", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.ch"));

    domain_scan(&home)
        .env("DS_TLD", "ch")
        .args(["-l", "1", "-c", "digits", "-m", "all", "-t", "li", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.li"))
        .stdout(predicate::str::contains(".ch").not());
}

#[test]
fn test_config_file_defaults_apply() {
    let home = tempdir().unwrap();
    let config = home.path().join("scan.toml");
    fs::write(&config, "[defaults]\nchars = \"digits\"\ntld = \"ch\"\n").unwrap();

    domain_scan(&home)
        .args(["-l", "1", "-m", "all", "--dry-run", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stderr(predicate::str::contains("10 domains would be checked"))
        .stdout(predicate::str::contains("9.ch"));
}

#[test]
fn test_local_config_file_discovered() {
    let home = tempdir().unwrap();
    fs::write(
        home.path().join("domain-scan.toml"),
        "[defaults]\nchars = \"digits\"\n",
    )
    .unwrap();

    domain_scan(&home)
        .args(["-l", "1", "-m", "all", "--dry-run"])
        .assert()
        .success()
        .stderr(predicate::str::contains("10 domains would be checked"));
}

#[test]
fn test_invalid_config_file_fails() {
    let home = tempdir().unwrap();
    let config = home.path().join("bad.toml");
    fs::write(&config, "[defaults]\nchars = \"emoji\"\n").unwrap();

    domain_scan(&home)
        .args(["-l", "1", "-m", "all", "--dry-run", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
