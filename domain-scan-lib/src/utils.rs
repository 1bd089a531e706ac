//! Utility functions for domain label validation and formatting.

use crate::error::ScanError;

/// Validate a TLD given without the leading dot (e.g. "li").
pub fn validate_tld(tld: &str) -> Result<(), ScanError> {
    let tld = tld.trim();

    if tld.is_empty() {
        return Err(ScanError::config("TLD cannot be empty"));
    }

    if tld.starts_with('-') || tld.ends_with('-') {
        return Err(ScanError::config(format!(
            "Invalid TLD '{}': cannot start or end with a hyphen",
            tld
        )));
    }

    if !tld.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ScanError::config(format!(
            "Invalid TLD '{}': use letters, digits and hyphens only, without the leading dot",
            tld
        )));
    }

    Ok(())
}

/// Whether a domain body is usable as a hostname label.
///
/// Candidates only ever contain characters from their charset, so the
/// remaining rule is that a label cannot start or end with a hyphen.
pub fn is_valid_label(body: &str) -> bool {
    !body.is_empty() && !body.starts_with('-') && !body.ends_with('-')
}

/// Join a body and a TLD into a fully qualified domain name.
pub fn qualify(body: &str, tld: &str) -> String {
    format!("{}.{}", body, tld.trim().trim_start_matches('.'))
}

/// Whether `text` contains `min_run` or more identical consecutive characters.
pub fn has_run(text: &str, min_run: usize) -> bool {
    if min_run <= 1 {
        return !text.is_empty();
    }

    let mut run = 0usize;
    let mut previous = None;
    for c in text.chars() {
        if Some(c) == previous {
            run += 1;
        } else {
            run = 1;
            previous = Some(c);
        }
        if run >= min_run {
            return true;
        }
    }
    false
}
