//! Candidate pipeline: strategies → merge → label filter.
//!
//! A [`CandidatePlan`] is built once from a validated [`ScanConfig`] and can
//! produce a fresh [`Candidates`] stream any number of times, each one
//! identical for the same configuration and word lists.

use crate::error::ScanError;
use crate::generate::{
    combination_count, open_word_list, AllCombos, RepeatsPattern, WordFilter,
    LARGE_SCAN_THRESHOLD,
};
use crate::merge::Merger;
use crate::types::{Charset, ScanConfig, Strategy};
use crate::utils::is_valid_label;
use std::path::PathBuf;
use tracing::debug;

/// A boxed candidate source, one per strategy.
pub type CandidateSource = Box<dyn Iterator<Item = String>>;

/// Everything needed to (re)build the candidate stream for a scan.
#[derive(Debug, Clone)]
pub struct CandidatePlan {
    length: usize,
    charset: Charset,
    min_repeats: usize,
    strategies: Vec<Strategy>,
    dict_file: Option<PathBuf>,
    pinyin_dict_file: Option<PathBuf>,
}

impl CandidatePlan {
    /// Build a plan from a configuration, validating it first.
    ///
    /// Strategies keep their selection order; repeated selections are
    /// collapsed to the first occurrence.
    pub fn from_config(config: &ScanConfig) -> Result<Self, ScanError> {
        config.validate()?;

        let mut strategies = Vec::with_capacity(config.strategies.len());
        for strategy in &config.strategies {
            if !strategies.contains(strategy) {
                strategies.push(*strategy);
            }
        }

        Ok(Self {
            length: config.length,
            charset: config.charset,
            min_repeats: config.min_repeats,
            strategies,
            dict_file: config.dict_file.clone(),
            pinyin_dict_file: config.pinyin_dict_file.clone(),
        })
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Build the source for one strategy.
    ///
    /// Word-list strategies open their file here, so a missing or unreadable
    /// file is reported before anything is queried.
    pub fn source(&self, strategy: Strategy) -> Result<CandidateSource, ScanError> {
        let source: CandidateSource = match strategy {
            Strategy::All => Box::new(AllCombos::new(self.charset, self.length)),
            Strategy::Repeats => Box::new(RepeatsPattern::new(
                self.charset,
                self.length,
                self.min_repeats,
            )),
            Strategy::Dict => {
                let path = self.dict_file.as_ref().ok_or_else(|| {
                    ScanError::config("The 'dict' method requires --dict-file")
                })?;
                Box::new(WordFilter::new(
                    open_word_list(path)?,
                    self.charset,
                    self.length,
                ))
            }
            Strategy::Pinyin => {
                let path = self.pinyin_dict_file.as_ref().ok_or_else(|| {
                    ScanError::config("The 'pinyin' method requires --pinyin-dict-file")
                })?;
                Box::new(WordFilter::new(
                    open_word_list(path)?,
                    self.charset,
                    self.length,
                ))
            }
        };
        debug!(strategy = %strategy, "Candidate source ready");
        Ok(source)
    }

    /// Build a fresh candidate stream over all selected strategies.
    pub fn candidates(&self) -> Result<Candidates, ScanError> {
        let sources = self
            .strategies
            .iter()
            .map(|strategy| self.source(*strategy))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Candidates {
            merger: Merger::new(sources),
            rejected: 0,
        })
    }

    /// Upper bound on the number of generated candidates.
    ///
    /// `None` when only word lists are selected (their size is unknown
    /// without reading them) or when the bound overflows.
    pub fn estimated_count(&self) -> Option<u128> {
        let generated = self
            .strategies
            .iter()
            .any(|s| matches!(s, Strategy::All | Strategy::Repeats));
        if !generated {
            return None;
        }
        combination_count(self.charset.chars().len(), self.length)
    }

    /// Whether the generated space exceeds [`LARGE_SCAN_THRESHOLD`].
    pub fn is_large(&self) -> bool {
        let generated = self
            .strategies
            .iter()
            .any(|s| matches!(s, Strategy::All | Strategy::Repeats));
        generated
            && self
                .estimated_count()
                .map_or(true, |count| count > LARGE_SCAN_THRESHOLD)
    }
}

/// The merged, deduplicated, label-filtered candidate stream.
pub struct Candidates {
    merger: Merger<CandidateSource>,
    rejected: usize,
}

impl Candidates {
    /// Candidates dropped because they start or end with a hyphen.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Candidates dropped because an earlier source already produced them.
    pub fn duplicates(&self) -> usize {
        self.merger.duplicates()
    }
}

impl Iterator for Candidates {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        for candidate in self.merger.by_ref() {
            if is_valid_label(&candidate) {
                return Some(candidate);
            }
            self.rejected += 1;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn word_file(words: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", words.join("\n")).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_all_then_repeats_dedup() {
        let config = ScanConfig::new(2, vec![Strategy::All, Strategy::Repeats])
            .with_charset(Charset::Digits);
        let plan = CandidatePlan::from_config(&config).unwrap();
        let mut candidates = plan.candidates().unwrap();
        let names: Vec<String> = candidates.by_ref().collect();
        assert_eq!(names.len(), 100);
        assert_eq!(candidates.duplicates(), 10);
    }

    #[test]
    fn test_dict_before_all_keeps_dict_order() {
        let words = word_file(&["zz", "ab", "toolong", "a1"]);
        let config = ScanConfig::new(2, vec![Strategy::Dict, Strategy::All])
            .with_charset(Charset::Letters)
            .with_dict_file(words.path());
        let plan = CandidatePlan::from_config(&config).unwrap();
        let names: Vec<String> = plan.candidates().unwrap().collect();

        assert_eq!(&names[..3], &["zz", "ab", "aa"]);
        assert_eq!(names.len(), 26 * 26);
        assert_eq!(names.iter().filter(|n| *n == "zz").count(), 1);
    }

    #[test]
    fn test_hyphen_edges_filtered() {
        let config = ScanConfig::new(2, vec![Strategy::All]).with_charset(Charset::DigitsHyphen);
        let plan = CandidatePlan::from_config(&config).unwrap();
        let mut candidates = plan.candidates().unwrap();
        let names: Vec<String> = candidates.by_ref().collect();
        // 11 * 11 = 121 raw, minus 21 with a hyphen at either edge
        assert_eq!(names.len(), 100);
        assert_eq!(candidates.rejected(), 21);
        assert!(names.iter().all(|n| !n.starts_with('-') && !n.ends_with('-')));
    }

    #[test]
    fn test_repeated_strategy_selection_collapsed() {
        let config = ScanConfig::new(1, vec![Strategy::All, Strategy::All])
            .with_charset(Charset::Digits);
        let plan = CandidatePlan::from_config(&config).unwrap();
        assert_eq!(plan.strategies(), &[Strategy::All]);
    }

    #[test]
    fn test_restartable() {
        let words = word_file(&["ni", "hao", "ma", "ni"]);
        let config = ScanConfig::new(2, vec![Strategy::Pinyin, Strategy::Repeats])
            .with_charset(Charset::Letters)
            .with_pinyin_dict_file(words.path());
        let plan = CandidatePlan::from_config(&config).unwrap();

        let first: Vec<String> = plan.candidates().unwrap().collect();
        let second: Vec<String> = plan.candidates().unwrap().collect();
        assert_eq!(first, second);
        assert_eq!(&first[..3], &["ni", "ma", "aa"]);
        assert_eq!(first.len(), 2 + 26);
    }

    #[test]
    fn test_missing_dict_file_fails_before_streaming() {
        let config = ScanConfig::new(3, vec![Strategy::All, Strategy::Dict])
            .with_dict_file("/no/such/dictionary");
        let plan = CandidatePlan::from_config(&config).unwrap();
        assert!(matches!(
            plan.candidates(),
            Err(ScanError::FileError { .. })
        ));
    }

    #[test]
    fn test_estimates() {
        let config = ScanConfig::new(3, vec![Strategy::All]).with_charset(Charset::Digits);
        let plan = CandidatePlan::from_config(&config).unwrap();
        assert_eq!(plan.estimated_count(), Some(1000));
        assert!(!plan.is_large());

        let config = ScanConfig::new(5, vec![Strategy::Repeats]);
        let plan = CandidatePlan::from_config(&config).unwrap();
        assert!(plan.is_large());

        let config = ScanConfig::new(5, vec![Strategy::Dict]);
        let plan = CandidatePlan::from_config(&config).unwrap();
        assert_eq!(plan.estimated_count(), None);
        assert!(!plan.is_large());
    }
}
