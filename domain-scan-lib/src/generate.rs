//! Candidate generation strategies.
//!
//! Every generator here is a lazy iterator of domain bodies. Nothing is
//! materialized up front, so memory use does not depend on the size of the
//! candidate space.
//!
//! - [`AllCombos`]: every string of a given length over a charset
//! - [`RepeatsPattern`]: strings containing a run of repeated characters
//! - [`WordFilter`] over [`WordLines`]: dictionary and pinyin word lists
//!
//! # Examples
//!
//! ```
//! use domain_scan_lib::generate::{AllCombos, RepeatsPattern};
//! use domain_scan_lib::Charset;
//!
//! let all: Vec<String> = AllCombos::new(Charset::Digits, 2).collect();
//! assert_eq!(all.len(), 100);
//! assert_eq!(all[0], "00");
//! assert_eq!(all[99], "99");
//!
//! let repeats: Vec<String> = RepeatsPattern::new(Charset::Digits, 2, 2).collect();
//! assert_eq!(repeats.len(), 10); // "00", "11", ... "99"
//! ```

use crate::error::ScanError;
use crate::types::Charset;
use crate::utils::has_run;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::rc::Rc;
use tracing::warn;

/// Candidate spaces larger than this trigger a warning (never a hard stop).
pub const LARGE_SCAN_THRESHOLD: u128 = 1_000_000;

/// Number of strings of `length` characters over an alphabet of `alphabet_size`.
///
/// Returns `None` if the count does not fit in a `u128`.
pub fn combination_count(alphabet_size: usize, length: usize) -> Option<u128> {
    let mut count: u128 = 1;
    for _ in 0..length {
        count = count.checked_mul(alphabet_size as u128)?;
    }
    Some(count)
}

/// Mixed-radix counter over position indices.
///
/// Each position is a digit indexing into `alphabet`; the rightmost position
/// turns fastest, so output is lexicographic in alphabet order. Zero
/// positions yield exactly one empty string.
#[derive(Debug, Clone)]
struct Odometer {
    alphabet: Rc<[char]>,
    counters: Vec<usize>,
    done: bool,
}

impl Odometer {
    fn new(alphabet: Rc<[char]>, positions: usize) -> Self {
        let done = alphabet.is_empty() && positions > 0;
        Self {
            alphabet,
            counters: vec![0; positions],
            done,
        }
    }
}

impl Iterator for Odometer {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }

        let current: String = self.counters.iter().map(|&i| self.alphabet[i]).collect();

        // Increment odometer (rightmost first); wrapping every digit means we are done
        self.done = true;
        for i in (0..self.counters.len()).rev() {
            self.counters[i] += 1;
            if self.counters[i] < self.alphabet.len() {
                self.done = false;
                break;
            }
            self.counters[i] = 0;
        }

        Some(current)
    }
}

/// Every string of `length` characters over a charset, in lexicographic order.
#[derive(Debug, Clone)]
pub struct AllCombos {
    odometer: Odometer,
}

impl AllCombos {
    pub fn new(charset: Charset, length: usize) -> Self {
        let count = combination_count(charset.chars().len(), length);
        if count.map_or(true, |c| c > LARGE_SCAN_THRESHOLD) {
            warn!(
                charset = %charset,
                length,
                "Exhaustive generation covers {} candidates; this will take a long time",
                count.map_or_else(|| "more than 2^128".to_string(), |c| c.to_string())
            );
        }

        Self {
            odometer: Odometer::new(charset.chars().into(), length),
        }
    }
}

impl Iterator for AllCombos {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.odometer.next()
    }
}

/// Strings of `length` characters over a charset that contain at least one
/// run of `min_repeats` or more identical consecutive characters.
///
/// Each string is built from its leftmost qualifying run: a block of
/// `min_repeats` copies of one character at position `start`, a prefix that
/// holds no qualifying run and does not end in the block character, and an
/// unconstrained suffix. That decomposition is unique per string, so every
/// matching string is produced exactly once without a membership set.
pub struct RepeatsPattern {
    inner: Box<dyn Iterator<Item = String>>,
}

impl RepeatsPattern {
    pub fn new(charset: Charset, length: usize, min_repeats: usize) -> Self {
        let min_repeats = min_repeats.max(1);
        if min_repeats > length {
            return Self {
                inner: Box::new(std::iter::empty()),
            };
        }

        let alphabet: Rc<[char]> = charset.chars().into();
        let inner = (0..=length - min_repeats).flat_map(move |start| {
            let alphabet = Rc::clone(&alphabet);
            let suffix_len = length - start - min_repeats;

            (0..alphabet.len()).flat_map(move |index| {
                let block_char = alphabet[index];
                let block: String = std::iter::repeat(block_char).take(min_repeats).collect();
                let suffix_alphabet = Rc::clone(&alphabet);

                Odometer::new(Rc::clone(&alphabet), start)
                    .filter(move |prefix| {
                        !prefix.ends_with(block_char) && !has_run(prefix, min_repeats)
                    })
                    .flat_map(move |prefix| {
                        let block = block.clone();
                        Odometer::new(Rc::clone(&suffix_alphabet), suffix_len)
                            .map(move |suffix| format!("{}{}{}", prefix, block, suffix))
                    })
            })
        });

        Self {
            inner: Box::new(inner),
        }
    }
}

impl Iterator for RepeatsPattern {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.inner.next()
    }
}

/// Lines of a word list, trimmed, with invalid UTF-8 replaced.
///
/// Reading stops (with a warning) at the first I/O error.
pub struct WordLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> WordLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for WordLines<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => Some(String::from_utf8_lossy(&self.buf).trim().to_string()),
            Err(e) => {
                warn!("Stopped reading word list: {}", e);
                None
            }
        }
    }
}

/// Open a word list file for lazy reading.
///
/// Fails up front if the file is missing, unreadable or not a regular file,
/// so a scan never starts with a broken source.
pub fn open_word_list<P: AsRef<Path>>(path: P) -> Result<WordLines<BufReader<File>>, ScanError> {
    let path = path.as_ref();
    let shown = path.display().to_string();

    let metadata = std::fs::metadata(path)
        .map_err(|e| ScanError::file_error(&shown, format!("Cannot read word list: {}", e)))?;
    if !metadata.is_file() {
        return Err(ScanError::file_error(&shown, "Word list is not a regular file"));
    }

    let file = File::open(path)
        .map_err(|e| ScanError::file_error(&shown, format!("Cannot open word list: {}", e)))?;

    Ok(WordLines::new(BufReader::new(file)))
}

/// Keeps the words that fit a candidate: exactly `length` characters, each
/// (after lowercasing) in the charset. Order follows the source; a word
/// repeated in the source is emitted once.
pub struct WordFilter<I> {
    words: I,
    charset: Charset,
    length: usize,
    seen: HashSet<String>,
}

impl<I: Iterator<Item = String>> WordFilter<I> {
    pub fn new(words: I, charset: Charset, length: usize) -> Self {
        Self {
            words,
            charset,
            length,
            seen: HashSet::new(),
        }
    }
}

impl<I: Iterator<Item = String>> Iterator for WordFilter<I> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        for word in self.words.by_ref() {
            let word = word.trim().to_lowercase();
            if word.chars().count() != self.length {
                continue;
            }
            if !word.chars().all(|c| self.charset.contains(c)) {
                continue;
            }
            if self.seen.insert(word.clone()) {
                return Some(word);
            }
        }
        None
    }
}
