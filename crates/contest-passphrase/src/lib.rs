//! Word-list passphrase generator.
//!
//! Produces human-memorable passwords by joining randomly chosen dictionary
//! words with a delimiter, e.g. `maple-orbit-tulip-cargo`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;

/// Built-in English word list, one word per line.
///
/// Drawn from the BIP-39 English list and the medium petname lists.
const BUILTIN_WORDS: &str = include_str!("words.txt");

/// Shortest word accepted into a passphrase.
pub const MIN_WORD_LENGTH: usize = 4;

/// Longest word accepted into a passphrase.
pub const MAX_WORD_LENGTH: usize = 6;

/// Delimiter placed between words.
pub const DELIMITER: char = '-';

/// Errors that can occur when building a word list
#[derive(Debug, thiserror::Error)]
pub enum PassphraseError {
    #[error("Failed to read word file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Word list has no words between {min} and {max} characters")]
    NoUsableWords { min: usize, max: usize },
}

/// Passphrase generator over a filtered word list
#[derive(Debug, Clone)]
pub struct Generator {
    words: Vec<String>,
}

impl Generator {
    /// Generator over the built-in word list
    pub fn builtin() -> Result<Self, PassphraseError> {
        Self::from_words(BUILTIN_WORDS.lines())
    }

    /// Generator over a word file (one word per line)
    pub fn from_word_file(path: &Path) -> Result<Self, PassphraseError> {
        let contents = fs::read_to_string(path).map_err(|source| PassphraseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_words(contents.lines())
    }

    /// Build a generator from arbitrary words.
    ///
    /// Words are trimmed and lowercased. Anything outside
    /// [`MIN_WORD_LENGTH`]..=[`MAX_WORD_LENGTH`] characters, or containing
    /// non-alphabetic characters (possessives, hyphenation), is dropped.
    pub fn from_words<I, S>(words: I) -> Result<Self, PassphraseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filtered: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| {
                let len = w.chars().count();
                (MIN_WORD_LENGTH..=MAX_WORD_LENGTH).contains(&len)
                    && w.chars().all(|c| c.is_alphabetic())
            })
            .collect();
        filtered.sort();
        filtered.dedup();

        if filtered.is_empty() {
            return Err(PassphraseError::NoUsableWords {
                min: MIN_WORD_LENGTH,
                max: MAX_WORD_LENGTH,
            });
        }

        Ok(Self { words: filtered })
    }

    /// Number of candidate words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the word list is empty (never true for a constructed generator)
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Generate a passphrase of `num_words` words using the given RNG
    pub fn generate_with<R: Rng + ?Sized>(&self, num_words: usize, rng: &mut R) -> String {
        let mut out = String::new();
        for i in 0..num_words {
            if i > 0 {
                out.push(DELIMITER);
            }
            // words is never empty, see from_words
            if let Some(word) = self.words.choose(rng) {
                out.push_str(word);
            }
        }
        out
    }

    /// Generate a passphrase of `num_words` words using the thread RNG
    pub fn generate(&self, num_words: usize) -> String {
        self.generate_with(num_words, &mut rand::thread_rng())
    }
}
