//! Dictionary module for word validation
//!
//! A session-owned set of valid words loaded from a newline-delimited list.
//! Lookups are exact: words are compared as stored, including final letter
//! forms. A small starter list is embedded at build time so the game is
//! playable without an external word list.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

/// Embedded starter wordlist, one word per line, final forms already applied.
static WORDS_DATA: &str = include_str!("../../data/words.txt");

/// An immutable-once-loaded set of valid words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    words: HashSet<String>,
}

impl Dictionary {
    /// An empty dictionary. Every lookup misses until words are loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from newline-delimited text. Lines are trimmed, blank lines
    /// dropped, duplicates collapse.
    pub fn load(source: &str) -> Self {
        Self {
            words: source
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Build from any buffered reader with the same line rules as [`Dictionary::load`].
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut words = HashSet::new();
        for line in reader.lines() {
            let line = line?;
            let word = line.trim();
            if !word.is_empty() {
                words.insert(word.to_string());
            }
        }
        Ok(Self { words })
    }

    /// Read a word list from disk.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read `path` if given, falling back to the embedded list when the file
    /// can't be read or holds no words. An empty result would never become
    /// ready, so it counts as a failed load.
    pub fn from_path_or_embedded(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::embedded();
        };
        match Self::from_path(path) {
            Ok(dictionary) if dictionary.is_empty() => {
                warn!(path = %path.display(), "dictionary file has no words, using built-in list");
                Self::embedded()
            }
            Ok(dictionary) => {
                info!(path = %path.display(), words = dictionary.len(), "loaded dictionary");
                dictionary
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "could not read dictionary, using built-in list"
                );
                Self::embedded()
            }
        }
    }

    /// The starter list compiled into the binary.
    pub fn embedded() -> Self {
        Self::load(WORDS_DATA)
    }

    /// Exact membership test.
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Returns the total number of words in the dictionary
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Loading has finished once at least one word is present.
    pub fn is_ready(&self) -> bool {
        !self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_load_trims_and_skips_blank_lines() {
        let dict = Dictionary::load("  שלום \n\n\tבית\n   \nשלום\n");
        assert_eq!(dict.len(), 2);
        assert!(dict.contains("שלום"));
        assert!(dict.contains("בית"));
    }

    #[test]
    fn test_exact_match_only() {
        let dict = Dictionary::load("שלום\n");
        // Same word without the final mem is a different string
        assert!(!dict.contains("שלומ"));
        assert!(!dict.contains("שלו"));
        assert!(!dict.contains(""));
    }

    #[test]
    fn test_empty_dictionary_is_not_ready() {
        let dict = Dictionary::new();
        assert!(!dict.is_ready());
        assert!(!dict.contains("בית"));
    }

    #[test]
    fn test_from_reader_matches_load() {
        let text = "ילד\r\nילדה\n\nספר\n";
        let from_reader = Dictionary::from_reader(Cursor::new(text)).unwrap();
        assert_eq!(from_reader, Dictionary::load(text));
        assert!(from_reader.contains("ילד"));
    }

    #[test]
    fn test_embedded_list_loads() {
        let dict = Dictionary::embedded();
        assert!(dict.is_ready());
        assert!(dict.contains("שלום"));
        assert!(dict.contains("מים"));
        assert!(dict.contains("ים"));
    }

    #[test]
    fn test_from_path_missing_file() {
        assert!(Dictionary::from_path("/nonexistent/otiyot/words.txt").is_err());
    }

    fn temp_word_list(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("otiyot-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_blank_word_list_falls_back_to_embedded() {
        let path = temp_word_list("blank.txt", "\n   \n\t\n");
        let dict = Dictionary::from_path_or_embedded(Some(&path));
        std::fs::remove_file(&path).unwrap();

        assert!(dict.is_ready());
        assert_eq!(dict, Dictionary::embedded());
    }

    #[test]
    fn test_word_list_file_used_when_it_has_words() {
        let path = temp_word_list("small.txt", "בית\nים\n");
        let dict = Dictionary::from_path_or_embedded(Some(&path));
        std::fs::remove_file(&path).unwrap();

        assert_eq!(dict, Dictionary::load("בית\nים\n"));
    }

    #[test]
    fn test_missing_or_absent_word_list_uses_embedded() {
        let missing = Path::new("/nonexistent/otiyot/words.txt");
        assert_eq!(Dictionary::from_path_or_embedded(Some(missing)), Dictionary::embedded());
        assert_eq!(Dictionary::from_path_or_embedded(None), Dictionary::embedded());
    }
}
