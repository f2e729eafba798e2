//! Turn validation and scoring
//!
//! Compares the words on the board now against the words that were there
//! when the turn began. Only words that are new this turn are looked up and
//! scored:
//! - A new word is any extracted string absent from the turn-start extraction
//! - Repeated new strings count once
//! - One unknown word rejects the whole turn

use super::board::LetterGrid;
use super::dictionary::Dictionary;
use super::words::extract_words;
use std::collections::HashSet;
use thiserror::Error;

/// Outcome of looking up a single new word
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordVerdict {
    /// Word is in the dictionary and earns points
    Valid { points: u32 },
    /// Word not found in dictionary
    NotInDictionary,
}

/// A new word and its verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordResult {
    pub word: String,
    pub verdict: WordVerdict,
}

impl WordResult {
    pub fn is_valid(&self) -> bool {
        matches!(self.verdict, WordVerdict::Valid { .. })
    }

    /// Points earned, zero for an invalid word
    pub fn points(&self) -> u32 {
        match self.verdict {
            WordVerdict::Valid { points } => points,
            WordVerdict::NotInDictionary => 0,
        }
    }

    /// Returns a user-friendly line for this word
    pub fn message(&self) -> String {
        match self.verdict {
            WordVerdict::Valid { points } => format!("{} +{}", self.word, points),
            WordVerdict::NotInDictionary => format!("{} not in dictionary", self.word),
        }
    }
}

/// Result of evaluating a turn in progress
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnEvaluation {
    /// One entry per distinct new word, in extraction order
    pub words: Vec<WordResult>,
    /// Sum of points; zero whenever the turn is rejected
    pub total_score: u32,
    /// True when every new word is valid (including when there are none)
    pub accepted: bool,
}

impl TurnEvaluation {
    /// Words that blocked the turn
    pub fn invalid_words(&self) -> impl Iterator<Item = &str> {
        self.words
            .iter()
            .filter(|w| !w.is_valid())
            .map(|w| w.word.as_str())
    }

    /// Returns a user-friendly summary
    pub fn message(&self) -> String {
        if self.accepted {
            if self.words.is_empty() {
                "No new words".to_string()
            } else {
                format!("Valid! +{}", self.total_score)
            }
        } else {
            let invalid: Vec<&str> = self.invalid_words().collect();
            format!("Not in dictionary: {}", invalid.join(", "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// Lookups would all miss, which is not the player's fault
    #[error("dictionary is still loading")]
    DictionaryNotReady,
}

/// Points for a dictionary word: two per letter after the first
pub fn word_score(word: &str) -> u32 {
    let len = word.chars().count() as u32;
    len.saturating_sub(1) * 2
}

/// Distinct words on `current` that were not on `turn_start`, in extraction order.
/// A missing snapshot means the first turn of the game, so every word is new.
pub fn new_words(current: &LetterGrid, turn_start: Option<&LetterGrid>) -> Vec<String> {
    let before: HashSet<String> = turn_start
        .map(|grid| extract_words(grid).into_iter().collect())
        .unwrap_or_default();

    let mut seen = HashSet::new();
    extract_words(current)
        .into_iter()
        .filter(|word| !before.contains(word))
        .filter(|word| seen.insert(word.clone()))
        .collect()
}

/// Validate and score the words formed since the turn started
pub fn evaluate(
    current: &LetterGrid,
    turn_start: Option<&LetterGrid>,
    dictionary: &Dictionary,
) -> Result<TurnEvaluation, EvaluationError> {
    if !dictionary.is_ready() {
        return Err(EvaluationError::DictionaryNotReady);
    }

    let words: Vec<WordResult> = new_words(current, turn_start)
        .into_iter()
        .map(|word| {
            let verdict = if dictionary.contains(&word) {
                WordVerdict::Valid {
                    points: word_score(&word),
                }
            } else {
                WordVerdict::NotInDictionary
            };
            WordResult { word, verdict }
        })
        .collect();

    let accepted = words.iter().all(WordResult::is_valid);
    let total_score = if accepted {
        words.iter().map(WordResult::points).sum()
    } else {
        0
    };

    Ok(TurnEvaluation {
        words,
        total_score,
        accepted,
    })
}
