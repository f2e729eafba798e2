//! Game logic: letter supply, racks, board, word extraction, scoring and turn commits

pub mod board;
pub mod dictionary;
pub mod turn;
pub mod validation;
pub mod words;

use once_cell::sync::Lazy;
use rand::Rng;

/// Hebrew letter frequencies (percent of running text, final forms folded
/// into their base letter). Draws never produce a final form; those only
/// appear through the final-letter transform during word extraction.
pub const LETTER_WEIGHTS: [(char, f64); 22] = [
    ('א', 6.3),
    ('ב', 4.7),
    ('ג', 1.3),
    ('ד', 2.6),
    ('ה', 8.7),
    ('ו', 10.4),
    ('ז', 0.9),
    ('ח', 2.3),
    ('ט', 1.2),
    ('י', 11.1),
    ('כ', 4.2),
    ('ל', 7.4),
    ('מ', 8.6),
    ('נ', 4.5),
    ('ס', 1.5),
    ('ע', 3.9),
    ('פ', 1.8),
    ('צ', 1.2),
    ('ק', 1.9),
    ('ר', 5.9),
    ('ש', 4.4),
    ('ת', 5.3),
];

/// Number of letters a rack is topped back up to after each turn.
pub const RACK_CAPACITY: usize = 8;

static HEBREW_TABLE: Lazy<Vec<(char, f64)>> = Lazy::new(|| cumulative_table(&LETTER_WEIGHTS));

/// Build a cumulative table normalized so the last threshold is 1.0.
fn cumulative_table(weights: &[(char, f64)]) -> Vec<(char, f64)> {
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    let mut running = 0.0;
    weights
        .iter()
        .map(|&(letter, weight)| {
            running += weight;
            (letter, running / total)
        })
        .collect()
}

/// Weighted random letter generator.
///
/// Every draw is independent: there is no bag of tiles being depleted, so
/// the supply never runs out.
#[derive(Debug, Clone)]
pub struct LetterSupply {
    table: Vec<(char, f64)>,
    fallback: char,
}

impl Default for LetterSupply {
    fn default() -> Self {
        Self::hebrew()
    }
}

impl LetterSupply {
    /// The standard 22-letter Hebrew supply.
    pub fn hebrew() -> Self {
        Self {
            table: HEBREW_TABLE.clone(),
            fallback: LETTER_WEIGHTS[LETTER_WEIGHTS.len() - 1].0,
        }
    }

    /// Build a supply from a custom weight table.
    /// Returns None if the table is empty or any weight is not strictly positive.
    pub fn with_weights(weights: &[(char, f64)]) -> Option<Self> {
        let (last, _) = *weights.last()?;
        if weights.iter().any(|(_, w)| !w.is_finite() || *w <= 0.0) {
            return None;
        }
        Some(Self {
            table: cumulative_table(weights),
            fallback: last,
        })
    }

    /// Draw `count` letters. A count of zero yields an empty vector.
    pub fn draw<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<char> {
        (0..count).map(|_| self.sample(rng)).collect()
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> char {
        let roll: f64 = rng.random();
        self.table
            .iter()
            .find(|(_, threshold)| *threshold >= roll)
            .map(|(letter, _)| *letter)
            // Rounding can leave the last threshold a hair under 1.0
            .unwrap_or(self.fallback)
    }

    /// Letters this supply can produce, in table order.
    pub fn alphabet(&self) -> impl Iterator<Item = char> + '_ {
        self.table.iter().map(|(letter, _)| *letter)
    }
}

/// A player's rack. Ordered and player-arranged; duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LetterRack {
    letters: Vec<char>,
}

impl LetterRack {
    pub fn new(letters: Vec<char>) -> Self {
        Self { letters }
    }

    /// Draw a full rack from the supply.
    pub fn generate_with_rng<R: Rng + ?Sized>(supply: &LetterSupply, rng: &mut R) -> Self {
        Self::new(supply.draw(RACK_CAPACITY, rng))
    }

    /// Get the letters in the rack.
    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    /// Display the rack as a string.
    pub fn as_string(&self) -> String {
        self.letters.iter().collect()
    }

    pub fn get(&self, index: usize) -> Option<char> {
        self.letters.get(index).copied()
    }

    /// Remove and return the letter at `index`.
    pub fn take(&mut self, index: usize) -> Option<char> {
        if index < self.letters.len() {
            Some(self.letters.remove(index))
        } else {
            None
        }
    }

    /// Put a letter back at the end of the rack.
    pub fn push(&mut self, letter: char) {
        self.letters.push(letter);
    }

    /// Move the letter at `from` so it sits at `to`. Returns false on a bad index.
    pub fn move_letter(&mut self, from: usize, to: usize) -> bool {
        if from >= self.letters.len() || to >= self.letters.len() {
            return false;
        }
        let letter = self.letters.remove(from);
        self.letters.insert(to, letter);
        true
    }

    /// Top the rack up to [`RACK_CAPACITY`]. A rack already at or above
    /// capacity is left untouched. Returns how many letters were drawn.
    pub fn replenish<R: Rng + ?Sized>(&mut self, supply: &LetterSupply, rng: &mut R) -> usize {
        let needed = RACK_CAPACITY.saturating_sub(self.letters.len());
        self.letters.extend(supply.draw(needed, rng));
        needed
    }
}
