//! Word extraction
//!
//! A word is any maximal run of two or more adjacent letters along a row or a
//! column. Rows are scanned from the last column to the first, following the
//! right-to-left script, so each horizontal run is reversed before it is
//! emitted; the emitted string runs in ascending column order (column 0 is
//! drawn rightmost). Columns are scanned top to bottom and need no reversal.
//! Every emitted word gets the final-letter transform.

use super::board::{LetterGrid, BOARD_SIZE};

/// Shortest run that counts as a word.
pub const MIN_WORD_LENGTH: usize = 2;

/// The word-final glyph for the five letters that have one.
pub fn final_form(letter: char) -> Option<char> {
    match letter {
        'כ' => Some('ך'),
        'מ' => Some('ם'),
        'נ' => Some('ן'),
        'פ' => Some('ף'),
        'צ' => Some('ץ'),
        _ => None,
    }
}

/// Replace a trailing letter with its final form, if it has one.
pub fn apply_final_form(mut word: String) -> String {
    if let Some(last) = word.pop() {
        word.push(final_form(last).unwrap_or(last));
    }
    word
}

/// Every horizontal and vertical word on the grid: rows first, then columns.
///
/// The same cell may contribute to one horizontal and one vertical word.
pub fn extract_words(grid: &LetterGrid) -> Vec<String> {
    let mut words = Vec::new();
    let mut run = Vec::with_capacity(BOARD_SIZE);

    for row in 0..BOARD_SIZE {
        for col in (0..BOARD_SIZE).rev() {
            match grid.get(row, col) {
                Some(letter) => run.push(letter),
                None => flush_run(&mut run, true, &mut words),
            }
        }
        flush_run(&mut run, true, &mut words);
    }

    for col in 0..BOARD_SIZE {
        for row in 0..BOARD_SIZE {
            match grid.get(row, col) {
                Some(letter) => run.push(letter),
                None => flush_run(&mut run, false, &mut words),
            }
        }
        flush_run(&mut run, false, &mut words);
    }

    words
}

fn flush_run(run: &mut Vec<char>, reverse: bool, words: &mut Vec<String>) {
    if run.len() >= MIN_WORD_LENGTH {
        let word: String = if reverse {
            run.iter().rev().collect()
        } else {
            run.iter().collect()
        };
        words.push(apply_final_form(word));
    }
    run.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::{Board, Position};
    use proptest::collection::btree_map;
    use proptest::prelude::*;

    fn grid_with(cells: &[(usize, usize, char)]) -> LetterGrid {
        let mut grid = LetterGrid::empty();
        for &(row, col, letter) in cells {
            grid.set(Position::new(row, col).unwrap(), Some(letter));
        }
        grid
    }

    #[test]
    fn test_empty_grid_has_no_words() {
        assert!(extract_words(&LetterGrid::empty()).is_empty());
    }

    #[test]
    fn test_single_letter_is_not_a_word() {
        let grid = grid_with(&[(4, 4, 'א')]);
        assert!(extract_words(&grid).is_empty());
    }

    #[test]
    fn test_horizontal_word_in_column_order() {
        // ש at column 0 (rightmost on screen), then ל, ו, מ
        let grid = grid_with(&[(0, 0, 'ש'), (0, 1, 'ל'), (0, 2, 'ו'), (0, 3, 'מ')]);
        assert_eq!(extract_words(&grid), vec!["שלום".to_string()]);
    }

    #[test]
    fn test_vertical_word_top_to_bottom() {
        let grid = grid_with(&[(2, 5, 'ב'), (3, 5, 'י'), (4, 5, 'ת')]);
        assert_eq!(extract_words(&grid), vec!["בית".to_string()]);
    }

    #[test]
    fn test_final_form_only_on_last_letter() {
        let grid = grid_with(&[(0, 0, 'מ'), (0, 1, 'י'), (0, 2, 'מ')]);
        assert_eq!(extract_words(&grid), vec!["מים".to_string()]);

        let grid = grid_with(&[(0, 0, 'כ'), (1, 0, 'נ'), (2, 0, 'פ')]);
        assert_eq!(extract_words(&grid), vec!["כנף".to_string()]);
    }

    #[test]
    fn test_runs_split_on_gaps_and_edges() {
        // Two runs in row 0 separated by an empty cell; the right-hand run
        // (higher columns) is found first by the right-to-left scan.
        let grid = grid_with(&[(0, 0, 'י'), (0, 1, 'ם'), (0, 3, 'א'), (0, 4, 'ב')]);
        assert_eq!(extract_words(&grid), vec!["אב".to_string(), "ים".to_string()]);

        let grid = grid_with(&[(9, 8, 'ג'), (9, 9, 'ן')]);
        assert_eq!(extract_words(&grid), vec!["גן".to_string()]);
    }

    #[test]
    fn test_cross_shares_a_letter() {
        // ב-י-ת across row 1, and ד-י vertically through the shared י
        let grid = grid_with(&[(1, 0, 'ב'), (1, 1, 'י'), (1, 2, 'ת'), (0, 1, 'ד')]);
        let words = extract_words(&grid);
        assert_eq!(words, vec!["בית".to_string(), "די".to_string()]);
    }

    #[test]
    fn test_final_form_helpers() {
        assert_eq!(final_form('נ'), Some('ן'));
        assert_eq!(final_form('א'), None);
        assert_eq!(apply_final_form(String::new()), "");
        assert_eq!(apply_final_form("ספר".to_string()), "ספר");
        assert_eq!(apply_final_form("עצ".to_string()), "עץ");
    }

    fn letter() -> impl Strategy<Value = char> {
        proptest::sample::select(vec!['א', 'ב', 'כ', 'מ', 'נ', 'פ', 'צ', 'ש', 'ת'])
    }

    proptest! {
        #[test]
        fn prop_no_short_runs_and_pure(
            cells in btree_map((0..BOARD_SIZE, 0..BOARD_SIZE), letter(), 0..60)
        ) {
            let mut board = Board::new();
            for (&(row, col), &l) in &cells {
                board.place(row, col, l).unwrap();
            }
            let grid = board.snapshot();
            let first = extract_words(&grid);
            for word in &first {
                prop_assert!(word.chars().count() >= MIN_WORD_LENGTH);
            }
            prop_assert_eq!(&first, &extract_words(&grid));
            prop_assert_eq!(&first, &extract_words(&board.snapshot()));
        }
    }
}
