//! Game record schema shared by the store and the session
//!
//! Records are stored as camelCase JSON documents. Optional fields default at
//! the deserialization boundary (missing scores are 0, missing racks are
//! empty, a missing board is empty) so call sites never patch them up.

use crate::game::board::SparseBoard;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A player's identity: their handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Short shareable code identifying a game. Doubles as the invitation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Created, second seat still empty
    #[default]
    Waiting,
    Active,
    Finished,
}

impl GameStatus {
    /// Stored form, matching the serialized name
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Waiting => "waiting",
            GameStatus::Active => "active",
            GameStatus::Finished => "finished",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GameStatus::Waiting => "Waiting for opponent",
            GameStatus::Active => "Active",
            GameStatus::Finished => "Finished",
        }
    }
}

/// Which of the two seats a player occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    One,
    Two,
}

/// The persisted state of one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    #[serde(default)]
    pub id: GameId,
    pub player1: PlayerId,
    #[serde(default)]
    pub player2: Option<PlayerId>,
    #[serde(default)]
    pub board: SparseBoard,
    #[serde(default)]
    pub player1_letters: Vec<char>,
    #[serde(default)]
    pub player2_letters: Vec<char>,
    #[serde(default)]
    pub player1_score: u32,
    #[serde(default)]
    pub player2_score: u32,
    pub current_turn: PlayerId,
    #[serde(default)]
    pub status: GameStatus,
    /// Store-assigned update time (ms since epoch), strictly increasing per game
    #[serde(default)]
    pub updated_at: i64,
}

impl GameRecord {
    /// A fresh game with only the creator seated; the creator moves first.
    pub fn new(id: GameId, creator: PlayerId, letters: Vec<char>) -> Self {
        Self {
            id,
            current_turn: creator.clone(),
            player1: creator,
            player2: None,
            board: SparseBoard::new(),
            player1_letters: letters,
            player2_letters: Vec::new(),
            player1_score: 0,
            player2_score: 0,
            status: GameStatus::Waiting,
            updated_at: 0,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn seat_of(&self, player: &PlayerId) -> Option<Seat> {
        if &self.player1 == player {
            Some(Seat::One)
        } else if self.player2.as_ref() == Some(player) {
            Some(Seat::Two)
        } else {
            None
        }
    }

    pub fn player(&self, seat: Seat) -> Option<&PlayerId> {
        match seat {
            Seat::One => Some(&self.player1),
            Seat::Two => self.player2.as_ref(),
        }
    }

    pub fn letters(&self, seat: Seat) -> &[char] {
        match seat {
            Seat::One => &self.player1_letters,
            Seat::Two => &self.player2_letters,
        }
    }

    pub fn score(&self, seat: Seat) -> u32 {
        match seat {
            Seat::One => self.player1_score,
            Seat::Two => self.player2_score,
        }
    }

    /// The other seated player, if the second seat is filled.
    pub fn opponent_of(&self, player: &PlayerId) -> Option<&PlayerId> {
        match self.seat_of(player)? {
            Seat::One => self.player2.as_ref(),
            Seat::Two => Some(&self.player1),
        }
    }

    pub fn is_turn_of(&self, player: &PlayerId) -> bool {
        &self.current_turn == player
    }

    pub fn is_finished(&self) -> bool {
        self.status == GameStatus::Finished
    }
}

/// A partial update: only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player2: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<SparseBoard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player1_letters: Option<Vec<char>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player2_letters: Option<Vec<char>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player1_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player2_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_turn: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<GameStatus>,
}

impl GameUpdate {
    pub fn is_empty(&self) -> bool {
        self == &GameUpdate::default()
    }

    /// Set the rack for one seat.
    pub fn with_letters(mut self, seat: Seat, letters: Vec<char>) -> Self {
        match seat {
            Seat::One => self.player1_letters = Some(letters),
            Seat::Two => self.player2_letters = Some(letters),
        }
        self
    }

    /// Set the score for one seat.
    pub fn with_score(mut self, seat: Seat, score: u32) -> Self {
        match seat {
            Seat::One => self.player1_score = Some(score),
            Seat::Two => self.player2_score = Some(score),
        }
        self
    }

    /// Write the present fields into `record`. `updated_at` is left to the store.
    pub fn apply_to(&self, record: &mut GameRecord) {
        if let Some(player2) = &self.player2 {
            record.player2 = Some(player2.clone());
        }
        if let Some(board) = &self.board {
            record.board = board.clone();
        }
        if let Some(letters) = &self.player1_letters {
            record.player1_letters = letters.clone();
        }
        if let Some(letters) = &self.player2_letters {
            record.player2_letters = letters.clone();
        }
        if let Some(score) = self.player1_score {
            record.player1_score = score;
        }
        if let Some(score) = self.player2_score {
            record.player2_score = score;
        }
        if let Some(turn) = &self.current_turn {
            record.current_turn = turn.clone();
        }
        if let Some(status) = self.status {
            record.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> PlayerId {
        PlayerId::new("alice")
    }

    fn bob() -> PlayerId {
        PlayerId::new("bob")
    }

    #[test]
    fn test_missing_fields_default() {
        let record = GameRecord::from_json(r#"{"player1":"alice","currentTurn":"alice"}"#).unwrap();
        assert_eq!(record.player1, alice());
        assert_eq!(record.player2, None);
        assert!(record.board.is_empty());
        assert_eq!(record.player1_score, 0);
        assert_eq!(record.player2_score, 0);
        assert!(record.player2_letters.is_empty());
        assert_eq!(record.status, GameStatus::Waiting);
    }

    #[test]
    fn test_required_fields_enforced() {
        assert!(GameRecord::from_json(r#"{"player1":"alice"}"#).is_err());
    }

    #[test]
    fn test_wire_shape() {
        let mut record = GameRecord::new(GameId::new("ABC123"), alice(), vec!['א', 'ב']);
        record.board.insert("0,1".to_string(), 'ש');
        record.status = GameStatus::Active;

        let value: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(value["board"]["0,1"], "ש");
        assert_eq!(value["player1Letters"], serde_json::json!(["א", "ב"]));
        assert_eq!(value["currentTurn"], "alice");
        assert_eq!(value["status"], "active");

        assert_eq!(GameRecord::from_json(&record.to_json().unwrap()).unwrap(), record);
    }

    #[test]
    fn test_seats_and_opponents() {
        let mut record = GameRecord::new(GameId::new("G"), alice(), Vec::new());
        assert_eq!(record.seat_of(&alice()), Some(Seat::One));
        assert_eq!(record.seat_of(&bob()), None);
        assert_eq!(record.opponent_of(&alice()), None);

        record.player2 = Some(bob());
        assert_eq!(record.seat_of(&bob()), Some(Seat::Two));
        assert_eq!(record.opponent_of(&alice()), Some(&bob()));
        assert_eq!(record.opponent_of(&bob()), Some(&alice()));
        assert!(record.is_turn_of(&alice()));
    }

    #[test]
    fn test_partial_update_touches_only_present_fields() {
        let mut record = GameRecord::new(GameId::new("G"), alice(), vec!['א']);
        record.player2_score = 7;

        let update = GameUpdate {
            current_turn: Some(bob()),
            ..GameUpdate::default()
        }
        .with_score(Seat::One, 10);
        update.apply_to(&mut record);

        assert_eq!(record.player1_score, 10);
        assert_eq!(record.player2_score, 7);
        assert_eq!(record.current_turn, bob());
        assert_eq!(record.player1_letters, vec!['א']);
    }

    #[test]
    fn test_update_serializes_only_present_fields() {
        let update = GameUpdate::default().with_letters(Seat::Two, vec!['ת']);
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"player2Letters":["ת"]}"#
        );
        assert!(GameUpdate::default().is_empty());
        assert!(!update.is_empty());
    }
}
