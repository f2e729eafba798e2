//! Game session state
//!
//! `GameSession` is the context object a front end owns for one local
//! player. It holds the open game's board, the player's rack and the
//! turn-start snapshot, and reports what happened through returned
//! [`SessionEvent`]s rather than callbacks.

use crate::error::TurnError;
use crate::game::board::{Board, LetterGrid, PlacementError};
use crate::game::dictionary::Dictionary;
use crate::game::turn::{self, TurnCommit};
use crate::game::validation::{self, TurnEvaluation};
use crate::game::{LetterRack, LetterSupply, RACK_CAPACITY};
use crate::storage::{GameRecord, GameStore, PlayerId};
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

/// Something the front end should react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Our turn was saved
    TurnCommitted {
        points: u32,
        score: u32,
        next_turn: PlayerId,
    },
    /// The turn just passed to us
    TurnGained,
    /// Someone took the second seat
    OpponentJoined(PlayerId),
    GameEnded,
    /// The record changed in some other way (scores, racks)
    Updated,
}

/// The game currently open in a session
#[derive(Debug, Clone)]
struct OpenGame {
    record: GameRecord,
    board: Board,
    rack: LetterRack,
    /// Board letters when our turn began; None while it is not our turn
    turn_start: Option<LetterGrid>,
    /// Prepared but not yet stored
    pending_commit: Option<TurnCommit>,
}

/// Per-player game context
pub struct GameSession {
    me: PlayerId,
    dictionary: Dictionary,
    supply: LetterSupply,
    rng: StdRng,
    game: Option<OpenGame>,
}

impl GameSession {
    /// A session with no game open.
    pub fn new(me: PlayerId, dictionary: Dictionary, rng: StdRng) -> Self {
        Self {
            me,
            dictionary,
            supply: LetterSupply::hebrew(),
            rng,
            game: None,
        }
    }

    pub fn me(&self) -> &PlayerId {
        &self.me
    }

    /// Install a dictionary once it has finished loading.
    pub fn set_dictionary(&mut self, dictionary: Dictionary) {
        info!(words = dictionary.len(), "dictionary ready");
        self.dictionary = dictionary;
    }

    pub fn dictionary_ready(&self) -> bool {
        self.dictionary.is_ready()
    }

    /// A fresh full rack, for creating or joining a game.
    pub fn draw_rack(&mut self) -> Vec<char> {
        self.supply.draw(RACK_CAPACITY, &mut self.rng)
    }

    /// Make `record` the open game, replacing any previous one.
    pub fn open(&mut self, record: GameRecord) -> Result<(), TurnError> {
        let seat = record.seat_of(&self.me).ok_or(TurnError::NotSeated)?;
        let board = Board::from_sparse_map(&record.board)?;
        let rack = LetterRack::new(record.letters(seat).to_vec());
        let turn_start = record.is_turn_of(&self.me).then(|| board.snapshot());

        info!(
            game = %record.id,
            player = %self.me,
            my_turn = turn_start.is_some(),
            "opened game"
        );
        self.game = Some(OpenGame {
            record,
            board,
            rack,
            turn_start,
            pending_commit: None,
        });
        Ok(())
    }

    /// Close the open game.
    pub fn close(&mut self) {
        self.game = None;
    }

    pub fn is_open(&self) -> bool {
        self.game.is_some()
    }

    pub fn record(&self) -> Option<&GameRecord> {
        self.game.as_ref().map(|g| &g.record)
    }

    pub fn board(&self) -> Option<&Board> {
        self.game.as_ref().map(|g| &g.board)
    }

    pub fn rack(&self) -> Option<&LetterRack> {
        self.game.as_ref().map(|g| &g.rack)
    }

    pub fn turn_start(&self) -> Option<&LetterGrid> {
        self.game.as_ref().and_then(|g| g.turn_start.as_ref())
    }

    pub fn is_my_turn(&self) -> bool {
        self.record().is_some_and(|r| r.is_turn_of(&self.me))
    }

    /// True while a prepared commit failed to save and awaits a retry.
    pub fn has_unsaved_commit(&self) -> bool {
        self.game.as_ref().is_some_and(|g| g.pending_commit.is_some())
    }

    /// Take the letter at `rack_index` and put it on the board.
    pub fn place_from_rack(
        &mut self,
        rack_index: usize,
        row: usize,
        col: usize,
    ) -> Result<(), TurnError> {
        let game = self.game_for_move()?;
        let letter = game
            .rack
            .get(rack_index)
            .ok_or(PlacementError::RackIndex { index: rack_index })?;
        game.board.place(row, col, letter)?;
        game.rack.take(rack_index);
        Ok(())
    }

    /// Move a tile placed this turn.
    pub fn move_tile(&mut self, from: (usize, usize), to: (usize, usize)) -> Result<(), TurnError> {
        let game = self.game_for_move()?;
        game.board.move_tile(from.0, from.1, to.0, to.1)?;
        Ok(())
    }

    /// Send a tile placed this turn back to the end of the rack.
    pub fn return_to_rack(&mut self, row: usize, col: usize) -> Result<char, TurnError> {
        let game = self.game_for_move()?;
        let letter = game.board.return_to_rack(row, col)?;
        game.rack.push(letter);
        Ok(letter)
    }

    /// Send every tile placed this turn back to the rack.
    pub fn recall_all(&mut self) -> Result<usize, TurnError> {
        let game = self.game_for_move()?;
        let letters = game.board.take_pending();
        let count = letters.len();
        for letter in letters {
            game.rack.push(letter);
        }
        Ok(count)
    }

    /// Rearrange the rack.
    pub fn reorder_rack(&mut self, from: usize, to: usize) -> Result<(), TurnError> {
        let game = self.game_for_move()?;
        if game.rack.move_letter(from, to) {
            Ok(())
        } else {
            let index = if from >= game.rack.len() { from } else { to };
            Err(PlacementError::RackIndex { index }.into())
        }
    }

    /// Check the words formed so far without committing anything.
    pub fn evaluate(&self) -> Result<TurnEvaluation, TurnError> {
        let game = self.game.as_ref().ok_or(TurnError::NoActiveGame)?;
        let evaluation = validation::evaluate(
            &game.board.snapshot(),
            game.turn_start.as_ref(),
            &self.dictionary,
        )?;
        Ok(evaluation)
    }

    /// Validate, score and store the turn in progress.
    ///
    /// A rejected turn changes nothing. Once the words pass, the board and
    /// rack are updated locally before the store is called; if the store
    /// fails they stay that way and [`GameSession::retry_commit`] resends
    /// the same update.
    pub fn finish_turn<S: GameStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> Result<Vec<SessionEvent>, TurnError> {
        self.game_for_move()?;
        let evaluation = self.evaluate()?;
        if !evaluation.accepted {
            warn!(
                player = %self.me,
                invalid = ?evaluation.invalid_words().collect::<Vec<_>>(),
                "turn rejected"
            );
            return Err(TurnError::ValidationRejected(evaluation));
        }

        let me = self.me.clone();
        let game = self.game.as_mut().ok_or(TurnError::NoActiveGame)?;
        let commit = turn::commit_turn(
            &game.record,
            &me,
            &evaluation,
            &mut game.board,
            &mut game.rack,
            &self.supply,
            &mut self.rng,
        )?;
        game.pending_commit = Some(commit);
        self.send_pending(store)
    }

    /// Resend a commit whose store call failed.
    pub fn retry_commit<S: GameStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> Result<Vec<SessionEvent>, TurnError> {
        let game = self.game.as_ref().ok_or(TurnError::NoActiveGame)?;
        if game.pending_commit.is_none() {
            return Err(TurnError::NothingToRetry);
        }
        self.send_pending(store)
    }

    /// End the game now. Refused while an unsaved commit waits for a retry.
    pub fn resign<S: GameStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> Result<Vec<SessionEvent>, TurnError> {
        let game = self.game.as_mut().ok_or(TurnError::NoActiveGame)?;
        if game.pending_commit.is_some() {
            return Err(TurnError::CommitPending);
        }
        let update = turn::resign(&game.record, &self.me)?;
        let record = store.update_game(&game.record.id, &update, None)?;
        info!(game = %record.id, player = %self.me, "resigned");
        game.record = record;
        game.turn_start = None;
        game.board.take_pending();
        Ok(vec![SessionEvent::GameEnded])
    }

    /// Fold in a record observed from the store (a subscription or a poll).
    ///
    /// Records for other games and records no newer than the one we hold are
    /// ignored. While the turn stays ours the local board and rack are kept,
    /// so tiles placed mid-turn survive an opponent joining, and an unsaved
    /// commit is rebuilt against the newer record.
    pub fn apply_remote(&mut self, record: GameRecord) -> Result<Vec<SessionEvent>, TurnError> {
        let me = self.me.clone();
        let game = self.game.as_mut().ok_or(TurnError::NoActiveGame)?;
        if record.id != game.record.id || record.updated_at <= game.record.updated_at {
            return Ok(Vec::new());
        }
        let seat = record.seat_of(&me).ok_or(TurnError::NotSeated)?;

        let mut events = Vec::new();
        if game.record.player2.is_none() {
            if let Some(opponent) = &record.player2 {
                events.push(SessionEvent::OpponentJoined(opponent.clone()));
            }
        }

        let was_mine = game.record.is_turn_of(&me) && !game.record.is_finished();
        let is_mine = record.is_turn_of(&me) && !record.is_finished();

        if was_mine && is_mine {
            if let Some(commit) = &game.pending_commit {
                let rebased = turn::rebase_commit(&record, &me, commit, &game.board, &game.rack)?;
                debug!(game = %record.id, next = %rebased.next_turn, "rebased unsaved commit");
                game.pending_commit = Some(rebased);
            }
        } else {
            game.board = Board::from_sparse_map(&record.board)?;
            game.rack = LetterRack::new(record.letters(seat).to_vec());
            game.turn_start = is_mine.then(|| game.board.snapshot());
            game.pending_commit = None;
        }

        if is_mine && !was_mine {
            events.push(SessionEvent::TurnGained);
        }
        if record.is_finished() && !game.record.is_finished() {
            events.push(SessionEvent::GameEnded);
        }
        if events.is_empty() {
            events.push(SessionEvent::Updated);
        }

        debug!(
            game = %record.id,
            updated_at = record.updated_at,
            ?events,
            "applied remote record"
        );
        game.record = record;
        Ok(events)
    }

    fn send_pending<S: GameStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> Result<Vec<SessionEvent>, TurnError> {
        let me = self.me.clone();
        let game = self.game.as_mut().ok_or(TurnError::NoActiveGame)?;
        let commit = game.pending_commit.clone().ok_or(TurnError::NothingToRetry)?;
        if game.record.is_finished() {
            game.pending_commit = None;
            return Err(TurnError::GameFinished);
        }

        let record = match store.update_game(&game.record.id, &commit.update, None) {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    game = %game.record.id,
                    error = %e,
                    "turn commit failed, keeping it for retry"
                );
                return Err(TurnError::Persistence(e));
            }
        };

        info!(
            game = %record.id,
            player = %me,
            points = commit.points,
            score = commit.score,
            next = %commit.next_turn,
            "turn committed"
        );

        let still_mine = record.is_turn_of(&me) && !record.is_finished();
        game.turn_start = still_mine.then(|| game.board.snapshot());
        game.pending_commit = None;

        let mut events = vec![SessionEvent::TurnCommitted {
            points: commit.points,
            score: commit.score,
            next_turn: commit.next_turn.clone(),
        }];
        if record.is_finished() {
            events.push(SessionEvent::GameEnded);
        }
        game.record = record;
        Ok(events)
    }

    /// The open game, provided the local player may change the board now.
    fn game_for_move(&mut self) -> Result<&mut OpenGame, TurnError> {
        let game = self.game.as_mut().ok_or(TurnError::NoActiveGame)?;
        if game.pending_commit.is_some() {
            return Err(TurnError::CommitPending);
        }
        if game.record.is_finished() {
            return Err(TurnError::GameFinished);
        }
        if !game.record.is_turn_of(&self.me) {
            return Err(TurnError::NotYourTurn);
        }
        Ok(game)
    }
}
