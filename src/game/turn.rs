//! Turn commit protocol
//!
//! Turns an accepted evaluation into the single update that gets persisted:
//! the acting player's new score, their topped-up rack, the next turn holder,
//! the game status and the board with this turn's tiles locked in. No score
//! is authoritative anywhere else; the acting client computes it here.

use super::board::Board;
use super::validation::TurnEvaluation;
use super::{LetterRack, LetterSupply};
use crate::storage::{GameRecord, GameStatus, GameUpdate, PlayerId, Seat};
use rand::Rng;
use thiserror::Error;
use tracing::debug;

/// Why a commit could not be prepared. Nothing is mutated when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    #[error("the turn has invalid words and cannot be committed")]
    Rejected,
    #[error("{0} is not seated in this game")]
    NotSeated(PlayerId),
    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),
    #[error("the game is finished")]
    GameFinished,
}

/// A prepared commit. `update` is what gets sent to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnCommit {
    pub update: GameUpdate,
    /// The acting player's cumulative score after this turn
    pub score: u32,
    pub points: u32,
    pub next_turn: PlayerId,
    pub status: GameStatus,
    /// Letters drawn to refill the rack
    pub drawn: usize,
    /// Tiles locked on the board
    pub locked: usize,
}

/// Apply an accepted evaluation: score, refill `rack`, pick the next turn
/// holder, lock the board's pending tiles, and build the persisted update.
///
/// `rack` is the acting player's rack with this turn's placed letters
/// already removed.
pub fn commit_turn<R: Rng + ?Sized>(
    record: &GameRecord,
    actor: &PlayerId,
    evaluation: &TurnEvaluation,
    board: &mut Board,
    rack: &mut LetterRack,
    supply: &LetterSupply,
    rng: &mut R,
) -> Result<TurnCommit, CommitError> {
    let seat = check_can_act(record, actor)?;
    if !evaluation.accepted {
        return Err(CommitError::Rejected);
    }

    let drawn = rack.replenish(supply, rng);
    let locked = board.lock_all_pending();
    let commit = TurnCommit {
        drawn,
        locked,
        ..build_commit(record, actor, seat, evaluation.total_score, board, rack)
    };

    debug!(
        game = %record.id,
        player = %actor,
        points = commit.points,
        drawn,
        locked,
        next = %commit.next_turn,
        "prepared turn commit"
    );
    Ok(commit)
}

/// Rebuild an unsaved commit against a newer record of the same game.
///
/// `board` and `rack` are what the original commit left behind, so nothing
/// is drawn or locked again. Turn order, status and the other seat's rack
/// and score are taken from `record`.
pub fn rebase_commit(
    record: &GameRecord,
    actor: &PlayerId,
    commit: &TurnCommit,
    board: &Board,
    rack: &LetterRack,
) -> Result<TurnCommit, CommitError> {
    let seat = check_can_act(record, actor)?;
    Ok(TurnCommit {
        drawn: commit.drawn,
        locked: commit.locked,
        ..build_commit(record, actor, seat, commit.points, board, rack)
    })
}

fn build_commit(
    record: &GameRecord,
    actor: &PlayerId,
    seat: Seat,
    points: u32,
    board: &Board,
    rack: &LetterRack,
) -> TurnCommit {
    let score = record.score(seat) + points;

    // Until someone takes the second seat the creator keeps playing
    let (next_turn, mut status) = match record.opponent_of(actor) {
        Some(opponent) => (opponent.clone(), GameStatus::Active),
        None => (actor.clone(), GameStatus::Waiting),
    };
    if board.is_full() {
        status = GameStatus::Finished;
    }

    let other = match seat {
        Seat::One => Seat::Two,
        Seat::Two => Seat::One,
    };
    let update = GameUpdate {
        board: Some(board.to_sparse_map()),
        current_turn: Some(next_turn.clone()),
        status: Some(status),
        ..GameUpdate::default()
    }
    .with_letters(seat, rack.letters().to_vec())
    .with_letters(other, record.letters(other).to_vec())
    .with_score(seat, score)
    .with_score(other, record.score(other));

    TurnCommit {
        update,
        score,
        points,
        next_turn,
        status,
        drawn: 0,
        locked: 0,
    }
}

/// Update that ends the game at `actor`'s request.
pub fn resign(record: &GameRecord, actor: &PlayerId) -> Result<GameUpdate, CommitError> {
    if record.seat_of(actor).is_none() {
        return Err(CommitError::NotSeated(actor.clone()));
    }
    if record.is_finished() {
        return Err(CommitError::GameFinished);
    }
    Ok(GameUpdate {
        status: Some(GameStatus::Finished),
        ..GameUpdate::default()
    })
}

/// The actor's seat, provided they may move right now.
pub fn check_can_act(record: &GameRecord, actor: &PlayerId) -> Result<Seat, CommitError> {
    let seat = record
        .seat_of(actor)
        .ok_or_else(|| CommitError::NotSeated(actor.clone()))?;
    if record.is_finished() {
        return Err(CommitError::GameFinished);
    }
    if !record.is_turn_of(actor) {
        return Err(CommitError::NotYourTurn(actor.clone()));
    }
    Ok(seat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::BOARD_SIZE;
    use crate::game::validation::{WordResult, WordVerdict};
    use crate::game::RACK_CAPACITY;
    use crate::storage::GameId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn alice() -> PlayerId {
        PlayerId::new("alice")
    }

    fn bob() -> PlayerId {
        PlayerId::new("bob")
    }

    fn accepted(points: u32) -> TurnEvaluation {
        TurnEvaluation {
            words: vec![WordResult {
                word: "בית".to_string(),
                verdict: WordVerdict::Valid { points },
            }],
            total_score: points,
            accepted: true,
        }
    }

    fn active_game() -> GameRecord {
        let mut record = GameRecord::new(GameId::new("G1"), alice(), vec!['א'; 8]);
        record.player2 = Some(bob());
        record.player2_letters = vec!['ב'; 8];
        record.player1_score = 10;
        record.player2_score = 6;
        record.status = GameStatus::Active;
        record
    }

    #[test]
    fn test_commit_passes_turn_in_active_game() {
        let record = active_game();
        let mut board = Board::new();
        board.place(0, 0, 'ב').unwrap();
        board.place(0, 1, 'י').unwrap();
        board.place(0, 2, 'ת').unwrap();
        let mut rack = LetterRack::new(vec!['ש'; 5]);
        let mut rng = StdRng::seed_from_u64(1);

        let commit = commit_turn(
            &record,
            &alice(),
            &accepted(4),
            &mut board,
            &mut rack,
            &LetterSupply::hebrew(),
            &mut rng,
        )
        .unwrap();

        assert_eq!(commit.score, 14);
        assert_eq!(commit.drawn, 3);
        assert_eq!(commit.locked, 3);
        assert_eq!(commit.next_turn, bob());
        assert_eq!(commit.status, GameStatus::Active);
        assert!(!board.has_pending());

        let update = &commit.update;
        assert_eq!(update.player1_score, Some(14));
        assert_eq!(update.player2_score, Some(6));
        assert_eq!(update.current_turn, Some(bob()));
        assert_eq!(update.player2_letters, Some(vec!['ב'; 8]));
        assert_eq!(update.board.as_ref().map(|b| b.len()), Some(3));

        let letters = update.player1_letters.clone().unwrap();
        assert_eq!(letters.len(), RACK_CAPACITY);
        assert_eq!(&letters[..5], &['ש'; 5]);
    }

    #[test]
    fn test_commit_keeps_turn_while_waiting() {
        let record = GameRecord::new(GameId::new("G2"), alice(), vec!['א'; 8]);
        let mut board = Board::new();
        let mut rack = LetterRack::new(vec!['א'; 8]);
        let mut rng = StdRng::seed_from_u64(2);

        let commit = commit_turn(
            &record,
            &alice(),
            &TurnEvaluation {
                accepted: true,
                ..TurnEvaluation::default()
            },
            &mut board,
            &mut rack,
            &LetterSupply::hebrew(),
            &mut rng,
        )
        .unwrap();

        assert_eq!(commit.next_turn, alice());
        assert_eq!(commit.status, GameStatus::Waiting);
        assert_eq!(commit.drawn, 0);
        assert_eq!(commit.score, 0);
    }

    #[test]
    fn test_rebase_after_opponent_joins() {
        let waiting = GameRecord::new(GameId::new("G3"), alice(), vec!['א'; 8]);
        let mut board = Board::new();
        board.place(4, 4, 'ם').unwrap();
        board.place(4, 5, 'י').unwrap();
        let mut rack = LetterRack::new(vec!['א'; 6]);
        let mut rng = StdRng::seed_from_u64(4);

        let commit = commit_turn(
            &waiting,
            &alice(),
            &accepted(2),
            &mut board,
            &mut rack,
            &LetterSupply::hebrew(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(commit.status, GameStatus::Waiting);
        assert_eq!(commit.update.player2_letters, Some(Vec::new()));

        let mut joined = waiting.clone();
        joined.player2 = Some(bob());
        joined.player2_letters = vec!['ב'; 8];
        joined.player2_score = 3;
        joined.status = GameStatus::Active;

        let rebased = rebase_commit(&joined, &alice(), &commit, &board, &rack).unwrap();
        assert_eq!(rebased.next_turn, bob());
        assert_eq!(rebased.status, GameStatus::Active);
        assert_eq!(rebased.score, 2);
        assert_eq!(rebased.drawn, commit.drawn);
        assert_eq!(rebased.locked, 2);

        let update = &rebased.update;
        assert_eq!(update.current_turn, Some(bob()));
        assert_eq!(update.player2_letters, Some(vec!['ב'; 8]));
        assert_eq!(update.player2_score, Some(3));
        assert_eq!(update.player1_letters, commit.update.player1_letters);
        assert_eq!(update.board, commit.update.board);

        let mut passed = joined;
        passed.current_turn = bob();
        assert_eq!(
            rebase_commit(&passed, &alice(), &commit, &board, &rack),
            Err(CommitError::NotYourTurn(alice()))
        );
    }

    #[test]
    fn test_rejected_evaluation_changes_nothing() {
        let record = active_game();
        let mut board = Board::new();
        board.place(4, 4, 'ק').unwrap();
        board.place(4, 5, 'ק').unwrap();
        let before = board.clone();
        let mut rack = LetterRack::new(vec!['א']);
        let mut rng = StdRng::seed_from_u64(3);

        let rejected = TurnEvaluation {
            words: vec![WordResult {
                word: "קק".to_string(),
                verdict: WordVerdict::NotInDictionary,
            }],
            total_score: 0,
            accepted: false,
        };
        let result = commit_turn(
            &record,
            &alice(),
            &rejected,
            &mut board,
            &mut rack,
            &LetterSupply::hebrew(),
            &mut rng,
        );

        assert_eq!(result, Err(CommitError::Rejected));
        assert_eq!(board, before);
        assert_eq!(rack.len(), 1);
    }

    #[test]
    fn test_only_turn_holder_may_commit() {
        let record = active_game();
        let mut rng = StdRng::seed_from_u64(4);
        let result = commit_turn(
            &record,
            &bob(),
            &accepted(2),
            &mut Board::new(),
            &mut LetterRack::default(),
            &LetterSupply::hebrew(),
            &mut rng,
        );
        assert_eq!(result, Err(CommitError::NotYourTurn(bob())));

        let stranger = PlayerId::new("carol");
        assert_eq!(
            check_can_act(&record, &stranger),
            Err(CommitError::NotSeated(stranger))
        );
    }

    #[test]
    fn test_full_board_finishes_game() {
        let record = active_game();
        let mut board = Board::new();
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                board.place(row, col, 'א').unwrap();
            }
        }
        let mut rng = StdRng::seed_from_u64(5);

        let commit = commit_turn(
            &record,
            &alice(),
            &accepted(0),
            &mut board,
            &mut LetterRack::default(),
            &LetterSupply::hebrew(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(commit.status, GameStatus::Finished);
    }

    #[test]
    fn test_resign() {
        let mut record = active_game();
        assert_eq!(
            resign(&record, &bob()).unwrap().status,
            Some(GameStatus::Finished)
        );

        record.status = GameStatus::Finished;
        assert_eq!(resign(&record, &alice()), Err(CommitError::GameFinished));
        assert!(check_can_act(&record, &alice()).is_err());
    }
}
