//! Application screen state management
//!
//! Handles transitions between different application screens:
//! - Main menu
//! - Join-by-code entry
//! - List of the player's games
//! - Playing a game
//! - Error display

use crate::error::TurnError;
use crate::game::board::{Position, BOARD_SIZE};
use crate::game::dictionary::Dictionary;
use crate::game::validation::TurnEvaluation;
use crate::storage::{GameId, GameRecord, Storage, GAME_CODE_LEN};
use std::sync::mpsc::Receiver;
use tracing::warn;

use super::state::{GameSession, SessionEvent};

/// Menu option on the main screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    NewGame,
    JoinGame,
    MyGames,
    Quit,
}

impl MenuOption {
    /// Get all menu options in order
    pub fn all() -> &'static [MenuOption] {
        &[
            MenuOption::NewGame,
            MenuOption::JoinGame,
            MenuOption::MyGames,
            MenuOption::Quit,
        ]
    }

    /// Get the display label for this option
    pub fn label(&self) -> &'static str {
        match self {
            MenuOption::NewGame => "New Game",
            MenuOption::JoinGame => "Join by Code",
            MenuOption::MyGames => "My Games",
            MenuOption::Quit => "Quit",
        }
    }
}

/// Cursor movement as seen on screen. The board is drawn right to left, so
/// `Left` moves toward higher column indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Per-game UI state while playing
#[derive(Debug, Clone, Default)]
pub struct PlayView {
    pub cursor: (usize, usize),
    pub rack_selected: usize,
    /// Pending tile picked up and waiting to be dropped
    pub held: Option<(usize, usize)>,
    /// Result of the last preview or rejected commit
    pub evaluation: Option<TurnEvaluation>,
    pub message: Option<String>,
}

/// The current application screen
pub enum Screen {
    /// Main menu
    Menu { selected: usize },
    /// Typing a game code to join
    JoinCode { input: String },
    /// The player's games, newest first
    GameList {
        games: Vec<GameRecord>,
        selected: usize,
    },
    /// Playing the open game
    Playing { view: PlayView },
    /// Something failed outside a game
    Error { message: String },
}

/// Main application coordinator
pub struct AppCoordinator {
    /// Current screen
    pub screen: Screen,
    pub session: GameSession,
    storage: Storage,
    subscription: Option<Receiver<GameRecord>>,
    /// Whether the application should quit
    pub should_quit: bool,
}

impl AppCoordinator {
    /// Create a new app coordinator starting at the menu
    pub fn new(storage: Storage, session: GameSession) -> Self {
        Self {
            screen: Screen::Menu { selected: 0 },
            session,
            storage,
            subscription: None,
            should_quit: false,
        }
    }

    /// Quit the application
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Go back to the main menu, closing any open game
    pub fn go_to_menu(&mut self) {
        self.session.close();
        self.subscription = None;
        self.screen = Screen::Menu { selected: 0 };
    }

    /// Esc: leave the current screen
    pub fn back(&mut self) {
        if let Screen::Playing { view } = &mut self.screen {
            if view.held.take().is_some() {
                return;
            }
        }
        if matches!(self.screen, Screen::Menu { .. }) {
            self.quit();
        } else {
            self.go_to_menu();
        }
    }

    pub fn set_dictionary(&mut self, dictionary: Dictionary) {
        self.session.set_dictionary(dictionary);
    }

    /// Handle menu navigation (up)
    pub fn menu_up(&mut self) {
        match &mut self.screen {
            Screen::Menu { selected } | Screen::GameList { selected, .. } => {
                *selected = selected.saturating_sub(1);
            }
            _ => {}
        }
    }

    /// Handle menu navigation (down)
    pub fn menu_down(&mut self) {
        match &mut self.screen {
            Screen::Menu { selected } => {
                if *selected < MenuOption::all().len() - 1 {
                    *selected += 1;
                }
            }
            Screen::GameList { selected, games } => {
                if *selected < games.len().saturating_sub(1) {
                    *selected += 1;
                }
            }
            _ => {}
        }
    }

    /// Handle menu selection (Enter)
    pub fn menu_select(&mut self) {
        let selected = match &self.screen {
            Screen::Menu { selected } => *selected,
            _ => return,
        };

        match MenuOption::all()[selected] {
            MenuOption::NewGame => {
                let letters = self.session.draw_rack();
                match self.storage.create_game(self.session.me(), letters) {
                    Ok(record) => self.open_game(record),
                    Err(e) => self.show_error(e.to_string()),
                }
            }
            MenuOption::JoinGame => {
                self.screen = Screen::JoinCode {
                    input: String::new(),
                };
            }
            MenuOption::MyGames => match self.storage.list_games(self.session.me()) {
                Ok(games) => self.screen = Screen::GameList { games, selected: 0 },
                Err(e) => self.show_error(e.to_string()),
            },
            MenuOption::Quit => self.quit(),
        }
    }

    /// Code entry character input
    pub fn code_char(&mut self, c: char) {
        if let Screen::JoinCode { input } = &mut self.screen {
            if c.is_ascii_alphanumeric() && input.len() < GAME_CODE_LEN {
                input.push(c.to_ascii_uppercase());
            }
        }
    }

    /// Code entry backspace
    pub fn code_backspace(&mut self) {
        if let Screen::JoinCode { input } = &mut self.screen {
            input.pop();
        }
    }

    /// Join the game whose code has been typed
    pub fn code_submit(&mut self) {
        let code = match &self.screen {
            Screen::JoinCode { input } if input.len() == GAME_CODE_LEN => input.clone(),
            _ => return,
        };

        let letters = self.session.draw_rack();
        match self
            .storage
            .join_game(&GameId::new(code), self.session.me(), letters)
        {
            Ok(record) => self.open_game(record),
            Err(e) => self.show_error(e.to_string()),
        }
    }

    /// Open the highlighted game from the list
    pub fn list_select(&mut self) {
        let record = match &self.screen {
            Screen::GameList { games, selected } => match games.get(*selected) {
                Some(record) => record.clone(),
                None => return,
            },
            _ => return,
        };
        self.open_game(record);
    }

    /// Move the board cursor
    pub fn move_cursor(&mut self, direction: Direction) {
        if let Screen::Playing { view } = &mut self.screen {
            let (row, col) = &mut view.cursor;
            match direction {
                Direction::Up => *row = row.saturating_sub(1),
                Direction::Down => *row = (*row + 1).min(BOARD_SIZE - 1),
                Direction::Left => *col = (*col + 1).min(BOARD_SIZE - 1),
                Direction::Right => *col = col.saturating_sub(1),
            }
        }
    }

    /// Change the highlighted rack letter by `delta`, wrapping around
    pub fn select_rack(&mut self, delta: isize) {
        let len = self.session.rack().map_or(0, |r| r.len());
        if let Screen::Playing { view } = &mut self.screen {
            view.rack_selected = step(view.rack_selected, delta, len);
        }
    }

    /// Move the highlighted rack letter by `delta`
    pub fn shift_rack(&mut self, delta: isize) {
        let Screen::Playing { view } = &mut self.screen else {
            return;
        };
        let len = self.session.rack().map_or(0, |r| r.len());
        let from = view.rack_selected;
        let Some(to) = from.checked_add_signed(delta).filter(|to| *to < len) else {
            return;
        };
        match self.session.reorder_rack(from, to) {
            Ok(()) => view.rack_selected = to,
            Err(e) => report(view, e),
        }
    }

    /// Enter while playing: drop a held tile, pick up a pending one, or place
    /// the highlighted rack letter on an empty cell.
    pub fn activate(&mut self) {
        let Screen::Playing { view } = &mut self.screen else {
            return;
        };
        let (row, col) = view.cursor;

        if let Some(from) = view.held.take() {
            if from != (row, col) {
                if let Err(e) = self.session.move_tile(from, (row, col)) {
                    report(view, e);
                }
            }
            return;
        }

        let pending = self
            .session
            .board()
            .zip(Position::new(row, col).ok())
            .is_some_and(|(board, pos)| board.is_pending(pos));
        if pending {
            view.held = Some((row, col));
            return;
        }

        match self.session.place_from_rack(view.rack_selected, row, col) {
            Ok(()) => {
                let len = self.session.rack().map_or(0, |r| r.len());
                view.rack_selected = view.rack_selected.min(len.saturating_sub(1));
                view.message = None;
            }
            Err(e) => report(view, e),
        }
    }

    /// Backspace while playing: send the tile under the cursor back to the rack
    pub fn return_tile(&mut self) {
        if let Screen::Playing { view } = &mut self.screen {
            let (row, col) = view.cursor;
            view.held = None;
            if let Err(e) = self.session.return_to_rack(row, col) {
                report(view, e);
            }
        }
    }

    /// Show the verdict on the words formed so far
    pub fn preview(&mut self) {
        if let Screen::Playing { view } = &mut self.screen {
            match self.session.evaluate() {
                Ok(evaluation) => {
                    view.message = Some(evaluation.message());
                    view.evaluation = Some(evaluation);
                }
                Err(e) => report(view, e),
            }
        }
    }

    pub fn finish_turn(&mut self) {
        if let Screen::Playing { view } = &mut self.screen {
            view.held = None;
            match self.session.finish_turn(&self.storage) {
                Ok(events) => {
                    view.evaluation = None;
                    announce(view, &events);
                }
                Err(e) => report(view, e),
            }
        }
    }

    pub fn retry_commit(&mut self) {
        if let Screen::Playing { view } = &mut self.screen {
            match self.session.retry_commit(&self.storage) {
                Ok(events) => announce(view, &events),
                Err(e) => report(view, e),
            }
        }
    }

    pub fn resign(&mut self) {
        if let Screen::Playing { view } = &mut self.screen {
            match self.session.resign(&self.storage) {
                Ok(events) => announce(view, &events),
                Err(e) => report(view, e),
            }
        }
    }

    /// Pick up changes to the open game (call regularly)
    pub fn poll(&mut self) {
        let Screen::Playing { view } = &mut self.screen else {
            return;
        };

        let mut incoming: Vec<GameRecord> = self
            .subscription
            .as_ref()
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default();

        // Commits from other processes sharing the database
        if let Some(record) = self.session.record() {
            match self.storage.changed_since(&record.id, record.updated_at) {
                Ok(Some(newer)) => incoming.push(newer),
                Ok(None) => {}
                Err(e) => warn!(game = %record.id, error = %e, "polling for changes failed"),
            }
        }

        for record in incoming {
            match self.session.apply_remote(record) {
                Ok(events) => announce(view, &events),
                Err(e) => report(view, e),
            }
        }
    }

    fn open_game(&mut self, record: GameRecord) {
        let id = record.id.clone();
        match self.session.open(record) {
            Ok(()) => {
                self.subscription = Some(self.storage.subscribe(&id));
                self.screen = Screen::Playing {
                    view: PlayView {
                        cursor: (0, BOARD_SIZE - 1),
                        message: Some(format!("Game code {}", id)),
                        ..PlayView::default()
                    },
                };
            }
            Err(e) => self.show_error(e.to_string()),
        }
    }

    fn show_error(&mut self, message: String) {
        warn!(%message, "showing error screen");
        self.screen = Screen::Error { message };
    }
}

fn report(view: &mut PlayView, error: TurnError) {
    if let TurnError::ValidationRejected(evaluation) = &error {
        view.evaluation = Some(evaluation.clone());
    }
    view.message = Some(error.to_string());
}

fn announce(view: &mut PlayView, events: &[SessionEvent]) {
    for event in events {
        let text = match event {
            SessionEvent::TurnCommitted {
                points,
                score,
                next_turn,
            } => format!("+{} (total {}), {} to play", points, score, next_turn),
            SessionEvent::TurnGained => "Your turn".to_string(),
            SessionEvent::OpponentJoined(player) => format!("{} joined the game", player),
            SessionEvent::GameEnded => "Game over".to_string(),
            SessionEvent::Updated => continue,
        };
        view.message = Some(text);
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (current as isize + delta).rem_euclid(len as isize) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::words::apply_final_form;
    use crate::storage::{GameStatus, GameStore, PlayerId};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn coordinator(name: &str) -> AppCoordinator {
        let storage = Storage::open_in_memory().unwrap();
        let session = GameSession::new(
            PlayerId::new(name),
            Dictionary::load("ים\nבית\n"),
            StdRng::seed_from_u64(11),
        );
        AppCoordinator::new(storage, session)
    }

    fn select(app: &mut AppCoordinator, option: MenuOption) {
        let index = MenuOption::all().iter().position(|o| *o == option).unwrap();
        app.screen = Screen::Menu { selected: index };
        app.menu_select();
    }

    fn view(app: &AppCoordinator) -> &PlayView {
        match &app.screen {
            Screen::Playing { view } => view,
            _ => panic!("not playing"),
        }
    }

    #[test]
    fn test_menu_navigation_bounds() {
        let mut app = coordinator("alice");
        app.menu_up();
        assert!(matches!(app.screen, Screen::Menu { selected: 0 }));
        for _ in 0..10 {
            app.menu_down();
        }
        assert!(matches!(
            app.screen,
            Screen::Menu { selected } if selected == MenuOption::all().len() - 1
        ));
    }

    #[test]
    fn test_new_game_opens_board() {
        let mut app = coordinator("alice");
        select(&mut app, MenuOption::NewGame);

        assert!(matches!(app.screen, Screen::Playing { .. }));
        assert!(app.session.is_my_turn());
        assert_eq!(app.session.rack().unwrap().len(), 8);
        assert_eq!(view(&app).cursor, (0, BOARD_SIZE - 1));
    }

    #[test]
    fn test_join_unknown_code_shows_error() {
        let mut app = coordinator("bob");
        select(&mut app, MenuOption::JoinGame);
        for c in "abc12".chars() {
            app.code_char(c);
        }
        // Too short, nothing happens
        app.code_submit();
        assert!(matches!(&app.screen, Screen::JoinCode { input } if input == "ABC12"));

        app.code_char('3');
        app.code_char('4');
        app.code_submit();
        assert!(matches!(app.screen, Screen::Error { .. }));

        app.back();
        assert!(matches!(app.screen, Screen::Menu { .. }));
    }

    #[test]
    fn test_cursor_moves_right_to_left() {
        let mut app = coordinator("alice");
        select(&mut app, MenuOption::NewGame);

        app.move_cursor(Direction::Left);
        assert_eq!(view(&app).cursor, (0, BOARD_SIZE - 1));
        app.move_cursor(Direction::Right);
        app.move_cursor(Direction::Down);
        assert_eq!(view(&app).cursor, (1, BOARD_SIZE - 2));
        app.move_cursor(Direction::Up);
        app.move_cursor(Direction::Up);
        assert_eq!(view(&app).cursor.0, 0);
    }

    #[test]
    fn test_place_pick_up_and_drop() {
        let mut app = coordinator("alice");
        select(&mut app, MenuOption::NewGame);
        let first = app.session.rack().unwrap().get(0).unwrap();

        app.activate();
        assert_eq!(app.session.rack().unwrap().len(), 7);
        let start = Position::new(0, BOARD_SIZE - 1).unwrap();
        assert_eq!(app.session.board().unwrap().letter_at(start), Some(first));

        // Pick it up and drop it one cell down
        app.activate();
        assert!(view(&app).held.is_some());
        app.move_cursor(Direction::Down);
        app.activate();
        let moved = Position::new(1, BOARD_SIZE - 1).unwrap();
        assert_eq!(app.session.board().unwrap().letter_at(moved), Some(first));
        assert_eq!(app.session.board().unwrap().letter_at(start), None);

        app.return_tile();
        assert_eq!(app.session.rack().unwrap().len(), 8);
    }

    #[test]
    fn test_rejected_turn_shows_evaluation() {
        let mut app = coordinator("alice");
        select(&mut app, MenuOption::NewGame);

        app.activate();
        app.move_cursor(Direction::Right);
        app.activate();
        let board = app.session.board().unwrap().snapshot();
        let word: String = [board.get(0, BOARD_SIZE - 2), board.get(0, BOARD_SIZE - 1)]
            .into_iter()
            .flatten()
            .collect();
        let word = apply_final_form(word);

        app.finish_turn();
        let view = view(&app);
        if word == "ים" {
            assert!(view.evaluation.is_none());
        } else {
            assert!(view.evaluation.as_ref().is_some_and(|e| !e.accepted));
            assert!(view.message.as_deref().unwrap_or("").starts_with("Not in dictionary"));
        }
    }

    #[test]
    fn test_poll_picks_up_opponent_join() {
        let mut app = coordinator("alice");
        select(&mut app, MenuOption::NewGame);
        let id = app.session.record().unwrap().id.clone();

        app.storage
            .join_game(&id, &PlayerId::new("bob"), vec!['א'; 8])
            .unwrap();
        app.poll();

        assert_eq!(view(&app).message.as_deref(), Some("bob joined the game"));
        assert_eq!(app.session.record().unwrap().status, GameStatus::Active);
    }

    #[test]
    fn test_resign_and_list_games() {
        let mut app = coordinator("alice");
        select(&mut app, MenuOption::NewGame);
        app.resign();
        assert_eq!(view(&app).message.as_deref(), Some("Game over"));

        let id = app.session.record().unwrap().id.clone();
        assert!(app.storage.load_game(&id).unwrap().is_finished());

        app.go_to_menu();
        select(&mut app, MenuOption::MyGames);
        match &app.screen {
            Screen::GameList { games, .. } => assert_eq!(games.len(), 1),
            _ => panic!("expected game list"),
        }
        app.list_select();
        assert!(matches!(app.screen, Screen::Playing { .. }));
    }

    #[test]
    fn test_rack_selection_wraps() {
        assert_eq!(step(0, -1, 8), 7);
        assert_eq!(step(7, 1, 8), 0);
        assert_eq!(step(3, 1, 0), 0);
    }
}
