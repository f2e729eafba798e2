//! Otiyot - two-player Hebrew word game in the terminal
//!
//! Share a game code, take turns, spell words on a 10x10 board.

use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use otiyot::app::{AppCoordinator, Direction, GameSession, Screen};
use otiyot::config::Cli;
use otiyot::game::dictionary::Dictionary;
use otiyot::storage::Storage;
use otiyot::tui::{self, Tui};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_path()?)?;

    let storage = Storage::open_at(cli.db_path()?)?;
    let player = cli.resolve_player(storage.handle()?);
    storage.set_handle(player.as_str())?;
    info!(player = %player, seed = ?cli.seed, "starting");

    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    // Words can't be checked until this arrives
    let dictionary_rx = load_dictionary(cli.dictionary.clone());

    let session = GameSession::new(player, Dictionary::new(), rng);
    let mut app = AppCoordinator::new(storage, session);

    let mut terminal = Tui::new()?;
    terminal.enter()?;
    run(&mut terminal, &mut app, dictionary_rx)?;

    info!("exiting");
    // Terminal cleanup happens automatically via Tui::drop
    Ok(())
}

fn run(
    terminal: &mut Tui,
    app: &mut AppCoordinator,
    dictionary_rx: Receiver<Dictionary>,
) -> Result<(), Box<dyn Error>> {
    let tick_rate = Duration::from_millis(500);
    let mut last_tick = Instant::now();
    let mut dictionary_rx = Some(dictionary_rx);

    loop {
        terminal.draw(|frame| tui::render(frame, app))?;

        if let Some(rx) = &dictionary_rx {
            if let Ok(dictionary) = rx.try_recv() {
                app.set_dictionary(dictionary);
                dictionary_rx = None;
            }
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (not release)
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key.code);
                }
            }
        }

        // Opponent moves arrive on the tick
        if last_tick.elapsed() >= tick_rate {
            app.poll();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn handle_key(app: &mut AppCoordinator, code: KeyCode) {
    if code == KeyCode::Esc {
        app.back();
        return;
    }

    match app.screen {
        Screen::Menu { .. } => match code {
            KeyCode::Up => app.menu_up(),
            KeyCode::Down => app.menu_down(),
            KeyCode::Enter => app.menu_select(),
            _ => {}
        },
        Screen::GameList { .. } => match code {
            KeyCode::Up => app.menu_up(),
            KeyCode::Down => app.menu_down(),
            KeyCode::Enter => app.list_select(),
            _ => {}
        },
        Screen::JoinCode { .. } => match code {
            KeyCode::Char(c) => app.code_char(c),
            KeyCode::Backspace => app.code_backspace(),
            KeyCode::Enter => app.code_submit(),
            _ => {}
        },
        Screen::Playing { .. } => match code {
            KeyCode::Up => app.move_cursor(Direction::Up),
            KeyCode::Down => app.move_cursor(Direction::Down),
            KeyCode::Left => app.move_cursor(Direction::Left),
            KeyCode::Right => app.move_cursor(Direction::Right),
            // Rack slot 0 is drawn rightmost, so leftward keys step up
            KeyCode::Char('[') => app.select_rack(1),
            KeyCode::Char(']') => app.select_rack(-1),
            KeyCode::Char('<') => app.shift_rack(1),
            KeyCode::Char('>') => app.shift_rack(-1),
            KeyCode::Enter => app.activate(),
            KeyCode::Backspace => app.return_tile(),
            KeyCode::Char('v') => app.preview(),
            KeyCode::Char('f') => app.finish_turn(),
            KeyCode::Char('r') => app.retry_commit(),
            KeyCode::Char('q') => app.resign(),
            _ => {}
        },
        Screen::Error { .. } => {
            if code == KeyCode::Enter {
                app.go_to_menu();
            }
        }
    }
}

/// Read the word list on a background thread and hand it over when done.
fn load_dictionary(path: Option<PathBuf>) -> Receiver<Dictionary> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(Dictionary::from_path_or_embedded(path.as_deref()));
    });
    rx
}

/// Log to a file so output never lands on the screen the UI owns.
fn init_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let log_file = File::options().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| -> Box<dyn Error> { e })?;

    info!(path = %path.display(), "logging initialized");
    Ok(())
}
