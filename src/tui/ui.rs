//! UI rendering using ratatui
//!
//! Supports multiple screens:
//! - Menu: Main menu with options
//! - JoinCode: Typing a game code
//! - GameList: The player's games
//! - Playing: Board, rack, scores and word results
//! - Error: Error message display
//!
//! The board and rack are drawn right to left: column 0 and rack slot 0 sit
//! on the right edge.

use crate::app::{AppCoordinator, GameSession, MenuOption, PlayView, Screen};
use crate::game::board::{Board, Position, TileStatus, BOARD_SIZE};
use crate::game::validation::TurnEvaluation;
use crate::storage::{GameRecord, GameStatus, PlayerId, Seat, GAME_CODE_LEN};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

/// Render the appropriate screen based on app state
pub fn render(frame: &mut Frame, coordinator: &AppCoordinator) {
    match &coordinator.screen {
        Screen::Menu { selected } => {
            render_menu(frame, *selected, coordinator.session.me());
        }
        Screen::JoinCode { input } => {
            render_join_code(frame, input);
        }
        Screen::GameList { games, selected } => {
            render_game_list(frame, games, *selected, coordinator.session.me());
        }
        Screen::Playing { view } => {
            render_game(frame, &coordinator.session, view);
        }
        Screen::Error { message } => {
            render_error(frame, message);
        }
    }
}

/// Render the main menu
fn render_menu(frame: &mut Frame, selected: usize, player: &PlayerId) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // Logo
            Constraint::Length(2), // Player
            Constraint::Min(6),    // Menu options
            Constraint::Length(2), // Footer
        ])
        .margin(2)
        .split(area);

    let logo = r#"
  ___ _____ _____   _____ _____
 / _ \_   _|_ _\ \ / / _ \_   _|
| (_) || |  | | \ V / (_) || |
 \___/ |_| |___| |_| \___/ |_|
"#;
    let logo_widget = Paragraph::new(logo)
        .style(Style::default().fg(Color::Yellow).bold())
        .alignment(Alignment::Center);
    frame.render_widget(logo_widget, layout[0]);

    let player_widget = Paragraph::new(format!("Playing as {}", player))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(player_widget, layout[1]);

    let items: Vec<ListItem> = MenuOption::all()
        .iter()
        .enumerate()
        .map(|(i, opt)| {
            let style = if i == selected {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default().fg(Color::White)
            };
            let prefix = if i == selected { "> " } else { "  " };
            ListItem::new(format!("{}{}", prefix, opt.label())).style(style)
        })
        .collect();
    frame.render_widget(List::new(items).block(Block::default()), layout[2]);

    let footer = Paragraph::new("↑↓ Navigate  Enter Select  Esc Quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(footer, layout[3]);
}

/// Render the game code prompt
fn render_join_code(frame: &mut Frame, input: &str) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Length(3), // Prompt
            Constraint::Length(3), // Input
            Constraint::Min(0),
            Constraint::Length(2), // Footer
        ])
        .margin(2)
        .split(area);

    let prompt = Paragraph::new(format!("Enter the {}-character game code", GAME_CODE_LEN))
        .style(Style::default().fg(Color::Cyan).bold())
        .alignment(Alignment::Center);
    frame.render_widget(prompt, layout[1]);

    let padded = format!("{:_<width$}", input, width = GAME_CODE_LEN);
    let input_widget = Paragraph::new(padded)
        .style(Style::default().fg(Color::Yellow).bold())
        .alignment(Alignment::Center);
    frame.render_widget(input_widget, layout[2]);

    let footer = Paragraph::new("Enter Join  Esc Back")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(footer, layout[4]);
}

/// Render the list of the player's games
fn render_game_list(frame: &mut Frame, games: &[GameRecord], selected: usize, me: &PlayerId) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(6),    // Game list
            Constraint::Length(2), // Footer
        ])
        .margin(1)
        .split(area);

    let header = Paragraph::new("My Games")
        .style(Style::default().fg(Color::Cyan).bold())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, layout[0]);

    if games.is_empty() {
        let empty = Paragraph::new("No games yet.\n\nStart one from the menu and share its code.")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(empty, layout[1]);
    } else {
        let items: Vec<ListItem> = games
            .iter()
            .enumerate()
            .map(|(i, game)| {
                let style = if i == selected {
                    Style::default().fg(Color::Yellow).bold()
                } else if game.is_turn_of(me) && !game.is_finished() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::White)
                };
                let prefix = if i == selected { "> " } else { "  " };
                let opponent = game
                    .opponent_of(me)
                    .map_or_else(|| "(open)".to_string(), PlayerId::to_string);
                ListItem::new(format!(
                    "{}{}  vs {}  {}  {}",
                    prefix,
                    game.id,
                    opponent,
                    format_score_pair(game, me),
                    game.status.label()
                ))
                .style(style)
            })
            .collect();

        let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Games"));
        frame.render_widget(list, layout[1]);
    }

    let footer = Paragraph::new("↑↓ Select  Enter Open  Esc Back")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(footer, layout[2]);
}

/// Render the in-game screen
fn render_game(frame: &mut Frame, session: &GameSession, view: &PlayView) {
    let area = frame.area();
    let (Some(record), Some(board)) = (session.record(), session.board()) else {
        render_error(frame, "no game is open");
        return;
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                       // Header
            Constraint::Length(BOARD_SIZE as u16 + 2),   // Board and side panel
            Constraint::Length(3),                       // Rack
            Constraint::Length(1),                       // Message
            Constraint::Min(0),
            Constraint::Length(1),                       // Footer
        ])
        .split(area);

    render_header(frame, layout[0], record, session.me());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(BOARD_SIZE as u16 * 3 + 2), // Board
            Constraint::Min(24),                           // Scores and words
        ])
        .split(layout[1]);

    let board_widget = Paragraph::new(board_lines(board, view))
        .block(Block::default().borders(Borders::ALL).title("Board"));
    frame.render_widget(board_widget, body[0]);

    render_side_panel(frame, body[1], record, session.me(), view.evaluation.as_ref());

    let rack_letters = session.rack().map(|r| r.letters()).unwrap_or(&[]);
    let rack = Paragraph::new(rack_line(rack_letters, view.rack_selected))
        .alignment(Alignment::Right)
        .block(Block::default().borders(Borders::ALL).title("Rack"));
    frame.render_widget(rack, layout[2]);

    let message = view.message.clone().unwrap_or_default();
    let color = message_color(&message, session.has_unsaved_commit());
    frame.render_widget(Paragraph::new(message).style(Style::default().fg(color)), layout[3]);

    let footer = Paragraph::new(
        "Arrows Move  Enter Place/Pick/Drop  Bksp Return  [ ] Letter  < > Reorder  \
         v Check  f Finish  r Retry  q Resign  Esc Menu",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, layout[5]);
}

/// Render the header: title, game code, turn line
fn render_header(frame: &mut Frame, area: Rect, record: &GameRecord, me: &PlayerId) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let header_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(10), // Title
            Constraint::Min(20),    // Turn line
            Constraint::Length(14), // Code
        ])
        .split(inner);

    let title = Paragraph::new("OTIYOT")
        .style(Style::default().fg(Color::Yellow).bold())
        .alignment(Alignment::Left);
    frame.render_widget(title, header_layout[0]);

    let (text, color) = turn_line(record, me);
    let turn = Paragraph::new(text)
        .style(Style::default().fg(color).bold())
        .alignment(Alignment::Center);
    frame.render_widget(turn, header_layout[1]);

    let code = Paragraph::new(format!("Code {}", record.id))
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Right);
    frame.render_widget(code, header_layout[2]);
}

/// Render scores and the latest word results
fn render_side_panel(
    frame: &mut Frame,
    area: Rect,
    record: &GameRecord,
    me: &PlayerId,
    evaluation: Option<&TurnEvaluation>,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    let scores: Vec<ListItem> = [Seat::One, Seat::Two]
        .into_iter()
        .filter_map(|seat| record.player(seat).map(|p| (p, record.score(seat))))
        .map(|(player, score)| {
            let style = if player == me {
                Style::default().fg(Color::Cyan).bold()
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(format!("{} - {}", player, score)).style(style)
        })
        .collect();
    let scores = List::new(scores).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title("Scores"),
    );
    frame.render_widget(scores, layout[0]);

    let words: Vec<ListItem> = evaluation
        .map(|e| e.words.as_slice())
        .unwrap_or(&[])
        .iter()
        .map(|result| {
            let color = if result.is_valid() { Color::Green } else { Color::Red };
            ListItem::new(result.message()).style(Style::default().fg(color))
        })
        .collect();
    let words = List::new(words).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title("Words"),
    );
    frame.render_widget(words, layout[1]);
}

/// Render error screen
fn render_error(frame: &mut Frame, message: &str) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Percentage(40),
        ])
        .margin(2)
        .split(area);

    let error = Paragraph::new(format!("Error: {}", message))
        .style(Style::default().fg(Color::Red))
        .alignment(Alignment::Center);
    frame.render_widget(error, layout[1]);

    let hint = Paragraph::new("Press Esc to go back")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(hint, layout[2]);
}

/// One line per board row, column 0 rightmost
fn board_lines(board: &Board, view: &PlayView) -> Vec<Line<'static>> {
    (0..BOARD_SIZE)
        .map(|row| {
            let spans: Vec<Span> = (0..BOARD_SIZE)
                .rev()
                .map(|col| {
                    let tile = Position::new(row, col).ok().and_then(|pos| board.tile(pos));
                    let text = match tile {
                        Some(tile) => format!(" {} ", tile.letter),
                        None => " · ".to_string(),
                    };
                    let mut style = match tile.map(|t| t.status) {
                        Some(TileStatus::Pending) => Style::default().fg(Color::Yellow).bold(),
                        Some(TileStatus::Locked) => Style::default().fg(Color::White),
                        None => Style::default().fg(Color::DarkGray),
                    };
                    if view.held == Some((row, col)) {
                        style = style.fg(Color::Magenta);
                    }
                    if view.cursor == (row, col) {
                        style = style.reversed();
                    }
                    Span::styled(text, style)
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

/// The rack with slot 0 rightmost and the selected letter highlighted
fn rack_line(letters: &[char], selected: usize) -> Line<'static> {
    if letters.is_empty() {
        return Line::from(Span::styled("(empty)", Style::default().fg(Color::DarkGray)));
    }
    let spans: Vec<Span> = letters
        .iter()
        .enumerate()
        .rev()
        .map(|(i, letter)| {
            let style = if i == selected {
                Style::default().fg(Color::Black).bg(Color::Cyan).bold()
            } else {
                Style::default().fg(Color::Cyan)
            };
            Span::styled(format!(" {} ", letter), style)
        })
        .collect();
    Line::from(spans)
}

fn turn_line(record: &GameRecord, me: &PlayerId) -> (String, Color) {
    match record.status {
        GameStatus::Finished => (
            format!("Game over  {}", format_score_pair(record, me)),
            Color::Magenta,
        ),
        _ if record.is_turn_of(me) && record.player2.is_none() => {
            ("Your turn (waiting for an opponent)".to_string(), Color::Green)
        }
        _ if record.is_turn_of(me) => ("Your turn".to_string(), Color::Green),
        _ => (format!("{} to play", record.current_turn), Color::Yellow),
    }
}

/// "my score : their score" from `me`'s point of view
fn format_score_pair(record: &GameRecord, me: &PlayerId) -> String {
    let (mine, theirs) = match record.seat_of(me) {
        Some(Seat::Two) => (record.player2_score, record.player1_score),
        _ => (record.player1_score, record.player2_score),
    };
    format!("{}:{}", mine, theirs)
}

fn message_color(message: &str, unsaved: bool) -> Color {
    if unsaved {
        Color::Red
    } else if message.starts_with('+') || message.starts_with("Valid") || message == "Your turn" {
        Color::Green
    } else if message.starts_with("Not in dictionary") {
        Color::Red
    } else {
        Color::White
    }
}
