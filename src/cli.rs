//! Command-line interface for the puzzle battler
//!
//! Two layers:
//!
//! - [`Cli`] - process flags (`clap` derive)
//! - [`ReplCommand`] - one line typed at the prompt, parsed without touching the
//!   session so it can be tested on its own
//!
//! [`run_repl`] ties them to a [`SessionHandle`] and prints the board after
//! every command.

use crate::core::{BattlerSettings, CoreError, CoreResult};
use crate::puzzles::PuzzleCatalog;
use crate::session::{SessionHandle, SessionView};
use battler_engine::{
    BoardPoint, Cell, DragSource, DropTarget, GamePhase, PieceColor, PieceType, BOARD_SIZE,
};
use clap::Parser;
use std::fmt::Write as _;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

/// Puzzle Battler - spend a point budget, then solve the position
#[derive(Parser, Debug)]
#[command(name = "puzzle_battler")]
#[command(about = "5x5 chess-variant puzzle battler", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Puzzle catalog JSON file (defaults to the built-in set)
    #[arg(long)]
    pub puzzles: Option<PathBuf>,

    /// Puzzle id to load at startup
    #[arg(long)]
    pub puzzle: Option<String>,

    /// Log filter, e.g. `info` or `puzzle_battler=debug`; RUST_LOG wins when set
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Play as black
    #[arg(long)]
    pub black: bool,

    /// Override the preparation length in units
    #[arg(long)]
    pub preparation_units: Option<u32>,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    pub save_settings: bool,
}

impl Cli {
    /// Apply flag overrides on top of file settings
    pub fn apply_overrides(&self, settings: &mut BattlerSettings) {
        if self.black {
            settings.player_color = PieceColor::Black;
        }
        if let Some(units) = self.preparation_units {
            settings.preparation_units = units;
        }
    }
}

/// One line typed at the prompt
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// `start [id]` - load a puzzle, random when no id is given
    Start(Option<String>),
    /// `list`
    List,
    /// `place <piece> <cell>`
    Place(PieceType, Cell),
    /// `drop <piece> <x> <z>` - tray drag released at a board-space point
    Drop(PieceType, BoardPoint),
    /// `remove <cell>` - drag a bought piece back to the tray
    Remove(Cell),
    /// `play`
    Play,
    /// `move <from> <to>`
    Move(Cell, Cell),
    Pause,
    Resume,
    Restart,
    Reset,
    Show,
    Help,
    Quit,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let (verb, args) = match words.split_first() {
            Some((verb, args)) => (verb.to_ascii_lowercase(), args),
            None => return Err("empty command".to_string()),
        };

        let command = match (verb.as_str(), args) {
            ("start", []) => ReplCommand::Start(None),
            ("start", [id]) => ReplCommand::Start(Some((*id).to_string())),
            ("list", []) => ReplCommand::List,
            ("place", [piece, at]) => ReplCommand::Place(parse_piece(piece)?, parse_cell(at)?),
            ("drop", [piece, x, z]) => {
                ReplCommand::Drop(parse_piece(piece)?, BoardPoint::new(parse_axis(x)?, parse_axis(z)?))
            }
            ("remove", [at]) => ReplCommand::Remove(parse_cell(at)?),
            ("play", []) => ReplCommand::Play,
            ("move", [from, to]) => ReplCommand::Move(parse_cell(from)?, parse_cell(to)?),
            ("move", [both]) => {
                let parsed = battler_engine::Move::parse(both, BOARD_SIZE)
                    .ok_or_else(|| format!("not a move: {both}"))?;
                ReplCommand::Move(parsed.from, parsed.to)
            }
            ("pause", []) => ReplCommand::Pause,
            ("resume", []) => ReplCommand::Resume,
            ("restart", []) => ReplCommand::Restart,
            ("reset", []) => ReplCommand::Reset,
            ("show", []) => ReplCommand::Show,
            ("help", []) | ("?", []) => ReplCommand::Help,
            ("quit", []) | ("exit", []) => ReplCommand::Quit,
            (verb, _) => return Err(format!("unknown command or arguments: {verb}")),
        };
        Ok(command)
    }
}

fn parse_piece(text: &str) -> Result<PieceType, String> {
    let piece_type = match text.to_ascii_lowercase().as_str() {
        "p" | "pawn" => PieceType::Pawn,
        "n" | "knight" => PieceType::Knight,
        "b" | "bishop" => PieceType::Bishop,
        "r" | "rook" => PieceType::Rook,
        "q" | "queen" => PieceType::Queen,
        "k" | "king" => PieceType::King,
        _ => return Err(format!("unknown piece: {text}")),
    };
    Ok(piece_type)
}

fn parse_cell(text: &str) -> Result<Cell, String> {
    Cell::from_algebraic(text, BOARD_SIZE).ok_or_else(|| format!("not a cell: {text}"))
}

fn parse_axis(text: &str) -> Result<f32, String> {
    text.parse().map_err(|_| format!("not a number: {text}"))
}

pub const HELP: &str = "\
commands:
  start [id]           load a puzzle (random without id)
  list                 show the catalog
  place <piece> <cell> buy a piece, e.g. `place q c3`
  drop <piece> <x> <z> release a tray drag at a board-space point
  remove <cell>        drag a bought piece back to the tray
  play                 end preparation now
  move <from> <to>     move a piece, e.g. `move c3 c5`
  pause | resume       hold the preparation countdown
  restart | reset      replay the puzzle | back to the menu
  show | help | quit";

/// Draw the board with rank and file labels plus a status line
pub fn render_view(view: &SessionView) -> String {
    let snapshot = &view.snapshot;
    let size = snapshot.board.size();
    let mut out = String::new();

    for y in 0..size {
        let _ = write!(out, "{} ", size - y);
        for x in 0..size {
            let cell = Cell::new(x as u8, y as u8);
            let symbol = snapshot
                .board
                .get(cell)
                .and_then(|id| {
                    snapshot
                        .own_pieces
                        .iter()
                        .chain(snapshot.opponent_pieces.iter())
                        .find(|piece| piece.id == id)
                })
                .map(|piece| piece.symbol())
                .unwrap_or('.');
            let _ = write!(out, " {symbol}");
        }
        out.push('\n');
    }
    out.push_str("  ");
    for x in 0..size {
        let _ = write!(out, " {}", char::from(b'a' + x as u8));
    }
    out.push('\n');

    let _ = write!(
        out,
        "{:?} | {} to move | budget {}/{} used",
        snapshot.phase, snapshot.active_color, snapshot.used_budget, snapshot.max_budget
    );
    if let Some(left) = view.countdown_remaining {
        let _ = write!(out, " | {left} left");
    }
    if view.paused {
        out.push_str(" | paused");
    }
    if view.opponent_thinking {
        out.push_str(" | opponent thinking");
    }
    if let Some(outcome) = snapshot.outcome {
        let _ = write!(out, " | {outcome:?}");
    }
    out
}

/// Read commands from stdin until `quit` or end of input
pub async fn run_repl(handle: &SessionHandle, catalog: &PuzzleCatalog) -> CoreResult<()> {
    println!("{HELP}");
    println!("{}", render_view(&handle.view()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match ReplCommand::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        if command == ReplCommand::Quit {
            break;
        }
        match execute(handle, catalog, command).await {
            Ok(Some(message)) => println!("{message}"),
            Ok(None) => {}
            Err(CoreError::SessionClosed) => return Err(CoreError::SessionClosed),
            Err(e) => println!("error: {e}"),
        }
        println!("{}", render_view(&handle.view()));
    }
    Ok(())
}

async fn execute(
    handle: &SessionHandle,
    catalog: &PuzzleCatalog,
    command: ReplCommand,
) -> CoreResult<Option<String>> {
    let message = match command {
        ReplCommand::Start(id) => {
            let definition = match id {
                Some(id) => catalog.get(&id)?.clone(),
                None => catalog
                    .random()
                    .cloned()
                    .ok_or_else(|| CoreError::Catalog {
                        message: "catalog is empty".to_string(),
                    })?,
            };
            let name = definition.name.clone();
            handle.start_puzzle(definition).await?;
            Some(format!("loaded {name}"))
        }
        ReplCommand::List => Some(
            catalog
                .iter()
                .map(|puzzle| {
                    format!(
                        "{:<14} {:<14} difficulty {} budget {}",
                        puzzle.id, puzzle.name, puzzle.difficulty, puzzle.max_player_value
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        ReplCommand::Place(piece_type, cell) => match handle.place_piece(piece_type, cell).await? {
            Ok(_) => None,
            Err(rejection) => Some(format!("rejected: {rejection}")),
        },
        ReplCommand::Drop(piece_type, point) => {
            match handle.begin_drag(DragSource::Tray(piece_type)).await? {
                Ok(drag) => {
                    let resolution = handle.commit_drag(drag, DropTarget::BoardSpace(point)).await?;
                    Some(format!("{resolution:?}"))
                }
                Err(rejection) => Some(format!("rejected: {rejection}")),
            }
        }
        ReplCommand::Remove(cell) => {
            let Some(id) = handle.view().snapshot.board.get(cell) else {
                return Ok(Some(format!("nothing on {}", cell.to_algebraic(BOARD_SIZE))));
            };
            match handle.begin_drag(DragSource::Board(id)).await? {
                Ok(drag) => {
                    let resolution = handle
                        .commit_drag(drag, DropTarget::TraySpace(BoardPoint::default()))
                        .await?;
                    Some(format!("{resolution:?}"))
                }
                Err(rejection) => Some(format!("rejected: {rejection}")),
            }
        }
        ReplCommand::Play => {
            if !handle.start_playing().await? {
                Some("not in preparation".to_string())
            } else {
                None
            }
        }
        ReplCommand::Move(from, to) => match handle.move_piece(from, to).await? {
            Ok(record) if record.solved => Some("solved!".to_string()),
            Ok(_) => None,
            Err(rejection) => Some(format!("rejected: {rejection}")),
        },
        ReplCommand::Pause => {
            handle.pause().await?;
            None
        }
        ReplCommand::Resume => {
            handle.resume().await?;
            None
        }
        ReplCommand::Restart => {
            if !handle.restart().await? {
                Some("restart is only available after a game ends".to_string())
            } else {
                None
            }
        }
        ReplCommand::Reset => {
            handle.reset().await?;
            None
        }
        ReplCommand::Show => None,
        ReplCommand::Help => Some(HELP.to_string()),
        ReplCommand::Quit => {
            warn!("[SESSION] quit reached the executor");
            None
        }
    };

    if handle.view().snapshot.phase == GamePhase::GameOver {
        if let Some(outcome) = handle.view().snapshot.outcome {
            return Ok(Some(format!(
                "{}game over: {outcome:?} (restart or reset)",
                message.map(|m| format!("{m}\n")).unwrap_or_default()
            )));
        }
    }
    Ok(message)
}
