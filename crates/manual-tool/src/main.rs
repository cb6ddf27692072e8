//! xqmanual: inspect, convert and transform xiangqi game records.
//!
//! Usage:
//!   xqmanual show game.xqf --moves
//!   xqmanual convert game.xqf game.pgn_zh
//!   xqmanual transform game.pgn_iccs rotated.pgn_iccs --kind rotate
//!   xqmanual batch ./manuals --to json

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chess_manual::{ChessManual, RecFormat};
use clap::{Parser, Subcommand, ValueEnum};
use manual_tool::batch;
use manual_tool::config::Config;
use tracing::info;
use xiangqi_core::Transform;

#[derive(Parser, Debug)]
#[command(author, version, about = "Read, convert and transform xiangqi game records")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the metadata and move grid of a record
    Show {
        path: PathBuf,

        /// Also print one summary line per move
        #[arg(long)]
        moves: bool,

        /// Also print the starting board
        #[arg(long)]
        board: bool,

        /// Print the record totals as JSON instead of the grid
        #[arg(long)]
        stats: bool,
    },

    /// Rewrite a record in the format named by the output extension
    Convert {
        input: PathBuf,

        /// Defaults to the input path with the configured output extension
        output: Option<PathBuf>,
    },

    /// Exchange colours, rotate or mirror a record
    Transform {
        input: PathBuf,
        output: PathBuf,

        #[arg(long, value_enum)]
        kind: TransformKind,
    },

    /// Convert every record under a directory into `<dir>.<ext>`
    Batch {
        /// Defaults to XQ_MANUAL_DIR
        dir: Option<PathBuf>,

        /// Target format extension, e.g. `json` or `pgn_zh`
        #[arg(long)]
        to: Option<String>,

        /// Abort on the first record that fails
        #[arg(long)]
        stop_on_error: bool,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum TransformKind {
    Exchange,
    Rotate,
    Symmetry,
}

impl From<TransformKind> for Transform {
    fn from(kind: TransformKind) -> Self {
        match kind {
            TransformKind::Exchange => Transform::Exchange,
            TransformKind::Rotate => Transform::Rotate,
            TransformKind::Symmetry => Transform::Symmetry,
        }
    }
}

fn read_manual(path: &Path) -> Result<ChessManual> {
    ChessManual::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_manual(manual: &ChessManual, path: &Path) -> Result<()> {
    manual
        .write(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = Config::from_env();
    let cli = Cli::parse();

    match cli.command {
        Command::Show { path, moves, board, stats } => {
            let manual = read_manual(&path)?;
            if stats {
                println!("{}", serde_json::to_string_pretty(&manual.stats())?);
                return Ok(());
            }
            if board {
                println!("{}", manual.board());
            }
            print!("{manual}");
            if moves {
                print!("{}", manual.move_list());
            }
        }
        Command::Convert { input, output } => {
            let output = output.unwrap_or_else(|| input.with_extension(&config.output_format.ext()[1..]));
            let manual = read_manual(&input)?;
            write_manual(&manual, &output)?;
            info!(from = %input.display(), to = %output.display(), moves = manual.stats().move_count, "Converted");
        }
        Command::Transform { input, output, kind } => {
            let mut manual = read_manual(&input)?;
            manual.change_side(kind.into())?;
            write_manual(&manual, &output)?;
            info!(to = %output.display(), ?kind, "Transformed");
        }
        Command::Batch { dir, to, stop_on_error } => {
            let Some(dir) = dir.or(config.manual_dir) else {
                bail!("No directory given and XQ_MANUAL_DIR is not set");
            };
            let fmt = match to {
                Some(ext) => RecFormat::parse(&ext).with_context(|| format!("Unknown format {ext}"))?,
                None => config.output_format,
            };
            let continue_on_error = config.continue_on_error && !stop_on_error;
            batch::convert_dir(&dir, fmt, continue_on_error)?;
        }
    }
    Ok(())
}
