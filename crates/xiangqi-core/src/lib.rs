//! Xiangqi rules engine: piece catalog, 90-seat board with legal move generation,
//! position strings, and coordinate/Chinese move notation.

pub mod board;
pub mod error;
pub mod fen;
pub mod notation;
pub mod piece;
pub mod square;

pub use board::{Board, Transform};
pub use error::{CoreError, Result};
pub use fen::FIRST_FEN;
pub use piece::{Color, Kind, Piece};
pub use square::{Coords, Square};
