//! Board and notation error types

use thiserror::Error;

use crate::piece::Color;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("No {0} king found on the board")]
    MissingKing(Color),

    #[error("Bad position string: {0}")]
    BadFen(String),

    #[error("Bad move notation: {0}")]
    BadNotation(String),

    #[error("Square out of range: {0}")]
    BadSquare(i32),

    #[error("No piece at {0}")]
    EmptySeat(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
