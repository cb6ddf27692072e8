//! Command-line front end for xiangqi game records.

pub mod batch;
pub mod config;
