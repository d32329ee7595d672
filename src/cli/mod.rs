//! CLI module for profilerag
//!
//! Argument parsing and terminal rendering of answers.

pub mod args;
pub mod render;

pub use args::{Args, Commands, Verbosity};
