//! # Rendering Module
//!
//! Plain-text dumps of grids and levels for debugging and the command line.

pub mod display;

pub use display::*;
