//! # Utilities Module
//!
//! Random-draw helpers shared by the generation passes.

pub mod random;

pub use random::*;
