//! This crate finds every way to clear a TriPeaks solitaire deal.
//!
//! A move either turns up the next deck card or takes a free pyramid card one rank
//! above or below the face-up card (A and K wrap around). The solver tries every
//! move order depth-first and skips configurations it has already expanded.
pub mod action;
pub mod board;
pub mod card;
pub mod samples;
pub mod solver;

pub use crate::board::{Board, Deck, Opening, Position, Pyramid};
pub use crate::card::Rank;
pub use crate::solver::{SolveOptions, SolveResult, solve, solve_with};
