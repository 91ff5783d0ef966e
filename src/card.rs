use anyhow::{Result, bail};
use std::fmt;

pub const MAX_RANK: u8 = 13;

const LABELS: [&str; MAX_RANK as usize] = [
    "A", "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K",
];

// Each rank may be followed by its cyclic predecessor or successor only.
const ADJACENCY: [[u8; 2]; MAX_RANK as usize] = [
    [12, 1],
    [0, 2],
    [1, 3],
    [2, 4],
    [3, 5],
    [4, 6],
    [5, 7],
    [6, 8],
    [7, 9],
    [8, 10],
    [9, 11],
    [10, 12],
    [11, 0],
];

/// A card rank. Suits play no part in TriPeaks, so a card is its rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rank(u8);

impl Rank {
    pub const ACE: Rank = Rank(0);
    pub const KING: Rank = Rank(MAX_RANK - 1);

    pub fn new(id: u8) -> Option<Self> {
        (id < MAX_RANK).then_some(Self(id))
    }

    pub fn all() -> impl Iterator<Item = Rank> {
        (0..MAX_RANK).map(Rank)
    }

    /// Parses a rank label: exactly one of `A`, `2`..`10`, `J`, `Q`, `K`.
    pub fn parse(label: &str) -> Result<Self> {
        let label = label.trim();
        match LABELS.iter().position(|&l| l == label) {
            Some(id) => Ok(Self(id as u8)),
            None => bail!("Invalid rank '{label}'"),
        }
    }

    pub fn id(&self) -> u8 {
        self.0
    }

    pub fn label(&self) -> &'static str {
        LABELS[self.0 as usize]
    }

    pub fn neighbors(&self) -> [Rank; 2] {
        ADJACENCY[self.0 as usize].map(Rank)
    }

    #[inline]
    pub fn is_adjacent(&self, other: Rank) -> bool {
        ADJACENCY[self.0 as usize].contains(&other.0)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Parses a list of rank labels separated by commas or whitespace.
pub fn parse_ranks(content: &str) -> Result<Vec<Rank>> {
    content
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(Rank::parse)
        .collect()
}
