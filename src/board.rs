use crate::card::{Rank, parse_ranks};

use anyhow::{Context, Result, bail};
use smallvec::SmallVec;
use std::{collections::BTreeMap, fmt};

pub const MAX_PYRAMID: usize = 64;
pub const MAX_DECK: usize = u8::MAX as usize;
pub const TRIPEAKS_SIZE: usize = 28;

/// Slots of the standard three-peak deal, top row first and left to right in each row.
pub const TRIPEAKS_POSITIONS: [Position; TRIPEAKS_SIZE] = {
    const fn p(row: u8, col: u8) -> Position {
        Position { row, col }
    }
    [
        p(3, 0), p(3, 3), p(3, 6),
        p(2, 0), p(2, 1), p(2, 3), p(2, 4), p(2, 6), p(2, 7),
        p(1, 0), p(1, 1), p(1, 2), p(1, 3), p(1, 4), p(1, 5), p(1, 6), p(1, 7), p(1, 8),
        p(0, 0), p(0, 1), p(0, 2), p(0, 3), p(0, 4), p(0, 5), p(0, 6), p(0, 7), p(0, 8), p(0, 9),
    ]
};

/// A cell of the pyramid. Row 0 is the base; the card at `(row + 1, col)` rests on
/// `(row, col)` and `(row, col + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    pub fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    fn supports(&self) -> Option<[Position; 2]> {
        let row = self.row.checked_sub(1)?;
        Some([Position::new(row, self.col), Position::new(row, self.col.checked_add(1)?)])
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A set of pyramid slots, addressed by slot index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PositionSet(u64);

impl PositionSet {
    pub const EMPTY: PositionSet = PositionSet(0);

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.0 & (1u64 << index) != 0
    }

    #[inline]
    pub fn insert(&mut self, index: usize) {
        self.0 |= 1u64 << index;
    }

    #[inline]
    pub fn remove(&mut self, index: usize) {
        self.0 &= !(1u64 << index);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let index = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            Some(index)
        })
    }
}

// Clearing a slot makes `above` removable once `sibling` has been played as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Unlock {
    sibling: usize,
    above: usize,
}

/// The fixed layout of one deal: which rank sits at which position.
#[derive(Debug, Clone, Default)]
pub struct Pyramid {
    positions: Vec<Position>,
    ranks: Vec<Rank>,
    unlocks: Vec<SmallVec<[Unlock; 2]>>,
    initial: PositionSet,
}

impl Pyramid {
    pub fn new(cards: impl IntoIterator<Item = (Position, Rank)>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for (position, rank) in cards {
            if map.insert(position, rank).is_some() {
                bail!("Duplicate card at position {position}");
            }
        }
        if map.len() > MAX_PYRAMID {
            bail!(
                "Pyramid has {} cards; at most {MAX_PYRAMID} are supported",
                map.len()
            );
        }

        let positions: Vec<Position> = map.keys().copied().collect();
        let ranks: Vec<Rank> = map.values().copied().collect();
        let index_of = |position: Position| positions.binary_search(&position).ok();

        let mut initial = PositionSet::EMPTY;
        let mut unlocks = Vec::with_capacity(positions.len());
        for (index, &Position { row, col }) in positions.iter().enumerate() {
            let supported = positions[index]
                .supports()
                .is_some_and(|s| s.iter().any(|&p| index_of(p).is_some()));
            if !supported {
                initial.insert(index);
            }

            let mut list: SmallVec<[Unlock; 2]> = SmallVec::new();
            let Some(up) = row.checked_add(1) else {
                unlocks.push(list);
                continue;
            };
            let left = col
                .checked_sub(1)
                .map(|c| (Position::new(row, c), Position::new(up, c)));
            let right = col
                .checked_add(1)
                .map(|c| (Position::new(row, c), Position::new(up, col)));
            for (sibling, above) in [left, right].into_iter().flatten() {
                if let (Some(sibling), Some(above)) = (index_of(sibling), index_of(above)) {
                    list.push(Unlock { sibling, above });
                }
            }
            unlocks.push(list);
        }

        Ok(Self {
            positions,
            ranks,
            unlocks,
            initial,
        })
    }

    /// Builds a pyramid from `(row, col)` coordinates and rank labels.
    pub fn parse(cards: &[((u8, u8), &str)]) -> Result<Self> {
        let cards = cards
            .iter()
            .map(|&((row, col), label)| {
                let position = Position::new(row, col);
                let rank = Rank::parse(label)
                    .with_context(|| format!("Failed to parse card at {position}"))?;
                Ok((position, rank))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(cards)
    }

    /// Lays the ranks out on the standard three-peak slots, see [`TRIPEAKS_POSITIONS`].
    pub fn tripeaks(ranks: &[Rank]) -> Result<Self> {
        if ranks.len() != TRIPEAKS_SIZE {
            bail!(
                "A TriPeaks layout needs {TRIPEAKS_SIZE} cards, got {}",
                ranks.len()
            );
        }
        Self::new(TRIPEAKS_POSITIONS.into_iter().zip(ranks.iter().copied()))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn rank(&self, index: usize) -> Rank {
        self.ranks[index]
    }

    #[inline]
    pub fn position(&self, index: usize) -> Position {
        self.positions[index]
    }

    pub fn index_of(&self, position: Position) -> Option<usize> {
        self.positions.binary_search(&position).ok()
    }

    pub fn get(&self, position: Position) -> Option<Rank> {
        self.index_of(position).map(|index| self.ranks[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, Rank)> + '_ {
        self.positions.iter().copied().zip(self.ranks.iter().copied())
    }

    /// Slots with no supporting card beneath them.
    pub fn initial_removable(&self) -> PositionSet {
        self.initial
    }

    /// Moves `index` from `removable` to `played` and adds every slot above it whose
    /// other support has already been played.
    pub fn clear(&self, removable: &mut PositionSet, played: &mut PositionSet, index: usize) {
        removable.remove(index);
        played.insert(index);
        for unlock in &self.unlocks[index] {
            if played.contains(unlock.sibling) && !played.contains(unlock.above) {
                removable.insert(unlock.above);
            }
        }
    }

    pub fn pretty_print(&self) -> String {
        let Some(top) = self.positions.iter().map(|p| p.row).max() else {
            return String::new();
        };
        let mut lines = Vec::new();
        for row in (0..=top).rev() {
            let mut line = String::new();
            for (position, rank) in self.iter().filter(|(p, _)| p.row == row) {
                let offset = (position.col as usize * 2 + row as usize) * 2;
                while line.len() < offset {
                    line.push(' ');
                }
                line.push_str(&format!("{rank:<3}"));
            }
            lines.push(line.trim_end().to_string());
        }
        lines.join("\n")
    }
}

/// The draw pile; the first card is drawn first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck(Vec<Rank>);

impl Deck {
    pub fn new(cards: Vec<Rank>) -> Self {
        Self(cards)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let cards = parse_ranks(content).with_context(|| format!("Failed to parse at '{content}'"))?;
        Ok(Self(cards))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Rank] {
        &self.0
    }

    pub fn pretty_print(&self) -> String {
        self.0
            .iter()
            .map(|r| r.label())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How the first card of a game gets played.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Opening {
    /// Nothing is face up; any removable pyramid card or the deck head may come first.
    #[default]
    Free,
    /// The deck head is turned up before the first move.
    Stock,
}

/// A complete deal: pyramid, draw pile and opening rule.
#[derive(Debug, Clone, Default)]
pub struct Board {
    pub pyramid: Pyramid,
    pub deck: Deck,
    opening: Opening,
}

impl Board {
    pub fn new(pyramid: Pyramid, deck: Deck) -> Self {
        Self {
            pyramid,
            deck,
            opening: Opening::Free,
        }
    }

    pub fn opening(&self) -> Opening {
        self.opening
    }

    pub fn set_opening(&mut self, opening: Opening) {
        self.opening = opening;
    }

    pub fn with_opening(mut self, opening: Opening) -> Self {
        self.opening = opening;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.deck.len() > MAX_DECK {
            bail!(
                "Deck has {} cards; at most {MAX_DECK} are supported",
                self.deck.len()
            );
        }
        if self.opening == Opening::Stock && self.deck.is_empty() {
            bail!("The deck is empty; there is no card to turn up for the opening.");
        }
        Ok(())
    }

    /// The state before any card is played.
    pub fn initial_state(&self) -> GameState {
        GameState {
            card: None,
            next: 0,
            removable: self.pyramid.initial_removable(),
            played: PositionSet::EMPTY,
        }
    }

    pub fn pretty_print(&self) -> String {
        let mut output = self.pyramid.pretty_print();
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&format!("Deck: {}", self.deck.pretty_print()));
        if self.opening == Opening::Stock {
            output.push_str("\nOpening: Stock");
        }
        output
    }
}

/// The part of a game that changes as cards are played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    pub card: Option<Rank>,
    pub next: usize,
    pub removable: PositionSet,
    pub played: PositionSet,
}

impl GameState {
    pub fn is_cleared(&self) -> bool {
        self.removable.is_empty()
    }

    pub fn remaining(&self, deck: &Deck) -> usize {
        deck.len() - self.next
    }

    /// Whether the pyramid card at `index` may be played on the current card.
    #[inline]
    pub fn can_take(&self, pyramid: &Pyramid, index: usize) -> bool {
        self.removable.contains(index)
            && self
                .card
                .is_none_or(|card| card.is_adjacent(pyramid.rank(index)))
    }

    pub fn take(&self, pyramid: &Pyramid, index: usize) -> GameState {
        let mut next = *self;
        pyramid.clear(&mut next.removable, &mut next.played, index);
        next.card = Some(pyramid.rank(index));
        next
    }

    pub fn draw(&self, deck: &Deck) -> Option<GameState> {
        let &card = deck.as_slice().get(self.next)?;
        Some(GameState {
            card: Some(card),
            next: self.next + 1,
            ..*self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank(label: &str) -> Rank {
        Rank::parse(label).unwrap()
    }

    fn small_pyramid() -> Pyramid {
        Pyramid::parse(&[((0, 0), "A"), ((0, 1), "2"), ((1, 0), "3")]).unwrap()
    }

    #[test]
    fn test_position_set() {
        let mut set = PositionSet::EMPTY;
        assert!(set.is_empty());
        set.insert(0);
        set.insert(5);
        set.insert(63);
        assert_eq!(set.len(), 3);
        assert!(set.contains(5));
        assert_eq!(set.iter().collect::<Vec<_>>(), [0, 5, 63]);
        set.remove(5);
        assert!(!set.contains(5));
        assert_eq!(set.iter().collect::<Vec<_>>(), [0, 63]);
    }

    #[test]
    fn test_clear_needs_both_supports() {
        let pyramid = small_pyramid();
        let left = pyramid.index_of(Position::new(0, 0)).unwrap();
        let right = pyramid.index_of(Position::new(0, 1)).unwrap();
        let top = pyramid.index_of(Position::new(1, 0)).unwrap();

        let mut removable = pyramid.initial_removable();
        let mut played = PositionSet::EMPTY;
        assert_eq!(removable.iter().collect::<Vec<_>>(), [left, right]);

        pyramid.clear(&mut removable, &mut played, left);
        assert!(!removable.contains(top));
        assert!(played.contains(left));
        assert_eq!(removable.iter().collect::<Vec<_>>(), [right]);

        pyramid.clear(&mut removable, &mut played, right);
        assert_eq!(removable.iter().collect::<Vec<_>>(), [top]);
        assert_eq!(played.len(), 2);
    }

    #[test]
    fn test_clear_from_either_side() {
        let pyramid = small_pyramid();
        let mut removable = pyramid.initial_removable();
        let mut played = PositionSet::EMPTY;
        pyramid.clear(&mut removable, &mut played, 1);
        assert_eq!(removable.iter().collect::<Vec<_>>(), [0]);
        pyramid.clear(&mut removable, &mut played, 0);
        assert_eq!(removable.iter().collect::<Vec<_>>(), [2]);
    }

    #[test]
    fn test_tripeaks_layout() {
        let ranks: Vec<Rank> = (0..TRIPEAKS_SIZE)
            .map(|i| Rank::new((i % 13) as u8).unwrap())
            .collect();
        let pyramid = Pyramid::tripeaks(&ranks).unwrap();
        assert_eq!(pyramid.len(), TRIPEAKS_SIZE);
        assert_eq!(pyramid.get(Position::new(3, 0)), Some(rank("A")));
        assert_eq!(pyramid.get(Position::new(0, 9)), Some(rank("2")));
        let base: Vec<_> = pyramid
            .initial_removable()
            .iter()
            .map(|i| pyramid.position(i))
            .collect();
        assert_eq!(base, (0..10).map(|c| Position::new(0, c)).collect::<Vec<_>>());

        // (1,1) rests on (0,1) and (0,2)
        let mut removable = pyramid.initial_removable();
        let mut played = PositionSet::EMPTY;
        let target = pyramid.index_of(Position::new(1, 1)).unwrap();
        pyramid.clear(&mut removable, &mut played, pyramid.index_of(Position::new(0, 1)).unwrap());
        pyramid.clear(&mut removable, &mut played, pyramid.index_of(Position::new(0, 3)).unwrap());
        assert!(!removable.contains(target));
        pyramid.clear(&mut removable, &mut played, pyramid.index_of(Position::new(0, 2)).unwrap());
        assert!(removable.contains(target));
        assert!(removable.contains(pyramid.index_of(Position::new(1, 2)).unwrap()));

        let err = Pyramid::tripeaks(&ranks[..27]).unwrap_err();
        assert_eq!(err.to_string(), "A TriPeaks layout needs 28 cards, got 27");
    }

    #[test]
    fn test_invalid_pyramid() {
        let err = Pyramid::parse(&[((0, 0), "A"), ((0, 1), "X")]).unwrap_err();
        assert_eq!(err.to_string(), "Failed to parse card at (0, 1)");
        assert_eq!(err.root_cause().to_string(), "Invalid rank 'X'");

        let err = Pyramid::parse(&[((0, 0), "A"), ((0, 0), "2")]).unwrap_err();
        assert_eq!(err.to_string(), "Duplicate card at position (0, 0)");

        let err = Pyramid::new((0..65).map(|c| (Position::new(0, c), Rank::ACE))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Pyramid has 65 cards; at most 64 are supported"
        );
    }

    #[test]
    fn test_game_state() {
        let board = Board::new(small_pyramid(), Deck::parse("3, K").unwrap());
        let state = board.initial_state();
        assert_eq!(state.card, None);
        assert!(state.can_take(&board.pyramid, 0));
        assert!(state.can_take(&board.pyramid, 1));
        assert!(!state.can_take(&board.pyramid, 2));

        let state = state.take(&board.pyramid, 0);
        assert_eq!(state.card, Some(rank("A")));
        assert!(state.can_take(&board.pyramid, 1));

        let state = state.draw(&board.deck).unwrap();
        assert_eq!(state.card, Some(rank("3")));
        assert_eq!(state.remaining(&board.deck), 1);
        assert!(state.can_take(&board.pyramid, 1));

        let state = state.draw(&board.deck).unwrap();
        assert_eq!(state.card, Some(rank("K")));
        assert!(!state.can_take(&board.pyramid, 1));
        assert!(state.draw(&board.deck).is_none());
    }

    #[test]
    fn test_validate() {
        let board = Board::new(small_pyramid(), Deck::default());
        assert!(board.validate().is_ok());
        let board = board.with_opening(Opening::Stock);
        assert!(board.validate().is_err());
        let board = Board::new(small_pyramid(), Deck::new(vec![Rank::ACE; 256]));
        assert!(board.validate().is_err());
    }

    #[test]
    fn test_pretty_print() {
        let board = Board::new(small_pyramid(), Deck::parse("3 10").unwrap());
        assert_eq!(board.pretty_print(), "  3\nA   2\nDeck: 3 10");

        let ranks: Vec<Rank> = std::iter::repeat_n(rank("10"), TRIPEAKS_SIZE).collect();
        let lines: Vec<String> = Pyramid::tripeaks(&ranks)
            .unwrap()
            .pretty_print()
            .lines()
            .map(String::from)
            .collect();
        assert_eq!(lines[0], "      10          10          10");
        assert_eq!(lines[3], "10  10  10  10  10  10  10  10  10  10");
    }
}
