//! Recorded TriPeaks deals, useful for benchmarking and for trying the solver out.

use crate::board::{Board, Deck, Pyramid};
use crate::card::parse_ranks;

use anyhow::{Context, Result, bail};

struct Sample {
    // Ranks in `TRIPEAKS_POSITIONS` order: peaks first, base last.
    pyramid: &'static str,
    deck: &'static str,
}

const SAMPLES: [Sample; 6] = [
    Sample {
        pyramid: "7 2 7  5 7 2 J 4 Q  J 3 Q 3 9 4 6 K 9  A 10 9 6 5 2 3 8 J A",
        deck: "J 2 K K 8 10 Q 6 3 6 8 10 K 5 8 Q 9 10 4 5 A 7 A 4",
    },
    Sample {
        pyramid: "10 8 7  5 4 6 8 Q 7  J A 10 A 4 9 3 A 7  3 J 6 2 3 9 K K 8 9",
        deck: "5 J K 2 K Q 5 4 7 10 6 6 4 2 J 5 Q 8 Q 2 9 10 3 A",
    },
    Sample {
        pyramid: "2 9 6  K 10 10 10 A 7  7 5 7 4 A 8 8 2 9  J K 5 Q 8 6 10 A 9 Q",
        deck: "2 J 7 5 6 6 3 9 K 3 4 Q 5 4 J 8 3 J 3 2 A K 4 Q",
    },
    Sample {
        pyramid: "6 6 8  A J 5 Q 4 9  8 Q 2 9 J 5 8 Q 9  3 2 6 5 J 4 6 K 7 Q",
        deck: "4 K K 7 2 7 3 10 10 7 8 9 5 3 2 J 10 K A 4 10 A 3 A",
    },
    Sample {
        pyramid: "8 8 5  A 10 A 8 2 5  3 Q 9 9 A Q 3 J 10  7 5 9 2 4 9 J K 2 8",
        deck: "4 3 J J 6 3 5 6 Q 7 Q 10 K 6 2 4 10 A 4 6 K 7 K 7",
    },
    Sample {
        pyramid: "K 7 J  6 6 5 2 8 A  2 K 10 2 3 Q 8 10 4  8 6 5 9 Q 4 4 9 6 K",
        deck: "10 2 10 4 7 J 7 7 A 9 9 K J 8 Q 5 Q 3 J A 3 A 5 3",
    },
];

pub fn count() -> usize {
    SAMPLES.len()
}

/// Returns the deal numbered `number`, counting from 1.
pub fn sample(number: usize) -> Result<Board> {
    let Some(sample) = number.checked_sub(1).and_then(|i| SAMPLES.get(i)) else {
        bail!("No sample deal {number}; choose 1 to {}", SAMPLES.len());
    };
    let ranks = parse_ranks(sample.pyramid).context("Invalid sample pyramid")?;
    let pyramid = Pyramid::tripeaks(&ranks)?;
    let deck = Deck::parse(sample.deck)?;
    Ok(Board::new(pyramid, deck))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Position, TRIPEAKS_SIZE};
    use crate::card::Rank;

    #[test]
    fn test_samples() {
        for number in 1..=count() {
            let board = sample(number).unwrap();
            assert_eq!(board.pyramid.len(), TRIPEAKS_SIZE);
            assert_eq!(board.deck.len(), 24);
            assert!(board.validate().is_ok());

            // A full 52-card pack: four of each rank.
            let mut counts = [0; 13];
            for (_, rank) in board.pyramid.iter() {
                counts[rank.id() as usize] += 1;
            }
            for rank in board.deck.as_slice() {
                counts[rank.id() as usize] += 1;
            }
            assert_eq!(counts, [4; 13], "sample {number}");
        }
    }

    #[test]
    fn test_sample_layout() {
        let board = sample(6).unwrap();
        let rank = |row, col| board.pyramid.get(Position::new(row, col)).unwrap();
        assert_eq!(rank(3, 0), Rank::KING);
        assert_eq!(rank(2, 7), Rank::ACE);
        assert_eq!(rank(0, 9), Rank::KING);
        assert_eq!(board.deck.as_slice()[0].label(), "10");
    }

    #[test]
    fn test_missing_sample() {
        assert!(sample(0).is_err());
        let err = sample(7).unwrap_err();
        assert_eq!(err.to_string(), "No sample deal 7; choose 1 to 6");
    }
}
