use crate::board::{Board, GameState, Opening, Position, PositionSet};
use crate::card::Rank;

use anyhow::{Context, Result, bail};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Draw(Rank),
    Take(Rank, Position),
}

impl Action {
    pub fn card(&self) -> Rank {
        match *self {
            Action::Draw(card) | Action::Take(card, _) => card,
        }
    }

    pub fn position(&self) -> Option<Position> {
        match *self {
            Action::Draw(_) => None,
            Action::Take(_, position) => Some(position),
        }
    }

    pub fn is_draw(&self) -> bool {
        matches!(self, Action::Draw(_))
    }
}

/// One record of a solution: the move plus a snapshot of the state it produced.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Step {
    pub action: Action,
    pub deck_remaining: u8,
    pub removable: PositionSet,
}

/// An accepted move history, oldest move first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Solution {
    pub steps: Vec<Step>,
}

impl Solution {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn actions(&self) -> Vec<Action> {
        self.steps.iter().map(|step| step.action).collect()
    }
}

pub fn describe_action(action: &Action) -> String {
    match action {
        Action::Draw(card) => format!("drew card {card}"),
        Action::Take(card, position) => format!("took card {card} from position {position}"),
    }
}

pub fn format_solution(solution: &Solution) -> String {
    let mut output = String::from("Solution:\n");
    for step in &solution.steps {
        output.push_str("  ");
        output.push_str(&describe_action(&step.action));
        output.push('\n');
    }
    output
}

pub fn format_actions(actions: &[Action]) -> String {
    let list: Vec<String> = actions
        .iter()
        .map(|action| match action {
            Action::Draw(card) => format!("D:{card}"),
            Action::Take(card, position) => {
                format!("T:{card}@{},{}", position.row, position.col)
            }
        })
        .collect();

    let mut output = String::new();
    let max_width = list.iter().map(|s| s.len()).max().unwrap_or_default() + 1;
    for chunk in list.chunks(10) {
        for cmd in chunk {
            output.push_str(&format!("{cmd:<width$}", width = max_width));
        }
        output.push('\n');
    }

    output
}

pub fn apply_action(board: &Board, state: &GameState, action: &Action) -> Result<GameState> {
    match *action {
        Action::Draw(card) => {
            let Some(next) = state.draw(&board.deck) else {
                bail!("Cannot draw {card}; the deck is empty");
            };
            if next.card != Some(card) {
                bail!(
                    "Cannot draw {card}; the next deck card is {}",
                    board.deck.as_slice()[state.next]
                );
            }
            Ok(next)
        }
        Action::Take(card, position) => {
            let pyramid = &board.pyramid;
            let index = pyramid
                .index_of(position)
                .with_context(|| format!("No card at position {position}"))?;
            if pyramid.rank(index) != card {
                bail!(
                    "The card at position {position} is {}, not {card}",
                    pyramid.rank(index)
                );
            }
            if !state.removable.contains(index) {
                bail!("The card at position {position} is not removable");
            }
            if !state.can_take(pyramid, index) {
                bail!(
                    "{card} cannot be played on {}",
                    state.card.map(|c| c.label()).unwrap_or_default()
                );
            }
            Ok(state.take(pyramid, index))
        }
    }
}

/// Plays `actions` from the start of the deal and checks that they clear the pyramid.
pub fn replay(board: &Board, actions: &[Action]) -> Result<GameState> {
    if board.opening() == Opening::Stock && !actions.first().is_some_and(Action::is_draw) {
        bail!("The opening card must be drawn from the deck");
    }
    let mut state = board.initial_state();
    for (i, action) in actions.iter().enumerate() {
        state = apply_action(board, &state, action)
            .with_context(|| format!("Invalid move {}: {}", i + 1, describe_action(action)))?;
    }
    if !state.is_cleared() {
        bail!(
            "{} pyramid cards remain",
            board.pyramid.len() - state.played.len()
        );
    }
    Ok(state)
}
