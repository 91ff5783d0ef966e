//! Exhaustive depth-first search over every order in which a TriPeaks deal can be played.
//!
//! Configurations already expanded along another path are pruned through a [`Memo`].
//! A pruned branch contributes nothing, so the reported count is the number of
//! distinct winning end configurations (face-up card, cards left in the deck),
//! not the number of distinct move orders that reach them.

mod memo;
mod trail;

pub use self::memo::{Fingerprint, Memo, NoMemo, SeenSet, SharedSeenSet};
use self::trail::Trail;

use crate::action::{Action, Solution, Step};
use crate::board::{Board, Deck, GameState, Opening, Pyramid};

use anyhow::{Context, Result};
use rayon::prelude::*;
use smallvec::SmallVec;
use std::{
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

const DEADLINE_CHECK_INTERVAL: u64 = 1024;

type PossibleMoves = SmallVec<[(Action, GameState); 16]>;

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Prune configurations that were already expanded.
    pub memoize: bool,
    /// Search the first level of moves on the rayon thread pool.
    pub parallel: bool,
    /// Stop after expanding this many configurations.
    pub max_states: Option<u64>,
    /// Stop once this much time has passed.
    pub time_limit: Option<Duration>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            memoize: true,
            parallel: false,
            max_states: None,
            time_limit: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SolveResult {
    pub count: u64,
    pub solutions: Vec<Solution>,
    pub states: u64,
    pub max_depth: usize,
    pub elapsed: Duration,
    /// The search hit `max_states` or `time_limit`; `solutions` holds what was found so far.
    pub truncated: bool,
}

impl SolveResult {
    pub fn is_solved(&self) -> bool {
        self.count > 0
    }
}

pub fn solve(board: &Board, options: &SolveOptions) -> Result<SolveResult> {
    solve_with(board, options, |_| {})
}

/// Like [`solve`], but hands every solution to `on_solution` as soon as it is found.
pub fn solve_with<F>(board: &Board, options: &SolveOptions, on_solution: F) -> Result<SolveResult>
where
    F: Fn(&Solution) + Sync,
{
    board.validate().context("Invalid board")?;

    let timer = Instant::now();
    let search = Search {
        pyramid: &board.pyramid,
        deck: &board.deck,
        on_solution: &on_solution,
        max_states: options.max_states,
        deadline: options.time_limit.and_then(|limit| timer.checked_add(limit)),
        states: AtomicU64::new(0),
        max_depth: AtomicUsize::new(0),
        truncated: AtomicBool::new(false),
        solutions: Mutex::new(Vec::new()),
    };

    let mut root = board.initial_state();
    let opening = match board.opening() {
        Opening::Free => None,
        Opening::Stock => {
            let (action, next) = search
                .draw(&root)
                .context("There is no card to turn up for the opening")?;
            root = next;
            Some(Trail::new(search.record(action, &root), None))
        }
    };
    let trail = opening.as_ref();
    let depth = trail.map_or(0, Trail::len);

    let count = match (options.parallel, options.memoize) {
        (false, true) => search.explore(&mut SeenSet::default(), root, trail, depth),
        (false, false) => search.explore(&mut NoMemo, root, trail, depth),
        (true, true) => search.explore_parallel(&SharedSeenSet::new(), root, trail, depth),
        (true, false) => search.explore_parallel(NoMemo, root, trail, depth),
    };

    let states = search.states.load(Ordering::Relaxed);
    Ok(SolveResult {
        count,
        states: options.max_states.map_or(states, |max| states.min(max)),
        max_depth: search.max_depth.load(Ordering::Relaxed),
        elapsed: timer.elapsed(),
        truncated: search.truncated.load(Ordering::Relaxed),
        solutions: search
            .solutions
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner),
    })
}

enum Visit {
    Pruned,
    Solved,
    Open,
}

struct Search<'a, F> {
    pyramid: &'a Pyramid,
    deck: &'a Deck,
    on_solution: &'a F,
    max_states: Option<u64>,
    deadline: Option<Instant>,
    states: AtomicU64,
    max_depth: AtomicUsize,
    truncated: AtomicBool,
    solutions: Mutex<Vec<Solution>>,
}

impl<F> Search<'_, F>
where
    F: Fn(&Solution) + Sync,
{
    fn explore<M: Memo>(
        &self,
        memo: &mut M,
        state: GameState,
        trail: Option<&Trail<'_>>,
        depth: usize,
    ) -> u64 {
        match self.visit(memo, &state, trail, depth) {
            Visit::Pruned => 0,
            Visit::Solved => 1,
            Visit::Open => self
                .expand(&state)
                .into_iter()
                .map(|(action, next)| {
                    let link = Trail::new(self.record(action, &next), trail);
                    self.explore(memo, next, Some(&link), depth + 1)
                })
                .sum(),
        }
    }

    // Each first-level branch runs the sequential search on its own worker.
    fn explore_parallel<M>(
        &self,
        memo: M,
        state: GameState,
        trail: Option<&Trail<'_>>,
        depth: usize,
    ) -> u64
    where
        M: Memo + Clone + Send + Sync,
    {
        match self.visit(&mut memo.clone(), &state, trail, depth) {
            Visit::Pruned => 0,
            Visit::Solved => 1,
            Visit::Open => self
                .expand(&state)
                .into_vec()
                .into_par_iter()
                .map(|(action, next)| {
                    let link = Trail::new(self.record(action, &next), trail);
                    self.explore(&mut memo.clone(), next, Some(&link), depth + 1)
                })
                .sum(),
        }
    }

    fn visit<M: Memo>(
        &self,
        memo: &mut M,
        state: &GameState,
        trail: Option<&Trail<'_>>,
        depth: usize,
    ) -> Visit {
        if self.truncated.load(Ordering::Relaxed) {
            return Visit::Pruned;
        }
        if !memo.insert(self.fingerprint(state)) {
            return Visit::Pruned;
        }

        let states = self.states.fetch_add(1, Ordering::Relaxed) + 1;
        let over_budget = self.max_states.is_some_and(|max| states > max);
        let out_of_time = states % DEADLINE_CHECK_INTERVAL == 0
            && self.deadline.is_some_and(|deadline| Instant::now() >= deadline);
        if over_budget || out_of_time {
            self.truncated.store(true, Ordering::Relaxed);
            return Visit::Pruned;
        }

        self.max_depth.fetch_max(depth, Ordering::Relaxed);
        if state.is_cleared() {
            self.accept(trail);
            return Visit::Solved;
        }
        Visit::Open
    }

    fn expand(&self, state: &GameState) -> PossibleMoves {
        let mut moves = PossibleMoves::new();
        for index in state.removable.iter() {
            if state.can_take(self.pyramid, index) {
                let action = Action::Take(self.pyramid.rank(index), self.pyramid.position(index));
                moves.push((action, state.take(self.pyramid, index)));
            }
        }
        if let Some(draw) = self.draw(state) {
            moves.push(draw);
        }
        moves
    }

    fn draw(&self, state: &GameState) -> Option<(Action, GameState)> {
        let next = state.draw(self.deck)?;
        Some((Action::Draw(next.card?), next))
    }

    fn accept(&self, trail: Option<&Trail<'_>>) {
        let solution = Trail::to_solution(trail);
        (self.on_solution)(&solution);
        self.solutions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(solution);
    }

    fn fingerprint(&self, state: &GameState) -> Fingerprint {
        Fingerprint {
            card: state.card,
            remaining: state.remaining(self.deck) as u8,
            removable: state.removable,
        }
    }

    fn record(&self, action: Action, state: &GameState) -> Step {
        Step {
            action,
            deck_remaining: state.remaining(self.deck) as u8,
            removable: state.removable,
        }
    }
}
