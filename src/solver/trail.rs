use crate::action::{Solution, Step};

/// The move history of one search path, linked back to the parent call's record.
/// Each call owns its own link, so sibling branches never see each other's moves.
#[derive(Debug, Clone, Copy)]
pub struct Trail<'a> {
    pub step: Step,
    pub parent: Option<&'a Trail<'a>>,
}

impl<'a> Trail<'a> {
    pub fn new(step: Step, parent: Option<&'a Trail<'a>>) -> Self {
        Self { step, parent }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Walks from this record back to the first move.
    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        std::iter::successors(Some(self), |trail| trail.parent).map(|trail| &trail.step)
    }

    pub fn to_solution(trail: Option<&Trail<'_>>) -> Solution {
        let mut steps: Vec<Step> = trail.into_iter().flat_map(Trail::iter).copied().collect();
        steps.reverse();
        Solution { steps }
    }
}
