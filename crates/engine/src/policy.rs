//! Placement policies - how the tray solver picks an anchor for one shape
//!
//! The solver enumerates piece orderings; a [`PlacementPolicy`] decides where
//! each piece of an ordering goes. [`GreedyPolicy`] commits to the single
//! best-scoring anchor. [`LookaheadPolicy`] re-ranks the top greedy
//! candidates by how well the next piece fits afterwards.

use classic_blocks_core::config::PolicyChoice;
use classic_blocks_core::occupancy::Occupancy;
use classic_blocks_core::oracle::{
    find_cavities, find_line_completion_gaps, legal_placements, mask_covers, Cavity, LineGap,
};
use classic_blocks_core::shapes::{Placement, Shape};

/// Per-anchor heuristic weights
pub const EXACT_GAP_BONUS: i32 = 100;
pub const LINE_CLEAR_POINTS: i32 = 30;
pub const EXACT_CAVITY_BONUS: i32 = 40;
pub const CAVITY_COVER_BONUS: i32 = 15;
pub const COMPLETES_LINE_BONUS: i32 = 20;

/// One candidate anchor with its heuristic score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredPlacement {
    pub placement: Placement,
    pub score: i32,
    /// Lines full right after placing, before clearing
    pub cleared_lines: u32,
    /// Footprint equals the empty cells of some line gap
    pub exact_gap: bool,
    /// Footprint equals some cavity
    pub exact_cavity: bool,
    /// Footprint equals or covers 80% of some cavity
    pub cavity_match: bool,
    pub completes_line: bool,
    /// Board after placing, before clearing
    pub after: Occupancy,
}

impl ScoredPlacement {
    /// Ranking key: exact gap matches first, then score
    fn rank(&self) -> (bool, i32) {
        (self.exact_gap, self.score)
    }
}

/// Cavities and line gaps of one board, computed once per solver step
#[derive(Debug, Clone)]
pub struct BoardFeatures {
    pub grid: Occupancy,
    pub cavities: Vec<Cavity>,
    pub gaps: Vec<LineGap>,
}

impl BoardFeatures {
    pub fn of(grid: Occupancy) -> Self {
        Self {
            grid,
            cavities: find_cavities(grid),
            gaps: find_line_completion_gaps(grid),
        }
    }

    /// Score a legal placement against these features
    pub fn score(&self, placement: &Placement) -> ScoredPlacement {
        let after = self.grid.with(placement.mask);
        let cleared_lines = after.full_rows().count_ones() + after.full_cols().count_ones();
        let completes_line = cleared_lines > 0;

        let exact_gap = self.gaps.iter().any(|g| g.cells == placement.mask);
        let exact_cavity = self.cavities.iter().any(|c| c.mask == placement.mask);
        let cavity_match =
            exact_cavity || self.cavities.iter().any(|c| mask_covers(placement.mask, c));

        let mut score = 0;
        if exact_gap {
            score += EXACT_GAP_BONUS;
        }
        score += cleared_lines as i32 * LINE_CLEAR_POINTS;
        if exact_cavity {
            score += EXACT_CAVITY_BONUS;
        } else if cavity_match {
            score += CAVITY_COVER_BONUS;
        }
        if completes_line {
            score += COMPLETES_LINE_BONUS;
        }

        ScoredPlacement {
            placement: *placement,
            score,
            cleared_lines,
            exact_gap,
            exact_cavity,
            cavity_match,
            completes_line,
            after,
        }
    }

    /// Every legal anchor of `shape`, scored, in scan order
    pub fn candidates(&self, shape: &Shape) -> Vec<ScoredPlacement> {
        legal_placements(self.grid, shape)
            .map(|p| self.score(p))
            .collect()
    }

    /// Best-ranked legal anchor of `shape`; the earliest anchor wins ties
    pub fn best(&self, shape: &Shape) -> Option<ScoredPlacement> {
        let mut best: Option<ScoredPlacement> = None;
        for p in legal_placements(self.grid, shape) {
            let scored = self.score(p);
            if best.map_or(true, |b| scored.rank() > b.rank()) {
                best = Some(scored);
            }
        }
        best
    }
}

/// Picks the anchor for one piece of an ordering
pub trait PlacementPolicy {
    /// Choose where `shape` goes on `features.grid`.
    ///
    /// `upcoming` lists the pieces still to be placed after this one, in
    /// order. `None` means the shape fits nowhere.
    fn choose(
        &self,
        features: &BoardFeatures,
        shape: &Shape,
        upcoming: &[&Shape],
    ) -> Option<ScoredPlacement>;
}

/// Best single anchor per step
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyPolicy;

impl PlacementPolicy for GreedyPolicy {
    fn choose(
        &self,
        features: &BoardFeatures,
        shape: &Shape,
        _upcoming: &[&Shape],
    ) -> Option<ScoredPlacement> {
        features.best(shape)
    }
}

/// Greedy with one piece of lookahead over the top `breadth` candidates.
///
/// Candidates that leave the next piece somewhere to go always beat those
/// that strand it; after that, exact gap fills win, then the summed score.
#[derive(Debug, Clone, Copy)]
pub struct LookaheadPolicy {
    pub breadth: usize,
}

impl LookaheadPolicy {
    pub fn new(breadth: usize) -> Self {
        Self {
            breadth: breadth.max(1),
        }
    }
}

impl PlacementPolicy for LookaheadPolicy {
    fn choose(
        &self,
        features: &BoardFeatures,
        shape: &Shape,
        upcoming: &[&Shape],
    ) -> Option<ScoredPlacement> {
        let Some(next) = upcoming.first() else {
            return features.best(shape);
        };

        let mut candidates = features.candidates(shape);
        // Stable: equal ranks keep scan order.
        candidates.sort_by(|a, b| b.rank().cmp(&a.rank()));
        candidates.truncate(self.breadth.max(1));

        let mut best: Option<(ScoredPlacement, (bool, bool, i32))> = None;
        for candidate in candidates {
            let cleared = candidate.after.without(candidate.after.full_line_mask());
            let follow_up = BoardFeatures::of(cleared).best(next).map(|p| p.score);
            let key = (
                follow_up.is_some(),
                candidate.exact_gap,
                candidate.score + follow_up.unwrap_or(0),
            );
            if best.map_or(true, |(_, k)| key > k) {
                best = Some((candidate, key));
            }
        }
        best.map(|(p, _)| p)
    }
}

/// A policy picked from configuration
#[derive(Debug, Clone, Copy)]
pub enum Policy {
    Greedy(GreedyPolicy),
    Lookahead(LookaheadPolicy),
}

impl Policy {
    pub fn from_choice(choice: PolicyChoice) -> Self {
        match choice {
            PolicyChoice::Greedy => Policy::Greedy(GreedyPolicy),
            PolicyChoice::Lookahead { breadth } => Policy::Lookahead(LookaheadPolicy::new(breadth)),
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Policy::Greedy(GreedyPolicy)
    }
}

impl PlacementPolicy for Policy {
    fn choose(
        &self,
        features: &BoardFeatures,
        shape: &Shape,
        upcoming: &[&Shape],
    ) -> Option<ScoredPlacement> {
        match self {
            Policy::Greedy(p) => p.choose(features, shape, upcoming),
            Policy::Lookahead(p) => p.choose(features, shape, upcoming),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(rows: &[&[u8]]) -> Shape {
        Shape::from_rows(rows).unwrap()
    }

    #[test]
    fn greedy_prefers_exact_gap() {
        // Row 7 misses cells 5..8; a horizontal triomino fills it exactly.
        let grid = Occupancy::from_ascii(&[
            "........", "........", "........", "........",
            "........", "........", "........", "#####...",
        ]);
        let features = BoardFeatures::of(grid);
        let bar = shape(&[&[1, 1, 1]]);
        let best = GreedyPolicy.choose(&features, &bar, &[]).unwrap();
        assert_eq!((best.placement.row, best.placement.col), (7, 5));
        assert!(best.exact_gap);
        assert_eq!(best.cleared_lines, 1);
        assert_eq!(best.score, EXACT_GAP_BONUS + LINE_CLEAR_POINTS + COMPLETES_LINE_BONUS);
    }

    #[test]
    fn ties_go_to_the_first_anchor() {
        let features = BoardFeatures::of(Occupancy::EMPTY);
        let single = shape(&[&[1]]);
        let best = GreedyPolicy.choose(&features, &single, &[]).unwrap();
        assert_eq!((best.placement.row, best.placement.col), (0, 0));
    }

    #[test]
    fn no_anchor_means_none() {
        let features = BoardFeatures::of(Occupancy::FULL);
        let single = shape(&[&[1]]);
        assert!(GreedyPolicy.choose(&features, &single, &[]).is_none());
        assert!(LookaheadPolicy::new(3).choose(&features, &single, &[]).is_none());
    }

    #[test]
    fn lookahead_without_upcoming_matches_greedy() {
        let grid = Occupancy::from_ascii(&["##.#####", "........"]);
        let features = BoardFeatures::of(grid);
        let single = shape(&[&[1]]);
        let greedy = GreedyPolicy.choose(&features, &single, &[]);
        let lookahead = LookaheadPolicy::new(4).choose(&features, &single, &[]);
        assert_eq!(greedy, lookahead);
    }

    #[test]
    fn lookahead_avoids_stranding_the_next_piece() {
        let grid = Occupancy::from_ascii(&[
            ".#####.#", "#.######", ".##..#.#", "####.###",
            "##.#.##.", "........", "#.######", "#..##.#.",
        ]);
        let features = BoardFeatures::of(grid);
        let domino = shape(&[&[1], &[1]]);
        let square = shape(&[&[1, 1], &[1, 1]]);

        // Both anchors finish row 3; only the lower one leaves room for the square.
        let greedy = GreedyPolicy.choose(&features, &domino, &[&square]).unwrap();
        assert_eq!((greedy.placement.row, greedy.placement.col), (2, 4));
        let after = |p: &ScoredPlacement| p.after.without(p.after.full_line_mask());
        assert!(features_fit(after(&greedy), &square).is_none());

        let lookahead = LookaheadPolicy::new(8).choose(&features, &domino, &[&square]).unwrap();
        assert_eq!((lookahead.placement.row, lookahead.placement.col), (3, 4));
        assert_eq!(lookahead.score, greedy.score);
        assert!(features_fit(after(&lookahead), &square).is_some());
    }

    fn features_fit(grid: Occupancy, shape: &Shape) -> Option<ScoredPlacement> {
        BoardFeatures::of(grid).best(shape)
    }

    #[test]
    fn policy_from_choice() {
        assert!(matches!(Policy::from_choice(PolicyChoice::Greedy), Policy::Greedy(_)));
        match Policy::from_choice(PolicyChoice::Lookahead { breadth: 0 }) {
            Policy::Lookahead(p) => assert_eq!(p.breadth, 1),
            Policy::Greedy(_) => panic!("expected lookahead"),
        }
    }
}
