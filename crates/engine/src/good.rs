//! Good-tray searches - trays biased toward obvious multi-line clears
//!
//! Searches run in tier order and the first accepted candidate wins:
//!
//! 1. `near_complete_lines`: exact fits for rows/columns 1-3 cells from full
//! 2. `multi_clear_probe`, `gap_combination`, `sampled`: solver-judged random
//!    and gap-driven combinations
//! 3. `exact_fit`, `simple_combo`: best single-shape fits, solid rectangles
//!
//! Every accepted tray clears at least one line in the solver's simulation.
//! Callers still verify it with the exhaustive clear check before dealing.

use arrayvec::ArrayVec;
use tracing::debug;

use classic_blocks_core::config::SearchLimits;
use classic_blocks_core::occupancy::Occupancy;
use classic_blocks_core::oracle::{
    exact_cavity_matches, find_line_completion_gaps, find_matchable_cavities, gap_match,
    shape_can_fit_anywhere, LineGap,
};
use classic_blocks_core::rng::SimpleRng;
use classic_blocks_core::shapes::{Shape, ShapeLibrary};
use classic_blocks_core::types::{GoodSearch, LineKind, ShapeId, TRAY_SIZE};

use crate::policy::PlacementPolicy;
use crate::solver::{shape_fit_score, simulate_tray_placement, TrayOutcome};

/// Near-complete gaps examined when building from them
const NEAR_GAPS_EXAMINED: usize = 5;
/// Column gaps tried by the three-column special case
const COLUMN_COMBO_GAPS: usize = 3;

const EXACT_CAVITY_RANK: i32 = 100;
const EXACT_GAP_RANK: i32 = 80;
const EXACT_FIT_MIN_EACH: i32 = 20;
const EXACT_FIT_MIN_TOTAL: i32 = 100;
const BEST_FIT_MIN: i32 = 30;

const RECT_PAIRS_WINDOW: usize = 10;
const SQUARES_WINDOW: usize = 5;
const RECT_TRIPLES_WINDOW: usize = 5;

type Picks = ArrayVec<ShapeId, TRAY_SIZE>;

/// A good tray and the search that found it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoodTray {
    pub shapes: [ShapeId; TRAY_SIZE],
    pub search: GoodSearch,
    pub outcome: TrayOutcome,
}

/// One good-tray search over a fixed board
pub struct GoodTraySearch<'a, P: PlacementPolicy + ?Sized> {
    library: &'a ShapeLibrary,
    grid: Occupancy,
    limits: &'a SearchLimits,
    policy: &'a P,
    placeable: Vec<ShapeId>,
}

impl<'a, P: PlacementPolicy + ?Sized> GoodTraySearch<'a, P> {
    pub fn new(
        library: &'a ShapeLibrary,
        grid: Occupancy,
        limits: &'a SearchLimits,
        policy: &'a P,
    ) -> Self {
        let placeable = library
            .iter()
            .filter(|(_, s)| shape_can_fit_anywhere(grid, s))
            .map(|(id, _)| id)
            .collect();
        Self {
            library,
            grid,
            limits,
            policy,
            placeable,
        }
    }

    /// Run every search in tier order
    pub fn find(&self, rng: &mut SimpleRng) -> Option<GoodTray> {
        if self.library.len() < TRAY_SIZE || self.grid.is_empty() {
            return None;
        }

        let found = self
            .near_complete_lines(rng)
            .or_else(|| self.multi_clear_probe(rng))
            .or_else(|| self.gap_combination(rng))
            .or_else(|| self.sampled(rng))
            .or_else(|| self.exact_fit())
            .or_else(|| self.simple_combo(rng));

        match &found {
            Some(tray) => debug!(
                search = tray.search.as_str(),
                tier = tray.search.tier(),
                cleared_lines = tray.outcome.cleared_lines,
                score = tray.outcome.score,
                "good tray found"
            ),
            None => debug!(fill_ratio = self.grid.fill_ratio(), "no good tray found"),
        }
        found
    }

    fn shape(&self, id: ShapeId) -> Option<&'a Shape> {
        self.library.get(id)
    }

    fn evaluate(&self, ids: [ShapeId; TRAY_SIZE]) -> Option<TrayOutcome> {
        let shapes = [self.shape(ids[0])?, self.shape(ids[1])?, self.shape(ids[2])?];
        simulate_tray_placement(self.grid, shapes, self.policy)
    }

    fn accept(
        &self,
        picks: &Picks,
        search: GoodSearch,
        rule: impl Fn(&TrayOutcome) -> bool,
    ) -> Option<GoodTray> {
        let shapes: [ShapeId; TRAY_SIZE] = picks.as_slice().try_into().ok()?;
        let outcome = self.evaluate(shapes)?;
        (outcome.cleared_lines >= 1 && rule(&outcome)).then_some(GoodTray {
            shapes,
            search,
            outcome,
        })
    }

    fn random_triple(&self, rng: &mut SimpleRng) -> Option<Picks> {
        (0..TRAY_SIZE)
            .map(|_| self.library.random_shape(rng))
            .collect()
    }

    fn all_placeable(&self, picks: &Picks) -> bool {
        picks.iter().all(|id| self.placeable.contains(id))
    }

    /// Catalog shapes that fill `gap` exactly
    fn gap_shapes<'g>(&'g self, gap: &'g LineGap) -> impl Iterator<Item = ShapeId> + 'g {
        self.library
            .iter()
            .filter(move |(_, s)| gap_match(s, gap).is_some())
            .map(|(id, _)| id)
    }

    /// First gap not in `used` with a matching shape not yet picked
    fn next_gap_fill(
        &self,
        gaps: &[&LineGap],
        used: &[usize],
        picks: &Picks,
    ) -> Option<(usize, ShapeId)> {
        gaps.iter().enumerate().filter(|(i, _)| !used.contains(i)).find_map(|(i, gap)| {
            self.gap_shapes(gap)
                .find(|id| !picks.contains(id))
                .map(|id| (i, id))
        })
    }

    /// Exact fits for near-complete rows and columns
    pub fn near_complete_lines(&self, rng: &mut SimpleRng) -> Option<GoodTray> {
        let gaps = find_line_completion_gaps(self.grid);
        let near: Vec<&LineGap> = gaps.iter().filter(|g| g.near_complete).collect();
        if near.is_empty() {
            return None;
        }

        // Three columns at once.
        let columns: Vec<&LineGap> = near
            .iter()
            .copied()
            .filter(|g| g.kind == LineKind::Column)
            .take(COLUMN_COMBO_GAPS)
            .collect();
        if columns.len() == COLUMN_COMBO_GAPS {
            let mut picks = Picks::new();
            let mut used = Vec::new();
            'gaps: for (gi, gap) in columns.iter().enumerate() {
                for id in self.gap_shapes(gap) {
                    if !used.contains(&gi) && !picks.contains(&id) {
                        picks.push(id);
                        used.push(gi);
                        if picks.is_full() {
                            break 'gaps;
                        }
                    }
                }
            }
            if let Some(tray) = self.accept(&picks, GoodSearch::NearCompleteLines, |o| {
                o.cleared_lines >= 3
            }) {
                return Some(tray);
            }
        }

        let mut picks = Picks::new();
        let mut used = Vec::new();
        for (gi, gap) in near.iter().enumerate().take(NEAR_GAPS_EXAMINED) {
            if let Some(id) = self.gap_shapes(gap).find(|id| !picks.contains(id)) {
                picks.push(id);
                used.push(gi);
                if picks.is_full() {
                    break;
                }
            }
        }
        if picks.is_empty() {
            return None;
        }

        while !picks.is_full() {
            if let Some((gi, id)) = self.next_gap_fill(&near, &used, &picks) {
                picks.push(id);
                used.push(gi);
                continue;
            }
            let spare: Vec<ShapeId> = self
                .placeable
                .iter()
                .copied()
                .filter(|id| !picks.contains(id))
                .collect();
            match rng.choose(&spare) {
                Some(&id) => picks.push(id),
                None => break,
            }
        }

        self.accept(&picks, GoodSearch::NearCompleteLines, |o| {
            o.cleared_lines >= 2 || o.line_gap_matches >= 2
        })
    }

    /// Random all-placeable triples that clear 3+ lines
    pub fn multi_clear_probe(&self, rng: &mut SimpleRng) -> Option<GoodTray> {
        for _ in 0..self.limits.multi_clear_probe_attempts {
            let picks = self.random_triple(rng)?;
            if !self.all_placeable(&picks) {
                continue;
            }
            let rule = |o: &TrayOutcome| o.cleared_lines >= 3;
            if let Some(tray) = self.accept(&picks, GoodSearch::MultiClearProbe, rule) {
                return Some(tray);
            }
        }
        None
    }

    /// Combinations of shapes that fill the top line gaps
    pub fn gap_combination(&self, rng: &mut SimpleRng) -> Option<GoodTray> {
        let gaps = find_line_completion_gaps(self.grid);
        let all: Vec<&LineGap> = gaps.iter().collect();
        let matches: Vec<(ShapeId, usize)> = all
            .iter()
            .enumerate()
            .take(self.limits.top_line_gaps)
            .flat_map(|(gi, gap)| self.gap_shapes(gap).map(move |id| (id, gi)))
            .collect();
        if matches.len() < 2 {
            return None;
        }

        for _ in 0..self.limits.gap_combo_attempts {
            let mut picks = Picks::new();
            let mut used = Vec::new();
            for _ in 0..matches.len().min(TRAY_SIZE) {
                let Some(&(id, gi)) = rng.choose(&matches) else {
                    break;
                };
                if !used.contains(&gi) && !picks.contains(&id) {
                    picks.push(id);
                    used.push(gi);
                }
            }

            while !picks.is_full() {
                if let Some((gi, id)) = self.next_gap_fill(&all, &used, &picks) {
                    picks.push(id);
                    used.push(gi);
                } else if let Some(id) = self.library.random_shape(rng) {
                    picks.push(id);
                } else {
                    break;
                }
            }

            let rule = |o: &TrayOutcome| {
                o.cleared_lines >= 2
                    && (o.cleared_lines >= 3
                        || o.line_gap_matches >= 2
                        || (o.line_gap_matches >= 1 && o.score >= 100))
            };
            if let Some(tray) = self.accept(&picks, GoodSearch::GapCombination, rule) {
                return Some(tray);
            }
        }
        None
    }

    /// Random all-placeable triples judged by an acceptance ladder
    pub fn sampled(&self, rng: &mut SimpleRng) -> Option<GoodTray> {
        let rule = |o: &TrayOutcome| {
            let c = o.cleared_lines;
            let gaps = o.line_gap_matches;
            c >= 3
                || (gaps >= 2 && c >= 2)
                || (gaps >= 1 && c >= 2 && o.fitted_pieces() >= 2 && o.score >= 100)
                || (c >= 2 && gaps + o.exact_cavity_matches >= 2)
                || (c >= 2 && o.fitted_pieces() >= 2 && o.score >= 150)
        };
        for _ in 0..self.limits.good_sample_attempts {
            let picks = self.random_triple(rng)?;
            if !self.all_placeable(&picks) {
                continue;
            }
            if let Some(tray) = self.accept(&picks, GoodSearch::Sampled, rule) {
                return Some(tray);
            }
        }
        None
    }

    /// The three shapes that fit the board best on their own
    pub fn exact_fit(&self) -> Option<GoodTray> {
        let mut ranked: Vec<(i32, ShapeId)> = Vec::new();
        for cavity in find_matchable_cavities(self.grid) {
            for m in exact_cavity_matches(self.library, &cavity, self.grid) {
                ranked.push((EXACT_CAVITY_RANK - cavity.len() as i32, m.shape));
            }
        }
        for gap in find_line_completion_gaps(self.grid) {
            for id in self.gap_shapes(&gap) {
                ranked.push((EXACT_GAP_RANK - gap.empty_count as i32, id));
            }
        }
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        let mut picks = Picks::new();
        for &(_, id) in &ranked {
            if !picks.contains(&id) {
                picks.push(id);
                if picks.is_full() {
                    break;
                }
            }
        }

        let exact_ok = picks.is_full() && {
            let fits: Option<Vec<i32>> = picks
                .iter()
                .map(|&id| self.shape(id).and_then(|s| shape_fit_score(self.grid, s)))
                .collect();
            fits.is_some_and(|f| {
                f.iter().all(|&s| s >= EXACT_FIT_MIN_EACH)
                    && f.iter().sum::<i32>() >= EXACT_FIT_MIN_TOTAL
            })
        };

        if !exact_ok {
            let mut scored: Vec<(i32, ShapeId)> = self
                .library
                .iter()
                .filter_map(|(id, s)| shape_fit_score(self.grid, s).map(|f| (f, id)))
                .filter(|&(f, _)| f > 0)
                .collect();
            scored.sort_by(|a, b| b.0.cmp(&a.0));
            picks = scored
                .iter()
                .filter(|&&(f, _)| f >= BEST_FIT_MIN)
                .map(|&(_, id)| id)
                .take(TRAY_SIZE)
                .collect();
        }

        self.accept(&picks, GoodSearch::ExactFit, |_| true)
    }

    /// Solid 6-cell rectangles with a 2x2 square, or random triples
    pub fn simple_combo(&self, rng: &mut SimpleRng) -> Option<GoodTray> {
        let rects: Vec<ShapeId> = self
            .library
            .iter()
            .filter(|(_, s)| s.is_solid_rectangle() && s.cell_count() == 6)
            .map(|(id, _)| id)
            .collect();
        let squares: Vec<ShapeId> = self
            .library
            .iter()
            .filter(|(_, s)| s.is_solid_rectangle() && s.rows() == 2 && s.cols() == 2)
            .map(|(id, _)| id)
            .collect();
        let rule = |o: &TrayOutcome| o.cleared_lines >= 2;

        let pair_window = rects.len().min(RECT_PAIRS_WINDOW);
        for i in 0..pair_window {
            for j in i + 1..pair_window {
                for &square in squares.iter().take(SQUARES_WINDOW) {
                    let picks: Picks = [rects[i], rects[j], square].into();
                    if let Some(tray) = self.accept(&picks, GoodSearch::SimpleCombo, rule) {
                        return Some(tray);
                    }
                }
            }
        }

        let triple_window = rects.len().min(RECT_TRIPLES_WINDOW);
        for i in 0..triple_window {
            for j in i + 1..triple_window {
                for k in j + 1..triple_window {
                    let picks: Picks = [rects[i], rects[j], rects[k]].into();
                    if let Some(tray) = self.accept(&picks, GoodSearch::SimpleCombo, rule) {
                        return Some(tray);
                    }
                }
            }
        }

        for _ in 0..self.limits.simple_combo_attempts {
            let picks = self.random_triple(rng)?;
            if let Some(tray) = self.accept(&picks, GoodSearch::SimpleCombo, rule) {
                return Some(tray);
            }
        }
        None
    }
}
