//! Per-frame move selection for dots.
//!
//! Each live dot, in slot order: refresh its stuck counter, decide whether to
//! explore, collect legal steps, score them, then commit one step (or none
//! when boxed in).

use tracing::trace;

use super::open_area::LookaheadCache;
use super::{Dot, Swarm};
use crate::config::DotTuning;
use crate::level::CollisionGrid;
use crate::rng::Rng;
use crate::types::{Rect, ScoringVariant, Step, Vec2};

/// Advances every live dot by one tick.
///
/// The `Spacing` variant scores against dot positions captured before the
/// pass starts, so slot order never leaks into a decision.
pub fn update_dots<G: CollisionGrid + ?Sized>(
    swarm: &mut Swarm,
    grid: &G,
    player: &Rect,
    tuning: &DotTuning,
    rng: &mut Rng,
) {
    let positions_before_move: Vec<Option<Vec2>> = swarm
        .iter()
        .map(|dot| dot.is_alive().then(|| dot.rect.position()))
        .collect();
    let ctx = DecisionContext {
        grid,
        player,
        tuning,
        positions_before_move: &positions_before_move,
    };
    let mut cache = LookaheadCache::default();

    for (slot, dot) in swarm.dots.iter_mut().enumerate() {
        if !dot.is_alive() {
            continue;
        }
        ctx.update_dot(slot, dot, rng, &mut cache);
    }
}

/// Exploration roll for one dot. A dot stuck past its patience near the
/// player always explores; otherwise a single roll decides.
pub fn should_explore(
    stuck_frames: u32,
    player_distance: f32,
    tuning: &DotTuning,
    rng: &mut Rng,
) -> bool {
    let stuck = stuck_frames > tuning.patience_frames;
    if stuck && player_distance < tuning.panic_distance {
        return true;
    }
    let chance = if stuck {
        tuning.stuck_random_chance
    } else {
        tuning.base_random_chance
    };
    rng.bool(chance)
}

struct DecisionContext<'a, G: ?Sized> {
    grid: &'a G,
    player: &'a Rect,
    tuning: &'a DotTuning,
    positions_before_move: &'a [Option<Vec2>],
}

impl<G: CollisionGrid + ?Sized> DecisionContext<'_, G> {
    fn update_dot(&self, slot: usize, dot: &mut Dot, rng: &mut Rng, cache: &mut LookaheadCache) {
        let position = dot.rect.position();
        if position.distance(dot.last_position) < self.tuning.min_motion {
            dot.stuck_frames = dot.stuck_frames.saturating_add(1);
        } else {
            dot.stuck_frames = 0;
        }
        dot.last_position = position;

        let player_distance = position.distance(self.player.position());
        let explore = should_explore(dot.stuck_frames, player_distance, self.tuning, rng);

        let forbidden = if self.tuning.anti_oscillation {
            dot.last_step.map(Step::reversed)
        } else {
            None
        };
        let candidates = self.legal_steps(&dot.rect, forbidden);

        let choice = if candidates.is_empty() {
            // The reversal ban can close the only exit; retry without it.
            let unrestricted = self.legal_steps(&dot.rect, None);
            self.best_step(slot, &dot.rect, &unrestricted, cache)
        } else if explore {
            Some(candidates[rng.pick_index(candidates.len())])
        } else {
            self.best_step(slot, &dot.rect, &candidates, cache)
        };

        trace!(
            slot,
            stuck_frames = dot.stuck_frames,
            explore,
            candidates = candidates.len(),
            ?choice,
            "dot decision"
        );

        if let Some(step) = choice {
            let offset = step.displacement(self.tuning.speed);
            dot.rect = dot.rect.translated(offset.x, offset.y);
            dot.last_step = Some(step);
        }
    }

    fn legal_steps(&self, rect: &Rect, forbidden: Option<Step>) -> Vec<Step> {
        Step::ALL
            .into_iter()
            .filter(|step| Some(*step) != forbidden)
            .filter(|step| {
                let offset = step.displacement(self.tuning.speed);
                !self
                    .grid
                    .collides_with_walls(&rect.translated(offset.x, offset.y))
            })
            .collect()
    }

    /// Highest score wins; on ties the earliest candidate is kept.
    fn best_step(
        &self,
        slot: usize,
        rect: &Rect,
        candidates: &[Step],
        cache: &mut LookaheadCache,
    ) -> Option<Step> {
        let mut best: Option<(f32, Step)> = None;
        for &step in candidates {
            let offset = step.displacement(self.tuning.speed);
            let moved = rect.translated(offset.x, offset.y);
            let score = self.score(slot, &moved, cache);
            if best.map(|(top, _)| score > top).unwrap_or(true) {
                best = Some((score, step));
            }
        }
        best.map(|(_, step)| step)
    }

    fn score(&self, slot: usize, moved: &Rect, cache: &mut LookaheadCache) -> f32 {
        let player_distance = moved.position().distance(self.player.position());
        match self.tuning.scoring {
            ScoringVariant::OpenSpace => {
                let future_open = cache.simulate(
                    self.grid,
                    moved.center(),
                    self.tuning.lookahead_depth,
                    self.tuning.lookahead_radius,
                    self.tuning.speed,
                );
                future_open as f32 + player_distance * self.tuning.player_distance_weight
            }
            ScoringVariant::Spacing => {
                let nearest_dot = self
                    .positions_before_move
                    .iter()
                    .enumerate()
                    .filter(|(other, _)| *other != slot)
                    .filter_map(|(_, position)| *position)
                    .map(|position| moved.position().distance(position))
                    .fold(None, |nearest: Option<f32>, d| {
                        Some(nearest.map_or(d, |n| n.min(d)))
                    })
                    .unwrap_or(0.0);
                player_distance + nearest_dot * self.tuning.spacing_weight
            }
        }
    }
}
