use tracing::debug;

use crate::config::GameEngineOptions;
use crate::constants::{PLAYER_SIZE, PLAYER_SPEED};
use crate::error::SpawnError;
use crate::level::Level;
use crate::rng::Rng;
use crate::types::{
    DotState, DotView, GameOverReason, GameSummary, MoveInput, Rect, RuntimeEvent, Snapshot,
    Step, Vec2,
};

mod dot_ai;
mod open_area;
mod spawn_system;
mod utils;

pub use self::dot_ai::{should_explore, update_dots};
pub use self::open_area::{open_area, simulate_open_area, LookaheadCache};
pub use self::spawn_system::{resolve_captures, spawn_dots};
pub use self::utils::{slide_move, steer_toward};

#[derive(Clone, Debug, PartialEq)]
pub struct Dot {
    pub rect: Rect,
    pub state: DotState,
    pub last_position: Vec2,
    pub stuck_frames: u32,
    pub last_step: Option<Step>,
}

impl Dot {
    pub fn new(rect: Rect, last_position: Vec2) -> Self {
        Self {
            rect,
            state: DotState::Roaming,
            last_position,
            stuck_frames: 0,
            last_step: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state == DotState::Roaming
    }

    pub fn view(&self, slot: usize) -> DotView {
        DotView {
            slot,
            x: self.rect.x,
            y: self.rect.y,
            state: self.state,
            stuck_frames: self.stuck_frames,
        }
    }
}

/// Fixed set of dot slots for one level. Captured dots keep their slot.
#[derive(Clone, Debug, Default)]
pub struct Swarm {
    dots: Vec<Dot>,
}

impl Swarm {
    pub fn from_dots(dots: Vec<Dot>) -> Self {
        Self { dots }
    }

    pub fn len(&self) -> usize {
        self.dots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dots.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&Dot> {
        self.dots.get(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dot> {
        self.dots.iter()
    }

    pub fn alive_count(&self) -> usize {
        self.dots.iter().filter(|dot| dot.is_alive()).count()
    }

    pub fn views(&self) -> Vec<DotView> {
        self.dots
            .iter()
            .enumerate()
            .map(|(slot, dot)| dot.view(slot))
            .collect()
    }
}

/// Headless game session: one player box chasing a swarm of dots.
#[derive(Clone, Debug)]
pub struct GameEngine {
    pub level: Level,
    pub options: GameEngineOptions,

    rng: Rng,
    player: Rect,
    swarm: Swarm,
    events: Vec<RuntimeEvent>,
    score: u32,
    tick_counter: u64,
    ended: bool,
    end_reason: Option<GameOverReason>,
}

impl GameEngine {
    pub fn new(level: Level, seed: u64, options: GameEngineOptions) -> Result<Self, SpawnError> {
        let mut rng = Rng::new(seed);
        let player = level.player_start(PLAYER_SIZE);
        let swarm = spawn_dots(&level, &player, &options.tuning, &mut rng)?;
        debug!(seed, dots = swarm.len(), "game engine ready");

        Ok(Self {
            level,
            options,
            rng,
            player,
            swarm,
            events: Vec::new(),
            score: 0,
            tick_counter: 0,
            ended: false,
            end_reason: None,
        })
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn player_rect(&self) -> Rect {
        self.player
    }

    pub fn swarm(&self) -> &Swarm {
        &self.swarm
    }

    /// One frame: player move, dot decisions, capture resolution.
    pub fn step(&mut self, input: MoveInput) {
        if self.ended {
            return;
        }
        self.tick_counter += 1;

        self.move_player(input);
        update_dots(
            &mut self.swarm,
            &self.level,
            &self.player,
            &self.options.tuning,
            &mut self.rng,
        );
        self.resolve_captures();
        self.check_game_over();
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick_counter,
            score: self.score,
            player: self.player,
            dots: self.swarm.views(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            reason: self.end_reason.unwrap_or(GameOverReason::Timeout),
            ticks: self.tick_counter,
            score: self.score,
            dots_total: self.swarm.len(),
            dots_remaining: self.swarm.alive_count(),
        }
    }

    fn move_player(&mut self, input: MoveInput) {
        if input.is_idle() {
            return;
        }
        self.player = slide_move(
            &self.level,
            &self.player,
            input.x as f32 * PLAYER_SPEED,
            input.y as f32 * PLAYER_SPEED,
        );
    }

    fn resolve_captures(&mut self) {
        let alive_before: Vec<bool> = self.swarm.iter().map(Dot::is_alive).collect();
        let captured = resolve_captures(&mut self.swarm, &self.player);
        if captured == 0 {
            return;
        }
        self.score += captured as u32;
        for (slot, dot) in self.swarm.iter().enumerate() {
            if alive_before[slot] && !dot.is_alive() {
                self.events.push(RuntimeEvent::DotCaptured {
                    slot,
                    tick: self.tick_counter,
                });
            }
        }
    }

    fn check_game_over(&mut self) {
        let reason = if self.swarm.alive_count() == 0 {
            GameOverReason::Victory
        } else if self.tick_counter >= self.options.tick_limit {
            GameOverReason::Timeout
        } else {
            return;
        };
        self.ended = true;
        self.end_reason = Some(reason);
        self.events.push(RuntimeEvent::GameOver { reason });
        debug!(?reason, tick = self.tick_counter, score = self.score, "game over");
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::config::DotTuning;
    use crate::level::CollisionGrid;
    use crate::rng::Rng;
    use crate::types::ScoringVariant;

    fn make_engine(seed: u64, tick_limit: u64) -> GameEngine {
        GameEngine::new(
            Level::builtin(),
            seed,
            GameEngineOptions {
                tick_limit,
                tuning: DotTuning::default(),
            },
        )
        .expect("builtin level is spawnable")
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let mut a = make_engine(424_242, 600);
        let mut b = make_engine(424_242, 600);
        let inputs = [
            MoveInput::new(1, 0),
            MoveInput::new(0, 1),
            MoveInput::new(-1, 0),
            MoveInput::new(0, -1),
        ];

        for tick in 0..300 {
            let input = inputs[(tick / 25) % inputs.len()];
            a.step(input);
            b.step(input);
            let sa = a.build_snapshot(false);
            let sb = b.build_snapshot(false);
            assert_eq!(sa.score, sb.score);
            assert_eq!(sa.player, sb.player);
            for (da, db) in sa.dots.iter().zip(sb.dots.iter()) {
                assert_eq!(da.x.to_bits(), db.x.to_bits());
                assert_eq!(da.y.to_bits(), db.y.to_bits());
                assert_eq!(da.state, db.state);
            }
        }
    }

    #[test]
    fn capture_scores_once_and_freezes_the_dot() {
        let mut engine = make_engine(9, 10_000);
        let player = engine.player_rect();
        engine.swarm.dots[3].rect = Rect::new(player.x + 4.0, player.y + 4.0, 12.5, 12.5);

        // One dot step cannot carry it clear of the player box.
        engine.step(MoveInput::NONE);
        assert!(!engine.swarm.dots[3].is_alive());
        let frozen = engine.swarm.dots[3].rect;
        let score = engine.score();
        assert_eq!(score as usize, engine.swarm.len() - engine.swarm.alive_count());

        let snapshot = engine.build_snapshot(true);
        assert!(snapshot
            .events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::DotCaptured { slot: 3, .. })));

        for _ in 0..50 {
            engine.step(MoveInput::NONE);
            assert_eq!(engine.swarm.dots[3].rect, frozen);
            assert!(!engine.swarm.dots[3].is_alive());
        }
        let later = engine.build_snapshot(true);
        assert!(!later
            .events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::DotCaptured { slot: 3, .. })));
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = make_engine(5, 1);
        engine.step(MoveInput::NONE);
        assert!(engine.is_ended());

        let peek = engine.build_snapshot(false);
        assert!(peek.events.is_empty());
        let drained = engine.build_snapshot(true);
        assert_eq!(
            drained.events,
            vec![RuntimeEvent::GameOver {
                reason: GameOverReason::Timeout
            }]
        );
        assert!(engine.build_snapshot(true).events.is_empty());
        assert_eq!(engine.build_summary().reason, GameOverReason::Timeout);
    }

    #[test]
    fn capturing_every_dot_ends_in_victory() {
        let mut engine = make_engine(12, 10_000);
        let player = engine.player_rect();
        for dot in engine.swarm.dots.iter_mut() {
            dot.rect = Rect::new(player.x + 2.0, player.y + 2.0, 12.5, 12.5);
        }
        // Dots move at most one step before capture, still inside the player box.
        engine.step(MoveInput::NONE);
        assert!(engine.is_ended());
        let summary = engine.build_summary();
        assert_eq!(summary.reason, GameOverReason::Victory);
        assert_eq!(summary.score as usize, summary.dots_total);
        assert_eq!(summary.dots_remaining, 0);
    }

    #[test]
    fn ended_engine_ignores_further_steps() {
        let mut engine = make_engine(3, 2);
        engine.step(MoveInput::NONE);
        engine.step(MoveInput::NONE);
        assert!(engine.is_ended());
        let before = engine.build_snapshot(false);
        engine.step(MoveInput::new(1, 0));
        let after = engine.build_snapshot(false);
        assert_eq!(before.tick, after.tick);
        assert_eq!(before.player, after.player);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn live_dots_never_overlap_walls(seed in any::<u64>(), spacing in any::<bool>()) {
            let tuning = DotTuning {
                scoring: if spacing { ScoringVariant::Spacing } else { ScoringVariant::OpenSpace },
                ..DotTuning::default()
            };
            let level = Level::builtin();
            let player = level.player_start(PLAYER_SIZE);
            let mut rng = Rng::new(seed);
            let mut swarm = spawn_dots(&level, &player, &tuning, &mut rng).expect("spawnable");
            for _ in 0..90 {
                update_dots(&mut swarm, &level, &player, &tuning, &mut rng);
                for dot in swarm.iter().filter(|dot| dot.is_alive()) {
                    prop_assert!(!level.collides_with_walls(&dot.rect));
                }
            }
        }
    }
}
