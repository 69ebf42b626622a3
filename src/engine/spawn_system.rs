use tracing::{debug, warn};

use super::{Dot, Swarm};
use crate::config::DotTuning;
use crate::error::SpawnError;
use crate::level::CollisionGrid;
use crate::rng::Rng;
use crate::types::{DotState, Rect};

/// Places `tuning.max_dots` dots on random floor tiles whose centers are at
/// least `spawn_min_distance_cells` cells from the player's center.
///
/// Each slot gets `spawn_max_attempts` draws; running out is reported
/// instead of retrying forever.
pub fn spawn_dots<G: CollisionGrid + ?Sized>(
    grid: &G,
    player: &Rect,
    tuning: &DotTuning,
    rng: &mut Rng,
) -> Result<Swarm, SpawnError> {
    tuning.validate()?;
    let cell = grid.cell_size();
    let min_distance = tuning.spawn_min_distance_cells * cell;
    let player_center = player.center();
    let mut dots = Vec::with_capacity(tuning.max_dots);

    while dots.len() < tuning.max_dots {
        let mut spawned = None;
        for _ in 0..tuning.spawn_max_attempts {
            let gx = rng.int(0, grid.width() - 1);
            let gy = rng.int(0, grid.height() - 1);
            if grid.is_wall(gx, gy) {
                continue;
            }
            let center = grid.tile_center(gx, gy);
            if center.distance(player_center) < min_distance {
                continue;
            }
            spawned = Some((gx, gy));
            break;
        }

        let Some((gx, gy)) = spawned else {
            warn!(
                placed = dots.len(),
                required = tuning.max_dots,
                attempts = tuning.spawn_max_attempts,
                "dot spawn exhausted its attempts"
            );
            return Err(SpawnError::Unsatisfiable {
                placed: dots.len(),
                required: tuning.max_dots,
                attempts: tuning.spawn_max_attempts,
            });
        };

        let rect = Rect::new(
            gx as f32 * cell + cell / 4.0,
            gy as f32 * cell + cell / 4.0,
            cell / 2.0,
            cell / 2.0,
        );
        debug!(slot = dots.len(), gx, gy, "dot spawned");
        dots.push(Dot::new(rect, grid.tile_center(gx, gy)));
    }

    Ok(Swarm::from_dots(dots))
}

/// Marks every live dot touching the player as captured and returns how
/// many were caught this call.
pub fn resolve_captures(swarm: &mut Swarm, player: &Rect) -> usize {
    let mut captured = 0;
    for (slot, dot) in swarm.dots.iter_mut().enumerate() {
        if !dot.is_alive() || !dot.rect.overlaps(player) {
            continue;
        }
        dot.state = DotState::Captured;
        captured += 1;
        debug!(slot, "dot captured");
    }
    captured
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PLAYER_SIZE;
    use crate::level::Level;

    #[test]
    fn spawned_dots_keep_their_distance_from_player() {
        let level = Level::builtin();
        let player = level.player_start(PLAYER_SIZE);
        let tuning = DotTuning::default();
        let min_distance = tuning.spawn_min_distance_cells * level.cell_size;

        for seed in 0..200u64 {
            let mut rng = Rng::new(seed);
            let swarm = spawn_dots(&level, &player, &tuning, &mut rng).expect("spawnable");
            assert_eq!(swarm.len(), tuning.max_dots);
            for dot in swarm.iter() {
                assert!(dot.is_alive());
                assert!(
                    dot.rect.center().distance(player.center()) >= min_distance,
                    "dot too close: seed={seed}"
                );
                assert!(!level.collides_with_walls(&dot.rect));
                assert_eq!(dot.last_position, dot.rect.center());
                assert_eq!(dot.stuck_frames, 0);
                assert_eq!(dot.last_step, None);
            }
        }
    }

    #[test]
    fn cramped_level_reports_unsatisfiable_spawn() {
        let level = Level::parse("#####\n#...#\n#####", 25.0).expect("valid level");
        let player = level.player_start(PLAYER_SIZE);
        let tuning = DotTuning {
            spawn_max_attempts: 64,
            ..DotTuning::default()
        };
        let mut rng = Rng::new(1);
        let err = spawn_dots(&level, &player, &tuning, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            SpawnError::Unsatisfiable {
                placed: 0,
                required: 10,
                attempts: 64
            }
        ));
    }

    #[test]
    fn invalid_tuning_is_rejected_before_sampling() {
        let level = Level::builtin();
        let player = level.player_start(PLAYER_SIZE);
        let tuning = DotTuning {
            max_dots: 0,
            ..DotTuning::default()
        };
        let mut rng = Rng::new(1);
        assert!(matches!(
            spawn_dots(&level, &player, &tuning, &mut rng),
            Err(SpawnError::Config(_))
        ));
    }

    #[test]
    fn capture_counts_each_dot_once() {
        let player = Rect::new(100.0, 100.0, 18.0, 18.0);
        let mut swarm = Swarm::from_dots(vec![
            Dot::new(Rect::new(110.0, 110.0, 12.5, 12.5), Default::default()),
            Dot::new(Rect::new(300.0, 300.0, 12.5, 12.5), Default::default()),
            Dot::new(Rect::new(118.0, 90.0, 12.5, 12.5), Default::default()),
        ]);

        assert_eq!(resolve_captures(&mut swarm, &player), 1);
        assert!(!swarm.get(0).expect("slot 0").is_alive());
        assert!(swarm.get(1).expect("slot 1").is_alive());
        // Slot 2 only touches the player's right edge.
        assert!(swarm.get(2).expect("slot 2").is_alive());

        for _ in 0..5 {
            assert_eq!(resolve_captures(&mut swarm, &player), 0);
        }
        assert_eq!(swarm.len(), 3);
        assert_eq!(swarm.alive_count(), 2);
    }
}
