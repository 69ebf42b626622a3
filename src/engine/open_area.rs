//! Open-area estimation: how much room a dot has around a point.
//!
//! [`open_area`] is a bounded 4-connected flood fill; [`simulate_open_area`]
//! walks a few moves ahead and keeps the worst value it sees, so a dot
//! prefers spots whose whole near future stays roomy.

use std::collections::{HashMap, VecDeque};

use crate::level::CollisionGrid;
use crate::types::{Rect, Step, Vec2};

/// Counts walkable tiles reachable from `point` whose centers lie within
/// `radius`. The tile containing `point` is exempt from the radius test.
pub fn open_area<G: CollisionGrid + ?Sized>(grid: &G, point: Vec2, radius: f32) -> u32 {
    // Tiles further out than the grid extent are out of bounds anyway.
    let max_tiles = grid.width().max(grid.height()).max(0) as f32;
    let tile_radius = (radius / grid.cell_size()).floor().max(0.0).min(max_tiles) as i32 + 1;
    let span = 2 * tile_radius + 1;
    let (cx, cy) = grid.tile_of(point);
    let window_index = |tx: i32, ty: i32| -> Option<usize> {
        let ix = tx - cx + tile_radius;
        let iy = ty - cy + tile_radius;
        if ix < 0 || iy < 0 || ix >= span || iy >= span {
            return None;
        }
        Some((iy * span + ix) as usize)
    };

    let mut visited = vec![false; (span * span) as usize];
    let mut queue = VecDeque::new();
    if let Some(seed) = window_index(cx, cy) {
        visited[seed] = true;
    }
    queue.push_back((cx, cy));

    let mut open = 0;
    while let Some((tx, ty)) = queue.pop_front() {
        let is_seed = tx == cx && ty == cy;
        if !is_seed && grid.tile_center(tx, ty).distance(point) > radius {
            continue;
        }
        if !grid.in_bounds(tx, ty) || grid.is_wall(tx, ty) {
            continue;
        }
        open += 1;

        for (nx, ny) in [(tx - 1, ty), (tx + 1, ty), (tx, ty - 1), (tx, ty + 1)] {
            let Some(idx) = window_index(nx, ny) else {
                continue;
            };
            if !visited[idx] {
                visited[idx] = true;
                queue.push_back((nx, ny));
            }
        }
    }
    open
}

/// Minimum open area over every collision-free path of up to `depth` moves
/// of length `step_len` starting at `point` (the start itself included).
pub fn simulate_open_area<G: CollisionGrid + ?Sized>(
    grid: &G,
    point: Vec2,
    depth: u32,
    radius: f32,
    step_len: f32,
) -> u32 {
    lookahead(grid, point, depth, radius, step_len, None)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct LookaheadKey {
    x: u32,
    y: u32,
    depth: u32,
    radius: u32,
    step_len: u32,
}

impl LookaheadKey {
    fn new(point: Vec2, depth: u32, radius: f32, step_len: f32) -> Self {
        Self {
            x: point.x.to_bits(),
            y: point.y.to_bits(),
            depth,
            radius: radius.to_bits(),
            step_len: step_len.to_bits(),
        }
    }
}

/// Memo of lookahead results for one tick.
///
/// Keys are exact positions, so cached and uncached results are identical.
/// The grid must not change while a cache is alive.
#[derive(Debug, Default)]
pub struct LookaheadCache {
    entries: HashMap<LookaheadKey, u32>,
    hits: u64,
}

impl LookaheadCache {
    pub fn simulate<G: CollisionGrid + ?Sized>(
        &mut self,
        grid: &G,
        point: Vec2,
        depth: u32,
        radius: f32,
        step_len: f32,
    ) -> u32 {
        lookahead(grid, point, depth, radius, step_len, Some(self))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }
}

fn lookahead<G: CollisionGrid + ?Sized>(
    grid: &G,
    point: Vec2,
    depth: u32,
    radius: f32,
    step_len: f32,
    mut cache: Option<&mut LookaheadCache>,
) -> u32 {
    let key = LookaheadKey::new(point, depth, radius, step_len);
    if let Some(cache) = cache.as_deref_mut() {
        if let Some(value) = cache.entries.get(&key).copied() {
            cache.hits += 1;
            return value;
        }
    }

    let mut worst = open_area(grid, point, radius);
    if depth > 0 {
        for step in Step::ALL {
            let offset = step.displacement(step_len);
            let trial = Vec2::new(point.x + offset.x, point.y + offset.y);
            let probe = Rect::new(trial.x - 0.5, trial.y - 0.5, 1.0, 1.0);
            if grid.collides_with_walls(&probe) {
                continue;
            }
            let look = lookahead(grid, trial, depth - 1, radius, step_len, cache.as_deref_mut());
            worst = worst.min(look);
        }
    }

    if let Some(cache) = cache {
        cache.entries.insert(key, worst);
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DOT_SPEED;
    use crate::level::Level;

    fn open_room() -> Level {
        Level::parse(".....\n.....\n.....\n.....\n.....", 25.0).expect("valid level")
    }

    #[test]
    fn open_room_counts_follow_radius() {
        let level = open_room();
        let center = Vec2::new(62.5, 62.5);
        assert_eq!(open_area(&level, center, 0.0), 1);
        assert_eq!(open_area(&level, center, 20.0), 1);
        assert_eq!(open_area(&level, center, 30.0), 5);
        assert_eq!(open_area(&level, center, 40.0), 9);
    }

    #[test]
    fn zero_radius_reports_seed_walkability() {
        let level = Level::parse("#.\n..", 25.0).expect("valid level");
        assert_eq!(open_area(&level, Vec2::new(30.0, 3.0), 0.0), 1);
        assert_eq!(open_area(&level, Vec2::new(3.0, 3.0), 0.0), 0);
        assert_eq!(open_area(&level, Vec2::new(3.0, 3.0), 60.0), 0);
        assert_eq!(open_area(&level, Vec2::new(-30.0, 3.0), 60.0), 0);
    }

    #[test]
    fn walls_cut_off_the_fill() {
        let level = Level::parse(".#...\n.#...\n.#...", 25.0).expect("valid level");
        let point = Vec2::new(62.5, 37.5);
        assert_eq!(open_area(&level, point, 40.0), 6);
        // (0, 1) is within 55 but sealed off by the wall column.
        assert_eq!(open_area(&level, point, 55.0), 7);
    }

    #[test]
    fn huge_radius_fills_the_whole_connected_level() {
        let level = Level::builtin();
        let point = Vec2::new(37.5, 37.5);
        assert_eq!(open_area(&level, point, 1.0e11), level.floor_count() as u32);
        assert_eq!(open_area(&level, point, f32::INFINITY), level.floor_count() as u32);
    }

    #[test]
    fn depth_zero_lookahead_equals_open_area() {
        let level = Level::builtin();
        for (x, y) in [(37.5, 37.5), (40.0, 30.0), (410.0, 235.0), (12.0, 12.0)] {
            for radius in [0.0, 20.0, 45.0] {
                let point = Vec2::new(x, y);
                assert_eq!(
                    simulate_open_area(&level, point, 0, radius, DOT_SPEED),
                    open_area(&level, point, radius)
                );
            }
        }
    }

    #[test]
    fn deeper_lookahead_never_increases() {
        let level = open_room();
        let center = Vec2::new(62.5, 62.5);
        let flat = open_area(&level, center, 30.0);
        let shallow = simulate_open_area(&level, center, 1, 30.0, DOT_SPEED);
        let deep = simulate_open_area(&level, center, 2, 30.0, DOT_SPEED);
        assert!(shallow <= flat);
        assert!(deep <= shallow);
        assert!(deep < flat);
        assert!(simulate_open_area(&level, center, 2, 20.0, DOT_SPEED) <= 1);
    }

    #[test]
    fn cached_lookahead_matches_uncached() {
        let level = Level::builtin();
        let mut cache = LookaheadCache::default();
        for y in (30..420).step_by(17) {
            for x in (30..780).step_by(23) {
                let point = Vec2::new(x as f32, y as f32);
                assert_eq!(
                    cache.simulate(&level, point, 2, 20.0, DOT_SPEED),
                    simulate_open_area(&level, point, 2, 20.0, DOT_SPEED)
                );
            }
        }
        assert!(!cache.is_empty());
        let before = cache.hits();
        cache.simulate(&level, Vec2::new(30.0, 30.0), 2, 20.0, DOT_SPEED);
        assert!(cache.hits() > before);
    }
}
