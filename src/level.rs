use std::path::Path;

use crate::constants::TILE_SIZE;
use crate::error::LevelError;
use crate::types::{Rect, Vec2};

const FLOOR: u8 = b'.';

const BUILTIN_MAZE: [&str; 18] = [
    "################################",
    "#......#...........#...........#",
    "#.####.#.#####.###.#.#####.###.#",
    "#.#....#.....#...#...#.....#...#",
    "#.#.########.###.#####.#####.#.#",
    "#.#..........#.....#.........#.#",
    "#.######.###.#.###.#.###.#####.#",
    "#......#...#...#.......#.....#.#",
    "####.#.###.#####..###..#####.#.#",
    "#....#.....#...................#",
    "#.########.#.###.###.#######.#.#",
    "#..........#...#...#.....#...#.#",
    "#.####.#######.###.#####.#.###.#",
    "#....#.......#.....#.....#.....#",
    "####.#######.#####.#.#########.#",
    "#......#.........#.#.......#...#",
    "#.####...#######.....#####...#.#",
    "################################",
];

/// Read-only wall queries the dot logic needs from a level.
///
/// Tiles outside the grid count as walls.
pub trait CollisionGrid {
    fn width(&self) -> i32;
    fn height(&self) -> i32;
    fn cell_size(&self) -> f32;
    fn is_wall(&self, x: i32, y: i32) -> bool;

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width() && y < self.height()
    }

    fn tile_of(&self, point: Vec2) -> (i32, i32) {
        let s = self.cell_size();
        ((point.x / s).floor() as i32, (point.y / s).floor() as i32)
    }

    fn tile_center(&self, x: i32, y: i32) -> Vec2 {
        let s = self.cell_size();
        Vec2::new(x as f32 * s + s / 2.0, y as f32 * s + s / 2.0)
    }

    /// True when `rect` overlaps any wall tile (edge contact excluded).
    fn collides_with_walls(&self, rect: &Rect) -> bool {
        let s = self.cell_size();
        let min_x = (rect.x / s).floor() as i32;
        let min_y = (rect.y / s).floor() as i32;
        let max_x = ((rect.x + rect.width) / s).floor() as i32;
        let max_y = ((rect.y + rect.height) / s).floor() as i32;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                if !self.is_wall(x, y) {
                    continue;
                }
                let tile = Rect::new(x as f32 * s, y as f32 * s, s, s);
                if rect.overlaps(&tile) {
                    return true;
                }
            }
        }
        false
    }
}

#[derive(Clone, Debug)]
pub struct Level {
    pub width: i32,
    pub height: i32,
    pub cell_size: f32,
    pub tiles: Vec<String>,
}

impl Level {
    /// Parses an ASCII level: `#` is a wall, `.` is floor, one row per line.
    pub fn parse(text: &str, cell_size: f32) -> Result<Self, LevelError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(LevelError::InvalidCellSize(cell_size));
        }
        let rows: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end())
            .filter(|line| !line.is_empty())
            .collect();
        let Some(first) = rows.first() else {
            return Err(LevelError::Empty);
        };
        let expected = first.len();
        for (y, row) in rows.iter().enumerate() {
            let unknown = row
                .chars()
                .enumerate()
                .find(|(_, tile)| !matches!(tile, '#' | '.'));
            if let Some((x, tile)) = unknown {
                return Err(LevelError::UnknownTile { tile, x, y });
            }
            if row.len() != expected {
                return Err(LevelError::RaggedRow {
                    row: y,
                    expected,
                    found: row.len(),
                });
            }
        }

        let level = Self {
            width: expected as i32,
            height: rows.len() as i32,
            cell_size,
            tiles: rows.into_iter().map(str::to_string).collect(),
        };
        if level.floor_count() == 0 {
            return Err(LevelError::NoFloor);
        }
        Ok(level)
    }

    pub fn load(path: &Path, cell_size: f32) -> Result<Self, LevelError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, cell_size)
    }

    pub fn builtin() -> Self {
        Self {
            width: BUILTIN_MAZE[0].len() as i32,
            height: BUILTIN_MAZE.len() as i32,
            cell_size: TILE_SIZE,
            tiles: BUILTIN_MAZE.iter().map(|row| row.to_string()).collect(),
        }
    }

    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        self.tiles
            .get(y as usize)
            .and_then(|row| row.as_bytes().get(x as usize))
            .map(|c| *c == FLOOR)
            .unwrap_or(false)
    }

    pub fn floor_count(&self) -> usize {
        self.tiles
            .iter()
            .map(|row| row.bytes().filter(|c| *c == FLOOR).count())
            .sum()
    }

    /// Player box centered on the walkable tile closest to the level center.
    pub fn player_start(&self, player_size: f32) -> Rect {
        let center_x = self.width / 2;
        let center_y = self.height / 2;
        let mut best: Option<(i32, i32, i32)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.is_walkable(x, y) {
                    continue;
                }
                let dx = x - center_x;
                let dy = y - center_y;
                let dist = dx * dx + dy * dy;
                if best.map(|(d, _, _)| dist < d).unwrap_or(true) {
                    best = Some((dist, x, y));
                }
            }
        }
        let (_, x, y) = best.unwrap_or((0, center_x, center_y));
        let s = self.cell_size;
        Rect::new(
            x as f32 * s + (s - player_size) / 2.0,
            y as f32 * s + (s - player_size) / 2.0,
            player_size,
            player_size,
        )
    }
}

impl CollisionGrid for Level {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn cell_size(&self) -> f32 {
        self.cell_size
    }

    fn is_wall(&self, x: i32, y: i32) -> bool {
        !self.is_walkable(x, y)
    }
}
