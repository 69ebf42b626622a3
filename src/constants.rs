pub const TICK_RATE: u32 = 60;
pub const DEFAULT_TICK_LIMIT: u64 = TICK_RATE as u64 * 60 * 3;

pub const TILE_SIZE: f32 = 25.0;
pub const LEVEL_W: i32 = 32;
pub const LEVEL_H: i32 = 18;

pub const PLAYER_SIZE: f32 = 18.0;
pub const PLAYER_SPEED: f32 = 3.0;

pub const DOT_SPEED: f32 = 3.6;
pub const MAX_DOTS: usize = 10;

pub const MIN_MOTION: f32 = 1.0;
pub const STUCK_PATIENCE_FRAMES: u32 = 10;
pub const BASE_RANDOM_CHANCE: f32 = 0.1;
pub const STUCK_RANDOM_CHANCE: f32 = 0.5;
pub const PANIC_DISTANCE: f32 = 200.0;

pub const LOOKAHEAD_DEPTH: u32 = 2;
pub const MAX_LOOKAHEAD_DEPTH: u32 = 3;
pub const LOOKAHEAD_RADIUS: f32 = 20.0;
pub const MAX_LOOKAHEAD_RADIUS: f32 = TILE_SIZE * 8.0;
pub const PLAYER_DISTANCE_WEIGHT: f32 = 0.1;
pub const SPACING_WEIGHT: f32 = 0.7;

pub const SPAWN_MIN_DISTANCE_CELLS: f32 = 4.0;
pub const SPAWN_MAX_ATTEMPTS: u32 = 4_096;
