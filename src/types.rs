use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned box: top-left corner plus extent, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Rect {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Strict intersection: boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

/// One of the eight unit moves a dot can make in a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Step {
    pub dx: i8,
    pub dy: i8,
}

impl Step {
    /// Candidate order used for scoring; ties keep the earliest entry.
    pub const ALL: [Step; 8] = [
        Step { dx: -1, dy: -1 },
        Step { dx: -1, dy: 0 },
        Step { dx: -1, dy: 1 },
        Step { dx: 0, dy: -1 },
        Step { dx: 0, dy: 1 },
        Step { dx: 1, dy: -1 },
        Step { dx: 1, dy: 0 },
        Step { dx: 1, dy: 1 },
    ];

    pub fn reversed(self) -> Step {
        Step {
            dx: -self.dx,
            dy: -self.dy,
        }
    }

    pub fn displacement(self, speed: f32) -> Vec2 {
        Vec2::new(self.dx as f32 * speed, self.dy as f32 * speed)
    }
}

/// Player input for one tick; each axis is -1, 0 or 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveInput {
    pub x: i8,
    pub y: i8,
}

impl MoveInput {
    pub const NONE: MoveInput = MoveInput { x: 0, y: 0 };

    pub fn new(x: i8, y: i8) -> Self {
        Self {
            x: x.signum(),
            y: y.signum(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.x == 0 && self.y == 0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringVariant {
    /// Lookahead open area plus a light distance-to-player term.
    #[default]
    OpenSpace,
    /// Distance to player plus distance to the nearest other dot.
    Spacing,
}

impl ScoringVariant {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open_space" | "open-space" => Some(Self::OpenSpace),
            "spacing" => Some(Self::Spacing),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DotState {
    Roaming,
    Captured,
}

#[derive(Clone, Debug, Serialize)]
pub struct DotView {
    pub slot: usize,
    pub x: f32,
    pub y: f32,
    pub state: DotState,
    #[serde(rename = "stuckFrames")]
    pub stuck_frames: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    Victory,
    Timeout,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    DotCaptured { slot: usize, tick: u64 },
    GameOver { reason: GameOverReason },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub score: u32,
    pub player: Rect,
    pub dots: Vec<DotView>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub reason: GameOverReason,
    pub ticks: u64,
    pub score: u32,
    #[serde(rename = "dotsTotal")]
    pub dots_total: usize,
    #[serde(rename = "dotsRemaining")]
    pub dots_remaining: usize,
}
