use crate::level::CollisionGrid;
use crate::types::{MoveInput, Rect, Vec2};

/// Moves `rect` by `(dx, dy)`, sliding along walls: the full move is tried
/// first, then the x component alone, then the y component alone.
pub fn slide_move<G: CollisionGrid + ?Sized>(grid: &G, rect: &Rect, dx: f32, dy: f32) -> Rect {
    for (mx, my) in [(dx, dy), (dx, 0.0), (0.0, dy)] {
        if mx == 0.0 && my == 0.0 {
            continue;
        }
        let next = rect.translated(mx, my);
        if !grid.collides_with_walls(&next) {
            return next;
        }
    }
    *rect
}

/// Input pointing from `from` toward `to`, ignoring axes already within
/// `dead_zone`.
pub fn steer_toward(from: Vec2, to: Vec2, dead_zone: f32) -> MoveInput {
    let axis = |delta: f32| -> i8 {
        if delta > dead_zone {
            1
        } else if delta < -dead_zone {
            -1
        } else {
            0
        }
    };
    MoveInput::new(axis(to.x - from.x), axis(to.y - from.y))
}
