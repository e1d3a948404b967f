//! Collision detection and response for axis-aligned geometry
//!
//! The ball is treated as its bounding box everywhere; only the response
//! differs between walls, paddle and cells.

use glam::Vec2;

use super::state::{Ball, Cell, Paddle};
use crate::Rect;

/// Side of a rectangle the ball was pushed out through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    pub hit: bool,
    /// Side with the smallest penetration (if hit)
    pub side: Option<Side>,
    /// Depth along that side
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            side: None,
            penetration: 0.0,
        }
    }
}

/// Find the wall side with minimum penetration of the ball's bounding box
pub fn ball_rect_penetration(ball: &Ball, rect: &Rect) -> CollisionResult {
    let b = ball.bounds();
    if !b.overlaps(rect) {
        return CollisionResult::miss();
    }

    let candidates = [
        (Side::Left, b.right() - rect.left()),
        (Side::Right, rect.right() - b.left()),
        (Side::Top, b.bottom() - rect.top()),
        (Side::Bottom, rect.bottom() - b.top()),
    ];

    // First minimum wins so ties resolve in Left, Right, Top, Bottom order
    let (side, penetration) = candidates
        .into_iter()
        .fold(candidates[0], |best, c| if c.1 < best.1 { c } else { best });

    CollisionResult {
        hit: true,
        side: Some(side),
        penetration,
    }
}

/// Bounce the ball off a wall: negate the perpendicular velocity and move it
/// just outside the side of minimum penetration
pub fn resolve_ball_wall(ball: &mut Ball, rect: &Rect) -> bool {
    let result = ball_rect_penetration(ball, rect);
    let (true, Some(side)) = (result.hit, result.side) else {
        return false;
    };

    let depth = result.penetration;
    match side {
        Side::Left => {
            ball.vel.x = -ball.vel.x;
            ball.pos.x -= depth;
        }
        Side::Right => {
            ball.vel.x = -ball.vel.x;
            ball.pos.x += depth;
        }
        Side::Top => {
            ball.vel.y = -ball.vel.y;
            ball.pos.y -= depth;
        }
        Side::Bottom => {
            ball.vel.y = -ball.vel.y;
            ball.pos.y += depth;
        }
    }
    true
}

/// Top-face paddle bounce with off-center steering
///
/// Vertical velocity always ends up negative and the ball rests on the
/// paddle's top edge. `spin` is the horizontal velocity added for a hit at
/// the paddle's very end; `max_dx` caps the resulting horizontal speed.
pub fn resolve_ball_paddle(ball: &mut Ball, paddle: &Paddle, spin: f32, max_dx: f32) -> bool {
    if !ball.bounds().overlaps(&paddle.bounds()) {
        return false;
    }

    ball.vel.y = -ball.vel.y.abs();
    ball.pos.y = paddle.pos.y - ball.radius;

    let half = paddle.width / 2.0;
    let offset = ((ball.pos.x - paddle.center_x()) / half).clamp(-1.0, 1.0);
    ball.vel.x = (ball.vel.x + offset * spin).clamp(-max_dx, max_dx);
    true
}

/// Keep the ball between `left` and `right`, bouncing horizontally
pub fn resolve_ball_side_bounds(ball: &mut Ball, left: f32, right: f32) -> bool {
    if ball.pos.x - ball.radius < left {
        ball.pos.x = left + ball.radius;
        ball.vel.x = -ball.vel.x;
        true
    } else if ball.pos.x + ball.radius > right {
        ball.pos.x = right - ball.radius;
        ball.vel.x = -ball.vel.x;
        true
    } else {
        false
    }
}

/// Destroy every intact cell the ball overlaps, bouncing at most once per axis
///
/// The flipped axis is the one with the larger center-to-center distance.
/// Returns the number of cells destroyed.
pub fn resolve_ball_cells(ball: &mut Ball, cells: &mut [Cell]) -> u32 {
    let bounds = ball.bounds();
    let mut destroyed = 0;
    let (mut flip_x, mut flip_y) = (false, false);
    for cell in cells.iter_mut().filter(|c| !c.destroyed) {
        if !bounds.overlaps(&cell.bounds()) {
            continue;
        }
        if cell.destroy() {
            destroyed += 1;
        }
        let delta: Vec2 = ball.pos - cell.bounds().center();
        if delta.x.abs() > delta.y.abs() {
            flip_x = true;
        } else {
            flip_y = true;
        }
    }
    // Adjacent cells hit together must not cancel each other's bounce
    if flip_x {
        ball.vel.x = -ball.vel.x;
    }
    if flip_y {
        ball.vel.y = -ball.vel.y;
    }
    destroyed
}

/// Ball's top edge is below the playfield bottom
pub fn ball_below(ball: &Ball, bottom: f32) -> bool {
    ball.pos.y - ball.radius > bottom
}
