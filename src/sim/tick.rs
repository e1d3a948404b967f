//! Fixed step simulation tick
//!
//! One call advances the world by exactly one step, resolving collisions in
//! a fixed order: walls, paddle, side bounds, cells, then terminal checks.

use super::collision::{
    ball_below, resolve_ball_cells, resolve_ball_paddle, resolve_ball_side_bounds,
    resolve_ball_wall,
};
use super::state::World;
use crate::consts::*;

/// Held input for a single step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
}

/// What the step ended in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    /// Every cell is destroyed
    Cleared,
    /// The ball left through the bottom edge
    BallLost,
}

/// Advance the world by one step
pub fn tick(world: &mut World, input: &TickInput) -> StepOutcome {
    world.steps += 1;
    let scale = world.playfield.scale;
    let left = world.playfield.left();
    let right = world.playfield.right();

    // Paddle velocity comes straight from the held flags
    let speed = PADDLE_SPEED * scale;
    world.paddle.vel_x = match (input.left, input.right) {
        (true, false) => -speed,
        (false, true) => speed,
        _ => 0.0,
    };
    let max_x = (right - world.paddle.width).max(left);
    world.paddle.pos.x = (world.paddle.pos.x + world.paddle.vel_x).clamp(left, max_x);

    world.ball.pos += world.ball.vel;

    for wall in &world.walls {
        resolve_ball_wall(&mut world.ball, &wall.rect);
    }

    let spin = PADDLE_SPIN_FACTOR * scale;
    let max_dx = world.ball_speed * BALL_MAX_HORIZONTAL_RATIO;
    resolve_ball_paddle(&mut world.ball, &world.paddle, spin, max_dx);

    resolve_ball_side_bounds(&mut world.ball, left, right);

    let hits = resolve_ball_cells(&mut world.ball, &mut world.cells);
    if hits > 0 {
        log::debug!(
            "Step {}: {} cell(s) destroyed, {} remaining",
            world.steps,
            hits,
            world.remaining_cells()
        );
    }

    // A clear in the same step the ball drops out counts as a win
    if world.all_cells_destroyed() {
        StepOutcome::Cleared
    } else if ball_below(&world.ball, world.playfield.bottom()) {
        StepOutcome::BallLost
    } else {
        StepOutcome::Continue
    }
}
