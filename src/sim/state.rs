//! Simulation entities and the world that owns them
//!
//! A `World` is created per session and mutated only by `tick`.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::glyphs;
use crate::Rect;
use crate::consts::*;
use crate::settings::Difficulty;

/// The ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    /// Center
    pub pos: Vec2,
    /// Displacement per step
    pub vel: Vec2,
    pub radius: f32,
}

impl Ball {
    /// Axis-aligned bounding box
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.pos.x - self.radius,
            self.pos.y - self.radius,
            self.radius * 2.0,
            self.radius * 2.0,
        )
    }
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    /// Top-left corner
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    /// Horizontal displacement applied this step
    pub vel_x: f32,
}

impl Paddle {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.width, self.height)
    }

    pub fn center_x(&self) -> f32 {
        self.pos.x + self.width / 2.0
    }
}

/// One of the three static walls bounding the playfield
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wall {
    pub rect: Rect,
}

/// One destructible unit of the message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Top-left corner
    pub pos: Vec2,
    /// Edge length
    pub size: f32,
    pub destroyed: bool,
}

impl Cell {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.size, self.size)
    }

    /// Mark destroyed; returns true only on the first call
    pub fn destroy(&mut self) -> bool {
        let first = !self.destroyed;
        self.destroyed = true;
        first
    }
}

/// The bounded play region inside the viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub bounds: Rect,
    /// Global scale applied to every length and speed
    pub scale: f32,
}

impl Playfield {
    /// Centered region `PLAYFIELD_WIDTH_FRACTION` of the viewport wide
    ///
    /// The top wall sits above the region, so the region starts one wall
    /// thickness below the viewport top.
    pub fn from_viewport(width: f32, height: f32) -> Self {
        let width = sanitize_extent(width, BASE_VIEWPORT_WIDTH, MIN_VIEWPORT_WIDTH);
        let height = sanitize_extent(height, BASE_VIEWPORT_HEIGHT, MIN_VIEWPORT_HEIGHT);
        let scale = (width / BASE_VIEWPORT_WIDTH)
            .min(height / BASE_VIEWPORT_HEIGHT)
            .clamp(MIN_SCALE, MAX_SCALE);
        let field_width = width * PLAYFIELD_WIDTH_FRACTION;
        let left = (width - field_width) / 2.0;
        let top = WALL_THICKNESS * scale;
        Self {
            bounds: Rect::new(left, top, field_width, (height - top).max(0.0)),
            scale,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.bounds.left()
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.bounds.right()
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.bounds.top()
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.bounds.bottom()
    }

    /// Top, left and right walls hugging the region from outside
    pub fn walls(&self) -> Vec<Wall> {
        let t = WALL_THICKNESS * self.scale;
        let b = self.bounds;
        vec![
            Wall {
                rect: Rect::new(b.left() - t, b.top() - t, b.size.x + 2.0 * t, t),
            },
            Wall {
                rect: Rect::new(b.left() - t, b.top() - t, t, b.size.y + t),
            },
            Wall {
                rect: Rect::new(b.right(), b.top() - t, t, b.size.y + t),
            },
        ]
    }
}

fn sanitize_extent(value: f32, fallback: f32, min: f32) -> f32 {
    if value.is_finite() {
        value.max(min)
    } else {
        fallback
    }
}

/// Complete simulation state for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub playfield: Playfield,
    pub ball: Ball,
    pub paddle: Paddle,
    pub walls: Vec<Wall>,
    pub cells: Vec<Cell>,
    /// Ball speed for the session's tier, already scaled
    pub ball_speed: f32,
    /// Simulation step counter
    pub steps: u64,
}

impl World {
    /// Fresh world: paddle centered, ball resting above it, all cells intact
    pub fn new(playfield: Playfield, difficulty: Difficulty, message: &str, seed: u64) -> Self {
        let scale = playfield.scale;

        let paddle_width = (PADDLE_WIDTH * scale).min(playfield.bounds.size.x);
        let paddle_height = PADDLE_HEIGHT * scale;
        let paddle = Paddle {
            pos: Vec2::new(
                playfield.left() + (playfield.bounds.size.x - paddle_width) / 2.0,
                playfield.bottom() - PADDLE_BOTTOM_OFFSET * scale - paddle_height,
            ),
            width: paddle_width,
            height: paddle_height,
            vel_x: 0.0,
        };

        let ball_speed = difficulty.ball_speed() * scale;
        let radius = BALL_RADIUS * scale;
        let mut rng = Pcg32::seed_from_u64(seed);
        let angle = rng.random_range(-BALL_LAUNCH_SPREAD..=BALL_LAUNCH_SPREAD);
        let ball = Ball {
            pos: Vec2::new(paddle.center_x(), paddle.pos.y - radius - 1.0),
            vel: Vec2::new(angle.sin(), -angle.cos()) * ball_speed,
            radius,
        };

        let cells = Self::build_cells(&playfield, message);
        log::info!(
            "World created: {} cells, scale {:.2}, ball speed {:.2}",
            cells.len(),
            scale,
            ball_speed
        );

        Self {
            playfield,
            ball,
            paddle,
            walls: playfield.walls(),
            cells,
            ball_speed,
            steps: 0,
        }
    }

    /// Cells for `message`, centered in the playfield
    ///
    /// The glyph table is uppercase only, so letters are folded first.
    pub fn build_cells(playfield: &Playfield, message: &str) -> Vec<Cell> {
        let size = CELL_SIZE * playfield.scale;
        let spacing = LETTER_SPACING_CELLS * size;
        let message = message.to_uppercase();
        glyphs::layout_centered(&message, size, spacing, playfield.bounds.center())
            .into_iter()
            .map(|pos| Cell {
                pos,
                size,
                destroyed: false,
            })
            .collect()
    }

    pub fn destroyed_count(&self) -> u32 {
        self.cells.iter().filter(|c| c.destroyed).count() as u32
    }

    pub fn remaining_cells(&self) -> usize {
        self.cells.iter().filter(|c| !c.destroyed).count()
    }

    pub fn all_cells_destroyed(&self) -> bool {
        self.cells.iter().all(|c| c.destroyed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(
            Playfield::from_viewport(1280.0, 720.0),
            Difficulty::Medium,
            "HIRE ME",
            7,
        )
    }

    #[test]
    fn test_playfield_is_centered_fraction() {
        let pf = Playfield::from_viewport(1000.0, 600.0);
        assert!((pf.bounds.size.x - 600.0).abs() < 0.001);
        assert!((pf.left() - 200.0).abs() < 0.001);
        assert!((pf.right() - 800.0).abs() < 0.001);
        assert!((pf.bottom() - 600.0).abs() < 0.001);
    }

    #[test]
    fn test_scale_is_clamped() {
        assert_eq!(Playfield::from_viewport(100.0, 100.0).scale, MIN_SCALE);
        assert_eq!(Playfield::from_viewport(10_000.0, 10_000.0).scale, MAX_SCALE);
    }

    #[test]
    fn test_degenerate_viewport_is_sanitized() {
        for (w, h) in [(0.0, 0.0), (80.0, 80.0), (f32::NAN, 600.0), (f32::INFINITY, -5.0)] {
            let pf = Playfield::from_viewport(w, h);
            assert!(pf.bounds.size.x >= MIN_VIEWPORT_WIDTH * PLAYFIELD_WIDTH_FRACTION);
            assert!(pf.bounds.size.y > 0.0);
            assert!(pf.scale.is_finite());
            let world = World::new(pf, Difficulty::Hard, "HI", 1);
            assert!(world.paddle.width <= pf.bounds.size.x);
        }
    }

    #[test]
    fn test_walls_touch_region_edges() {
        let pf = Playfield::from_viewport(1280.0, 720.0);
        let walls = pf.walls();
        assert_eq!(walls.len(), 3);
        assert_eq!(walls[0].rect.bottom(), pf.top());
        assert_eq!(walls[1].rect.right(), pf.left());
        assert_eq!(walls[2].rect.left(), pf.right());
    }

    #[test]
    fn test_new_world_starts_intact() {
        let w = world();
        assert!(!w.cells.is_empty());
        assert_eq!(w.destroyed_count(), 0);
        assert_eq!(w.remaining_cells(), w.cells.len());
        assert!(w.ball.vel.y < 0.0, "ball launches upward");
        assert!((w.ball.vel.length() - w.ball_speed).abs() < 0.001);
        assert!(w.paddle.pos.x >= w.playfield.left());
        assert!(w.paddle.pos.x + w.paddle.width <= w.playfield.right());
    }

    #[test]
    fn test_cells_fit_inside_playfield() {
        let w = world();
        for cell in &w.cells {
            assert!(cell.pos.x >= w.playfield.left());
            assert!(cell.pos.x + cell.size <= w.playfield.right());
            assert!(cell.pos.y >= w.playfield.top());
        }
    }

    #[test]
    fn test_cell_destroy_is_idempotent() {
        let mut cell = Cell {
            pos: Vec2::ZERO,
            size: 10.0,
            destroyed: false,
        };
        assert!(cell.destroy());
        assert!(!cell.destroy());
        assert!(cell.destroyed);
    }

    #[test]
    fn test_lowercase_message_builds_same_cells() {
        let pf = Playfield::from_viewport(1280.0, 720.0);
        assert_eq!(World::build_cells(&pf, "hire me"), World::build_cells(&pf, "HIRE ME"));
        assert!(World::build_cells(&pf, "123 ?").is_empty());
    }

    #[test]
    fn test_same_seed_same_launch() {
        let a = world();
        let b = world();
        assert_eq!(a.ball.vel, b.ball.vel);
        assert_eq!(a.cells, b.cells);
    }
}
