//! Glyph Breakout - a Breakout game that tears down a pixel-art message
//!
//! Core modules:
//! - `sim`: Deterministic simulation (glyph layout, physics, collisions)
//! - `score`: Time/skill score with a frozen terminal value
//! - `controller`: Session state machine driving sim, score and submission
//! - `leaderboard`: Tiered top-50 storage with a durable and an in-process backend
//! - `server`: HTTP surface for the leaderboard

pub mod config;
pub mod controller;
pub mod leaderboard;
pub mod score;
pub mod server;
pub mod settings;
pub mod sim;

pub use controller::{GameController, GamePhase, Key, Snapshot};
pub use score::{Score, compute_score};
pub use settings::{Difficulty, GameSettings};

/// Game configuration constants
///
/// Lengths are in reference pixels and multiplied by the playfield scale.
/// Velocities are per simulation step (one step per rendered frame).
pub mod consts {
    /// Reference viewport the scale factor is measured against
    pub const BASE_VIEWPORT_WIDTH: f32 = 1280.0;
    pub const BASE_VIEWPORT_HEIGHT: f32 = 720.0;
    pub const MIN_SCALE: f32 = 0.5;
    pub const MAX_SCALE: f32 = 2.0;
    /// Smaller (or non-finite) viewports are laid out at this size
    pub const MIN_VIEWPORT_WIDTH: f32 = 320.0;
    pub const MIN_VIEWPORT_HEIGHT: f32 = 240.0;

    /// Playfield is this fraction of the viewport width, centered
    pub const PLAYFIELD_WIDTH_FRACTION: f32 = 0.6;
    pub const WALL_THICKNESS: f32 = 10.0;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 110.0;
    pub const PADDLE_HEIGHT: f32 = 12.0;
    /// Gap between the paddle's bottom edge and the playfield bottom
    pub const PADDLE_BOTTOM_OFFSET: f32 = 40.0;
    pub const PADDLE_SPEED: f32 = 9.0;
    /// Horizontal velocity added per unit of normalized off-center hit
    pub const PADDLE_SPIN_FACTOR: f32 = 3.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 7.0;
    pub const BALL_BASE_SPEED: f32 = 5.0;
    /// Horizontal speed cap as a multiple of the tier's ball speed
    pub const BALL_MAX_HORIZONTAL_RATIO: f32 = 1.5;
    /// Maximum launch deviation from straight up (radians)
    pub const BALL_LAUNCH_SPREAD: f32 = 0.45;

    /// Glyph layout
    pub const CELL_SIZE: f32 = 12.0;
    /// Empty columns between consecutive glyphs
    pub const LETTER_SPACING_CELLS: f32 = 1.0;
    /// Message rendered when no other is configured
    pub const DEFAULT_MESSAGE: &str = "HIRE ME";

    /// Score weights in thousandths of a point so quantization stays exact
    pub const TIME_WEIGHT_MILLI: u64 = 50; // 0.05 per elapsed ms
    pub const PIXEL_WEIGHT_MILLI: u64 = 100; // 0.1 per destroyed cell
    pub const SCORE_STEP: u64 = 10;

    /// Leaderboard cap per difficulty tier
    pub const MAX_ENTRIES_PER_TIER: usize = 50;
    pub const ANONYMOUS_NAME: &str = "Anonymous";
    pub const MAX_COMPANY_NAME_CHARS: usize = 40;
    /// Largest score or count accepted; the durable store ranks by `i64`
    pub const MAX_STORED_VALUE: u64 = i64::MAX as u64;
}

/// Axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub pos: glam::Vec2,
    pub size: glam::Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            pos: glam::Vec2::new(x, y),
            size: glam::Vec2::new(width, height),
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    pub fn center(&self) -> glam::Vec2 {
        self.pos + self.size * 0.5
    }

    /// Strict overlap test (touching edges do not count)
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}
