//! Deterministic simulation module
//!
//! All gameplay physics lives here. This module must stay pure:
//! - One fixed step per call
//! - Seeded RNG only
//! - No clock, rendering or storage dependencies

pub mod collision;
pub mod glyphs;
pub mod state;
pub mod tick;

pub use collision::{CollisionResult, Side, ball_rect_penetration};
pub use glyphs::{GLYPH_HEIGHT, Glyph, glyph, layout, layout_centered, measure};
pub use state::{Ball, Cell, Paddle, Playfield, Wall, World};
pub use tick::{StepOutcome, TickInput, tick};
