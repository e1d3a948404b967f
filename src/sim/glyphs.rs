//! Bitmap glyph table for the destructible message
//!
//! Every glyph is `GLYPH_HEIGHT` rows tall; width varies per character.
//! A `1` marks a cell that becomes a destructible target.

use glam::Vec2;

/// Rows per glyph
pub const GLYPH_HEIGHT: usize = 5;

/// A fixed-height bitmap for one character
#[derive(Debug, Clone, Copy)]
pub struct Glyph {
    pub ch: char,
    pub rows: [&'static [u8]; GLYPH_HEIGHT],
}

impl Glyph {
    /// Width in cells
    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    /// (column, row) of every lit cell, row-major
    pub fn lit_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, bits)| {
            bits.iter()
                .enumerate()
                .filter(|(_, bit)| **bit == 1)
                .map(move |(col, _)| (col, row))
        })
    }
}

macro_rules! glyph {
    ($ch:expr, [$($row:expr),+ $(,)?]) => {
        Glyph { ch: $ch, rows: [$(&$row),+] }
    };
}

#[rustfmt::skip]
static GLYPHS: &[Glyph] = &[
    glyph!(' ', [[0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0]]),
    glyph!('!', [[1], [1], [1], [0], [1]]),
    glyph!('A', [[0, 1, 1, 0], [1, 0, 0, 1], [1, 1, 1, 1], [1, 0, 0, 1], [1, 0, 0, 1]]),
    glyph!('B', [[1, 1, 1, 0], [1, 0, 0, 1], [1, 1, 1, 0], [1, 0, 0, 1], [1, 1, 1, 0]]),
    glyph!('C', [[0, 1, 1, 1], [1, 0, 0, 0], [1, 0, 0, 0], [1, 0, 0, 0], [0, 1, 1, 1]]),
    glyph!('D', [[1, 1, 1, 0], [1, 0, 0, 1], [1, 0, 0, 1], [1, 0, 0, 1], [1, 1, 1, 0]]),
    glyph!('E', [[1, 1, 1, 1], [1, 0, 0, 0], [1, 1, 1, 0], [1, 0, 0, 0], [1, 1, 1, 1]]),
    glyph!('F', [[1, 1, 1, 1], [1, 0, 0, 0], [1, 1, 1, 0], [1, 0, 0, 0], [1, 0, 0, 0]]),
    glyph!('G', [[0, 1, 1, 1], [1, 0, 0, 0], [1, 0, 1, 1], [1, 0, 0, 1], [0, 1, 1, 1]]),
    glyph!('H', [[1, 0, 0, 1], [1, 0, 0, 1], [1, 1, 1, 1], [1, 0, 0, 1], [1, 0, 0, 1]]),
    glyph!('I', [[1, 1, 1], [0, 1, 0], [0, 1, 0], [0, 1, 0], [1, 1, 1]]),
    glyph!('J', [[0, 0, 1, 1], [0, 0, 0, 1], [0, 0, 0, 1], [1, 0, 0, 1], [0, 1, 1, 0]]),
    glyph!('K', [[1, 0, 0, 1], [1, 0, 1, 0], [1, 1, 0, 0], [1, 0, 1, 0], [1, 0, 0, 1]]),
    glyph!('L', [[1, 0, 0, 0], [1, 0, 0, 0], [1, 0, 0, 0], [1, 0, 0, 0], [1, 1, 1, 1]]),
    glyph!('M', [[1, 0, 0, 0, 1], [1, 1, 0, 1, 1], [1, 0, 1, 0, 1], [1, 0, 0, 0, 1], [1, 0, 0, 0, 1]]),
    glyph!('N', [[1, 0, 0, 1], [1, 1, 0, 1], [1, 0, 1, 1], [1, 0, 0, 1], [1, 0, 0, 1]]),
    glyph!('O', [[0, 1, 1, 0], [1, 0, 0, 1], [1, 0, 0, 1], [1, 0, 0, 1], [0, 1, 1, 0]]),
    glyph!('P', [[1, 1, 1, 0], [1, 0, 0, 1], [1, 1, 1, 0], [1, 0, 0, 0], [1, 0, 0, 0]]),
    glyph!('Q', [[0, 1, 1, 0], [1, 0, 0, 1], [1, 0, 0, 1], [1, 0, 1, 1], [0, 1, 1, 1]]),
    glyph!('R', [[1, 1, 1, 0], [1, 0, 0, 1], [1, 1, 1, 0], [1, 0, 1, 0], [1, 0, 0, 1]]),
    glyph!('S', [[0, 1, 1, 1], [1, 0, 0, 0], [0, 1, 1, 0], [0, 0, 0, 1], [1, 1, 1, 0]]),
    glyph!('T', [[1, 1, 1, 1, 1], [0, 0, 1, 0, 0], [0, 0, 1, 0, 0], [0, 0, 1, 0, 0], [0, 0, 1, 0, 0]]),
    glyph!('U', [[1, 0, 0, 1], [1, 0, 0, 1], [1, 0, 0, 1], [1, 0, 0, 1], [0, 1, 1, 0]]),
    glyph!('V', [[1, 0, 0, 0, 1], [1, 0, 0, 0, 1], [1, 0, 0, 0, 1], [0, 1, 0, 1, 0], [0, 0, 1, 0, 0]]),
    glyph!('W', [[1, 0, 0, 0, 1], [1, 0, 0, 0, 1], [1, 0, 1, 0, 1], [1, 1, 0, 1, 1], [1, 0, 0, 0, 1]]),
    glyph!('X', [[1, 0, 0, 1], [1, 0, 0, 1], [0, 1, 1, 0], [1, 0, 0, 1], [1, 0, 0, 1]]),
    glyph!('Y', [[1, 0, 0, 0, 1], [0, 1, 0, 1, 0], [0, 0, 1, 0, 0], [0, 0, 1, 0, 0], [0, 0, 1, 0, 0]]),
    glyph!('Z', [[1, 1, 1, 1], [0, 0, 0, 1], [0, 1, 1, 0], [1, 0, 0, 0], [1, 1, 1, 1]]),
];

/// Look up the glyph for a character (uppercase letters, space and `!`)
pub fn glyph(ch: char) -> Option<&'static Glyph> {
    GLYPHS.iter().find(|g| g.ch == ch)
}

/// Supported glyphs of `message`, in order; unsupported characters are dropped
fn glyphs_of(message: &str) -> impl Iterator<Item = &'static Glyph> + '_ {
    message.chars().filter_map(glyph)
}

/// Rendered size of `message` in pixels: (width, height)
pub fn measure(message: &str, cell_size: f32, spacing: f32) -> Vec2 {
    let mut width = 0.0;
    let mut count = 0usize;
    for g in glyphs_of(message) {
        width += g.width() as f32 * cell_size;
        count += 1;
    }
    if count > 1 {
        width += (count - 1) as f32 * spacing;
    }
    let height = if count == 0 {
        0.0
    } else {
        GLYPH_HEIGHT as f32 * cell_size
    };
    Vec2::new(width, height)
}

/// Top-left corner of every lit cell when `message` starts at `origin`
///
/// Glyphs are laid out left to right; `spacing` pixels separate consecutive glyphs.
pub fn layout(message: &str, cell_size: f32, spacing: f32, origin: Vec2) -> Vec<Vec2> {
    let mut cells = Vec::new();
    let mut cursor_x = origin.x;
    for g in glyphs_of(message) {
        cells.extend(g.lit_cells().map(|(col, row)| {
            Vec2::new(
                cursor_x + col as f32 * cell_size,
                origin.y + row as f32 * cell_size,
            )
        }));
        cursor_x += g.width() as f32 * cell_size + spacing;
    }
    cells
}

/// Lay out `message` centered on `center`
pub fn layout_centered(message: &str, cell_size: f32, spacing: f32, center: Vec2) -> Vec<Vec2> {
    let size = measure(message, cell_size, spacing);
    layout(message, cell_size, spacing, center - size * 0.5)
}
