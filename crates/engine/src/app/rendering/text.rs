use super::Rgba;

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;
pub const DEFAULT_TEXT_SCALE: i32 = 3;
pub const GLYPH_ADVANCE: i32 = (GLYPH_WIDTH + 1) * DEFAULT_TEXT_SCALE;
pub const LINE_ADVANCE: i32 = (GLYPH_HEIGHT + 2) * DEFAULT_TEXT_SCALE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    pub color: Rgba,
    pub scale: i32,
}

impl TextStyle {
    pub const fn new(color: Rgba) -> Self {
        Self {
            color,
            scale: DEFAULT_TEXT_SCALE,
        }
    }

    pub const fn with_scale(mut self, scale: i32) -> Self {
        self.scale = scale;
        self
    }

    pub(crate) fn pixel_scale(&self) -> i32 {
        self.scale.max(1)
    }

    pub fn glyph_advance(&self) -> i32 {
        (GLYPH_WIDTH + 1) * self.pixel_scale()
    }

    pub fn line_advance(&self) -> i32 {
        (GLYPH_HEIGHT + 2) * self.pixel_scale()
    }

    pub fn text_width(&self, text: &str) -> i32 {
        text.chars().count() as i32 * self.glyph_advance()
    }
}

/// Row bitmaps for the 3x5 font. Bit 2 is the leftmost column.
type GlyphRows = [u8; GLYPH_HEIGHT as usize];

const FONT: &[(char, GlyphRows)] = &[
    (' ', [0b000, 0b000, 0b000, 0b000, 0b000]),
    ('A', [0b010, 0b101, 0b111, 0b101, 0b101]),
    ('B', [0b110, 0b101, 0b110, 0b101, 0b110]),
    ('C', [0b011, 0b100, 0b100, 0b100, 0b011]),
    ('D', [0b110, 0b101, 0b101, 0b101, 0b110]),
    ('E', [0b111, 0b100, 0b110, 0b100, 0b111]),
    ('F', [0b111, 0b100, 0b110, 0b100, 0b100]),
    ('G', [0b011, 0b100, 0b101, 0b101, 0b011]),
    ('H', [0b101, 0b101, 0b111, 0b101, 0b101]),
    ('I', [0b111, 0b010, 0b010, 0b010, 0b111]),
    ('J', [0b001, 0b001, 0b001, 0b101, 0b010]),
    ('K', [0b101, 0b101, 0b110, 0b101, 0b101]),
    ('L', [0b100, 0b100, 0b100, 0b100, 0b111]),
    ('M', [0b101, 0b111, 0b111, 0b101, 0b101]),
    ('N', [0b110, 0b101, 0b101, 0b101, 0b101]),
    ('O', [0b010, 0b101, 0b101, 0b101, 0b010]),
    ('P', [0b110, 0b101, 0b110, 0b100, 0b100]),
    ('Q', [0b010, 0b101, 0b101, 0b110, 0b011]),
    ('R', [0b110, 0b101, 0b110, 0b101, 0b101]),
    ('S', [0b011, 0b100, 0b010, 0b001, 0b110]),
    ('T', [0b111, 0b010, 0b010, 0b010, 0b010]),
    ('U', [0b101, 0b101, 0b101, 0b101, 0b111]),
    ('V', [0b101, 0b101, 0b101, 0b101, 0b010]),
    ('W', [0b101, 0b101, 0b111, 0b111, 0b101]),
    ('X', [0b101, 0b101, 0b010, 0b101, 0b101]),
    ('Y', [0b101, 0b101, 0b010, 0b010, 0b010]),
    ('Z', [0b111, 0b001, 0b010, 0b100, 0b111]),
    ('0', [0b111, 0b101, 0b101, 0b101, 0b111]),
    ('1', [0b010, 0b110, 0b010, 0b010, 0b111]),
    ('2', [0b110, 0b001, 0b010, 0b100, 0b111]),
    ('3', [0b110, 0b001, 0b010, 0b001, 0b110]),
    ('4', [0b101, 0b101, 0b111, 0b001, 0b001]),
    ('5', [0b111, 0b100, 0b110, 0b001, 0b110]),
    ('6', [0b011, 0b100, 0b111, 0b101, 0b111]),
    ('7', [0b111, 0b001, 0b010, 0b010, 0b010]),
    ('8', [0b111, 0b101, 0b111, 0b101, 0b111]),
    ('9', [0b111, 0b101, 0b111, 0b001, 0b110]),
    ('.', [0b000, 0b000, 0b000, 0b000, 0b010]),
    (',', [0b000, 0b000, 0b000, 0b010, 0b100]),
    ('!', [0b010, 0b010, 0b010, 0b000, 0b010]),
    ('?', [0b111, 0b001, 0b010, 0b000, 0b010]),
    (':', [0b000, 0b010, 0b000, 0b010, 0b000]),
    (';', [0b000, 0b010, 0b000, 0b010, 0b100]),
    ('-', [0b000, 0b000, 0b111, 0b000, 0b000]),
    ('+', [0b000, 0b010, 0b111, 0b010, 0b000]),
    ('=', [0b000, 0b111, 0b000, 0b111, 0b000]),
    ('_', [0b000, 0b000, 0b000, 0b000, 0b111]),
    ('/', [0b001, 0b001, 0b010, 0b100, 0b100]),
    ('(', [0b001, 0b010, 0b010, 0b010, 0b001]),
    (')', [0b100, 0b010, 0b010, 0b010, 0b100]),
    ('[', [0b011, 0b010, 0b010, 0b010, 0b011]),
    (']', [0b110, 0b010, 0b010, 0b010, 0b110]),
    ('<', [0b001, 0b010, 0b100, 0b010, 0b001]),
    ('>', [0b100, 0b010, 0b001, 0b010, 0b100]),
    ('\'', [0b010, 0b010, 0b000, 0b000, 0b000]),
    ('"', [0b101, 0b101, 0b000, 0b000, 0b000]),
    ('*', [0b000, 0b101, 0b010, 0b101, 0b000]),
    ('#', [0b101, 0b111, 0b101, 0b111, 0b101]),
    ('%', [0b101, 0b001, 0b010, 0b100, 0b101]),
    ('&', [0b010, 0b101, 0b010, 0b101, 0b011]),
];

const UNKNOWN_GLYPH: char = '?';

pub(crate) fn glyph_rows(ch: char) -> GlyphRows {
    let upper = ch.to_ascii_uppercase();
    lookup(upper)
        .or_else(|| lookup(UNKNOWN_GLYPH))
        .unwrap_or([0; GLYPH_HEIGHT as usize])
}

fn lookup(ch: char) -> Option<GlyphRows> {
    FONT.iter()
        .find(|(glyph_char, _)| *glyph_char == ch)
        .map(|(_, rows)| *rows)
}

/// Cells of a glyph that should be lit, as (column, row) pairs.
pub(crate) fn lit_cells(ch: char) -> impl Iterator<Item = (i32, i32)> {
    let rows = glyph_rows(ch);
    (0..GLYPH_HEIGHT).flat_map(move |row| {
        let bits = rows[row as usize];
        (0..GLYPH_WIDTH)
            .filter(move |col| bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0)
            .map(move |col| (col, row))
    })
}
