use super::text::lit_cells;
use super::{PixelImage, TextStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const BLACK: Rgba = Rgba([0, 0, 0, 255]);
    pub const WHITE: Rgba = Rgba([255, 255, 255, 255]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    pub const fn with_alpha(self, alpha: u8) -> Self {
        let [r, g, b, _] = self.0;
        Self([r, g, b, alpha])
    }

    pub const fn alpha(self) -> u8 {
        self.0[3]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl ScreenRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn inset(self, amount: i32) -> Self {
        Self {
            x: self.x + amount,
            y: self.y + amount,
            width: self.width - amount * 2,
            height: self.height - amount * 2,
        }
    }

    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }
}

/// Drawing surface handed to scenes once per presented frame.
pub trait Canvas {
    fn size(&self) -> (u32, u32);
    fn clear(&mut self, color: Rgba);
    /// Fills `rect`, alpha-blending when `color` is translucent.
    fn fill_rect(&mut self, rect: ScreenRect, color: Rgba);
    fn stroke_rect(&mut self, rect: ScreenRect, color: Rgba);
    /// Draws `image` with its top-left corner at (`x`, `y`).
    fn draw_image(&mut self, image: &PixelImage, x: i32, y: i32);
    fn draw_text(&mut self, text: &str, x: i32, y: i32, style: TextStyle);
    /// Blacks out every pixel farther than `radius` from the center.
    fn circular_mask(&mut self, center_x: i32, center_y: i32, radius: f32);

    /// Translucent bordered window with one text line per row. Lines that do
    /// not fit inside the padded area are dropped.
    fn draw_text_block(&mut self, lines: &[&str], rect: ScreenRect, style: TextStyle) {
        self.fill_rect(rect, TEXT_BLOCK_FILL);
        self.stroke_rect(rect, TEXT_BLOCK_BORDER);
        self.stroke_rect(rect.inset(1), TEXT_BLOCK_BORDER);
        let inner = rect.inset(TEXT_BLOCK_PADDING);
        let mut y = inner.y;
        for line in lines {
            if y + style.line_advance() > inner.bottom() + style.pixel_scale() * 2 {
                break;
            }
            if !line.is_empty() {
                self.draw_text(line, inner.x, y, style);
            }
            y += style.line_advance();
        }
    }
}

pub const TEXT_BLOCK_PADDING: i32 = 12;
const TEXT_BLOCK_FILL: Rgba = Rgba([0, 0, 0, 200]);
const TEXT_BLOCK_BORDER: Rgba = Rgba::rgb(200, 200, 200);

/// Canvas over a raw RGBA8 frame buffer.
pub struct FrameCanvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> FrameCanvas<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        let offset = self.byte_offset(x, y)?;
        let bytes = self.frame.get(offset..offset + 4)?;
        Some(Rgba([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn byte_offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let pixel_offset = (y as usize)
            .checked_mul(self.width as usize)?
            .checked_add(x as usize)?;
        let byte_offset = pixel_offset.checked_mul(4)?;
        if byte_offset.checked_add(4)? > self.frame.len() {
            return None;
        }
        Some(byte_offset)
    }

    fn write_pixel_clipped(&mut self, x: i32, y: i32, color: Rgba) {
        let Some(offset) = self.byte_offset(x, y) else {
            return;
        };
        match color.alpha() {
            0 => {}
            255 => self.frame[offset..offset + 4].copy_from_slice(&color.0),
            alpha => {
                let dst = &mut self.frame[offset..offset + 4];
                let src_weight = alpha as u16;
                let dst_weight = 255 - src_weight;
                for channel in 0..3 {
                    let blended =
                        (color.0[channel] as u16 * src_weight + dst[channel] as u16 * dst_weight)
                            / 255;
                    dst[channel] = blended as u8;
                }
                dst[3] = 255;
            }
        }
    }
}

impl Canvas for FrameCanvas<'_> {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Rgba) {
        for pixel in self.frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color.0);
        }
    }

    fn fill_rect(&mut self, rect: ScreenRect, color: Rgba) {
        let start_x = rect.x.max(0);
        let start_y = rect.y.max(0);
        let end_x = rect.right().min(self.width as i32);
        let end_y = rect.bottom().min(self.height as i32);
        if end_x <= start_x || end_y <= start_y {
            return;
        }
        for y in start_y..end_y {
            for x in start_x..end_x {
                self.write_pixel_clipped(x, y, color);
            }
        }
    }

    fn stroke_rect(&mut self, rect: ScreenRect, color: Rgba) {
        if rect.width <= 1 || rect.height <= 1 {
            return;
        }
        self.fill_rect(ScreenRect::new(rect.x, rect.y, rect.width, 1), color);
        self.fill_rect(
            ScreenRect::new(rect.x, rect.bottom() - 1, rect.width, 1),
            color,
        );
        self.fill_rect(ScreenRect::new(rect.x, rect.y, 1, rect.height), color);
        self.fill_rect(
            ScreenRect::new(rect.right() - 1, rect.y, 1, rect.height),
            color,
        );
    }

    fn draw_image(&mut self, image: &PixelImage, x: i32, y: i32) {
        let draw_left = x.max(0);
        let draw_top = y.max(0);
        let draw_right = (x + image.width() as i32).min(self.width as i32);
        let draw_bottom = (y + image.height() as i32).min(self.height as i32);
        if draw_left >= draw_right || draw_top >= draw_bottom {
            return;
        }

        let src = image.rgba();
        let src_width = image.width() as usize;
        for out_y in draw_top..draw_bottom {
            let src_row = (out_y - y) as usize * src_width * 4;
            for out_x in draw_left..draw_right {
                let src_offset = src_row + (out_x - x) as usize * 4;
                let color = Rgba([
                    src[src_offset],
                    src[src_offset + 1],
                    src[src_offset + 2],
                    src[src_offset + 3],
                ]);
                self.write_pixel_clipped(out_x, out_y, color);
            }
        }
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, style: TextStyle) {
        let scale = style.pixel_scale();
        let mut pen_x = x;
        for ch in text.chars() {
            for (col, row) in lit_cells(ch) {
                self.fill_rect(
                    ScreenRect::new(pen_x + col * scale, y + row * scale, scale, scale),
                    style.color,
                );
            }
            pen_x += style.glyph_advance();
        }
    }

    fn circular_mask(&mut self, center_x: i32, center_y: i32, radius: f32) {
        let radius_sq = if radius > 0.0 {
            (radius as f64) * (radius as f64)
        } else {
            -1.0
        };
        for y in 0..self.height as i32 {
            let dy = (y - center_y) as f64;
            for x in 0..self.width as i32 {
                let dx = (x - center_x) as f64;
                if dx * dx + dy * dy > radius_sq {
                    if let Some(offset) = self.byte_offset(x, y) {
                        self.frame[offset..offset + 4].copy_from_slice(&Rgba::BLACK.0);
                    }
                }
            }
        }
    }
}
