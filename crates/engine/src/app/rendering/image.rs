use super::Rgba;

/// Decoded RGBA8 image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl PixelImage {
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if width == 0 || height == 0 || rgba.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn solid(width: u32, height: u32, color: Rgba) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let rgba = color
            .0
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            rgba,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let bytes = self.rgba.get(offset..offset + 4)?;
        Some(Rgba([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(crate) fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Nearest-neighbour resample to the requested size.
    pub fn scaled(&self, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        if width == self.width && height == self.height {
            return self.clone();
        }

        let src_width = self.width as usize;
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for out_y in 0..height {
            let src_y = ((out_y as u64 * self.height as u64) / height as u64) as usize;
            let src_y = src_y.min(self.height as usize - 1);
            for out_x in 0..width {
                let src_x = ((out_x as u64 * self.width as u64) / width as u64) as usize;
                let src_x = src_x.min(src_width - 1);
                let offset = (src_y * src_width + src_x) * 4;
                rgba.extend_from_slice(&self.rgba[offset..offset + 4]);
            }
        }
        Self {
            width,
            height,
            rgba,
        }
    }

    pub fn flipped_x(&self) -> Self {
        let row_len = self.width as usize * 4;
        let mut rgba = Vec::with_capacity(self.rgba.len());
        for row in self.rgba.chunks_exact(row_len) {
            for pixel in row.chunks_exact(4).rev() {
                rgba.extend_from_slice(pixel);
            }
        }
        Self {
            width: self.width,
            height: self.height,
            rgba,
        }
    }
}
