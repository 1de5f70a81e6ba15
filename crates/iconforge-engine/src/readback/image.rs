/// Transient CPU-side RGBA8 image.
///
/// Tightly packed, row 0 at the top. Produced by readback, consumed by the
/// writer pool, and not retained after the write completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelImage {
    pub const BYTES_PER_PIXEL: u32 = 4;

    /// Builds an image from a mapped GPU transfer buffer.
    ///
    /// `data` holds `height` rows of `padded_bytes_per_row` bytes. Rows
    /// arrive bottom-up from the render convention, so output row `y` is
    /// taken from buffer row `height - 1 - y`, with the copy-alignment
    /// padding stripped.
    pub fn from_padded_rows(width: u32, height: u32, padded_bytes_per_row: u32, data: &[u8]) -> Self {
        let row = (width * Self::BYTES_PER_PIXEL) as usize;
        let stride = padded_bytes_per_row as usize;
        debug_assert!(stride >= row);
        debug_assert!(data.len() >= stride * height as usize);

        let mut pixels = vec![0u8; row * height as usize];
        for y in 0..height as usize {
            let src = (height as usize - 1 - y) * stride;
            let dst = y * row;
            pixels[dst..dst + row].copy_from_slice(&data[src..src + row]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Wraps an already tightly-packed RGBA8 buffer.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width * height * Self::BYTES_PER_PIXEL) as usize
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Row stride required for GPU→CPU buffer copies.
///
/// wgpu requires `bytes_per_row` aligned to [`wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`].
pub fn aligned_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * PixelImage::BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_for_export_sizes() {
        // 4 bytes per pixel against 256-byte alignment.
        assert_eq!(aligned_bytes_per_row(16), 256);
        assert_eq!(aligned_bytes_per_row(64), 256);
        assert_eq!(aligned_bytes_per_row(128), 512);
        assert_eq!(aligned_bytes_per_row(1024), 4096);
    }

    #[test]
    fn from_padded_rows_flips_and_unpads() {
        // 2x2 image, stride 12 (one padded word per row).
        // Buffer rows bottom-up: row 0 = pixels C D, row 1 = pixels A B.
        let a = [1u8, 1, 1, 255];
        let b = [2u8, 2, 2, 255];
        let c = [3u8, 3, 3, 255];
        let d = [4u8, 4, 4, 255];
        let pad = [0xEEu8; 4];
        let mut data = Vec::new();
        data.extend_from_slice(&c);
        data.extend_from_slice(&d);
        data.extend_from_slice(&pad);
        data.extend_from_slice(&a);
        data.extend_from_slice(&b);
        data.extend_from_slice(&pad);

        let img = PixelImage::from_padded_rows(2, 2, 12, &data);
        assert_eq!(img.width(), 2);
        assert_eq!(img.height(), 2);
        let mut expect = Vec::new();
        expect.extend_from_slice(&a);
        expect.extend_from_slice(&b);
        expect.extend_from_slice(&c);
        expect.extend_from_slice(&d);
        assert_eq!(img.pixels(), expect.as_slice());
    }

    #[test]
    fn transparent_background_survives_conversion() {
        let data = vec![0u8; 256 * 4];
        let img = PixelImage::from_padded_rows(4, 4, 256, &data);
        assert!(img.pixels().iter().all(|&b| b == 0));
        assert_eq!(img.pixels().len(), 4 * 4 * 4);
    }

    #[test]
    fn tight_stride_is_a_pure_flip() {
        // 1x3 column, no padding: rows reverse.
        let data = [10u8, 0, 0, 0, 20, 0, 0, 0, 30, 0, 0, 0];
        let img = PixelImage::from_padded_rows(1, 3, 4, &data);
        assert_eq!(img.pixels()[0], 30);
        assert_eq!(img.pixels()[4], 20);
        assert_eq!(img.pixels()[8], 10);
    }
}
