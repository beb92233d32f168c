use serde::{Deserialize, Serialize};

/// Errors raised when wrapping raw pixel buffers.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("invalid image buffer length (expected {expected} bytes, got {got})")]
    InvalidBuffer { expected: usize, got: usize },

    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },
}

fn expected_len(width: usize, height: usize, channels: usize) -> Result<usize, ImageError> {
    if width == 0 || height == 0 {
        return Err(ImageError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .ok_or(ImageError::InvalidDimensions { width, height })
}

/// Borrowed single-channel image, row-major, `data.len() == width * height`.
///
/// Used as the binary edge map: zero is background, anything else is an edge.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

impl<'a> GrayImageView<'a> {
    /// Wrap a raw buffer, checking its length against the dimensions.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Result<Self, ImageError> {
        let expected = expected_len(width, height, 1)?;
        if data.len() != expected {
            return Err(ImageError::InvalidBuffer {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        self.data.get(y as usize * self.width + x as usize).copied()
    }

    /// Iterate `(x, y)` of every non-zero pixel in row-major order.
    pub fn edge_pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != 0)
            .map(move |(idx, _)| (idx % width, idx / width))
    }

    pub fn count_edges(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

/// Borrowed 3-channel image (R, G, B interleaved), row-major,
/// `data.len() == 3 * width * height`.
#[derive(Clone, Copy, Debug)]
pub struct RgbImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

impl<'a> RgbImageView<'a> {
    pub const CHANNELS: usize = 3;

    /// Wrap a raw interleaved RGB buffer, checking its length.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Result<Self, ImageError> {
        let expected = expected_len(width, height, Self::CHANNELS)?;
        if data.len() != expected {
            return Err(ImageError::InvalidBuffer {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.width * Self::CHANNELS
    }

    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> Option<[u8; 3]> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        let base = y as usize * self.stride() + x as usize * Self::CHANNELS;
        let px = self.data.get(base..base + Self::CHANNELS)?;
        Some([px[0], px[1], px[2]])
    }
}

/// Owned single-channel image.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    /// Write one pixel; out-of-bounds writes are ignored.
    pub fn put(&mut self, x: i32, y: i32, value: u8) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        self.data[y as usize * self.width + x as usize] = value;
    }
}

/// Owned interleaved RGB image.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RgbImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RgbImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * RgbImageView::CHANNELS],
        }
    }

    /// Image filled with one color.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let mut img = Self::new(width, height);
        for px in img.data.chunks_exact_mut(RgbImageView::CHANNELS) {
            px.copy_from_slice(&rgb);
        }
        img
    }

    pub fn view(&self) -> RgbImageView<'_> {
        RgbImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    /// Write one pixel; out-of-bounds writes are ignored.
    pub fn put(&mut self, x: i32, y: i32, rgb: [u8; 3]) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let base = (y as usize * self.width + x as usize) * RgbImageView::CHANNELS;
        self.data[base..base + RgbImageView::CHANNELS].copy_from_slice(&rgb);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_view_rejects_wrong_length() {
        let data = [0u8; 5];
        let err = GrayImageView::new(2, 3, &data).unwrap_err();
        assert_eq!(
            err,
            ImageError::InvalidBuffer {
                expected: 6,
                got: 5
            }
        );
    }

    #[test]
    fn zero_sized_images_are_invalid() {
        let err = RgbImageView::new(0, 4, &[]).unwrap_err();
        assert_eq!(
            err,
            ImageError::InvalidDimensions {
                width: 0,
                height: 4
            }
        );
    }

    #[test]
    fn edge_pixels_are_row_major() {
        let mut img = GrayImage::new(4, 3);
        img.put(3, 0, 255);
        img.put(1, 2, 1);
        img.put(9, 9, 255);
        let edges: Vec<_> = img.view().edge_pixels().collect();
        assert_eq!(edges, vec![(3, 0), (1, 2)]);
        assert_eq!(img.view().count_edges(), 2);
    }

    #[test]
    fn rgb_pixel_access_is_bounds_checked() {
        let mut img = RgbImage::filled(3, 2, [10, 20, 30]);
        img.put(2, 1, [1, 2, 3]);
        let view = img.view();
        assert_eq!(view.pixel(0, 0), Some([10, 20, 30]));
        assert_eq!(view.pixel(2, 1), Some([1, 2, 3]));
        assert_eq!(view.pixel(3, 0), None);
        assert_eq!(view.pixel(-1, 0), None);
    }
}
