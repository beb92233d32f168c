//! Adapters from `image` buffers to the core view types.

use std::path::Path;

use coinscan_core::{GrayImageView, RgbImageView};

use crate::CoinIoError;

/// Convert an `image::GrayImage` into the lightweight `coinscan-core` view type.
pub fn gray_view(img: &::image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Convert an `image::RgbImage` into the lightweight `coinscan-core` view type.
pub fn rgb_view(img: &::image::RgbImage) -> RgbImageView<'_> {
    RgbImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Load an edge map; any non-zero luma counts as an edge pixel.
pub fn load_edge_image(path: impl AsRef<Path>) -> Result<::image::GrayImage, CoinIoError> {
    Ok(::image::open(path)?.to_luma8())
}

pub fn load_color_image(path: impl AsRef<Path>) -> Result<::image::RgbImage, CoinIoError> {
    Ok(::image::open(path)?.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_share_layout() {
        let mut gray = ::image::GrayImage::new(4, 3);
        gray.put_pixel(2, 1, ::image::Luma([255]));
        let view = gray_view(&gray);
        assert_eq!((view.width, view.height), (4, 3));
        assert_eq!(view.get(2, 1), Some(255));
        assert_eq!(view.count_edges(), 1);

        let mut rgb = ::image::RgbImage::new(4, 3);
        rgb.put_pixel(3, 2, ::image::Rgb([1, 2, 3]));
        assert_eq!(rgb_view(&rgb).pixel(3, 2), Some([1, 2, 3]));
    }

    #[test]
    fn png_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edges.png");
        let mut gray = ::image::GrayImage::new(8, 8);
        gray.put_pixel(4, 4, ::image::Luma([200]));
        gray.save(&path).unwrap();

        let loaded = load_edge_image(&path).unwrap();
        let edges: Vec<_> = gray_view(&loaded).edge_pixels().collect();
        assert_eq!(edges, vec![(4, 4)]);
        assert!(load_color_image(dir.path().join("missing.png")).is_err());
    }
}
