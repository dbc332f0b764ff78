//! Testing utilities and mock implementations.
//!
//! This module provides a scriptable `AssetSource` and image fixtures so the
//! pipeline can be exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use spritefetch_core::testing::{fixtures, MockAssetSource};
//!
//! let source = MockAssetSource::new().with_png_payloads(16, 16);
//! source.fail_with_status(ItemId::new(3).unwrap(), 404).await;
//!
//! std::fs::write(dir.join("001.png"), fixtures::png_bytes(8, 8))?;
//! ```

mod mock_asset_source;

pub use mock_asset_source::MockAssetSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};

    /// A small gradient image.
    pub fn rgb_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ])
        })
    }

    /// PNG encoding of [`rgb_image`].
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = rgb_image(width, height);
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf)
            .write_image(image.as_raw(), width, height, ExtendedColorType::Rgb8)
            .expect("encoding an in-memory PNG cannot fail");
        buf
    }

    /// Bytes that no image decoder accepts.
    pub fn garbage_bytes() -> Vec<u8> {
        b"this is not an image at all".to_vec()
    }
}
