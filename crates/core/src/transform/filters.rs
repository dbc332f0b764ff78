//! Pure image filters. Each takes an RGB image and returns a new one.

use image::imageops::{self, FilterType};
use image::RgbImage;

/// "Edge enhance more" kernel; weights sum to 1 so flat regions are preserved.
const EDGE_ENHANCE_MORE: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 9.0, -1.0, -1.0, -1.0, -1.0];

/// Gaussian blur with the given sigma.
pub fn gaussian_blur(image: &RgbImage, sigma: f32) -> RgbImage {
    imageops::blur(image, sigma)
}

/// Scales each channel's distance from the mean luminance by `factor`.
pub fn contrast(image: &RgbImage, factor: f32) -> RgbImage {
    let mean = mean_luminance(image) as f32;
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            let value = mean + factor * (*channel as f32 - mean);
            *channel = value.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Sharpens edges with a strong 3x3 kernel.
pub fn edge_enhance(image: &RgbImage) -> RgbImage {
    imageops::filter3x3(image, &EDGE_ENHANCE_MORE)
}

/// Inverts every channel.
pub fn invert(image: &RgbImage) -> RgbImage {
    let mut out = image.clone();
    imageops::invert(&mut out);
    out
}

/// Lanczos upscale by `factor`, then back down to the original size.
pub fn resample(image: &RgbImage, factor: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || factor <= 1 {
        return image.clone();
    }
    let upscaled = imageops::resize(
        image,
        width.saturating_mul(factor),
        height.saturating_mul(factor),
        FilterType::Lanczos3,
    );
    imageops::resize(&upscaled, width, height, FilterType::Lanczos3)
}

/// Rounded mean of the ITU-R 601 luma of every pixel.
fn mean_luminance(image: &RgbImage) -> u8 {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return 0;
    }
    let total: u64 = image
        .pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            (299 * u64::from(r) + 587 * u64::from(g) + 114 * u64::from(b)) / 1000
        })
        .sum();
    ((total + count / 2) / count) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 16) as u8, (y * 16) as u8, ((x + y) * 8) as u8])
        })
    }

    #[test]
    fn test_invert() {
        let black = RgbImage::from_pixel(2, 2, Rgb([0, 10, 255]));
        let inverted = invert(&black);
        assert!(inverted.pixels().all(|p| p.0 == [255, 245, 0]));
    }

    #[test]
    fn test_contrast_identity_and_flat_image() {
        let image = gradient(8, 8);
        assert_eq!(contrast(&image, 1.0), image);

        let flat = RgbImage::from_pixel(4, 4, Rgb([120, 120, 120]));
        assert_eq!(contrast(&flat, 1.5), flat);
    }

    #[test]
    fn test_contrast_spreads_values() {
        let image = RgbImage::from_fn(2, 1, |x, _| if x == 0 { Rgb([100; 3]) } else { Rgb([200; 3]) });
        let out = contrast(&image, 1.5);
        // mean is 150
        assert_eq!(out.get_pixel(0, 0).0, [75; 3]);
        assert_eq!(out.get_pixel(1, 0).0, [225; 3]);
    }

    #[test]
    fn test_edge_enhance_keeps_flat_regions() {
        let flat = RgbImage::from_pixel(5, 5, Rgb([40, 80, 160]));
        let out = edge_enhance(&flat);
        assert_eq!(out.dimensions(), (5, 5));
        assert_eq!(out.get_pixel(2, 2).0, [40, 80, 160]);
    }

    #[test]
    fn test_size_preserving_filters() {
        let image = gradient(12, 7);
        assert_eq!(gaussian_blur(&image, 3.0).dimensions(), (12, 7));
        assert_eq!(resample(&image, 2).dimensions(), (12, 7));
        assert_eq!(resample(&image, 1), image);
    }

    #[test]
    fn test_mean_luminance() {
        assert_eq!(mean_luminance(&RgbImage::from_pixel(3, 3, Rgb([255, 255, 255]))), 255);
        assert_eq!(mean_luminance(&RgbImage::new(0, 0)), 0);
    }
}
