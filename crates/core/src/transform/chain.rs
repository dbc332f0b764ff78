//! Ordered filter chain.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::config::FilterConfig;
use super::filters;

/// One named stage of the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum FilterStage {
    GaussianBlur { sigma: f32 },
    Contrast { factor: f32 },
    EdgeEnhance,
    Invert,
    Resample { factor: u32 },
}

impl FilterStage {
    /// Applies the stage.
    pub fn apply(&self, image: &RgbImage) -> RgbImage {
        match *self {
            Self::GaussianBlur { sigma } => filters::gaussian_blur(image, sigma),
            Self::Contrast { factor } => filters::contrast(image, factor),
            Self::EdgeEnhance => filters::edge_enhance(image),
            Self::Invert => filters::invert(image),
            Self::Resample { factor } => filters::resample(image, factor),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GaussianBlur { .. } => "gaussian_blur",
            Self::Contrast { .. } => "contrast",
            Self::EdgeEnhance => "edge_enhance",
            Self::Invert => "invert",
            Self::Resample { .. } => "resample",
        }
    }
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GaussianBlur { sigma } => write!(f, "gaussian_blur({})", sigma),
            Self::Contrast { factor } => write!(f, "contrast({})", factor),
            Self::Resample { factor } => write!(f, "resample(x{})", factor),
            other => f.write_str(other.name()),
        }
    }
}

/// Stages applied in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterChain {
    stages: Vec<FilterStage>,
}

impl FilterChain {
    pub fn new(stages: Vec<FilterStage>) -> Self {
        Self { stages }
    }

    /// Builds the fixed chain, leaving out disabled stages.
    pub fn from_config(config: &FilterConfig) -> Self {
        let mut stages = Vec::with_capacity(6);
        if config.blur_radius > 0.0 {
            stages.push(FilterStage::GaussianBlur {
                sigma: config.blur_radius,
            });
        }
        if config.contrast_factor != 1.0 {
            stages.push(FilterStage::Contrast {
                factor: config.contrast_factor,
            });
        }
        if config.edge_enhance {
            stages.push(FilterStage::EdgeEnhance);
        }
        if config.invert {
            stages.push(FilterStage::Invert);
        }
        if config.second_blur_radius > 0.0 {
            stages.push(FilterStage::GaussianBlur {
                sigma: config.second_blur_radius,
            });
        }
        if config.resample_factor > 1 {
            stages.push(FilterStage::Resample {
                factor: config.resample_factor,
            });
        }
        Self { stages }
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs every stage in order.
    pub fn apply(&self, image: RgbImage) -> RgbImage {
        self.stages
            .iter()
            .fold(image, |current, stage| stage.apply(&current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_default_chain_order() {
        let chain = FilterChain::from_config(&FilterConfig::default());
        let names: Vec<_> = chain.stages().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["gaussian_blur", "contrast", "edge_enhance", "invert", "gaussian_blur", "resample"]
        );
        assert_eq!(chain.stages()[0].to_string(), "gaussian_blur(10)");
    }

    #[test]
    fn test_disabled_stages_are_skipped() {
        let config = FilterConfig {
            blur_radius: 0.0,
            contrast_factor: 1.0,
            edge_enhance: false,
            invert: true,
            second_blur_radius: 0.0,
            resample_factor: 1,
        };
        let chain = FilterChain::from_config(&config);
        assert_eq!(chain.stages(), &[FilterStage::Invert]);

        let image = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        let out = chain.apply(image);
        assert!(out.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let image = RgbImage::from_pixel(3, 3, Rgb([1, 2, 3]));
        let chain = FilterChain::default();
        assert!(chain.is_empty());
        assert_eq!(chain.apply(image.clone()), image);
    }

    #[test]
    fn test_full_chain_preserves_dimensions() {
        let image = RgbImage::from_fn(16, 9, |x, y| Rgb([(x * 10) as u8, (y * 20) as u8, 128]));
        let out = FilterChain::from_config(&FilterConfig::default()).apply(image);
        assert_eq!(out.dimensions(), (16, 9));
    }
}
