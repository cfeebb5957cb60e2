use image::GrayImage;
use image::imageops::{FilterType, resize};
use imageproc::corners::corners_fast9;

use crate::config::KeypointConfig;

/// Interest point in original-image coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub score: f32,
}

/// Finds interest points on an unprocessed image
pub trait KeypointDetector: Send + Sync {
    fn detect(&self, image: &GrayImage) -> Vec<Keypoint>;
}

/// ORB-style detector: FAST-9 corners over a scale pyramid, border margin
/// per level, strongest `max_features` kept.
#[derive(Debug, Clone)]
pub struct FastPyramidDetector {
    pub config: KeypointConfig,
}

impl FastPyramidDetector {
    pub fn new(config: KeypointConfig) -> Self {
        Self { config }
    }
}

impl Default for FastPyramidDetector {
    fn default() -> Self {
        Self::new(KeypointConfig::default())
    }
}

impl KeypointDetector for FastPyramidDetector {
    fn detect(&self, image: &GrayImage) -> Vec<Keypoint> {
        let cfg = &self.config;
        let (width, height) = image.dimensions();
        let mut keypoints = Vec::new();

        for level in 0..cfg.levels {
            let scale = cfg.scale_factor.powi(level as i32);
            let level_w = (width as f32 / scale).round() as u32;
            let level_h = (height as f32 / scale).round() as u32;
            if level_w <= 2 * cfg.edge_threshold || level_h <= 2 * cfg.edge_threshold {
                break;
            }

            let level_image = if level == 0 {
                image.clone()
            } else {
                resize(image, level_w, level_h, FilterType::Triangle)
            };

            let margin = cfg.edge_threshold;
            keypoints.extend(
                corners_fast9(&level_image, cfg.fast_threshold)
                    .into_iter()
                    .filter(|c| {
                        c.x >= margin
                            && c.y >= margin
                            && c.x < level_w - margin
                            && c.y < level_h - margin
                    })
                    .map(|c| Keypoint {
                        x: c.x as f32 * scale,
                        y: c.y as f32 * scale,
                        score: c.score,
                    }),
            );
        }

        keypoints.sort_by(|a, b| b.score.total_cmp(&a.score));
        keypoints.truncate(cfg.max_features);
        keypoints
    }
}

/// Detector returning a fixed list, for callers that already know where
/// the interest points are
#[derive(Debug, Clone, Default)]
pub struct FixedKeypoints(pub Vec<Keypoint>);

impl KeypointDetector for FixedKeypoints {
    fn detect(&self, _image: &GrayImage) -> Vec<Keypoint> {
        self.0.clone()
    }
}
