use std::sync::Arc;

use image::GrayImage;
use image::imageops::crop_imm;
use imageproc::geometry::contour_area;
use tracing::debug;

use crate::config::{KeypointConfig, RegionConfig};
use crate::detection::contours::{self, TracedContour};
use crate::detection::keypoints::{FastPyramidDetector, Keypoint, KeypointDetector};
use crate::error::{PlanktoolError, Result};
use crate::models::Region;

/// Turns a consensus mask into square crops of the original image.
///
/// A contour survives when its area is above `min_area` and at least one
/// keypoint of the original image lies inside it (or on its boundary).
#[derive(Clone)]
pub struct RegionExtractor {
    pub min_area: f64,
    detector: Arc<dyn KeypointDetector>,
}

impl std::fmt::Debug for RegionExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionExtractor")
            .field("min_area", &self.min_area)
            .finish_non_exhaustive()
    }
}

impl Default for RegionExtractor {
    fn default() -> Self {
        Self::new(&RegionConfig::default(), &KeypointConfig::default())
    }
}

impl RegionExtractor {
    pub fn new(regions: &RegionConfig, keypoints: &KeypointConfig) -> Self {
        Self {
            min_area: regions.min_area,
            detector: Arc::new(FastPyramidDetector::new(keypoints.clone())),
        }
    }

    /// Replace the keypoint detector
    pub fn with_detector(mut self, detector: Arc<dyn KeypointDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_min_area(mut self, min_area: f64) -> Self {
        self.min_area = min_area;
        self
    }

    /// Regions of `original` outlined by `mask`, in contour tracing order
    pub fn extract(&self, original: &GrayImage, mask: &GrayImage) -> Result<Vec<Region>> {
        PlanktoolError::check_image(original)?;
        if mask.dimensions() != original.dimensions() {
            return Err(PlanktoolError::MaskSize {
                strategy: "consensus".to_string(),
                width: original.width(),
                height: original.height(),
                got_width: mask.width(),
                got_height: mask.height(),
            });
        }

        let keypoints = self.detector.detect(original);
        let traced = contours::find_contours(mask);
        debug!(
            contours = traced.len(),
            keypoints = keypoints.len(),
            "tracing done"
        );

        let regions: Vec<Region> = traced
            .into_iter()
            .filter(|c| contour_area(&c.points) > self.min_area)
            .filter(|c| has_keypoint(c, &keypoints))
            .filter_map(|c| crop_around(original, c))
            .collect();

        debug!(regions = regions.len(), min_area = self.min_area, "regions kept");
        Ok(regions)
    }
}

fn has_keypoint(contour: &TracedContour, keypoints: &[Keypoint]) -> bool {
    keypoints
        .iter()
        .any(|k| contours::contains_point(&contour.points, k.x as f64, k.y as f64))
}

/// Square window of side 2r around the minimum enclosing circle, clipped to
/// the image. `None` when the radius truncates to zero or nothing is left.
fn crop_around(original: &GrayImage, contour: TracedContour) -> Option<Region> {
    let circle = contours::min_enclosing_circle(&contour.points)?;
    let r = circle.radius as i64;
    if r <= 0 {
        return None;
    }
    let cx = r.max(circle.cx as i64);
    let cy = r.max(circle.cy as i64);

    let (width, height) = original.dimensions();
    let x0 = (cx - r).clamp(0, width as i64) as u32;
    let y0 = (cy - r).clamp(0, height as i64) as u32;
    let x1 = (cx + r).clamp(0, width as i64) as u32;
    let y1 = (cy + r).clamp(0, height as i64) as u32;
    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    Some(Region {
        crop: crop_imm(original, x0, y0, x1 - x0, y1 - y0).to_image(),
        contour: contour.points,
        crop_origin: (x0, y0),
    })
}
