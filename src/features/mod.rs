pub mod ellipse;
pub mod haralick;
pub mod moments;
pub mod rect;

use std::f64::consts::PI;

use image::GrayImage;
use imageproc::geometry::{arc_length, contour_area, convex_hull};
use imageproc::point::Point;
use thiserror::Error;

use crate::detection::preprocessing::mean_intensity;
use crate::models::{BoundingBox, FEATURE_COUNT, FeatureVector};

pub use ellipse::{Ellipse, EllipseFitError, fit_ellipse};
pub use rect::{RotatedRect, min_area_rect, sample_rotated};

/// Why a contour produced no feature vector
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SkipReason {
    #[error("ellipse fit failed: {0}")]
    EllipseFit(#[from] EllipseFitError),

    /// A de-rotated crop came out with a zero side
    #[error("de-rotated crop has no pixels")]
    DegenerateCrop,

    /// Zero area, perimeter or hull area
    #[error("contour encloses nothing")]
    DegenerateContour,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureOutcome {
    Valid(FeatureVector),
    Skipped(SkipReason),
}

impl FeatureOutcome {
    pub fn valid(self) -> Option<FeatureVector> {
        match self {
            FeatureOutcome::Valid(v) => Some(v),
            FeatureOutcome::Skipped(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, FeatureOutcome::Valid(_))
    }
}

impl From<Result<FeatureVector, SkipReason>> for FeatureOutcome {
    fn from(result: Result<FeatureVector, SkipReason>) -> Self {
        match result {
            Ok(v) => FeatureOutcome::Valid(v),
            Err(reason) => FeatureOutcome::Skipped(reason),
        }
    }
}

/// Per-image feature computer. Hu invariants and Haralick statistics are
/// taken over the whole image and shared by every region of it.
#[derive(Debug, Clone)]
pub struct FeatureExtractor<'a> {
    image: &'a GrayImage,
    hu: [f64; 7],
    haralick: [f64; haralick::HARALICK_COUNT],
}

impl<'a> FeatureExtractor<'a> {
    pub fn new(image: &'a GrayImage) -> Self {
        Self {
            image,
            hu: moments::hu_moments(image).map(moments::log_scale),
            haralick: haralick::haralick_features(image),
        }
    }

    /// Log-scaled Hu invariants shared by every region of the image
    pub fn hu(&self) -> &[f64; 7] {
        &self.hu
    }

    pub fn haralick(&self) -> &[f64; haralick::HARALICK_COUNT] {
        &self.haralick
    }

    pub fn compute(&self, contour: &[Point<i32>]) -> FeatureOutcome {
        self.try_compute(contour).into()
    }

    fn try_compute(&self, contour: &[Point<i32>]) -> Result<FeatureVector, SkipReason> {
        let points: Vec<[f64; 2]> = contour.iter().map(|p| [p.x as f64, p.y as f64]).collect();
        let fitted = fit_ellipse(&points)?;

        let rect = min_area_rect(contour).ok_or(SkipReason::DegenerateContour)?;
        let rect_crop = sample_rotated(
            self.image,
            rect.cx,
            rect.cy,
            rect.width,
            rect.height,
            rect.angle,
        )
        .ok_or(SkipReason::DegenerateCrop)?;
        let rect_mean = mean_intensity(&rect_crop);
        let (minor, major) = rect.axes();

        let (ellipse_w, ellipse_h) = fitted.full_axes();
        let mut ellipse_crop = sample_rotated(
            self.image,
            fitted.cx,
            fitted.cy,
            ellipse_w,
            ellipse_h,
            fitted.angle,
        )
        .ok_or(SkipReason::DegenerateCrop)?;
        invert_outside_ellipse(&mut ellipse_crop);
        let ellipse_mean = mean_intensity(&ellipse_crop);
        let ellipse_area = PI * (ellipse_crop.height() as f64 / 2.0) * (ellipse_crop.width() as f64 / 2.0);

        let area = contour_area(contour);
        let perimeter = arc_length(contour, true);
        let hull = convex_hull(contour);
        let hull_area = contour_area(&hull);
        let hull_perimeter = arc_length(&hull, true);
        if area == 0.0 || perimeter == 0.0 || hull_area == 0.0 || major == 0.0 {
            return Err(SkipReason::DegenerateContour);
        }

        let bbox = BoundingBox::of_points(contour).ok_or(SkipReason::DegenerateContour)?;
        let extent = area / (bbox.width as f64 * bbox.height as f64);

        let perimeter_radius = 0.5 * perimeter / PI;
        let area_radius = (area / PI).sqrt();
        let compactness = area / (PI * perimeter_radius * perimeter_radius);
        let heywood = perimeter / (2.0 * PI * area_radius);
        let waddel = 2.0 * area_radius;

        let rectangularity = area / (minor * major);
        let eccentricity = (major * major - minor * minor).max(0.0).sqrt() / major;

        let mut values = [0.0; FEATURE_COUNT];
        let shape = [
            rect_mean,
            ellipse_mean,
            minor / major,
            area,
            hull_area,
            area / hull_area,
            extent,
            perimeter,
            hull_perimeter,
            compactness,
            heywood,
            waddel,
            rectangularity,
            eccentricity,
            ellipse_area,
            hull_perimeter / perimeter,
            2.0 * (minor + major) / perimeter,
        ];
        values[..shape.len()].copy_from_slice(&shape);
        values[shape.len()..shape.len() + 7].copy_from_slice(&self.hu);
        values[shape.len() + 7..].copy_from_slice(&self.haralick);
        Ok(FeatureVector::new(values))
    }
}

/// One-shot convenience for a single contour
pub fn compute_features(image: &GrayImage, contour: &[Point<i32>]) -> FeatureOutcome {
    FeatureExtractor::new(image).compute(contour)
}

/// Replace every pixel outside the crop's inscribed ellipse by its inverse
fn invert_outside_ellipse(crop: &mut GrayImage) {
    let (cx, cy) = (crop.width() as f64 / 2.0, crop.height() as f64 / 2.0);
    for (x, y, p) in crop.enumerate_pixels_mut() {
        let (dx, dy) = (x as f64 - cx, y as f64 - cy);
        if dx * dx / (cx * cx) + dy * dy / (cy * cy) > 1.0 {
            p[0] = 255 - p[0];
        }
    }
}
