use std::sync::Arc;

use image::{GrayImage, Luma};
use imageproc::point::Point;
use planktool::detection::keypoints::{FixedKeypoints, Keypoint};
use planktool::{Binarizer, PlanktoolError};
use rand::Rng;

/// Background level of the synthetic microscope images
pub const BACKGROUND: u8 = 220;
/// Object level of the synthetic microscope images
pub const OBJECT: u8 = 40;

/// Axis-aligned square: top-left corner and side
#[derive(Debug, Clone, Copy)]
pub struct Square {
    pub x: u32,
    pub y: u32,
    pub side: u32,
}

impl Square {
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.side && y < self.y + self.side
    }

    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.side as f32 / 2.0,
            self.y as f32 + self.side as f32 / 2.0,
        )
    }
}

/// Filled disk: centre and radius
#[derive(Debug, Clone, Copy)]
pub struct Disk {
    pub cx: i64,
    pub cy: i64,
    pub r: i64,
}

impl Disk {
    pub fn contains(&self, x: u32, y: u32) -> bool {
        let (dx, dy) = (x as i64 - self.cx, y as i64 - self.cy);
        dx * dx + dy * dy <= self.r * self.r
    }
}

/// White (255) squares on black
pub fn square_mask(width: u32, height: u32, squares: &[Square]) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        if squares.iter().any(|s| s.contains(x, y)) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Dark squares on a bright background
pub fn square_image(width: u32, height: u32, squares: &[Square]) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        if squares.iter().any(|s| s.contains(x, y)) {
            Luma([OBJECT])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// White disk with a black disk punched into its centre
pub fn disk_with_hole_mask(size: u32, outer: Disk, hole_radius: i64) -> GrayImage {
    let hole = Disk {
        r: hole_radius,
        ..outer
    };
    GrayImage::from_fn(size, size, |x, y| {
        if outer.contains(x, y) && !hole.contains(x, y) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Dark disks on a bright background
pub fn disk_image(width: u32, height: u32, disks: &[Disk]) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        if disks.iter().any(|d| d.contains(x, y)) {
            Luma([OBJECT])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Keypoint detector that reports exactly the given positions
pub fn keypoints_at(points: &[(f32, f32)]) -> Arc<FixedKeypoints> {
    Arc::new(FixedKeypoints(
        points
            .iter()
            .map(|&(x, y)| Keypoint { x, y, score: 1.0 })
            .collect(),
    ))
}

/// Star-shaped simple polygon: vertices at increasing angles with random
/// radii in `[r_min, r_max)`
pub fn random_star_polygon(
    rng: &mut impl Rng,
    center: (i32, i32),
    vertices: usize,
    r_min: f64,
    r_max: f64,
) -> Vec<Point<i32>> {
    (0..vertices)
        .map(|i| {
            let t = std::f64::consts::TAU * i as f64 / vertices as f64;
            let r = rng.gen_range(r_min..r_max);
            Point::new(
                center.0 + (r * t.cos()).round() as i32,
                center.1 + (r * t.sin()).round() as i32,
            )
        })
        .collect()
}

/// Strategy returning a fixed mask regardless of input
pub struct FixedMask {
    pub name: String,
    pub mask: GrayImage,
}

impl Binarizer for FixedMask {
    fn binarize(&self, _image: &GrayImage) -> planktool::Result<GrayImage> {
        Ok(self.mask.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Strategy that always fails
pub struct BrokenStrategy;

impl Binarizer for BrokenStrategy {
    fn binarize(&self, _image: &GrayImage) -> planktool::Result<GrayImage> {
        Err(PlanktoolError::Strategy {
            strategy: "broken".to_string(),
            reason: "misconfigured".to_string(),
        })
    }

    fn name(&self) -> &str {
        "broken"
    }
}

pub fn fixed(name: &str, mask: GrayImage) -> Arc<dyn Binarizer> {
    Arc::new(FixedMask {
        name: name.to_string(),
        mask,
    })
}
