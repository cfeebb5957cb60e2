use image::GrayImage;
use imageproc::contours::{BorderType, find_contours as trace_contours};
use imageproc::geometry::convex_hull;
use imageproc::point::Point;

use crate::models::ContourPoints;

/// A traced border of the mask, outer or hole
#[derive(Debug, Clone)]
pub struct TracedContour {
    pub points: ContourPoints,
    pub is_hole: bool,
    pub parent: Option<usize>,
}

/// Find every border of a binary mask (non-zero = foreground), outer
/// borders and hole borders alike, in tracing order.
pub fn find_contours(mask: &GrayImage) -> Vec<TracedContour> {
    trace_contours::<i32>(mask)
        .into_iter()
        .map(|c| TracedContour {
            points: c.points,
            is_hole: c.border_type == BorderType::Hole,
            parent: c.parent,
        })
        .collect()
}

/// True when (x, y) lies inside the closed polyline or on its boundary
pub fn contains_point(points: &[Point<i32>], x: f64, y: f64) -> bool {
    let n = points.len();
    if n == 0 {
        return false;
    }

    let mut inside = false;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let (ax, ay, bx, by) = (a.x as f64, a.y as f64, b.x as f64, b.y as f64);

        if on_segment(ax, ay, bx, by, x, y) {
            return true;
        }
        if (ay > y) != (by > y) {
            let cross_x = ax + (y - ay) * (bx - ax) / (by - ay);
            if x < cross_x {
                inside = !inside;
            }
        }
    }
    inside
}

fn on_segment(ax: f64, ay: f64, bx: f64, by: f64, px: f64, py: f64) -> bool {
    let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
    if cross.abs() > 1e-9 {
        return false;
    }
    px >= ax.min(bx) - 1e-9
        && px <= ax.max(bx) + 1e-9
        && py >= ay.min(by) - 1e-9
        && py <= ay.max(by) + 1e-9
}

/// Smallest circle containing every point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
}

impl Circle {
    fn contains(&self, p: (f64, f64)) -> bool {
        let (dx, dy) = (p.0 - self.cx, p.1 - self.cy);
        (dx * dx + dy * dy).sqrt() <= self.radius * (1.0 + 1e-12) + 1e-9
    }

    fn from_two(a: (f64, f64), b: (f64, f64)) -> Self {
        let (cx, cy) = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
        let radius = ((a.0 - cx).powi(2) + (a.1 - cy).powi(2)).sqrt();
        Self { cx, cy, radius }
    }

    fn from_three(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Self {
        let d = 2.0 * (a.0 * (b.1 - c.1) + b.0 * (c.1 - a.1) + c.0 * (a.1 - b.1));
        if d.abs() < 1e-12 {
            // Collinear: the farthest pair spans the circle
            let candidates = [Self::from_two(a, b), Self::from_two(a, c), Self::from_two(b, c)];
            return candidates
                .into_iter()
                .max_by(|l, r| l.radius.total_cmp(&r.radius))
                .unwrap_or(Self::from_two(a, b));
        }
        let a2 = a.0 * a.0 + a.1 * a.1;
        let b2 = b.0 * b.0 + b.1 * b.1;
        let c2 = c.0 * c.0 + c.1 * c.1;
        let cx = (a2 * (b.1 - c.1) + b2 * (c.1 - a.1) + c2 * (a.1 - b.1)) / d;
        let cy = (a2 * (c.0 - b.0) + b2 * (a.0 - c.0) + c2 * (b.0 - a.0)) / d;
        let radius = ((a.0 - cx).powi(2) + (a.1 - cy).powi(2)).sqrt();
        Self { cx, cy, radius }
    }
}

/// Minimum enclosing circle (incremental Welzl over the convex hull)
pub fn min_enclosing_circle(points: &[Point<i32>]) -> Option<Circle> {
    let first = points.first()?;
    let hull = if points.len() > 3 {
        convex_hull(points)
    } else {
        points.to_vec()
    };
    let pts: Vec<(f64, f64)> = hull.iter().map(|p| (p.x as f64, p.y as f64)).collect();
    if pts.is_empty() {
        return Some(Circle {
            cx: first.x as f64,
            cy: first.y as f64,
            radius: 0.0,
        });
    }

    let mut circle = Circle {
        cx: pts[0].0,
        cy: pts[0].1,
        radius: 0.0,
    };
    for i in 1..pts.len() {
        if circle.contains(pts[i]) {
            continue;
        }
        circle = Circle {
            cx: pts[i].0,
            cy: pts[i].1,
            radius: 0.0,
        };
        for j in 0..i {
            if circle.contains(pts[j]) {
                continue;
            }
            circle = Circle::from_two(pts[i], pts[j]);
            for k in 0..j {
                if !circle.contains(pts[k]) {
                    circle = Circle::from_three(pts[i], pts[j], pts[k]);
                }
            }
        }
    }
    Some(circle)
}
