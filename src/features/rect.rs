use image::{GrayImage, Luma};
use imageproc::geometry::convex_hull;
use imageproc::point::Point;

/// Rectangle of arbitrary orientation. `width` runs along `angle`,
/// `height` along the perpendicular.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    pub cx: f64,
    pub cy: f64,
    pub width: f64,
    pub height: f64,
    /// Radians from +x
    pub angle: f64,
}

impl RotatedRect {
    /// `(minor, major)` side lengths
    pub fn axes(&self) -> (f64, f64) {
        (self.width.min(self.height), self.width.max(self.height))
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Minimum-area rectangle enclosing the points (rotating calipers over the
/// convex hull). `None` for an empty input.
pub fn min_area_rect(points: &[Point<i32>]) -> Option<RotatedRect> {
    let first = points.first()?;
    let hull: Vec<(f64, f64)> = convex_hull(points)
        .iter()
        .map(|p| (p.x as f64, p.y as f64))
        .collect();

    if hull.len() < 2 {
        return Some(RotatedRect {
            cx: first.x as f64,
            cy: first.y as f64,
            width: 0.0,
            height: 0.0,
            angle: 0.0,
        });
    }

    let mut best: Option<RotatedRect> = None;
    for i in 0..hull.len() {
        let (ax, ay) = hull[i];
        let (bx, by) = hull[(i + 1) % hull.len()];
        let len = ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt();
        if len < 1e-12 {
            continue;
        }
        let (ux, uy) = ((bx - ax) / len, (by - ay) / len);
        let (nx, ny) = (-uy, ux);

        let (mut min_u, mut max_u, mut min_n, mut max_n) =
            (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
        for &(px, py) in &hull {
            let u = px * ux + py * uy;
            let n = px * nx + py * ny;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_n = min_n.min(n);
            max_n = max_n.max(n);
        }

        let (mid_u, mid_n) = ((min_u + max_u) / 2.0, (min_n + max_n) / 2.0);
        let rect = RotatedRect {
            cx: mid_u * ux + mid_n * nx,
            cy: mid_u * uy + mid_n * ny,
            width: max_u - min_u,
            height: max_n - min_n,
            angle: uy.atan2(ux),
        };
        if best.is_none_or(|b| rect.area() < b.area()) {
            best = Some(rect);
        }
    }
    best
}

/// Axis-aligned copy of the image under a rotated window of
/// `width × height` (truncated to whole pixels) centred on `(cx, cy)`.
///
/// Sampling is bilinear; coordinates outside the image replicate the
/// border. `None` when either side truncates to zero.
pub fn sample_rotated(
    image: &GrayImage,
    cx: f64,
    cy: f64,
    width: f64,
    height: f64,
    angle: f64,
) -> Option<GrayImage> {
    let (out_w, out_h) = (width as u32, height as u32);
    if out_w == 0 || out_h == 0 || image.width() == 0 || image.height() == 0 {
        return None;
    }

    let (sin, cos) = angle.sin_cos();
    let (half_w, half_h) = ((out_w as f64 - 1.0) / 2.0, (out_h as f64 - 1.0) / 2.0);
    Some(GrayImage::from_fn(out_w, out_h, |u, v| {
        let (du, dv) = (u as f64 - half_w, v as f64 - half_h);
        let x = cx + du * cos - dv * sin;
        let y = cy + du * sin + dv * cos;
        Luma([bilinear(image, x, y)])
    }))
}

fn bilinear(image: &GrayImage, x: f64, y: f64) -> u8 {
    let (max_x, max_y) = (image.width() as f64 - 1.0, image.height() as f64 - 1.0);
    let (x, y) = (x.clamp(0.0, max_x), y.clamp(0.0, max_y));
    let (x0, y0) = (x.floor(), y.floor());
    let (x1, y1) = ((x0 + 1.0).min(max_x), (y0 + 1.0).min(max_y));
    let (fx, fy) = (x - x0, y - y0);

    let at = |px: f64, py: f64| image.get_pixel(px as u32, py as u32)[0] as f64;
    let top = at(x0, y0) * (1.0 - fx) + at(x1, y0) * fx;
    let bottom = at(x0, y1) * (1.0 - fx) + at(x1, y1) * fx;
    (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn axis_aligned_rectangle() {
        let pts = [
            Point::new(2, 3),
            Point::new(12, 3),
            Point::new(12, 8),
            Point::new(2, 8),
        ];
        let rect = min_area_rect(&pts).unwrap();
        assert_relative_eq!(rect.area(), 50.0, epsilon = 1e-9);
        assert_relative_eq!(rect.cx, 7.0, epsilon = 1e-9);
        assert_relative_eq!(rect.cy, 5.5, epsilon = 1e-9);
        let (minor, major) = rect.axes();
        assert_relative_eq!(minor, 5.0, epsilon = 1e-9);
        assert_relative_eq!(major, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn diamond_is_measured_along_its_edges() {
        let pts = [
            Point::new(10, 0),
            Point::new(20, 10),
            Point::new(10, 20),
            Point::new(0, 10),
        ];
        let rect = min_area_rect(&pts).unwrap();
        assert_relative_eq!(rect.area(), 200.0, epsilon = 1e-9);
        assert_relative_eq!(rect.axes().0, 200f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn sampling_unrotated_window_copies_pixels() {
        let img = GrayImage::from_fn(10, 10, |x, y| Luma([(x * 10 + y) as u8]));
        let crop = sample_rotated(&img, 4.5, 4.5, 4.0, 2.0, 0.0).unwrap();
        assert_eq!(crop.dimensions(), (4, 2));
        assert_eq!(crop.get_pixel(0, 0)[0], 3 * 10 + 4);
        assert_eq!(crop.get_pixel(3, 1)[0], 6 * 10 + 5);
    }

    #[test]
    fn sub_pixel_window_is_empty() {
        let img = GrayImage::new(5, 5);
        assert!(sample_rotated(&img, 2.0, 2.0, 0.9, 3.0, 0.0).is_none());
    }
}
