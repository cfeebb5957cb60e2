use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use crate::config::HoleRemovalConfig;
use crate::detection::preprocessing::{self, BLACK, WHITE};

/// Fills background pockets enclosed by foreground.
///
/// The mask is closed and inverted, a small wedge is painted into each corner,
/// and the background is flooded from the corners. Whatever the flood cannot
/// reach is enclosed. An object touching a corner can lose the pixels under
/// the wedge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoleRemoval {
    pub kernel_size: u32,
    pub corner_fraction: f64,
}

impl Default for HoleRemoval {
    fn default() -> Self {
        Self::new(&HoleRemovalConfig::default())
    }
}

impl HoleRemoval {
    pub fn new(config: &HoleRemovalConfig) -> Self {
        Self {
            kernel_size: config.kernel_size,
            corner_fraction: config.corner_fraction,
        }
    }

    /// Side length of the corner wedges for an image of the given width
    pub fn wedge_side(&self, width: u32) -> u32 {
        (self.corner_fraction * width as f64) as u32
    }

    /// Fill enclosed holes of a mask whose foreground is white (255).
    ///
    /// Output uses the same convention, so a mask without holes is a fixed
    /// point of this operation.
    pub fn apply(&self, mask: &GrayImage) -> GrayImage {
        self.apply_to_dark_objects(&preprocessing::invert(mask))
    }

    /// Fill enclosed holes of a binarized image whose objects are dark on a
    /// bright background. The result has the objects white (255) on black.
    pub fn apply_to_dark_objects(&self, binarized: &GrayImage) -> GrayImage {
        let (width, height) = binarized.dimensions();
        if width == 0 || height == 0 {
            return binarized.clone();
        }

        let closed = preprocessing::close(binarized, self.kernel_size);
        let objects = preprocessing::invert(&closed);

        let mut background = objects.clone();
        paint_corner_wedges(&mut background, self.wedge_side(width), BLACK);
        for seed in corners(width, height) {
            flood_fill(&mut background, seed, WHITE);
        }

        preprocessing::bitwise_or(&objects, &preprocessing::invert(&background))
    }
}

/// The four corner pixels, top-left first
pub fn corners(width: u32, height: u32) -> [(u32, u32); 4] {
    [
        (0, 0),
        (width - 1, 0),
        (0, height - 1),
        (width - 1, height - 1),
    ]
}

/// Paint a right-angled triangle with legs of `side` pixels into each
/// corner. A zero side paints nothing.
pub fn paint_corner_wedges(img: &mut GrayImage, side: u32, color: Luma<u8>) {
    let (width, height) = img.dimensions();
    if side == 0 || width == 0 || height == 0 {
        return;
    }
    let (w, h, t) = (width as i32 - 1, height as i32 - 1, side as i32);
    let wedges = [
        [Point::new(0, 0), Point::new(t, 0), Point::new(0, t)],
        [Point::new(0, h), Point::new(t, h), Point::new(0, h - t)],
        [Point::new(w, 0), Point::new(w - t, 0), Point::new(w, t)],
        [Point::new(w, h), Point::new(w - t, h), Point::new(w, h - t)],
    ];
    for wedge in &wedges {
        draw_polygon_mut(img, wedge, color);
    }
}

/// Set the outermost one-pixel frame to `color`
pub fn clear_border(img: &mut GrayImage, color: Luma<u8>) {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    for x in 0..width {
        img.put_pixel(x, 0, color);
        img.put_pixel(x, height - 1, color);
    }
    for y in 0..height {
        img.put_pixel(0, y, color);
        img.put_pixel(width - 1, y, color);
    }
}

/// 4-connected flood fill: recolors the region sharing the seed's value.
pub fn flood_fill(img: &mut GrayImage, seed: (u32, u32), color: Luma<u8>) {
    let (width, height) = img.dimensions();
    let (sx, sy) = seed;
    if sx >= width || sy >= height {
        return;
    }
    let target = *img.get_pixel(sx, sy);
    if target == color {
        return;
    }

    let mut stack = vec![(sx, sy)];
    img.put_pixel(sx, sy, color);
    while let Some((x, y)) = stack.pop() {
        let mut visit = |nx: u32, ny: u32, img: &mut GrayImage| {
            if *img.get_pixel(nx, ny) == target {
                img.put_pixel(nx, ny, color);
                stack.push((nx, ny));
            }
        };
        if x > 0 {
            visit(x - 1, y, img);
        }
        if x + 1 < width {
            visit(x + 1, y, img);
        }
        if y > 0 {
            visit(x, y - 1, img);
        }
        if y + 1 < height {
            visit(x, y + 1, img);
        }
    }
}
