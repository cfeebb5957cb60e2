use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::{ThresholdType, equalize_histogram, otsu_level};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::{gaussian_blur_f32, median_filter};
use imageproc::integral_image::{integral_image, sum_image_pixels};
use imageproc::morphology;

pub const WHITE: Luma<u8> = Luma([255]);
pub const BLACK: Luma<u8> = Luma([0]);

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Gaussian blur sized by an aperture, deriving sigma the way OpenCV does
/// for `sigma = 0`.
pub fn blur_with_aperture(img: &GrayImage, ksize: u32) -> GrayImage {
    let sigma = 0.3 * ((ksize.max(1) as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    gaussian_blur_f32(img, sigma.max(0.1))
}

/// Median blur with a square aperture
pub fn median_blur(img: &GrayImage, ksize: u32) -> GrayImage {
    let radius = ksize / 2;
    if radius == 0 {
        return img.clone();
    }
    median_filter(img, radius, radius)
}

pub fn equalize(img: &GrayImage) -> GrayImage {
    equalize_histogram(img)
}

/// Pixels strictly brighter than `level` become white, the rest black.
pub fn threshold(img: &GrayImage, level: f64) -> GrayImage {
    threshold_with(img, level, ThresholdType::Binary)
}

/// Inverse of [`threshold`]: bright pixels become black.
pub fn threshold_inverted(img: &GrayImage, level: f64) -> GrayImage {
    threshold_with(img, level, ThresholdType::BinaryInverted)
}

fn threshold_with(img: &GrayImage, level: f64, kind: ThresholdType) -> GrayImage {
    // `v > level` for a u8 `v` is `v > floor(level)`
    if level < 0.0 {
        let all_above = match kind {
            ThresholdType::BinaryInverted => BLACK,
            _ => WHITE,
        };
        return GrayImage::from_pixel(img.width(), img.height(), all_above);
    }
    imageproc::contrast::threshold(img, level.floor().min(255.0) as u8, kind)
}

/// Global Otsu binarization. Returns the level and the binary image.
pub fn otsu_binarize(img: &GrayImage) -> (u8, GrayImage) {
    let level = otsu_level(img);
    (level, threshold(img, level as f64))
}

/// Canny edges with hysteresis thresholds derived from the Otsu level.
///
/// A zero low threshold (Otsu level 0 on flat or two-level images) would
/// make every pixel an edge candidate, so the edge map is empty instead.
pub fn otsu_canny(img: &GrayImage, low_factor: f32, high_factor: f32) -> GrayImage {
    let level = otsu_level(img) as f32;
    let (low, high) = (low_factor * level, high_factor * level);
    if low <= 0.0 || high <= 0.0 {
        return GrayImage::from_pixel(img.width(), img.height(), BLACK);
    }
    canny(img, low, high)
}

/// Adaptive threshold against the local box mean: a pixel is white when it
/// is brighter than `mean - c` over the `block_size` window around it.
pub fn adaptive_mean_threshold(img: &GrayImage, block_size: u32, c: f64) -> GrayImage {
    let (width, height) = img.dimensions();
    let integral = integral_image::<_, u64>(img);
    let radius = block_size / 2;

    GrayImage::from_fn(width, height, |x, y| {
        let left = x.saturating_sub(radius);
        let top = y.saturating_sub(radius);
        let right = (x + radius).min(width - 1);
        let bottom = (y + radius).min(height - 1);
        let count = ((right - left + 1) * (bottom - top + 1)) as f64;
        let mean = sum_image_pixels(&integral, left, top, right, bottom)[0] as f64 / count;
        if img.get_pixel(x, y)[0] as f64 > mean - c {
            WHITE
        } else {
            BLACK
        }
    })
}

/// Adaptive threshold against a Gaussian-weighted local mean.
pub fn adaptive_gaussian_threshold(img: &GrayImage, block_size: u32, c: f64) -> GrayImage {
    let local = blur_with_aperture(img, block_size);
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y)[0] as f64 > local.get_pixel(x, y)[0] as f64 - c {
            WHITE
        } else {
            BLACK
        }
    })
}

/// Morphological closing with a square kernel of side `ksize`.
///
/// Even sizes are rounded up to the next odd square.
pub fn close(img: &GrayImage, ksize: u32) -> GrayImage {
    let k = square_radius(ksize);
    if k == 0 {
        return img.clone();
    }
    morphology::close(img, Norm::LInf, k)
}

/// Morphological opening with a square kernel of side `ksize`.
pub fn open(img: &GrayImage, ksize: u32) -> GrayImage {
    let k = square_radius(ksize);
    if k == 0 {
        return img.clone();
    }
    morphology::open(img, Norm::LInf, k)
}

fn square_radius(ksize: u32) -> u8 {
    (ksize / 2).min(u8::MAX as u32) as u8
}

pub fn invert(img: &GrayImage) -> GrayImage {
    let mut out = img.clone();
    image::imageops::invert(&mut out);
    out
}

/// Pixel-wise OR of two masks of equal size
pub fn bitwise_or(a: &GrayImage, b: &GrayImage) -> GrayImage {
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        Luma([a.get_pixel(x, y)[0] | b.get_pixel(x, y)[0]])
    })
}

/// Odd kernel size proportional to the image's longest side:
/// `floor(max(w, h) / (200 / percent)) * 2 + 1`.
pub fn percent_of_longest_side(img: &GrayImage, percent: f64) -> u32 {
    let longest = img.width().max(img.height()) as f64;
    (longest / (200.0 / percent)).floor() as u32 * 2 + 1
}

/// Mean intensity over the whole image
pub fn mean_intensity(img: &GrayImage) -> f64 {
    let count = img.width() as u64 * img.height() as u64;
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = img.pixels().map(|p| p[0] as u64).sum();
    sum as f64 / count as f64
}

/// Mean intensity of the outermost one-pixel frame
pub fn border_mean(img: &GrayImage) -> f64 {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }
    let mut sum = 0u64;
    let mut count = 0u64;
    for x in 0..width {
        sum += img.get_pixel(x, 0)[0] as u64 + img.get_pixel(x, height - 1)[0] as u64;
        count += 2;
    }
    for y in 0..height {
        sum += img.get_pixel(0, y)[0] as u64 + img.get_pixel(width - 1, y)[0] as u64;
        count += 2;
    }
    sum as f64 / count as f64
}
