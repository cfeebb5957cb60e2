use image::GrayImage;

pub const HARALICK_COUNT: usize = 13;

/// `(dy, dx)` offsets of the four directions
const DIRECTIONS: [(i64, i64); 4] = [(0, 1), (1, 1), (1, 0), (1, -1)];

/// Mean of the 13 features over the four directions
pub fn haralick_features(image: &GrayImage) -> [f64; HARALICK_COUNT] {
    let levels = image.pixels().map(|p| p[0] as usize).max().unwrap_or(0) + 1;

    let mut mean = [0.0; HARALICK_COUNT];
    for direction in DIRECTIONS {
        let cmat = cooccurrence(image, levels, direction);
        for (acc, f) in mean.iter_mut().zip(features_of(&cmat, levels)) {
            *acc += f / DIRECTIONS.len() as f64;
        }
    }
    mean
}

/// Symmetric co-occurrence counts, row-major `levels × levels`
fn cooccurrence(image: &GrayImage, levels: usize, (dy, dx): (i64, i64)) -> Vec<f64> {
    let (width, height) = (image.width() as i64, image.height() as i64);
    let mut cmat = vec![0.0; levels * levels];
    for y in 0..height {
        for x in 0..width {
            let (ny, nx) = (y + dy, x + dx);
            if nx < 0 || ny >= height || nx >= width {
                continue;
            }
            let a = image.get_pixel(x as u32, y as u32)[0] as usize;
            let b = image.get_pixel(nx as u32, ny as u32)[0] as usize;
            cmat[a * levels + b] += 1.0;
            cmat[b * levels + a] += 1.0;
        }
    }
    cmat
}

fn entropy(values: &[f64]) -> f64 {
    -values
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| p * p.log2())
        .sum::<f64>()
}

fn features_of(cmat: &[f64], n: usize) -> [f64; HARALICK_COUNT] {
    let total: f64 = cmat.iter().sum();
    let p: Vec<f64> = if total > 0.0 {
        cmat.iter().map(|c| c / total).collect()
    } else {
        vec![0.0; cmat.len()]
    };
    let at = |i: usize, j: usize| p[i * n + j];

    let mut px = vec![0.0; n];
    let mut py = vec![0.0; n];
    let mut p_plus = vec![0.0; 2 * n];
    let mut p_minus = vec![0.0; n];
    for i in 0..n {
        for j in 0..n {
            let v = at(i, j);
            px[j] += v;
            py[i] += v;
            p_plus[i + j] += v;
            p_minus[i.abs_diff(j)] += v;
        }
    }

    let dot_k = |v: &[f64], pow: i32| -> f64 {
        v.iter()
            .enumerate()
            .map(|(k, x)| (k as f64).powi(pow) * x)
            .sum()
    };
    let (ux, uy) = (dot_k(&px, 1), dot_k(&py, 1));
    let vx = dot_k(&px, 2) - ux * ux;
    let vy = dot_k(&py, 2) - uy * uy;
    let (sx, sy) = (vx.max(0.0).sqrt(), vy.max(0.0).sqrt());

    let mut f = [0.0; HARALICK_COUNT];
    f[0] = p.iter().map(|v| v * v).sum();
    f[1] = dot_k(&p_minus, 2);
    f[2] = if sx == 0.0 || sy == 0.0 {
        1.0
    } else {
        let mut ij = 0.0;
        for i in 0..n {
            for j in 0..n {
                ij += (i * j) as f64 * at(i, j);
            }
        }
        (ij - ux * uy) / sx / sy
    };
    f[3] = vx;
    let mut idm = 0.0;
    for i in 0..n {
        for j in 0..n {
            let d = i.abs_diff(j) as f64;
            idm += at(i, j) / (1.0 + d * d);
        }
    }
    f[4] = idm;
    f[5] = dot_k(&p_plus, 1);
    f[6] = dot_k(&p_plus, 2) - f[5] * f[5];
    f[7] = entropy(&p_plus);
    f[8] = entropy(&p);

    let minus_mean = p_minus.iter().sum::<f64>() / n as f64;
    f[9] = p_minus.iter().map(|v| (v - minus_mean).powi(2)).sum::<f64>() / n as f64;
    f[10] = entropy(&p_minus);

    let (hx, hy) = (entropy(&px), entropy(&py));
    let mut hxy1 = 0.0;
    let mut hxy2 = 0.0;
    for i in 0..n {
        for j in 0..n {
            let cross = px[i] * py[j];
            if cross > 0.0 {
                hxy1 -= at(i, j) * cross.log2();
                hxy2 -= cross * cross.log2();
            }
        }
    }
    let hmax = hx.max(hy);
    f[11] = if hmax > 0.0 {
        (f[8] - hxy1) / hmax
    } else {
        f[8] - hxy1
    };
    f[12] = (1.0 - (-2.0 * (hxy2 - f[8])).exp()).max(0.0).sqrt();
    f
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn checkerboard_has_no_correlation_with_right_neighbour() {
        let img = GrayImage::from_fn(8, 8, |x, y| Luma([if (x + y) % 2 == 0 { 0 } else { 1 }]));
        let cmat = cooccurrence(&img, 2, (0, 1));
        let f = features_of(&cmat, 2);
        // Horizontal neighbours always differ
        assert!((f[1] - 1.0).abs() < 1e-12);
        assert!((f[2] + 1.0).abs() < 1e-12);
        assert!((f[4] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn single_pixel_image_has_no_pairs() {
        let f = haralick_features(&GrayImage::from_pixel(1, 1, Luma([9])));
        assert!(f.iter().all(|v| v.is_finite()));
        assert_eq!(f[0], 0.0);
    }
}
