use image::GrayImage;

/// The seven Hu invariants of the intensity-weighted moments of `image`.
///
/// All zeros for an image without mass.
pub fn hu_moments(image: &GrayImage) -> [f64; 7] {
    let (mut m00, mut m10, mut m01) = (0.0, 0.0, 0.0);
    for (x, y, p) in image.enumerate_pixels() {
        let v = p[0] as f64;
        m00 += v;
        m10 += x as f64 * v;
        m01 += y as f64 * v;
    }
    if m00 == 0.0 {
        return [0.0; 7];
    }
    let (xc, yc) = (m10 / m00, m01 / m00);

    // Central moments up to third order
    let mut mu = [[0.0f64; 4]; 4];
    for (x, y, p) in image.enumerate_pixels() {
        let v = p[0] as f64;
        if v == 0.0 {
            continue;
        }
        let (dx, dy) = (x as f64 - xc, y as f64 - yc);
        let xs = [1.0, dx, dx * dx, dx * dx * dx];
        let ys = [1.0, dy, dy * dy, dy * dy * dy];
        for (p_ord, x_pow) in xs.iter().enumerate() {
            for (q_ord, y_pow) in ys.iter().enumerate().take(4 - p_ord) {
                mu[p_ord][q_ord] += v * x_pow * y_pow;
            }
        }
    }

    let nu = |p: usize, q: usize| mu[p][q] / m00.powf((p + q) as f64 / 2.0 + 1.0);
    let (n20, n02, n11) = (nu(2, 0), nu(0, 2), nu(1, 1));
    let (n30, n03, n21, n12) = (nu(3, 0), nu(0, 3), nu(2, 1), nu(1, 2));

    let t0 = n30 + n12;
    let t1 = n21 + n03;
    let q0 = n30 - 3.0 * n12;
    let q1 = 3.0 * n21 - n03;

    [
        n20 + n02,
        (n20 - n02).powi(2) + 4.0 * n11 * n11,
        q0 * q0 + q1 * q1,
        t0 * t0 + t1 * t1,
        q0 * t0 * (t0 * t0 - 3.0 * t1 * t1) + q1 * t1 * (3.0 * t0 * t0 - t1 * t1),
        (n20 - n02) * (t0 * t0 - t1 * t1) + 4.0 * n11 * t0 * t1,
        q1 * t0 * (t0 * t0 - 3.0 * t1 * t1) - q0 * t1 * (3.0 * t0 * t0 - t1 * t1),
    ]
}

/// `−sign(h)·log10|h|`, with 0 for `h == 0`
pub fn log_scale(h: f64) -> f64 {
    if h == 0.0 {
        0.0
    } else {
        -h.signum() * h.abs().log10()
    }
}
