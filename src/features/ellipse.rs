use nalgebra::{DMatrix, Matrix3, Vector3};
use thiserror::Error;

/// Minimum number of contour points a fit needs
pub const MIN_POINTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EllipseFitError {
    #[error("ellipse fit needs at least {MIN_POINTS} points, got {got}")]
    TooFewPoints { got: usize },

    /// Points are collinear or otherwise admit no real ellipse
    #[error("points do not determine an ellipse")]
    Degenerate,
}

/// Ellipse in geometric form, semi-axes with `a >= b`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    pub cx: f64,
    pub cy: f64,
    pub a: f64,
    pub b: f64,
    /// Rotation of the `a` axis from +x, radians
    pub angle: f64,
}

impl Ellipse {
    /// Full axis lengths `(2a, 2b)`
    pub fn full_axes(&self) -> (f64, f64) {
        (2.0 * self.a, 2.0 * self.b)
    }

    pub fn sample_points(&self, n: usize) -> Vec<[f64; 2]> {
        let (sin, cos) = self.angle.sin_cos();
        (0..n)
            .map(|i| {
                let t = std::f64::consts::TAU * i as f64 / n as f64;
                let (px, py) = (self.a * t.cos(), self.b * t.sin());
                [self.cx + cos * px - sin * py, self.cy + sin * px + cos * py]
            })
            .collect()
    }
}

/// Direct least-squares fit (Fitzgibbon, Pilu and Fisher) on points
/// normalized to their centroid
pub fn fit_ellipse(points: &[[f64; 2]]) -> Result<Ellipse, EllipseFitError> {
    let n = points.len();
    if n < MIN_POINTS {
        return Err(EllipseFitError::TooFewPoints { got: n });
    }

    let (mean_x, mean_y, scale) = normalization(points);
    if is_collinear(points, mean_x, mean_y) {
        return Err(EllipseFitError::Degenerate);
    }

    let mut d = DMatrix::<f64>::zeros(n, 6);
    for (i, &[px, py]) in points.iter().enumerate() {
        let x = (px - mean_x) * scale;
        let y = (py - mean_y) * scale;
        d[(i, 0)] = x * x;
        d[(i, 1)] = x * y;
        d[(i, 2)] = y * y;
        d[(i, 3)] = x;
        d[(i, 4)] = y;
        d[(i, 5)] = 1.0;
    }
    let s = d.transpose() * &d;
    let s11 = s.fixed_view::<3, 3>(0, 0).into_owned();
    let s12 = s.fixed_view::<3, 3>(0, 3).into_owned();
    let s22 = s.fixed_view::<3, 3>(3, 3).into_owned();

    let s22_inv = s22.try_inverse().ok_or(EllipseFitError::Degenerate)?;
    let m = s11 - s12 * s22_inv * s12.transpose();

    // C1 = [[0, 0, 2], [0, -1, 0], [2, 0, 0]], inverse written out
    let c1_inv = Matrix3::new(0.0, 0.0, 0.5, 0.0, -1.0, 0.0, 0.5, 0.0, 0.0);
    let a1 = constrained_eigenvector(&(c1_inv * m)).ok_or(EllipseFitError::Degenerate)?;
    let a2 = -s22_inv * s12.transpose() * a1;

    let conic = denormalize([a1[0], a1[1], a1[2], a2[0], a2[1], a2[2]], mean_x, mean_y, scale);
    conic_to_ellipse(conic).ok_or(EllipseFitError::Degenerate)
}

fn normalization(points: &[[f64; 2]]) -> (f64, f64, f64) {
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p[1]).sum::<f64>() / n;
    let mean_dist = points
        .iter()
        .map(|p| ((p[0] - mean_x).powi(2) + (p[1] - mean_y).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    let scale = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    (mean_x, mean_y, scale)
}

/// Smallest spread direction carries (almost) no variance
fn is_collinear(points: &[[f64; 2]], mean_x: f64, mean_y: f64) -> bool {
    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for p in points {
        let (dx, dy) = (p[0] - mean_x, p[1] - mean_y);
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    let half_trace = (sxx + syy) / 2.0;
    let spread = ((sxx - syy).powi(2) / 4.0 + sxy * sxy).sqrt();
    let (small, large) = (half_trace - spread, half_trace + spread);
    large <= 0.0 || small <= large * 1e-10
}

/// Eigenvector of the 3×3 system satisfying `4AC − B² > 0`, taking the
/// smallest-magnitude eigenvalue when several qualify.
fn constrained_eigenvector(system: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let a = system;
    let trace = a.trace();
    let minors = a[(0, 0)] * a[(1, 1)] - a[(0, 1)] * a[(1, 0)] + a[(0, 0)] * a[(2, 2)]
        - a[(0, 2)] * a[(2, 0)]
        + a[(1, 1)] * a[(2, 2)]
        - a[(1, 2)] * a[(2, 1)];
    let det = a.determinant();

    let mut best: Option<(f64, Vector3<f64>)> = None;
    for ev in real_cubic_roots(-trace, minors, -det) {
        let Some(v) = null_vector(&(system - Matrix3::identity() * ev)) else {
            continue;
        };
        if 4.0 * v[0] * v[2] - v[1] * v[1] <= 0.0 {
            continue;
        }
        if best.is_none_or(|(b, _)| ev.abs() < b) {
            best = Some((ev.abs(), v));
        }
    }
    best.map(|(_, v)| v)
}

/// Null vector of a rank-2 3×3 matrix: the largest row of its adjugate
fn null_vector(m: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let rows = [
        Vector3::new(
            m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)],
            m[(1, 2)] * m[(2, 0)] - m[(1, 0)] * m[(2, 2)],
            m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)],
        ),
        Vector3::new(
            m[(0, 2)] * m[(2, 1)] - m[(0, 1)] * m[(2, 2)],
            m[(0, 0)] * m[(2, 2)] - m[(0, 2)] * m[(2, 0)],
            m[(0, 1)] * m[(2, 0)] - m[(0, 0)] * m[(2, 1)],
        ),
        Vector3::new(
            m[(0, 1)] * m[(1, 2)] - m[(0, 2)] * m[(1, 1)],
            m[(0, 2)] * m[(1, 0)] - m[(0, 0)] * m[(1, 2)],
            m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)],
        ),
    ];
    let best = rows
        .into_iter()
        .max_by(|l, r| l.norm_squared().total_cmp(&r.norm_squared()))?;
    let norm = best.norm();
    if norm < 1e-15 {
        return None;
    }
    Some(best / norm)
}

/// Real roots of `x³ + b x² + c x + d`
fn real_cubic_roots(b: f64, c: f64, d: f64) -> Vec<f64> {
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
    let shift = -b / 3.0;
    let disc = -4.0 * p * p * p - 27.0 * q * q;

    if disc >= 0.0 {
        let r = (-p / 3.0).max(0.0).sqrt();
        let cos_arg = if r < 1e-15 {
            0.0
        } else {
            (-q / (2.0 * r * r * r)).clamp(-1.0, 1.0)
        };
        let theta = cos_arg.acos();
        (0..3)
            .map(|k| 2.0 * r * ((theta + k as f64 * std::f64::consts::TAU) / 3.0).cos() + shift)
            .collect()
    } else {
        let sqrt_disc = (q * q / 4.0 + p * p * p / 27.0).sqrt();
        vec![(-q / 2.0 + sqrt_disc).cbrt() + (-q / 2.0 - sqrt_disc).cbrt() + shift]
    }
}

/// Undo `x' = s(x − mx)`, `y' = s(y − my)` on conic coefficients
fn denormalize(c: [f64; 6], mx: f64, my: f64, s: f64) -> [f64; 6] {
    let [a, b, cc, d, e, f] = c;
    let s2 = s * s;
    [
        a * s2,
        b * s2,
        cc * s2,
        -2.0 * a * s2 * mx - b * s2 * my + d * s,
        -b * s2 * mx - 2.0 * cc * s2 * my + e * s,
        a * s2 * mx * mx + b * s2 * mx * my + cc * s2 * my * my - d * s * mx - e * s * my + f,
    ]
}

fn conic_to_ellipse(coeffs: [f64; 6]) -> Option<Ellipse> {
    // Positive-definite quadratic part, so the smaller eigenvalue is the major axis
    let coeffs = if coeffs[0] + coeffs[2] < 0.0 {
        coeffs.map(|v| -v)
    } else {
        coeffs
    };
    let [a, b, c, d, e, f] = coeffs;
    let denom = 4.0 * a * c - b * b;
    if denom <= 0.0 {
        return None;
    }
    let cx = (b * e - 2.0 * c * d) / denom;
    let cy = (b * d - 2.0 * a * e) / denom;

    let at_center = a * cx * cx + b * cx * cy + c * cy * cy + d * cx + e * cy + f;
    if at_center.abs() < 1e-15 {
        return None;
    }

    let sum = a + c;
    let diff = ((a - c).powi(2) + b * b).sqrt();
    let (l1, l2) = ((sum - diff) / 2.0, (sum + diff) / 2.0);
    let (a_sq, b_sq) = (-at_center / l1, -at_center / l2);
    if !(a_sq > 0.0 && b_sq > 0.0) || !a_sq.is_finite() || !b_sq.is_finite() {
        return None;
    }

    // atan2 gives the direction of the larger eigenvalue (minor axis)
    let angle = if b.abs() < 1e-15 && (a - c).abs() < 1e-15 {
        0.0
    } else {
        0.5 * b.atan2(a - c) + std::f64::consts::FRAC_PI_2
    };
    let ellipse = Ellipse {
        cx,
        cy,
        a: a_sq.sqrt(),
        b: b_sq.sqrt(),
        angle: wrap_half_turn(angle),
    };
    (ellipse.cx.is_finite() && ellipse.cy.is_finite()).then_some(ellipse)
}

/// Fold an axis direction into (−π/2, π/2]
fn wrap_half_turn(angle: f64) -> f64 {
    use std::f64::consts::{FRAC_PI_2, PI};
    let mut a = angle;
    while a > FRAC_PI_2 {
        a -= PI;
    }
    while a <= -FRAC_PI_2 {
        a += PI;
    }
    a
}
