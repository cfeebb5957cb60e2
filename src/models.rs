use image::GrayImage;
use imageproc::point::Point;

/// Number of entries in a feature vector
pub const FEATURE_COUNT: usize = 37;

/// Feature names, in the exact order values are stored in a [`FeatureVector`].
pub const FEATURE_LABELS: [&str; FEATURE_COUNT] = [
    "rectangle_mean",
    "ellipse_mean",
    "aspect_ratio",
    "area",
    "area_hull",
    "solidity",
    "extent",
    "perimeter",
    "perimeter_hull",
    "circularity",
    "heywood_circularity",
    "waddel_circularity",
    "rectangularity",
    "eccentricity",
    "ellipseArea",
    "convexity2",
    "convexity3",
    "hu0",
    "hu1",
    "hu2",
    "hu3",
    "hu4",
    "hu5",
    "hu6",
    "har0",
    "har1",
    "har2",
    "har3",
    "har4",
    "har5",
    "har6",
    "har7",
    "har8",
    "har9",
    "har10",
    "har11",
    "har12",
];

/// Closed boundary polyline of one connected foreground component
pub type ContourPoints = Vec<Point<i32>>;

/// Axis-aligned bounding box in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Inclusive pixel extent of a set of points, `None` when empty
    pub fn of_points(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            x: min_x.max(0) as u32,
            y: min_y.max(0) as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

/// One candidate object: a square crop of the original image and the
/// contour that produced it.
#[derive(Debug, Clone)]
pub struct Region {
    pub crop: GrayImage,
    pub contour: ContourPoints,
    /// Top-left corner of `crop` in the original image
    pub crop_origin: (u32, u32),
}

impl Region {
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::of_points(&self.contour).unwrap_or(BoundingBox {
            x: self.crop_origin.0,
            y: self.crop_origin.1,
            width: 0,
            height: 0,
        })
    }
}

/// Fixed-schema numeric descriptor of one region
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a feature by its schema label
    pub fn get(&self, label: &str) -> Option<f64> {
        FEATURE_LABELS
            .iter()
            .position(|l| *l == label)
            .map(|idx| self.values[idx])
    }

    /// `(label, value)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_LABELS.iter().copied().zip(self.values.iter().copied())
    }
}

/// A region that passed the validity gate, with the bookkeeping columns the
/// dataset builder and renderer need.
#[derive(Debug, Clone)]
pub struct RegionFeatures {
    pub region: Region,
    pub bbox: BoundingBox,
    pub features: FeatureVector,
}
