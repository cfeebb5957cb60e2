use std::sync::Arc;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::detection::holes::{self, HoleRemoval};
use crate::detection::preprocessing::{self, BLACK, WHITE};
use crate::error::Result;

/// One image → mask capability.
///
/// Implementations must return a mask of the input's size with objects
/// white (255) and background black (0).
pub trait Binarizer: Send + Sync {
    fn binarize(&self, image: &GrayImage) -> Result<GrayImage>;

    /// Human-readable name (used in logs and debug dumps)
    fn name(&self) -> &str;
}

/// Registered strategies, addressable by name from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Otsu,
    OtsuTriangles,
    Canny,
    Sprinkles,
    ProcessA,
    ProcessB,
    Project,
    Stacked,
}

impl StrategyKind {
    /// Members of the default ensemble, in voting order
    pub const DEFAULT_ENSEMBLE: [StrategyKind; 6] = [
        StrategyKind::ProcessB,
        StrategyKind::ProcessA,
        StrategyKind::Project,
        StrategyKind::Sprinkles,
        StrategyKind::Canny,
        StrategyKind::OtsuTriangles,
    ];

    pub fn instantiate(self, holes: HoleRemoval) -> Arc<dyn Binarizer> {
        match self {
            StrategyKind::Otsu => Arc::new(OtsuStep { holes }),
            StrategyKind::OtsuTriangles => Arc::new(OtsuTrianglesStep { holes }),
            StrategyKind::Canny => Arc::new(CannyStep {
                holes,
                ..CannyStep::default()
            }),
            StrategyKind::Sprinkles => Arc::new(SprinklesStep {
                holes,
                ..SprinklesStep::default()
            }),
            StrategyKind::ProcessA => Arc::new(ProcessAStep { holes }),
            StrategyKind::ProcessB => Arc::new(ProcessBStep {
                holes,
                ..ProcessBStep::default()
            }),
            StrategyKind::Project => Arc::new(ProjectStep),
            StrategyKind::Stacked => Arc::new(StackedStep { holes }),
        }
    }
}

/// Plain Otsu followed by a single flood fill from the top-left corner
#[derive(Debug, Clone, Default)]
pub struct OtsuStep {
    pub holes: HoleRemoval,
}

impl Binarizer for OtsuStep {
    fn binarize(&self, image: &GrayImage) -> Result<GrayImage> {
        let (_, binary) = preprocessing::otsu_binarize(image);
        let closed = preprocessing::close(&binary, self.holes.kernel_size);
        let objects = preprocessing::invert(&closed);

        let mut background = objects.clone();
        holes::flood_fill(&mut background, (0, 0), WHITE);

        Ok(preprocessing::bitwise_or(
            &objects,
            &preprocessing::invert(&background),
        ))
    }

    fn name(&self) -> &str {
        "Otsu"
    }
}

/// Otsu followed by the four-corner hole removal
#[derive(Debug, Clone, Default)]
pub struct OtsuTrianglesStep {
    pub holes: HoleRemoval,
}

impl Binarizer for OtsuTrianglesStep {
    fn binarize(&self, image: &GrayImage) -> Result<GrayImage> {
        let (_, binary) = preprocessing::otsu_binarize(image);
        Ok(self.holes.apply_to_dark_objects(&binary))
    }

    fn name(&self) -> &str {
        "Otsu Triangles"
    }
}

/// Canny edges (hysteresis at fractions of the Otsu level), thickened by a
/// blur so neighbouring edge fragments touch, then filled.
#[derive(Debug, Clone)]
pub struct CannyStep {
    pub holes: HoleRemoval,
    pub low_factor: f32,
    pub high_factor: f32,
    pub blur_aperture: u32,
}

impl Default for CannyStep {
    fn default() -> Self {
        Self {
            holes: HoleRemoval::default(),
            low_factor: 0.3,
            high_factor: 0.6,
            blur_aperture: 15,
        }
    }
}

impl Binarizer for CannyStep {
    fn binarize(&self, image: &GrayImage) -> Result<GrayImage> {
        let edges = preprocessing::otsu_canny(image, self.low_factor, self.high_factor);
        let thick = preprocessing::blur_with_aperture(&edges, self.blur_aperture);
        let outlines = preprocessing::threshold(&thick, 0.0);
        Ok(self.holes.apply(&outlines))
    }

    fn name(&self) -> &str {
        "Canny"
    }
}

/// Adaptive mean threshold, heavy blur and an Otsu re-binarization.
/// Small stains on the background wash out in the blur before the objects'
/// rims are confirmed.
#[derive(Debug, Clone)]
pub struct SprinklesStep {
    pub holes: HoleRemoval,
    pub block_size: u32,
    pub offset: f64,
    pub blur_aperture: u32,
}

impl Default for SprinklesStep {
    fn default() -> Self {
        Self {
            holes: HoleRemoval::default(),
            block_size: 11,
            offset: 2.0,
            blur_aperture: 25,
        }
    }
}

impl Binarizer for SprinklesStep {
    fn binarize(&self, image: &GrayImage) -> Result<GrayImage> {
        let mean = preprocessing::adaptive_mean_threshold(image, self.block_size, self.offset);
        let blurred = preprocessing::blur_with_aperture(&mean, self.blur_aperture);
        let (_, rebinary) = preprocessing::otsu_binarize(&blurred);
        Ok(self.holes.apply_to_dark_objects(&rebinary))
    }

    fn name(&self) -> &str {
        "Sprinkles"
    }
}

/// Median blur, adaptive mean threshold, close and open. Kernel sizes scale
/// with the image's longest side.
#[derive(Debug, Clone, Default)]
pub struct ProcessAStep {
    pub holes: HoleRemoval,
}

impl Binarizer for ProcessAStep {
    fn binarize(&self, image: &GrayImage) -> Result<GrayImage> {
        let median_size = preprocessing::percent_of_longest_side(image, 2.0);
        let block_size = preprocessing::percent_of_longest_side(image, 4.0).max(3);
        let close_size = preprocessing::percent_of_longest_side(image, 0.5);
        let open_size = preprocessing::percent_of_longest_side(image, 1.0);

        let median = preprocessing::median_blur(image, median_size);
        let th = preprocessing::adaptive_mean_threshold(&median, block_size, 2.0);
        let closed = preprocessing::close(&th, close_size);
        let opened = preprocessing::open(&closed, open_size);
        Ok(self.holes.apply_to_dark_objects(&opened))
    }

    fn name(&self) -> &str {
        "Process A"
    }
}

/// Histogram equalization, median blur and a fixed-fraction threshold,
/// cleaned up with close and open.
#[derive(Debug, Clone)]
pub struct ProcessBStep {
    pub holes: HoleRemoval,
    /// Threshold as a fraction of full scale
    pub level_fraction: f64,
}

impl Default for ProcessBStep {
    fn default() -> Self {
        Self {
            holes: HoleRemoval::default(),
            level_fraction: 0.18,
        }
    }
}

impl Binarizer for ProcessBStep {
    fn binarize(&self, image: &GrayImage) -> Result<GrayImage> {
        let median_size = preprocessing::percent_of_longest_side(image, 2.0);
        let close_size = preprocessing::percent_of_longest_side(image, 0.5);
        let open_size = preprocessing::percent_of_longest_side(image, 1.7);

        let equalized = preprocessing::equalize(image);
        let median = preprocessing::median_blur(&equalized, median_size);
        let th = preprocessing::threshold(&median, self.level_fraction * 255.0);
        let closed = preprocessing::close(&th, close_size);
        let opened = preprocessing::open(&closed, open_size);
        Ok(self.holes.apply_to_dark_objects(&opened))
    }

    fn name(&self) -> &str {
        "Process B"
    }
}

/// Tuned for either background polarity: a dark background is detected
/// from the border and inverted first. Uses an adaptive Gaussian threshold
/// and its own wedge-and-flood fill sized from the median kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectStep;

impl Binarizer for ProjectStep {
    fn binarize(&self, image: &GrayImage) -> Result<GrayImage> {
        let (width, height) = image.dimensions();

        let source = if preprocessing::mean_intensity(image) - preprocessing::border_mean(image) > 10.0
        {
            preprocessing::invert(image)
        } else {
            image.clone()
        };

        let mut block_size = width.min(height) / 2;
        if block_size % 2 == 0 {
            block_size += 1;
        }
        let kernel_size = (block_size / 60).max(5);

        let median = preprocessing::median_blur(&source, kernel_size * 2 + 1);
        let th = preprocessing::adaptive_gaussian_threshold(&median, block_size, 1.0);
        let closed = preprocessing::close(&th, kernel_size);
        let opened = preprocessing::open(&closed, kernel_size);

        let objects = preprocessing::threshold_inverted(&opened, 220.0);
        let mut background = objects.clone();
        holes::paint_corner_wedges(&mut background, kernel_size * 10, BLACK);
        holes::clear_border(&mut background, BLACK);
        holes::flood_fill(&mut background, (0, 0), WHITE);

        Ok(preprocessing::bitwise_or(
            &objects,
            &preprocessing::invert(&background),
        ))
    }

    fn name(&self) -> &str {
        "Project"
    }
}

/// Union of process A and process B, closed with a wider kernel
#[derive(Debug, Clone, Default)]
pub struct StackedStep {
    pub holes: HoleRemoval,
}

impl Binarizer for StackedStep {
    fn binarize(&self, image: &GrayImage) -> Result<GrayImage> {
        let a = ProcessAStep { holes: self.holes }.binarize(image)?;
        let b = ProcessBStep {
            holes: self.holes,
            ..ProcessBStep::default()
        }
        .binarize(image)?;
        let close_size = preprocessing::percent_of_longest_side(image, 2.0);
        Ok(preprocessing::close(
            &preprocessing::bitwise_or(&a, &b),
            close_size,
        ))
    }

    fn name(&self) -> &str {
        "Stacked"
    }
}
