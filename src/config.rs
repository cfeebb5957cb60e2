use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::detection::strategies::StrategyKind;
use crate::error::{PlanktoolError, Result};

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub hole_removal: HoleRemovalConfig,
    pub ensemble: EnsembleConfig,
    pub regions: RegionConfig,
    pub keypoints: KeypointConfig,
}

/// Parameters of the shared hole-filling primitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HoleRemovalConfig {
    /// Side of the square closing kernel
    pub kernel_size: u32,

    /// Side of the corner wedges as a fraction of the image width
    pub corner_fraction: f64,
}

impl Default for HoleRemovalConfig {
    fn default() -> Self {
        Self {
            kernel_size: 5,
            corner_fraction: 0.05,
        }
    }
}

/// Member strategies and voting threshold of the preprocessor ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    pub strategies: Vec<StrategyKind>,

    /// A pixel belongs to the agreed background when the summed votes stay
    /// at or below this fraction of the maximum possible sum.
    pub vote_fraction: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            strategies: StrategyKind::DEFAULT_ENSEMBLE.to_vec(),
            vote_fraction: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Contours with an area not above this value are discarded (px²)
    pub min_area: f64,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self { min_area: 3000.0 }
    }
}

/// ORB-style keypoint detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeypointConfig {
    /// FAST intensity threshold
    pub fast_threshold: u8,
    /// Keypoints kept after ranking by score
    pub max_features: usize,
    /// Number of pyramid levels
    pub levels: u32,
    /// Downscale factor between pyramid levels
    pub scale_factor: f32,
    /// Keypoints closer than this to a level's border are dropped
    pub edge_threshold: u32,
}

impl Default for KeypointConfig {
    fn default() -> Self {
        Self {
            fast_threshold: 20,
            max_features: 500,
            levels: 8,
            scale_factor: 1.2,
            edge_threshold: 31,
        }
    }
}

impl PipelineConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.hole_removal.kernel_size == 0 {
            return Err(PlanktoolError::Config(
                "hole_removal.kernel_size must be at least 1".to_string(),
            ));
        }
        if !(0.0..0.5).contains(&self.hole_removal.corner_fraction) {
            return Err(PlanktoolError::Config(format!(
                "hole_removal.corner_fraction = {} is outside [0, 0.5)",
                self.hole_removal.corner_fraction
            )));
        }
        if self.ensemble.strategies.is_empty() {
            return Err(PlanktoolError::EmptyEnsemble);
        }
        if !(0.0..=1.0).contains(&self.ensemble.vote_fraction) {
            return Err(PlanktoolError::Config(format!(
                "ensemble.vote_fraction = {} is outside [0, 1]",
                self.ensemble.vote_fraction
            )));
        }
        if self.regions.min_area < 0.0 {
            return Err(PlanktoolError::Config(format!(
                "regions.min_area = {} is negative",
                self.regions.min_area
            )));
        }
        if self.keypoints.levels == 0 || self.keypoints.scale_factor <= 1.0 {
            return Err(PlanktoolError::Config(
                "keypoints need at least one level and a scale factor above 1".to_string(),
            ));
        }
        Ok(())
    }
}
