pub mod config;
pub mod dataset;
pub mod detection;
pub mod error;
pub mod features;
pub mod loader;
pub mod models;
pub mod pipeline;

pub use config::PipelineConfig;
pub use detection::{Binarizer, Ensemble, HoleRemoval, KeypointDetector, RegionExtractor, StrategyKind};
pub use error::{PlanktoolError, Result};
pub use features::{FeatureExtractor, FeatureOutcome, SkipReason, compute_features};
pub use models::{BoundingBox, FEATURE_COUNT, FEATURE_LABELS, FeatureVector, Region, RegionFeatures};
pub use pipeline::{DebugConfig, Pipeline, PipelineContext};
