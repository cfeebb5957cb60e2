mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from planktool for tests
pub use planktool::detection::keypoints::{FixedKeypoints, Keypoint};
pub use planktool::{
    Binarizer, Ensemble, FEATURE_COUNT, FEATURE_LABELS, FeatureExtractor, FeatureOutcome,
    HoleRemoval, Pipeline, PipelineConfig, PlanktoolError, RegionExtractor, SkipReason,
    StrategyKind,
};
