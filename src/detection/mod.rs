pub mod contours;
pub mod ensemble;
pub mod holes;
pub mod keypoints;
pub mod preprocessing;
pub mod regions;
pub mod strategies;

pub use ensemble::Ensemble;
pub use holes::HoleRemoval;
pub use keypoints::{FastPyramidDetector, FixedKeypoints, Keypoint, KeypointDetector};
pub use regions::RegionExtractor;
pub use strategies::{Binarizer, StrategyKind};
