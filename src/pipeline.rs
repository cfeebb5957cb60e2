use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::GrayImage;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::detection::ensemble::Ensemble;
use crate::detection::keypoints::KeypointDetector;
use crate::detection::regions::RegionExtractor;
use crate::error::{PlanktoolError, Result};
use crate::features::{FeatureExtractor, FeatureOutcome};
use crate::models::{Region, RegionFeatures};

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
    /// Whether debug mode is enabled
    pub enabled: bool,
}

impl DebugConfig {
    /// Directory for one stage of one image: `<image>/NN_<stage>`
    fn stage_dir(&self, image_name: &str, index: usize, stage: &str) -> Result<PathBuf> {
        let dir = self.output_dir.join(image_name).join(format!(
            "{:02}_{}",
            index,
            stage.to_lowercase().replace(' ', "_")
        ));
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn save_stage<'a>(
        &self,
        image_name: &str,
        index: usize,
        stage: &str,
        images: impl IntoIterator<Item = &'a GrayImage>,
    ) -> Result<()> {
        let dir = self.stage_dir(image_name, index, stage)?;
        let mut count = 0;
        for (idx, img) in images.into_iter().enumerate() {
            img.save(dir.join(format!("{:02}.png", idx + 1)))?;
            count += 1;
        }
        debug!(image = image_name, stage, count, "debug images saved");
        Ok(())
    }
}

/// Context shared by every image a pipeline processes
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

impl PipelineContext {
    fn active_debug(&self) -> Option<&DebugConfig> {
        self.debug.as_ref().filter(|d| d.enabled)
    }
}

/// Image → consensus mask → regions → feature vectors.
///
/// A pipeline holds no per-image state, so one instance can serve any
/// number of images, concurrently included.
#[derive(Debug)]
pub struct Pipeline {
    ensemble: Ensemble,
    extractor: RegionExtractor,
    context: PipelineContext,
}

impl Pipeline {
    /// Pipeline with the default configuration
    pub fn new() -> Self {
        Self {
            ensemble: Ensemble::default(),
            extractor: RegionExtractor::default(),
            context: PipelineContext::default(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ensemble: Ensemble::from_config(&config.ensemble, &config.hole_removal)?,
            extractor: RegionExtractor::new(&config.regions, &config.keypoints),
            context: PipelineContext::default(),
        })
    }

    /// Enable debug mode with output directory.
    /// The directory must be empty or non-existent.
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            if std::fs::read_dir(&output_dir)?.next().is_some() {
                return Err(PlanktoolError::Config(format!(
                    "debug directory is not empty: {}",
                    output_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig {
            output_dir,
            enabled: true,
        });
        Ok(self)
    }

    pub fn with_ensemble(mut self, ensemble: Ensemble) -> Self {
        self.ensemble = ensemble;
        self
    }

    pub fn with_keypoint_detector(mut self, detector: Arc<dyn KeypointDetector>) -> Self {
        self.extractor = self.extractor.with_detector(detector);
        self
    }

    pub fn with_min_area(mut self, min_area: f64) -> Self {
        self.extractor = self.extractor.with_min_area(min_area);
        self
    }

    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    pub fn debug_dir(&self) -> Option<&Path> {
        self.context.active_debug().map(|d| d.output_dir.as_path())
    }

    /// Consensus mask of one image
    pub fn mask(&self, image: &GrayImage) -> Result<GrayImage> {
        self.ensemble.apply(image)
    }

    /// Candidate regions of one image, before feature computation
    pub fn regions(&self, image: &GrayImage) -> Result<Vec<Region>> {
        let mask = self.ensemble.apply(image)?;
        self.extractor.extract(image, &mask)
    }

    /// Run on one image
    pub fn run(&self, image: &GrayImage) -> Result<Vec<RegionFeatures>> {
        self.run_named(image, "image")
    }

    /// Run on one image; `name` labels its debug output directory and logs
    pub fn run_named(&self, image: &GrayImage, name: &str) -> Result<Vec<RegionFeatures>> {
        PlanktoolError::check_image(image)?;
        let debug = self.context.active_debug();
        if let Some(d) = debug {
            d.save_stage(name, 0, "input", [image])?;
        }

        let masks = self.ensemble.member_masks(image)?;
        let consensus = self.ensemble.vote(&masks)?;
        if let Some(d) = debug {
            d.save_stage(name, 1, "members", &masks)?;
            d.save_stage(name, 2, "consensus", [&consensus])?;
        }

        let regions = self.extractor.extract(image, &consensus)?;
        if let Some(d) = debug {
            d.save_stage(name, 3, "regions", regions.iter().map(|r| &r.crop))?;
        }

        let features = FeatureExtractor::new(image);
        let total = regions.len();
        let mut results = Vec::with_capacity(total);
        for (idx, region) in regions.into_iter().enumerate() {
            match features.compute(&region.contour) {
                FeatureOutcome::Valid(vector) => results.push(RegionFeatures {
                    bbox: region.bounding_box(),
                    region,
                    features: vector,
                }),
                FeatureOutcome::Skipped(reason) => {
                    debug!(image = name, region = idx + 1, %reason, "region skipped");
                }
            }
        }

        info!(image = name, regions = total, valid = results.len(), "image processed");
        Ok(results)
    }

    /// Run on many images in parallel. Entries fail independently.
    pub fn run_batch(&self, images: &[GrayImage]) -> Vec<Result<Vec<RegionFeatures>>> {
        images
            .par_iter()
            .enumerate()
            .map(|(idx, image)| self.run_named(image, &format!("image_{:03}", idx + 1)))
            .collect()
    }

    /// Like [`Pipeline::run_batch`], with a debug/log name per image.
    /// Extra images or names beyond the shorter list are ignored.
    pub fn run_batch_named(
        &self,
        images: &[GrayImage],
        names: &[String],
    ) -> Vec<Result<Vec<RegionFeatures>>> {
        images
            .par_iter()
            .zip(names.par_iter())
            .map(|(image, name)| self.run_named(image, name))
            .collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
