use std::sync::Arc;

use image::GrayImage;
use rayon::prelude::*;
use tracing::debug;

use crate::config::{EnsembleConfig, HoleRemovalConfig};
use crate::detection::holes::HoleRemoval;
use crate::detection::preprocessing::{BLACK, WHITE};
use crate::detection::strategies::Binarizer;
use crate::error::{PlanktoolError, Result};

/// Per-pixel vote over member masks. A pixel is background when the summed
/// mask values stay at or below `vote_fraction * members * 255`.
pub struct Ensemble {
    members: Vec<Arc<dyn Binarizer>>,
    vote_fraction: f64,
    holes: HoleRemoval,
}

impl std::fmt::Debug for Ensemble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ensemble")
            .field("members", &self.member_names())
            .field("vote_fraction", &self.vote_fraction)
            .field("holes", &self.holes)
            .finish()
    }
}

impl Default for Ensemble {
    /// The six default strategies with the default vote fraction
    fn default() -> Self {
        let config = EnsembleConfig::default();
        let holes = HoleRemoval::default();
        Self {
            members: config
                .strategies
                .iter()
                .map(|kind| kind.instantiate(holes))
                .collect(),
            vote_fraction: config.vote_fraction,
            holes,
        }
    }
}

impl Ensemble {
    pub fn new(
        members: Vec<Arc<dyn Binarizer>>,
        vote_fraction: f64,
        holes: HoleRemoval,
    ) -> Result<Self> {
        if members.is_empty() {
            return Err(PlanktoolError::EmptyEnsemble);
        }
        if !(0.0..=1.0).contains(&vote_fraction) {
            return Err(PlanktoolError::Config(format!(
                "vote_fraction = {vote_fraction} is outside [0, 1]"
            )));
        }
        Ok(Self {
            members,
            vote_fraction,
            holes,
        })
    }

    /// Build the configured member list from the strategy registry
    pub fn from_config(ensemble: &EnsembleConfig, holes: &HoleRemovalConfig) -> Result<Self> {
        let holes = HoleRemoval::new(holes);
        let members = ensemble
            .strategies
            .iter()
            .map(|kind| kind.instantiate(holes))
            .collect();
        Self::new(members, ensemble.vote_fraction, holes)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name()).collect()
    }

    /// Run every member on the image. Members are independent and run in
    /// parallel; the returned masks follow member order.
    pub fn member_masks(&self, image: &GrayImage) -> Result<Vec<GrayImage>> {
        PlanktoolError::check_image(image)?;
        let (width, height) = image.dimensions();

        self.members
            .par_iter()
            .map(|member| {
                let mask = member.binarize(image)?;
                if mask.dimensions() != (width, height) {
                    return Err(PlanktoolError::MaskSize {
                        strategy: member.name().to_string(),
                        width,
                        height,
                        got_width: mask.width(),
                        got_height: mask.height(),
                    });
                }
                debug!(strategy = member.name(), "member mask ready");
                Ok(mask)
            })
            .collect()
    }

    /// Reduce member masks to the consensus mask.
    ///
    /// Depends only on the multiset of masks: the per-pixel sum is the only
    /// reduction.
    pub fn vote(&self, masks: &[GrayImage]) -> Result<GrayImage> {
        let first = masks.first().ok_or(PlanktoolError::EmptyEnsemble)?;
        let (width, height) = first.dimensions();

        let mut sums = vec![0u32; width as usize * height as usize];
        for (idx, mask) in masks.iter().enumerate() {
            if mask.dimensions() != (width, height) {
                return Err(PlanktoolError::MaskSize {
                    strategy: format!("vote input #{}", idx + 1),
                    width,
                    height,
                    got_width: mask.width(),
                    got_height: mask.height(),
                });
            }
            for (sum, p) in sums.iter_mut().zip(mask.pixels()) {
                *sum += p[0] as u32;
            }
        }

        let limit = masks.len() as f64 * 255.0 * self.vote_fraction;
        let agreed_background = GrayImage::from_fn(width, height, |x, y| {
            if sums[(y * width + x) as usize] as f64 <= limit {
                WHITE
            } else {
                BLACK
            }
        });

        Ok(self.holes.apply_to_dark_objects(&agreed_background))
    }

    /// Consensus mask for one image
    pub fn apply(&self, image: &GrayImage) -> Result<GrayImage> {
        let masks = self.member_masks(image)?;
        self.vote(&masks)
    }
}
