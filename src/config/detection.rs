use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::graph::Granularity;

/// Community detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Ceiling on full optimizer sweeps per level
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Ceiling on aggregation rounds
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,

    /// Split communities that are not internally connected before aggregating
    #[serde(default = "default_refine")]
    pub refine: bool,

    /// Vertex identity resolution applied at ingestion
    #[serde(default)]
    pub granularity: Granularity,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_levels: default_max_levels(),
            refine: default_refine(),
            granularity: Granularity::default(),
        }
    }
}

impl DetectionConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(Error::invalid_config(
                "max_iterations",
                "at least one optimizer sweep is required",
            ));
        }
        if self.max_levels == 0 {
            return Err(Error::invalid_config(
                "max_levels",
                "at least one aggregation level is required",
            ));
        }
        Ok(())
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }

    pub fn with_refinement(mut self, refine: bool) -> Self {
        self.refine = refine;
        self
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }
}

fn default_max_iterations() -> usize {
    100
}

fn default_max_levels() -> usize {
    32
}

fn default_refine() -> bool {
    true
}
