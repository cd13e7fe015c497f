//! Configuration for servicemap.
//!
//! Settings live in a `.servicemap.toml` file:
//!
//! ```toml
//! [detection]
//! max_iterations = 100
//! max_levels = 32
//! refine = true
//! granularity = "method"
//! ```
//!
//! Every field is optional; missing values take their defaults.

mod detection;
mod loader;

pub use detection::DetectionConfig;
pub use loader::{directory_ancestors, discover_config, load_config, parse_config, CONFIG_FILE_NAME};

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicemapConfig {
    /// Community detection settings
    #[serde(default)]
    pub detection: DetectionConfig,
}
