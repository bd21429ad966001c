//! Render configuration.
//!
//! Every tunable of a render lives in [`RenderConfig`]. Defaults reproduce the
//! reference render; a YAML file can override any subset of fields and the CLI
//! can override those again.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Parameters of a prism render.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Base width of the equilateral prism, in paper widths
    pub prism_width: f32,
    /// Height of the prism above the paper
    pub prism_height: f32,
    /// Hits closer than this to a ray's origin are ignored
    pub min_hit_distance: f32,
    /// Exponent applied to normalized brightness before quantizing
    pub gamma: f32,
    /// Magnification around the image center
    pub zoom: f32,
    /// Seconds between numbered snapshot exports, 0 disables them
    pub save_interval_secs: u64,
    /// Milliseconds between coordinator wake-ups (preview refresh, stop checks)
    pub poll_interval_ms: u64,
    /// Scale of the wavelength color deposited per landed path
    pub deposit_intensity: f32,
    /// Prism bounces after which a path is abandoned
    pub max_bounces: u32,
    /// Worker thread count, defaults to the available parallelism
    pub threads: Option<usize>,
    /// Seed for all worker generators, defaults to OS entropy
    pub seed: Option<u64>,
    /// Paths each worker traces before stopping on its own
    pub paths_per_worker: Option<u64>,
    /// Wall-clock seconds after which the render is stopped
    pub time_limit_secs: Option<u64>,
    /// Directory exports are written to
    pub output_dir: PathBuf,
    /// File name prefix of exports
    pub output_prefix: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 3300,
            height: 4200,
            prism_width: 0.3,
            prism_height: 2.0,
            min_hit_distance: 0.001,
            gamma: 1.0 / 2.2,
            zoom: 2.0,
            save_interval_secs: 60,
            poll_interval_ms: 300,
            deposit_intensity: 0.001,
            max_bounces: 1000,
            threads: None,
            seed: None,
            paths_per_worker: None,
            time_limit_secs: None,
            output_dir: PathBuf::from("."),
            output_prefix: "prism".to_string(),
        }
    }
}

impl RenderConfig {
    /// Load a configuration from a YAML file. Missing fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: RenderConfig = serde_yaml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Reject values the renderer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Validation(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }

        let positive = [
            ("prism_width", self.prism_width),
            ("prism_height", self.prism_height),
            ("min_hit_distance", self.min_hit_distance),
            ("gamma", self.gamma),
            ("zoom", self.zoom),
            ("deposit_intensity", self.deposit_intensity),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        if self.threads == Some(0) {
            return Err(ConfigError::Validation("threads must be at least 1".to_string()));
        }
        if self.max_bounces == 0 {
            return Err(ConfigError::Validation("max_bounces must be at least 1".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Validation("poll_interval_ms must be at least 1".to_string()));
        }
        if self.output_prefix.is_empty() {
            return Err(ConfigError::Validation("output_prefix must not be empty".to_string()));
        }

        Ok(())
    }

    /// Number of worker threads to start.
    pub fn worker_count(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Time between numbered snapshots; zero disables them.
    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.save_interval_secs)
    }

    /// Time between coordinator wake-ups.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Wall-clock limit of the render, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs.map(Duration::from_secs)
    }

    /// Path of the numbered snapshot `counter`, e.g. `prism-007.png`.
    pub fn snapshot_path(&self, counter: u32) -> PathBuf {
        self.output_dir
            .join(format!("{}-{:03}.png", self.output_prefix, counter))
    }

    /// Path of the image written when the render ends.
    pub fn final_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.png", self.output_prefix))
    }
}

/// Reasons a configuration cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file does not exist.
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// The file exists but could not be read.
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid YAML for a [`RenderConfig`].
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A value is out of range.
    #[error("Configuration validation error: {0}")]
    Validation(String),
}
