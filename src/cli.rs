use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

use prismatic::config::RenderConfig;

/// Custom enum for log levels that can be used with clap's ValueEnum
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convert our custom LogLevel enum to log crate's LevelFilter
impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Command line arguments structure using clap derive macros
#[derive(Parser, Debug)]
#[command(name = "prismatic")]
#[command(about = "Spectral light transport through a glass prism")]
pub struct Args {
    /// YAML configuration file; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Set the logging level (defaults to "info")
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub debug_level: LogLevel,

    /// Image width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Zoom factor around the image center
    #[arg(long)]
    pub zoom: Option<f32>,

    /// Number of worker threads (defaults to all hardware threads)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Seed for reproducible renders
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop each worker after this many light paths
    #[arg(long = "paths")]
    pub paths_per_worker: Option<u64>,

    /// Stop the render after this many seconds
    #[arg(long = "duration")]
    pub time_limit_secs: Option<u64>,

    /// Seconds between numbered snapshots (0 disables them)
    #[arg(long = "save-interval")]
    pub save_interval_secs: Option<u64>,

    /// Directory images are written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// File name prefix of written images
    #[arg(short = 'p', long)]
    pub output_prefix: Option<String>,

    /// Also write the final linear radiance as OpenEXR to this path
    #[arg(long)]
    pub hdr_output: Option<PathBuf>,

    /// Show a live preview window (needs the `window` feature)
    #[arg(short, long)]
    pub window: bool,
}

impl Args {
    /// Overwrite the fields of `config` that were given on the command line.
    pub fn apply(&self, config: &mut RenderConfig) {
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(zoom) = self.zoom {
            config.zoom = zoom;
        }
        if let Some(threads) = self.threads {
            config.threads = Some(threads);
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(paths) = self.paths_per_worker {
            config.paths_per_worker = Some(paths);
        }
        if let Some(secs) = self.time_limit_secs {
            config.time_limit_secs = Some(secs);
        }
        if let Some(secs) = self.save_interval_secs {
            config.save_interval_secs = secs;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(prefix) = &self.output_prefix {
            config.output_prefix = prefix.clone();
        }
    }
}
