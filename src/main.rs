use clap::Parser;
use log::{error, info, warn};

mod cli;
mod logger;

use cli::Args;
use logger::init_logger;
use prismatic::config::RenderConfig;
use prismatic::coordinator::{CancellationToken, FrameCoordinator, RenderSummary};
use prismatic::output::{save_merged_as_exr, Display, PngExporter};

/// Load the configuration file if one was given and apply the command line on top.
fn load_config(args: &Args) -> RenderConfig {
    let mut config = match &args.config {
        Some(path) => match RenderConfig::from_file(path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        },
        None => RenderConfig::default(),
    };
    args.apply(&mut config);
    config
}

#[cfg(feature = "window")]
fn open_display(config: &RenderConfig) -> Option<Box<dyn Display>> {
    match prismatic::display::MinifbDisplay::new("prismatic", config.width, config.height) {
        Ok(display) => Some(Box::new(display)),
        Err(e) => {
            warn!("Could not open preview window: {}, rendering headless", e);
            None
        }
    }
}

#[cfg(not(feature = "window"))]
fn open_display(_config: &RenderConfig) -> Option<Box<dyn Display>> {
    warn!("Built without the `window` feature, rendering headless");
    None
}

fn log_summary(summary: &RenderSummary) {
    let stats = &summary.stats;
    info!(
        "Traced {} paths in {:.1}s ({:.0} paths/s) on {} workers",
        stats.paths,
        summary.elapsed.as_secs_f32(),
        summary.paths_per_second(),
        summary.workers
    );
    info!(
        "Deposited {}, off image {}, escaped {}, bounce-limited {}, {} prism bounces",
        stats.deposited, stats.off_image, stats.escaped, stats.bounce_limited, stats.bounces
    );
    if summary.failed_workers > 0 {
        warn!("{} workers panicked", summary.failed_workers);
    }
    info!("{} snapshots written", summary.snapshots);
}

fn main() {
    let args = Args::parse();

    init_logger(args.debug_level.clone().into());

    // Log application startup with version information
    info!("Prismatic - Git Version {} ({})", env!("GIT_HASH"), env!("GIT_DATE"));

    let config = load_config(&args);

    let mut display = if args.window { open_display(&config) } else { None };

    let coordinator = match FrameCoordinator::start(config, CancellationToken::new()) {
        Ok(coordinator) => coordinator,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let display: Option<&mut dyn Display> = match display.as_mut() {
        Some(display) => Some(display.as_mut()),
        None => None,
    };

    let mut exporter = PngExporter;
    let summary = coordinator.run(&mut exporter, display);
    log_summary(&summary);

    if let Some(path) = &args.hdr_output {
        if let Err(e) = save_merged_as_exr(&summary.image, path) {
            error!("Failed to save HDR image {}: {}", path.display(), e);
        }
    }

    if summary.final_image.is_none() {
        std::process::exit(1);
    }
}
