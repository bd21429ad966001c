//! # Frame Coordinator
//!
//! Owns the worker threads of a render. It starts one [`PathTracer`] per worker,
//! each with its own seed and accumulation buffer, then wakes up on a fixed poll
//! interval to refresh the optional display, write numbered snapshots and watch
//! for a stop request. When the render ends every worker is joined before the
//! final merge and export.
//!
//! Stopping is cooperative: a [`CancellationToken`] is shared with all workers,
//! which check it between light paths.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};

use crate::buffer::AccumulationBuffer;
use crate::config::{ConfigError, RenderConfig};
use crate::output::{Display, DisplayStatus, ExportError, Frame, ImageExporter};
use crate::random::SeedSequence;
use crate::scene::Scene;
use crate::tonemap::MergedImage;
use crate::tracer::{PathTracer, TraceStats};

/// Shared stop request. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token nobody has cancelled yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder of this token to stop. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested through any clone.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Reasons a render could not be started.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The configuration failed validation.
    #[error("Invalid render configuration: {0}")]
    Config(#[from] ConfigError),

    /// The OS refused to start a worker thread.
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Outcome of a finished render.
#[derive(Debug)]
pub struct RenderSummary {
    /// Statistics summed over all workers that exited normally.
    pub stats: TraceStats,
    /// Number of worker threads started.
    pub workers: usize,
    /// Workers that panicked. Their buffers are still part of `image`.
    pub failed_workers: usize,
    /// Numbered snapshots written successfully during the render.
    pub snapshots: u32,
    /// Wall-clock time from start to the final export.
    pub elapsed: Duration,
    /// Merged linear radiance of all workers.
    pub image: MergedImage,
    /// Where the final frame was written, `None` if the export failed.
    pub final_image: Option<PathBuf>,
}

impl RenderSummary {
    /// Average path throughput over the whole render.
    pub fn paths_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.stats.paths as f64 / secs
        } else {
            0.0
        }
    }
}

struct Worker {
    id: usize,
    buffer: Arc<AccumulationBuffer>,
    progress: Arc<AtomicU64>,
    handle: JoinHandle<TraceStats>,
}

/// Decrements the active-worker count when a worker thread exits, panics included.
struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Runs and supervises the worker threads of one render.
pub struct FrameCoordinator {
    config: RenderConfig,
    cancel: CancellationToken,
    active: Arc<AtomicUsize>,
    workers: Vec<Worker>,
    started: Instant,
    /// Snapshot numbers handed out, failed exports included.
    snapshot_counter: u32,
    snapshots: u32,
}

impl FrameCoordinator {
    /// Validate `config` and start its workers.
    ///
    /// Worker seeds are drawn in worker order from one sequence, so a fixed
    /// `config.seed` fixes every worker's path sequence. If a thread cannot be
    /// spawned the workers already running are stopped and joined.
    pub fn start(config: RenderConfig, cancel: CancellationToken) -> Result<Self, RenderError> {
        config.validate()?;

        let worker_count = config.worker_count();
        info!("Image resolution: {}x{}", config.width, config.height);
        info!("Using {} threads", worker_count);

        let scene = Arc::new(Scene::new(&config));
        let mut seeds = SeedSequence::new(config.seed);

        let mut coordinator = Self {
            config,
            cancel,
            active: Arc::new(AtomicUsize::new(0)),
            workers: Vec::with_capacity(worker_count),
            started: Instant::now(),
            snapshot_counter: 0,
            snapshots: 0,
        };

        for id in 0..worker_count {
            let seed = seeds.next_seed();
            coordinator.spawn_worker(id, seed, &scene)?;
        }

        Ok(coordinator)
    }

    fn spawn_worker(&mut self, id: usize, seed: u64, scene: &Arc<Scene>) -> Result<(), RenderError> {
        let (buffer, mut writer) = AccumulationBuffer::new(self.config.width, self.config.height);
        let progress = Arc::new(AtomicU64::new(0));

        let scene = Arc::clone(scene);
        let cancel = self.cancel.clone();
        let thread_progress = Arc::clone(&progress);
        let max_paths = self.config.paths_per_worker;

        self.active.fetch_add(1, Ordering::AcqRel);
        let guard = ActiveGuard(Arc::clone(&self.active));

        let handle = thread::Builder::new()
            .name(format!("prism-worker-{id}"))
            .spawn(move || {
                let _guard = guard;
                debug!("Worker {} started (seed {:#018x})", id, seed);

                let mut tracer = PathTracer::new(&scene, seed);
                let stats = tracer.run(&mut writer, &cancel, max_paths, Some(&thread_progress));

                debug!(
                    "Worker {} exited: {} paths, {} deposited, {} off image, {} escaped, {} bounce-limited",
                    id, stats.paths, stats.deposited, stats.off_image, stats.escaped, stats.bounce_limited
                );
                stats
            })?;

        self.workers.push(Worker {
            id,
            buffer,
            progress,
            handle,
        });
        Ok(())
    }

    /// Workers whose thread has not exited yet.
    pub fn active_workers(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Paths traced so far over all workers.
    pub fn paths_traced(&self) -> u64 {
        self.workers
            .iter()
            .map(|w| w.progress.load(Ordering::Relaxed))
            .sum()
    }

    /// Sum of all worker buffers as they are right now.
    ///
    /// While workers run, the result may mix older and newer deposits.
    pub fn merged(&self) -> MergedImage {
        let buffers: Vec<_> = self.workers.iter().map(|w| Arc::clone(&w.buffer)).collect();
        MergedImage::merge(&buffers)
    }

    /// Tone-mapped view of the render in progress.
    pub fn preview(&self) -> Frame {
        self.merged().tone_map(self.config.gamma)
    }

    /// Write the next numbered snapshot and return its path.
    ///
    /// A failed export still uses up its number, so later snapshots never
    /// overwrite an earlier file.
    pub fn save_snapshot(&mut self, exporter: &mut dyn ImageExporter) -> Result<PathBuf, ExportError> {
        self.snapshot_counter += 1;
        let path = self.config.snapshot_path(self.snapshot_counter);
        info!("Saving to {}", path.display());
        exporter.export(&self.preview(), &path)?;
        self.snapshots += 1;
        Ok(path)
    }

    /// Supervise the render until it is stopped, then finish it.
    ///
    /// The render stops when the cancellation token is triggered, the display is
    /// closed, the time limit passes or every worker has reached its path limit.
    pub fn run(
        mut self,
        exporter: &mut dyn ImageExporter,
        mut display: Option<&mut dyn Display>,
    ) -> RenderSummary {
        let spinner = progress_spinner();
        let save_interval = self.config.save_interval();
        let mut last_save = Instant::now();

        loop {
            if self.cancel.is_cancelled() {
                info!("Stop requested");
                break;
            }
            if self.active_workers() == 0 {
                debug!("All workers reached their path limit");
                break;
            }
            if let Some(limit) = self.config.time_limit() {
                if self.started.elapsed() >= limit {
                    info!("Time limit of {}s reached", limit.as_secs());
                    break;
                }
            }

            thread::sleep(self.config.poll_interval());
            spinner.set_message(format!("{} paths traced", self.paths_traced()));

            if let Some(display) = display.as_deref_mut() {
                if display.show(&self.preview()) == DisplayStatus::Closed {
                    info!("Display closed");
                    break;
                }
            }

            if !save_interval.is_zero() && last_save.elapsed() >= save_interval {
                if let Err(e) = self.save_snapshot(exporter) {
                    warn!("Snapshot export failed: {}", e);
                }
                last_save = Instant::now();
            }
        }

        spinner.finish_and_clear();
        self.finish(exporter)
    }

    /// Stop all workers, wait for them, and export the final merged frame.
    ///
    /// A failed export is logged and reported through
    /// [`RenderSummary::final_image`]; the merged image is returned either way.
    pub fn finish(mut self, exporter: &mut dyn ImageExporter) -> RenderSummary {
        self.cancel.cancel();

        let buffers: Vec<_> = self.workers.iter().map(|w| Arc::clone(&w.buffer)).collect();
        let workers = buffers.len();
        let mut stats = TraceStats::default();
        let mut failed_workers = 0;

        for worker in self.workers.drain(..) {
            match worker.handle.join() {
                Ok(worker_stats) => stats = stats.merge(&worker_stats),
                Err(_) => {
                    error!("Worker {} panicked; keeping its partial buffer", worker.id);
                    failed_workers += 1;
                }
            }
        }

        let image = MergedImage::merge(&buffers);
        let path = self.config.final_path();
        info!("Saving to {}", path.display());
        let final_image = match exporter.export(&image.tone_map(self.config.gamma), &path) {
            Ok(()) => Some(path),
            Err(e) => {
                error!("Failed to save {}: {}", path.display(), e);
                None
            }
        };

        RenderSummary {
            stats,
            workers,
            failed_workers,
            snapshots: self.snapshots,
            elapsed: self.started.elapsed(),
            image,
            final_image,
        }
    }
}

impl Drop for FrameCoordinator {
    fn drop(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.cancel.cancel();
        for worker in self.workers.drain(..) {
            if worker.handle.join().is_err() {
                error!("Worker {} panicked during shutdown", worker.id);
            }
        }
    }
}

fn progress_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[derive(Default)]
    struct RecordingExporter {
        saved: Vec<(PathBuf, Frame)>,
    }

    impl ImageExporter for RecordingExporter {
        fn export(&mut self, frame: &Frame, path: &Path) -> Result<(), ExportError> {
            self.saved.push((path.to_path_buf(), frame.clone()));
            Ok(())
        }
    }

    struct FailingExporter;

    impl ImageExporter for FailingExporter {
        fn export(&mut self, frame: &Frame, _path: &Path) -> Result<(), ExportError> {
            Err(ExportError::BufferSize {
                expected: frame.expected_len(),
                actual: 0,
            })
        }
    }

    /// Fails its first export, then records like [`RecordingExporter`].
    #[derive(Default)]
    struct FlakyExporter {
        calls: usize,
        saved: Vec<PathBuf>,
    }

    impl ImageExporter for FlakyExporter {
        fn export(&mut self, frame: &Frame, path: &Path) -> Result<(), ExportError> {
            self.calls += 1;
            if self.calls == 1 {
                return Err(ExportError::BufferSize {
                    expected: frame.expected_len(),
                    actual: 0,
                });
            }
            self.saved.push(path.to_path_buf());
            Ok(())
        }
    }

    struct ClosingDisplay {
        shown: usize,
    }

    impl Display for ClosingDisplay {
        fn show(&mut self, frame: &Frame) -> DisplayStatus {
            assert_eq!(frame.pixels.len(), frame.expected_len());
            self.shown += 1;
            DisplayStatus::Closed
        }
    }

    fn small_config() -> RenderConfig {
        RenderConfig {
            width: 66,
            height: 84,
            threads: Some(2),
            seed: Some(7),
            paths_per_worker: Some(2_000),
            poll_interval_ms: 1,
            output_dir: PathBuf::from("renders"),
            output_prefix: "test".to_string(),
            ..RenderConfig::default()
        }
    }

    #[test]
    fn cancellation_token_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = RenderConfig {
            threads: Some(0),
            ..small_config()
        };
        let result = FrameCoordinator::start(config, CancellationToken::new());
        assert!(matches!(result, Err(RenderError::Config(_))));
    }

    #[test]
    fn run_stops_when_workers_reach_their_limit() {
        let coordinator = FrameCoordinator::start(small_config(), CancellationToken::new()).unwrap();
        let mut exporter = RecordingExporter::default();
        let summary = coordinator.run(&mut exporter, None);

        assert_eq!(summary.workers, 2);
        assert_eq!(summary.failed_workers, 0);
        assert_eq!(summary.stats.paths, 4_000);
        assert!(summary.stats.deposited > 0);
        assert_eq!(summary.final_image, Some(PathBuf::from("renders/test.png")));

        let (path, frame) = exporter.saved.last().unwrap();
        assert_eq!(path, &PathBuf::from("renders/test.png"));
        assert_eq!((frame.width, frame.height, frame.channels), (66, 84, 3));
        assert!(frame.pixels.iter().any(|&b| b > 0));
        assert_eq!(summary.image.pixels.len(), 66 * 84);
    }

    #[test]
    fn failed_export_is_not_fatal() {
        let coordinator = FrameCoordinator::start(small_config(), CancellationToken::new()).unwrap();
        let summary = coordinator.run(&mut FailingExporter, None);
        assert_eq!(summary.final_image, None);
        assert_eq!(summary.stats.paths, 4_000);
    }

    #[test]
    fn closing_the_display_stops_the_render() {
        let config = RenderConfig {
            paths_per_worker: None,
            ..small_config()
        };
        let cancel = CancellationToken::new();
        let coordinator = FrameCoordinator::start(config, cancel.clone()).unwrap();
        let mut display = ClosingDisplay { shown: 0 };
        let mut exporter = RecordingExporter::default();

        let summary = coordinator.run(&mut exporter, Some(&mut display));

        assert_eq!(display.shown, 1);
        assert!(cancel.is_cancelled());
        assert!(summary.final_image.is_some());
        assert_eq!(exporter.saved.len(), 1);
    }

    #[test]
    fn time_limit_stops_the_render() {
        let config = RenderConfig {
            paths_per_worker: None,
            time_limit_secs: Some(0),
            ..small_config()
        };
        let coordinator = FrameCoordinator::start(config, CancellationToken::new()).unwrap();
        let summary = coordinator.run(&mut RecordingExporter::default(), None);
        assert_eq!(summary.workers, 2);
        assert!(summary.final_image.is_some());
    }

    #[test]
    fn external_cancel_stops_the_render() {
        let config = RenderConfig {
            paths_per_worker: None,
            ..small_config()
        };
        let cancel = CancellationToken::new();
        let coordinator = FrameCoordinator::start(config, cancel.clone()).unwrap();
        cancel.cancel();
        let summary = coordinator.run(&mut RecordingExporter::default(), None);
        assert_eq!(summary.failed_workers, 0);
    }

    #[test]
    fn snapshots_are_numbered() {
        let config = RenderConfig {
            paths_per_worker: Some(100),
            ..small_config()
        };
        let mut coordinator = FrameCoordinator::start(config, CancellationToken::new()).unwrap();
        let mut exporter = RecordingExporter::default();

        let first = coordinator.save_snapshot(&mut exporter).unwrap();
        let second = coordinator.save_snapshot(&mut exporter).unwrap();
        assert_eq!(first, PathBuf::from("renders/test-001.png"));
        assert_eq!(second, PathBuf::from("renders/test-002.png"));

        let summary = coordinator.finish(&mut exporter);
        assert_eq!(summary.snapshots, 2);
        assert_eq!(exporter.saved.len(), 3);
    }

    #[test]
    fn failed_snapshot_is_not_counted() {
        let mut coordinator = FrameCoordinator::start(small_config(), CancellationToken::new()).unwrap();
        assert!(coordinator.save_snapshot(&mut FailingExporter).is_err());

        let mut exporter = RecordingExporter::default();
        let next = coordinator.save_snapshot(&mut exporter).unwrap();
        assert_eq!(next, PathBuf::from("renders/test-002.png"));

        let summary = coordinator.finish(&mut exporter);
        assert_eq!(summary.snapshots, 1);
    }

    #[test]
    fn periodic_snapshots_survive_a_failed_export() {
        let config = RenderConfig {
            paths_per_worker: None,
            save_interval_secs: 1,
            time_limit_secs: Some(3),
            poll_interval_ms: 5,
            ..small_config()
        };
        let coordinator = FrameCoordinator::start(config, CancellationToken::new()).unwrap();
        let mut exporter = FlakyExporter::default();

        let summary = coordinator.run(&mut exporter, None);

        // First snapshot fails, at least one more lands, then the final image.
        assert!(exporter.calls >= 3);
        assert_eq!(exporter.saved.len(), exporter.calls - 1);
        assert_eq!(exporter.saved[0], PathBuf::from("renders/test-002.png"));
        assert_eq!(exporter.saved.last(), Some(&PathBuf::from("renders/test.png")));
        assert_eq!(summary.snapshots as usize, exporter.saved.len() - 1);
        assert_eq!(summary.final_image, Some(PathBuf::from("renders/test.png")));
        assert!(summary.stats.paths > 0);
    }

    #[test]
    fn dropping_the_coordinator_stops_workers() {
        let config = RenderConfig {
            paths_per_worker: None,
            ..small_config()
        };
        let cancel = CancellationToken::new();
        let coordinator = FrameCoordinator::start(config, cancel.clone()).unwrap();
        assert_eq!(coordinator.workers.len(), 2);
        drop(coordinator);
        assert!(cancel.is_cancelled());
    }
}
