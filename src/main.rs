//! Trajectory replay CLI - Play a timeline file to the terminal.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use trajectory_replay::{
    playback::{
        CancelToken, DisplayCategory, Frame, PaceControl, PaceProvider, PlaybackEngine,
        PlaybackOutcome, PresentationSurface, Viewport,
    },
    schema::PlaybackConfig,
    trajectory::TrajectoryReader,
};

/// Prints progress lines instead of drawing.
struct TerminalSurface {
    viewport: Viewport,
    marker_size: u32,
    pace: PaceControl,
    cycle_count: u64,
    report_every: u64,
    started: Instant,
    last_frame: Option<Frame>,
}

impl TerminalSurface {
    fn new(config: &PlaybackConfig) -> Self {
        Self {
            viewport: config.viewport,
            marker_size: config.marker_size,
            pace: PaceControl::new(config.initial_pace, config.max_pace),
            cycle_count: 0,
            report_every: 1,
            started: Instant::now(),
            last_frame: None,
        }
    }
}

impl PresentationSurface for TerminalSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn frame_delay(&self) -> Duration {
        self.pace.frame_delay()
    }

    fn begin(&mut self, cycle_count: u64, body_count: usize) {
        self.cycle_count = cycle_count;
        self.report_every = (cycle_count / 10).max(1);
        self.started = Instant::now();

        println!("Bodies: {}", body_count);
        println!("Cycles: {}", cycle_count);
        println!(
            "Viewport: {}x{}, pace {}/{} ({} ms/frame)",
            self.viewport.width,
            self.viewport.height,
            self.pace.pace(),
            self.pace.max_pace(),
            self.pace.frame_delay().as_millis()
        );
        println!("Markers: {}px squares", self.marker_size);
        for category in DisplayCategory::ALL {
            let [r, g, b] = category.rgb();
            println!("  {:?}: #{:02x}{:02x}{:02x}", category, r, g, b);
        }
        println!();
    }

    fn present(&mut self, frame: Frame) {
        if (frame.cycle_index + 1) % self.report_every == 0 {
            let [heavy, medium, light] = frame.category_counts();
            println!(
                "  Cycle {}/{}: visible={} ({:?}={}, {:?}={}, {:?}={}), absent={}, mass={}",
                frame.cycle_index,
                self.cycle_count,
                frame.visible_count,
                DisplayCategory::Heavy,
                heavy,
                DisplayCategory::Medium,
                medium,
                DisplayCategory::Light,
                light,
                frame.stats.absent,
                frame.stats.total_mass
            );
        }
        self.last_frame = Some(frame);
    }

    fn finish(&mut self, outcome: &PlaybackOutcome) {
        let elapsed = self.started.elapsed();
        println!();
        println!("Playback {:?}", outcome.state);
        println!(
            "  Frames: {}/{} in {:.2}s",
            outcome.frames,
            self.cycle_count,
            elapsed.as_secs_f32()
        );
        if let Some(frame) = &self.last_frame {
            println!("  Visible in last frame: {}", frame.visible_count);
            println!("  Total mass: {}", frame.stats.total_mass);
            if let Some(heaviest) = frame.stats.heaviest {
                println!("  Heaviest body: {}", heaviest);
            }
        }
        if let Some(error) = &outcome.error {
            println!("  Error: {}", error);
        }
    }
}

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    if args.len() < 2 {
        eprintln!("Usage: {} <timeline.dat> [config.json]", args[0]);
        eprintln!();
        eprintln!("Play back a precomputed N-body timeline.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  timeline.dat  Path to the timeline file");
        eprintln!("  config.json   Playback configuration (default: built-in)");
        eprintln!();
        eprintln!("Example configuration is printed with --example flag.");
        std::process::exit(1);
    }

    let timeline_path = PathBuf::from(&args[1]);

    let config: PlaybackConfig = match args.get(2) {
        Some(path) => {
            let config_str = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading config file: {}", e);
                std::process::exit(1);
            });
            serde_json::from_str(&config_str).unwrap_or_else(|e| {
                eprintln!("Error parsing config: {}", e);
                std::process::exit(1);
            })
        }
        None => PlaybackConfig::default(),
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    }

    let reader = TrajectoryReader::open(&timeline_path).unwrap_or_else(|e| {
        eprintln!("Error opening timeline: {}", e);
        std::process::exit(1);
    });

    println!("Trajectory Replay");
    println!("=================");
    println!("Timeline: {}", timeline_path.display());

    let engine = PlaybackEngine::new(&config);
    let mut surface = TerminalSurface::new(&config);
    let outcome = engine.play(reader, &mut surface, CancelToken::new());

    if outcome.error.is_some() {
        std::process::exit(2);
    }
}

fn print_example_config() {
    let config = PlaybackConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
