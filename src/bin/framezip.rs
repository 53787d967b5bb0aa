use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framezip::{
    ArchiveCompression, BatchOrchestrator, BatchOutcome, BatchReport, CancelPolicy,
    DirectorySink, ExtractionSettings, FfmpegLogLevel, FramezipError, ImageFormat, ItemStatus,
    ProgressInfo, ProgressReporter, QueueItem, SourceVideo,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framezip frames talk.mp4 demo.mkv --out frames --every 5\n  framezip thumbnails *.mp4 --out thumbs --at 0:10 --format jpeg --quality 0.8\n  framezip probe talk.mp4 --json\n  framezip completions zsh > _framezip";

#[derive(Debug, Parser)]
#[command(
    name = "framezip",
    version,
    about = "Extract still frames from videos and pack them into ZIP archives",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing archives.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print the batch summary as JSON.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sample frames at a fixed interval, one archive per video.
    #[command(
        about = "Extract frames at an interval",
        after_help = "Examples:\n  framezip frames input.mp4 --out frames --every 2\n  framezip frames a.mp4 b.mp4 --out frames --every 0:30 --format jpeg --keep-partial"
    )]
    Frames {
        /// Input video files, processed in order.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output directory for archives.
        #[arg(long)]
        out: PathBuf,
        /// Sampling interval (seconds, mm:ss or hh:mm:ss).
        #[arg(long, default_value = "1")]
        every: String,
        #[command(flatten)]
        image: ImageOptions,
        /// Deliver the frames captured so far when cancelled with Ctrl-C.
        #[arg(long)]
        keep_partial: bool,
    },

    /// One frame per video, all collected into a single archive.
    #[command(
        about = "Extract one thumbnail per video",
        after_help = "Examples:\n  framezip thumbnails a.mp4 b.mp4 --out thumbs --at 10"
    )]
    Thumbnails {
        /// Input video files, processed in order.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output directory for the archive.
        #[arg(long)]
        out: PathBuf,
        /// Snapshot time; videos shorter than this use their midpoint.
        #[arg(long, default_value = "0")]
        at: String,
        #[command(flatten)]
        image: ImageOptions,
    },

    /// Print the resolved properties of a video.
    #[command(about = "Print video properties", visible_alias = "info")]
    Probe {
        /// Input video file.
        input: PathBuf,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Parser, Clone)]
struct ImageOptions {
    /// Image format of archive entries (png, jpeg).
    #[arg(long, default_value = "png")]
    format: String,
    /// JPEG quality between 0 and 1.
    #[arg(long, default_value_t = framezip::DEFAULT_JPEG_QUALITY)]
    quality: f64,
    /// Store entries without compression.
    #[arg(long)]
    store: bool,
}

impl ImageOptions {
    fn apply(
        &self,
        settings: ExtractionSettings,
    ) -> Result<ExtractionSettings, Box<dyn std::error::Error>> {
        let format = parse_image_format(&self.format)
            .ok_or_else(|| format!("unsupported --format: {}", self.format))?;
        let compression = if self.store {
            ArchiveCompression::Stored
        } else {
            ArchiveCompression::Deflated
        };
        Ok(settings
            .with_image_format(format)
            .with_quality(self.quality)
            .with_compression(compression))
    }
}

fn parse_image_format(value: &str) -> Option<ImageFormat> {
    match value.to_ascii_lowercase().as_str() {
        "png" => Some(ImageFormat::Png),
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        _ => None,
    }
}

/// Parse seconds (`"75"`, `"2.5"`), `mm:ss` or `hh:mm:ss` into seconds.
fn parse_timecode(value: &str) -> Result<f64, Box<dyn std::error::Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("time value cannot be empty".into());
    }

    if let Ok(seconds) = trimmed.parse::<f64>() {
        return Ok(seconds);
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [minutes, seconds] => (0, minutes.parse::<u64>()?, seconds.parse::<f64>()?),
        [hours, minutes, seconds] => (
            hours.parse::<u64>()?,
            minutes.parse::<u64>()?,
            seconds.parse::<f64>()?,
        ),
        _ => return Err(format!("invalid time format: {trimmed}").into()),
    };

    Ok(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

/// Describe an input, keeping unreadable paths in the queue so they are
/// reported as failed items instead of aborting the batch.
fn source_for(path: &Path) -> SourceVideo {
    SourceVideo::from_path(path).unwrap_or_else(|error| {
        log::debug!("Cannot stat {}: {error}", path.display());
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        SourceVideo::new(name, 0, path)
    })
}

struct TerminalReporter {
    bar: Option<ProgressBar>,
}

impl TerminalReporter {
    fn new(show_bar: bool) -> Self {
        let bar = show_bar.then(|| {
            let bar = ProgressBar::new(100);
            if let Ok(style) =
                ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg} [{elapsed_precise}]")
            {
                bar.set_style(style);
            }
            bar
        });
        Self { bar }
    }

    fn print(&self, line: String) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }

    fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl ProgressReporter for TerminalReporter {
    fn on_status(&self, index: usize, item: &QueueItem) {
        let name = &item.source.name;
        let line = match item.status() {
            ItemStatus::Pending => return,
            ItemStatus::Processing => format!("{} #{index} {name}", "processing".cyan().bold()),
            ItemStatus::Done => format!("{} #{index} {name}", "done".green().bold()),
            ItemStatus::Error => format!(
                "{} #{index} {name}: {}",
                "error".red().bold(),
                item.error().unwrap_or("unknown error")
            ),
        };
        self.print(line);
    }

    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(bar) = &self.bar {
            bar.set_position(info.percentage.round() as u64);
            let current = (info.item_index + 1).min(info.total_items);
            bar.set_message(format!(
                "file {current}/{} frame {}/{}",
                info.total_items, info.frames_done, info.frames_total
            ));
        }
    }

    fn on_batch_error(&self, error: &FramezipError) {
        self.print(format!("{} {error}", "error:".red().bold()));
    }
}

fn init_logging(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Some(level) = &global.log_level {
        framezip::set_ffmpeg_log_level(level.parse::<FfmpegLogLevel>()?);
    } else if !global.verbose {
        framezip::set_ffmpeg_log_level(FfmpegLogLevel::Error);
    }
    Ok(())
}

fn run_batch(
    global: &GlobalOptions,
    inputs: &[PathBuf],
    out: &Path,
    settings: &ExtractionSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    let files: Vec<SourceVideo> = inputs.iter().map(|path| source_for(path)).collect();
    let sink = DirectorySink::new(out).with_overwrite(global.overwrite);
    let reporter = TerminalReporter::new(global.progress);

    let orchestrator = BatchOrchestrator::new();
    let token = orchestrator.cancellation_token();
    ctrlc::set_handler(move || {
        eprintln!("\n{}", "interrupt received, stopping after the current step".yellow());
        token.cancel();
    })?;

    let report = orchestrator.start_batch(files, settings, &sink, &reporter)?;
    reporter.finish();

    print_report(&report, out, global.json)?;

    let failed = report.count(ItemStatus::Error);
    if report.outcome == BatchOutcome::Cancelled {
        return Err("batch cancelled".into());
    }
    if let Some(error) = report.batch_error {
        return Err(error.into());
    }
    if failed > 0 {
        return Err(format!("{failed} of {} file(s) failed", report.items.len()).into());
    }
    Ok(())
}

fn print_report(
    report: &BatchReport,
    out: &Path,
    as_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if as_json {
        let payload = json!({
            "outcome": format!("{:?}", report.outcome),
            "items": report.items.iter().map(|item| json!({
                "name": item.source.name,
                "status": item.status().to_string(),
                "error": item.error(),
            })).collect::<Vec<_>>(),
            "delivered": report.delivered.iter()
                .map(|name| out.join(name).display().to_string())
                .collect::<Vec<_>>(),
            "batch_error": report.batch_error,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    for name in &report.delivered {
        println!("{} {}", "wrote".green().bold(), out.join(name).display());
    }
    println!(
        "{} done, {} failed, {} pending",
        report.count(ItemStatus::Done),
        report.count(ItemStatus::Error),
        report.count(ItemStatus::Pending),
    );
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global)?;

    match cli.command {
        Commands::Frames {
            inputs,
            out,
            every,
            image,
            keep_partial,
        } => {
            let policy = if keep_partial {
                CancelPolicy::DeliverPartial
            } else {
                CancelPolicy::DiscardPartial
            };
            let settings = image
                .apply(ExtractionSettings::interval(parse_timecode(&every)?))?
                .with_cancel_policy(policy);
            run_batch(&cli.global, &inputs, &out, &settings)?;
        }
        Commands::Thumbnails {
            inputs,
            out,
            at,
            image,
        } => {
            let settings = image.apply(ExtractionSettings::single_frame(parse_timecode(&at)?))?;
            run_batch(&cli.global, &inputs, &out, &settings)?;
        }
        Commands::Probe { input } => {
            let properties = framezip::probe(&input)?;
            if cli.global.json {
                let payload = json!({
                    "width": properties.width,
                    "height": properties.height,
                    "duration_seconds": properties.duration,
                    "fps": properties.frames_per_second,
                    "codec": properties.codec,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("File: {}", input.display());
                println!("Resolution: {}x{}", properties.width, properties.height);
                println!("Duration: {:.2}s", properties.duration);
                println!("FPS: {:.3}", properties.frames_per_second);
                println!("Codec: {}", properties.codec);
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framezip", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
