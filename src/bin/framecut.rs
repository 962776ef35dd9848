use std::{fs, io::Read, path::PathBuf, sync::Arc};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use framecut::{
    DirectorySink, EngineOptions, ExtractionJob, ExtractionPipeline, FfmpegEngine, FfmpegLogLevel,
    FrameFormat, JobStatus, LogStatus, MediaEngine, MemoryEngine, MemorySink, PipelineOptions,
    ProbeResult, ProgressCallback, ProgressInfo, SourceMedia, format_clock, validate_job,
    validate_source,
};

const CLI_AFTER_HELP: &str = "Examples:\n  framecut probe input.mp4 --json\n  framecut frame input.mp4 --at 00:09.95 --format png\n  framecut cut input.mp4 --start 2 --end 5 --reverse --out clips\n  framecut frames input.mp4 --start 0 --end 9 --count 10 --progress\n  framecut completions zsh > _framecut";

/// File name used for URL inputs whose path has no last segment.
const DEFAULT_URL_FILE_NAME: &str = "video.mp4";

#[derive(Debug, Parser)]
#[command(
    name = "framecut",
    version,
    about = "Cut frames, frame sequences, and clips out of videos",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar for frame sequences.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Still image format for extracted frames (webp, png, jpg).
    #[arg(long, global = true)]
    format: Option<String>,

    /// Still image quality passed as -q:v (lower is better).
    #[arg(long, global = true)]
    quality: Option<u8>,

    /// Print the engine commands instead of running FFmpeg.
    #[arg(long, global = true)]
    dry_run: bool,

    /// Output directory for artifacts.
    #[arg(long, global = true, default_value = ".")]
    out: PathBuf,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print media metadata.
    #[command(
        about = "Print media metadata",
        visible_alias = "info",
        after_help = "Examples:\n  framecut probe input.mp4\n  framecut probe input.mp4 --flat"
    )]
    Probe {
        /// Input media path or URL.
        input: String,
        /// Print the engine's JSON document.
        #[arg(long)]
        json: bool,
        /// Print one `key: value` row per scalar.
        #[arg(long, conflicts_with = "json")]
        flat: bool,
    },

    /// Extract one still frame.
    #[command(
        about = "Extract a single frame",
        after_help = "Examples:\n  framecut frame input.mp4 --at 5\n  framecut frame input.mp4 --at 01:02.5 --format jpg"
    )]
    Frame {
        /// Input media path or URL.
        input: String,
        /// Timestamp (SS, MM:SS or HH:MM:SS).
        #[arg(long)]
        at: String,
    },

    /// Cut a clip out of the video.
    #[command(
        about = "Cut a clip",
        after_help = "Examples:\n  framecut cut input.mp4 --start 2 --end 5\n  framecut cut input.mp4 --start 00:10 --end 00:20 --reverse"
    )]
    Cut {
        /// Input media path or URL.
        input: String,
        /// Start time (SS, MM:SS or HH:MM:SS).
        #[arg(long)]
        start: String,
        /// End time (SS, MM:SS or HH:MM:SS).
        #[arg(long)]
        end: String,
        /// Reverse the clip.
        #[arg(long)]
        reverse: bool,
    },

    /// Extract evenly spaced frames into a zip archive.
    #[command(
        about = "Extract a frame sequence",
        after_help = "Examples:\n  framecut frames input.mp4 --start 0 --end 9 --count 10"
    )]
    Frames {
        /// Input media path or URL.
        input: String,
        /// First frame time (SS, MM:SS or HH:MM:SS).
        #[arg(long)]
        start: String,
        /// Last frame time (SS, MM:SS or HH:MM:SS).
        #[arg(long)]
        end: String,
        /// Number of frames, at least 2.
        #[arg(long, default_value_t = 10)]
        count: usize,
    },

    /// Check a source, or a cut of it, without extracting anything.
    #[command(
        about = "Validate media file",
        after_help = "Examples:\n  framecut validate input.mp4\n  framecut validate input.mp4 --start 2 --end 5"
    )]
    Validate {
        /// Input media path or URL.
        input: String,
        /// Optional start time.
        #[arg(long, requires = "end")]
        start: Option<String>,
        /// Optional end time.
        #[arg(long, requires = "start")]
        end: Option<String>,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_timecode(value: &str) -> Result<f64, Box<dyn std::error::Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("time value cannot be empty".into());
    }

    if let Ok(seconds) = trimmed.parse::<f64>() {
        return Ok(seconds.max(0.0));
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(format!("invalid time format: {trimmed}").into());
    }

    let (hours, minutes, seconds_str) = if parts.len() == 3 {
        (parts[0].parse::<u64>()?, parts[1].parse::<u64>()?, parts[2])
    } else {
        (0_u64, parts[0].parse::<u64>()?, parts[1])
    };

    let seconds = seconds_str.parse::<f64>()?;
    let total_seconds = (hours as f64 * 3600.0) + (minutes as f64 * 60.0) + seconds;
    Ok(total_seconds.max(0.0))
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Last path segment of a URL, ignoring query and fragment.
fn url_file_name(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let without_scheme = path.split_once("://").map_or(path, |(_, rest)| rest);
    match without_scheme.split_once('/') {
        Some((_, rest)) => rest
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or(DEFAULT_URL_FILE_NAME)
            .to_string(),
        None => DEFAULT_URL_FILE_NAME.to_string(),
    }
}

fn read_input(input: &str) -> Result<(String, Vec<u8>), Box<dyn std::error::Error>> {
    if is_url(input) {
        let response = ureq::get(input).call()?;
        let mut bytes = Vec::new();
        response.into_body().into_reader().read_to_end(&mut bytes)?;
        Ok((url_file_name(input), bytes))
    } else {
        let path = PathBuf::from(input);
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or(format!("not a file path: {input}"))?
            .to_string();
        Ok((name, fs::read(&path)?))
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn engine_options(global: &GlobalOptions) -> Result<EngineOptions, Box<dyn std::error::Error>> {
    let mut options = EngineOptions::new();
    if let Some(level) = &global.log_level {
        let parsed =
            FfmpegLogLevel::parse(level).ok_or(format!("unsupported --log-level: {level}"))?;
        options = options.with_log_level(parsed);
    }
    Ok(options)
}

fn pipeline_options(
    global: &GlobalOptions,
    bar: Option<&ProgressBar>,
) -> Result<PipelineOptions, Box<dyn std::error::Error>> {
    let mut options = PipelineOptions::new();

    if let Some(format) = &global.format {
        let parsed =
            FrameFormat::parse(format).ok_or(format!("unsupported --format: {format}"))?;
        options = options.with_frame_format(parsed);
    }
    if let Some(quality) = global.quality {
        options = options.with_quality(quality);
    }
    if global.verbose {
        options = options.with_status(Arc::new(LogStatus));
    }
    if let Some(bar) = bar {
        options = options.with_progress(Arc::new(TerminalProgress { bar: bar.clone() }));
    }

    Ok(options)
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
        if let Some(timestamp) = info.current_timestamp {
            self.bar.set_message(format!("{timestamp:.2}s"));
        }
    }
}

fn progress_bar(enabled: bool) -> Result<Option<ProgressBar>, Box<dyn std::error::Error>> {
    if !enabled {
        return Ok(None);
    }
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
    bar.set_style(style.progress_chars("##-"));
    Ok(Some(bar))
}

fn print_probe(probe: &ProbeResult, json: bool, flat: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(&probe.raw)?);
        return Ok(());
    }
    if flat {
        for (key, value) in probe.flatten() {
            match value {
                Value::String(text) => println!("{key}: {text}"),
                other => println!("{key}: {other}"),
            }
        }
        return Ok(());
    }

    println!(
        "Format: {}",
        probe.format.format_name.as_deref().unwrap_or("unknown")
    );
    match probe.duration() {
        Some(duration) => println!("Duration: {} ({duration:.3}s)", format_clock(duration)),
        None => println!("Duration: unknown"),
    }
    for stream in &probe.streams {
        let mut line = format!(
            "Stream #{}: {:?} [{}]",
            stream.index,
            stream.kind,
            stream.codec.as_deref().unwrap_or("unknown")
        );
        if let (Some(width), Some(height)) = (stream.width, stream.height) {
            line.push_str(&format!(" {width}x{height}"));
        }
        if let Some(fps) = stream.frames_per_second {
            line.push_str(&format!(" @ {fps:.2} fps"));
        }
        println!("{line}");
    }
    Ok(())
}

/// Load the source and run `job`, delivering into the output directory.
fn run_job<E: MediaEngine + ?Sized>(
    engine: &mut E,
    global: &GlobalOptions,
    input: &str,
    job: ExtractionJob,
    deliver: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    engine.load()?;
    let (name, bytes) = read_input(input)?;
    let source = SourceMedia::load(engine, &name, bytes)?;

    let is_sequence = matches!(job, ExtractionJob::ExtractFrameSequence { .. });
    let bar = progress_bar(global.progress && is_sequence)?;
    let options = pipeline_options(global, bar.as_ref())?;
    let mut pipeline = ExtractionPipeline::new(engine, options);

    let status = if deliver {
        let mut sink = DirectorySink::new(global.out.clone()).with_overwrite(global.overwrite);
        let status = pipeline.submit(&source, &job, &mut sink);
        for path in sink.written() {
            println!("{} {}", "saved".green().bold(), path.display());
        }
        status
    } else {
        let mut sink = MemorySink::new();
        let status = pipeline.submit(&source, &job, &mut sink);
        for artifact in sink.artifacts() {
            println!(
                "{} {}",
                "would save".cyan().bold(),
                global.out.join(&artifact.file_name).display()
            );
        }
        status
    };

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    match status {
        JobStatus::Done { message } => {
            println!("{} {}", "success:".green().bold(), message.green());
            Ok(())
        }
        other => Err(other.to_string().into()),
    }
}

fn dispatch_job(global: &GlobalOptions, input: &str, job: ExtractionJob) -> Result<(), Box<dyn std::error::Error>> {
    if global.dry_run {
        let mut engine = MemoryEngine::new();
        let result = run_job(&mut engine, global, input, job, false);
        for command in engine.commands() {
            println!("ffmpeg {}", command.join(" "));
        }
        result
    } else {
        let mut engine = FfmpegEngine::new(engine_options(global)?);
        run_job(&mut engine, global, input, job, true)
    }
}

fn load_probe(global: &GlobalOptions, input: &str) -> Result<ProbeResult, Box<dyn std::error::Error>> {
    let (name, bytes) = read_input(input)?;
    let source = if global.dry_run {
        let mut engine = MemoryEngine::new();
        engine.load()?;
        SourceMedia::load(&mut engine, &name, bytes)?
    } else {
        let mut engine = FfmpegEngine::new(engine_options(global)?);
        engine.load()?;
        SourceMedia::load(&mut engine, &name, bytes)?
    };
    Ok(source.probe().clone())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);
    let global = &cli.global;

    match cli.command {
        Commands::Probe { input, json, flat } => {
            let probe = load_probe(global, &input)?;
            print_probe(&probe, json, flat)?;
        }
        Commands::Frame { input, at } => {
            let job = ExtractionJob::ExtractFrame {
                timestamp: parse_timecode(&at)?,
            };
            dispatch_job(global, &input, job)?;
        }
        Commands::Cut {
            input,
            start,
            end,
            reverse,
        } => {
            let (start, end) = (parse_timecode(&start)?, parse_timecode(&end)?);
            let job = if reverse {
                ExtractionJob::CutClipReversed { start, end }
            } else {
                ExtractionJob::CutClip { start, end }
            };
            dispatch_job(global, &input, job)?;
        }
        Commands::Frames {
            input,
            start,
            end,
            count,
        } => {
            let job = ExtractionJob::ExtractFrameSequence {
                start: parse_timecode(&start)?,
                end: parse_timecode(&end)?,
                count,
            };
            dispatch_job(global, &input, job)?;
        }
        Commands::Validate { input, start, end } => {
            let probe = load_probe(global, &input)?;
            let report = match (start, end) {
                (Some(start), Some(end)) => {
                    let job = ExtractionJob::CutClip {
                        start: parse_timecode(&start)?,
                        end: parse_timecode(&end)?,
                    };
                    validate_job(&job, &probe)
                }
                _ => validate_source(&probe),
            };
            print!("{report}");
            if !report.is_valid() {
                return Err(format!("{} validation error(s)", report.errors.len()).into());
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framecut", &mut std::io::stdout());
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
