use std::{
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
    thread,
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use shotmark::{
    CancellationToken, CredentialSource, Endpoints, FfmpegLogLevel, FrameLabel, FrameSource,
    Pipeline, PipelineConfig, ProgressCallback, ProgressInfo, VideoReader,
};

const CLI_AFTER_HELP: &str = "Examples:\n  shotmark run sample_video.mp4 --out Landmarks.json --progress\n  shotmark run clip.mp4 --api-key-env MY_VISION_KEY --timeout 120\n  shotmark shots clip.mp4 --json\n  shotmark completions zsh > _shotmark";

#[derive(Debug, Parser)]
#[command(
    name = "shotmark",
    version,
    about = "Find landmarks in the frames that follow each shot change of a video",
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
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    ffmpeg_log_level: Option<String>,
}

#[derive(Debug, Parser, Clone)]
struct ServiceOptions {
    /// Environment variable holding a Google API key.
    #[arg(long, default_value = shotmark::config::DEFAULT_API_KEY_ENV)]
    api_key_env: String,

    /// Environment variable holding an OAuth2 access token (used when no API key is set).
    #[arg(long, default_value = shotmark::config::DEFAULT_ACCESS_TOKEN_ENV)]
    access_token_env: String,

    /// Shot-detection timeout in seconds.
    #[arg(long, default_value_t = 90)]
    timeout: u64,

    /// Frames sampled after each shot change.
    #[arg(long, default_value_t = 10)]
    frames_per_shot: u64,

    /// Video Intelligence base URL.
    #[arg(long, default_value = shotmark::config::DEFAULT_VIDEO_INTELLIGENCE_ENDPOINT)]
    video_intelligence_endpoint: String,

    /// Vision base URL.
    #[arg(long, default_value = shotmark::config::DEFAULT_VISION_ENDPOINT)]
    vision_endpoint: String,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Detect shot changes, then landmarks near each change, and write JSON.
    #[command(
        about = "Run the full pipeline",
        after_help = "Examples:\n  shotmark run sample_video.mp4\n  shotmark run clip.mp4 --out clip.json --font /usr/share/fonts/TTF/DejaVuSans.ttf --progress"
    )]
    Run {
        /// Input video path.
        #[arg(default_value = "sample_video.mp4")]
        input: PathBuf,

        /// Output JSON path.
        #[arg(long, default_value = shotmark::config::DEFAULT_OUTPUT_PATH)]
        out: PathBuf,

        #[command(flatten)]
        service: ServiceOptions,

        /// Padding added around each landmark bounding box, in pixels.
        #[arg(long, default_value_t = 10)]
        padding: i64,

        /// Text burned into each sampled frame.
        #[arg(long, default_value = "Shot Change")]
        label: String,

        /// Do not burn a label into sampled frames.
        #[arg(long, conflicts_with = "label")]
        no_label: bool,

        /// Font file for the label.
        #[arg(long)]
        font: Option<PathBuf>,

        /// JPEG quality (1-100) for frames sent to the landmark service.
        #[arg(long, default_value_t = 95)]
        quality: u8,

        /// Show a progress bar.
        #[arg(long)]
        progress: bool,
    },

    /// Run shot detection only and print the frames that would be sampled.
    #[command(about = "List the frames selected around shot changes")]
    Shots {
        /// Input video path.
        input: PathBuf,

        #[command(flatten)]
        service: ServiceOptions,

        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new(total: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(total);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
        if let Some(frame) = info.current_frame {
            self.bar.set_message(format!("frame {frame}"));
        }
    }
}

fn init_logging(global: &GlobalOptions) {
    let default_filter = if global.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.ffmpeg_log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        shotmark::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

/// Exit status used when a second interrupt aborts the run.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Cancel `token` on the first interrupt; return an exit code on the second.
///
/// Returns `None` if waiting for a signal fails.
async fn watch_interrupts<F, Fut>(mut next_interrupt: F, token: CancellationToken) -> Option<i32>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    next_interrupt().await.ok()?;
    log::warn!("Interrupt received, finishing the current frame (press Ctrl-C again to abort)");
    token.cancel();

    next_interrupt().await.ok()?;
    log::error!("Second interrupt received, aborting");
    Some(INTERRUPTED_EXIT_CODE)
}

/// Cancel `token` on Ctrl-C and exit the process on a second Ctrl-C.
///
/// The handler runs on its own thread with a single-threaded runtime, so
/// the blocking pipeline keeps the main thread.
fn install_interrupt_handler(token: CancellationToken) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    thread::Builder::new()
        .name("ctrl-c".to_string())
        .spawn(move || {
            if let Some(code) = runtime.block_on(watch_interrupts(tokio::signal::ctrl_c, token)) {
                std::process::exit(code);
            }
        })?;

    Ok(())
}

fn base_config(input: &Path, service: &ServiceOptions) -> PipelineConfig {
    PipelineConfig::new(input)
        .with_credentials(CredentialSource::Either {
            api_key_env: service.api_key_env.clone(),
            access_token_env: service.access_token_env.clone(),
        })
        .with_endpoints(Endpoints {
            video_intelligence: service.video_intelligence_endpoint.clone(),
            vision: service.vision_endpoint.clone(),
        })
        .with_shot_detection_timeout(Duration::from_secs(service.timeout))
        .with_frames_per_shot(service.frames_per_shot)
}

/// Configuration for the `shots` command, which never samples frames.
fn shots_config(input: &Path, service: &ServiceOptions) -> PipelineConfig {
    base_config(input, service).with_label(None)
}

fn build_label(text: &str, no_label: bool, font: Option<&Path>) -> Option<FrameLabel> {
    if no_label {
        return None;
    }
    let label = FrameLabel::default().with_text(text);
    Some(match font {
        Some(path) => label.with_font_path(path),
        None => label,
    })
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Run {
            input,
            out,
            service,
            padding,
            label,
            no_label,
            font,
            quality,
            progress,
        } => {
            let token = CancellationToken::new();
            install_interrupt_handler(token.clone())?;

            let mut config = base_config(&input, &service)
                .with_output_path(&out)
                .with_bounding_box_padding(padding)
                .with_label(build_label(&label, no_label, font.as_deref()))
                .with_jpeg_quality(quality)
                .with_cancellation(token);

            let bar = if progress {
                let terminal = Arc::new(TerminalProgress::new(0)?);
                config = config.with_progress(terminal.clone());
                Some(terminal)
            } else {
                None
            };

            log::debug!("{config:?}");
            let report = Pipeline::google(config)?.run()?;

            if let Some(terminal) = bar {
                terminal.bar.finish_with_message("done");
            }

            if report.interrupted {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    "interrupted; results are partial".yellow()
                );
            }
            if report.frames_skipped > 0 {
                log::debug!("{} frame(s) could not be read", report.frames_skipped);
            }

            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "{} landmark(s) in {} of {} sampled frame(s) across {} shot(s) -> {}",
                    report.landmark_count,
                    report.frames_with_landmarks,
                    report.frames_sampled,
                    report.shot_count,
                    report.output_path.display()
                )
                .green()
            );
        }
        Commands::Shots {
            input,
            service,
            json,
        } => {
            let config = shots_config(&input, &service);
            let mut reader = VideoReader::open(&input)?;
            let metadata = reader.metadata().clone();
            let pipeline = Pipeline::google(config)?;
            let shots = pipeline.detect_shot_frames(&metadata);
            reader.release();
            let shots = shots?;

            if json {
                let payload = json!({
                    "fps": metadata.frames_per_second,
                    "frame_count": metadata.frame_count,
                    "shot_count": shots.shot_count,
                    "frames": shots.frames,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "FPS: {:.3}, total frames: {}",
                    metadata.frames_per_second, metadata.frame_count
                );
                println!("Shots: {}", shots.shot_count);
                println!("Frames: {:?}", shots.frames);
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "shotmark", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        log::error!("Error occurred: {error}");
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::io;
    use std::path::Path;

    use clap::Parser;
    use shotmark::CancellationToken;

    use super::{Cli, Commands, INTERRUPTED_EXIT_CODE, build_label, shots_config, watch_interrupts};

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn run_defaults() {
        let cli = Cli::try_parse_from(["shotmark", "run"]).unwrap();
        match cli.command {
            Commands::Run {
                input,
                out,
                service,
                padding,
                quality,
                ..
            } => {
                assert_eq!(input.to_str(), Some("sample_video.mp4"));
                assert_eq!(out.to_str(), Some("Landmarks.json"));
                assert_eq!(service.timeout, 90);
                assert_eq!(service.frames_per_shot, 10);
                assert_eq!(padding, 10);
                assert_eq!(quality, 95);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_label_conflicts_with_label() {
        let result = Cli::try_parse_from(["shotmark", "run", "--no-label", "--label", "Cut"]);
        assert!(result.is_err());
    }

    #[test]
    fn label_options() {
        assert!(build_label("Shot Change", true, None).is_none());

        let label = build_label("Cut", false, Some(Path::new("font.ttf"))).unwrap();
        assert_eq!(label.text, "Cut");
        assert_eq!(label.font_path.as_deref(), Some(Path::new("font.ttf")));
    }

    #[test]
    fn ffmpeg_log_level_parsing() {
        assert!("quiet".parse::<shotmark::FfmpegLogLevel>().is_ok());
        assert!("WARN".parse::<shotmark::FfmpegLogLevel>().is_ok());
        assert!("loud".parse::<shotmark::FfmpegLogLevel>().is_err());
    }

    #[test]
    fn first_interrupt_cancels_second_exits() {
        let token = CancellationToken::new();
        let signals = Cell::new(0);
        let code = block_on(watch_interrupts(
            || {
                signals.set(signals.get() + 1);
                std::future::ready(Ok::<(), io::Error>(()))
            },
            token.clone(),
        ));

        assert!(token.is_cancelled());
        assert_eq!(signals.get(), 2);
        assert_eq!(code, Some(INTERRUPTED_EXIT_CODE));
    }

    #[test]
    fn signal_failure_leaves_token_untouched() {
        let token = CancellationToken::new();
        let code = block_on(watch_interrupts(
            || std::future::ready(Err::<(), _>(io::Error::other("no signal handler"))),
            token.clone(),
        ));

        assert_eq!(code, None);
        assert!(!token.is_cancelled());
    }

    #[test]
    fn shots_command_builds_no_label() {
        let cli = Cli::try_parse_from(["shotmark", "shots", "clip.mp4"]).unwrap();
        match cli.command {
            Commands::Shots { input, service, .. } => {
                let config = shots_config(&input, &service);
                assert!(format!("{config:?}").contains("label: None"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
