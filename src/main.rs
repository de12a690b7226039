// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use scribe2srt::app_config::{self, Config};
use scribe2srt::app_controller::Controller;
use scribe2srt::file_utils::{FileManager, SUPPORTED_EXTENSIONS};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Transcribe an audio or video file into SRT subtitles (default command)
    #[command(alias = "t")]
    Transcribe(TranscribeArgs),

    /// Generate shell completions for scribe2srt
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct TranscribeArgs {
    /// Input audio or video file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    #[command(flatten)]
    options: TranscribeOptions,
}

/// Options shared by the default command and `transcribe`
#[derive(Args, Debug, Clone, Default)]
struct TranscribeOptions {
    /// Language hint (e.g. 'en', 'ja', 'zh'); 'auto' detects it
    #[arg(short, long)]
    language: Option<String>,

    /// Output subtitle file (default: <input>.srt next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Annotate non-speech sounds such as (laughter)
    #[arg(long, value_name = "BOOL")]
    tag_audio_events: Option<bool>,

    /// Process chunks one at a time
    #[arg(long)]
    no_async: bool,

    /// Maximum number of chunks in flight
    #[arg(short = 'j', long)]
    max_concurrent: Option<usize>,

    /// Total attempts per chunk
    #[arg(long)]
    max_retries: Option<u32>,

    /// Requests per minute
    #[arg(long)]
    rate_limit: Option<u32>,

    /// Split inputs longer than this many minutes
    #[arg(long, value_name = "MINUTES")]
    split_duration: Option<u64>,

    /// Also save the raw transcript as JSON next to the subtitles
    #[arg(long)]
    save_json: bool,

    /// Minimum subtitle duration in seconds
    #[arg(long)]
    min_duration: Option<f64>,

    /// Maximum subtitle duration in seconds
    #[arg(long)]
    max_duration: Option<f64>,

    /// Minimum gap between subtitles in seconds
    #[arg(long)]
    min_gap: Option<f64>,

    /// Characters per second limit for CJK text
    #[arg(long)]
    cjk_cps: Option<f64>,

    /// Characters per second limit for other scripts
    #[arg(long)]
    latin_cps: Option<f64>,

    /// Characters per line for CJK text
    #[arg(long)]
    cjk_cpl: Option<usize>,

    /// Characters per line for other scripts
    #[arg(long)]
    latin_cpl: Option<usize>,

    /// Configuration file path (default: conf.json, then the user config dir)
    #[arg(short, long)]
    config_path: Option<PathBuf>,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Errors only
    #[arg(short, long)]
    quiet: bool,
}

impl TranscribeOptions {
    /// Apply command line overrides on top of the loaded configuration
    fn apply_to(&self, config: &mut Config) {
        let transcription = &mut config.transcription;
        if let Some(language) = &self.language {
            transcription.language = language.clone();
        }
        if let Some(tag) = self.tag_audio_events {
            transcription.tag_audio_events = tag;
        }
        if self.no_async {
            transcription.concurrent = false;
        }
        if let Some(n) = self.max_concurrent {
            transcription.max_concurrent = n;
        }
        if let Some(n) = self.max_retries {
            transcription.max_retries = n;
        }
        if let Some(rpm) = self.rate_limit {
            transcription.rate_limit_per_minute = rpm;
        }
        if let Some(minutes) = self.split_duration {
            transcription.split_duration_minutes = minutes;
        }

        let subtitle = &mut config.subtitle;
        if let Some(v) = self.min_duration {
            subtitle.min_duration = v;
        }
        if let Some(v) = self.max_duration {
            subtitle.max_duration = v;
        }
        if let Some(v) = self.min_gap {
            subtitle.min_gap = v;
        }
        if let Some(v) = self.cjk_cps {
            subtitle.cjk_cps = v;
        }
        if let Some(v) = self.latin_cps {
            subtitle.latin_cps = v;
        }
        if let Some(v) = self.cjk_cpl {
            subtitle.cjk_chars_per_line = v;
        }
        if let Some(v) = self.latin_cpl {
            subtitle.latin_chars_per_line = v;
        }

        if let Some(level) = self.log_level_override() {
            config.log_level = level;
        }
    }

    fn log_level_override(&self) -> Option<app_config::LogLevel> {
        if self.verbose {
            Some(app_config::LogLevel::Debug)
        } else if self.quiet {
            Some(app_config::LogLevel::Error)
        } else {
            self.log_level.clone().map(Into::into)
        }
    }
}

/// scribe2srt - speech-to-subtitle transcription
///
/// Transcribes audio and video files with the ElevenLabs speech-to-text service
/// and turns the word-level transcript into readable SRT subtitles.
#[derive(Parser, Debug)]
#[command(name = "scribe2srt")]
#[command(version)]
#[command(about = "Transcribe audio or video into SRT subtitles")]
#[command(long_about = "scribe2srt uploads audio to a speech-to-text service and builds timed SRT subtitles
from the returned words. Long inputs are split into chunks that are transcribed concurrently.

EXAMPLES:
    scribe2srt talk.mp3                          # Transcribe with default settings
    scribe2srt -l ja anime.mkv                   # Japanese language hint
    scribe2srt -o out.srt --save-json talk.m4a   # Custom output, keep the raw transcript
    scribe2srt -j 5 --rate-limit 60 lecture.mp4  # More parallelism
    scribe2srt --no-async lecture.mp4            # One chunk at a time
    scribe2srt completions bash > scribe2srt.bash

CONFIGURATION:
    Settings are read from conf.json in the working directory, then from the user
    configuration directory. Missing files fall back to built-in defaults; the
    configuration file is never written.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input audio or video file
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    #[command(flatten)]
    options: TranscribeOptions,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize with the most verbose level; the effective level is set after loading the config
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "scribe2srt", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Transcribe(args)) => run_transcribe(args).await,
        None => {
            let input = cli
                .input
                .ok_or_else(|| anyhow!("INPUT is required when no subcommand is specified"))?;
            run_transcribe(TranscribeArgs {
                input,
                options: cli.options,
            })
            .await
        }
    }
}

async fn run_transcribe(args: TranscribeArgs) -> Result<()> {
    let options = args.options;

    if let Some(level) = options.log_level_override() {
        log::set_max_level(level.into());
    }

    if !FileManager::is_supported_input(&args.input) {
        return Err(anyhow!(
            "Unsupported input format: {:?} (supported: {})",
            args.input,
            SUPPORTED_EXTENSIONS.join(", ")
        ));
    }

    let mut config = Config::load(options.config_path.as_deref())?;
    options.apply_to(&mut config);
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.into());

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling outstanding work");
            signal_token.cancel();
        }
    });

    let controller = Controller::with_config(config)?;
    let output = controller
        .run(&args.input, options.output.clone(), options.save_json, &cancel)
        .await?;

    info!("Success: {:?}", output);
    Ok(())
}
