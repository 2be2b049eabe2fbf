use anyhow::Result;
use clap::{Parser, Subcommand};
use formcheck::{
    Engine, EngineEvent, FormcheckConfig, FrameResult, HeuristicClassifier, LandmarkFileEstimator,
    PoseEstimator, SessionRegistry,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "formcheck")]
#[command(about = "Movement analysis for rehabilitation exercises")]
#[command(version)]
#[command(long_about = "Recognizes which rehabilitation exercise a person performs from \
body-landmark recordings and checks it against biomechanical form rules. Recordings are \
JSON arrays of per-frame landmark sets produced by a pose estimator.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "formcheck.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a complete recording offline
    AnalyzeVideo {
        /// Landmark recording (JSON)
        recording: PathBuf,

        /// Print the full analysis as JSON instead of the text report
        #[arg(long)]
        json: bool,
    },

    /// Replay recordings through real-time sessions, one session per recording
    Live {
        /// Landmark recordings (JSON), replayed side by side
        #[arg(required = true)]
        recordings: Vec<PathBuf>,

        /// Exercise to use when calibration cannot recognize one
        #[arg(long, value_name = "NAME")]
        exercise: Option<String>,

        /// Replay rate in frames per second
        #[arg(long, default_value_t = 30)]
        fps: u32,

        /// Print each frame result as a JSON line
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting formcheck v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match FormcheckConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let Some(command) = args.command else {
        eprintln!("No command given; run with --help for usage");
        std::process::exit(2);
    };

    let classifier = Arc::new(HeuristicClassifier::new(config.classifier.heuristic_min_score));
    let engine = Engine::builder()
        .with_config(config)
        .with_integrity_check(classifier.clone())
        .with_classifier(classifier)
        .build()
        .map_err(|e| {
            error!("Failed to initialize analysis engine: {}", e);
            e
        })?;

    match command {
        Command::AnalyzeVideo { recording, json } => analyze_video(&engine, &recording, json),
        Command::Live {
            recordings,
            exercise,
            fps,
            json,
        } => run_live(&engine, &recordings, exercise.as_deref(), fps, json).await,
    }
}

fn analyze_video(engine: &Engine, recording: &Path, json: bool) -> Result<()> {
    let estimator = LandmarkFileEstimator::new();
    let frames = estimator.process_video_file(recording)?;

    let analysis = engine.analyze_video(frames).map_err(|e| {
        error!("Analysis of {} failed: {}", recording.display(), e);
        e
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        println!("{}", analysis.report);
        println!();
        println!(
            "Voting confidence: {:.0}% ({} of {} windows visible)",
            analysis.voting_confidence * 100.0,
            analysis.windows_visible,
            analysis.windows_total
        );
        println!("Final segment: {}", analysis.feedback);
    }

    Ok(())
}

async fn run_live(
    engine: &Engine,
    recordings: &[PathBuf],
    exercise: Option<&str>,
    fps: u32,
    json: bool,
) -> Result<()> {
    let estimator = LandmarkFileEstimator::new();
    let mut sessions = SessionRegistry::new();
    let mut replays = Vec::with_capacity(recordings.len());
    for recording in recordings {
        let observations = estimator.load_observations(recording)?;
        let id = sessions.insert(engine.create_session(exercise));
        info!("Replaying {} as session {}", recording.display(), id);
        replays.push((id, observations.into_iter()));
    }

    let cancel_token = CancellationToken::new();

    let logger = tokio::spawn(log_events(engine.subscribe(), cancel_token.clone()));

    let signal_token = cancel_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C, stopping replay");
                signal_token.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / fps.max(1) as f64));

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = interval.tick() => {
                let mut active = 0;
                for (id, frames) in replays.iter_mut() {
                    let Some(observation) = frames.next() else {
                        continue;
                    };
                    let Some(session) = sessions.get_mut(id) else {
                        continue;
                    };
                    active += 1;
                    let result = engine.analyze_frame(session, observation)?;
                    print_frame_result(&result, json, recordings.len() > 1)?;
                }
                if active == 0 {
                    break;
                }
            }
        }
    }

    info!("Replay finished for {} sessions", sessions.len());
    for (id, _) in replays {
        let Some(session) = sessions.remove(&id) else {
            continue;
        };
        let stats = session.stats();
        info!(
            "Session {}: {} frames, {} without pose, {} votes, {} diagnoses, locked to {}",
            id,
            stats.frames_seen,
            stats.frames_rejected,
            stats.votes_cast,
            stats.diagnoses,
            session.locked_exercise().unwrap_or("nothing")
        );
    }

    cancel_token.cancel();
    if let Err(e) = logger.await {
        warn!("Event logger task failed: {}", e);
    }

    Ok(())
}

fn print_frame_result(result: &FrameResult, json: bool, with_session: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(result)?);
    } else {
        if with_session {
            print!("{} ", result.session_id);
        }
        println!(
            "[{:?}] {:?}: {} (score {:.2}, {}/{})",
            result.phase,
            result.status,
            result.feedback,
            result.score,
            result.buffered_frames,
            result.required_frames
        );
    }
    Ok(())
}

async fn log_events(
    mut receiver: broadcast::Receiver<EngineEvent>,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            event = receiver.recv() => match event {
                Ok(event) => info!(event_type = event.event_type(), "{}", event.description()),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Event logger lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("formcheck={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .with_writer(std::io::stderr)
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .with_writer(std::io::stderr)
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .with_writer(std::io::stderr)
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    // Logs go to stderr so reports on stdout stay clean
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Formcheck Configuration File");
    println!("# This is the default configuration with all available options");
    println!("# Environment overrides use FORMCHECK_<SECTION>__<KEY>,");
    println!("# e.g. FORMCHECK_SESSION__TRAINING_WINDOW=45");
    println!();
    println!("{}", toml::to_string_pretty(&FormcheckConfig::default())?);
    Ok(())
}
