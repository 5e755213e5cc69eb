//! Synheart Microexpression CLI
//!
//! Microexpression detection and speech correlation for research.

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use synheart_microexpression::{
    collector::{CollectorConfig, InputSource, StreamCollector},
    config::Config,
    core::{
        report::to_json_lines, ClassifierStatus, Clock, EngineEvent, ManualClock,
        MicroexpressionEngine, ReportBuilder, SessionReport, SystemClock,
    },
    transparency::create_shared_log_with_persistence,
    PRIVACY_DECLARATION, VERSION,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synheart-micro")]
#[command(author = "Synheart")]
#[command(version = VERSION)]
#[command(about = "Microexpression detection and speech correlation for research", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a stream of classifier, transcript, light and feedback events
    Run {
        /// Line-delimited JSON input file (reads stdin if omitted)
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Which clock stamps emotion-word pairs
        #[arg(long, value_enum, default_value = "auto")]
        clock: ClockMode,

        /// Number of recent pairs to show at the end
        #[arg(long)]
        display: Option<usize>,

        /// Skip writing a session report
        #[arg(long)]
        no_export: bool,
    },

    /// Show configuration and cumulative statistics
    Status,

    /// Display privacy declaration
    Privacy,

    /// Combine exported session reports
    Export {
        /// Directory holding session reports
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Export format (json or jsonl)
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Show configuration
    Config,

    /// Serve the engine over HTTP (requires server feature)
    #[cfg(feature = "server")]
    Serve {
        /// Port to bind on 127.0.0.1
        #[arg(long, default_value = "8787")]
        port: u16,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ClockMode {
    /// Follow input timestamps for files, wall time for stdin
    Auto,
    /// Wall-clock time
    Wall,
    /// Follow input timestamps
    Stream,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            clock,
            display,
            no_export,
        } => {
            cmd_run(input, clock, display, no_export);
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Privacy => {
            cmd_privacy();
        }
        Commands::Export { output, format } => {
            cmd_export(output, &format);
        }
        Commands::Config => {
            cmd_config();
        }
        #[cfg(feature = "server")]
        Commands::Serve { port } => {
            cmd_serve(port);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {e}; using default configuration");
            Config::default()
        }
    }
}

fn cmd_run(input: Option<PathBuf>, clock_mode: ClockMode, display: Option<usize>, no_export: bool) {
    println!("Synheart Microexpression v{VERSION}");
    println!();

    let config = load_config();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let source = match input {
        Some(path) => InputSource::File(path),
        None => InputSource::Stdin,
    };

    let follow_stream = match clock_mode {
        ClockMode::Stream => true,
        ClockMode::Wall => false,
        ClockMode::Auto => matches!(source, InputSource::File(_)),
    };

    let stream_clock = follow_stream.then(|| ManualClock::new(0));
    let clock: Arc<dyn Clock> = match &stream_clock {
        Some(c) => Arc::new(c.clone()),
        None => Arc::new(SystemClock),
    };

    println!("Starting engine...");
    match &source {
        InputSource::File(path) => println!("  Input: {path:?}"),
        InputSource::Stdin => println!("  Input: stdin"),
    }
    println!(
        "  Clock: {}",
        if follow_stream { "input timestamps" } else { "wall time" }
    );
    println!("  Window capacity: {} samples", config.window_capacity);
    println!("  Initial threshold: {:.2}", config.threshold.initial);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    // Set up transparency log
    let transparency_log =
        create_shared_log_with_persistence(config.data_path.join("transparency.json"));

    let mut engine = MicroexpressionEngine::with_parts(&config, clock, transparency_log.clone());

    let report_builder = ReportBuilder::new()
        .with_session_id(format!("SESS-{}", Utc::now().timestamp_millis()));
    println!("Instance ID: {}", report_builder.instance_id());

    let mut collector = StreamCollector::new(CollectorConfig {
        source,
        ..CollectorConfig::default()
    })
    .with_log(transparency_log.clone());

    if let Err(e) = collector.start() {
        eprintln!("Error starting collector: {e}");
        std::process::exit(1);
    }

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    let receiver = collector.receiver().clone();
    let mut last_live: Option<String> = None;
    let mut last_classifier = ClassifierStatus::Idle;

    while running.load(Ordering::SeqCst) {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                if let Some(ref c) = stream_clock {
                    c.set(c.now_ms().max(event.timestamp()));
                }

                for output in engine.push(event) {
                    print_event(&output, &mut last_live);
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                break;
            }
        }

        let classifier = engine.status().classifier;
        if classifier != last_classifier {
            if classifier == ClassifierStatus::Stale {
                eprintln!("Warning: classifier has stopped producing samples");
            }
            last_classifier = classifier;
        }
    }

    println!();
    println!("Stopping...");
    collector.stop();

    // Recent pairs, newest first
    let limit = display.unwrap_or(config.display_limit);
    let recent = engine.recent_pairs(limit);
    if !recent.is_empty() {
        println!();
        println!("Recent emotion-word pairs:");
        for pair in recent {
            println!(
                "  {:<10} \"{}\" ({:.3}) {}",
                pair.emotion.name(),
                pair.word,
                pair.confidence,
                pair.emotion.color()
            );
        }
    }

    // Save transparency log
    if let Err(e) = transparency_log.save() {
        eprintln!("Warning: Could not save transparency log: {e}");
    }

    if !no_export {
        let report = report_builder.build(&engine);
        let export_path = config.export_path.join(format!(
            "session_{}.json",
            Utc::now().format("%Y%m%d_%H%M%S")
        ));

        if let Some(parent) = export_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&export_path, json) {
                    eprintln!("Error writing report: {e}");
                } else {
                    println!();
                    println!(
                        "Exported {} pairs to {:?}",
                        report.pairs.len(),
                        export_path
                    );
                }
            }
            Err(e) => {
                eprintln!("Error serializing report: {e}");
            }
        }
    }

    // Final stats
    println!();
    println!("{}", transparency_log.summary());
}

/// Print the events a human watching the run cares about.
fn print_event(event: &EngineEvent, last_live: &mut Option<String>) {
    match event {
        EngineEvent::LiveEmotion(live) => {
            let name = live.emotion.name();
            if last_live.as_deref() != Some(name) {
                println!("[{}] Emotion: {} {}", live.timestamp, name, live.color);
                *last_live = Some(name.to_string());
            }
        }
        EngineEvent::PairEmitted(pair) => {
            println!(
                "[{}] Microexpression: {} on \"{}\" (confidence {:.3})",
                pair.timestamp,
                pair.emotion.name(),
                pair.word,
                pair.confidence
            );
        }
        EngineEvent::ThresholdChanged { previous, current } => {
            println!("Threshold: {previous:.2} -> {current:.2}");
        }
        EngineEvent::LightChanged {
            low_light,
            brightness,
        } => {
            println!(
                "Light: {} (brightness {:.0})",
                if *low_light { "low" } else { "normal" },
                brightness
            );
        }
        EngineEvent::SampleDropped { .. }
        | EngineEvent::MicroexpressionGated { .. }
        | EngineEvent::WordsUpdated { .. } => {}
    }
}

fn cmd_status() {
    let config = load_config();

    println!("Synheart Microexpression Status");
    println!("===============================");
    println!();

    println!("Configuration:");
    println!("  Window capacity: {} samples", config.window_capacity);
    println!(
        "  Microexpression duration: {}-{}ms",
        config.detection.min_duration_ms, config.detection.max_duration_ms
    );
    println!(
        "  Threshold: {:.2} (range {:.2}-{:.2})",
        config.threshold.initial, config.threshold.min, config.threshold.max
    );
    println!("  Low light below: {}", config.low_light_cutoff);
    println!();

    // Load and show transparency stats if available
    let stats_path = config.data_path.join("transparency.json");
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                if let Some(samples) = stats.get("samples_processed") {
                    println!("  Classifier samples: {samples}");
                }
                if let Some(dropped) = stats.get("samples_dropped") {
                    println!("  Dropped samples: {dropped}");
                }
                if let Some(fragments) = stats.get("transcript_fragments") {
                    println!("  Transcript fragments: {fragments}");
                }
                if let Some(candidates) = stats.get("candidates_detected") {
                    println!("  Microexpressions detected: {candidates}");
                }
                if let Some(pairs) = stats.get("pairs_emitted") {
                    println!("  Emotion-word pairs: {pairs}");
                }
            }
        }
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_privacy() {
    println!("{PRIVACY_DECLARATION}");
}

fn cmd_export(output: Option<PathBuf>, format: &str) {
    let config = load_config();
    let export_dir = output.unwrap_or(config.export_path.clone());

    // Find all session files
    let session_files: Vec<PathBuf> = std::fs::read_dir(&export_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.extension().map(|e| e == "json").unwrap_or(false)
                        && p.file_name()
                            .and_then(|n| n.to_str())
                            .map(|n| n.starts_with("session_"))
                            .unwrap_or(false)
                })
                .collect()
        })
        .unwrap_or_default();

    if session_files.is_empty() {
        println!("No session reports found in {export_dir:?}");
        println!("Run 'synheart-micro run' to process a session.");
        return;
    }

    println!(
        "Found {} session report(s) in {:?}",
        session_files.len(),
        export_dir
    );

    let mut reports: Vec<SessionReport> = Vec::new();
    for file in &session_files {
        match std::fs::read_to_string(file)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()))
        {
            Ok(report) => reports.push(report),
            Err(e) => eprintln!("Warning: skipping {file:?}: {e}"),
        }
    }

    let total_pairs: usize = reports.iter().map(|r| r.pairs.len()).sum();
    println!("Total pairs: {total_pairs}");

    let output_path = export_dir.join(format!(
        "export_{}.{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        if format == "jsonl" { "jsonl" } else { "json" }
    ));

    let serialized = if format == "jsonl" {
        to_json_lines(&reports)
    } else {
        serde_json::to_string_pretty(&reports)
    };

    let json = match serialized {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error serializing: {e}");
            return;
        }
    };

    match std::fs::write(&output_path, json) {
        Ok(_) => println!("Exported to {output_path:?}"),
        Err(e) => eprintln!("Error writing export: {e}"),
    }
}

fn cmd_config() {
    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

#[cfg(feature = "server")]
fn cmd_serve(port: u16) {
    let config = load_config();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error starting runtime: {e}");
            std::process::exit(1);
        }
    };

    runtime.block_on(async {
        let server_config = synheart_microexpression::server::ServerConfig::new(port, config);
        let (addr, shutdown_tx) = match synheart_microexpression::server::run(server_config).await {
            Ok(started) => started,
            Err(e) => {
                eprintln!("Error starting server: {e}");
                std::process::exit(1);
            }
        };

        println!("Listening on http://{addr}");
        println!("Press Ctrl+C to stop");

        let _ = tokio::signal::ctrl_c().await;
        let _ = shutdown_tx.send(());
    });
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    }) {
        eprintln!("Warning: could not set Ctrl+C handler: {e}");
    }
}
