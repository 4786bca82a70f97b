//! Rimsense CLI
//!
//! Host receiver and device simulator for the hoop sensor pod.

use chrono::Utc;
use clap::{Parser, Subcommand};
use rimsense::{
    config::Config,
    core::ShotEvent,
    device::{HealthMonitor, RangingConfig, SimulatedImu, SimulatedRanging},
    receiver::{FrameReceiver, SessionProcessor},
    sensor::inertial_ring,
    telemetry::LinkStats,
    wire::{Packetizer, WireFormat},
    Classification, VERSION,
};
use serde::Serialize;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rimsense")]
#[command(version = VERSION)]
#[command(about = "Dual-sensor shot detection host", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Receive frames and classify shots
    Run {
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,

        /// Wire format: fixed or sequenced
        #[arg(long)]
        format: Option<String>,

        /// Skip writing the session event file at shutdown
        #[arg(long)]
        no_export: bool,
    },

    /// Run a simulated sensor pod against a host
    Simulate {
        /// Host address to send frames to
        #[arg(long, default_value = "127.0.0.1:12345")]
        target: String,

        /// Wire format: fixed or sequenced
        #[arg(long, default_value = "fixed")]
        format: String,

        /// Seconds to run, 0 = until Ctrl+C
        #[arg(long, default_value = "0")]
        duration: u64,

        /// Synthetic shot period in seconds, 0 disables shots
        #[arg(long, default_value = "5")]
        shot_period: u64,
    },

    /// Show configuration
    Config {
        /// Write the current configuration to the config file
        #[arg(long)]
        write: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            port,
            format,
            no_export,
        } => cmd_run(port, format.as_deref(), no_export),
        Commands::Simulate {
            target,
            format,
            duration,
            shot_period,
        } => cmd_simulate(&target, &format, duration, shot_period),
        Commands::Config { write } => cmd_config(write),
    }
}

fn parse_format(s: &str) -> WireFormat {
    match s {
        "fixed" => WireFormat::Fixed,
        "sequenced" => WireFormat::Sequenced,
        other => {
            eprintln!("Error: unknown wire format {other:?} (expected fixed or sequenced)");
            std::process::exit(1);
        }
    }
}

fn cmd_run(port: Option<u16>, format: Option<&str>, no_export: bool) {
    println!("Rimsense v{VERSION}");
    println!();

    let mut config = Config::load().unwrap_or_default();
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(format) = format {
        config.wire_format = parse_format(format);
    }

    // Fail fast on unusable thresholds, before any socket work
    if let Err(e) = config.classifier.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: could not create directories: {e}");
    }

    let stats = LinkStats::shared();
    let mut receiver = FrameReceiver::new(
        config.bind_addr(),
        config.ingest_queue_depth,
        stats.clone(),
    );
    if let Err(e) = receiver.start() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let mut processor = match SessionProcessor::new(
        config.wire_format,
        config.classifier.clone(),
        stats.clone(),
    ) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    println!(
        "Listening on {} ({:?} frames)",
        config.bind_addr(),
        config.wire_format
    );
    println!("Press Ctrl+C to stop");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    let frames = receiver.frames().clone();
    let mut session_events: Vec<ShotEvent> = Vec::new();
    let mut last_rate_print = Instant::now();
    let mut frames_at_last_print = 0u64;

    while running.load(Ordering::SeqCst) {
        match frames.recv_timeout(Duration::from_millis(100)) {
            Ok(datagram) => {
                for event in processor.ingest_datagram(&datagram) {
                    println!("{}", describe_event(&event));
                    session_events.push(event);
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                eprintln!("Receiver disconnected unexpectedly");
                break;
            }
        }

        if last_rate_print.elapsed() >= Duration::from_secs(1) {
            let snap = stats.snapshot();
            let delta = snap.frames_received - frames_at_last_print;
            if delta > 0 {
                println!(
                    "[rx] {delta} frames/s | total {} | dropped {} | rejected {}",
                    snap.frames_received, snap.frames_dropped, snap.frames_rejected
                );
            }
            frames_at_last_print = snap.frames_received;
            last_rate_print = Instant::now();
        }
    }

    println!();
    println!("Stopping...");
    receiver.stop();

    println!();
    println!("Shots: {}", processor.shot_stats().summary());
    println!("{}", stats.summary());

    if !no_export && !session_events.is_empty() {
        export_session(&config, &session_events, &processor);
    }
}

/// Human-readable line for a resolved shot.
fn describe_event(event: &ShotEvent) -> String {
    let when = event.basket_time.or(event.impact_time).unwrap_or_default();
    match event.classification {
        Classification::Make => {
            let basket_type = event
                .basket_type
                .map(|b| format!("{b:?}"))
                .unwrap_or_else(|| "?".to_string());
            format!(
                "[{when:9.3}s] MAKE  ({basket_type}, confidence {:.2})",
                event.confidence
            )
        }
        Classification::Miss => format!(
            "[{when:9.3}s] MISS  (impact {:.3}s, confidence {:.2})",
            event.impact_time.unwrap_or_default(),
            event.confidence
        ),
    }
}

#[derive(Serialize)]
struct SessionExport<'a> {
    session_id: String,
    exported_at: String,
    makes: u32,
    misses: u32,
    events: &'a [ShotEvent],
}

fn export_session(config: &Config, events: &[ShotEvent], processor: &SessionProcessor) {
    let export = SessionExport {
        session_id: uuid::Uuid::new_v4().to_string(),
        exported_at: Utc::now().to_rfc3339(),
        makes: processor.shot_stats().makes,
        misses: processor.shot_stats().misses,
        events,
    };

    let path = config.export_path.join(format!(
        "session_{}.json",
        Utc::now().format("%Y%m%d_%H%M%S")
    ));

    match serde_json::to_string_pretty(&export) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&path, json) {
                eprintln!("Error writing session file: {e}");
            } else {
                println!("Exported {} events to {:?}", events.len(), path);
            }
        }
        Err(e) => eprintln!("Error serializing session: {e}"),
    }
}

fn cmd_simulate(target: &str, format: &str, duration_s: u64, shot_period_s: u64) {
    let format = parse_format(format);
    let shot_period_ms = (shot_period_s * 1000) as u32;

    println!("Rimsense simulator v{VERSION}");
    println!("  Target: {target} ({format:?} frames)");
    if shot_period_ms > 0 {
        println!("  Synthetic shot every {shot_period_s}s");
    }
    println!();

    let socket = match UdpSocket::bind("0.0.0.0:0") {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: could not open socket: {e}");
            std::process::exit(1);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    // The sampler thread stands in for the timer interrupt: fixed cadence,
    // fixed-size ring, never blocks the main loop.
    const SAMPLE_PERIOD_MS: u32 = 5;
    let (mut tap, mut ring) = inertial_ring(256);
    let start = Instant::now();
    let sampler_running = running.clone();
    let sampler = thread::spawn(move || {
        let imu = SimulatedImu::new(SAMPLE_PERIOD_MS, shot_period_ms);
        while sampler_running.load(Ordering::SeqCst) {
            let now_ms = start.elapsed().as_millis() as u32;
            tap.push(imu.sample(now_ms));
            thread::sleep(Duration::from_millis(u64::from(SAMPLE_PERIOD_MS)));
        }
        tap.overruns()
    });

    let ranging_config = RangingConfig::default();
    if let Err(e) = ranging_config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    let mut ranging = SimulatedRanging::new(ranging_config, shot_period_ms);
    // three missed measurement periods count as stale
    let mut health = HealthMonitor::new(
        u32::from(ranging_config.inter_measurement_ms) * 3,
        ranging_config,
        0,
    );

    const SEND_TICK_MS: u32 = 100;
    let mut packetizer = Packetizer::new(format);
    let mut last_tick_ms = 0u32;
    let mut frames_sent = 0u64;

    while running.load(Ordering::SeqCst) {
        let now_ms = start.elapsed().as_millis() as u32;

        while let Some(sample) = ring.pop() {
            packetizer.push_inertial(sample);
        }

        if ranging.data_ready(now_ms) {
            let sample = ranging.read(now_ms);
            health.note_sample(now_ms);
            packetizer.push_ranging(sample);
        }

        match health.poll(now_ms, &mut ranging) {
            Ok(true) => println!("[{now_ms} ms] ranging sensor reset"),
            Ok(false) => {}
            Err(e) => {
                eprintln!("Error: {e}");
                break;
            }
        }

        if now_ms.saturating_sub(last_tick_ms) >= SEND_TICK_MS {
            let frame = packetizer.build_frame(now_ms);
            if let Err(e) = socket.send_to(&frame, target) {
                eprintln!("Error sending frame: {e}");
            } else {
                frames_sent += 1;
            }
            last_tick_ms = now_ms;
        }

        if duration_s > 0 && start.elapsed() >= Duration::from_secs(duration_s) {
            break;
        }
        thread::sleep(Duration::from_millis(2));
    }

    running.store(false, Ordering::SeqCst);
    let overruns = sampler.join().unwrap_or_default();

    println!();
    println!("Sent {frames_sent} frames");
    if overruns > 0 {
        println!("Sampler overruns: {overruns}");
    }
    let (inertial_backlog, ranging_backlog) = packetizer.backlog();
    if inertial_backlog > 0 || ranging_backlog > 0 {
        println!("Unsent backlog: {inertial_backlog} inertial, {ranging_backlog} ranging");
    }
    println!("Ranging resets: {}", health.resets());
}

fn cmd_config(write: bool) {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );

    if write {
        match config.save() {
            Ok(()) => println!("\nSaved to {:?}", Config::config_path()),
            Err(e) => {
                eprintln!("Error saving config: {e}");
                std::process::exit(1);
            }
        }
    }
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    }) {
        eprintln!("Warning: could not set Ctrl+C handler: {e}");
    }
}
