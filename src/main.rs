//! Upside Down Communicator CLI
//!
//! Usage:
//!   upsidedown                              # Interactive terminal
//!   upsidedown --mode letters               # Light one letter at a time
//!   upsidedown --serve                      # HTTP API server
//!   upsidedown --json                       # Every state update as a JSON line

use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use upsidedown::config::CommunicatorConfig;
use upsidedown::core::{run_server, Communicator, ShakeDetector, SilentTone, TerminalBell, ToneSink};
use upsidedown::types::{notation, CommunicatorState, StateUpdate, TransmitMode};
use upsidedown::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "upsidedown",
    version = VERSION,
    about = "Upside Down Communicator - blink messages in Morse before the terminal turns on you",
    long_about = "A corrupted terminal that encodes your messages into Morse code and\n\
                  plays them back as light pulses. Sanity drains one point per second;\n\
                  at zero the terminal is possessed until you shake it (or 30 seconds pass).\n\n\
                  Commands:\n  \
                  <text>    Set the message and transmit it\n  \
                  :send     Transmit the current message again\n  \
                  :stop     Stop the transmission\n  \
                  :shake    Shake the terminal to restore sanity\n  \
                  :mode     Toggle Morse / letters playback\n  \
                  :status   Show the current state\n  \
                  :quit     Exit"
)]
struct Args {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Playback variant
    #[arg(short, long, value_enum)]
    mode: Option<TransmitMode>,

    /// Sanity drain interval in milliseconds
    #[arg(long)]
    drain_ms: Option<u64>,

    /// Possession auto-recovery delay in milliseconds
    #[arg(long)]
    possession_ms: Option<u64>,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Print every state update as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// No terminal bell
    #[arg(long)]
    silent: bool,

    /// Log filter (overrides RUST_LOG)
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.log.as_deref());

    if args.no_color {
        colored::control::set_override(false);
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let tone: Arc<dyn ToneSink> = if args.silent || args.serve {
        Arc::new(SilentTone)
    } else {
        Arc::new(TerminalBell)
    };
    let communicator = Arc::new(Communicator::start(config, tone));

    if args.serve {
        run_serve(&args, communicator).await;
    } else {
        run_interactive(&args, communicator).await;
    }
}

fn init_logging(directive: Option<&str>) {
    let filter = match directive {
        Some(d) => EnvFilter::new(d),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("upsidedown=warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// File first, then flags on top
fn load_config(args: &Args) -> upsidedown::error::Result<CommunicatorConfig> {
    let mut config = match &args.config {
        Some(path) => CommunicatorConfig::from_file(path)?,
        None => CommunicatorConfig::default(),
    };
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(ms) = args.drain_ms {
        config.drain_interval_ms = ms;
    }
    if let Some(ms) = args.possession_ms {
        config.possession_duration_ms = ms;
    }
    config.validate()?;
    Ok(config)
}

/// Run the interactive terminal
async fn run_interactive(args: &Args, communicator: Arc<Communicator>) {
    print_header();

    let restore = Arc::clone(&communicator);
    let shake = ShakeDetector::new(communicator.config().shake_cooldown(), move || {
        restore.restore_sanity();
    });
    shake.start();

    let renderer = tokio::spawn(render_updates(communicator.subscribe(), args.json));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let next = tokio::select! {
            next = lines.next_line() => next,
            _ = tokio::signal::ctrl_c() => break,
        };
        let line = match next {
            Ok(Some(line)) => line,
            Ok(None) | Err(_) => break,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            ":quit" | ":exit" => break,
            ":send" => communicator.encode_and_transmit(),
            ":stop" => communicator.stop_transmission(),
            ":shake" => {
                if !shake.shake_now() {
                    println!("{}", "  (the terminal is still rattling)".dimmed());
                }
            }
            ":mode" => {
                let next = match communicator.snapshot().mode {
                    TransmitMode::Morse => TransmitMode::Letters,
                    TransmitMode::Letters => TransmitMode::Morse,
                };
                communicator.set_mode(next);
                println!("  mode: {:?}", next);
            }
            ":status" => print_status(&communicator.current()),
            text if text.starts_with(':') => {
                println!("{}", format!("  unknown command {}", text).yellow());
            }
            text => {
                if communicator.snapshot().possessed {
                    println!("{}", "  SYSTEM CORRUPTED - SHAKE TO RESTORE".red().bold());
                    continue;
                }
                communicator.update_message(text);
                communicator.encode_and_transmit();
                let state = communicator.snapshot();
                if state.transmitting && state.mode == TransmitMode::Morse {
                    println!("  {}", notation(&state.signal_output).green());
                }
            }
        }
    }

    shake.stop();
    communicator.shutdown();
    renderer.abort();
    println!("\nSession ended. Possessed {} time(s).", communicator.snapshot().possessions);
}

/// Print one line per status change, and the light as it blinks
async fn render_updates(mut rx: tokio::sync::broadcast::Receiver<StateUpdate>, json: bool) {
    let mut last: Option<CommunicatorState> = None;
    loop {
        let update = match rx.recv().await {
            Ok(update) => update,
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        };

        if json {
            println!("{}", serde_json::to_string(&update).unwrap_or_default());
            continue;
        }

        let state = &update.state;
        let prev = last.as_ref();
        if state.flashing && !prev.is_some_and(|p| p.flashing) {
            use std::io::Write;
            let mark = state.active_letter.map(String::from).unwrap_or_else(|| "█".to_string());
            print!("{}", mark.bright_green().bold());
            let _ = std::io::stdout().flush();
        }
        if prev.map(|p| p.status) != Some(state.status) {
            if prev.is_some_and(|p| p.transmitting) {
                println!();
            }
            print_status(&update);
            if state.possessed {
                println!("{}", "  ∀ SHAKE TO RESTORE (:shake) ∀".red().bold());
            }
        }

        last = Some(update.state);
    }
}

fn print_status(update: &StateUpdate) {
    if colored::control::SHOULD_COLORIZE.should_colorize() {
        println!("{}", update.to_terminal_string());
    } else {
        println!("{}", update.to_parseable_string());
    }
}

fn print_header() {
    println!("{}", "╔════════════════════════════════════════╗".green());
    println!("{}", format!("║   UPSIDE DOWN  COMMUNICATOR v{:<10}║", VERSION).green().bold());
    println!("{}", "╚════════════════════════════════════════╝".green());
    println!("Type a message and press Enter to transmit. ':quit' to exit.");
    println!();
}

/// Run HTTP API server
async fn run_serve(args: &Args, communicator: Arc<Communicator>) {
    if let Err(e) = run_server(&args.addr, Arc::clone(&communicator)).await {
        eprintln!("Server error: {}", e);
        communicator.shutdown();
        std::process::exit(1);
    }
    communicator.shutdown();
}
