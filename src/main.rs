//! Emblem CLI
//!
//! Usage:
//!   emblem --text "your text here"          # Rendering for one text
//!   emblem --file notes.md --verbose        # Full diagnostics
//!   cat notes.md | emblem --json            # JSON output from stdin
//!   emblem --serve                          # HTTP API server

use clap::Parser;
use colored::Colorize;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process;

use emblem::config::PipelineConfig;
use emblem::core::{default_registry, run_server, Pipeline};
use emblem::telemetry::init_tracing;
use emblem::types::ContentInput;
use emblem::{HASH_ALGORITHM, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "emblem",
    version = VERSION,
    about = "Emblem - deterministic expression parameters from free-form text",
    long_about = "Emblem reads a text, runs a council of detectors over it and derives\n\
                  a Meaning Model, an Expression Model and one distinct presentation\n\
                  family per slot. The same text always yields the same result.\n\n\
                  Input:\n  \
                  --text     Inline text\n  \
                  --file     Read text from a file\n  \
                  (neither)  Read text from stdin\n\n\
                  Modes:\n  \
                  --verbose  Diagnostics (evidence counts, MM/EM, seeds)\n  \
                  --serve    HTTP API server mode"
)]
struct Args {
    /// Text to evaluate
    #[arg(short, long, conflicts_with = "file")]
    text: Option<String>,

    /// Read text from a file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Show diagnostics instead of the bare rendering
    #[arg(short, long)]
    verbose: bool,

    /// Resolution confidence of the input (0.0-1.0)
    #[arg(long, default_value_t = 1.0)]
    confidence: f64,

    /// Provenance tag of the input
    #[arg(long, default_value = "cli")]
    provenance: String,

    /// JSON config file (missing keys take defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run detectors in parallel under the default per-detector budget
    #[arg(long)]
    bounded: bool,

    /// Per-detector timeout in ms; 0 runs detectors inline without a timeout
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = init_tracing() {
        eprintln!("tracing disabled: {}", e);
    }
    if args.no_color {
        colored::control::set_override(false);
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            process::exit(2);
        }
    };
    let pipeline = Pipeline::new(default_registry(), config);

    if args.serve {
        run_serve(&args, pipeline).await;
        return;
    }

    let text = match read_input(&args) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Input error: {}", e);
            process::exit(2);
        }
    };
    run_single(&pipeline, text, &args);
}

/// Config file first, then CLI overrides
fn load_config(args: &Args) -> Result<PipelineConfig, emblem::types::ConfigError> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig::default(),
    };
    if args.bounded {
        config = config.bounded();
    }
    if let Some(ms) = args.timeout_ms {
        config.detector_timeout_ms = if ms == 0 { None } else { Some(ms) };
    }
    config.validate()?;
    Ok(config)
}

fn read_input(args: &Args) -> io::Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.file {
        return std::fs::read_to_string(path);
    }
    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprintln!("Reading text from stdin (end with Ctrl-D)...");
    }
    let mut buf = String::new();
    stdin.lock().read_to_string(&mut buf)?;
    Ok(buf)
}

/// Run single text evaluation
fn run_single(pipeline: &Pipeline, text: String, args: &Args) {
    let input = ContentInput::new(text, args.provenance.clone(), args.confidence);

    if args.verbose {
        let diagnostics = pipeline.diagnose(&input);
        if args.json {
            print_json(&diagnostics);
        } else {
            println!("{}", diagnostics.to_report(args.no_color));
        }
        return;
    }

    let rendering = pipeline.process(&input);
    if args.json {
        print_json(&rendering);
    } else if args.no_color {
        println!("{}", rendering.to_parseable_string());
    } else {
        println!("{}", rendering.to_terminal_string());
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Serialization error: {}", e);
            process::exit(1);
        }
    }
}

/// Run HTTP API server
async fn run_serve(args: &Args, pipeline: Pipeline) {
    println!();
    if args.no_color {
        println!("Emblem API Server v{} ({})", VERSION, HASH_ALGORITHM);
    } else {
        println!("{} v{} ({})", "◆ Emblem API Server".bold(), VERSION, HASH_ALGORITHM.dimmed());
    }
    println!();

    if let Err(e) = run_server(&args.addr, pipeline).await {
        eprintln!("Server error: {}", e);
        process::exit(1);
    }
}
