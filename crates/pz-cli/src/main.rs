#![forbid(unsafe_code)]

//! panzoom CLI - exercise the pan/zoom constraint engine from the terminal.
//!
//! # Commands
//!
//! - `fit`: Compute the fit scale and centered position for an image
//! - `bounds`: Show the legal translation range at a given scale
//! - `replay`: Replay a recorded gesture session and print the resulting state
//! - `config`: Print the effective viewer configuration

use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pz_core::{Point, Size, ViewerConfig, ViewportGeometry};
use pz_engine::{PositionBounds, fit, position_bounds};
use pz_gesture::{ReplayOutcome, SessionScript, replay};
use pz_render::RenderFrame;
use serde::Serialize;
use tracing::{debug, info};

/// panzoom CLI - fit images, inspect clamp bounds and replay gesture sessions.
#[derive(Debug, Parser)]
#[command(
    name = "pz-cli",
    version,
    about = "panzoom CLI - fit images, inspect clamp bounds and replay gesture sessions",
    long_about = "Drives the panzoom viewport engine without a browser.\n\n\
        Computes fit-to-viewport transforms, reports clamp bounds, and replays\n\
        recorded drag, pinch, wheel and slider sessions."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (can be repeated for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute the fit scale and centered position.
    Fit {
        /// Viewport size as WIDTHxHEIGHT
        #[arg(long, value_parser = parse_dimensions)]
        viewport: Size,

        /// Natural image size as WIDTHxHEIGHT
        #[arg(long, value_parser = parse_dimensions)]
        image: Size,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the legal position range at a scale.
    Bounds {
        /// Viewport size as WIDTHxHEIGHT
        #[arg(long, value_parser = parse_dimensions)]
        viewport: Size,

        /// Natural image size as WIDTHxHEIGHT
        #[arg(long, value_parser = parse_dimensions)]
        image: Size,

        /// Scale to evaluate the bounds at
        #[arg(long)]
        scale: f64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay a JSON session script.
    Replay {
        /// Script file path or "-" for stdin. Inline JSON is accepted too.
        #[arg(default_value = "-")]
        input: String,

        /// TOML file with viewer configuration overrides
        #[arg(short, long)]
        config: Option<String>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Include the state after every event
        #[arg(long)]
        trace: bool,
    },

    /// Print the effective viewer configuration as JSON.
    Config {
        /// TOML file with viewer configuration overrides
        #[arg(short, long)]
        config: Option<String>,
    },
}

/// Result of the `fit` command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FitResult {
    viewport: Size,
    image: Size,
    min_scale: f64,
    position: Point,
    bounds: PositionBounds,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BoundsResult {
    viewport: Size,
    image: Size,
    scale: f64,
    bounds: PositionBounds,
    slack: Size,
}

/// Result of the `replay` command.
#[derive(Debug, Serialize)]
struct ReplayResult {
    #[serde(flatten)]
    outcome: ReplayOutcome,
    frame: RenderFrame,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Fit {
            viewport,
            image,
            json,
        } => cmd_fit(viewport, image, json),

        Command::Bounds {
            viewport,
            image,
            scale,
            json,
        } => cmd_bounds(viewport, image, scale, json),

        Command::Replay {
            input,
            config,
            pretty,
            trace,
        } => cmd_replay(&input, config.as_deref(), pretty, trace),

        Command::Config { config } => cmd_config(config.as_deref()),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

fn load_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else if Path::new(input).exists() {
        std::fs::read_to_string(input).context(format!("Failed to read file: {input}"))
    } else {
        // Treat as inline script text
        Ok(input.to_string())
    }
}

fn load_config(path: Option<&str>) -> Result<ViewerConfig> {
    let Some(path) = path else {
        return Ok(ViewerConfig::default());
    };
    let contents =
        std::fs::read_to_string(path).context(format!("Failed to read config: {path}"))?;
    let config: ViewerConfig =
        toml::from_str(&contents).context(format!("Invalid viewer config: {path}"))?;

    let errors = config.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!("Invalid viewer config {path}: {}", messages.join("; "));
    }
    info!("Loaded viewer config from: {path}");
    Ok(config)
}

fn parse_dimensions(raw: &str) -> Result<Size, String> {
    let (width, height) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{raw}'"))?;
    let width: f64 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{width}'"))?;
    let height: f64 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{height}'"))?;
    Ok(Size::new(width, height))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{output}");
    Ok(())
}

// =============================================================================
// Command: fit
// =============================================================================

fn cmd_fit(viewport: Size, image: Size, json_output: bool) -> Result<()> {
    let geometry = ViewportGeometry::new(viewport, image);
    let fitted = fit(&geometry).context("Cannot fit image into viewport")?;
    let bounds = position_bounds(&geometry, fitted.min_scale)?;
    debug!(min_scale = fitted.min_scale, "computed fit");

    if json_output {
        let result = FitResult {
            viewport,
            image,
            min_scale: fitted.min_scale,
            position: fitted.position,
            bounds,
        };
        print_json(&result, true)?;
    } else {
        println!("Min scale: {}", fitted.min_scale);
        println!(
            "Position:  ({}, {})",
            fitted.position.x, fitted.position.y
        );
        println!(
            "Bounds:    x [{}, {}]  y [{}, {}]",
            bounds.x_min, bounds.x_max, bounds.y_min, bounds.y_max
        );
    }

    Ok(())
}

// =============================================================================
// Command: bounds
// =============================================================================

fn cmd_bounds(viewport: Size, image: Size, scale: f64, json_output: bool) -> Result<()> {
    let geometry = ViewportGeometry::new(viewport, image);
    let bounds = position_bounds(&geometry, scale).context("Cannot compute bounds")?;

    if json_output {
        let result = BoundsResult {
            viewport,
            image,
            scale,
            bounds,
            slack: bounds.slack(),
        };
        print_json(&result, true)?;
    } else {
        println!("Scale: {scale}");
        println!("x:     [{}, {}]", bounds.x_min, bounds.x_max);
        println!("y:     [{}, {}]", bounds.y_min, bounds.y_max);
    }

    Ok(())
}

// =============================================================================
// Command: replay
// =============================================================================

fn cmd_replay(input: &str, config: Option<&str>, pretty: bool, trace: bool) -> Result<()> {
    let config = load_config(config)?;
    let source = load_input(input)?;
    let script: SessionScript =
        serde_json::from_str(&source).context("Invalid session script")?;
    info!(
        events = script.events.len(),
        "Replaying session against {}x{} viewport",
        script.viewport.width,
        script.viewport.height
    );

    let outcome = replay(&script, config.clone(), trace).context("Replay failed")?;
    let frame = RenderFrame::new(&outcome.state, script.image, &config);

    print_json(&ReplayResult { outcome, frame }, pretty)
}

// =============================================================================
// Command: config
// =============================================================================

fn cmd_config(config: Option<&str>) -> Result<()> {
    let config = load_config(config)?;
    print_json(&config, true)
}
