//! # Vectra CLI
//!
//! Usage:
//!   vectra grid rects.json --canvas-width 1200
//!   echo '[{...}]' | vectra snap - --x 10 --y 20 --w 100 --h 40
//!   vectra compile Card.tsx -o Card.js
//!   vectra export project.json -o Component.jsx
//!   vectra example > rects.json

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::Level;

use vectra::export::{Compiler, ReactExporter, TsxCompiler};
use vectra::model::parse_rects;
use vectra::{absolute_to_grid, EngineConfig, SnapQuery, SnappingIndex, VectraError};

#[derive(Parser)]
#[command(name = "vectra", version, about = "Layout compute engine for a visual page builder")]
struct Cli {
    /// Engine configuration (JSON). Defaults apply to anything omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write output here instead of stdout.
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Infer a CSS grid from a JSON rect list.
    Grid {
        /// Rect list file, or `-` for stdin.
        input: PathBuf,
        #[arg(long, default_value_t = 1200.0)]
        canvas_width: f64,
        /// Also print fr-unit templates.
        #[arg(long)]
        fr: bool,
    },
    /// Snap a dragged box against a JSON rect list.
    Snap {
        input: PathBuf,
        #[arg(long, allow_negative_numbers = true)]
        x: f64,
        #[arg(long, allow_negative_numbers = true)]
        y: f64,
        #[arg(long)]
        w: f64,
        #[arg(long)]
        h: f64,
        #[arg(long, default_value_t = 5.0)]
        threshold: f64,
        /// Print every candidate instead of the resolved position.
        #[arg(long)]
        all: bool,
    },
    /// Compile a TSX component to JavaScript.
    Compile { input: PathBuf },
    /// Export a project subtree as a React component.
    Export { input: PathBuf },
    /// Print a sample rect list.
    Example,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(out) => {
            if let Err(e) = write_output(cli.output.as_deref(), &out) {
                eprintln!("✗ Failed to write output: {}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<String, CliError> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json(&read_input(path)?)?,
        None => EngineConfig::default(),
    };

    match &cli.command {
        Command::Grid {
            input,
            canvas_width,
            fr,
        } => {
            let rects = parse_rects(&read_input(input)?)?;
            let layout = absolute_to_grid(&rects, *canvas_width, &config.grid)?;
            let mut out = serde_json::to_string_pretty(&layout).map_err(VectraError::from)?;
            if *fr {
                out.push_str(&format!(
                    "\ngrid-template-columns: {};\ngrid-template-rows: {};",
                    layout.fractional_columns(),
                    layout.fractional_rows()
                ));
            }
            Ok(out)
        }
        Command::Snap {
            input,
            x,
            y,
            w,
            h,
            threshold,
            all,
        } => {
            let mut index = SnappingIndex::with_config(&config.snapping)?;
            index.update_rects(parse_rects(&read_input(input)?)?)?;
            let query = SnapQuery::new(*x, *y, *w, *h, *threshold);
            let out = if *all {
                serde_json::to_string_pretty(&index.query_snapping(&query))
            } else {
                serde_json::to_string_pretty(&index.snap(&query))
            };
            Ok(out.map_err(VectraError::from)?)
        }
        Command::Compile { input } => Ok(TsxCompiler.compile(&read_input(input)?)?),
        Command::Export { input } => Ok(ReactExporter.compile(&read_input(input)?)?),
        Command::Example => Ok(example_rects_json().to_string()),
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Failed to read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error(transparent)]
    Engine(#[from] VectraError),
}

fn read_input(path: &Path) -> Result<String, CliError> {
    let result = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map(|_| buf)
    } else {
        fs::read_to_string(path)
    };
    result.map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })
}

fn write_output(path: Option<&Path>, out: &str) -> io::Result<()> {
    match path {
        Some(path) => {
            fs::write(path, out)?;
            eprintln!("✓ Written {} bytes to {}", out.len(), path.display());
            Ok(())
        }
        None => {
            println!("{}", out);
            Ok(())
        }
    }
}

fn example_rects_json() -> &'static str {
    r##"[
  { "id": "header",  "x": 0,   "y": 0,   "w": 960, "h": 80  },
  { "id": "sidebar", "x": 0,   "y": 80,  "w": 240, "h": 560 },
  { "id": "hero",    "x": 240, "y": 80,  "w": 720, "h": 320 },
  { "id": "card-1",  "x": 240, "y": 400, "w": 360, "h": 240 },
  { "id": "card-2",  "x": 600, "y": 400, "w": 360, "h": 240 },
  { "id": "footer",  "x": 0,   "y": 640, "w": 960, "h": 60  }
]"##
}
