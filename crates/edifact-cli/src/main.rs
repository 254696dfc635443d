//! # edifact-cli
//!
//! Command-line shell for the EDIFACT parser: reads one or more
//! interchanges, converts them to JSON and reports failures per input item.

mod config;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edifact_ir::Interchange;
use edifact_parser::{EdifactParser, EdifactSerializer, SerializerConfig};
use edifact_spec::DirectorySpecificationStore;
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, FileConfig, FlagOverrides, InputType, Settings};

const EXIT_FAILURE: u8 = 1;
const EXIT_CONFIG: u8 = 3;

#[derive(Parser)]
#[command(name = "edifact")]
#[command(about = "UN/EDIFACT interchange parser")]
#[command(version)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Suppress log output and the summary line
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert interchanges to JSON
    Parse {
        /// Input files, `-` for stdin
        #[arg(required = true)]
        inputs: Vec<String>,

        #[command(flatten)]
        options: InputOptions,

        /// Directory of message specifications used to annotate messages
        #[arg(long)]
        spec_dir: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Rewrite an interchange with one segment per line
    Normalize {
        /// Input file, `-` for stdin
        input: String,

        #[command(flatten)]
        options: InputOptions,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Clone, Default)]
struct InputOptions {
    /// How input bytes are decoded
    #[arg(long, value_enum)]
    input_type: Option<InputType>,

    /// Documents carry no UNA; use `--delimiters` instead
    #[arg(long)]
    no_una: bool,

    /// Service characters for documents without UNA, e.g. ":+.? '"
    #[arg(long, allow_hyphen_values = true)]
    delimiters: Option<String>,
}

/// JSON shape written for each converted item
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConvertedItem {
    edifact_json: Interchange,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            if err.downcast_ref::<ConfigError>().is_some() {
                ExitCode::from(EXIT_CONFIG)
            } else {
                ExitCode::from(EXIT_FAILURE)
            }
        }
    }
}

fn init_logging(quiet: bool) {
    // Without a subscriber the libraries stay silent
    if quiet {
        return;
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let file_config = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    match cli.command {
        Commands::Parse {
            inputs,
            options,
            spec_dir,
            pretty,
        } => {
            let settings = Settings::resolve(
                file_config,
                FlagOverrides {
                    spec_dir,
                    pretty,
                    ..options.into_overrides()
                },
            )?;
            parse_command(&inputs, &settings, cli.quiet).await
        }
        Commands::Normalize {
            input,
            options,
            output,
        } => {
            let settings = Settings::resolve(file_config, options.into_overrides())?;
            normalize_command(&input, &settings, output).await
        }
    }
}

impl InputOptions {
    fn into_overrides(self) -> FlagOverrides {
        FlagOverrides {
            no_una: self.no_una,
            delimiters: self.delimiters,
            input_type: self.input_type,
            ..FlagOverrides::default()
        }
    }
}

fn build_parser(settings: &Settings) -> EdifactParser {
    let mut parser = EdifactParser::new();
    if let Some(separators) = settings.separators {
        parser = parser.with_separators(separators);
    }
    if let Some(dir) = &settings.spec_dir {
        tracing::info!("Using message specifications from {}", dir.display());
        parser = parser.with_store(Arc::new(DirectorySpecificationStore::new(dir)));
    }
    parser
}

async fn read_input(input: &str, input_type: InputType) -> Result<String> {
    let bytes = if input == "-" {
        let mut buffer = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buffer)
            .await
            .context("Failed to read stdin")?;
        buffer
    } else {
        tokio::fs::read(input)
            .await
            .with_context(|| format!("Failed to read {input}"))?
    };
    input_type.decode(bytes, input)
}

async fn parse_command(inputs: &[String], settings: &Settings, quiet: bool) -> Result<()> {
    let parser = build_parser(settings);

    let mut handles = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.iter().enumerate() {
        let text = read_input(input, settings.input_type)
            .await
            .with_context(|| format!("Failed to convert EDIFACT to JSON: {input} (item {index})"))?;
        let parser = parser.clone();
        tracing::debug!(input = %input, item = index, "Parsing");
        handles.push(tokio::task::spawn_blocking(move || parser.parse(&text)));
    }

    let mut items = Vec::with_capacity(handles.len());
    for (index, (input, handle)) in inputs.iter().zip(handles).enumerate() {
        let interchange = handle
            .await
            .context("Parse task panicked")?
            .with_context(|| format!("Failed to convert EDIFACT to JSON: {input} (item {index})"))?;
        items.push(ConvertedItem {
            edifact_json: interchange,
        });
    }

    if !quiet {
        let messages: usize = items.iter().map(|i| i.edifact_json.message_count()).sum();
        eprintln!(
            "Parse summary: interchanges={}, messages={messages}",
            items.len()
        );
    }

    let json = match items.as_slice() {
        [single] => to_json(single, settings.pretty)?,
        _ => to_json(&items, settings.pretty)?,
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

async fn normalize_command(input: &str, settings: &Settings, output: Option<PathBuf>) -> Result<()> {
    let text = read_input(input, settings.input_type).await?;
    let parser = build_parser(settings);
    let interchange = tokio::task::spawn_blocking(move || parser.parse(&text))
        .await
        .context("Parse task panicked")?
        .with_context(|| format!("Failed to parse {input}"))?;

    let serializer = EdifactSerializer::new(SerializerConfig {
        segment_newline: true,
        ..SerializerConfig::default()
    });
    match output {
        Some(path) => {
            let file = std::fs::File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            serializer.write(file, &interchange)?;
            tracing::info!("Wrote {}", path.display());
        }
        None => serializer.write(std::io::stdout().lock(), &interchange)?,
    }
    Ok(())
}
