use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use accessor_template::context::{Options, Substitution};
use accessor_template::diagnostics::{DiagnosticSink, TracingSink};
use accessor_template::errors::Result;
use accessor_template::functions::Registry;
use accessor_template::{decode, Diagnostic, DiagnosticCollector, Engine};

/// Resolve accessor definitions and render templates against JSON.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Register the builtin functions (json, lower, upper, escape_xml, escape_tags)
    #[arg(long, global = true)]
    builtins: bool,
    /// Rendering options as JSON, e.g. '{"undefined_text":""}'
    #[arg(long, global = true)]
    config: Option<String>,
    /// More log output (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a template against a JSON document
    Render {
        /// JSON document, `@file` to read a file or `-` for stdin
        json: String,
        /// Template, e.g. '<a href="%(links:href[rel=self])">%(name)</a>'
        template: String,
        /// Accessor for the result list inside the document, e.g. '%(hits)';
        /// every item is rendered on its own line
        #[arg(long)]
        results: Option<String>,
        /// Progressive replace-all substitution
        #[arg(long)]
        legacy: bool,
        /// Fail if any error diagnostic was reported
        #[arg(long)]
        strict: bool,
    },
    /// Resolve a single accessor definition
    Resolve {
        /// JSON document, `@file` to read a file or `-` for stdin
        json: String,
        /// Accessor definition, e.g. '%(type.id)'
        definition: String,
        /// Fail if any error diagnostic was reported
        #[arg(long)]
        strict: bool,
    },
    /// Show how the accessor definitions of a text are decoded
    Decode {
        text: String,
    },
}

/// Logs through `tracing` and keeps a copy for `--strict`.
struct CliSink {
    collected: DiagnosticCollector,
}

impl DiagnosticSink for CliSink {
    fn report(&self, diagnostic: Diagnostic) {
        TracingSink.report(diagnostic.clone());
        self.collected.report(diagnostic);
    }
}

fn main() -> ExitCode {
    // Parse CLI arguments.
    let args = Args::parse();

    let default_filter = match args.verbose {
        0 => "actpl=warn,accessor_template=warn",
        1 => "actpl=debug,accessor_template=debug",
        _ => "actpl=trace,accessor_template=trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let mut opts = match args.config.as_deref() {
        Some(json) => Options::from_json(json)?,
        None => Options::default(),
    };
    let registry = if args.builtins {
        Registry::with_builtins()
    } else {
        Registry::new()
    };
    let collected = DiagnosticCollector::new();
    let sink = Arc::new(CliSink {
        collected: collected.clone(),
    });

    let strict = match args.command {
        Command::Render {
            json,
            template,
            results,
            legacy,
            strict,
        } => {
            if legacy {
                opts.substitution = Substitution::ReplaceAll;
            }
            let engine = Engine::new(registry).with_sink(sink).with_options(opts);
            let data = read_json(&json)?;
            for line in engine.render_each(&data, results.as_deref(), &template)? {
                println!("{line}");
            }
            strict
        }
        Command::Resolve {
            json,
            definition,
            strict,
        } => {
            let engine = Engine::new(registry).with_sink(sink).with_options(opts);
            let data = read_json(&json)?;
            let value = engine.resolve(&data, &definition)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
            strict
        }
        Command::Decode { text } => {
            let decoded: Map<String, Value> = decode(&text)
                .iter()
                .map(|(token, path)| -> Result<(String, Value)> {
                    Ok((token.to_string(), serde_json::to_value(path)?))
                })
                .collect::<Result<_>>()?;
            println!("{}", serde_json::to_string_pretty(&decoded)?);
            false
        }
    };

    if strict && collected.has_errors() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Inline JSON, `@path` for a file, or `-` for stdin.
fn read_json(arg: &str) -> Result<Value> {
    let text = if arg == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else if let Some(file) = arg.strip_prefix('@') {
        std::fs::read_to_string(file)?
    } else {
        arg.to_string()
    };
    accessor_template::from_json(&text)
}
