//! UniRig CLI
//!
//! Compile workflow requests to engine graphs offline, check saved graphs,
//! and run an endpoint's extractor over a saved engine result.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use serde_json::{json, Value};
use std::io::Read;
use std::path::Path;
use unirig_core::Timestamp;
use unirig_graph::{IntegrityChecker, NodeGraph};
use unirig_schema::SchemaValidator;
use unirig_workflow::{CompiledWorkflow, EndpointDescriptor, EndpointRegistry, EngineResult, Method};

#[derive(Parser)]
#[command(name = "unirig")]
#[command(about = "UniRig workflow compiler tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered endpoints
    Endpoints,
    /// Validate a request and print the compiled graph
    Compile {
        /// Endpoint path, e.g. /workflow/rig-avatar
        #[arg(short, long)]
        endpoint: String,
        /// Request JSON file, or - for stdin
        #[arg(short, long)]
        request: String,
        /// Instant used for time-derived defaults (RFC 3339)
        #[arg(long)]
        now: Option<String>,
    },
    /// Run the integrity checker over a graph file
    Check {
        /// Graph JSON file, or - for stdin
        #[arg(short, long)]
        graph: String,
    },
    /// Compile a request, then extract its response from a saved engine result
    Extract {
        /// Endpoint path
        #[arg(short, long)]
        endpoint: String,
        /// Request JSON file
        #[arg(short, long)]
        request: String,
        /// Engine result JSON file
        #[arg(long)]
        result: String,
        /// Instant used for time-derived defaults (RFC 3339)
        #[arg(long)]
        now: Option<String>,
    },
}

fn read_json(source: &str) -> Result<Value> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).wrap_err("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(Path::new(source)).wrap_err_with(|| format!("failed to read {source}"))?
    };
    serde_json::from_str(&text).wrap_err_with(|| format!("{source} is not valid JSON"))
}

fn timestamp(now: Option<&str>) -> Result<Timestamp> {
    match now {
        Some(raw) => Timestamp::parse_rfc3339(raw).map_err(|e| eyre!("--now: {e}")),
        None => Ok(Timestamp::now()),
    }
}

fn endpoint<'a>(registry: &'a EndpointRegistry, path: &str) -> Result<&'a EndpointDescriptor> {
    registry
        .get(Method::Post, path)
        .ok_or_else(|| eyre!("unknown endpoint {path}"))
}

fn list_endpoints(registry: &EndpointRegistry) -> String {
    registry
        .iter()
        .map(|d| format!("{:<5} {:<26} {}", d.method.as_str(), d.path, d.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

fn compile(registry: &EndpointRegistry, path: &str, request: &Value, now: Timestamp) -> Result<CompiledWorkflow> {
    let descriptor = endpoint(registry, path)?;
    Ok(descriptor.compile(&SchemaValidator::new(), request, now)?)
}

fn check(graph: Value) -> Result<NodeGraph> {
    let graph: NodeGraph = serde_json::from_value(graph).wrap_err("not a node graph")?;
    if let Err(defects) = IntegrityChecker::new().check(&graph) {
        let lines: Vec<String> = defects.iter().map(|d| format!("  - {d}")).collect();
        return Err(eyre!("{} defect(s):\n{}", defects.len(), lines.join("\n")));
    }
    Ok(graph)
}

fn extract(registry: &EndpointRegistry, path: &str, request: &Value, result: Value, now: Timestamp) -> Result<Value> {
    let descriptor = endpoint(registry, path)?;
    let workflow = descriptor.compile(&SchemaValidator::new(), request, now)?;
    let result: EngineResult = serde_json::from_value(result).wrap_err("not an engine result")?;
    let output = descriptor.extract(&result, &workflow)?;
    Ok(serde_json::to_value(output)?)
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("unirig=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = EndpointRegistry::standard()?;

    match cli.command {
        Commands::Endpoints => {
            println!("{}", list_endpoints(&registry));
        }
        Commands::Compile { endpoint, request, now } => {
            let workflow = compile(&registry, &endpoint, &read_json(&request)?, timestamp(now.as_deref())?)?;
            let out = json!({
                "endpoint": workflow.endpoint,
                "terminal": workflow.terminal,
                "graph": workflow.graph,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Check { graph } => {
            let graph = check(read_json(&graph)?)?;
            println!("ok: {} nodes, sinks {:?}", graph.len(), graph.sinks());
        }
        Commands::Extract {
            endpoint,
            request,
            result,
            now,
        } => {
            let output = extract(
                &registry,
                &endpoint,
                &read_json(&request)?,
                read_json(&result)?,
                timestamp(now.as_deref())?,
            )?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
