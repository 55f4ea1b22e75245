//! runrequests binary entry point

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use url::Url;

use runner::services::{load_queries, load_template, FileArtifactStore, HttpTransport, StdoutReporter};
use runner::{Dispatcher, ResponseFields, RunConfig, RunMode};

#[derive(Parser, Debug)]
#[command(name = "runrequests")]
#[command(about = "Expand a request template against a list of queries and run the requests")]
struct Args {
    /// Request template: a JSON array holding one request
    #[arg(long, value_name = "FILE")]
    request: PathBuf,

    /// Queries to expand, one per line (a single empty query if omitted)
    #[arg(long, alias = "expand-query", value_name = "FILE")]
    queries: Option<PathBuf>,

    /// Base URL for relative request URLs
    #[arg(short, long, value_name = "URL")]
    base: Option<Url>,

    /// Maximum number of requests in flight
    #[arg(short, long, default_value_t = 1)]
    parallelism: usize,

    /// Directory for artifacts of found responses
    #[arg(long, value_name = "DIR")]
    write_responses: Option<PathBuf>,

    /// Expand and fingerprint without sending anything
    #[arg(long)]
    dry_run: bool,

    /// Print the expanded request with this fingerprint (implies --dry-run)
    #[arg(long, value_name = "FINGERPRINT")]
    dump_request: Option<String>,

    /// Send only the request with this fingerprint and print its response
    #[arg(long, value_name = "FINGERPRINT", conflicts_with = "dump_request")]
    dump_response: Option<String>,

    /// Location of the result count in a response
    #[arg(long, default_value = "$.response.numFound")]
    count_path: String,

    /// Location of the highlights in a response
    #[arg(long, default_value = "$.highlighting")]
    highlights_path: String,

    /// Location of the hit regions in a response
    #[arg(long, default_value = "$.hitregions")]
    hitregions_path: String,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    shared::logging::init_tracing_with_level(Some(&args.log_level))?;
    shared::logging::log_startup(&format!("runrequests with template {}", args.request.display()));

    let template = load_template(&args.request, args.base.as_ref())
        .await
        .with_context(|| format!("Failed to load request template {}", args.request.display()))?;

    let queries = load_queries(args.queries.as_deref())
        .await
        .with_context(|| match &args.queries {
            Some(path) => format!("Failed to read queries from {}", path.display()),
            None => "Failed to read queries".to_string(),
        })?;

    let response_fields = ResponseFields::parse(&args.count_path, &args.highlights_path, &args.hitregions_path)?;

    if let Some(dir) = &args.write_responses {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let mode = if args.dry_run { RunMode::DryRun } else { RunMode::Live };
    let config = RunConfig::new(template, queries)
        .with_parallelism(args.parallelism)
        .with_output_dir(args.write_responses)
        .with_mode(mode)
        .with_dump_request(args.dump_request)
        .with_dump_response(args.dump_response)
        .with_response_fields(response_fields);

    // Create service implementations
    let transport = HttpTransport::new()?;
    let store = FileArtifactStore::new();
    let reporter = StdoutReporter::new();

    // Create dispatcher with dependency injection
    let dispatcher = Dispatcher::new(config, transport, store, reporter)?;
    let summary = dispatcher.run().await?;

    shared::logging::log_summary(&summary);
    Ok(())
}
