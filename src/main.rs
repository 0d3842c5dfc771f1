use anyhow::Context;
use clap::Parser;
use std::sync::Arc;

use workflow_placement::api::request_dto::RawDocument;
use workflow_placement::domain::utils::statistics::StatsCollector;
use workflow_placement::loader::parser::{parse_json_file, write_json};
use workflow_placement::{build_planner, load_config, logger};

/// Decides where pending workflows may run and how many input replicas
/// they need.
#[derive(Debug, Parser)]
#[command(name = "workflow-placement", version)]
struct Args {
    /// Planner configuration (JSON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<String>,

    /// JSON array of raw request documents.
    #[arg(long)]
    requests: String,

    /// Site directory (JSON).
    #[arg(long)]
    sites: String,

    /// Serve every lookup from this snapshot instead of the live services.
    #[arg(long)]
    snapshot: Option<String>,

    /// Where to write the plans; stdout when omitted.
    #[arg(long)]
    output: Option<String>,

    /// CSV file for per-workflow statistics.
    #[arg(long)]
    stats: Option<String>,

    /// Reduce each allowed-site list to one representative site.
    #[arg(long)]
    pick_one: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init();

    let mut config = load_config(args.config.as_deref()).context("loading planner configuration")?;
    if args.pick_one {
        config.pick_one = true;
    }

    let requests: Vec<RawDocument> = parse_json_file(&args.requests).with_context(|| format!("reading requests from '{}'", args.requests))?;
    log::info!("Loaded {} requests from '{}'.", requests.len(), args.requests);

    let mut planner = build_planner(&config, &args.sites, args.snapshot.as_deref()).context("building planner")?;

    let stats = match &args.stats {
        Some(path) => Some(Arc::new(StatsCollector::init(Some(path)).with_context(|| format!("creating statistics file '{}'", path))?)),
        None => None,
    };
    if let Some(stats) = &stats {
        planner = planner.with_stats(stats.clone());
    }

    let report = planner.plan(requests).await;
    for warning in &report.warnings {
        log::warn!("{}", warning);
    }
    log::info!("Planned {} workflows with {} warnings.", report.plans.len(), report.warnings.len());

    write_json(&report, args.output.as_deref()).context("writing plans")?;

    // Last handle: flushes the statistics file.
    drop(planner);
    drop(stats);
    Ok(())
}
