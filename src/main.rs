use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use prospect_intel::app::ranked_companies::{
    validate_rank_matches_score_order, validate_segment_rank_contiguity,
};
use prospect_intel::app::{
    ranked_view, CompanyDetailUseCase, DataAccess, DatasetFilter, StartupUseCase,
};
use prospect_intel::config::Config;
use prospect_intel::domain::SegmentCode;
use prospect_intel::observability::{self, init_logging};
use prospect_intel::pipeline::DataRoot;

#[derive(Parser)]
#[command(name = "prospect_intel")]
#[command(about = "Validate and rank prospect intelligence artifacts")]
#[command(version = "0.1.0")]
struct Cli {
    /// Data root; overrides PROSPECT_DATA_DIR and the configured default
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to ./prospect.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every core artifact and run the quality gates
    Validate {
        /// Print the gate report as JSON
        #[arg(long)]
        json: bool,
        /// Print Prometheus metrics after the run
        #[arg(long)]
        emit_metrics: bool,
    },
    /// Print the ranked companies view
    Rankings {
        /// Only these segments (comma-separated NAICS codes)
        #[arg(long)]
        segment: Option<String>,
        /// Only companies from this source
        #[arg(long)]
        source: Option<String>,
        /// Show at most this many rows
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Print everything known about one company
    Company {
        /// Company identifier; zero-padding is ignored
        id: String,
    },
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let _guard = init_logging(&config.logging.directory);

    let root = DataRoot::resolve(cli.data_dir.as_deref(), &config.data.default_root)?;
    let mut access = DataAccess::new(root, config.cache.ttl());

    match cli.command {
        Commands::Validate { json, emit_metrics } => {
            if emit_metrics {
                observability::init().map_err(|e| anyhow!("{}", e))?;
            }

            let startup = StartupUseCase::with_config(config.quality_gates.clone());
            let validated = startup.run(&mut access)?;
            validate_segment_rank_contiguity(&validated.scored)?;
            validate_rank_matches_score_order(&validated.scored)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&validated.report)?);
            } else {
                println!("✅ Blocking gates passed");
                for result in &validated.report.blocking {
                    println!("   {}: {}", result.gate.name(), result.status);
                }
                for result in &validated.report.advisory {
                    let metric = result
                        .metric
                        .map_or_else(|| "n/a".to_string(), |m| format!("{:.3}", m));
                    let mark = if result.passed { "✅" } else { "⚠️ " };
                    println!("{} {} ({})", mark, result.gate.name(), metric);
                    if let Some(detail) = &result.detail {
                        println!("   {}", detail);
                    }
                }
                println!(
                    "📊 {} companies, {} buildings, {} scored",
                    validated.companies.len(),
                    validated.buildings.len(),
                    validated.scored.table.len()
                );
            }

            if emit_metrics {
                if let Some(rendered) = observability::render() {
                    println!("{}", rendered);
                }
            }
        }
        Commands::Rankings {
            segment,
            source,
            limit,
            json,
        } => {
            let scored = access.scored_companies()?;
            let filter = DatasetFilter {
                segments: segment
                    .as_deref()
                    .map(|s| s.split(',').filter_map(SegmentCode::parse).collect())
                    .unwrap_or_default(),
                source,
                ..DatasetFilter::default()
            };
            let filtered = scored.with_table(filter.apply(&scored.table));

            let penetration = match access.penetration() {
                Ok(table) => Some(table),
                Err(e) => {
                    warn!(error = %e, "Penetration unavailable; rankings shown without it");
                    None
                }
            };

            let mut rows = ranked_view(&filtered, penetration.as_deref());
            if let Some(limit) = limit {
                rows.truncate(limit);
            }
            info!(rows = rows.len(), "Ranked view built");

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in &rows {
                    println!(
                        "{:>5}  {:>4}  {:<12} {:<40} {:>8}",
                        row.global_rank,
                        row.segment_rank.map_or_else(|| "-".to_string(), |r| r.to_string()),
                        row.company_id,
                        row.company_name.as_deref().unwrap_or("N/A"),
                        row.score.map_or_else(|| "N/A".to_string(), |s| format!("{:.3}", s)),
                    );
                }
            }
        }
        Commands::Company { id } => {
            let detail = CompanyDetailUseCase::load(&mut access, &id)?
                .with_context(|| format!("Company ID '{}' not found in data", id))?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
    }
    Ok(())
}
