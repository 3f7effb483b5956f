use std::path::PathBuf;

use anyhow::{bail, Context};
use chart_scraping::{
    api::ChartClient,
    config::Config,
    pipeline::{Pipeline, RunOutcome},
    schema::ChartKind,
    store::rest::RestStore,
};
use chart_scraping_utils::fs_json_util::write_json;
use clap::Parser;
use log::{error, info, warn};
use strum::IntoEnumIterator;

#[derive(Parser)]
struct Opts {
    /// Charts to scrape, in order. All of them when omitted.
    #[arg(value_enum)]
    charts: Vec<ChartKind>,
    /// Also write every persisted batch to this directory as JSON.
    #[arg(long)]
    dump_dir: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
    let opts = Opts::parse();

    let config = Config::from_env().context("Failed to load the store configuration")?;
    let client = ChartClient::new(config.fetch_timeout)?;
    let store = RestStore::new(&config)?;
    let pipeline = Pipeline::builder()
        .source(&client)
        .store(&store)
        .today(chrono::Local::now().date_naive())
        .build();

    let charts = if opts.charts.is_empty() {
        ChartKind::iter().collect()
    } else {
        opts.charts
    };
    let mut failed = vec![];
    for chart in charts {
        match pipeline.run(chart).await {
            Ok(RunOutcome::Persisted {
                chart_date,
                entries,
            }) => {
                if let Some(dir) = &opts.dump_dir {
                    let path = dir.join(format!("{}-{chart_date}.json", chart.collection()));
                    if let Err(e) = write_json(path, &entries) {
                        warn!("Could not dump {chart}: {e:#}");
                    }
                }
            }
            Ok(RunOutcome::Aborted { chart_date, reason }) => {
                info!("Skipped {chart} ({chart_date}): {reason}");
            }
            Err(e) => {
                error!("{chart} failed: {e:#}");
                if e.is_persistence() {
                    failed.push(chart);
                }
            }
        }
    }
    if !failed.is_empty() {
        bail!("Could not persist {}", itertools::join(&failed, ", "));
    }
    Ok(())
}
