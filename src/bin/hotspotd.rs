use chrono::Utc;
use clap::Parser;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::{path::PathBuf, time::Duration};
use wildspot::{AggregationConfig, AggregationRun, HotspotsDatabase, WildSpotResult};

/*-------------------------------------------------------------------------------------------------
 *                                     Command Line Options
 *-----------------------------------------------------------------------------------------------*/

///
/// Periodically aggregate sighting reports into hotspots.
///
/// This daemon runs the aggregation pass immediately on startup and then again on a fixed
/// cadence. A failed pass is logged and the next tick retries naturally; nothing partial is
/// ever committed.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "hotspotd")]
#[clap(author, version, about)]
struct HotspotdOptions {
    /// The path to the hotspots database file.
    ///
    /// If this is not specified, then the program will check for it in the "HOTSPOT_DB"
    /// environment variable.
    #[clap(short, long)]
    #[clap(env = "HOTSPOT_DB")]
    store_file: PathBuf,

    /// Minutes between aggregation passes.
    #[clap(short, long, default_value_t = 60)]
    interval_minutes: u64,

    /// How many hours of reports each pass considers.
    #[clap(short, long, default_value_t = wildspot::DEFAULT_LOOKBACK_HOURS)]
    lookback_hours: i64,

    /// Grid cell size in meters.
    #[clap(short, long, default_value_t = wildspot::DEFAULT_CELL_SIZE_METERS)]
    cell_size_meters: f64,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

/*-------------------------------------------------------------------------------------------------
 *                                             Main
 *-----------------------------------------------------------------------------------------------*/
fn main() -> WildSpotResult<()> {
    let opts = HotspotdOptions::parse();

    let level = if opts.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .with_module_level("wildspot", level)
        .with_module_level("hotspotd", level)
        .init()?;

    HotspotsDatabase::initialize(&opts.store_file)?;
    let db = HotspotsDatabase::connect(&opts.store_file)?;

    let config = AggregationConfig {
        cell_size_meters: opts.cell_size_meters,
        lookback_hours: opts.lookback_hours,
        ..AggregationConfig::default()
    };
    let runner = AggregationRun::new(&db, config);

    log::info!(
        "Aggregating {} every {} minutes (lookback {} h, cell {} m)",
        opts.store_file.display(),
        opts.interval_minutes,
        opts.lookback_hours,
        opts.cell_size_meters
    );

    let ticker = crossbeam_channel::tick(Duration::from_secs(opts.interval_minutes * 60));

    loop {
        match runner.run_scheduled(Utc::now()) {
            Ok(summary) => log::info!(
                "Pass complete: {} reports, {} hotspots",
                summary.reports_processed,
                summary.hotspots_updated
            ),
            // Leave recovery to the next tick.
            Err(err) => log::error!("Aggregation pass failed: {}", err),
        }

        ticker.recv()?;
    }
}
