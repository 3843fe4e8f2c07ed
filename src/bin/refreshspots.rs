use chrono::Utc;
use clap::Parser;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::path::PathBuf;
use wildspot::{AggregationConfig, AggregationRun, Caller, HotspotsDatabase, WildSpotResult};

/*-------------------------------------------------------------------------------------------------
 *                                     Command Line Options
 *-----------------------------------------------------------------------------------------------*/

///
/// Run one aggregation pass on demand.
///
/// This is the on demand trigger surface: it requires an authenticated caller identity and
/// otherwise behaves exactly like a scheduled pass. Without --user the run is rejected before
/// anything is fetched.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "refreshspots")]
#[clap(author, version, about)]
struct RefreshSpotsOptions {
    /// The path to the hotspots database file.
    ///
    /// If this is not specified, then the program will check for it in the "HOTSPOT_DB"
    /// environment variable.
    #[clap(short, long)]
    #[clap(env = "HOTSPOT_DB")]
    store_file: PathBuf,

    /// The authenticated caller identity.
    #[clap(short, long)]
    user: Option<String>,

    /// How many hours of reports the pass considers.
    #[clap(short, long, default_value_t = wildspot::DEFAULT_LOOKBACK_HOURS)]
    lookback_hours: i64,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

/*-------------------------------------------------------------------------------------------------
 *                                             Main
 *-----------------------------------------------------------------------------------------------*/
fn main() -> WildSpotResult<()> {
    let opts = RefreshSpotsOptions::parse();

    let level = if opts.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .with_module_level("wildspot", level)
        .init()?;

    let caller = match opts.user {
        Some(user_id) => Caller::User(user_id),
        None => Caller::Anonymous,
    };

    let db = HotspotsDatabase::connect(&opts.store_file)?;
    let config = AggregationConfig {
        lookback_hours: opts.lookback_hours,
        ..AggregationConfig::default()
    };
    let runner = AggregationRun::new(&db, config);

    let response = runner.run_on_demand(&caller, Utc::now())?;

    log::info!("");
    log::info!("{}", response.message);
    log::info!("    reports processed - {:>6}", response.reports_processed);
    log::info!("     hotspots updated - {:>6}", response.hotspots_updated);
    log::info!("");

    Ok(())
}
