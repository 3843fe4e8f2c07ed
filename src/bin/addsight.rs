use chrono::Utc;
use clap::Parser;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::path::PathBuf;
use wildspot::{
    AggregationConfig, AggregationRun, Caller, HotspotsDatabase, InvalidReportError,
    SightingReport, WildSpotResult,
};

/*-------------------------------------------------------------------------------------------------
 *                                     Command Line Options
 *-----------------------------------------------------------------------------------------------*/

///
/// Append one sighting report to the store.
///
/// Thin glue over the ingestion write path, mostly useful for feeding a development database.
/// With --refresh it also triggers an on demand aggregation pass as the reporting user, the
/// same flow the mobile app follows after a submission.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "addsight")]
#[clap(author, version, about)]
struct AddSightOptions {
    /// The path to the hotspots database file.
    ///
    /// If this is not specified, then the program will check for it in the "HOTSPOT_DB"
    /// environment variable.
    #[clap(short, long)]
    #[clap(env = "HOTSPOT_DB")]
    store_file: PathBuf,

    /// The reporting user's identity.
    #[clap(short, long)]
    user: String,

    /// Latitude of the sighting in degrees.
    latitude: f64,

    /// Longitude of the sighting in degrees.
    longitude: f64,

    /// What was seen.
    animal_type: String,

    /// How many animals were seen.
    #[clap(short, long, default_value_t = 1)]
    count: u32,

    /// Run an aggregation pass after recording the sighting.
    #[clap(short, long)]
    refresh: bool,
}

/*-------------------------------------------------------------------------------------------------
 *                                             Main
 *-----------------------------------------------------------------------------------------------*/
fn main() -> WildSpotResult<()> {
    let opts = AddSightOptions::parse();

    SimpleLogger::new().with_level(LevelFilter::Info).init()?;

    if opts.count == 0 {
        return Err(Box::new(InvalidReportError {
            msg: "animal count must be at least one",
        }));
    }

    HotspotsDatabase::initialize(&opts.store_file)?;
    let db = HotspotsDatabase::connect(&opts.store_file)?;

    let report = SightingReport {
        user_id: opts.user.clone(),
        timestamp: Utc::now(),
        latitude: opts.latitude,
        longitude: opts.longitude,
        animal_count: opts.count,
        animal_type: opts.animal_type,
    };

    db.add_report(&report)?;
    log::info!(
        "Recorded {} x{} at ({:.5}, {:.5})",
        report.animal_type,
        report.animal_count,
        report.latitude,
        report.longitude
    );

    if opts.refresh {
        let runner = AggregationRun::new(&db, AggregationConfig::default());
        let response = runner.run_on_demand(&Caller::User(opts.user), Utc::now())?;
        log::info!("{}", response.message);
    }

    Ok(())
}
