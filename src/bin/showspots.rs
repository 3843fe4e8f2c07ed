use clap::Parser;
use std::path::PathBuf;
use wildspot::{HotspotsDatabase, WildSpotResult};

/// 5 miles, the radius the mobile map asks for.
const DEFAULT_RADIUS_KM: f64 = 8.04672;

/*-------------------------------------------------------------------------------------------------
 *                                     Command Line Options
 *-----------------------------------------------------------------------------------------------*/

///
/// List the hotspots near a coordinate.
///
/// This is the map consumer's view of the store: every hotspot within the given great circle
/// distance of the query point, with its heat level, report count, and last refresh time.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "showspots")]
#[clap(author, version, about)]
struct ShowSpotsOptions {
    /// The path to the hotspots database file.
    ///
    /// If this is not specified, then the program will check for it in the "HOTSPOT_DB"
    /// environment variable.
    #[clap(short, long)]
    #[clap(env = "HOTSPOT_DB")]
    store_file: PathBuf,

    /// Latitude of the query point in degrees.
    latitude: f64,

    /// Longitude of the query point in degrees.
    longitude: f64,

    /// Search radius in kilometers.
    #[clap(short, long, default_value_t = DEFAULT_RADIUS_KM)]
    radius_km: f64,
}

/*-------------------------------------------------------------------------------------------------
 *                                             Main
 *-----------------------------------------------------------------------------------------------*/
fn main() -> WildSpotResult<()> {
    let opts = ShowSpotsOptions::parse();

    let db = HotspotsDatabase::connect(&opts.store_file)?;
    let hotspots = db.hotspots_near(opts.latitude, opts.longitude, opts.radius_km)?;

    if hotspots.is_empty() {
        println!(
            "No hotspots within {:.1} km of ({:.5}, {:.5})",
            opts.radius_km, opts.latitude, opts.longitude
        );
        return Ok(());
    }

    println!(
        "{:>12} {:>12} {:>8} {:>8} {:>20}",
        "Latitude", "Longitude", "Heat", "Reports", "Last Updated"
    );

    for spot in &hotspots {
        println!(
            "{:>12.6} {:>12.6} {:>8} {:>8} {:>20}",
            spot.latitude,
            spot.longitude,
            spot.heat_level.to_string(),
            spot.report_count,
            spot.last_updated.format("%Y-%m-%d %H:%M:%S")
        );
    }

    println!("\n{} hotspots", hotspots.len());

    Ok(())
}
