/*!
 * All the data related to a single wildlife sighting.
 *
 * A SightingReport is the raw input to aggregation. Reports are written once by the ingestion
 * side and never mutated or deleted by this crate.
 */

use chrono::{DateTime, Utc};

/**
 * A single geotagged wildlife sighting as submitted by a user.
 */
#[derive(Debug, Clone)]
pub struct SightingReport {
    /// Opaque identifier of the reporter.
    pub user_id: String,
    /// When the sighting occurred. Not required to be unique.
    pub timestamp: DateTime<Utc>,
    /// Latitude of the sighting in degrees, WGS84.
    pub latitude: f64,
    /// Longitude of the sighting in degrees, WGS84.
    pub longitude: f64,
    /// The number of animals seen, always at least one.
    pub animal_count: u32,
    /// Free form species tag. Uninterpreted by aggregation.
    pub animal_type: String,
}
