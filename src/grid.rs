/*!
 * Deterministic binning of coordinates into fixed size grid cells.
 *
 * Every sighting is snapped to the center of a cell roughly `cell_size_meters` on a side. The
 * cell identity is a string key built with fixed decimal formatting so that identical inputs
 * always produce an identical key, which is what makes the hotspot upsert idempotent.
 */

/// Approximate length of one degree of latitude in meters.
const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// The cell size used by the deployed system.
pub const DEFAULT_CELL_SIZE_METERS: f64 = 1000.0;

/**
 * A single grid cell: its canonical center coordinate and string identity.
 *
 * Two coordinates map to the same GridCell if and only if they round to the same grid step.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    /// Latitude of the cell center in degrees.
    pub lat: f64,
    /// Longitude of the cell center in degrees.
    pub lon: f64,
    /// The cell key, e.g. "37.785489_-122.432782". Primary key in the hotspot store.
    pub id: String,
}

/**
 * Maps coordinates to grid cells. Pure and stateless apart from the configured cell size.
 */
#[derive(Debug, Clone, Copy)]
pub struct GridIndexer {
    /// Grid steps per degree of latitude.
    scale: f64,
    cell_size_meters: f64,
}

impl GridIndexer {
    pub fn new(cell_size_meters: f64) -> Self {
        GridIndexer {
            scale: METERS_PER_DEGREE_LAT / cell_size_meters,
            cell_size_meters,
        }
    }

    /// Half the cell size, reported on hotspots for rendering.
    pub fn cell_radius_meters(&self) -> f64 {
        self.cell_size_meters / 2.0
    }

    /**
     * Snap a coordinate to its grid cell.
     *
     * The longitude step is widened by 1/cos(latitude) so cells stay approximately
     * `cell_size_meters` wide at any latitude. This degrades near the poles, which is outside
     * the service area. Assumes finite, in-range coordinates.
     */
    pub fn index_of(&self, lat: f64, lon: f64) -> GridCell {
        let cell_lat = (lat * self.scale).round() / self.scale;

        let lon_scale = self.scale * lat.to_radians().cos();
        let cell_lon = (lon * lon_scale).round() / lon_scale;

        // Fixed precision formatting, never the default float formatter. Key stability across
        // runs depends on it.
        let id = format!("{:.6}_{:.6}", cell_lat, cell_lon);

        GridCell {
            lat: cell_lat,
            lon: cell_lon,
            id,
        }
    }
}

impl Default for GridIndexer {
    fn default() -> Self {
        GridIndexer::new(DEFAULT_CELL_SIZE_METERS)
    }
}
