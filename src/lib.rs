pub use cluster::CellStats;
pub use database::{CommitCounts, Hotspot, HotspotsDatabase};
pub use error::{InvalidReportError, UnauthenticatedError, WildSpotResult};
pub use geo::great_circle_distance;
pub use grid::{GridCell, GridIndexer, DEFAULT_CELL_SIZE_METERS};
pub use heat::{HeatLevel, HeatThresholds};
pub use report::SightingReport;
pub use run::{
    AggregationConfig, AggregationRun, Caller, OnDemandResponse, RunSummary,
    DEFAULT_LOOKBACK_HOURS,
};

/**************************************************************************************************
 * Private Implementation
 *************************************************************************************************/
mod cluster;
mod database;
mod error;
mod geo;
mod grid;
mod heat;
mod report;
mod run;
