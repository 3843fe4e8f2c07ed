/*!
 * One full aggregation pass: fetch the window, bin, classify, commit.
 *
 * Both trigger surfaces (the recurring scheduler and the on demand call) funnel into the same
 * [AggregationRun::run] procedure; the only difference between them is when they fire and what
 * caller identity they carry.
 */

use crate::{
    cluster::CellStats,
    database::{CommitCounts, Hotspot, HotspotsDatabase},
    error::{UnauthenticatedError, WildSpotResult},
    grid::{GridIndexer, DEFAULT_CELL_SIZE_METERS},
    heat::HeatThresholds,
};
use chrono::{DateTime, Duration, Utc};
use log::info;
use rustc_hash::FxHashMap as HashMap;

/// The deployed lookback window in hours.
pub const DEFAULT_LOOKBACK_HOURS: i64 = 24;

/**
 * Tunable knobs for a run. The defaults are the values the system has always shipped with.
 */
#[derive(Debug, Clone, Copy)]
pub struct AggregationConfig {
    /// Grid cell size in meters.
    pub cell_size_meters: f64,
    /// How far back from `now` to look for reports.
    pub lookback_hours: i64,
    /// The heat classification policy.
    pub thresholds: HeatThresholds,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        AggregationConfig {
            cell_size_meters: DEFAULT_CELL_SIZE_METERS,
            lookback_hours: DEFAULT_LOOKBACK_HOURS,
            thresholds: HeatThresholds::default(),
        }
    }
}

/// Who asked for a run.
#[derive(Debug, Clone)]
pub enum Caller {
    /// The recurring scheduler. Runs with system privilege.
    System,
    /// An authenticated user, identified by an opaque id.
    User(String),
    /// No identity established. On demand runs from here are rejected.
    Anonymous,
}

/// What one run accomplished.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// How many reports fell inside the lookback window.
    pub reports_processed: usize,
    /// How many hotspots were written. Stale hotspot pruning is not counted here.
    pub hotspots_updated: usize,
}

/// The response shape handed back to an on demand caller.
#[derive(Debug, Clone)]
pub struct OnDemandResponse {
    pub success: bool,
    pub reports_processed: usize,
    pub hotspots_updated: usize,
    pub message: String,
}

/**
 * Runs the aggregation pipeline against an injected store.
 */
pub struct AggregationRun<'a> {
    db: &'a HotspotsDatabase,
    config: AggregationConfig,
    indexer: GridIndexer,
}

impl<'a> AggregationRun<'a> {
    pub fn new(db: &'a HotspotsDatabase, config: AggregationConfig) -> Self {
        let indexer = GridIndexer::new(config.cell_size_meters);
        AggregationRun {
            db,
            config,
            indexer,
        }
    }

    /**
     * Execute one aggregation pass as of `now`.
     *
     * Fetches every report in the lookback window, bins them into grid cells, classifies each
     * cell, and commits the whole batch (upserts plus stale pruning) atomically. An empty
     * window still prunes: hotspots not refreshed within the window must not outlive it.
     *
     * A failed run writes nothing, so the store is never worse off than the last successful
     * run's snapshot. Recovery is simply the next trigger.
     */
    pub fn run(&self, now: DateTime<Utc>) -> WildSpotResult<RunSummary> {
        let window_start = now - Duration::hours(self.config.lookback_hours);

        let reports = self.db.reports_since(window_start)?;

        if reports.is_empty() {
            let counts = self.db.commit_run(&HashMap::default(), window_start)?;
            info!(
                "No recent reports found, pruned {} stale hotspots",
                counts.pruned
            );

            return Ok(RunSummary {
                reports_processed: 0,
                hotspots_updated: 0,
            });
        }

        let cells = CellStats::from_reports(&self.indexer, &reports);

        let mut computed: HashMap<String, Hotspot> = HashMap::default();
        for (grid_id, stats) in &cells {
            let hours_since_oldest = (now - stats.oldest).num_seconds() as f64 / 3600.0;
            let heat_level = self
                .config
                .thresholds
                .classify(stats.report_count, hours_since_oldest);

            computed.insert(
                grid_id.clone(),
                Hotspot {
                    grid_id: grid_id.clone(),
                    latitude: stats.cell.lat,
                    longitude: stats.cell.lon,
                    heat_level,
                    report_count: stats.report_count,
                    last_updated: now,
                    radius_meters: self.indexer.cell_radius_meters(),
                },
            );
        }

        let CommitCounts { upserted, pruned } = self.db.commit_run(&computed, window_start)?;

        info!(
            "Processed {} reports into {} hotspots ({} pruned)",
            reports.len(),
            upserted,
            pruned
        );

        Ok(RunSummary {
            reports_processed: reports.len(),
            hotspots_updated: computed.len(),
        })
    }

    /// The scheduled trigger's entry point. System privilege, no identity check.
    pub fn run_scheduled(&self, now: DateTime<Utc>) -> WildSpotResult<RunSummary> {
        self.run(now)
    }

    /**
     * The on demand trigger's entry point.
     *
     * Rejects anonymous callers before touching the store, with a distinct error so the caller
     * can tell an authorization failure from an internal one.
     */
    pub fn run_on_demand(
        &self,
        caller: &Caller,
        now: DateTime<Utc>,
    ) -> WildSpotResult<OnDemandResponse> {
        if let Caller::Anonymous = caller {
            return Err(Box::new(UnauthenticatedError));
        }

        let summary = self.run(now)?;

        Ok(OnDemandResponse {
            success: true,
            reports_processed: summary.reports_processed,
            hotspots_updated: summary.hotspots_updated,
            message: format!(
                "Processed {} reports into {} hotspots",
                summary.reports_processed, summary.hotspots_updated
            ),
        })
    }
}
