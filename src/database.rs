/*!
 * The persistent store shared by ingestion, aggregation, and the map consumers.
 *
 * One SQLite database holds both the raw sighting reports (written by ingestion, read here by
 * timestamp window) and the aggregated hotspots (written here as an atomic batch per run, read
 * by the map side). The connection is an explicit dependency passed to whoever needs it, there
 * is no module level handle.
 */

use crate::{
    error::WildSpotResult,
    geo::great_circle_distance,
    heat::HeatLevel,
    report::SightingReport,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::info;
use rusqlite::{Connection, OpenFlags, ToSql};
use rustc_hash::FxHashMap as HashMap;
use std::{path::Path, str::FromStr};

/// One aggregated hotspot record, keyed by its grid cell.
#[derive(Debug, Clone)]
pub struct Hotspot {
    /// The grid cell key. Primary key in the store.
    pub grid_id: String,
    /// Latitude of the cell center in degrees.
    pub latitude: f64,
    /// Longitude of the cell center in degrees.
    pub longitude: f64,
    pub heat_level: HeatLevel,
    /// Reports aggregated into this cell during the most recent run's window.
    pub report_count: i64,
    /// When the run that wrote this record happened. Drives pruning.
    pub last_updated: DateTime<Utc>,
    /// Render radius for consumers, half the grid cell size.
    pub radius_meters: f64,
}

/// What a single commit did to the hotspot table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitCounts {
    pub upserted: usize,
    pub pruned: usize,
}

/// Represents a connection to the database where reports and hotspots are stored.
pub struct HotspotsDatabase {
    conn: Connection,
}

impl HotspotsDatabase {
    /// Initialize a database.
    ///
    /// Make sure the database exists and is set up properly. Run this in the main thread before
    /// anything else opens a connection to it.
    pub fn initialize<P: AsRef<Path>>(path: P) -> WildSpotResult<()> {
        let _conn = Self::open_database_to_write(path.as_ref())?;
        Ok(())
    }

    /// Open a connection to the database for reading reports and writing hotspots.
    pub fn connect<P: AsRef<Path>>(path: P) -> WildSpotResult<Self> {
        let conn = Self::open_database_to_write(path.as_ref())?;
        Ok(HotspotsDatabase { conn })
    }

    /// Open a private in memory database. Used by tests and nothing else should need it.
    pub fn open_in_memory() -> WildSpotResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(include_str!("database/create_db.sql"))?;
        Ok(HotspotsDatabase { conn })
    }

    fn open_database_to_write(path: &Path) -> WildSpotResult<Connection> {
        let conn = rusqlite::Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        // A 5-second busy time out is WAY too much. If we hit this something has gone terribly wrong.
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(include_str!("database/create_db.sql"))?;

        Ok(conn)
    }

    /// Append a sighting report. This is the ingestion side's write path; aggregation itself
    /// never calls it.
    pub fn add_report(&self, report: &SightingReport) -> WildSpotResult<()> {
        const QUERY: &str = "INSERT INTO reports \
             (user_id, timestamp, latitude, longitude, animal_count, animal_type) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

        self.conn.execute(
            QUERY,
            [
                &report.user_id as &dyn ToSql,
                &report.timestamp.timestamp(),
                &report.latitude,
                &report.longitude,
                &report.animal_count,
                &report.animal_type,
            ],
        )?;

        Ok(())
    }

    /// Fetch every report with a timestamp at or after `earliest`.
    pub fn reports_since(&self, earliest: DateTime<Utc>) -> WildSpotResult<Vec<SightingReport>> {
        const QUERY: &str = "SELECT user_id, timestamp, latitude, longitude, animal_count, animal_type \
             FROM reports WHERE timestamp >= ?1";

        let mut stmt = self.conn.prepare(QUERY)?;

        let reports = stmt
            .query_and_then([&earliest.timestamp()], |row| -> WildSpotResult<SightingReport> {
                Ok(SightingReport {
                    user_id: row.get(0)?,
                    timestamp: unix_to_datetime(row.get(1)?),
                    latitude: row.get(2)?,
                    longitude: row.get(3)?,
                    animal_count: row.get(4)?,
                    animal_type: row.get(5)?,
                })
            })?
            .collect::<WildSpotResult<Vec<_>>>()?;

        Ok(reports)
    }

    /**
     * Commit the outcome of one aggregation run as a single atomic batch.
     *
     * Upserts every computed hotspot by grid id and deletes every hotspot whose last_updated
     * predates `window_start`, inside one immediate transaction. SQLite's write lock gives us
     * the single writer discipline, so two overlapping runs can never interleave their batches;
     * a reader sees either the whole batch or none of it. Re-committing identical input leaves
     * identical state behind.
     */
    pub fn commit_run(
        &self,
        computed: &HashMap<String, Hotspot>,
        window_start: DateTime<Utc>,
    ) -> WildSpotResult<CommitCounts> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;

        match self.apply_run(computed, window_start) {
            Ok(counts) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(counts)
            }
            Err(err) => {
                // Best effort rollback; the original error is the one worth reporting.
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(err)
            }
        }
    }

    fn apply_run(
        &self,
        computed: &HashMap<String, Hotspot>,
        window_start: DateTime<Utc>,
    ) -> WildSpotResult<CommitCounts> {
        let mut upsert_stmt = self.conn.prepare(include_str!("database/upsert_hotspot.sql"))?;

        for hotspot in computed.values() {
            upsert_stmt.execute([
                &hotspot.grid_id as &dyn ToSql,
                &hotspot.latitude,
                &hotspot.longitude,
                &hotspot.heat_level.to_string(),
                &hotspot.report_count,
                &hotspot.last_updated.timestamp(),
                &hotspot.radius_meters,
            ])?;
        }

        let pruned = self.conn.execute(
            "DELETE FROM hotspots WHERE last_updated < ?1",
            [&window_start.timestamp()],
        )?;

        if pruned > 0 {
            info!("Pruned {} stale hotspots", pruned);
        }

        Ok(CommitCounts {
            upserted: computed.len(),
            pruned,
        })
    }

    /// Look up a single hotspot by its grid cell key.
    pub fn hotspot(&self, grid_id: &str) -> WildSpotResult<Option<Hotspot>> {
        let mut all = self.select_hotspots("WHERE grid_id = ?1", &[&grid_id])?;
        Ok(all.pop())
    }

    /// Fetch every hotspot currently in the store.
    pub fn all_hotspots(&self) -> WildSpotResult<Vec<Hotspot>> {
        self.select_hotspots("", &[])
    }

    /**
     * Fetch the hotspots within `radius_km` of a point, the map side's query.
     *
     * The store is small (one row per active cell), so this scans all hotspots and filters by
     * great circle distance rather than maintaining a spatial index.
     */
    pub fn hotspots_near(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> WildSpotResult<Vec<Hotspot>> {
        let hotspots = self
            .all_hotspots()?
            .into_iter()
            .filter(|spot| {
                great_circle_distance(latitude, longitude, spot.latitude, spot.longitude)
                    <= radius_km
            })
            .collect();

        Ok(hotspots)
    }

    fn select_hotspots(
        &self,
        where_clause: &str,
        params: &[&dyn ToSql],
    ) -> WildSpotResult<Vec<Hotspot>> {
        let query = format!(
            "SELECT grid_id, latitude, longitude, heat_level, report_count, last_updated, \
             radius_meters FROM hotspots {}",
            where_clause
        );

        let mut stmt = self.conn.prepare(&query)?;

        let hotspots = stmt
            .query_and_then(params, |row| -> WildSpotResult<Hotspot> {
                let heat_text: String = row.get(3)?;
                let heat_level = HeatLevel::from_str(&heat_text)?;

                Ok(Hotspot {
                    grid_id: row.get(0)?,
                    latitude: row.get(1)?,
                    longitude: row.get(2)?,
                    heat_level,
                    report_count: row.get(4)?,
                    last_updated: unix_to_datetime(row.get(5)?),
                    radius_meters: row.get(6)?,
                })
            })?
            .collect::<WildSpotResult<Vec<_>>>()?;

        Ok(hotspots)
    }
}

fn unix_to_datetime(timestamp: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_utc(NaiveDateTime::from_timestamp(timestamp, 0), Utc)
}
