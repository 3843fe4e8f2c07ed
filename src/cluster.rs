/*!
 * Grouping of sighting reports into per cell statistics.
 *
 * A CellStats describes the aggregate properties of all the reports that landed in one grid
 * cell during the lookback window.
 */

use crate::{
    grid::{GridCell, GridIndexer},
    report::SightingReport,
};
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap as HashMap;

/**
 * The aggregate properties of the reports binned into a single grid cell.
 */
#[derive(Debug, Clone)]
pub struct CellStats {
    /// The cell the reports were binned into. The center here is the cell's canonical center,
    /// never a centroid of the member points, so every report in the cell resolves to the same
    /// coordinate regardless of where inside the cell it fell.
    pub cell: GridCell,
    /// How many reports landed in this cell.
    pub report_count: i64,
    /// The earliest report timestamp in the cell. This anchors the heat classification clock,
    /// so a cell ages out of High once its earliest activity is old enough even if sporadic
    /// new reports keep arriving.
    pub oldest: DateTime<Utc>,
}

impl CellStats {
    /**
     * Bin reports by grid cell and accumulate the per cell statistics.
     *
     * Commutative and order independent: the result does not depend on the order of the input
     * slice, and no iteration order is guaranteed on the returned map.
     */
    pub fn from_reports(
        indexer: &GridIndexer,
        reports: &[SightingReport],
    ) -> HashMap<String, CellStats> {
        let mut cells: HashMap<String, CellStats> = HashMap::default();

        for report in reports {
            let cell = indexer.index_of(report.latitude, report.longitude);

            match cells.get_mut(&cell.id) {
                Some(stats) => {
                    stats.report_count += 1;
                    if report.timestamp < stats.oldest {
                        stats.oldest = report.timestamp;
                    }
                }
                None => {
                    cells.insert(
                        cell.id.clone(),
                        CellStats {
                            cell,
                            report_count: 1,
                            oldest: report.timestamp,
                        },
                    );
                }
            }
        }

        cells
    }
}
