//! End to end tests of the aggregation pipeline against an in memory store.

use chrono::{DateTime, Duration, TimeZone, Utc};
use wildspot::{
    AggregationConfig, AggregationRun, Caller, HeatLevel, HotspotsDatabase, SightingReport,
    UnauthenticatedError, WildSpotResult,
};

fn report(lat: f64, lon: f64, timestamp: DateTime<Utc>) -> SightingReport {
    SightingReport {
        user_id: "tester".to_owned(),
        timestamp,
        latitude: lat,
        longitude: lon,
        animal_count: 1,
        animal_type: "deer".to_owned(),
    }
}

fn base_time() -> DateTime<Utc> {
    Utc.ymd(2023, 6, 1).and_hms(12, 0, 0)
}

#[test]
fn counts_and_heat_levels_per_cell() -> WildSpotResult<()> {
    let db = HotspotsDatabase::open_in_memory()?;
    let now = base_time();

    // Cell A: 3 reports spread over the last 2 hours.
    for minutes in [0, 60, 120] {
        db.add_report(&report(
            37.78825,
            -122.4324,
            now - Duration::minutes(minutes),
        ))?;
    }

    // Cell B: 6 reports within the last 30 minutes.
    for minutes in [0, 5, 10, 15, 20, 30] {
        db.add_report(&report(44.5, -120.0, now - Duration::minutes(minutes)))?;
    }

    let runner = AggregationRun::new(&db, AggregationConfig::default());
    let summary = runner.run(now)?;

    assert_eq!(summary.reports_processed, 9);
    assert_eq!(summary.hotspots_updated, 2);

    let hotspots = db.all_hotspots()?;
    assert_eq!(hotspots.len(), 2);

    let cell_a = hotspots
        .iter()
        .find(|spot| (spot.latitude - 37.78825).abs() < 0.01)
        .unwrap();
    assert_eq!(cell_a.report_count, 3);
    assert_eq!(cell_a.heat_level, HeatLevel::Low);

    let cell_b = hotspots
        .iter()
        .find(|spot| (spot.latitude - 44.5).abs() < 0.01)
        .unwrap();
    assert_eq!(cell_b.report_count, 6);
    assert_eq!(cell_b.heat_level, HeatLevel::High);
    assert_eq!(cell_b.radius_meters, 500.0);

    Ok(())
}

#[test]
fn nearby_reports_share_one_hotspot() -> WildSpotResult<()> {
    let db = HotspotsDatabase::open_in_memory()?;
    let now = base_time();

    // About 50 m apart, 10 minutes apart, both within the last hour.
    db.add_report(&report(37.78825, -122.4324, now - Duration::minutes(40)))?;
    db.add_report(&report(37.78830, -122.4325, now - Duration::minutes(30)))?;

    let runner = AggregationRun::new(&db, AggregationConfig::default());
    let summary = runner.run(now)?;

    assert_eq!(summary.reports_processed, 2);
    assert_eq!(summary.hotspots_updated, 1);

    let hotspots = db.all_hotspots()?;
    assert_eq!(hotspots.len(), 1);
    assert_eq!(hotspots[0].report_count, 2);
    assert_eq!(hotspots[0].heat_level, HeatLevel::Low);

    Ok(())
}

#[test]
fn stale_hotspots_are_pruned() -> WildSpotResult<()> {
    let db = HotspotsDatabase::open_in_memory()?;
    let t0 = base_time();

    db.add_report(&report(37.78825, -122.4324, t0))?;

    let runner = AggregationRun::new(&db, AggregationConfig::default());

    let first = runner.run(t0 + Duration::hours(1))?;
    assert_eq!(first.hotspots_updated, 1);
    assert_eq!(db.all_hotspots()?.len(), 1);

    // A day later the report has aged out of the window. The empty pass must still prune.
    let second = runner.run(t0 + Duration::hours(26))?;
    assert_eq!(second.reports_processed, 0);
    assert_eq!(second.hotspots_updated, 0);
    assert!(db.all_hotspots()?.is_empty());

    Ok(())
}

#[test]
fn active_cells_are_refreshed_not_deleted() -> WildSpotResult<()> {
    let db = HotspotsDatabase::open_in_memory()?;
    let t0 = base_time();

    db.add_report(&report(37.78825, -122.4324, t0))?;

    let runner = AggregationRun::new(&db, AggregationConfig::default());
    runner.run(t0 + Duration::hours(1))?;

    let before = &db.all_hotspots()?[0];
    let grid_id = before.grid_id.clone();
    let first_updated = before.last_updated;

    // New activity in the same cell, twelve hours on. The original report is still inside the
    // window, so the recomputed count covers both.
    db.add_report(&report(37.78826, -122.4324, t0 + Duration::hours(12)))?;
    runner.run(t0 + Duration::hours(13))?;

    let after = db.hotspot(&grid_id)?.unwrap();
    assert_eq!(after.report_count, 2);
    assert!(after.last_updated > first_updated);

    Ok(())
}

#[test]
fn empty_window_with_no_history_is_a_no_op() -> WildSpotResult<()> {
    let db = HotspotsDatabase::open_in_memory()?;

    let runner = AggregationRun::new(&db, AggregationConfig::default());
    let summary = runner.run(base_time())?;

    assert_eq!(summary.reports_processed, 0);
    assert_eq!(summary.hotspots_updated, 0);
    assert!(db.all_hotspots()?.is_empty());

    Ok(())
}

#[test]
fn back_to_back_runs_are_idempotent() -> WildSpotResult<()> {
    let db = HotspotsDatabase::open_in_memory()?;
    let now = base_time();

    for minutes in [10, 20, 30] {
        db.add_report(&report(37.78825, -122.4324, now - Duration::minutes(minutes)))?;
    }

    let runner = AggregationRun::new(&db, AggregationConfig::default());
    runner.run(now)?;
    let mut first: Vec<_> = db.all_hotspots()?;

    runner.run(now)?;
    let mut second: Vec<_> = db.all_hotspots()?;

    first.sort_by(|a, b| a.grid_id.cmp(&b.grid_id));
    second.sort_by(|a, b| a.grid_id.cmp(&b.grid_id));

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.grid_id, b.grid_id);
        assert_eq!(a.latitude, b.latitude);
        assert_eq!(a.longitude, b.longitude);
        assert_eq!(a.heat_level, b.heat_level);
        assert_eq!(a.report_count, b.report_count);
        assert_eq!(a.radius_meters, b.radius_meters);
    }

    Ok(())
}

#[test]
fn anonymous_on_demand_run_is_rejected() -> WildSpotResult<()> {
    let db = HotspotsDatabase::open_in_memory()?;
    let now = base_time();

    db.add_report(&report(37.78825, -122.4324, now))?;

    let runner = AggregationRun::new(&db, AggregationConfig::default());
    let err = runner
        .run_on_demand(&Caller::Anonymous, now)
        .expect_err("anonymous caller must be rejected");
    assert!(err.downcast_ref::<UnauthenticatedError>().is_some());

    // Rejected before any fetch or write.
    assert!(db.all_hotspots()?.is_empty());

    // The same run with an identity goes through.
    let response = runner.run_on_demand(&Caller::User("user-1".to_owned()), now)?;
    assert!(response.success);
    assert_eq!(response.reports_processed, 1);
    assert_eq!(response.hotspots_updated, 1);

    Ok(())
}

#[test]
fn hotspots_near_filters_by_distance() -> WildSpotResult<()> {
    let db = HotspotsDatabase::open_in_memory()?;
    let now = base_time();

    // One cluster in San Francisco, one in central Oregon.
    db.add_report(&report(37.78825, -122.4324, now))?;
    db.add_report(&report(44.5, -120.0, now))?;

    let runner = AggregationRun::new(&db, AggregationConfig::default());
    runner.run(now)?;

    let near_sf = db.hotspots_near(37.79, -122.43, 8.04672)?;
    assert_eq!(near_sf.len(), 1);
    assert!((near_sf[0].latitude - 37.78825).abs() < 0.01);

    let near_nothing = db.hotspots_near(40.0, -110.0, 8.04672)?;
    assert!(near_nothing.is_empty());

    Ok(())
}
