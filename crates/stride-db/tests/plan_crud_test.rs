//! Integration tests for hierarchy CRUD queries.

use chrono::NaiveDate;
use uuid::Uuid;

use stride_db::models::{Discipline, NewLap, NewMoveUnit, NewSession, PlanKind, StorageZone, TemplateKind};
use stride_db::queries::{classifications, days, laps, move_units, plans, sessions, templates, weeks};
use stride_test_utils::{create_test_db, drop_test_db};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[tokio::test]
async fn plan_lookup_through_every_level() {
    let (pool, db_name) = create_test_db().await;
    let owner = Uuid::new_v4();

    let plan = plans::insert_plan(&pool, owner, "Marathon", PlanKind::YearlyPlan, date(2026, 3, 2), 2)
        .await
        .unwrap();
    let week = weeks::insert_week(&pool, plan.id, 1, plan.start_date, None).await.unwrap();
    let day = days::insert_day(&pool, week.id, 1, owner, date(2026, 3, 4), StorageZone::Planned)
        .await
        .unwrap();
    let session = sessions::insert_session(&pool, day.id, 1, &NewSession::default()).await.unwrap();
    let unit = move_units::insert_move_unit(&pool, session.id, "A", &NewMoveUnit::new(Discipline::Run))
        .await
        .unwrap();

    for found in [
        plans::plan_for_week(&pool, week.id).await.unwrap(),
        plans::plan_for_day(&pool, day.id).await.unwrap(),
        plans::plan_for_session(&pool, session.id).await.unwrap(),
        plans::plan_for_move_unit(&pool, unit.id).await.unwrap(),
    ] {
        assert_eq!(found.map(|p| p.id), Some(plan.id));
    }
    assert!(plans::plan_for_day(&pool, Uuid::new_v4()).await.unwrap().is_none());

    let listed = plans::list_plans_for_owner(&pool, owner).await.unwrap();
    assert_eq!(listed.len(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn day_key_is_unique_per_owner_and_zone() {
    let (pool, db_name) = create_test_db().await;
    let owner = Uuid::new_v4();

    let plan = plans::insert_plan(&pool, owner, "Block", PlanKind::YearlyPlan, date(2026, 1, 5), 2)
        .await
        .unwrap();
    let w1 = weeks::insert_week(&pool, plan.id, 1, date(2026, 1, 5), None).await.unwrap();
    let w2 = weeks::insert_week(&pool, plan.id, 2, date(2026, 1, 12), None).await.unwrap();

    let first = days::insert_day(&pool, w1.id, 1, owner, date(2026, 1, 7), StorageZone::Planned)
        .await
        .unwrap();
    let taken = days::insert_day(&pool, w2.id, 2, owner, date(2026, 1, 7), StorageZone::Planned).await;
    assert!(taken.is_err());

    // Another zone is an independent day.
    let done = days::insert_day(&pool, w1.id, 1, owner, date(2026, 1, 7), StorageZone::Done)
        .await
        .unwrap();
    assert_ne!(done.id, first.id);

    let found = days::find_day(&pool, owner, date(2026, 1, 7), StorageZone::Planned)
        .await
        .unwrap()
        .expect("day should exist");
    assert_eq!((found.id, found.week_id), (first.id, w1.id));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn delete_plan_cascades_to_laps() {
    let (pool, db_name) = create_test_db().await;
    let owner = Uuid::new_v4();

    let plan = plans::insert_plan(&pool, owner, "Short", PlanKind::TemplateWeeks, date(2026, 1, 5), 1)
        .await
        .unwrap();
    let week = weeks::insert_week(&pool, plan.id, 1, plan.start_date, None).await.unwrap();
    let day = days::insert_day(&pool, week.id, 1, owner, plan.start_date, StorageZone::Template)
        .await
        .unwrap();
    let session = sessions::insert_session(&pool, day.id, 1, &NewSession::default()).await.unwrap();
    let unit = move_units::insert_move_unit(&pool, session.id, "A", &NewMoveUnit::new(Discipline::Swim))
        .await
        .unwrap();
    let lap = laps::insert_lap(&pool, unit.id, 1, &NewLap { distance_m: Some(100), ..NewLap::default() })
        .await
        .unwrap();

    plans::delete_plan(&pool, plan.id).await.unwrap();

    assert!(laps::get_lap(&pool, lap.id).await.unwrap().is_none());
    assert!(sessions::get_session(&pool, session.id).await.unwrap().is_none());
    assert!(plans::delete_plan(&pool, plan.id).await.is_err());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn laps_renumber_after_delete() {
    let (pool, db_name) = create_test_db().await;
    let owner = Uuid::new_v4();

    let plan = plans::insert_plan(&pool, owner, "Laps", PlanKind::YearlyPlan, date(2026, 1, 5), 1)
        .await
        .unwrap();
    let week = weeks::insert_week(&pool, plan.id, 1, plan.start_date, None).await.unwrap();
    let day = days::insert_day(&pool, week.id, 1, owner, plan.start_date, StorageZone::Planned)
        .await
        .unwrap();
    let session = sessions::insert_session(&pool, day.id, 1, &NewSession::default()).await.unwrap();
    let unit = move_units::insert_move_unit(&pool, session.id, "A", &NewMoveUnit::new(Discipline::Strength))
        .await
        .unwrap();

    let mut ids = Vec::new();
    for n in 1..=3 {
        let lap = laps::insert_lap(&pool, unit.id, n, &NewLap { reps: Some(10), ..NewLap::default() })
            .await
            .unwrap();
        ids.push(lap.id);
    }
    assert_eq!(laps::max_repetition_number(&pool, unit.id).await.unwrap(), 3);

    laps::delete_lap(&pool, ids[0]).await.unwrap();
    laps::renumber_laps(&pool, unit.id).await.unwrap();

    let numbers: Vec<i32> = laps::list_laps_for_unit(&pool, unit.id)
        .await
        .unwrap()
        .iter()
        .map(|l| l.repetition_number)
        .collect();
    assert_eq!(numbers, [1, 2]);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn templates_and_periods() {
    let (pool, db_name) = create_test_db().await;
    let owner = Uuid::new_v4();

    let body = serde_json::json!({ "kind": "session", "title": "Easy" });
    let template = templates::insert_template(&pool, owner, "Easy run", TemplateKind::Session, &body)
        .await
        .unwrap();
    assert_eq!(template.usage_count, 0);
    assert_eq!(templates::increment_usage(&pool, template.id).await.unwrap(), 1);
    assert!(templates::increment_usage(&pool, Uuid::new_v4()).await.is_err());

    let a = classifications::find_or_create_period(&pool, owner, "Base").await.unwrap();
    let b = classifications::find_or_create_period(&pool, owner, "Base").await.unwrap();
    assert_eq!(a.id, b.id);

    pool.close().await;
    drop_test_db(&db_name).await;
}
