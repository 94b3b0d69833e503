//! Integration tests for the embedded migrations and schema constraints.
//!
//! Each test runs against its own temporary database from
//! `stride-test-utils`, so tests are isolated and idempotent.

use chrono::NaiveDate;
use sqlx::Row;
use uuid::Uuid;

use stride_db::models::{Discipline, NewMoveUnit, NewSession, PlanKind, StorageZone, WorkType};
use stride_db::pool;
use stride_db::queries::{days, move_units, plans, sessions, weeks};
use stride_test_utils::{create_test_db, drop_test_db};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[tokio::test]
async fn migrations_create_every_table() {
    let (pool, db_name) = create_test_db().await;

    let counts = pool::table_counts(&pool).await.expect("counts should succeed");
    let names: Vec<&str> = counts.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        [
            "plans",
            "weeks",
            "days",
            "sessions",
            "move_units",
            "repetition_laps",
            "templates",
            "periods",
            "techniques"
        ]
    );
    assert!(counts.iter().all(|(_, c)| *c == 0));

    // Running them again is a no-op.
    pool::run_migrations(&pool)
        .await
        .expect("second migration run should succeed");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn session_numbers_are_checked_at_commit() {
    let (pool, db_name) = create_test_db().await;
    let owner = Uuid::new_v4();

    let plan = plans::insert_plan(&pool, owner, "Base", PlanKind::YearlyPlan, date(2026, 1, 5), 1)
        .await
        .unwrap();
    let week = weeks::insert_week(&pool, plan.id, 1, plan.start_date, None).await.unwrap();
    let day = days::insert_day(&pool, week.id, 1, owner, plan.start_date, StorageZone::Planned)
        .await
        .unwrap();
    let s1 = sessions::insert_session(&pool, day.id, 1, &NewSession::default()).await.unwrap();
    let s2 = sessions::insert_session(&pool, day.id, 2, &NewSession::default()).await.unwrap();

    // A transient duplicate inside a transaction is fine if resolved before commit.
    let mut tx = pool.begin().await.unwrap();
    sessions::rebind_session(&mut *tx, s1.id, day.id, 2).await.unwrap();
    sessions::rebind_session(&mut *tx, s2.id, day.id, 1).await.unwrap();
    tx.commit().await.expect("swap should commit");

    let listed = sessions::list_sessions_for_day(&pool, day.id).await.unwrap();
    assert_eq!(listed[0].id, s2.id);
    assert_eq!(listed[1].id, s1.id);

    // An unresolved duplicate fails at commit.
    let mut tx = pool.begin().await.unwrap();
    sessions::rebind_session(&mut *tx, s1.id, day.id, 1).await.unwrap();
    assert!(tx.commit().await.is_err());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn one_primary_unit_per_session() {
    let (pool, db_name) = create_test_db().await;
    let owner = Uuid::new_v4();

    let plan = plans::insert_plan(&pool, owner, "Base", PlanKind::YearlyPlan, date(2026, 1, 5), 1)
        .await
        .unwrap();
    let week = weeks::insert_week(&pool, plan.id, 1, plan.start_date, None).await.unwrap();
    let day = days::insert_day(&pool, week.id, 1, owner, plan.start_date, StorageZone::Planned)
        .await
        .unwrap();
    let session = sessions::insert_session(&pool, day.id, 1, &NewSession::default()).await.unwrap();

    let primary = NewMoveUnit {
        work_type: Some(WorkType::Primary),
        ..NewMoveUnit::new(Discipline::Run)
    };
    move_units::insert_move_unit(&pool, session.id, "A", &primary).await.unwrap();
    let second = move_units::insert_move_unit(&pool, session.id, "B", &primary).await;
    assert!(second.is_err(), "second primary unit should violate the index");

    let row = sqlx::query("SELECT COUNT(*) AS n FROM move_units WHERE session_id = $1")
        .bind(session.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row.get::<i64, _>("n"), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}
