//! Integration tests for templates, classifications and repetition population.

use std::sync::Arc;

use chrono::{NaiveDate, Weekday};
use uuid::Uuid;

use stride_core::structure::{NewPlan, PlanStructureManager};
use stride_core::{
    Caller, EngineConfig, ErrorKind, OwnerOnly, RepetitionSpec, VariationPattern, generate_repetitions,
};
use stride_db::models::{
    Day, Discipline, DisciplineClass, NewLap, NewMoveUnit, NewSession, PlanKind, TemplateKind, UnitType,
};
use stride_db::queries::{laps, move_units, sessions, templates};
use stride_test_utils::{create_test_db, drop_test_db};

async fn setup() -> (PlanStructureManager, Caller, Vec<Day>, String) {
    let (pool, db_name) = create_test_db().await;
    let manager = PlanStructureManager::new(pool, Arc::new(OwnerOnly), EngineConfig::default());
    let caller = Caller::new(Uuid::new_v4());

    let plan = manager
        .create_plan(
            &caller,
            NewPlan {
                name: "Templates".into(),
                kind: PlanKind::TemplateWeeks,
                start_date: NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
                week_count: None,
                period_id: None,
            },
        )
        .await
        .unwrap();
    let tree = manager.get_plan_tree(plan.id).await.unwrap();
    assert_eq!(tree.weeks.len(), 3, "template plans default to three weeks");
    let days = tree.weeks[0].days.iter().map(|d| d.day.clone()).collect();

    (manager, caller, days, db_name)
}

fn on(days: &[Day], weekday: Weekday) -> &Day {
    days.iter().find(|d| d.weekday() == weekday).unwrap()
}

#[tokio::test]
async fn saved_session_template_applies_deeply() {
    let (manager, caller, days, db_name) = setup().await;
    let monday = on(&days, Weekday::Mon);
    let tuesday = on(&days, Weekday::Tue);

    let session = manager
        .create_session(
            &caller,
            monday.id,
            NewSession {
                title: "Track".into(),
                duration_minutes: Some(75),
                ..NewSession::default()
            },
        )
        .await
        .unwrap();
    let unit = manager
        .add_move_unit(&caller, session.id, NewMoveUnit::new(Discipline::Run))
        .await
        .unwrap();
    manager
        .populate_move_unit(
            &caller,
            unit.id,
            RepetitionSpec::new(5, 400, DisciplineClass::Distance).with_variation(VariationPattern::Pyramid, 100),
        )
        .await
        .unwrap();

    let template = manager
        .save_session_as_template(&caller, session.id, "Pyramid track")
        .await
        .unwrap();
    assert_eq!(template.kind, TemplateKind::Session);

    let created = manager.apply_template(&caller, template.id, tuesday.id).await.unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].title, "Track");
    assert_eq!(created[0].session_number, 1);
    assert_eq!(created[0].move_unit_count, 1);

    let units = move_units::list_move_units_for_session(manager.pool(), created[0].id)
        .await
        .unwrap();
    let distances: Vec<Option<i32>> = laps::list_laps_for_unit(manager.pool(), units[0].id)
        .await
        .unwrap()
        .iter()
        .map(|l| l.distance_m)
        .collect();
    assert_eq!(
        distances,
        [Some(400), Some(500), Some(600), Some(500), Some(400)]
    );

    let stored = templates::get_template(manager.pool(), template.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.usage_count, 1);

    manager.pool().close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn day_template_truncates_to_remaining_capacity() {
    let (manager, caller, days, db_name) = setup().await;
    let wednesday = on(&days, Weekday::Wed);
    let thursday = on(&days, Weekday::Thu);

    for title in ["AM", "Noon", "PM"] {
        manager
            .create_session(
                &caller,
                wednesday.id,
                NewSession {
                    title: title.into(),
                    ..NewSession::default()
                },
            )
            .await
            .unwrap();
    }
    let template = manager
        .save_day_as_template(&caller, wednesday.id, "Triple day")
        .await
        .unwrap();

    manager
        .create_session(&caller, thursday.id, NewSession::default())
        .await
        .unwrap();
    let created = manager.apply_template(&caller, template.id, thursday.id).await.unwrap();
    let titles: Vec<&str> = created.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["AM", "Noon"]);
    assert_eq!(created[1].session_number, 3);

    let err = manager
        .apply_template(&caller, template.id, thursday.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CapacityExceeded);

    manager.pool().close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn malformed_template_changes_nothing() {
    let (manager, caller, days, db_name) = setup().await;
    let friday = on(&days, Weekday::Fri);

    let body = serde_json::json!({
        "kind": "session",
        "move_units": [
            { "discipline": "run", "work_type": "primary" },
            { "discipline": "swim", "work_type": "primary" }
        ]
    });
    let template = templates::insert_template(manager.pool(), caller.id, "Broken", TemplateKind::Session, &body)
        .await
        .unwrap();

    let err = manager
        .apply_template(&caller, template.id, friday.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedTemplate);
    assert!(sessions::list_sessions_for_day(manager.pool(), friday.id)
        .await
        .unwrap()
        .is_empty());

    manager.pool().close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn populate_continues_numbering_and_uses_unit_class() {
    let (manager, caller, days, db_name) = setup().await;
    let saturday = on(&days, Weekday::Sat);

    let session = manager
        .create_session(&caller, saturday.id, NewSession::default())
        .await
        .unwrap();
    let unit = manager
        .add_move_unit(&caller, session.id, NewMoveUnit::new(Discipline::Strength))
        .await
        .unwrap();
    manager
        .add_lap(
            &caller,
            unit.id,
            NewLap {
                reps: Some(5),
                ..NewLap::default()
            },
        )
        .await
        .unwrap();

    // Asked for distance, but strength is prescribed in repetitions.
    let spec = RepetitionSpec::new(4, 12, DisciplineClass::Distance)
        .with_variation(VariationPattern::Alternating, 3);
    let created = manager.populate_move_unit(&caller, unit.id, spec).await.unwrap();

    let numbers: Vec<i32> = created.iter().map(|l| l.repetition_number).collect();
    assert_eq!(numbers, [2, 3, 4, 5]);
    let reps: Vec<Option<i32>> = created.iter().map(|l| l.reps).collect();
    assert_eq!(reps, [Some(12), Some(15), Some(12), Some(15)]);
    assert!(created.iter().all(|l| l.distance_m.is_none()));

    // Preview gives the same values without touching storage.
    let preview = generate_repetitions(
        &RepetitionSpec::new(4, 12, DisciplineClass::Load).with_variation(VariationPattern::Alternating, 3),
        1,
    )
    .unwrap();
    assert_eq!(preview.iter().map(|d| d.repetition_number).collect::<Vec<_>>(), numbers);

    manager.pool().close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn annotations_refuse_laps() {
    let (manager, caller, days, db_name) = setup().await;
    let sunday = on(&days, Weekday::Sun);

    let session = manager
        .create_session(&caller, sunday.id, NewSession::default())
        .await
        .unwrap();
    let note = manager
        .add_move_unit(
            &caller,
            session.id,
            NewMoveUnit {
                unit_type: UnitType::Annotation,
                description: Some("Easy spin if legs allow".into()),
                ..NewMoveUnit::new(Discipline::Other)
            },
        )
        .await
        .unwrap();

    let err = manager
        .add_lap(&caller, note.id, NewLap::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    manager.pool().close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn templates_are_deleted_by_their_owner_only() {
    let (manager, caller, days, db_name) = setup().await;
    let monday = on(&days, Weekday::Mon);

    let session = manager
        .create_session(&caller, monday.id, NewSession::default())
        .await
        .unwrap();
    let template = manager
        .save_session_as_template(&caller, session.id, "Easy")
        .await
        .unwrap();

    let stranger = Caller::new(Uuid::new_v4());
    let err = manager.delete_template(&stranger, template.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    manager.delete_template(&caller, template.id).await.unwrap();
    assert!(manager.list_templates(&caller).await.unwrap().is_empty());

    manager.pool().close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn deleting_a_period_unclassifies_weeks() {
    let (manager, caller, _days, db_name) = setup().await;

    let period = manager.create_period(&caller, " Taper ", Some("#aa3355")).await.unwrap();
    assert_eq!(period.name, "Taper");
    let err = manager.create_period(&caller, "Taper", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let plan = manager
        .create_plan(
            &caller,
            NewPlan {
                name: "Race month".into(),
                kind: PlanKind::YearlyPlan,
                start_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
                week_count: Some(2),
                period_id: Some(period.id),
            },
        )
        .await
        .unwrap();
    let tree = manager.get_plan_tree(plan.id).await.unwrap();
    assert!(tree.weeks.iter().all(|w| w.week.period_id == Some(period.id)));

    let stranger = Caller::new(Uuid::new_v4());
    let err = manager.delete_period(&stranger, period.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    manager.delete_period(&caller, period.id).await.unwrap();
    let tree = manager.get_plan_tree(plan.id).await.unwrap();
    assert!(tree.weeks.iter().all(|w| w.week.period_id.is_none()));
    assert!(manager.list_periods(&caller).await.unwrap().is_empty());

    manager.pool().close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn move_units_only_reference_known_techniques() {
    let (manager, caller, days, db_name) = setup().await;
    let tuesday = on(&days, Weekday::Tue);

    let session = manager
        .create_session(&caller, tuesday.id, NewSession::default())
        .await
        .unwrap();

    let unknown = NewMoveUnit {
        technique_id: Some(Uuid::new_v4()),
        ..NewMoveUnit::new(Discipline::Swim)
    };
    let err = manager.add_move_unit(&caller, session.id, unknown).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let drill = manager.ensure_technique("Catch-up drill").await.unwrap();
    assert_eq!(manager.ensure_technique("Catch-up drill").await.unwrap().id, drill.id);

    let unit = manager
        .add_move_unit(
            &caller,
            session.id,
            NewMoveUnit {
                technique_id: Some(drill.id),
                ..NewMoveUnit::new(Discipline::Swim)
            },
        )
        .await
        .unwrap();
    assert_eq!(unit.technique_id, Some(drill.id));
    assert_eq!(unit.letter, "A");

    manager.pool().close().await;
    drop_test_db(&db_name).await;
}
