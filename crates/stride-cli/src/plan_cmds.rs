//! CLI handlers for `stride plan` subcommands.
//!
//! Implements:
//! - `stride plan create <name>`        -- create a plan with its weeks and days
//! - `stride plan show [plan-id]`       -- show a plan's hierarchy or list plans
//! - `stride plan rebuild <plan-id>`    -- delete and rebuild every week
//! - `stride plan delete <plan-id>`     -- delete a plan and its contents

use anyhow::{Context, Result, bail};
use uuid::Uuid;

use stride_core::structure::NewPlan;
use stride_core::tree::PlanTree;
use stride_core::{Caller, PlanStructureManager};

use crate::PlanCommands;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

pub async fn run_plan_command(
    command: PlanCommands,
    manager: &PlanStructureManager,
    caller: &Caller,
) -> Result<()> {
    match command {
        PlanCommands::Create {
            name,
            kind,
            start,
            weeks,
            period,
        } => {
            let new = NewPlan {
                name,
                kind,
                start_date: start,
                week_count: weeks,
                period_id: period,
            };
            cmd_create(manager, caller, new).await
        }
        PlanCommands::Show { plan_id, json } => match plan_id {
            Some(id) => cmd_show_one(manager, id, json).await,
            None => cmd_show_all(manager, caller).await,
        },
        PlanCommands::Rebuild { plan_id, confirm } => {
            if !confirm {
                bail!("rebuilding plan {plan_id} deletes every session in it; re-run with --confirm");
            }
            let plan = manager.rebuild_plan(caller, plan_id).await?;
            println!("Plan {} rebuilt with {} empty weeks.", plan.id, plan.week_count);
            Ok(())
        }
        PlanCommands::Delete { plan_id } => {
            manager.delete_plan(caller, plan_id).await?;
            println!("Plan {plan_id} deleted.");
            Ok(())
        }
    }
}

// -----------------------------------------------------------------------
// stride plan create
// -----------------------------------------------------------------------

async fn cmd_create(manager: &PlanStructureManager, caller: &Caller, new: NewPlan) -> Result<()> {
    let plan = manager.create_plan(caller, new).await?;
    let tree = manager.get_plan_tree(plan.id).await?;
    let days: usize = tree.weeks.iter().map(|w| w.days.len()).sum();

    println!("Plan created successfully.");
    println!();
    println!("  Plan ID:    {}", plan.id);
    println!("  Name:       {}", plan.name);
    println!("  Kind:       {}", plan.kind);
    println!("  Starts:     {}", plan.start_date);
    println!("  Weeks:      {}", tree.weeks.len());
    println!("  Days:       {days}");
    Ok(())
}

// -----------------------------------------------------------------------
// stride plan show
// -----------------------------------------------------------------------

async fn cmd_show_all(manager: &PlanStructureManager, caller: &Caller) -> Result<()> {
    let plans = manager.list_plans(caller).await?;
    if plans.is_empty() {
        println!("No plans found.");
        return Ok(());
    }

    println!("{:<38} {:<16} {:<12} {:>6}  NAME", "ID", "KIND", "START", "WEEKS");
    for plan in &plans {
        println!(
            "{:<38} {:<16} {:<12} {:>6}  {}",
            plan.id, plan.kind, plan.start_date, plan.week_count, plan.name
        );
    }
    Ok(())
}

async fn cmd_show_one(manager: &PlanStructureManager, plan_id: Uuid, json: bool) -> Result<()> {
    let tree = manager.get_plan_tree(plan_id).await?;
    if json {
        let out = serde_json::to_string_pretty(&tree).context("failed to serialize plan")?;
        println!("{out}");
    } else {
        print!("{}", render_tree(&tree));
    }
    Ok(())
}

/// Indented outline of a plan. Empty days are skipped.
fn render_tree(tree: &PlanTree) -> String {
    let mut out = String::new();
    let plan = &tree.plan;
    out.push_str(&format!("Plan: {} ({})\n", plan.name, plan.id));
    out.push_str(&format!("  Kind: {}   Start: {}\n", plan.kind, plan.start_date));

    for week in &tree.weeks {
        out.push_str(&format!(
            "\nWeek {} ({} to {})  [{}]\n",
            week.week.week_number,
            week.week.start_date,
            week.week.end_date(),
            week.week.id
        ));
        if let Some(notes) = &week.week.notes {
            out.push_str(&format!("  notes: {notes}\n"));
        }
        for day in week.days.iter().filter(|d| !d.sessions.is_empty()) {
            out.push_str(&format!(
                "  {} {}  [{}]\n",
                day.day.weekday(),
                day.day.day_date,
                day.day.id
            ));
            for session in &day.sessions {
                let title = if session.session.title.is_empty() {
                    "untitled"
                } else {
                    session.session.title.as_str()
                };
                out.push_str(&format!(
                    "    {}. {title}  [{}]\n",
                    session.session.session_number, session.session.id
                ));
                for unit in &session.units {
                    let work = unit
                        .unit
                        .work_type
                        .map(|wt| format!(" ({wt})"))
                        .unwrap_or_default();
                    out.push_str(&format!(
                        "       {} {}{work}, {} laps  [{}]\n",
                        unit.unit.letter,
                        unit.unit.discipline,
                        unit.laps.len(),
                        unit.unit.id
                    ));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use stride_core::tree::{DayTree, SessionTree, UnitTree, WeekTree};
    use stride_db::models::{
        Day, Discipline, MoveUnit, Plan, PlanKind, Session, StorageZone, UnitType, Week, WorkType,
    };

    use super::*;

    #[test]
    fn render_lists_sessions_and_skips_empty_days() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let owner = Uuid::new_v4();
        let week = Week {
            id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            week_number: 1,
            start_date: start,
            period_id: None,
            notes: Some("recovery".into()),
        };
        let day = |offset: i64| Day {
            id: Uuid::new_v4(),
            week_id: week.id,
            week_number: 1,
            owner_id: owner,
            day_date: start + chrono::Duration::days(offset),
            zone: StorageZone::Planned,
            notes: None,
        };
        let session = Session {
            id: Uuid::new_v4(),
            day_id: Uuid::nil(),
            session_number: 1,
            title: String::new(),
            notes: None,
            duration_minutes: None,
            created_at: Utc::now(),
        };
        let unit = MoveUnit {
            id: Uuid::new_v4(),
            session_id: session.id,
            letter: "A".into(),
            discipline: Discipline::Run,
            unit_type: UnitType::Standard,
            work_type: Some(WorkType::Primary),
            description: None,
            technique_id: None,
            created_at: Utc::now(),
        };
        let tree = PlanTree {
            plan: Plan {
                id: week.plan_id,
                owner_id: owner,
                name: "Base".into(),
                kind: PlanKind::YearlyPlan,
                start_date: start,
                week_count: 1,
                created_at: Utc::now(),
            },
            weeks: vec![WeekTree {
                week: week.clone(),
                days: vec![
                    DayTree {
                        day: day(0),
                        sessions: vec![SessionTree {
                            session,
                            units: vec![UnitTree { unit, laps: vec![] }],
                        }],
                    },
                    DayTree {
                        day: day(1),
                        sessions: vec![],
                    },
                ],
            }],
        };

        let out = render_tree(&tree);
        assert!(out.contains("Week 1 (2026-01-05 to 2026-01-11)"), "{out}");
        assert!(out.contains("notes: recovery"), "{out}");
        assert!(out.contains("Mon 2026-01-05"), "{out}");
        assert!(!out.contains("Tue 2026-01-06"), "{out}");
        assert!(out.contains("1. untitled"), "{out}");
        assert!(out.contains("A run (primary), 0 laps"), "{out}");
    }
}
