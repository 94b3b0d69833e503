//! CLI handlers for `stride week` and `stride day` subcommands.

use anyhow::Result;

use stride_core::{Caller, PlanStructureManager, WeekCopyMode, WeekCopyReport};

use crate::{DayCommands, WeekCommands};

pub async fn run_week_command(
    command: WeekCommands,
    manager: &PlanStructureManager,
    caller: &Caller,
) -> Result<()> {
    match command {
        WeekCommands::Copy {
            source_week_id,
            target_week_id,
            replace,
            confirm,
        } => {
            let mode = if replace {
                WeekCopyMode::Replace { confirmed: confirm }
            } else {
                WeekCopyMode::Append
            };
            let report = manager
                .copy_week(caller, source_week_id, target_week_id, mode)
                .await?;
            print_copy_report(&report);
            Ok(())
        }
    }
}

pub async fn run_day_command(
    command: DayCommands,
    manager: &PlanStructureManager,
    caller: &Caller,
) -> Result<()> {
    match command {
        DayCommands::Ensure { week_id, date } => {
            let day = manager.ensure_day(caller, week_id, date).await?;
            println!("Day {} ({}, week {}): {}", day.day_date, day.weekday(), day.week_number, day.id);
            Ok(())
        }
        DayCommands::Move {
            day_id,
            target_week_id,
            index,
            confirm,
        } => {
            let day = manager
                .move_day_to_week(caller, day_id, target_week_id, index, confirm)
                .await?;
            println!("Day {} moved to week {} as {}.", day.id, day.week_number, day.day_date);
            Ok(())
        }
    }
}

fn print_copy_report(report: &WeekCopyReport) {
    println!(
        "Copied {} sessions into {} days.",
        report.sessions_copied(),
        report.copied_days.len()
    );
    for day in report.copied_days.iter().filter(|d| d.sessions_copied > 0) {
        println!("  {}: {} sessions -> {}", day.weekday, day.sessions_copied, day.target_day_id);
    }
    if !report.skipped_weekdays.is_empty() {
        let skipped: Vec<String> = report.skipped_weekdays.iter().map(|w| w.to_string()).collect();
        println!("Skipped (no matching day in target week): {}", skipped.join(", "));
    }
}
