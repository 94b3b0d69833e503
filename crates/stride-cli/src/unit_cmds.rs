//! CLI handlers for `stride unit` and `stride lap` subcommands.

use anyhow::Result;

use stride_core::{Caller, MoveUnitSummary, PlanStructureManager, UnitAction};
use stride_db::models::{NewLap, NewMoveUnit, RepetitionLap};

use crate::args::unit_placement;
use crate::{LapCommands, UnitBatchArgs, UnitCommands};

pub async fn run_unit_command(
    command: UnitCommands,
    manager: &PlanStructureManager,
    caller: &Caller,
) -> Result<()> {
    match command {
        UnitCommands::Add {
            session_id,
            discipline,
            unit_type,
            work_type,
            description,
            technique,
        } => {
            let fields = NewMoveUnit {
                unit_type,
                work_type,
                description,
                technique_id: technique,
                ..NewMoveUnit::new(discipline)
            };
            let unit = manager.add_move_unit(caller, session_id, fields).await?;
            println!("Move unit {} added as {}.", unit.id, unit.letter);
            Ok(())
        }
        UnitCommands::Move { batch } => place_batch(manager, caller, batch, UnitAction::Move).await,
        UnitCommands::Copy { batch } => place_batch(manager, caller, batch, UnitAction::Copy).await,
        UnitCommands::Switch { a, b } => {
            let (a, b) = manager.switch_move_units(caller, a, b).await?;
            println!("Switched:");
            print_unit(&a);
            print_unit(&b);
            Ok(())
        }
        UnitCommands::WorkType { unit_id, work_type } => {
            let unit = manager.set_work_type(caller, unit_id, work_type).await?;
            match unit.work_type {
                Some(wt) => println!("Move unit {} is now the {wt} unit.", unit.letter),
                None => println!("Move unit {} has no work type.", unit.letter),
            }
            Ok(())
        }
        UnitCommands::Delete { unit_id } => {
            manager.delete_move_unit(caller, unit_id).await?;
            println!("Move unit {unit_id} deleted.");
            Ok(())
        }
    }
}

pub async fn run_lap_command(
    command: LapCommands,
    manager: &PlanStructureManager,
    caller: &Caller,
) -> Result<()> {
    match command {
        LapCommands::Add {
            unit_id,
            distance,
            reps,
            load,
            pace,
            rest,
            duration,
            notes,
        } => {
            let fields = NewLap {
                distance_m: distance,
                reps,
                load_kg: load,
                pace_seconds: pace,
                rest_seconds: rest,
                duration_seconds: duration,
                notes,
            };
            let lap = manager.add_lap(caller, unit_id, fields).await?;
            println!("Lap {} added as repetition {}.", lap.id, lap.repetition_number);
            Ok(())
        }
        LapCommands::List { unit_id } => {
            let laps = manager.list_laps(unit_id).await?;
            if laps.is_empty() {
                println!("No laps.");
            } else {
                print_laps(&laps);
            }
            Ok(())
        }
        LapCommands::Delete { lap_id } => {
            manager.delete_lap(caller, lap_id).await?;
            println!("Lap {lap_id} deleted.");
            Ok(())
        }
    }
}

async fn place_batch(
    manager: &PlanStructureManager,
    caller: &Caller,
    batch: UnitBatchArgs,
    action: UnitAction,
) -> Result<()> {
    let placement = unit_placement(batch.before, batch.after, batch.replace)?;
    let placed = manager
        .move_or_copy_move_units(caller, &batch.unit_ids, batch.to, placement, action, batch.confirm)
        .await?;

    println!("Placed in session {}:", batch.to);
    for unit in &placed {
        print_unit(unit);
    }
    Ok(())
}

fn print_unit(unit: &MoveUnitSummary) {
    println!("  {}  [{}]", unit.describe(), unit.id);
}

pub(crate) fn print_laps(laps: &[RepetitionLap]) {
    println!("{:>4} {:>9} {:>6} {:>8} {:>6} {:>6}", "#", "DIST(m)", "REPS", "LOAD", "PACE", "REST");
    let cell = |v: Option<i32>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_owned());
    for lap in laps {
        println!(
            "{:>4} {:>9} {:>6} {:>8} {:>6} {:>6}",
            lap.repetition_number,
            cell(lap.distance_m),
            cell(lap.reps),
            lap.load_kg.map(|v| format!("{v:.1}")).unwrap_or_else(|| "-".to_owned()),
            cell(lap.pace_seconds),
            cell(lap.rest_seconds),
        );
    }
}
