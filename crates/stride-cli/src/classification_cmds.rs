//! CLI handlers for `stride period` and `stride technique` subcommands.

use anyhow::Result;

use stride_core::{Caller, PlanStructureManager};

use crate::{PeriodCommands, TechniqueCommands};

pub async fn run_period_command(
    command: PeriodCommands,
    manager: &PlanStructureManager,
    caller: &Caller,
) -> Result<()> {
    match command {
        PeriodCommands::Add { name, color } => {
            let period = manager.create_period(caller, &name, color.as_deref()).await?;
            println!("Period {:?} created: {}", period.name, period.id);
            Ok(())
        }
        PeriodCommands::List => {
            let periods = manager.list_periods(caller).await?;
            if periods.is_empty() {
                println!("No periods found.");
                return Ok(());
            }
            println!("{:<38} {:<10} NAME", "ID", "COLOR");
            for period in &periods {
                println!(
                    "{:<38} {:<10} {}",
                    period.id,
                    period.color.as_deref().unwrap_or("-"),
                    period.name
                );
            }
            Ok(())
        }
        PeriodCommands::Delete { period_id } => {
            manager.delete_period(caller, period_id).await?;
            println!("Period {period_id} deleted.");
            Ok(())
        }
    }
}

pub async fn run_technique_command(command: TechniqueCommands, manager: &PlanStructureManager) -> Result<()> {
    match command {
        TechniqueCommands::Add { name } => {
            let technique = manager.ensure_technique(&name).await?;
            println!("Technique {:?}: {}", technique.name, technique.id);
            Ok(())
        }
        TechniqueCommands::List => {
            let techniques = manager.list_techniques().await?;
            if techniques.is_empty() {
                println!("No techniques found.");
                return Ok(());
            }
            for technique in &techniques {
                println!("{:<38} {}", technique.id, technique.name);
            }
            Ok(())
        }
    }
}
