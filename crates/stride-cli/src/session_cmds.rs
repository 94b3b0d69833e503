//! CLI handlers for `stride session` subcommands.

use anyhow::Result;

use stride_core::{Caller, PlanStructureManager, SessionAction, SessionSummary};
use stride_db::models::NewSession;

use crate::SessionCommands;
use crate::args::session_move;

pub async fn run_session_command(
    command: SessionCommands,
    manager: &PlanStructureManager,
    caller: &Caller,
) -> Result<()> {
    match command {
        SessionCommands::Create {
            day_id,
            title,
            notes,
            duration,
        } => {
            let fields = NewSession {
                title,
                notes,
                duration_minutes: duration,
            };
            let session = manager.create_session(caller, day_id, fields).await?;
            println!("Session {} created as number {}.", session.id, session.session_number);
            Ok(())
        }
        SessionCommands::Copy {
            session_id,
            target_day_id,
        } => {
            let summary = manager
                .move_or_copy_or_switch_session(caller, session_id, target_day_id, SessionAction::Copy)
                .await?;
            print_placed("Copied", &summary);
            Ok(())
        }
        SessionCommands::Move {
            session_id,
            target_day_id,
            replace,
            confirm,
        } => {
            let summary = manager
                .move_or_copy_or_switch_session(
                    caller,
                    session_id,
                    target_day_id,
                    session_move(replace, confirm),
                )
                .await?;
            print_placed("Moved", &summary);
            Ok(())
        }
        SessionCommands::Switch {
            session_id,
            target_day_id,
            with,
        } => {
            let summary = manager
                .move_or_copy_or_switch_session(
                    caller,
                    session_id,
                    target_day_id,
                    SessionAction::Switch { with },
                )
                .await?;
            print_placed("Switched", &summary);
            Ok(())
        }
        SessionCommands::Delete { session_id } => {
            manager.delete_session(caller, session_id).await?;
            println!("Session {session_id} deleted.");
            Ok(())
        }
    }
}

fn print_placed(verb: &str, summary: &SessionSummary) {
    println!("{verb}: {} on day {}", summary.describe(), summary.day_id);
    println!("  Session ID: {}", summary.id);
}
