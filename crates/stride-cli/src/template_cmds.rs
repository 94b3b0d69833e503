//! CLI handlers for `stride template` subcommands.

use anyhow::Result;

use stride_core::{Caller, PlanStructureManager, TemplateBody};
use stride_db::models::Template;

use crate::TemplateCommands;

pub async fn run_template_command(
    command: TemplateCommands,
    manager: &PlanStructureManager,
    caller: &Caller,
) -> Result<()> {
    match command {
        TemplateCommands::SaveSession { session_id, name } => {
            let template = manager.save_session_as_template(caller, session_id, &name).await?;
            print_saved(&template);
            Ok(())
        }
        TemplateCommands::SaveDay { day_id, name } => {
            let template = manager.save_day_as_template(caller, day_id, &name).await?;
            print_saved(&template);
            Ok(())
        }
        TemplateCommands::Apply {
            template_id,
            target_day_id,
        } => {
            let created = manager.apply_template(caller, template_id, target_day_id).await?;
            println!("Applied template {template_id} to day {target_day_id}:");
            for session in &created {
                println!("  {}  [{}]", session.describe(), session.id);
            }
            Ok(())
        }
        TemplateCommands::List => {
            let templates = manager.list_templates(caller).await?;
            if templates.is_empty() {
                println!("No templates found.");
                return Ok(());
            }
            println!("{:<38} {:<8} {:>8} {:>6}  NAME", "ID", "KIND", "SESSIONS", "USED");
            for template in &templates {
                println!(
                    "{:<38} {:<8} {:>8} {:>6}  {}",
                    template.id,
                    template.kind,
                    session_count(template),
                    template.usage_count,
                    template.name
                );
            }
            Ok(())
        }
        TemplateCommands::Delete { template_id } => {
            manager.delete_template(caller, template_id).await?;
            println!("Template {template_id} deleted.");
            Ok(())
        }
    }
}

fn print_saved(template: &Template) {
    println!("Template saved.");
    println!();
    println!("  Template ID: {}", template.id);
    println!("  Name:        {}", template.name);
    println!("  Kind:        {}", template.kind);
    println!("  Sessions:    {}", session_count(template));
}

/// Session count of a stored body, or `?` when it no longer parses.
fn session_count(template: &Template) -> String {
    TemplateBody::parse(template.kind, &template.body)
        .map(|body| body.sessions().len().to_string())
        .unwrap_or_else(|_| "?".to_owned())
}
