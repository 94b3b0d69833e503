//! CLI handlers for `stride reps preview` and `stride reps populate`.

use anyhow::Result;
use uuid::Uuid;

use stride_core::{Caller, LapDraft, PlanStructureManager, RepetitionSpec, VariationPattern, generate_repetitions};
use stride_db::models::DisciplineClass;

use crate::RepsCommands;
use crate::unit_cmds::print_laps;

/// Generator parameters shared by `preview` and `populate`.
#[derive(clap::Args, Debug)]
pub struct RepsArgs {
    /// Number of repetitions (1-50)
    #[arg(long)]
    pub count: u32,
    /// Starting value: meters for distance, repetitions for load
    #[arg(long)]
    pub base: i32,
    /// distance or load (populate uses the unit's discipline instead)
    #[arg(long, default_value = "distance")]
    pub class: DisciplineClass,
    /// none, linear, pyramid or alternating
    #[arg(long, default_value = "none")]
    pub pattern: VariationPattern,
    /// Step applied by the pattern
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub amount: i32,
    /// Rest in seconds after each repetition
    #[arg(long)]
    pub rest: Option<i32>,
    /// Target pace in seconds
    #[arg(long)]
    pub pace: Option<i32>,
    /// Load in kilograms
    #[arg(long)]
    pub load: Option<f64>,
}

impl RepsArgs {
    pub fn to_spec(&self) -> RepetitionSpec {
        RepetitionSpec {
            rest_seconds: self.rest,
            pace_seconds: self.pace,
            load_kg: self.load,
            ..RepetitionSpec::new(self.count, self.base, self.class).with_variation(self.pattern, self.amount)
        }
    }
}

pub async fn run_reps_command(
    command: RepsCommands,
    manager: &PlanStructureManager,
    caller: &Caller,
) -> Result<()> {
    match command {
        RepsCommands::Preview { spec } => cmd_preview(&spec),
        RepsCommands::Populate { unit_id, spec } => cmd_populate(manager, caller, unit_id, &spec).await,
    }
}

/// Print the drafts a spec would produce on an empty unit. No database.
pub fn cmd_preview(args: &RepsArgs) -> Result<()> {
    let drafts = generate_repetitions(&args.to_spec(), 0)?;
    print!("{}", render_drafts(&drafts, args.class));
    Ok(())
}

async fn cmd_populate(
    manager: &PlanStructureManager,
    caller: &Caller,
    unit_id: Uuid,
    args: &RepsArgs,
) -> Result<()> {
    let laps = manager.populate_move_unit(caller, unit_id, args.to_spec()).await?;
    println!("Added {} laps to move unit {unit_id}.", laps.len());
    print_laps(&laps);
    Ok(())
}

fn render_drafts(drafts: &[LapDraft], class: DisciplineClass) -> String {
    let unit = match class {
        DisciplineClass::Distance => "m",
        DisciplineClass::Load => "reps",
    };
    drafts
        .iter()
        .map(|d| {
            let value = d.value().map(|v| v.to_string()).unwrap_or_else(|| "-".to_owned());
            match d.lap.rest_seconds {
                Some(rest) => format!("{:>3}. {value} {unit}, rest {rest}s\n", d.repetition_number),
                None => format!("{:>3}. {value} {unit}\n", d.repetition_number),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: RepsArgs,
    }

    #[test]
    fn flags_build_the_spec() {
        let h = Harness::try_parse_from([
            "reps", "--count", "5", "--base", "400", "--pattern", "pyramid", "--amount", "100",
            "--rest", "90",
        ])
        .unwrap();
        let spec = h.args.to_spec();
        assert_eq!(spec.count, 5);
        assert_eq!(spec.pattern, VariationPattern::Pyramid);
        assert_eq!(spec.class, DisciplineClass::Distance);
        assert_eq!(spec.rest_seconds, Some(90));
    }

    #[test]
    fn preview_renders_a_pyramid() {
        let spec = RepetitionSpec::new(5, 400, DisciplineClass::Distance)
            .with_variation(VariationPattern::Pyramid, 100);
        let drafts = generate_repetitions(&spec, 0).unwrap();
        let out = render_drafts(&drafts, DisciplineClass::Distance);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "  1. 400 m");
        assert_eq!(lines[2], "  3. 600 m");
        assert_eq!(lines[4], "  5. 400 m");
    }

    #[test]
    fn negative_amount_is_accepted() {
        let h = Harness::try_parse_from([
            "reps", "--count", "3", "--base", "12", "--class", "load", "--pattern", "linear",
            "--amount", "-2",
        ])
        .unwrap();
        let drafts = generate_repetitions(&h.args.to_spec(), 0).unwrap();
        let out = render_drafts(&drafts, DisciplineClass::Load);
        assert!(out.contains("3. 8 reps"), "{out}");
    }
}
