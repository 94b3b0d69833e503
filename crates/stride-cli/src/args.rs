//! Argument parsers and flag-to-engine conversions shared by subcommands.

use anyhow::{Result, bail};
use chrono::{Duration, Local, NaiveDate};
use uuid::Uuid;

use stride_core::{SessionAction, UnitPlacement};

/// Parse a date argument: `today`, `tomorrow`, `yesterday`, `YYYY-MM-DD`,
/// `DD.MM.YYYY` or `YYYY/MM/DD`.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    parse_date_from(s, Local::now().date_naive())
}

fn parse_date_from(s: &str, today: NaiveDate) -> Result<NaiveDate, String> {
    match s.trim().to_lowercase().as_str() {
        "today" => Ok(today),
        "tomorrow" => Ok(today + Duration::days(1)),
        "yesterday" => Ok(today - Duration::days(1)),
        other => ["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d"]
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(other, fmt).ok())
            .ok_or_else(|| {
                format!(
                    "invalid date {s:?}: use today, tomorrow, yesterday, YYYY-MM-DD, DD.MM.YYYY or YYYY/MM/DD"
                )
            }),
    }
}

/// Build a unit placement from the mutually exclusive `--before`,
/// `--after` and `--replace` flags. None of them means append.
pub fn unit_placement(
    before: Option<Uuid>,
    after: Option<Uuid>,
    replace: Option<Uuid>,
) -> Result<UnitPlacement> {
    match (before, after, replace) {
        (None, None, None) => Ok(UnitPlacement::Append),
        (Some(id), None, None) => Ok(UnitPlacement::Before(id)),
        (None, Some(id), None) => Ok(UnitPlacement::After(id)),
        (None, None, Some(id)) => Ok(UnitPlacement::Replace(id)),
        _ => bail!("give at most one of --before, --after, --replace"),
    }
}

/// The session move action, replacing `replace` when given.
pub fn session_move(replace: Option<Uuid>, confirm: bool) -> SessionAction {
    SessionAction::Move {
        replace,
        confirmed: confirm || replace.is_some(),
    }
}
