//! Engine tunables. Loaded from the `[engine]` table of the CLI config file.

use serde::{Deserialize, Serialize};

use stride_db::models::PlanKind;

/// Sessions a day may hold.
pub const MAX_SESSIONS_PER_DAY: usize = 3;

/// Days a week may hold.
pub const MAX_DAYS_PER_WEEK: usize = 7;

/// Longest plan `create_plan` accepts.
pub const MAX_WEEK_COUNT: i32 = 520;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Week span of yearly plans and completed logs.
    pub default_week_count: i32,
    /// Week span of template plans.
    pub template_week_count: i32,
    /// Create all seven days of every week when a plan is built.
    pub eager_days: bool,
    /// Give new weeks a default period when the caller names none.
    pub auto_create_default_period: bool,
    /// Name of the period created or reused by `auto_create_default_period`.
    pub default_period_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_week_count: 52,
            template_week_count: 3,
            eager_days: true,
            auto_create_default_period: false,
            default_period_name: "General".to_owned(),
        }
    }
}

impl EngineConfig {
    pub fn week_count_for(&self, kind: PlanKind) -> i32 {
        match kind {
            PlanKind::TemplateWeeks => self.template_week_count,
            PlanKind::YearlyPlan | PlanKind::CompletedLog => self.default_week_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.week_count_for(PlanKind::YearlyPlan), 52);
        assert_eq!(cfg.week_count_for(PlanKind::CompletedLog), 52);
        assert_eq!(cfg.week_count_for(PlanKind::TemplateWeeks), 3);
        assert!(!cfg.auto_create_default_period);
    }

    #[test]
    fn partial_table_fills_defaults() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"template_week_count": 4}"#).unwrap();
        assert_eq!(cfg.template_week_count, 4);
        assert_eq!(cfg.default_week_count, 52);
        assert!(cfg.eager_days);
    }
}
