use anyhow::Context;
use tracing::{info, warn};
use uuid::Uuid;

use stride_db::models::{NewLap, Template, TemplateKind};
use stride_db::queries::{days, laps, move_units, sessions, templates};

use super::{PlanStructureManager, plan_of_day, required_name};
use crate::access::Caller;
use crate::config::MAX_SESSIONS_PER_DAY;
use crate::error::{EngineError, EngineResult, Entity};
use crate::ordering::labels_from;
use crate::summary::SessionSummary;
use crate::template::{DayTemplate, SessionTemplate, TemplateBody};
use crate::tree;

impl PlanStructureManager {
    /// Store a live session, with its units and laps, as a session template.
    pub async fn save_session_as_template(
        &self,
        caller: &Caller,
        session_id: Uuid,
        name: &str,
    ) -> EngineResult<Template> {
        let name = required_name("template", name)?;
        let mut tx = self.begin().await?;

        let session = self.lock_session_day(&mut tx, session_id).await?;
        let plan = plan_of_day(&mut tx, session.day_id).await?;
        self.authorize(caller, &plan).await?;

        let tree = tree::load_session(&mut tx, session).await?;
        let body = TemplateBody::Session(SessionTemplate::from_tree(&tree));
        let template =
            templates::insert_template(&mut *tx, caller.id, name, TemplateKind::Session, &body.to_json()?)
                .await?;

        tx.commit().await.context("failed to commit template")?;

        info!(template_id = %template.id, kind = %template.kind, "template saved");
        Ok(template)
    }

    /// Store every session of a live day as a day template.
    pub async fn save_day_as_template(&self, caller: &Caller, day_id: Uuid, name: &str) -> EngineResult<Template> {
        let name = required_name("template", name)?;
        let mut tx = self.begin().await?;

        let day = days::lock_days(&mut *tx, &[day_id])
            .await?
            .pop()
            .ok_or_else(|| EngineError::not_found(Entity::Day, day_id))?;
        let plan = plan_of_day(&mut tx, day.id).await?;
        self.authorize(caller, &plan).await?;

        let tree = tree::load_day(&mut tx, day).await?;
        if tree.sessions.is_empty() {
            return Err(EngineError::InvalidInput(format!(
                "day {} has no sessions to save",
                tree.day.day_date
            )));
        }
        let body = TemplateBody::Day(DayTemplate {
            sessions: tree.sessions.iter().map(SessionTemplate::from_tree).collect(),
        });
        let template =
            templates::insert_template(&mut *tx, caller.id, name, TemplateKind::Day, &body.to_json()?).await?;

        tx.commit().await.context("failed to commit template")?;

        info!(template_id = %template.id, kind = %template.kind, "template saved");
        Ok(template)
    }

    pub async fn list_templates(&self, caller: &Caller) -> EngineResult<Vec<Template>> {
        Ok(templates::list_templates_for_owner(&self.pool, caller.id).await?)
    }

    /// Delete one of the caller's templates.
    pub async fn delete_template(&self, caller: &Caller, template_id: Uuid) -> EngineResult<()> {
        let template = templates::get_template(&self.pool, template_id)
            .await?
            .filter(|t| t.owner_id == caller.id)
            .ok_or_else(|| EngineError::not_found(Entity::Template, template_id))?;
        templates::delete_template(&self.pool, template.id).await?;

        info!(template_id = %template.id, "template deleted");
        Ok(())
    }

    /// Instantiate a template's sessions on a day after its existing ones.
    ///
    /// A day template fills at most the day's remaining capacity; sessions
    /// beyond it are dropped with a warning.
    pub async fn apply_template(
        &self,
        caller: &Caller,
        template_id: Uuid,
        target_day_id: Uuid,
    ) -> EngineResult<Vec<SessionSummary>> {
        let mut tx = self.begin().await?;

        let template = templates::get_template(&mut *tx, template_id)
            .await?
            .ok_or_else(|| EngineError::not_found(Entity::Template, template_id))?;
        let body = TemplateBody::parse(template.kind, &template.body)?;

        let day = days::lock_days(&mut *tx, &[target_day_id])
            .await?
            .pop()
            .ok_or_else(|| EngineError::not_found(Entity::Day, target_day_id))?;
        let plan = plan_of_day(&mut tx, day.id).await?;
        self.authorize(caller, &plan).await?;

        let existing = sessions::count_sessions_for_day(&mut *tx, day.id).await? as usize;
        let available = MAX_SESSIONS_PER_DAY.saturating_sub(existing);
        if available == 0 {
            return Err(EngineError::CapacityExceeded {
                entity: Entity::Day,
                id: day.id,
                limit: MAX_SESSIONS_PER_DAY,
            });
        }
        let wanted = body.sessions();
        if wanted.len() > available {
            warn!(
                template_id = %template.id,
                day_id = %day.id,
                sessions = wanted.len(),
                available,
                "template truncated to the day's remaining capacity"
            );
        }

        let mut created = Vec::new();
        for (i, session_template) in wanted.iter().take(available).enumerate() {
            let number = (existing + i + 1) as i32;
            let session =
                sessions::insert_session(&mut *tx, day.id, number, &session_template.session_fields()).await?;
            let labels = labels_from(0, session_template.move_units.len());
            for (unit_template, label) in session_template.move_units.iter().zip(labels) {
                let unit =
                    move_units::insert_move_unit(&mut *tx, session.id, &label, &unit_template.unit_fields()).await?;
                for (k, lap) in unit_template.laps.iter().enumerate() {
                    laps::insert_lap(&mut *tx, unit.id, k as i32 + 1, &NewLap::from(lap)).await?;
                }
            }
            created.push(SessionSummary::load(&mut tx, &session).await?);
        }
        let usage = templates::increment_usage(&mut *tx, template.id).await?;

        tx.commit().await.context("failed to commit template application")?;

        info!(
            template_id = %template.id,
            day_id = %day.id,
            sessions = created.len(),
            usage,
            "template applied"
        );
        Ok(created)
    }
}
