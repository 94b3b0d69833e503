//! The access-control seam.
//!
//! The engine never decides who may edit a plan; it asks an
//! [`AccessPolicy`] supplied by the caller and refuses with
//! [`EngineError::Forbidden`](crate::EngineError::Forbidden) on `false`.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use stride_db::models::Plan;

/// The identity an operation runs as. Always passed explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
}

impl Caller {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

/// Decides whether a caller may modify a plan.
#[async_trait]
pub trait AccessPolicy: Send + Sync {
    async fn may_modify(&self, caller: &Caller, plan: &Plan) -> Result<bool>;
}

// Compile-time assertion: AccessPolicy must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn AccessPolicy) {}
};

/// Only the plan's owner may modify it.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerOnly;

#[async_trait]
impl AccessPolicy for OwnerOnly {
    async fn may_modify(&self, caller: &Caller, plan: &Plan) -> Result<bool> {
        Ok(caller.id == plan.owner_id)
    }
}

/// A decision already made by the surrounding application (the
/// `callerOwnsTarget` flag), applied to every plan.
#[derive(Debug, Clone, Copy)]
pub struct CallerGrant(pub bool);

#[async_trait]
impl AccessPolicy for CallerGrant {
    async fn may_modify(&self, _caller: &Caller, _plan: &Plan) -> Result<bool> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use stride_db::models::PlanKind;

    use super::*;

    fn plan_owned_by(owner_id: Uuid) -> Plan {
        Plan {
            id: Uuid::new_v4(),
            owner_id,
            name: "Spring block".into(),
            kind: PlanKind::YearlyPlan,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            week_count: 52,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn owner_only_checks_ownership() {
        let owner = Uuid::new_v4();
        let plan = plan_owned_by(owner);
        let policy: Box<dyn AccessPolicy> = Box::new(OwnerOnly);

        assert!(policy.may_modify(&Caller::new(owner), &plan).await.unwrap());
        assert!(
            !policy
                .may_modify(&Caller::new(Uuid::new_v4()), &plan)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn caller_grant_ignores_plan() {
        let plan = plan_owned_by(Uuid::new_v4());
        let stranger = Caller::new(Uuid::new_v4());
        assert!(CallerGrant(true).may_modify(&stranger, &plan).await.unwrap());
        assert!(!CallerGrant(false).may_modify(&stranger, &plan).await.unwrap());
    }
}
