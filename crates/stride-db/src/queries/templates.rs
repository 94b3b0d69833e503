//! Database query functions for the `templates` table.

use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{Template, TemplateKind};

/// Store a template body. The caller is responsible for validating it.
pub async fn insert_template<'e>(
    db: impl PgExecutor<'e>,
    owner_id: Uuid,
    name: &str,
    kind: TemplateKind,
    body: &serde_json::Value,
) -> Result<Template> {
    let template = sqlx::query_as::<_, Template>(
        "INSERT INTO templates (owner_id, name, kind, body) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(owner_id)
    .bind(name)
    .bind(kind)
    .bind(body)
    .fetch_one(db)
    .await
    .with_context(|| format!("failed to insert template {name:?}"))?;

    Ok(template)
}

/// Fetch a template by ID.
pub async fn get_template<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Template>> {
    let template = sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to fetch template")?;

    Ok(template)
}

/// List templates owned by `owner_id`, most used first.
pub async fn list_templates_for_owner<'e>(
    db: impl PgExecutor<'e>,
    owner_id: Uuid,
) -> Result<Vec<Template>> {
    let templates = sqlx::query_as::<_, Template>(
        "SELECT * FROM templates WHERE owner_id = $1 \
         ORDER BY usage_count DESC, name ASC",
    )
    .bind(owner_id)
    .fetch_all(db)
    .await
    .context("failed to list templates")?;

    Ok(templates)
}

/// Bump a template's usage counter and return the new value.
pub async fn increment_usage<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<i32> {
    let row: Option<(i32,)> = sqlx::query_as(
        "UPDATE templates SET usage_count = usage_count + 1 WHERE id = $1 \
         RETURNING usage_count",
    )
    .bind(id)
    .fetch_optional(db)
    .await
    .context("failed to increment template usage")?;

    match row {
        Some((count,)) => Ok(count),
        None => anyhow::bail!("template {id} not found"),
    }
}

/// Delete a template.
pub async fn delete_template<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM templates WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("failed to delete template")?;

    Ok(result.rows_affected())
}
