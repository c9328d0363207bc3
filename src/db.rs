use anyhow::Context;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{FormSubmission, MetricKind, Notification, UserProfile};
use crate::notify::{self, PendingAlert};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let profiles = vec![
        ("dana.reyes@example.com", "Tampa", "workroom_manager"),
        ("sam.okafor@example.com", "Ocala", "workroom_manager"),
        ("lee.tran@example.com", "Panama City", "regional_manager"),
    ];

    for (email, workroom, role) in profiles {
        upsert_profile(pool, email, workroom, role).await?;
    }

    let alerts = vec![
        PendingAlert {
            workroom: "Tampa".to_string(),
            metric: MetricKind::VendorDebit,
            message: "Vendor debit discipline in Tampa slipping: score 42.0 is below 70"
                .to_string(),
            kind: "warn",
            form_route: MetricKind::VendorDebit.form_route(),
        },
        PendingAlert {
            workroom: "Ocala".to_string(),
            metric: MetricKind::Ltr,
            message: "Low LTR performance in Ocala: score 35.0 is below 70".to_string(),
            kind: "warn",
            form_route: MetricKind::Ltr.form_route(),
        },
    ];

    let existing = fetch_notifications(pool, None).await?;
    for alert in notify::dedup(alerts, &existing) {
        insert_notification(pool, &alert).await?;
    }

    Ok(())
}

fn notification_from_row(row: &sqlx::postgres::PgRow) -> Notification {
    let metric_type: Option<String> = row.get("metric_type");
    Notification {
        id: row.get("id"),
        workroom: row.get("workroom"),
        metric_type: metric_type.as_deref().and_then(MetricKind::parse),
        message: row.get("message"),
        kind: row.get("kind"),
        form_route: row.get("form_route"),
        is_read: row.get("is_read"),
        created_at: row.get("created_at"),
    }
}

pub async fn fetch_notifications(
    pool: &PgPool,
    workroom: Option<&str>,
) -> anyhow::Result<Vec<Notification>> {
    let mut query = String::from(
        "SELECT id, workroom, metric_type, message, kind, form_route, is_read, created_at \
         FROM workroom_performance.notifications",
    );
    if workroom.is_some() {
        query.push_str(" WHERE workroom = $1");
    }
    query.push_str(" ORDER BY created_at DESC");

    let mut rows = sqlx::query(&query);
    if let Some(value) = workroom {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    Ok(records.iter().map(notification_from_row).collect())
}

pub async fn insert_notification(pool: &PgPool, alert: &PendingAlert) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO workroom_performance.notifications
        (id, workroom, metric_type, message, kind, form_route, is_read)
        VALUES ($1, $2, $3, $4, $5, $6, FALSE)
        "#,
    )
    .bind(id)
    .bind(&alert.workroom)
    .bind(alert.metric.as_str())
    .bind(&alert.message)
    .bind(alert.kind)
    .bind(alert.form_route)
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn mark_read(pool: &PgPool, ids: &[Uuid]) -> anyhow::Result<u64> {
    let result = sqlx::query(
        "UPDATE workroom_performance.notifications SET is_read = TRUE WHERE id = ANY($1)",
    )
    .bind(ids)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_notifications(pool: &PgPool, ids: &[Uuid]) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM workroom_performance.notifications WHERE id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Delete untagged notifications that still use the old alert phrasing.
pub async fn cleanup_legacy(pool: &PgPool) -> anyhow::Result<u64> {
    let all = fetch_notifications(pool, None).await?;
    let ids: Vec<Uuid> = all
        .iter()
        .filter(|n| notify::is_legacy_format(n))
        .map(|n| n.id)
        .collect();
    if ids.is_empty() {
        return Ok(0);
    }
    delete_notifications(pool, &ids).await
}

pub async fn insert_form(
    pool: &PgPool,
    workroom: &str,
    metric: MetricKind,
    submitted_by: &str,
    payload: &serde_json::Value,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO workroom_performance.form_submissions
        (id, workroom, metric_type, submitted_by, payload)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(workroom)
    .bind(metric.as_str())
    .bind(submitted_by)
    .bind(payload)
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn fetch_forms(
    pool: &PgPool,
    workroom: Option<&str>,
) -> anyhow::Result<Vec<FormSubmission>> {
    let mut query = String::from(
        "SELECT id, workroom, metric_type, submitted_by, payload, created_at \
         FROM workroom_performance.form_submissions",
    );
    if workroom.is_some() {
        query.push_str(" WHERE workroom = $1");
    }
    query.push_str(" ORDER BY created_at DESC");

    let mut rows = sqlx::query(&query);
    if let Some(value) = workroom {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut forms = Vec::new();
    for row in records {
        let metric_type: String = row.get("metric_type");
        let metric = MetricKind::parse(&metric_type)
            .with_context(|| format!("unknown metric type '{metric_type}' in form row"))?;
        forms.push(FormSubmission {
            id: row.get("id"),
            workroom: row.get("workroom"),
            metric_type: metric,
            submitted_by: row.get("submitted_by"),
            payload: row.get("payload"),
            created_at: row.get("created_at"),
        });
    }
    Ok(forms)
}

pub async fn upsert_profile(
    pool: &PgPool,
    email: &str,
    workroom: &str,
    role: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO workroom_performance.user_profiles (email, workroom, role)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE
        SET workroom = EXCLUDED.workroom, role = EXCLUDED.role
        "#,
    )
    .bind(email)
    .bind(workroom)
    .bind(role)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn fetch_profile(pool: &PgPool, email: &str) -> anyhow::Result<Option<UserProfile>> {
    let row = sqlx::query(
        "SELECT email, workroom, role FROM workroom_performance.user_profiles WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| UserProfile {
        email: row.get("email"),
        workroom: row.get("workroom"),
        role: row.get("role"),
    }))
}
