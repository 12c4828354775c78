//! Repository for maker-checker approval requests and corrections

use sqlx::{PgPool, Postgres, Transaction};

use crate::contracts::approvals_v1::ApprovalRow;
use crate::contracts::recon_v1::CorrectionRow;

#[allow(clippy::too_many_arguments)]
pub async fn insert_request(
    tx: &mut Transaction<'_, Postgres>,
    entity_type: &str,
    entity_id: Option<i64>,
    original_data: &str,
    proposed_data: &str,
    reason: Option<&str>,
    maker_id: &str,
    comments_history: Option<&str>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO approval_requests
            (entity_type, entity_id, original_data, proposed_data, reason,
             maker_id, comments_history, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'PENDING')
        RETURNING approval_id
        "#,
    )
    .bind(entity_type)
    .bind(entity_id)
    .bind(original_data)
    .bind(proposed_data)
    .bind(reason)
    .bind(maker_id)
    .bind(comments_history)
    .fetch_one(&mut **tx)
    .await
}

pub async fn find(pool: &PgPool, approval_id: i64) -> Result<Option<ApprovalRow>, sqlx::Error> {
    sqlx::query_as::<_, ApprovalRow>(
        r#"
        SELECT approval_id, entity_type, entity_id, original_data, proposed_data, reason,
               maker_id, checker_id, checker_comment, comments_history, status,
               created_date, approved_date
        FROM approval_requests
        WHERE approval_id = $1
        "#,
    )
    .bind(approval_id)
    .fetch_optional(pool)
    .await
}

/// Locked fetch used while a decision is being applied.
pub async fn find_for_update(
    tx: &mut Transaction<'_, Postgres>,
    approval_id: i64,
) -> Result<Option<ApprovalRow>, sqlx::Error> {
    sqlx::query_as::<_, ApprovalRow>(
        r#"
        SELECT approval_id, entity_type, entity_id, original_data, proposed_data, reason,
               maker_id, checker_id, checker_comment, comments_history, status,
               created_date, approved_date
        FROM approval_requests
        WHERE approval_id = $1
        FOR UPDATE
        "#,
    )
    .bind(approval_id)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn update_decision(
    tx: &mut Transaction<'_, Postgres>,
    approval_id: i64,
    status: &str,
    checker_id: &str,
    checker_comment: &str,
    comments_history: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE approval_requests
        SET status = $2, checker_id = $3, checker_comment = $4, comments_history = $5,
            approved_date = CASE WHEN $2 IN ('APPROVED', 'REJECTED') THEN NOW() ELSE approved_date END
        WHERE approval_id = $1
        "#,
    )
    .bind(approval_id)
    .bind(status)
    .bind(checker_id)
    .bind(checker_comment)
    .bind(comments_history)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Re-open a clarified request. Checker fields are cleared so the next
/// decision starts clean; the proposed payload may be replaced.
pub async fn resubmit(
    tx: &mut Transaction<'_, Postgres>,
    approval_id: i64,
    proposed_data: Option<&str>,
    comments_history: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE approval_requests
        SET status = 'PENDING',
            proposed_data = COALESCE($2, proposed_data),
            checker_id = NULL, checker_comment = NULL,
            comments_history = $3
        WHERE approval_id = $1
        "#,
    )
    .bind(approval_id)
    .bind(proposed_data)
    .bind(comments_history)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn update_entity_id(
    tx: &mut Transaction<'_, Postgres>,
    approval_id: i64,
    entity_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE approval_requests SET entity_id = $2 WHERE approval_id = $1")
        .bind(approval_id)
        .bind(entity_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn count_pending(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM approval_requests WHERE status = 'PENDING'",
    )
    .fetch_one(pool)
    .await
}

pub async fn list_pending(pool: &PgPool) -> Result<Vec<ApprovalRow>, sqlx::Error> {
    sqlx::query_as::<_, ApprovalRow>(
        r#"
        SELECT approval_id, entity_type, entity_id, original_data, proposed_data, reason,
               maker_id, checker_id, checker_comment, comments_history, status,
               created_date, approved_date
        FROM approval_requests
        WHERE status = 'PENDING'
        ORDER BY created_date
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Requests sent back for clarification, visible only to their maker.
pub async fn list_clarifications(
    pool: &PgPool,
    maker_id: &str,
) -> Result<Vec<ApprovalRow>, sqlx::Error> {
    sqlx::query_as::<_, ApprovalRow>(
        r#"
        SELECT approval_id, entity_type, entity_id, original_data, proposed_data, reason,
               maker_id, checker_id, checker_comment, comments_history, status,
               created_date, approved_date
        FROM approval_requests
        WHERE status = 'CLARIFICATION' AND maker_id = $1
        ORDER BY created_date
        "#,
    )
    .bind(maker_id)
    .fetch_all(pool)
    .await
}

/// Latest approval status for a given entity, used to enrich master listings.
pub async fn latest_status_for_entity(
    pool: &PgPool,
    entity_type: &str,
    entity_id: i64,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT status FROM approval_requests
        WHERE entity_type = $1 AND entity_id = $2
        ORDER BY approval_id DESC
        LIMIT 1
        "#,
    )
    .bind(entity_type)
    .bind(entity_id)
    .fetch_optional(pool)
    .await
}

// ============================================================
// Reconciliation corrections
// ============================================================

pub async fn insert_correction(
    tx: &mut Transaction<'_, Postgres>,
    recon_id: i64,
    approval_id: i64,
    proposed_data: &str,
    maker_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO reconciliation_corrections
            (recon_id, approval_id, proposed_data, status, maker_id)
        VALUES ($1, $2, $3, 'PENDING', $4)
        RETURNING correction_id
        "#,
    )
    .bind(recon_id)
    .bind(approval_id)
    .bind(proposed_data)
    .bind(maker_id)
    .fetch_one(&mut **tx)
    .await
}

pub async fn find_correction(
    tx: &mut Transaction<'_, Postgres>,
    correction_id: i64,
) -> Result<Option<CorrectionRow>, sqlx::Error> {
    sqlx::query_as::<_, CorrectionRow>(
        r#"
        SELECT correction_id, recon_id, approval_id, proposed_data, status,
               maker_id, checker_id, created_date, approved_date
        FROM reconciliation_corrections
        WHERE correction_id = $1
        "#,
    )
    .bind(correction_id)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn update_correction_status(
    tx: &mut Transaction<'_, Postgres>,
    correction_id: i64,
    status: &str,
    checker_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE reconciliation_corrections
        SET status = $2, checker_id = $3, approved_date = NOW()
        WHERE correction_id = $1
        "#,
    )
    .bind(correction_id)
    .bind(status)
    .bind(checker_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn list_corrections(
    pool: &PgPool,
    recon_id: Option<i64>,
) -> Result<Vec<CorrectionRow>, sqlx::Error> {
    match recon_id {
        Some(id) => {
            sqlx::query_as::<_, CorrectionRow>(
                r#"
                SELECT correction_id, recon_id, approval_id, proposed_data, status,
                       maker_id, checker_id, created_date, approved_date
                FROM reconciliation_corrections
                WHERE recon_id = $1
                ORDER BY correction_id DESC
                "#,
            )
            .bind(id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, CorrectionRow>(
                r#"
                SELECT correction_id, recon_id, approval_id, proposed_data, status,
                       maker_id, checker_id, created_date, approved_date
                FROM reconciliation_corrections
                ORDER BY correction_id DESC
                "#,
            )
            .fetch_all(pool)
            .await
        }
    }
}
