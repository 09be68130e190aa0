use chrono::{DateTime, FixedOffset};
use sqlx::{Postgres, Transaction};

use crate::{
    core::sqlx_utils::{binds_query_as, query_builder, SqlxBinds},
    model::feedback::{Feedback, TABLE_NAME},
};

pub async fn get_feedback_by_id(
    tx: &mut Transaction<'_, Postgres>,
    id: i32,
) -> anyhow::Result<Option<Feedback>> {
    let stmt = query_builder(
        None,
        TABLE_NAME,
        &["id = $1".to_string()],
        vec![],
        None,
        None,
    );
    let feedback = binds_query_as::<Feedback>(&stmt, vec![SqlxBinds::Int(id)])
        .fetch_optional(&mut **tx)
        .await?;
    Ok(feedback)
}

/// Newest first.
pub async fn get_feedback_by_username(
    tx: &mut Transaction<'_, Postgres>,
    username: &str,
) -> anyhow::Result<Vec<Feedback>> {
    let stmt = query_builder(
        None,
        TABLE_NAME,
        &["username = $1".to_string()],
        vec!["created_date DESC".to_string(), "id DESC".to_string()],
        None,
        None,
    );
    let data = binds_query_as::<Feedback>(&stmt, vec![SqlxBinds::String(username.to_string())])
        .fetch_all(&mut **tx)
        .await?;
    Ok(data)
}

pub async fn create_feedback(
    tx: &mut Transaction<'_, Postgres>,
    title: &str,
    content: &str,
    username: &str,
    now: &DateTime<FixedOffset>,
) -> anyhow::Result<Feedback> {
    let feedback: Feedback = sqlx::query_as(
        format!(
            r#"
        INSERT INTO {} (title, content, username, created_date, updated_date)
        VALUES ($1, $2, $3, $4, $4)
        RETURNING *
        "#,
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(title)
    .bind(content)
    .bind(username)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;
    Ok(feedback)
}

pub async fn update_feedback(
    tx: &mut Transaction<'_, Postgres>,
    feedback: &mut Feedback,
    now: &DateTime<FixedOffset>,
) -> anyhow::Result<()> {
    feedback.updated_date = Some(*now);
    sqlx::query(
        format!(
            r#"UPDATE {}
            SET title = $1, content = $2, updated_date = $3
            WHERE id = $4"#,
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(&feedback.title)
    .bind(&feedback.content)
    .bind(now)
    .bind(feedback.id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn delete_feedback(tx: &mut Transaction<'_, Postgres>, id: i32) -> anyhow::Result<bool> {
    let res = sqlx::query(format!("DELETE FROM {} WHERE id = $1", TABLE_NAME).as_str())
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(res.rows_affected() > 0)
}
