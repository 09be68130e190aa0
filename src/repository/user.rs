use sqlx::{Postgres, Transaction};

use crate::{
    core::sqlx_utils::{binds_query_as, query_builder, SqlxBinds},
    model::user::{User, TABLE_NAME},
};

pub async fn get_all_user(
    tx: &mut Transaction<'_, Postgres>,
    page: u32,
    page_size: u32,
    search: Option<String>,
) -> anyhow::Result<(Vec<User>, u32, u32)> {
    let mut binds: Vec<SqlxBinds> = vec![];
    let mut filters: Vec<String> = vec![];

    if let Some(search) = search {
        binds.push(SqlxBinds::String(format!("%{}%", search)));
        filters.push(format!("username ILIKE ${}", binds.len()));
    }

    let page = page.max(1);
    let page_size = page_size.max(1);
    let offset = (u64::from(page) - 1) * u64::from(page_size);
    let stmt = query_builder(
        None,
        TABLE_NAME,
        &filters,
        vec!["username ASC".to_string()],
        Some(page_size),
        Some(offset),
    );
    let stmt_count = query_builder(
        Some("count(username)".to_string()),
        TABLE_NAME,
        &filters,
        vec![],
        None,
        None,
    );

    let q = binds_query_as::<User>(&stmt, binds.clone());
    let q_count = binds_query_as::<(i64,)>(&stmt_count, binds);
    let data = q.fetch_all(&mut **tx).await?;
    let count = q_count.fetch_one(&mut **tx).await?;
    let num_page = (count.0 as u32).div_ceil(page_size);
    Ok((data, count.0 as u32, num_page))
}

pub async fn get_user_by_username(
    tx: &mut Transaction<'_, Postgres>,
    username: &str,
) -> anyhow::Result<Option<User>> {
    let user: Option<User> =
        sqlx::query_as(format!("SELECT * FROM {} WHERE username = $1", TABLE_NAME).as_str())
            .bind(username)
            .fetch_optional(&mut **tx)
            .await?;
    Ok(user)
}

/// Fails with a unique violation (`users_pkey` / `users_email_key`) when the
/// username or email is already registered.
pub async fn create_user(tx: &mut Transaction<'_, Postgres>, user: &User) -> anyhow::Result<()> {
    sqlx::query(
        format!(
            r#"
        INSERT INTO {} (username, password, email, first_name, last_name, created_date)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(&user.username)
    .bind(&user.password)
    .bind(&user.email)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(user.created_date)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Feedback rows go with the user through `ON DELETE CASCADE`.
pub async fn delete_user(tx: &mut Transaction<'_, Postgres>, username: &str) -> anyhow::Result<bool> {
    let res = sqlx::query(format!("DELETE FROM {} WHERE username = $1", TABLE_NAME).as_str())
        .bind(username)
        .execute(&mut **tx)
        .await?;
    Ok(res.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use chrono::Local;
    use sqlx::PgPool;

    use super::*;
    use crate::core::sqlx_utils::unique_violation;

    fn new_user(username: &str, email: &str) -> User {
        User {
            username: username.to_string(),
            password: "hashed".to_string(),
            email: email.to_string(),
            first_name: "first".to_string(),
            last_name: "last".to_string(),
            created_date: Some(Local::now().fixed_offset()),
        }
    }

    #[sqlx::test]
    async fn test_create_then_get_user(pool: PgPool) -> anyhow::Result<()> {
        let mut tx = pool.begin().await?;
        create_user(&mut tx, &new_user("alice", "alice@local.com")).await?;

        let user = get_user_by_username(&mut tx, "alice").await?;
        assert!(user.is_some());
        let user = user.unwrap();
        assert_eq!(user.email, "alice@local.com");
        assert_eq!(user.full_name(), "first last");
        assert!(get_user_by_username(&mut tx, "bob").await?.is_none());
        Ok(())
    }

    #[sqlx::test]
    async fn test_create_duplicate_user(pool: PgPool) -> anyhow::Result<()> {
        let mut tx = pool.begin().await?;
        create_user(&mut tx, &new_user("alice", "alice@local.com")).await?;
        tx.commit().await?;

        let mut tx = pool.begin().await?;
        let err = create_user(&mut tx, &new_user("alice", "other@local.com"))
            .await
            .unwrap_err();
        assert_eq!(unique_violation(&err), Some("users_pkey".to_string()));
        tx.rollback().await?;

        let mut tx = pool.begin().await?;
        let err = create_user(&mut tx, &new_user("bob", "alice@local.com"))
            .await
            .unwrap_err();
        assert_eq!(unique_violation(&err), Some("users_email_key".to_string()));
        Ok(())
    }

    #[sqlx::test]
    async fn test_get_all_user_paginate(pool: PgPool) -> anyhow::Result<()> {
        let mut tx = pool.begin().await?;
        for idx in 0..5 {
            create_user(
                &mut tx,
                &new_user(&format!("user{}", idx), &format!("user{}@local.com", idx)),
            )
            .await?;
        }

        let (data, counts, page_count) = get_all_user(&mut tx, 2, 2, None).await?;
        assert_eq!(counts, 5);
        assert_eq!(page_count, 3);
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].username, "user2");

        let (data, counts, _) = get_all_user(&mut tx, 1, 10, Some("3".to_string())).await?;
        assert_eq!(counts, 1);
        assert_eq!(data[0].username, "user3");
        Ok(())
    }

    #[sqlx::test]
    async fn test_get_all_user_page_out_of_range(pool: PgPool) -> anyhow::Result<()> {
        let mut tx = pool.begin().await?;
        create_user(&mut tx, &new_user("alice", "alice@local.com")).await?;

        let (data, counts, page_count) = get_all_user(&mut tx, u32::MAX, 100, None).await?;
        assert!(data.is_empty());
        assert_eq!(counts, 1);
        assert_eq!(page_count, 1);
        Ok(())
    }

    #[sqlx::test]
    async fn test_delete_user(pool: PgPool) -> anyhow::Result<()> {
        let mut tx = pool.begin().await?;
        create_user(&mut tx, &new_user("alice", "alice@local.com")).await?;
        assert!(delete_user(&mut tx, "alice").await?);
        assert!(!delete_user(&mut tx, "alice").await?);
        assert!(get_user_by_username(&mut tx, "alice").await?.is_none());
        Ok(())
    }
}
