use sqlx::PgPool;
use tokio::process::Command;

use crate::core::db::MIGRATOR;

pub async fn db_generate(migration_name: &str) -> anyhow::Result<()> {
    let status = Command::new("sqlx")
        .arg("migrate")
        .arg("add")
        .arg(migration_name)
        .arg("-r")
        .status()
        .await?;
    if !status.success() {
        anyhow::bail!("sqlx migrate add exited with {}", status);
    }
    Ok(())
}

/// Versions recorded as successfully applied, newest first.
async fn applied_versions(pool: &PgPool) -> anyhow::Result<Vec<i64>> {
    let (exists,): (bool,) =
        sqlx::query_as("SELECT to_regclass('public._sqlx_migrations') IS NOT NULL")
            .fetch_one(pool)
            .await?;
    if !exists {
        return Ok(vec![]);
    }
    let rows: Vec<(i64,)> =
        sqlx::query_as("SELECT version FROM _sqlx_migrations WHERE success ORDER BY version DESC")
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|x| x.0).collect())
}

pub async fn db_list(pool: &PgPool) -> anyhow::Result<()> {
    let applied = applied_versions(pool).await?;
    for migration in MIGRATOR
        .iter()
        .filter(|x| !x.migration_type.is_down_migration())
    {
        let status = if applied.contains(&migration.version) {
            "installed"
        } else {
            "pending"
        };
        println!(
            "{}/{} {}",
            migration.version, status, migration.description
        );
    }
    Ok(())
}

pub async fn db_migrate(pool: &PgPool) -> anyhow::Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Reverts the newest applied migration only.
pub async fn db_revert(pool: &PgPool) -> anyhow::Result<()> {
    let applied = applied_versions(pool).await?;
    let Some(latest) = applied.first() else {
        println!("no migration to revert");
        return Ok(());
    };
    let target = applied.get(1).copied().unwrap_or(0);
    MIGRATOR.undo(pool, target).await?;
    println!("reverted {}", latest);
    Ok(())
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;

    #[sqlx::test]
    async fn test_revert_then_migrate(pool: PgPool) -> anyhow::Result<()> {
        // Given
        let before = applied_versions(&pool).await?;
        assert_eq!(before.len(), 2);

        // When revert
        db_revert(&pool).await?;

        // Expect feedback table gone, users table kept
        let after = applied_versions(&pool).await?;
        assert_eq!(after, before[1..].to_vec());
        let (feedback_exists,): (bool,) =
            sqlx::query_as("SELECT to_regclass('public.feedback') IS NOT NULL")
                .fetch_one(&pool)
                .await?;
        assert!(!feedback_exists);

        // When migrate
        db_migrate(&pool).await?;

        // Expect
        assert_eq!(applied_versions(&pool).await?, before);
        Ok(())
    }
}
