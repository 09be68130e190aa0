use sqlx::PgPool;
use validator::Validate;

use crate::{
    core::{security::register_user, sqlx_utils::unique_violation},
    repository,
    schema::{auth::RegisterForm, common::form_errors},
};

pub async fn create_user(pool: &PgPool, form: &RegisterForm) -> anyhow::Result<()> {
    if let Err(err) = form.validate() {
        let messages: Vec<String> = form_errors(&err)
            .into_iter()
            .map(|(field, errors)| format!("{}: {}", field, errors.join(", ")))
            .collect();
        anyhow::bail!("invalid user: {}", messages.join("; "));
    }
    let user = register_user(form)?;

    let mut tx = pool.begin().await?;
    if let Err(err) = repository::user::create_user(&mut tx, &user).await {
        return match unique_violation(&err).as_deref() {
            Some("users_email_key") => Err(anyhow::anyhow!("email {} already registered", user.email)),
            Some(_) => Err(anyhow::anyhow!("username {} already taken", user.username)),
            None => Err(err),
        };
    }
    tx.commit().await?;
    tracing::info!("user {} created", user.username);
    Ok(())
}
