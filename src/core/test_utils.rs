use std::sync::Arc;

use chrono::Local;
use poem::test::TestResponse;
use sqlx::PgPool;

use crate::{
    core::{
        security::hash_password,
        session::{get_session, new_session_id, save_session, SessionData, SESSION_COOKIE},
        template::init_templates,
    },
    model::user::User,
    repository,
    settings::get_config,
    AppState,
};

pub struct TestUser {
    pub user: User,
    pub session_id: String,
}

impl TestUser {
    /// Value for a `cookie` request header carrying this user's session.
    pub fn cookie(&self) -> String {
        format!("{}={}", SESSION_COOKIE, self.session_id)
    }
}

pub fn init_test_state(pool: PgPool) -> anyhow::Result<Arc<AppState>> {
    let config = get_config()?;
    let client = redis::Client::open(config.redis_url.clone())?;
    let redis_pool = r2d2::Pool::builder().build(client)?;
    Ok(Arc::new(AppState {
        db: pool,
        redis_conn: redis_pool,
        templates: init_templates()?,
        config,
    }))
}

/// Inserts a user with a known password and a logged in session for it.
pub async fn generate_test_user(
    state: &AppState,
    username: &str,
    password: &str,
) -> anyhow::Result<TestUser> {
    let user = User {
        username: username.to_string(),
        password: hash_password(password).map_err(|err| anyhow::anyhow!(err))?,
        email: format!("{}@local.com", username),
        first_name: "Test".to_string(),
        last_name: username.to_string(),
        created_date: Some(Local::now().fixed_offset()),
    };
    let mut tx = state.db.begin().await?;
    repository::user::create_user(&mut tx, &user).await?;
    tx.commit().await?;

    let session_id = new_session_id();
    let mut redis_conn = state.redis_conn.get()?;
    save_session(
        &mut *redis_conn,
        &session_id,
        &SessionData {
            username: Some(user.username.clone()),
            flashes: vec![],
        },
        &state.config,
    )?;
    Ok(TestUser { user, session_id })
}

/// Session id issued through the `set-cookie` header of a response, if any.
pub fn session_id_from_set_cookie(resp: &poem::Response) -> Option<String> {
    resp.headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|x| x.to_str().ok())
        .find_map(|x| {
            x.split(';')
                .next()?
                .trim()
                .strip_prefix(&format!("{}=", SESSION_COOKIE))
                .map(|x| x.to_string())
        })
}

pub async fn response_text(resp: TestResponse) -> anyhow::Result<String> {
    Ok(resp.0.into_body().into_string().await?)
}

pub fn session_for(state: &AppState, session_id: &str) -> anyhow::Result<Option<SessionData>> {
    let mut redis_conn = state.redis_conn.get()?;
    get_session(&mut *redis_conn, session_id)
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use crate::core::{
        security::authenticate,
        test_utils::{generate_test_user, init_test_state, session_for},
    };

    #[sqlx::test]
    async fn test_generate_test_user(pool: PgPool) -> anyhow::Result<()> {
        // Given
        let state = init_test_state(pool)?;

        // When
        let res = generate_test_user(&state, "testuser", "testpassword").await?;

        // Expect
        // is user exists on db
        let mut tx = state.db.begin().await?;
        let user = authenticate(&mut tx, "testuser", "testpassword").await?;
        assert!(user.is_some());

        // is session exists on redis
        let session = session_for(&state, &res.session_id)?;
        assert!(session.is_some());
        assert_eq!(session.unwrap().username, Some("testuser".to_string()));
        assert_eq!(res.cookie(), format!("session_id={}", res.session_id));
        Ok(())
    }
}
