use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use chrono::Local;
use sqlx::{Postgres, Transaction};

use crate::{
    model::user::User,
    repository::user::get_user_by_username,
    schema::auth::RegisterForm,
};

use super::session::SessionData;

/// password hashing
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);

    // Argon2 with default params (Argon2id v19)
    let argon2 = Argon2::default();

    // Hash password to PHC string ($argon2id$v=19$...)
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    Ok(password_hash)
}

/// password hash verification
pub fn verify_hash_password(
    password: &str,
    password_hash: &str,
) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(password_hash)?;
    let verify = Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok();
    Ok(verify)
}

/// Build a new user from a validated registration form, password hashed.
pub fn register_user(form: &RegisterForm) -> anyhow::Result<User> {
    let password = hash_password(&form.password).map_err(|err| anyhow::anyhow!(err))?;
    Ok(User {
        username: form.username.clone(),
        password,
        email: form.email.clone(),
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        created_date: Some(Local::now().fixed_offset()),
    })
}

/// Returns the user when `username` exists and `password` matches its hash.
pub async fn authenticate(
    tx: &mut Transaction<'_, Postgres>,
    username: &str,
    password: &str,
) -> anyhow::Result<Option<User>> {
    let user = match get_user_by_username(tx, username).await? {
        Some(val) => val,
        None => return Ok(None),
    };
    let is_valid =
        verify_hash_password(password, &user.password).map_err(|err| anyhow::anyhow!(err))?;
    if !is_valid {
        return Ok(None);
    }
    Ok(Some(user))
}

/// The logged in user of a session, if any and still present on db.
pub async fn get_user_from_session(
    tx: &mut Transaction<'_, Postgres>,
    session: &SessionData,
) -> anyhow::Result<Option<User>> {
    let username = match &session.username {
        Some(val) => val,
        None => return Ok(None),
    };
    get_user_by_username(tx, username).await
}


#[cfg(test)]
mod test_authenticate {
    use sqlx::PgPool;

    use crate::{
        core::{
            security::{authenticate, get_user_from_session, hash_password},
            session::SessionData,
        },
        factory::user::UserFactory,
        model::user::User,
    };

    #[sqlx::test]
    async fn test_authenticate(pool: PgPool) -> anyhow::Result<()> {
        // Given
        let mut user_factory = UserFactory::new();
        user_factory.modified_one(|data, _| User {
            username: "test_user".to_string(),
            password: hash_password("password").unwrap(),
            ..data.clone()
        });
        user_factory.generate_one(&pool, ()).await?;
        let mut tx = pool.begin().await?;

        // Expect
        let user = authenticate(&mut tx, "test_user", "password").await?;
        assert_eq!(user.map(|x| x.username), Some("test_user".to_string()));
        assert!(authenticate(&mut tx, "test_user", "wrong").await?.is_none());
        assert!(authenticate(&mut tx, "nobody", "password").await?.is_none());
        Ok(())
    }

    #[sqlx::test]
    async fn test_get_user_from_session(pool: PgPool) -> anyhow::Result<()> {
        // Given
        let user = UserFactory::new().generate_one(&pool, ()).await?;
        let mut tx = pool.begin().await?;

        // Expect
        let anonymous = SessionData::default();
        assert!(get_user_from_session(&mut tx, &anonymous).await?.is_none());
        let session = SessionData {
            username: Some(user.username.clone()),
            flashes: vec![],
        };
        let session_user = get_user_from_session(&mut tx, &session).await?;
        assert_eq!(session_user.map(|x| x.username), Some(user.username));
        let stale = SessionData {
            username: Some("deleted_user".to_string()),
            flashes: vec![],
        };
        assert!(get_user_from_session(&mut tx, &stale).await?.is_none());
        Ok(())
    }
}
