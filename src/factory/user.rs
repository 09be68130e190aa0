use chrono::Local;
use fake::{
    faker::{
        internet::en::{Password, SafeEmail, Username},
        name::en::{FirstName, LastName},
    },
    Dummy, Fake, Faker,
};
use serde::Deserialize;
use sqlx::PgPool;

use crate::model::user::{User, TABLE_NAME};

pub struct UserFactory<T: Clone> {
    modifier_one: fn(x: &User, ext: T) -> User,
    modifier_many: fn(x: &User, idx: usize, ext: T) -> User,
}

impl<T: Clone> Default for UserFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> UserFactory<T> {
    pub fn new() -> Self {
        Self {
            modifier_one: |x, _| x.clone(),
            modifier_many: |x, _, _| x.clone(),
        }
    }

    pub fn modified_one(&mut self, modifier: fn(x: &User, ext: T) -> User) {
        self.modifier_one = modifier
    }

    pub fn modified_many(&mut self, modifier: fn(x: &User, idx: usize, ext: T) -> User) {
        self.modifier_many = modifier
    }

    pub async fn generate_one(&mut self, db: &PgPool, ext: T) -> anyhow::Result<User> {
        let data = UserDummy::generate_one();
        let data = (self.modifier_one)(&data, ext);
        insert_user(db, &data).await?;
        Ok(data)
    }

    pub async fn generate_many(
        &mut self,
        db: &PgPool,
        num: u32,
        ext: T,
    ) -> anyhow::Result<Vec<User>> {
        let data = UserDummy::generate_many(num);
        let mut result: Vec<User> = vec![];
        for (idx, item) in data.iter().enumerate() {
            result.push((self.modifier_many)(item, idx, ext.clone()));
        }
        for item in result.iter() {
            insert_user(db, item).await?;
        }
        Ok(result)
    }
}

async fn insert_user(db: &PgPool, data: &User) -> anyhow::Result<()> {
    sqlx::query(
        format!(
            r#"
        INSERT INTO {} (username, password, email, first_name, last_name, created_date)
        VALUES ($1, $2, $3, $4, $5, $6)"#,
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(&data.username)
    .bind(&data.password)
    .bind(&data.email)
    .bind(&data.first_name)
    .bind(&data.last_name)
    .bind(data.created_date)
    .execute(db)
    .await?;
    Ok(())
}

#[derive(Debug, Deserialize, Dummy, Clone)]
struct UserDummy {
    #[dummy(faker = "Username()")]
    pub username: String,
    #[dummy(faker = "Password(8..20)")]
    pub password: String,
    #[dummy(faker = "SafeEmail()")]
    pub email: String,
    #[dummy(faker = "FirstName()")]
    pub first_name: String,
    #[dummy(faker = "LastName()")]
    pub last_name: String,
}

impl UserDummy {
    fn into_user(self, idx: usize) -> User {
        // keep within the column widths, suffix keeps generated batches unique
        let suffix = idx.to_string();
        let username: String = self.username.chars().take(20 - suffix.len()).collect();
        let email: String = self.email.chars().take(50 - suffix.len()).collect();
        User {
            username: format!("{}{}", username, suffix),
            password: self.password,
            email: format!("{}{}", suffix, email),
            first_name: self.first_name.chars().take(30).collect(),
            last_name: self.last_name.chars().take(30).collect(),
            created_date: Some(Local::now().fixed_offset()),
        }
    }

    pub fn generate_one() -> User {
        Faker.fake::<Self>().into_user(0)
    }

    pub fn generate_many(num: u32) -> Vec<User> {
        (0..num as usize)
            .map(|idx| Faker.fake::<Self>().into_user(idx))
            .collect()
    }
}
