use chrono::Local;
use fake::{
    faker::lorem::en::{Paragraph, Sentence},
    Dummy, Fake, Faker,
};
use sqlx::PgPool;

use crate::model::feedback::{Feedback, TABLE_NAME};

/// Builds feedback rows; `ext` usually carries the owning username since the
/// generated rows need an existing user.
pub struct FeedbackFactory<T: Clone> {
    modifier_one: fn(x: &Feedback, ext: T) -> Feedback,
    modifier_many: fn(x: &Feedback, idx: usize, ext: T) -> Feedback,
}

impl<T: Clone> Default for FeedbackFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> FeedbackFactory<T> {
    pub fn new() -> Self {
        Self {
            modifier_one: |x, _| x.clone(),
            modifier_many: |x, _, _| x.clone(),
        }
    }

    pub fn modified_one(&mut self, modifier: fn(x: &Feedback, ext: T) -> Feedback) {
        self.modifier_one = modifier
    }

    pub fn modified_many(&mut self, modifier: fn(x: &Feedback, idx: usize, ext: T) -> Feedback) {
        self.modifier_many = modifier
    }

    pub async fn generate_one(&mut self, db: &PgPool, ext: T) -> anyhow::Result<Feedback> {
        let data = FeedbackDummy::generate();
        let data = (self.modifier_one)(&data, ext);
        insert_feedback(db, &data).await
    }

    pub async fn generate_many(
        &mut self,
        db: &PgPool,
        num: u32,
        ext: T,
    ) -> anyhow::Result<Vec<Feedback>> {
        let mut result: Vec<Feedback> = vec![];
        for idx in 0..num as usize {
            let data = FeedbackDummy::generate();
            let data = (self.modifier_many)(&data, idx, ext.clone());
            result.push(insert_feedback(db, &data).await?);
        }
        Ok(result)
    }
}

/// Id is assigned by the database, the returned row carries it.
async fn insert_feedback(db: &PgPool, data: &Feedback) -> anyhow::Result<Feedback> {
    let feedback: Feedback = sqlx::query_as(
        format!(
            r#"
        INSERT INTO {} (title, content, username, created_date, updated_date)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *"#,
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(&data.title)
    .bind(&data.content)
    .bind(&data.username)
    .bind(data.created_date)
    .bind(data.updated_date)
    .fetch_one(db)
    .await?;
    Ok(feedback)
}

#[derive(Debug, Dummy, Clone)]
struct FeedbackDummy {
    #[dummy(faker = "Sentence(1..5)")]
    pub title: String,
    #[dummy(faker = "Paragraph(1..3)")]
    pub content: String,
}

impl FeedbackDummy {
    pub fn generate() -> Feedback {
        let dummy = Faker.fake::<Self>();
        let now = Local::now().fixed_offset();
        Feedback {
            id: 0,
            title: dummy.title.chars().take(100).collect(),
            content: dummy.content,
            username: String::new(),
            created_date: Some(now),
            updated_date: Some(now),
        }
    }
}
