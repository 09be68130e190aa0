use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::feedback::Feedback;

#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct FeedbackForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

impl From<&Feedback> for FeedbackForm {
    fn from(feedback: &Feedback) -> Self {
        Self {
            title: feedback.title.clone(),
            content: feedback.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DetailFeedback {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub username: String,
    pub created_date: Option<String>,
    pub updated_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::common::form_errors;

    #[test]
    fn test_feedback_form() {
        let form = FeedbackForm {
            title: "Great".to_string(),
            content: "Nice work".to_string(),
        };
        assert!(form.validate().is_ok());

        let form = FeedbackForm {
            title: "x".repeat(101),
            content: "".to_string(),
        };
        let errors = form_errors(&form.validate().unwrap_err());
        assert!(errors.contains_key("title"));
        assert_eq!(
            errors.get("content"),
            Some(&vec!["Content is required".to_string()])
        );
    }
}
