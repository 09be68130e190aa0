use std::collections::BTreeMap;

use poem::{http::StatusCode, web::Html, IntoResponse, Response};
use validator::ValidationErrors;

/// Field name to messages, as consumed by the form templates.
pub type FormErrors = BTreeMap<String, Vec<String>>;

pub fn form_errors(errors: &ValidationErrors) -> FormErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|err| match &err.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid {}", field),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

pub fn field_error(field: &str, message: &str) -> FormErrors {
    let mut errors = FormErrors::new();
    errors.insert(field.to_string(), vec![message.to_string()]);
    errors
}

pub struct InternalServerErrorResponse {
    pub location: String,
    pub function: String,
    pub step: String,
    pub error: String,
}

impl InternalServerErrorResponse {
    pub fn new(location: &str, function: &str, step: &str, error: &str) -> Self {
        Self {
            location: location.to_string(),
            function: function.to_string(),
            step: step.to_string(),
            error: error.to_string(),
        }
    }
}

impl IntoResponse for InternalServerErrorResponse {
    fn into_response(self) -> Response {
        tracing::error!(
            location = %self.location,
            function = %self.function,
            step = %self.step,
            "{}",
            self.error
        );
        // details stay in the log
        Html("<h1>500 Internal Server Error</h1><p>Something went wrong, please try again later.</p>")
            .with_status(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response()
    }
}

pub struct NotFoundResponse {
    pub message: String,
}

impl IntoResponse for NotFoundResponse {
    fn into_response(self) -> Response {
        Html(format!(
            "<h1>404 Not Found</h1><p>{}</p><a href=\"/\">Back</a>",
            handlebars::html_escape(&self.message)
        ))
        .with_status(StatusCode::NOT_FOUND)
        .into_response()
    }
}
