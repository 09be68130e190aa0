use std::sync::Arc;

use chrono::Local;
use poem::{
    handler,
    web::{cookie::CookieJar, Data, Form, Path},
    IntoResponse, Response,
};
use serde_json::json;
use sqlx::{Postgres, Transaction};
use validator::Validate;

use crate::{
    core::{page::Page, security::get_user_from_session},
    model::{feedback::Feedback, user::User},
    repository::{
        feedback::{create_feedback, delete_feedback, get_feedback_by_id, update_feedback},
        user::get_user_by_username,
    },
    route::user::user_not_found,
    schema::{
        common::{form_errors, FormErrors, NotFoundResponse},
        feedback::FeedbackForm,
    },
    AppState,
};

const LOCATION: &str = "route.feedback";

enum FeedbackAccess {
    Owned(Feedback),
    NotOwned,
    NotFound,
}

async fn feedback_access(
    tx: &mut Transaction<'_, Postgres>,
    id: i32,
    request_user: &User,
) -> anyhow::Result<FeedbackAccess> {
    let access = match get_feedback_by_id(tx, id).await? {
        Some(feedback) if feedback.is_owned_by(&request_user.username) => {
            FeedbackAccess::Owned(feedback)
        }
        Some(_) => FeedbackAccess::NotOwned,
        None => FeedbackAccess::NotFound,
    };
    Ok(access)
}

fn feedback_not_found(id: i32) -> Response {
    NotFoundResponse {
        message: format!("feedback {} not found", id),
    }
    .into_response()
}

fn render_add(page: Page<'_>, username: &str, form: &FeedbackForm, errors: &FormErrors) -> Response {
    page.render(
        "feedback_form",
        json!({
            "heading": "Add feedback",
            "submit": "Add",
            "action": format!("/users/{}/feedback/add", username),
            "form": form,
            "errors": errors,
        }),
    )
}

fn render_update(page: Page<'_>, id: i32, form: &FeedbackForm, errors: &FormErrors) -> Response {
    page.render(
        "feedback_form",
        json!({
            "heading": "Edit feedback",
            "submit": "Update",
            "action": format!("/feedback/{}/update", id),
            "form": form,
            "errors": errors,
        }),
    )
}

#[handler]
pub async fn feedback_add_page(
    Path(username): Path<String>,
    state: Data<&Arc<AppState>>,
    cookie_jar: &CookieJar,
) -> Response {
    let mut page = match Page::load(&state, cookie_jar, LOCATION, "feedback_add_page") {
        Ok(val) => val,
        Err(resp) => return resp,
    };

    // Begin db transaction
    let mut tx = match state.db.begin().await {
        Ok(val) => val,
        Err(err) => return page.internal_error("begin transaction", &err.to_string()),
    };

    // Validate session user
    let request_user = match get_user_from_session(&mut tx, &page.session.data).await {
        Ok(Some(val)) => val,
        Ok(None) => return page.login_required(),
        Err(err) => return page.internal_error("get user from session", &err.to_string()),
    };
    if request_user.username != username {
        match get_user_by_username(&mut tx, &username).await {
            Ok(Some(_)) => {}
            Ok(None) => return user_not_found(&username),
            Err(err) => return page.internal_error("get_user_by_username", &err.to_string()),
        };
        page.flash("danger", "You can only add feedback as yourself!");
        return page.redirect(&format!("/users/{}", request_user.username));
    }

    render_add(page, &username, &FeedbackForm::default(), &FormErrors::new())
}

#[handler]
pub async fn feedback_add(
    Path(username): Path<String>,
    state: Data<&Arc<AppState>>,
    cookie_jar: &CookieJar,
    Form(form): Form<FeedbackForm>,
) -> Response {
    let mut page = match Page::load(&state, cookie_jar, LOCATION, "feedback_add") {
        Ok(val) => val,
        Err(resp) => return resp,
    };

    // Begin db transaction
    let mut tx = match state.db.begin().await {
        Ok(val) => val,
        Err(err) => return page.internal_error("begin transaction", &err.to_string()),
    };

    // Validate session user
    let request_user = match get_user_from_session(&mut tx, &page.session.data).await {
        Ok(Some(val)) => val,
        Ok(None) => return page.login_required(),
        Err(err) => return page.internal_error("get user from session", &err.to_string()),
    };
    if request_user.username != username {
        match get_user_by_username(&mut tx, &username).await {
            Ok(Some(_)) => {}
            Ok(None) => return user_not_found(&username),
            Err(err) => return page.internal_error("get_user_by_username", &err.to_string()),
        };
        tracing::warn!(
            "{} tried to add feedback as {}",
            request_user.username,
            username
        );
        page.flash("danger", "You can only add feedback as yourself!");
        return page.redirect(&format!("/users/{}", request_user.username));
    }

    if let Err(err) = form.validate() {
        return render_add(page, &username, &form, &form_errors(&err));
    }

    let now = Local::now().fixed_offset();
    let feedback =
        match create_feedback(&mut tx, &form.title, &form.content, &request_user.username, &now)
            .await
        {
            Ok(val) => val,
            Err(err) => return page.internal_error("create_feedback", &err.to_string()),
        };
    if let Err(err) = tx.commit().await {
        return page.internal_error("commit transaction", &err.to_string());
    }

    tracing::info!("feedback {} added by {}", feedback.id, feedback.username);
    page.flash("success", "Feedback added!");
    page.redirect(&format!("/users/{}", request_user.username))
}

#[handler]
pub async fn feedback_update_page(
    Path(id): Path<i32>,
    state: Data<&Arc<AppState>>,
    cookie_jar: &CookieJar,
) -> Response {
    let mut page = match Page::load(&state, cookie_jar, LOCATION, "feedback_update_page") {
        Ok(val) => val,
        Err(resp) => return resp,
    };

    // Begin db transaction
    let mut tx = match state.db.begin().await {
        Ok(val) => val,
        Err(err) => return page.internal_error("begin transaction", &err.to_string()),
    };

    // Validate session user
    let request_user = match get_user_from_session(&mut tx, &page.session.data).await {
        Ok(Some(val)) => val,
        Ok(None) => return page.login_required(),
        Err(err) => return page.internal_error("get user from session", &err.to_string()),
    };

    let feedback = match feedback_access(&mut tx, id, &request_user).await {
        Ok(FeedbackAccess::Owned(val)) => val,
        Ok(FeedbackAccess::NotOwned) => {
            page.flash("danger", "You can only edit your own feedback!");
            return page.redirect(&format!("/users/{}", request_user.username));
        }
        Ok(FeedbackAccess::NotFound) => return feedback_not_found(id),
        Err(err) => return page.internal_error("get_feedback_by_id", &err.to_string()),
    };

    render_update(page, id, &FeedbackForm::from(&feedback), &FormErrors::new())
}

#[handler]
pub async fn feedback_update(
    Path(id): Path<i32>,
    state: Data<&Arc<AppState>>,
    cookie_jar: &CookieJar,
    Form(form): Form<FeedbackForm>,
) -> Response {
    let mut page = match Page::load(&state, cookie_jar, LOCATION, "feedback_update") {
        Ok(val) => val,
        Err(resp) => return resp,
    };

    // Begin db transaction
    let mut tx = match state.db.begin().await {
        Ok(val) => val,
        Err(err) => return page.internal_error("begin transaction", &err.to_string()),
    };

    // Validate session user
    let request_user = match get_user_from_session(&mut tx, &page.session.data).await {
        Ok(Some(val)) => val,
        Ok(None) => return page.login_required(),
        Err(err) => return page.internal_error("get user from session", &err.to_string()),
    };

    let mut feedback = match feedback_access(&mut tx, id, &request_user).await {
        Ok(FeedbackAccess::Owned(val)) => val,
        Ok(FeedbackAccess::NotOwned) => {
            tracing::warn!("{} tried to edit feedback {}", request_user.username, id);
            page.flash("danger", "You can only edit your own feedback!");
            return page.redirect(&format!("/users/{}", request_user.username));
        }
        Ok(FeedbackAccess::NotFound) => return feedback_not_found(id),
        Err(err) => return page.internal_error("get_feedback_by_id", &err.to_string()),
    };

    if let Err(err) = form.validate() {
        return render_update(page, id, &form, &form_errors(&err));
    }

    feedback.title = form.title;
    feedback.content = form.content;
    let now = Local::now().fixed_offset();
    if let Err(err) = update_feedback(&mut tx, &mut feedback, &now).await {
        return page.internal_error("update_feedback", &err.to_string());
    }
    if let Err(err) = tx.commit().await {
        return page.internal_error("commit transaction", &err.to_string());
    }

    page.flash("success", "Feedback updated!");
    page.redirect(&format!("/users/{}", feedback.username))
}

#[handler]
pub async fn feedback_delete(
    Path(id): Path<i32>,
    state: Data<&Arc<AppState>>,
    cookie_jar: &CookieJar,
) -> Response {
    let mut page = match Page::load(&state, cookie_jar, LOCATION, "feedback_delete") {
        Ok(val) => val,
        Err(resp) => return resp,
    };

    // Begin db transaction
    let mut tx = match state.db.begin().await {
        Ok(val) => val,
        Err(err) => return page.internal_error("begin transaction", &err.to_string()),
    };

    // Validate session user
    let request_user = match get_user_from_session(&mut tx, &page.session.data).await {
        Ok(Some(val)) => val,
        Ok(None) => return page.login_required(),
        Err(err) => return page.internal_error("get user from session", &err.to_string()),
    };

    let feedback = match feedback_access(&mut tx, id, &request_user).await {
        Ok(FeedbackAccess::Owned(val)) => val,
        Ok(FeedbackAccess::NotOwned) => {
            tracing::warn!("{} tried to delete feedback {}", request_user.username, id);
            page.flash("danger", "You can only delete your own feedback!");
            return page.redirect(&format!("/users/{}", request_user.username));
        }
        Ok(FeedbackAccess::NotFound) => return feedback_not_found(id),
        Err(err) => return page.internal_error("get_feedback_by_id", &err.to_string()),
    };

    if let Err(err) = delete_feedback(&mut tx, feedback.id).await {
        return page.internal_error("delete_feedback", &err.to_string());
    }
    if let Err(err) = tx.commit().await {
        return page.internal_error("commit transaction", &err.to_string());
    }

    page.flash("info", "Feedback deleted");
    page.redirect(&format!("/users/{}", feedback.username))
}
