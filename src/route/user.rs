use std::sync::Arc;

use poem::{
    handler,
    web::{cookie::CookieJar, Data, Path, Query},
    IntoResponse, Response,
};
use serde_json::json;

use crate::{
    core::{
        page::Page,
        security::get_user_from_session,
        utils::{datetime_to_string_opt, page_params},
    },
    repository::{
        feedback::get_feedback_by_username,
        user::{delete_user, get_all_user, get_user_by_username},
    },
    schema::{
        common::NotFoundResponse,
        feedback::DetailFeedback,
        user::{DetailUser, ListUser, UserListLink, UserListQuery},
    },
    AppState,
};

const LOCATION: &str = "route.user";

pub(crate) fn user_not_found(username: &str) -> Response {
    NotFoundResponse {
        message: format!("user {} not found", username),
    }
    .into_response()
}

#[handler]
pub async fn user_list(
    Query(query): Query<UserListQuery>,
    state: Data<&Arc<AppState>>,
    cookie_jar: &CookieJar,
) -> Response {
    let page = match Page::load(&state, cookie_jar, LOCATION, "user_list") {
        Ok(val) => val,
        Err(resp) => return resp,
    };

    // Begin db transaction
    let mut tx = match state.db.begin().await {
        Ok(val) => val,
        Err(err) => return page.internal_error("begin transaction", &err.to_string()),
    };

    // Validate session user
    match get_user_from_session(&mut tx, &page.session.data).await {
        Ok(Some(_)) => {}
        Ok(None) => return page.login_required(),
        Err(err) => return page.internal_error("get user from session", &err.to_string()),
    };

    let (page_num, page_size) = page_params(query.page, query.page_size, 10, 100);
    let search = query.search.filter(|x| !x.trim().is_empty());
    let (data, counts, page_count) =
        match get_all_user(&mut tx, page_num, page_size, search.clone()).await {
            Ok(val) => val,
            Err(err) => return page.internal_error("get_all_user", &err.to_string()),
        };
    let results: Vec<ListUser> = data
        .iter()
        .map(|x| ListUser {
            username: x.username.clone(),
            full_name: x.full_name(),
        })
        .collect();

    let link = |num: u32| {
        UserListLink {
            page: num,
            page_size,
            search: search.as_deref(),
        }
        .to_query()
    };
    let prev_query = match (page_num > 1).then(|| link(page_num - 1)).transpose() {
        Ok(val) => val,
        Err(err) => return page.internal_error("build page link", &err.to_string()),
    };
    let next_query = match (page_num < page_count).then(|| link(page_num + 1)).transpose() {
        Ok(val) => val,
        Err(err) => return page.internal_error("build page link", &err.to_string()),
    };
    page.render(
        "users",
        json!({
            "results": results,
            "counts": counts,
            "page": page_num,
            "page_size": page_size,
            "page_count": page_count.max(1),
            "prev_query": prev_query,
            "next_query": next_query,
            "search": search,
        }),
    )
}

#[handler]
pub async fn user_detail(
    Path(username): Path<String>,
    state: Data<&Arc<AppState>>,
    cookie_jar: &CookieJar,
) -> Response {
    let page = match Page::load(&state, cookie_jar, LOCATION, "user_detail") {
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

    let user = match get_user_by_username(&mut tx, &username).await {
        Ok(val) => val,
        Err(err) => return page.internal_error("get_user_by_username", &err.to_string()),
    };
    let user = match user {
        Some(val) => val,
        None => return user_not_found(&username),
    };
    let feedback = match get_feedback_by_username(&mut tx, &user.username).await {
        Ok(val) => val,
        Err(err) => return page.internal_error("get_feedback_by_username", &err.to_string()),
    };

    let detail = DetailUser {
        username: user.username.clone(),
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        created_date: datetime_to_string_opt(user.created_date),
        feedback: feedback
            .into_iter()
            .map(|x| DetailFeedback {
                id: x.id,
                title: x.title,
                content: x.content,
                username: x.username,
                created_date: datetime_to_string_opt(x.created_date),
                updated_date: datetime_to_string_opt(x.updated_date),
            })
            .collect(),
    };
    page.render(
        "user",
        json!({
            "user": detail,
            "is_owner": request_user.username == user.username,
        }),
    )
}

#[handler]
pub async fn user_delete(
    Path(username): Path<String>,
    state: Data<&Arc<AppState>>,
    cookie_jar: &CookieJar,
) -> Response {
    let mut page = match Page::load(&state, cookie_jar, LOCATION, "user_delete") {
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
            "{} tried to delete account {}",
            request_user.username,
            username
        );
        page.flash("danger", "You can only delete your own account!");
        return page.redirect(&format!("/users/{}", request_user.username));
    }

    if let Err(err) = delete_user(&mut tx, &request_user.username).await {
        return page.internal_error("delete_user", &err.to_string());
    }
    if let Err(err) = tx.commit().await {
        return page.internal_error("commit transaction", &err.to_string());
    }

    tracing::info!("user {} deleted", request_user.username);
    page.session.logout();
    page.flash("info", "Your account has been deleted");
    page.redirect("/register")
}
