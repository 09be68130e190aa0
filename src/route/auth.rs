use std::sync::Arc;

use poem::{
    handler,
    web::{cookie::CookieJar, Data, Form},
    Response,
};
use serde_json::json;
use validator::Validate;

use crate::{
    core::{
        page::Page,
        security::{authenticate, register_user},
        sqlx_utils::unique_violation,
    },
    repository::user::create_user,
    schema::{
        auth::{LoginForm, RegisterForm},
        common::{field_error, form_errors, FormErrors},
    },
    AppState,
};

const LOCATION: &str = "route.auth";

#[handler]
pub async fn index(state: Data<&Arc<AppState>>, cookie_jar: &CookieJar) -> Response {
    let page = match Page::load(&state, cookie_jar, LOCATION, "index") {
        Ok(val) => val,
        Err(resp) => return resp,
    };
    let uri = match page.session.username() {
        Some(username) => format!("/users/{}", username),
        None => "/login".to_string(),
    };
    page.redirect(&uri)
}

fn render_register(page: Page<'_>, form: &RegisterForm, errors: &FormErrors) -> Response {
    page.render("register", json!({ "form": form, "errors": errors }))
}

#[handler]
pub async fn register_page(state: Data<&Arc<AppState>>, cookie_jar: &CookieJar) -> Response {
    let page = match Page::load(&state, cookie_jar, LOCATION, "register_page") {
        Ok(val) => val,
        Err(resp) => return resp,
    };
    render_register(page, &RegisterForm::default(), &FormErrors::new())
}

#[handler]
pub async fn register(
    state: Data<&Arc<AppState>>,
    cookie_jar: &CookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let mut page = match Page::load(&state, cookie_jar, LOCATION, "register") {
        Ok(val) => val,
        Err(resp) => return resp,
    };
    if let Err(err) = form.validate() {
        return render_register(page, &form, &form_errors(&err));
    }

    let new_user = match register_user(&form) {
        Ok(val) => val,
        Err(err) => return page.internal_error("hash password", &err.to_string()),
    };

    // Begin db transaction
    let mut tx = match state.db.begin().await {
        Ok(val) => val,
        Err(err) => return page.internal_error("begin transaction", &err.to_string()),
    };
    if let Err(err) = create_user(&mut tx, &new_user).await {
        let errors = match unique_violation(&err).as_deref() {
            Some("users_email_key") => field_error("email", "Email already registered"),
            Some(_) => field_error("username", "Username taken. Please pick another"),
            None => return page.internal_error("create user", &err.to_string()),
        };
        tracing::info!("registration rejected for {}: {:?}", form.username, errors);
        return render_register(page, &form, &errors);
    }
    if let Err(err) = tx.commit().await {
        return page.internal_error("commit transaction", &err.to_string());
    }

    tracing::info!("user {} registered", new_user.username);
    page.session.login(&new_user.username);
    page.flash("success", "Welcome! Successfully Created Your Account!");
    page.redirect(&format!("/users/{}", new_user.username))
}

fn render_login(page: Page<'_>, form: &LoginForm, errors: &FormErrors) -> Response {
    page.render("login", json!({ "form": form, "errors": errors }))
}

#[handler]
pub async fn login_page(state: Data<&Arc<AppState>>, cookie_jar: &CookieJar) -> Response {
    let page = match Page::load(&state, cookie_jar, LOCATION, "login_page") {
        Ok(val) => val,
        Err(resp) => return resp,
    };
    render_login(page, &LoginForm::default(), &FormErrors::new())
}

#[handler]
pub async fn login(
    state: Data<&Arc<AppState>>,
    cookie_jar: &CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let mut page = match Page::load(&state, cookie_jar, LOCATION, "login") {
        Ok(val) => val,
        Err(resp) => return resp,
    };
    if let Err(err) = form.validate() {
        return render_login(page, &form, &form_errors(&err));
    }

    // Begin db transaction
    let mut tx = match state.db.begin().await {
        Ok(val) => val,
        Err(err) => return page.internal_error("begin transaction", &err.to_string()),
    };
    let user = match authenticate(&mut tx, &form.username, &form.password).await {
        Ok(val) => val,
        Err(err) => return page.internal_error("authenticate", &err.to_string()),
    };
    let user = match user {
        Some(val) => val,
        None => {
            tracing::info!("failed login for {}", form.username);
            let errors = field_error("username", "Incorrect Username or Password.");
            return render_login(page, &form, &errors);
        }
    };

    page.session.login(&user.username);
    page.flash("primary", &format!("Welcome back, {}!", user.username));
    page.redirect(&format!("/users/{}", user.username))
}

#[handler]
pub async fn logout(state: Data<&Arc<AppState>>, cookie_jar: &CookieJar) -> Response {
    let mut page = match Page::load(&state, cookie_jar, LOCATION, "logout") {
        Ok(val) => val,
        Err(resp) => return resp,
    };
    if page.session.username().is_some() {
        page.session.logout();
        page.flash("info", "You have logged out successfully");
    }
    page.redirect("/login")
}
