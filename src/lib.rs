use std::sync::Arc;

use handlebars::Handlebars;
use poem::{
    get,
    middleware::{AddData, CookieJarManager, Tracing},
    post, Endpoint, EndpointExt, Route,
};
use r2d2::Pool as r2d2Pool;
use redis::Client;
use route::{
    auth::{index, login, login_page, logout, register, register_page},
    feedback::{
        feedback_add, feedback_add_page, feedback_delete, feedback_update, feedback_update_page,
    },
    user::{user_delete, user_detail, user_list},
};
use settings::Config;
use sqlx::{Pool, Postgres};

pub mod cli;
pub mod core;
pub mod factory;
pub mod model;
pub mod repository;
pub mod route;
pub mod schema;
pub mod settings;

pub struct AppState {
    pub db: Pool<Postgres>,
    pub redis_conn: r2d2Pool<Client>,
    pub templates: Handlebars<'static>,
    pub config: Config,
}

pub fn init_route(app_state: Arc<AppState>) -> impl Endpoint {
    Route::new()
        .at("/", get(index))
        .at("/register", get(register_page).post(register))
        .at("/login", get(login_page).post(login))
        .at("/logout", get(logout))
        .at("/users", get(user_list))
        .at("/users/:username", get(user_detail))
        .at("/users/:username/delete", post(user_delete))
        .at(
            "/users/:username/feedback/add",
            get(feedback_add_page).post(feedback_add),
        )
        .at(
            "/feedback/:id/update",
            get(feedback_update_page).post(feedback_update),
        )
        .at("/feedback/:id/delete", post(feedback_delete))
        .with(AddData::new(app_state))
        .with(CookieJarManager::new())
        .with(Tracing)
}
