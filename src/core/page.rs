use poem::{
    http::StatusCode,
    web::{cookie::CookieJar, Html, Redirect},
    IntoResponse, Response,
};
use r2d2::PooledConnection;
use redis::Client;
use serde_json::{json, Value};

use crate::{schema::common::InternalServerErrorResponse, AppState};

use super::{session::RequestSession, template::render};

/// Per-request view plumbing: the redis connection, the cookie-bound session
/// and the handler name used when reporting failures.
pub struct Page<'a> {
    state: &'a AppState,
    cookie_jar: &'a CookieJar,
    redis_conn: PooledConnection<Client>,
    pub session: RequestSession,
    location: &'static str,
    function: &'static str,
}

impl<'a> Page<'a> {
    pub fn load(
        state: &'a AppState,
        cookie_jar: &'a CookieJar,
        location: &'static str,
        function: &'static str,
    ) -> Result<Self, Response> {
        // get redis conn from pool
        let mut redis_conn = match state.redis_conn.get() {
            Ok(val) => val,
            Err(err) => {
                return Err(InternalServerErrorResponse::new(
                    location,
                    function,
                    "get redis pool connection",
                    &err.to_string(),
                )
                .into_response())
            }
        };
        let session = match RequestSession::load(&mut *redis_conn, cookie_jar) {
            Ok(val) => val,
            Err(err) => {
                return Err(InternalServerErrorResponse::new(
                    location,
                    function,
                    "load session",
                    &err.to_string(),
                )
                .into_response())
            }
        };
        Ok(Self {
            state,
            cookie_jar,
            redis_conn,
            session,
            location,
            function,
        })
    }

    pub fn internal_error(&self, step: &str, err: &str) -> Response {
        InternalServerErrorResponse::new(self.location, self.function, step, err).into_response()
    }

    pub fn flash(&mut self, category: &str, message: &str) {
        self.session.flash(category, message);
    }

    fn commit(&mut self) -> Result<(), Response> {
        if let Err(err) =
            self.session
                .commit(&mut *self.redis_conn, self.cookie_jar, &self.state.config)
        {
            return Err(self.internal_error("commit session", &err.to_string()));
        }
        Ok(())
    }

    /// 303 to `uri`, pending flashes are kept for the next page.
    pub fn redirect(mut self, uri: &str) -> Response {
        if let Err(resp) = self.commit() {
            return resp;
        }
        Redirect::see_other(uri).into_response()
    }

    pub fn login_required(mut self) -> Response {
        if self.session.username().is_some() {
            // the session outlived its user
            self.session.logout();
        }
        self.flash("danger", "You're going to need to login first!");
        self.redirect("/login")
    }

    pub fn render(self, template: &str, data: Value) -> Response {
        self.render_with_status(template, data, StatusCode::OK)
    }

    /// Renders `template` with `data` plus the layout's `current_user` and
    /// `flashes`, consuming the flashes.
    pub fn render_with_status(mut self, template: &str, data: Value, status: StatusCode) -> Response {
        let mut data = match data {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        data.insert("current_user".to_string(), json!(self.session.username()));
        data.insert("flashes".to_string(), json!(self.session.take_flashes()));
        let html = match render(&self.state.templates, template, &data) {
            Ok(val) => val,
            Err(err) => return self.internal_error("render template", &err.to_string()),
        };
        if let Err(resp) = self.commit() {
            return resp;
        }
        Html(html).with_status(status).into_response()
    }
}
