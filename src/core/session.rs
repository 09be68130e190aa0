use std::time::Duration;

use poem::web::cookie::{Cookie, CookieJar, SameSite};
use redis::ConnectionLike;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::settings::Config;

pub const SESSION_COOKIE: &str = "session_id";
const KEY_PREFIX: &str = "session:";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Flash {
    /// bootstrap alert class: success / primary / info / danger
    pub category: String,
    pub message: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionData {
    pub username: Option<String>,
    #[serde(default)]
    pub flashes: Vec<Flash>,
}

fn session_key(session_id: &str) -> String {
    format!("{}{}", KEY_PREFIX, session_id)
}

pub fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn save_session<C: ConnectionLike>(
    redis_conn: &mut C,
    session_id: &str,
    session_data: &SessionData,
    config: &Config,
) -> anyhow::Result<()> {
    let session_json = serde_json::to_string(session_data)?;
    redis::Cmd::set_ex(session_key(session_id), session_json, config.session_exp)
        .exec(redis_conn)?;
    Ok(())
}

pub fn get_session<C: ConnectionLike>(
    redis_conn: &mut C,
    session_id: &str,
) -> anyhow::Result<Option<SessionData>> {
    let res: Option<String> = redis::cmd("GET")
        .arg(session_key(session_id))
        .query(redis_conn)?;
    match res {
        Some(val) => Ok(Some(serde_json::from_str(val.as_str())?)),
        None => Ok(None),
    }
}

pub fn remove_session<C: ConnectionLike>(
    redis_conn: &mut C,
    session_id: &str,
) -> anyhow::Result<bool> {
    let removed: i64 = redis::cmd("DEL")
        .arg(session_key(session_id))
        .query(redis_conn)?;
    Ok(removed > 0)
}

/// Session bound to the current request's cookie.
///
/// Loaded once per request, mutated by the handler, then written back with
/// [`RequestSession::commit`] which also (re)issues the cookie when needed.
#[derive(Debug, Default)]
pub struct RequestSession {
    id: Option<String>,
    /// previous id to drop from redis on commit, set when the id is rotated
    stale_id: Option<String>,
    cookie_dirty: bool,
    pub data: SessionData,
}

impl RequestSession {
    pub fn load<C: ConnectionLike>(
        redis_conn: &mut C,
        cookie_jar: &CookieJar,
    ) -> anyhow::Result<Self> {
        let session_id = match cookie_jar.get(SESSION_COOKIE) {
            Some(cookie) => cookie.value_str().to_string(),
            None => return Ok(Self::default()),
        };
        match get_session(redis_conn, &session_id)? {
            Some(data) => Ok(Self {
                id: Some(session_id),
                data,
                ..Default::default()
            }),
            // expired or unknown id, start over
            None => Ok(Self::default()),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.data.username.as_deref()
    }

    pub fn flash(&mut self, category: &str, message: &str) {
        self.data.flashes.push(Flash {
            category: category.to_string(),
            message: message.to_string(),
        });
    }

    /// Pending flash messages, removed from the session.
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.data.flashes)
    }

    /// Marks the session as authenticated under a fresh id.
    pub fn login(&mut self, username: &str) {
        self.rotate();
        self.data.username = Some(username.to_string());
    }

    pub fn logout(&mut self) {
        self.rotate();
        self.data.username = None;
    }

    fn rotate(&mut self) {
        if let Some(old) = self.id.take() {
            self.stale_id = Some(old);
        }
    }

    /// Persists the session. Anonymous sessions with nothing to carry are not
    /// stored, so a plain page view never creates one.
    pub fn commit<C: ConnectionLike>(
        &mut self,
        redis_conn: &mut C,
        cookie_jar: &CookieJar,
        config: &Config,
    ) -> anyhow::Result<()> {
        if let Some(stale_id) = self.stale_id.take() {
            remove_session(redis_conn, &stale_id)?;
        }
        if self.data.username.is_none() && self.data.flashes.is_empty() {
            if let Some(id) = self.id.take() {
                remove_session(redis_conn, &id)?;
            }
            return Ok(());
        }
        let session_id = match &self.id {
            Some(val) => val.clone(),
            None => {
                let val = new_session_id();
                self.id = Some(val.clone());
                self.cookie_dirty = true;
                val
            }
        };
        save_session(redis_conn, &session_id, &self.data, config)?;
        if self.cookie_dirty {
            cookie_jar.add(session_cookie(&session_id, config));
            self.cookie_dirty = false;
        }
        Ok(())
    }
}

fn session_cookie(session_id: &str, config: &Config) -> Cookie {
    let mut cookie = Cookie::new_with_str(SESSION_COOKIE, session_id);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(config.cookie_secure);
    cookie.set_max_age(Duration::from_secs(config.session_exp));
    cookie
}
