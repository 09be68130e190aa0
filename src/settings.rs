use std::env;

use serde::Deserialize;
use tracing::info;

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_env")]
    pub env: String, // file / server
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub redis_url: String,
    /// session lifetime in seconds
    #[serde(default = "default_session_exp")]
    pub session_exp: u64,
    #[serde(default)]
    pub cookie_secure: bool,
}

fn default_env() -> String {
    "file".to_string()
}

fn default_session_exp() -> u64 {
    60 * 60 * 24
}

pub fn get_config() -> anyhow::Result<Config> {
    let env_var = env::var("ENV").unwrap_or("file".to_string());
    if env_var == "file" {
        info!("using .env file as environtment variable");
        let _ = dotenvy::dotenv();
    } else {
        info!("using server environtment as environtment variable");
    }
    Ok(envy::from_env::<Config>()?)
}
