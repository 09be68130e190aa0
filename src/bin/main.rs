use std::sync::Arc;

use feedback_app::{
    core::{
        db::{init_pool, MIGRATOR},
        template::init_templates,
    },
    init_route,
    settings::get_config,
    AppState,
};
use poem::listener::TcpListener;
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_level = Level::DEBUG;
    // Logging to File
    let file_appender = tracing_appender::rolling::daily("./logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(log_level)
        .init();

    // Logging to Console
    // tracing_subscriber::fmt().with_max_level(log_level).init();

    let config = get_config()?;
    tracing::info!("run with config: {:?}", config);

    // Init Database Connection
    tracing::info!("Init Postgres connection on {}", config.database_url);
    let pool = init_pool(&config).await?;
    MIGRATOR.run(&pool).await?;
    // Init Redis Connection
    tracing::info!("Init Redis connection on {}", config.redis_url);
    let client = redis::Client::open(config.redis_url.clone())?;
    let redis_pool = r2d2::Pool::builder().build(client)?;
    let templates = init_templates()?;

    let bind = format!("{}:{}", config.host, config.port);
    // Init App State
    let app_state = Arc::new(AppState {
        db: pool,
        redis_conn: redis_pool,
        templates,
        config,
    });

    let app = init_route(app_state);
    tracing::info!("run server on {}", bind);
    poem::Server::new(TcpListener::bind(bind)).run(app).await?;
    Ok(())
}
