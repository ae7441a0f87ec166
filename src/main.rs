use lemon_api::{
    app, config::Config, pool, run_migrations, utils::telemetry::setup_tracing,
    utils::types::AppState,
};
use listenfd::ListenFd;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    setup_tracing();

    let config = Config::from_env()?;

    if config.run_migrations {
        let db_url = config.database_url.clone();
        let applied = tokio::task::spawn_blocking(move || run_migrations(&db_url)).await??;
        tracing::info!(applied, "migrations up to date");
    }

    let pool = pool::get_pool(&config.database_url).await?;

    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        // if we are given a tcp listener on listen fd 0, we use that one
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        // otherwise fall back to local listening
        None => TcpListener::bind(&config.listen_addr).await?,
    };

    let app = app(AppState::new(pool, config));

    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
