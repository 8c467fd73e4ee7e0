//! Long-running server process.

use dayboard_core::db::shared_db;
use dayboard_core::{init_console_logging, init_logging};
use dayboard_server::{build_router, AppState, CorsPolicy, ServerConfig};
use log::{error, info};

#[tokio::main]
async fn main() {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };

    let logging = match config.log_dir.as_deref() {
        Some(dir) => init_logging(&config.log_level, dir),
        None => init_console_logging(&config.log_level),
    };
    if let Err(err) = logging {
        eprintln!("error: {err}");
        std::process::exit(2);
    }

    let db = match shared_db(&config.db_path) {
        Ok(db) => db,
        Err(err) => {
            error!(
                "event=server_start module=server status=error error_code=db_unavailable error={err}"
            );
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    let app = build_router(
        AppState::new(db),
        CorsPolicy::new(config.allowed_origins.clone()),
    );

    let listener = match tokio::net::TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(
                "event=server_start module=server status=error error_code=bind_failed addr={} error={err}",
                config.bind
            );
            eprintln!("error: failed to bind {}: {err}", config.bind);
            std::process::exit(1);
        }
    };
    info!(
        "event=server_start module=server status=ok addr={} db_path={} origins={}",
        config.bind,
        config.db_path.display(),
        config.allowed_origins.len()
    );

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("event=server_stop module=server status=error error={err}");
    }
    info!("event=server_stop module=server status=ok");
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("event=shutdown_signal module=server status=ok");
}
