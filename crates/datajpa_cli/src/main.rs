//! Server entry point.
//!
//! Reads configuration from the environment (and `.env`), starts logging,
//! opens and migrates the database, seeds demo members into an empty store
//! and serves the member API until Ctrl-C or SIGTERM.

mod config;

use anyhow::{anyhow, Context, Result};
use datajpa_core::db::open_db_at;
use datajpa_core::{init_logging, init_stderr_logging, sqlite_member_service, with_transaction};
use datajpa_web::{build_router, AppState};
use log::{error, info};

use crate::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    let logging = match &config.log_dir {
        Some(dir) => init_logging(&config.log_level, dir),
        None => init_stderr_logging(&config.log_level),
    };
    logging
        .map_err(|err| anyhow!(err))
        .context("failed to initialize logging")?;

    let mut conn = open_db_at(&config.db_path)
        .with_context(|| format!("failed to open database `{}`", config.db_path))?;

    let seeded = with_transaction(&mut conn, |tx| {
        sqlite_member_service(tx)?.seed_members_if_empty(config.seed_members)
    })
    .context("failed to seed members")?;

    let app = build_router(AppState::new(conn));
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!(
        "event=server_start module=cli status=ok bind_addr={} db_path={} seeded={}",
        config.bind_addr, config.db_path, seeded
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("event=server_stop module=cli status=ok");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(
                "event=signal_install module=cli status=error signal=ctrl_c error={}",
                err
            );
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(
                    "event=signal_install module=cli status=error signal=sigterm error={}",
                    err
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
