// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trippple_server::{
    api::router,
    auth::IdTokenVerifier,
    blockchain::SuiClient,
    ceremony::HttpProver,
    config::{AppConfig, LogFormat},
    state::AppState,
    storage::Database,
};

/// Time given to in-flight requests after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(2);
        }
    };
    init_tracing(config.log_format);

    let db = Arc::new(Database::open(&config.database_path)?);
    let chain = Arc::new(SuiClient::new(
        config.network.clone(),
        config.rpc_url.as_deref(),
        config.rpc_timeout,
    )?);
    let prover = Arc::new(HttpProver::new(config.prover_url.clone(), config.prover_timeout)?);
    let verifier = if config.oidc_verify {
        IdTokenVerifier::verifying(&config.oidc_clients())?
    } else {
        IdTokenVerifier::decode_only()
    };

    tracing::info!(
        app = %config.app_name,
        network = config.network.name,
        prover = %config.prover_url,
        oidc_verify = config.oidc_verify,
        "starting"
    );

    let addr = config.bind_addr;
    let tls = config.tls.clone();
    let state = AppState::new(config, db, chain, prover, verifier);
    let app = router(state);

    match tls {
        Some(paths) => {
            rustls::crypto::ring::default_provider()
                .install_default()
                .map_err(|_| "rustls crypto provider already installed")?;
            let tls_config = RustlsConfig::from_pem_file(&paths.cert, &paths.key).await?;

            let handle = Handle::new();
            let shutdown = handle.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
            });

            tracing::info!(%addr, "listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!(%addr, "listening on http (docs at /docs)");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    tracing::info!("server stopped");
    Ok(())
}
