use std::{fs::OpenOptions, process::ExitCode, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

use budgetbook::{
    AppState, build_router,
    config::{AppConfig, Args, Environment},
    graceful_shutdown, logging_middleware, open_connection,
};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let environment = Environment::detect(args.railway_environment.as_deref(), args.port);
    setup_logging(environment);

    let config = match AppConfig::from_args(args) {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("Invalid configuration: {error}");
            return ExitCode::FAILURE;
        }
    };

    let connection = match open_connection(&config.db_path, config.db_busy_timeout) {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not open database {}: {error}", config.db_path.display());
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::new(connection, &config.cookie_secret, &config.local_timezone) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("Could not initialize database: {error}");
            return ExitCode::FAILURE;
        }
    };

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(state).layer(middleware::from_fn(logging_middleware)),
    );

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    tracing::info!("HTTP server listening on http://{}", config.address);
    if let Err(error) = axum_server::bind(config.address)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server stopped with an error: {error}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Log to stdout with a filter taken from `RUST_LOG`, or the environment's
/// default, and log everything at debug level to `debug.log` when running
/// locally.
fn setup_logging(environment: Environment) {
    let stdout_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(environment.default_log_filter()));
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(stdout_filter);

    let debug_log = match environment {
        Environment::Local => OpenOptions::new()
            .create(true)
            .append(true)
            .open("debug.log")
            .map_err(|error| eprintln!("Could not open debug.log, file logging is off: {error}"))
            .ok()
            .map(|log_file| {
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(log_file))
                    .with_filter(LevelFilter::DEBUG)
            }),
        Environment::Hosted => None,
    };

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request| {
            let method = request.method();
            let uri = request.uri();

            let matched_path = request
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are handled.
        .on_failure(());

    router.layer(tracing_layer)
}
