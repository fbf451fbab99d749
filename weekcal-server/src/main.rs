mod cli;
mod google;
mod routes;
mod session;

use std::env;
use std::sync::Arc;

use anyhow::Context;
use log::{error, info};
use tokio::{net::TcpListener, signal};
use weekcal_core::{SyllabusExtractor, TermConfig};

use crate::google::GoogleCalendar;
use crate::routes::AppState;
use crate::session::Sessions;

fn setup_logging() {
    if env::var("LOG").is_err() {
        env::set_var(
            "LOG",
            concat!(env!("CARGO_CRATE_NAME"), "=info,weekcal_core=info"),
        );
    }

    pretty_env_logger::init_custom_env("LOG");
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::parse(env::args().skip(1).collect());

    setup_logging();

    let term = match &args.term {
        Some(path) => TermConfig::load(path)
            .with_context(|| format!("Failed to load term from {}", path.display()))?,
        None => TermConfig::default(),
    };
    term.validate()?;
    info!(
        "Using term for {} from {} to {}",
        term.course, term.start, term.end
    );

    let state = AppState {
        sessions: Sessions::new(session::Config {
            ttl: args.session_ttl,
            capacity: args.max_sessions,
        }),
        extractor: Arc::new(SyllabusExtractor::new(&term)),
        google: Arc::new(GoogleCalendar::new(reqwest::Client::new())),
        time_zone: args.time_zone.into(),
    };

    let listener = TcpListener::bind(args.address)
        .await
        .with_context(|| format!("Failed to bind to {}", args.address))?;
    info!("Listening at http://{}", args.address);

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
