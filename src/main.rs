//! Session probe: connects to the configured backend and logs every session
//! transition until interrupted.

use std::process::ExitCode;

use campus_market::application::Marketplace;
use campus_market::config::AppConfig;
use campus_market::domain::session::SessionState;
use campus_market::telemetry;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load_validated() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("campus-market: {}", error);
            return ExitCode::FAILURE;
        }
    };
    telemetry::init(&config.telemetry);

    let market = match Marketplace::connect(&config) {
        Ok(market) => market,
        Err(error) => {
            tracing::error!(%error, "cannot build backend client");
            return ExitCode::FAILURE;
        }
    };

    let session = market.start_session();
    let mut changes = session.watch();
    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                match &*changes.borrow_and_update() {
                    SessionState::Loading => tracing::info!("session loading"),
                    SessionState::Authenticated(identity) => {
                        tracing::info!(user = %identity.user_id, email = %identity.email, "signed in")
                    }
                    SessionState::Unauthenticated => tracing::info!("signed out"),
                    SessionState::Error(error) => tracing::warn!(%error, "session unavailable"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    session.teardown().await;
    ExitCode::SUCCESS
}
